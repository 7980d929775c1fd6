//! YAML fixtures for demo and staging tenants.
//!
//! ```yaml
//! tenant_id: 3f0c...        # optional, a new tenant is created otherwise
//! landlords:
//!   - name: Nestor Reyes
//!     email: nestor@example.com
//!     properties:
//!       - name: Reyes Boarding House
//!         address: 7 Luna St
//!         city: Iloilo
//!         rooms:
//!           - { room_number: "101", capacity: 2, monthly_rate: 3500, amenities: [wifi] }
//! boarders:
//!   - { name: Rica Santos, email: rica@example.com }
//! ```

use anyhow::Context;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use uuid::Uuid;
use validator::Validate;

use crate::cli::output::output_success;
use crate::cli::OutputFormat;
use crate::config::config;
use crate::database::models::{Entity, NewBoarder, NewLandlord, NewProperty, NewRoom, RoomStatus};
use crate::database::{DatabaseManager, PgStore, Store};

#[derive(Debug, Deserialize)]
pub struct Fixture {
    pub tenant_id: Option<Uuid>,
    #[serde(default)]
    pub landlords: Vec<LandlordFixture>,
    #[serde(default)]
    pub boarders: Vec<BoarderFixture>,
}

#[derive(Debug, Deserialize)]
pub struct LandlordFixture {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(default)]
    pub properties: Vec<PropertyFixture>,
}

#[derive(Debug, Deserialize)]
pub struct PropertyFixture {
    pub name: String,
    pub address: String,
    pub city: String,
    pub description: Option<String>,
    #[serde(default)]
    pub rooms: Vec<RoomFixture>,
}

#[derive(Debug, Deserialize)]
pub struct RoomFixture {
    pub room_number: String,
    #[serde(default)]
    pub floor: i32,
    pub capacity: i32,
    pub monthly_rate: Decimal,
    #[serde(default)]
    pub amenities: Vec<String>,
    pub status: Option<RoomStatus>,
}

#[derive(Debug, Deserialize)]
pub struct BoarderFixture {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub emergency_contact: Option<String>,
}

#[derive(Debug, Default, Serialize, PartialEq)]
pub struct SeedReport {
    pub tenant_id: Uuid,
    pub landlords: usize,
    pub properties: usize,
    pub rooms: usize,
    pub boarders: usize,
}

pub async fn handle(file: PathBuf, tenant: Option<Uuid>, output_format: OutputFormat) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&file).with_context(|| format!("failed to read {}", file.display()))?;
    let mut fixture: Fixture =
        serde_yaml::from_str(&raw).with_context(|| format!("invalid fixture {}", file.display()))?;
    if tenant.is_some() {
        fixture.tenant_id = tenant;
    }

    let database = &config().database;
    let pool = DatabaseManager::connect(database).await?;
    if database.run_migrations {
        DatabaseManager::migrate(&pool).await?;
    }
    let store = Store::Postgres(PgStore::new(pool));

    let report = load(&store, fixture).await?;
    output_success(
        output_format,
        &format!(
            "Seeded tenant {}: {} landlords, {} properties, {} rooms, {} boarders",
            report.tenant_id, report.landlords, report.properties, report.rooms, report.boarders
        ),
        Some(json!({ "report": report })),
    )
}

/// Validate and insert every row of the fixture, refreshing property counts
/// as rooms land.
pub async fn load(store: &Store, fixture: Fixture) -> anyhow::Result<SeedReport> {
    let tenant_id = fixture.tenant_id.unwrap_or_else(Uuid::new_v4);
    let now = Utc::now();
    let mut report = SeedReport {
        tenant_id,
        ..SeedReport::default()
    };

    for landlord in fixture.landlords {
        let new = NewLandlord {
            user_id: None,
            name: landlord.name,
            email: landlord.email,
            phone: landlord.phone,
        };
        new.validate().with_context(|| format!("landlord {}", new.email))?;
        let row = insert(store, new.into_entity(tenant_id, now)).await?;
        report.landlords += 1;

        for property in landlord.properties {
            let new = NewProperty {
                landlord_id: row.id,
                name: property.name,
                address: property.address,
                city: property.city,
                description: property.description,
            };
            new.validate().with_context(|| format!("property {}", new.name))?;
            let saved = insert(store, new.into_entity(tenant_id, now)).await?;
            report.properties += 1;

            for room in property.rooms {
                let new = NewRoom {
                    property_id: saved.id,
                    room_number: room.room_number,
                    floor: room.floor,
                    capacity: room.capacity,
                    monthly_rate: room.monthly_rate,
                    amenities: room.amenities,
                    status: room.status,
                };
                new.validate()
                    .with_context(|| format!("room {} of {}", new.room_number, saved.name))?;
                insert(store, new.into_entity(tenant_id, now)).await?;
                report.rooms += 1;
            }
            store.refresh_property(saved.id).await?;
        }
    }

    for boarder in fixture.boarders {
        let new = NewBoarder {
            user_id: None,
            name: boarder.name,
            email: boarder.email,
            phone: boarder.phone,
            emergency_contact: boarder.emergency_contact,
        };
        new.validate().with_context(|| format!("boarder {}", new.email))?;
        insert(store, new.into_entity(tenant_id, now)).await?;
        report.boarders += 1;
    }

    tracing::info!("Seeded tenant {}", tenant_id);
    Ok(report)
}

async fn insert<T: Entity>(store: &Store, row: T) -> anyhow::Result<T> {
    row.check().map_err(|fields| {
        let mut problems: Vec<String> = fields.into_iter().map(|(f, m)| format!("{}: {}", f, m)).collect();
        problems.sort();
        anyhow::anyhow!("invalid {}: {}", T::LABEL.to_lowercase(), problems.join(", "))
    })?;
    Ok(store.insert(&row).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{Property, Room};
    use crate::database::ListQuery;

    const FIXTURE: &str = r#"
landlords:
  - name: Nestor Reyes
    email: nestor@example.com
    properties:
      - name: Reyes Boarding House
        address: 7 Luna St
        city: Iloilo
        rooms:
          - { room_number: "101", capacity: 2, monthly_rate: 3500, amenities: [wifi, WiFi] }
          - { room_number: "102", capacity: 1, monthly_rate: "2800.50", status: MAINTENANCE }
boarders:
  - { name: Rica Santos, email: rica@example.com }
"#;

    #[tokio::test]
    async fn loads_nested_fixture() {
        let store = Store::memory();
        let fixture: Fixture = serde_yaml::from_str(FIXTURE).unwrap();
        let report = load(&store, fixture).await.unwrap();
        assert_eq!((report.landlords, report.properties, report.rooms, report.boarders), (1, 1, 2, 1));

        let scope = ListQuery::scoped(Some(report.tenant_id));
        let property = store.list::<Property>(&scope).await.unwrap().remove(0);
        assert_eq!((property.total_rooms, property.available_rooms), (2, 1));

        let rooms = store.list::<Room>(&scope.clone().filter("room_number", "101")).await.unwrap();
        assert_eq!(rooms[0].amenities, vec!["wifi".to_string()]);
    }

    #[tokio::test]
    async fn rejects_invalid_rows() {
        let store = Store::memory();
        let fixture: Fixture = serde_yaml::from_str("boarders:\n  - { name: X, email: not-an-email }\n").unwrap();
        assert!(load(&store, fixture).await.is_err());
    }
}
