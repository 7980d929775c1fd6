use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::models::{
    wire_name, Boarder, Booking, BookingStatus, Entity, Payment, PaymentStatus, Property, Room, RoomStatus,
};
use super::store::ListQuery;
use super::DatabaseError;
use crate::services::lifecycle::{plan_booking_transition, BookingSnapshot};

type Table = BTreeMap<Uuid, Value>;

/// In-process store keeping each row as its JSON form.
///
/// A single mutex guards every table, so multi-row operations such as
/// booking transitions are atomic with respect to other requests.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

#[derive(Default)]
struct Tables {
    tables: HashMap<&'static str, Table>,
}

/// Text form of a JSON scalar, matching `column::text` in PostgreSQL.
fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn row_matches(row: &Value, query: &ListQuery) -> bool {
    if let Some(tenant_id) = query.tenant_id {
        if row.get("tenant_id").and_then(Value::as_str) != Some(tenant_id.to_string().as_str()) {
            return false;
        }
    }
    query
        .filters
        .iter()
        .all(|(column, expected)| row.get(*column).and_then(text_of).as_deref() == Some(expected.as_str()))
}

fn unique_key(row: &Value, columns: &[&str]) -> Option<Vec<String>> {
    columns.iter().map(|c| row.get(*c).and_then(text_of)).collect()
}

impl Tables {
    fn rows<T: Entity>(&self, query: &ListQuery) -> Result<Vec<T>, DatabaseError> {
        let Some(table) = self.tables.get(T::TABLE) else {
            return Ok(Vec::new());
        };

        let mut rows = table
            .values()
            .filter(|row| row_matches(row, query))
            .map(|row| serde_json::from_value::<T>(row.clone()))
            .collect::<Result<Vec<T>, _>>()?;

        rows.sort_by(|a, b| b.created_at().cmp(&a.created_at()).then_with(|| a.id().cmp(&b.id())));

        let offset = usize::try_from(query.offset).unwrap_or(0);
        let rows = rows.into_iter().skip(offset);
        Ok(match query.limit {
            Some(limit) => rows.take(usize::try_from(limit).unwrap_or(0)).collect(),
            None => rows.collect(),
        })
    }

    fn find<T: Entity>(&self, tenant_id: Option<Uuid>, id: Uuid) -> Result<Option<T>, DatabaseError> {
        let Some(row) = self.tables.get(T::TABLE).and_then(|t| t.get(&id)) else {
            return Ok(None);
        };
        let row: T = serde_json::from_value(row.clone())?;
        match tenant_id {
            Some(tenant_id) if row.tenant_id() != tenant_id => Ok(None),
            _ => Ok(Some(row)),
        }
    }

    fn require<T: Entity>(&self, tenant_id: Option<Uuid>, id: Uuid) -> Result<T, DatabaseError> {
        self.find(tenant_id, id)?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} {} not found", T::LABEL, id)))
    }

    /// Reject `row` when another row shares one of the entity's unique keys.
    fn ensure_unique<T: Entity>(&self, row: &T) -> Result<(), DatabaseError> {
        let Some(table) = self.tables.get(T::TABLE) else {
            return Ok(());
        };
        let value = serde_json::to_value(row)?;
        for columns in T::UNIQUE.iter().copied() {
            let Some(wanted) = unique_key(&value, columns) else {
                continue;
            };
            let taken = table
                .iter()
                .any(|(id, other)| *id != row.id() && unique_key(other, columns).as_ref() == Some(&wanted));
            if taken {
                return Err(DatabaseError::Conflict(format!(
                    "{} with this {} already exists",
                    T::LABEL,
                    columns.join(" and ")
                )));
            }
        }
        Ok(())
    }

    fn put<T: Entity>(&mut self, row: &T) -> Result<(), DatabaseError> {
        let value = serde_json::to_value(row)?;
        self.tables.entry(T::TABLE).or_default().insert(row.id(), value);
        Ok(())
    }

    fn refresh_property(&mut self, property_id: Uuid, now: DateTime<Utc>) -> Result<Option<Property>, DatabaseError> {
        let Some(property) = self.find::<Property>(None, property_id)? else {
            return Ok(None);
        };
        let rooms: Vec<Room> = self.rows(&ListQuery::default().filter("property_id", property_id))?;
        let property = Property {
            total_rooms: rooms.len() as i32,
            available_rooms: rooms.iter().filter(|r| r.status == RoomStatus::Available).count() as i32,
            updated_at: now,
            ..property
        };
        self.put(&property)?;
        Ok(Some(property))
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn list<T: Entity>(&self, query: &ListQuery) -> Result<Vec<T>, DatabaseError> {
        self.tables.lock().await.rows(query)
    }

    pub async fn count<T: Entity>(&self, query: &ListQuery) -> Result<i64, DatabaseError> {
        let tables = self.tables.lock().await;
        let count = tables
            .tables
            .get(T::TABLE)
            .map(|t| t.values().filter(|row| row_matches(row, query)).count())
            .unwrap_or(0);
        Ok(count as i64)
    }

    pub async fn find<T: Entity>(&self, tenant_id: Option<Uuid>, id: Uuid) -> Result<Option<T>, DatabaseError> {
        self.tables.lock().await.find(tenant_id, id)
    }

    pub async fn insert<T: Entity>(&self, row: &T) -> Result<T, DatabaseError> {
        let mut tables = self.tables.lock().await;
        if tables.tables.get(T::TABLE).is_some_and(|t| t.contains_key(&row.id())) {
            return Err(DatabaseError::Conflict(format!("{} {} already exists", T::LABEL, row.id())));
        }
        tables.ensure_unique(row)?;
        tables.put(row)?;
        Ok(row.clone())
    }

    pub async fn replace<T: Entity>(&self, row: &T, expected_updated_at: DateTime<Utc>) -> Result<T, DatabaseError> {
        let mut tables = self.tables.lock().await;
        let current: T = tables.require(Some(row.tenant_id()), row.id())?;
        if current.updated_at() != expected_updated_at {
            return Err(DatabaseError::Conflict(format!(
                "{} {} was modified by another request",
                T::LABEL,
                row.id()
            )));
        }
        tables.ensure_unique(row)?;
        tables.put(row)?;
        Ok(row.clone())
    }

    pub async fn delete<T: Entity>(&self, tenant_id: Option<Uuid>, id: Uuid) -> Result<T, DatabaseError> {
        let mut tables = self.tables.lock().await;
        let row: T = tables.require(tenant_id, id)?;
        if let Some(table) = tables.tables.get_mut(T::TABLE) {
            table.remove(&id);
        }
        Ok(row)
    }

    pub async fn refresh_property(&self, property_id: Uuid) -> Result<Option<Property>, DatabaseError> {
        self.tables.lock().await.refresh_property(property_id, Utc::now())
    }

    pub async fn transition_booking(
        &self,
        tenant_id: Uuid,
        booking_id: Uuid,
        target: BookingStatus,
        today: NaiveDate,
    ) -> Result<Booking, DatabaseError> {
        let mut tables = self.tables.lock().await;
        let scope = Some(tenant_id);

        let booking: Booking = tables.require(scope, booking_id)?;
        let room: Room = tables.require(scope, booking.room_id)?;
        let boarder: Boarder = tables.require(scope, booking.boarder_id)?;

        let holding: Vec<Booking> = tables
            .rows::<Booking>(&ListQuery::scoped(scope).filter("room_id", room.id))?
            .into_iter()
            .filter(|b| b.id != booking.id && b.status.holds_room())
            .collect();
        let occupants = tables
            .rows::<Boarder>(&ListQuery::scoped(scope).filter("room_id", room.id))?
            .iter()
            .filter(|b| b.id != boarder.id)
            .count() as i64;

        let now = Utc::now();
        let plan = plan_booking_transition(
            BookingSnapshot {
                booking: &booking,
                room: &room,
                boarder: &boarder,
                holding: &holding,
                occupants,
            },
            target,
            today,
            now,
        )?;

        tables.put(&plan.booking)?;
        if let Some(boarder) = &plan.boarder {
            tables.put(boarder)?;
        }
        if let Some(room) = &plan.room {
            tables.put(room)?;
            tables.refresh_property(room.property_id, now)?;
        }

        Ok(plan.booking)
    }

    pub async fn mark_overdue(&self, tenant_id: Option<Uuid>, as_of: NaiveDate) -> Result<u64, DatabaseError> {
        let mut tables = self.tables.lock().await;
        let pending: Vec<Payment> = tables.rows(
            &ListQuery::scoped(tenant_id).filter("status", wire_name(&PaymentStatus::Pending)),
        )?;

        let now = Utc::now();
        let mut updated = 0;
        for payment in pending.into_iter().filter(|p| p.is_past_due(as_of)) {
            tables.put(&Payment {
                status: PaymentStatus::Overdue,
                updated_at: now,
                ..payment
            })?;
            updated += 1;
        }
        Ok(updated)
    }
}
