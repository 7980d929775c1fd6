use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::{fits_numeric, Entity};
use crate::error::FieldErrors;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UtilityType {
    Electricity,
    Water,
    Gas,
    Internet,
}

/// Meter reading for one room and one utility.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UtilityReading {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub room_id: Uuid,
    pub utility_type: UtilityType,
    pub previous_reading: Decimal,
    pub current_reading: Decimal,
    pub rate: Decimal,
    pub reading_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UtilityReading {
    pub fn consumption(&self) -> Decimal {
        self.current_reading - self.previous_reading
    }

    pub fn amount(&self) -> Decimal {
        self.consumption().saturating_mul(self.rate).round_dp(2)
    }
}

/// Reading plus the derived billing figures, as returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct UtilityReadingView {
    #[serde(flatten)]
    pub reading: UtilityReading,
    pub consumption: Decimal,
    pub amount: Decimal,
}

impl From<UtilityReading> for UtilityReadingView {
    fn from(reading: UtilityReading) -> Self {
        Self {
            consumption: reading.consumption(),
            amount: reading.amount(),
            reading,
        }
    }
}

impl Entity for UtilityReading {
    const TABLE: &'static str = "utility_readings";
    const LABEL: &'static str = "Utility reading";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "tenant_id",
        "room_id",
        "utility_type",
        "previous_reading",
        "current_reading",
        "rate",
        "reading_date",
        "created_at",
        "updated_at",
    ];

    fn id(&self) -> Uuid {
        self.id
    }

    fn tenant_id(&self) -> Uuid {
        self.tenant_id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn check(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.previous_reading.is_sign_negative() {
            errors.insert("previous_reading".to_string(), "Reading cannot be negative".to_string());
        }
        if self.current_reading < self.previous_reading {
            errors.insert(
                "current_reading".to_string(),
                "Current reading cannot be below the previous reading".to_string(),
            );
        }
        if self.rate.is_sign_negative() {
            errors.insert("rate".to_string(), "Rate cannot be negative".to_string());
        }
        for (field, value) in [("previous_reading", self.previous_reading), ("current_reading", self.current_reading)] {
            if !fits_numeric(value, 14, 3) {
                errors.insert(field.to_string(), "Reading must be below 100000000000".to_string());
            }
        }
        if !fits_numeric(self.rate, 12, 4) {
            errors.insert("rate".to_string(), "Rate must be below 100000000".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewUtilityReading {
    pub room_id: Uuid,
    pub utility_type: UtilityType,
    pub previous_reading: Decimal,
    pub current_reading: Decimal,
    pub rate: Decimal,
    pub reading_date: NaiveDate,
}

impl NewUtilityReading {
    pub fn into_entity(self, tenant_id: Uuid, now: DateTime<Utc>) -> UtilityReading {
        UtilityReading {
            id: Uuid::new_v4(),
            tenant_id,
            room_id: self.room_id,
            utility_type: self.utility_type,
            previous_reading: self.previous_reading,
            current_reading: self.current_reading,
            rate: self.rate,
            reading_date: self.reading_date,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(previous: i64, current: i64, rate_cents: i64) -> UtilityReading {
        let now = Utc::now();
        UtilityReading {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            room_id: Uuid::new_v4(),
            utility_type: UtilityType::Electricity,
            previous_reading: Decimal::new(previous, 0),
            current_reading: Decimal::new(current, 0),
            rate: Decimal::new(rate_cents, 2),
            reading_date: NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn computes_consumption_and_amount() {
        let r = reading(1200, 1350, 1175);
        assert_eq!(r.consumption(), Decimal::new(150, 0));
        assert_eq!(r.amount(), Decimal::new(176250, 2));
        assert!(r.check().is_ok());
    }

    #[test]
    fn rejects_meter_running_backwards() {
        let r = reading(1350, 1200, 1000);
        assert!(r.check().unwrap_err().contains_key("current_reading"));
    }

    #[test]
    fn rejects_readings_beyond_column_precision() {
        let mut r = reading(0, 0, 1000);
        r.current_reading = "70000000000000000000000000000".parse().unwrap();
        assert!(r.check().unwrap_err().contains_key("current_reading"));

        r.current_reading = Decimal::new(10, 0);
        r.rate = Decimal::new(100_000_000, 0);
        assert!(r.check().unwrap_err().contains_key("rate"));
    }

    #[test]
    fn amount_saturates_instead_of_panicking() {
        let mut r = reading(0, 0, 1000);
        r.current_reading = Decimal::MAX;
        assert_eq!(r.amount(), Decimal::MAX);
    }

    #[test]
    fn view_flattens_reading() {
        let view = UtilityReadingView::from(reading(10, 15, 200));
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["utility_type"], "ELECTRICITY");
        assert!(json.get("consumption").is_some());
        assert!(json.get("amount").is_some());
    }
}
