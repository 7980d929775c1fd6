use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::{fits_numeric, non_empty, Entity};
use crate::error::FieldErrors;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentType {
    Rent,
    Utility,
    Deposit,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Overdue,
    Cancelled,
}

impl PaymentStatus {
    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, next),
            (Pending, Paid) | (Pending, Overdue) | (Pending, Cancelled) | (Overdue, Paid) | (Overdue, Cancelled)
        )
    }

    /// Still owed by the boarder.
    pub fn is_outstanding(self) -> bool {
        matches!(self, PaymentStatus::Pending | PaymentStatus::Overdue)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&super::wire_name(self))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub boarder_id: Uuid,
    pub amount: Decimal,
    pub payment_type: PaymentType,
    pub status: PaymentStatus,
    pub due_date: NaiveDate,
    pub paid_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    pub fn is_past_due(&self, as_of: NaiveDate) -> bool {
        self.status == PaymentStatus::Pending && self.due_date < as_of
    }
}

impl Entity for Payment {
    const TABLE: &'static str = "payments";
    const LABEL: &'static str = "Payment";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "tenant_id",
        "boarder_id",
        "amount",
        "payment_type",
        "status",
        "due_date",
        "paid_date",
        "description",
        "created_at",
        "updated_at",
    ];
    const MANAGED: &'static [&'static str] = &["status", "paid_date"];

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
        if self.amount <= Decimal::ZERO {
            errors.insert("amount".to_string(), "Amount must be greater than zero".to_string());
        } else if !fits_numeric(self.amount, 12, 2) {
            errors.insert("amount".to_string(), "Amount must be below 10000000000".to_string());
        }
        if self.status == PaymentStatus::Paid && self.paid_date.is_none() {
            errors.insert("paid_date".to_string(), "Paid payments need a paid date".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewPayment {
    pub boarder_id: Uuid,
    pub amount: Decimal,
    pub payment_type: PaymentType,
    pub due_date: NaiveDate,
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
}

impl NewPayment {
    pub fn into_entity(self, tenant_id: Uuid, now: DateTime<Utc>) -> Payment {
        Payment {
            id: Uuid::new_v4(),
            tenant_id,
            boarder_id: self.boarder_id,
            amount: self.amount,
            payment_type: self.payment_type,
            status: PaymentStatus::Pending,
            due_date: self.due_date,
            paid_date: None,
            description: non_empty(self.description),
            created_at: now,
            updated_at: now,
        }
    }
}
