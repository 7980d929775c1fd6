use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::memory::MemoryStore;
use super::models::{Booking, BookingStatus, Entity, Property};
use super::postgres::PgStore;
use super::DatabaseError;

/// Row selection for list and count queries.
///
/// Filters are exact matches against the text form of a column. Column
/// names come from code, never from request input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub tenant_id: Option<Uuid>,
    pub filters: Vec<(&'static str, String)>,
    pub limit: Option<i64>,
    pub offset: i64,
}

impl ListQuery {
    pub fn scoped(tenant_id: Option<Uuid>) -> Self {
        Self {
            tenant_id,
            ..Default::default()
        }
    }

    pub fn filter(mut self, column: &'static str, value: impl ToString) -> Self {
        self.filters.push((column, value.to_string()));
        self
    }

    pub fn filter_opt<V: ToString>(self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.filter(column, v),
            None => self,
        }
    }

    pub fn page(mut self, limit: i64, offset: i64) -> Self {
        self.limit = Some(limit);
        self.offset = offset.max(0);
        self
    }

    /// Same selection without paging, for counts.
    pub fn unpaged(&self) -> Self {
        Self {
            limit: None,
            offset: 0,
            ..self.clone()
        }
    }

    pub(crate) fn validate_columns<T: Entity>(&self) -> Result<(), DatabaseError> {
        match self.filters.iter().find(|(col, _)| !T::COLUMNS.contains(col)) {
            Some((col, _)) => Err(DatabaseError::InvalidInput(format!(
                "Cannot filter {} by '{}'",
                T::LABEL,
                col
            ))),
            None => Ok(()),
        }
    }
}

/// Persistence back end shared by every request.
#[derive(Clone)]
pub enum Store {
    Postgres(PgStore),
    Memory(MemoryStore),
}

impl Store {
    pub fn memory() -> Self {
        Store::Memory(MemoryStore::new())
    }

    pub fn backend(&self) -> &'static str {
        match self {
            Store::Postgres(_) => "postgres",
            Store::Memory(_) => "memory",
        }
    }

    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        match self {
            Store::Postgres(s) => s.health_check().await,
            Store::Memory(_) => Ok(()),
        }
    }

    pub async fn list<T: Entity>(&self, query: &ListQuery) -> Result<Vec<T>, DatabaseError> {
        query.validate_columns::<T>()?;
        match self {
            Store::Postgres(s) => s.list(query).await,
            Store::Memory(s) => s.list(query).await,
        }
    }

    pub async fn count<T: Entity>(&self, query: &ListQuery) -> Result<i64, DatabaseError> {
        query.validate_columns::<T>()?;
        match self {
            Store::Postgres(s) => s.count::<T>(query).await,
            Store::Memory(s) => s.count::<T>(query).await,
        }
    }

    pub async fn find<T: Entity>(&self, tenant_id: Option<Uuid>, id: Uuid) -> Result<Option<T>, DatabaseError> {
        match self {
            Store::Postgres(s) => s.find(tenant_id, id).await,
            Store::Memory(s) => s.find(tenant_id, id).await,
        }
    }

    /// Like `find`, but a missing row is an error
    pub async fn get<T: Entity>(&self, tenant_id: Option<Uuid>, id: Uuid) -> Result<T, DatabaseError> {
        self.find(tenant_id, id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} {} not found", T::LABEL, id)))
    }

    pub async fn insert<T: Entity>(&self, row: &T) -> Result<T, DatabaseError> {
        match self {
            Store::Postgres(s) => s.insert(row).await,
            Store::Memory(s) => s.insert(row).await,
        }
    }

    /// Overwrite a row, provided nobody changed it since `expected_updated_at`.
    pub async fn replace<T: Entity>(&self, row: &T, expected_updated_at: DateTime<Utc>) -> Result<T, DatabaseError> {
        match self {
            Store::Postgres(s) => s.replace(row, expected_updated_at).await,
            Store::Memory(s) => s.replace(row, expected_updated_at).await,
        }
    }

    pub async fn delete<T: Entity>(&self, tenant_id: Option<Uuid>, id: Uuid) -> Result<T, DatabaseError> {
        match self {
            Store::Postgres(s) => s.delete(tenant_id, id).await,
            Store::Memory(s) => s.delete(tenant_id, id).await,
        }
    }

    /// Recount `total_rooms` and `available_rooms` from the property's rooms.
    pub async fn refresh_property(&self, property_id: Uuid) -> Result<Option<Property>, DatabaseError> {
        match self {
            Store::Postgres(s) => s.refresh_property(property_id).await,
            Store::Memory(s) => s.refresh_property(property_id).await,
        }
    }

    /// Move a booking to `target`, applying room and boarder side effects atomically.
    pub async fn transition_booking(
        &self,
        tenant_id: Uuid,
        booking_id: Uuid,
        target: BookingStatus,
        today: NaiveDate,
    ) -> Result<Booking, DatabaseError> {
        match self {
            Store::Postgres(s) => s.transition_booking(tenant_id, booking_id, target, today).await,
            Store::Memory(s) => s.transition_booking(tenant_id, booking_id, target, today).await,
        }
    }

    /// Flag pending payments due before `as_of` as overdue; returns how many changed.
    pub async fn mark_overdue(&self, tenant_id: Option<Uuid>, as_of: NaiveDate) -> Result<u64, DatabaseError> {
        match self {
            Store::Postgres(s) => s.mark_overdue(tenant_id, as_of).await,
            Store::Memory(s) => s.mark_overdue(tenant_id, as_of).await,
        }
    }
}
