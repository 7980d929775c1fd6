use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::debug;
use uuid::Uuid;

use super::models::{wire_name, Boarder, Booking, BookingStatus, Entity, Payment, PaymentStatus, Property, Room};
use super::store::ListQuery;
use super::{DatabaseError, DatabaseManager};
use crate::services::lifecycle::{plan_booking_transition, BookingSnapshot};

/// PostgreSQL back end.
///
/// SQL is generated from `Entity::COLUMNS`; rows travel in and out of the
/// database through `jsonb_populate_record`, so one code path serves every table.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

fn column_list<T: Entity>() -> String {
    T::COLUMNS
        .iter()
        .map(|c| format!("\"{}\"", c))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Columns a replace may write. Identity and creation time never change.
fn mutable_columns<T: Entity>() -> Vec<&'static str> {
    T::COLUMNS
        .iter()
        .copied()
        .filter(|c| !matches!(*c, "id" | "tenant_id" | "created_at"))
        .collect()
}

/// WHERE clause for a list query. `$1` is always the optional tenant; filter
/// values follow as text parameters.
fn where_clause(query: &ListQuery) -> String {
    let mut clause = String::from("($1::uuid IS NULL OR t.\"tenant_id\" = $1)");
    for (i, (column, _)) in query.filters.iter().enumerate() {
        clause.push_str(&format!(" AND t.\"{}\"::text = ${}", column, i + 2));
    }
    clause
}

pub(crate) fn select_sql<T: Entity>(query: &ListQuery) -> String {
    let mut sql = format!(
        "SELECT {} FROM \"{}\" t WHERE {} ORDER BY t.\"created_at\" DESC, t.\"id\"",
        column_list::<T>(),
        T::TABLE,
        where_clause(query)
    );
    if let Some(limit) = query.limit {
        sql.push_str(&format!(" LIMIT {} OFFSET {}", limit.max(0), query.offset.max(0)));
    }
    sql
}

pub(crate) fn count_sql<T: Entity>(query: &ListQuery) -> String {
    format!("SELECT COUNT(*) FROM \"{}\" t WHERE {}", T::TABLE, where_clause(query))
}

pub(crate) fn insert_sql<T: Entity>() -> String {
    let columns = column_list::<T>();
    format!(
        "INSERT INTO \"{table}\" ({columns}) SELECT {columns} FROM jsonb_populate_record(NULL::\"{table}\", $1) RETURNING {columns}",
        table = T::TABLE,
        columns = columns
    )
}

/// `$1` row JSON, `$2` id, `$3` tenant, `$4` expected `updated_at` (NULL skips the check).
pub(crate) fn update_sql<T: Entity>() -> String {
    let targets = mutable_columns::<T>()
        .iter()
        .map(|c| format!("\"{}\"", c))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "UPDATE \"{table}\" t SET ({targets}) = (SELECT {targets} FROM jsonb_populate_record(NULL::\"{table}\", $1)) \
         WHERE t.\"id\" = $2 AND t.\"tenant_id\" = $3 AND ($4::timestamptz IS NULL OR t.\"updated_at\" = $4) \
         RETURNING {columns}",
        table = T::TABLE,
        targets = targets,
        columns = column_list::<T>()
            .split(", ")
            .map(|c| format!("t.{}", c))
            .collect::<Vec<_>>()
            .join(", ")
    )
}

fn lock_sql<T: Entity>() -> String {
    format!(
        "SELECT {} FROM \"{}\" WHERE \"id\" = $1 AND \"tenant_id\" = $2 FOR UPDATE",
        column_list::<T>(),
        T::TABLE
    )
}

async fn fetch_list<T: Entity>(conn: &mut PgConnection, query: &ListQuery) -> Result<Vec<T>, DatabaseError> {
    let sql = select_sql::<T>(query);
    let mut q = sqlx::query_as::<_, T>(&sql).bind(query.tenant_id);
    for (_, value) in &query.filters {
        q = q.bind(value.clone());
    }
    Ok(q.fetch_all(conn).await?)
}

async fn lock_row<T: Entity>(conn: &mut PgConnection, tenant_id: Uuid, id: Uuid) -> Result<T, DatabaseError> {
    sqlx::query_as::<_, T>(&lock_sql::<T>())
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("{} {} not found", T::LABEL, id)))
}

async fn write_row<T: Entity>(
    conn: &mut PgConnection,
    row: &T,
    expected_updated_at: Option<DateTime<Utc>>,
) -> Result<Option<T>, DatabaseError> {
    let json = serde_json::to_value(row)?;
    Ok(sqlx::query_as::<_, T>(&update_sql::<T>())
        .bind(json)
        .bind(row.id())
        .bind(row.tenant_id())
        .bind(expected_updated_at)
        .fetch_optional(conn)
        .await?)
}

async fn recount_property(conn: &mut PgConnection, property_id: Uuid) -> Result<Option<Property>, DatabaseError> {
    let sql = format!(
        "UPDATE \"properties\" p SET \
         \"total_rooms\" = (SELECT COUNT(*) FROM \"rooms\" r WHERE r.\"property_id\" = p.\"id\"), \
         \"available_rooms\" = (SELECT COUNT(*) FROM \"rooms\" r WHERE r.\"property_id\" = p.\"id\" AND r.\"status\" = 'AVAILABLE'), \
         \"updated_at\" = NOW() \
         WHERE p.\"id\" = $1 RETURNING {}",
        column_list::<Property>()
            .split(", ")
            .map(|c| format!("p.{}", c))
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(sqlx::query_as::<_, Property>(&sql)
        .bind(property_id)
        .fetch_optional(conn)
        .await?)
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }

    pub async fn list<T: Entity>(&self, query: &ListQuery) -> Result<Vec<T>, DatabaseError> {
        let mut conn = self.pool.acquire().await?;
        fetch_list(&mut conn, query).await
    }

    pub async fn count<T: Entity>(&self, query: &ListQuery) -> Result<i64, DatabaseError> {
        let sql = count_sql::<T>(query);
        let mut q = sqlx::query_scalar::<_, i64>(&sql).bind(query.tenant_id);
        for (_, value) in &query.filters {
            q = q.bind(value.clone());
        }
        Ok(q.fetch_one(&self.pool).await?)
    }

    pub async fn find<T: Entity>(&self, tenant_id: Option<Uuid>, id: Uuid) -> Result<Option<T>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM \"{}\" WHERE \"id\" = $1 AND ($2::uuid IS NULL OR \"tenant_id\" = $2)",
            column_list::<T>(),
            T::TABLE
        );
        Ok(sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn insert<T: Entity>(&self, row: &T) -> Result<T, DatabaseError> {
        let json = serde_json::to_value(row)?;
        let inserted = sqlx::query_as::<_, T>(&insert_sql::<T>())
            .bind(json)
            .fetch_one(&self.pool)
            .await?;
        debug!("Inserted {} {}", T::LABEL, inserted.id());
        Ok(inserted)
    }

    pub async fn replace<T: Entity>(&self, row: &T, expected_updated_at: DateTime<Utc>) -> Result<T, DatabaseError> {
        let mut conn = self.pool.acquire().await?;
        if let Some(updated) = write_row(&mut conn, row, Some(expected_updated_at)).await? {
            return Ok(updated);
        }
        match self.find::<T>(Some(row.tenant_id()), row.id()).await? {
            Some(_) => Err(DatabaseError::Conflict(format!(
                "{} {} was modified by another request",
                T::LABEL,
                row.id()
            ))),
            None => Err(DatabaseError::NotFound(format!("{} {} not found", T::LABEL, row.id()))),
        }
    }

    pub async fn delete<T: Entity>(&self, tenant_id: Option<Uuid>, id: Uuid) -> Result<T, DatabaseError> {
        let sql = format!(
            "DELETE FROM \"{}\" WHERE \"id\" = $1 AND ($2::uuid IS NULL OR \"tenant_id\" = $2) RETURNING {}",
            T::TABLE,
            column_list::<T>()
        );
        sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} {} not found", T::LABEL, id)))
    }

    pub async fn refresh_property(&self, property_id: Uuid) -> Result<Option<Property>, DatabaseError> {
        let mut conn = self.pool.acquire().await?;
        recount_property(&mut conn, property_id).await
    }

    /// Locks booking, room and boarder in that order, so concurrent
    /// transitions on the same room serialize on the room row.
    pub async fn transition_booking(
        &self,
        tenant_id: Uuid,
        booking_id: Uuid,
        target: BookingStatus,
        today: NaiveDate,
    ) -> Result<Booking, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let booking: Booking = lock_row(&mut tx, tenant_id, booking_id).await?;
        let room: Room = lock_row(&mut tx, tenant_id, booking.room_id).await?;
        let boarder: Boarder = lock_row(&mut tx, tenant_id, booking.boarder_id).await?;

        let holding: Vec<Booking> = fetch_list::<Booking>(
            &mut tx,
            &ListQuery::scoped(Some(tenant_id)).filter("room_id", room.id),
        )
        .await?
        .into_iter()
        .filter(|b| b.id != booking.id && b.status.holds_room())
        .collect();

        let occupants: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM \"boarders\" WHERE \"room_id\" = $1 AND \"id\" <> $2",
        )
        .bind(room.id)
        .bind(boarder.id)
        .fetch_one(&mut *tx)
        .await?;

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
            Utc::now(),
        )?;

        let missing = || DatabaseError::QueryError(format!("Booking {} vanished during transition", booking_id));
        let updated = write_row(&mut tx, &plan.booking, None).await?.ok_or_else(missing)?;
        if let Some(boarder) = &plan.boarder {
            write_row(&mut tx, boarder, None).await?.ok_or_else(missing)?;
        }
        if let Some(room) = &plan.room {
            write_row(&mut tx, room, None).await?.ok_or_else(missing)?;
            recount_property(&mut tx, room.property_id).await?;
        }

        tx.commit().await?;
        debug!("Booking {} moved to {}", booking_id, target);
        Ok(updated)
    }

    pub async fn mark_overdue(&self, tenant_id: Option<Uuid>, as_of: NaiveDate) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            "UPDATE \"payments\" SET \"status\" = $1, \"updated_at\" = NOW() \
             WHERE \"status\" = $2 AND \"due_date\" < $3 AND ($4::uuid IS NULL OR \"tenant_id\" = $4)",
        )
        .bind(wire_name(&PaymentStatus::Overdue))
        .bind(wire_name(&PaymentStatus::Pending))
        .bind(as_of)
        .bind(tenant_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

impl From<PgPool> for PgStore {
    fn from(pool: PgPool) -> Self {
        Self::new(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_sql_scopes_filters_and_pages() {
        let query = ListQuery::scoped(None)
            .filter("status", "AVAILABLE")
            .filter("property_id", Uuid::nil())
            .page(10, 20);
        let sql = select_sql::<Room>(&query);
        assert!(sql.starts_with("SELECT \"id\", \"tenant_id\""));
        assert!(sql.contains("($1::uuid IS NULL OR t.\"tenant_id\" = $1)"));
        assert!(sql.contains("t.\"status\"::text = $2"));
        assert!(sql.contains("t.\"property_id\"::text = $3"));
        assert!(sql.ends_with("ORDER BY t.\"created_at\" DESC, t.\"id\" LIMIT 10 OFFSET 20"));
    }

    #[test]
    fn count_sql_has_no_paging() {
        let sql = count_sql::<Payment>(&ListQuery::default().page(5, 5));
        assert_eq!(
            sql,
            "SELECT COUNT(*) FROM \"payments\" t WHERE ($1::uuid IS NULL OR t.\"tenant_id\" = $1)"
        );
    }

    #[test]
    fn update_never_rewrites_identity() {
        let sql = update_sql::<Boarder>();
        let set_clause = sql.split(" = (SELECT").next().unwrap_or_default();
        assert!(!set_clause.contains("\"id\""));
        assert!(!set_clause.contains("\"tenant_id\""));
        assert!(!set_clause.contains("\"created_at\""));
        assert!(set_clause.contains("\"updated_at\""));
        assert!(sql.contains("t.\"updated_at\" = $4"));
    }

    #[test]
    fn insert_goes_through_jsonb_populate_record() {
        let sql = insert_sql::<Property>();
        assert!(sql.contains("jsonb_populate_record(NULL::\"properties\", $1)"));
        assert!(sql.contains("RETURNING \"id\""));
    }
}
