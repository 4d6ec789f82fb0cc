//! Call repository implementation
//!
//! Calls and their bills are written in one transaction so a call never
//! exists without its bill. Uses runtime queries (not compile-time macros)
//! to avoid requiring a database connection at build time.

use callbill_core::{
    models::{Bill, Call, CallWithBill, NewBill, NewCall},
    traits::CallRepository,
    AppError, AppResult,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, error, info, instrument};

/// PostgreSQL implementation of CallRepository
pub struct PgCallRepository {
    pool: PgPool,
}

impl PgCallRepository {
    /// Create a new call repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const CALL_COLUMNS: &str = "id, source, destination, record_start, record_stop, created_at";

const BILL_COLUMNS: &str =
    "id, call_id, price, call_start_date, call_start_time, duration, created_at";

const CALL_WITH_BILL_SELECT: &str = r#"
    SELECT
        c.id, c.source, c.destination, c.record_start, c.record_stop, c.created_at,
        b.id AS bill_id, b.price, b.call_start_date, b.call_start_time,
        b.duration, b.created_at AS bill_created_at
    FROM calls c
    LEFT JOIN bills b ON b.call_id = c.id
"#;

/// Classify insert failures: unique violations become `AlreadyExists`
fn insert_error(e: sqlx::Error, entity: &str) -> AppError {
    let err = AppError::from(e);
    if err.is_conflict() {
        return AppError::AlreadyExists(format!("{} already exists", entity));
    }

    match err {
        AppError::Database(detail) => {
            AppError::Database(format!("Failed to create {}: {}", entity, detail))
        }
        other => other,
    }
}

#[async_trait]
impl CallRepository for PgCallRepository {
    #[instrument(skip(self, call, bill), fields(call_id = call.id))]
    async fn create_with_bill(&self, call: &NewCall, bill: &NewBill) -> AppResult<CallWithBill> {
        debug!("Storing call {} with bill", call.id);

        let mut tx = self.pool.begin().await.map_err(|e| {
            error!("Failed to start transaction: {}", e);
            AppError::Transaction(format!("Failed to start transaction: {}", e))
        })?;

        let call_query = format!(
            r#"
            INSERT INTO calls (id, source, destination, record_start, record_stop)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            CALL_COLUMNS
        );

        let call_row = sqlx::query_as::<sqlx::Postgres, CallRow>(&call_query)
            .bind(call.id)
            .bind(&call.source)
            .bind(&call.destination)
            .bind(call.record_start)
            .bind(call.record_stop)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                error!("Database error creating call {}: {}", call.id, e);
                insert_error(e, &format!("call {}", call.id))
            })?;

        let bill_query = format!(
            r#"
            INSERT INTO bills (call_id, price, call_start_date, call_start_time, duration)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            BILL_COLUMNS
        );

        let bill_row = sqlx::query_as::<sqlx::Postgres, BillRow>(&bill_query)
            .bind(call.id)
            .bind(bill.price)
            .bind(bill.call_start_date)
            .bind(bill.call_start_time)
            .bind(&bill.duration)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                error!("Database error creating bill for call {}: {}", call.id, e);
                insert_error(e, &format!("bill for call {}", call.id))
            })?;

        tx.commit().await.map_err(|e| {
            error!("Failed to commit transaction: {}", e);
            AppError::Transaction(format!("Failed to commit transaction: {}", e))
        })?;

        info!(call_id = call.id, price = %bill_row.price, "Call stored");

        Ok(CallWithBill {
            call: call_row.into(),
            bill: Some(bill_row.into()),
        })
    }

    #[instrument(skip(self))]
    async fn find_with_bill(&self, id: i64) -> AppResult<Option<CallWithBill>> {
        debug!("Finding call by id: {}", id);

        let query = format!("{} WHERE c.id = $1", CALL_WITH_BILL_SELECT);

        let result = sqlx::query_as::<sqlx::Postgres, CallWithBillRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding call {}: {}", id, e);
                AppError::Database(format!("Failed to find call: {}", e))
            })?;

        Ok(result.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn list_with_bills(&self, limit: i64, offset: i64) -> AppResult<Vec<CallWithBill>> {
        debug!("Listing calls with limit {} offset {}", limit, offset);

        let query = format!(
            "{} ORDER BY c.record_start DESC, c.id DESC LIMIT $1 OFFSET $2",
            CALL_WITH_BILL_SELECT
        );

        let rows = sqlx::query_as::<sqlx::Postgres, CallWithBillRow>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error listing calls: {}", e);
                AppError::Database(format!("Failed to fetch calls: {}", e))
            })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn count(&self) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM calls")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error counting calls: {}", e);
                AppError::Database(format!("Failed to count calls: {}", e))
            })?;

        Ok(result.0)
    }
}

/// Helper struct for mapping call rows to the domain model
#[derive(Debug, sqlx::FromRow)]
struct CallRow {
    id: i64,
    source: String,
    destination: String,
    record_start: DateTime<Utc>,
    record_stop: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl From<CallRow> for Call {
    fn from(row: CallRow) -> Self {
        Self {
            id: row.id,
            source: row.source,
            destination: row.destination,
            record_start: row.record_start,
            record_stop: row.record_stop,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BillRow {
    id: i64,
    call_id: i64,
    price: Decimal,
    call_start_date: NaiveDate,
    call_start_time: NaiveTime,
    duration: String,
    created_at: DateTime<Utc>,
}

impl From<BillRow> for Bill {
    fn from(row: BillRow) -> Self {
        Self {
            id: row.id,
            call_id: row.call_id,
            price: row.price,
            call_start_date: row.call_start_date,
            call_start_time: row.call_start_time,
            duration: row.duration,
            created_at: row.created_at,
        }
    }
}

/// Joined row; bill columns are null when the call has no bill
#[derive(Debug, sqlx::FromRow)]
struct CallWithBillRow {
    id: i64,
    source: String,
    destination: String,
    record_start: DateTime<Utc>,
    record_stop: DateTime<Utc>,
    created_at: DateTime<Utc>,
    bill_id: Option<i64>,
    price: Option<Decimal>,
    call_start_date: Option<NaiveDate>,
    call_start_time: Option<NaiveTime>,
    duration: Option<String>,
    bill_created_at: Option<DateTime<Utc>>,
}

impl From<CallWithBillRow> for CallWithBill {
    fn from(row: CallWithBillRow) -> Self {
        let bill = match (
            row.bill_id,
            row.price,
            row.call_start_date,
            row.call_start_time,
            row.duration,
            row.bill_created_at,
        ) {
            (Some(id), Some(price), Some(date), Some(time), Some(duration), Some(created_at)) => {
                Some(Bill {
                    id,
                    call_id: row.id,
                    price,
                    call_start_date: date,
                    call_start_time: time,
                    duration,
                    created_at,
                })
            }
            _ => None,
        };

        Self {
            call: Call {
                id: row.id,
                source: row.source,
                destination: row.destination,
                record_start: row.record_start,
                record_stop: row.record_stop,
                created_at: row.created_at,
            },
            bill,
        }
    }
}
