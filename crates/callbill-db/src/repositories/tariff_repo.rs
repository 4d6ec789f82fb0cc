//! Tariff repository implementation
//!
//! Provides PostgreSQL-backed storage for tariffs. Activation serializes on
//! a transaction-scoped advisory lock so two concurrent saves cannot both
//! end up active.

use callbill_core::{
    models::{NewTariff, Tariff, TariffStatus},
    traits::TariffRepository,
    AppError, AppResult,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use tracing::{debug, error, info, instrument};

/// Advisory lock key guarding tariff activation
const TARIFF_LOCK_KEY: i64 = 0x7461_7269_6666;

const TARIFF_COLUMNS: &str = "id, standing_charge, call_charge, useful_day, status, create_date";

/// Database row representation of a tariff
#[derive(Debug, FromRow)]
struct TariffRow {
    id: i32,
    standing_charge: Decimal,
    call_charge: Decimal,
    useful_day: i32,
    status: i16,
    create_date: DateTime<Utc>,
}

impl From<TariffRow> for Tariff {
    fn from(row: TariffRow) -> Self {
        Tariff {
            id: row.id,
            standing_charge: row.standing_charge,
            call_charge: row.call_charge,
            useful_day: row.useful_day,
            status: TariffStatus::from_i16(row.status),
            create_date: row.create_date,
        }
    }
}

/// PostgreSQL implementation of TariffRepository
pub struct PgTariffRepository {
    pool: PgPool,
}

impl PgTariffRepository {
    /// Create a new tariff repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TariffRepository for PgTariffRepository {
    #[instrument(skip(self))]
    async fn activate(&self, tariff: &NewTariff) -> AppResult<Tariff> {
        debug!("Activating new tariff");

        let mut tx = self.pool.begin().await.map_err(|e| {
            error!("Failed to start transaction: {}", e);
            AppError::Transaction(format!("Failed to start transaction: {}", e))
        })?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(TARIFF_LOCK_KEY)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                error!("Failed to acquire tariff lock: {}", e);
                AppError::Database(format!("Failed to acquire tariff lock: {}", e))
            })?;

        let deactivated = sqlx::query("UPDATE tariffs SET status = $1 WHERE status = $2")
            .bind(TariffStatus::Inactive.as_i16())
            .bind(TariffStatus::Active.as_i16())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                error!("Failed to deactivate current tariff: {}", e);
                AppError::Database(format!("Failed to deactivate current tariff: {}", e))
            })?
            .rows_affected();

        let query = format!(
            r#"
            INSERT INTO tariffs (standing_charge, call_charge, useful_day, status, create_date)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING {}
            "#,
            TARIFF_COLUMNS
        );

        let row = sqlx::query_as::<sqlx::Postgres, TariffRow>(&query)
            .bind(tariff.standing_charge)
            .bind(tariff.call_charge)
            .bind(tariff.useful_day)
            .bind(TariffStatus::Active.as_i16())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                error!("Database error creating tariff: {}", e);
                match AppError::from(e) {
                    AppError::AlreadyExists(_) => {
                        AppError::AlreadyExists("An active tariff already exists".to_string())
                    }
                    AppError::Database(detail) => {
                        AppError::Database(format!("Failed to create tariff: {}", detail))
                    }
                    other => other,
                }
            })?;

        tx.commit().await.map_err(|e| {
            error!("Failed to commit transaction: {}", e);
            AppError::Transaction(format!("Failed to commit transaction: {}", e))
        })?;

        info!(
            id = row.id,
            deactivated = deactivated,
            "Tariff activated"
        );

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn find_active(&self) -> AppResult<Option<Tariff>> {
        debug!("Finding active tariff");

        let query = format!(
            "SELECT {} FROM tariffs WHERE status = $1 ORDER BY create_date DESC, id DESC LIMIT 1",
            TARIFF_COLUMNS
        );

        let result = sqlx::query_as::<sqlx::Postgres, TariffRow>(&query)
            .bind(TariffStatus::Active.as_i16())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding active tariff: {}", e);
                AppError::Database(format!("Failed to find active tariff: {}", e))
            })?;

        Ok(result.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn find_all(&self, limit: i64, offset: i64) -> AppResult<Vec<Tariff>> {
        debug!("Listing tariffs with limit {} offset {}", limit, offset);

        let query = format!(
            "SELECT {} FROM tariffs ORDER BY create_date DESC, id DESC LIMIT $1 OFFSET $2",
            TARIFF_COLUMNS
        );

        let rows = sqlx::query_as::<sqlx::Postgres, TariffRow>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error listing tariffs: {}", e);
                AppError::Database(format!("Failed to list tariffs: {}", e))
            })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn count(&self) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tariffs")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error counting tariffs: {}", e);
                AppError::Database(format!("Failed to count tariffs: {}", e))
            })?;

        Ok(result.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_tariff_row_conversion() {
        let row = TariffRow {
            id: 3,
            standing_charge: dec!(0.36),
            call_charge: dec!(0.09),
            useful_day: 16,
            status: 0,
            create_date: Utc::now(),
        };

        let tariff: Tariff = row.into();
        assert_eq!(tariff.id, 3);
        assert_eq!(tariff.call_charge, dec!(0.09));
        assert!(!tariff.is_active());
    }

    #[tokio::test]
    #[ignore] // Requires database
    async fn test_activate_supersedes_previous() {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost/callbill".to_string());
        let pool = crate::create_pool(&database_url, Some(2)).await.unwrap();
        crate::run_migrations(&pool).await.unwrap();

        let repo = PgTariffRepository::new(pool);
        let first = repo
            .activate(&NewTariff {
                standing_charge: dec!(0.36),
                call_charge: dec!(0.09),
                useful_day: 16,
            })
            .await
            .unwrap();
        let second = repo
            .activate(&NewTariff {
                standing_charge: dec!(1.00),
                call_charge: dec!(0.10),
                useful_day: 8,
            })
            .await
            .unwrap();

        let active = repo.find_active().await.unwrap().unwrap();
        assert_eq!(active.id, second.id);
        assert_ne!(active.id, first.id);
    }
}
