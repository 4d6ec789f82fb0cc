//! Business logic services for CallBill
//!
//! This crate contains the services that orchestrate call billing:
//!
//! - `CallIngestionService` - validates CDR pairs, prices them and stores
//!   the call with its bill
//! - `TariffService` - maintains the single active tariff
//! - `pricing` - the day/night pricing routine
//!
//! Services are generic over the repository traits from callbill-core so
//! they can run against PostgreSQL or in-memory stores.

pub mod ingestion;
pub mod pricing;
pub mod tariff;

#[cfg(test)]
mod testing;

pub use ingestion::CallIngestionService;
pub use pricing::{calculate_bill, format_duration, BillQuote, DayWindow};
pub use tariff::TariffService;

use callbill_db::{PgCallRepository, PgTariffRepository};
use sqlx::PgPool;
use std::sync::Arc;

/// Ingestion service backed by PostgreSQL
pub type PgCallIngestionService = CallIngestionService<PgCallRepository, PgTariffRepository>;

/// Tariff service backed by PostgreSQL
pub type PgTariffService = TariffService<PgTariffRepository>;

/// Build the PostgreSQL-backed services sharing one pool
pub fn pg_services(pool: PgPool, window: DayWindow) -> (PgCallIngestionService, PgTariffService) {
    let tariffs = TariffService::new(Arc::new(PgTariffRepository::new(pool.clone())));
    let ingestion =
        CallIngestionService::new(Arc::new(PgCallRepository::new(pool)), tariffs.clone(), window);
    (ingestion, tariffs)
}
