//! Repository implementations
//!
//! This module contains concrete implementations of the repository traits
//! defined in callbill-core, using sqlx for PostgreSQL access.

pub mod call_repo;
pub mod tariff_repo;

pub use call_repo::PgCallRepository;
pub use tariff_repo::PgTariffRepository;
