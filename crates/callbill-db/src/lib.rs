//! CallBill Database Layer
//!
//! This crate provides PostgreSQL database access and repository implementations
//! for the CallBill system. It includes:
//!
//! - Connection pool management with sqlx
//! - Embedded schema migrations
//! - Repository implementations for calls, bills and tariffs
//! - Transaction support for atomic call/bill writes and tariff rotation

pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_pool_from_config, run_migrations};
pub use repositories::*;

// Re-export commonly used types
pub use callbill_core::{AppError, AppResult};
pub use sqlx::PgPool;
