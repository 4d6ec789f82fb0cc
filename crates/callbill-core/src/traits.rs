//! Common traits for repositories
//!
//! Defines the storage abstractions the services are written against.

use crate::error::AppError;
use crate::models::{CallWithBill, NewBill, NewCall, NewTariff, Tariff};
use async_trait::async_trait;
use serde::Serialize;

/// Call repository trait
///
/// Calls and bills are written together: a call is never stored without
/// the bill computed for it.
#[async_trait]
pub trait CallRepository: Send + Sync {
    /// Insert a call and its bill atomically
    ///
    /// Returns [`AppError::AlreadyExists`] when the call id, or a bill for
    /// it, is already stored.
    async fn create_with_bill(&self, call: &NewCall, bill: &NewBill)
        -> Result<CallWithBill, AppError>;

    /// Find a call and its bill by call id
    async fn find_with_bill(&self, id: i64) -> Result<Option<CallWithBill>, AppError>;

    /// List calls with their bills, newest record first
    async fn list_with_bills(&self, limit: i64, offset: i64)
        -> Result<Vec<CallWithBill>, AppError>;

    /// Count stored calls
    async fn count(&self) -> Result<i64, AppError>;
}

/// Tariff repository trait
#[async_trait]
pub trait TariffRepository: Send + Sync {
    /// Deactivate the current tariff, if any, and store `tariff` as active
    async fn activate(&self, tariff: &NewTariff) -> Result<Tariff, AppError>;

    /// Find the active tariff
    async fn find_active(&self) -> Result<Option<Tariff>, AppError>;

    /// List all tariffs, newest first
    async fn find_all(&self, limit: i64, offset: i64) -> Result<Vec<Tariff>, AppError>;

    /// Count stored tariffs
    async fn count(&self) -> Result<i64, AppError>;
}

/// Lookup helper shared by handlers
pub fn call_not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Call {} not found", id))
}

/// Paginated response wrapper
#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize)]
pub struct PaginationMeta {
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl PaginationMeta {
    pub fn new(total: i64, page: i64, per_page: i64) -> Self {
        let total_pages = if per_page > 0 {
            (total + per_page - 1) / per_page
        } else {
            0
        };

        Self {
            total,
            page,
            per_page,
            total_pages,
        }
    }
}
