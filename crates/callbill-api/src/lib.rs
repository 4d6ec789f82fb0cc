//! API layer for CallBill
//!
//! HTTP handlers for call ingestion and tariff management.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod dto;
pub mod handlers;

// Re-export DTOs (common types)
pub use dto::{ApiResponse, PaginationParams};

// Re-export handler configuration functions
pub use handlers::{configure_calls, configure_routes, configure_tariffs, health_check};
