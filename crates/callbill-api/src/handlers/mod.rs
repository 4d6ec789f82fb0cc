//! HTTP request handlers

pub mod calls;
pub mod tariffs;

use actix_web::{web, HttpResponse};

pub use calls::configure as configure_calls;
pub use tariffs::configure as configure_tariffs;

/// Health check endpoint
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "callbill",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Mount every API route under `/api/v1`
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/health", web::get().to(health_check))
            .configure(configure_calls)
            .configure(configure_tariffs),
    );
}
