//! Tariff handlers
//!
//! Saving a tariff makes it the active one.

use crate::dto::{ApiResponse, PaginationParams, TariffResponse};
use actix_web::{web, HttpResponse};
use callbill_core::models::TariffInput;
use callbill_core::AppError;
use callbill_db::PgTariffRepository;
use callbill_services::{PgTariffService, TariffService};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

fn tariff_service(pool: &PgPool) -> PgTariffService {
    TariffService::new(Arc::new(PgTariffRepository::new(pool.clone())))
}

/// Save and activate a tariff
///
/// POST /api/v1/tariffs
#[instrument(skip(pool, req))]
pub async fn create_tariff(
    pool: web::Data<PgPool>,
    req: web::Json<TariffInput>,
) -> Result<HttpResponse, AppError> {
    let saved = tariff_service(pool.get_ref())
        .save_tariff(req.into_inner())
        .await?;

    info!(id = saved.id, "Tariff activated");

    Ok(HttpResponse::Created().json(ApiResponse::with_message(
        TariffResponse::from(saved),
        "Tariff activated",
    )))
}

/// Get the active tariff
///
/// GET /api/v1/tariffs/active
#[instrument(skip(pool))]
pub async fn get_active_tariff(pool: web::Data<PgPool>) -> Result<HttpResponse, AppError> {
    let tariff = tariff_service(pool.get_ref())
        .get_charge()
        .await?
        .ok_or_else(|| AppError::NotFound("No active tariff".to_string()))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(TariffResponse::from(tariff))))
}

/// List every saved tariff, newest first
///
/// GET /api/v1/tariffs
#[instrument(skip(pool))]
pub async fn list_tariffs(
    pool: web::Data<PgPool>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse, AppError> {
    query.validate().map_err(|e| {
        warn!("Pagination validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    debug!(page = query.page, per_page = query.per_page, "Listing tariffs");

    let (tariffs, total) = tariff_service(pool.get_ref())
        .history(query.limit(), query.offset())
        .await?;

    let response_data: Vec<TariffResponse> =
        tariffs.into_iter().map(TariffResponse::from).collect();

    Ok(HttpResponse::Ok().json(query.paginate(response_data, total)))
}

/// Configure tariff routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/tariffs")
            .route("", web::get().to(list_tariffs))
            .route("", web::post().to(create_tariff))
            .route("/active", web::get().to(get_active_tariff)),
    );
}
