//! Call handlers
//!
//! HTTP handlers for CDR ingestion and call lookup.

use crate::dto::{ApiResponse, CallResponse, PaginationParams};
use actix_web::{web, HttpResponse};
use callbill_core::models::CallRecordInput;
use callbill_core::AppError;
use callbill_services::{pg_services, DayWindow};
use sqlx::PgPool;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// Ingest a start/stop record pair
///
/// POST /api/v1/calls
#[instrument(skip(pool, window, req))]
pub async fn create_call(
    pool: web::Data<PgPool>,
    window: web::Data<DayWindow>,
    req: web::Json<CallRecordInput>,
) -> Result<HttpResponse, AppError> {
    let (ingestion, _) = pg_services(pool.get_ref().clone(), *window.get_ref());

    let stored = ingestion.process_call(req.into_inner()).await?;

    info!(call_id = stored.call.id, "Call created");

    Ok(HttpResponse::Created().json(ApiResponse::success(CallResponse::from(stored))))
}

/// Get a call and its bill
///
/// GET /api/v1/calls/{id}
#[instrument(skip(pool, window))]
pub async fn get_call(
    pool: web::Data<PgPool>,
    window: web::Data<DayWindow>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let call_id = path.into_inner();
    debug!(id = call_id, "Getting call");

    let (ingestion, _) = pg_services(pool.get_ref().clone(), *window.get_ref());
    let record = ingestion.get_call(call_id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(CallResponse::from(record))))
}

/// List calls with pagination
///
/// GET /api/v1/calls
#[instrument(skip(pool, window))]
pub async fn list_calls(
    pool: web::Data<PgPool>,
    window: web::Data<DayWindow>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse, AppError> {
    query.validate().map_err(|e| {
        warn!("Pagination validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    debug!(page = query.page, per_page = query.per_page, "Listing calls");

    let (ingestion, _) = pg_services(pool.get_ref().clone(), *window.get_ref());
    let (calls, total) = ingestion.list_calls(query.limit(), query.offset()).await?;

    let response_data: Vec<CallResponse> = calls.into_iter().map(CallResponse::from).collect();

    Ok(HttpResponse::Ok().json(query.paginate(response_data, total)))
}

/// Configure call routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/calls")
            .route("", web::get().to(list_calls))
            .route("", web::post().to(create_call))
            .route("/{id}", web::get().to(get_call)),
    );
}
