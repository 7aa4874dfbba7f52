use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use interior::accounts::{UserAccount, UserId};
use interior::backoffice::{
    booking_report_csv, booking_report_json, DatabaseDump, Overview, OwnerStats, ReportFormat,
    UserStats,
};
use interior::booking::BookingId;
use interior::catalog::{ListingId, ListingUpdate};
use interior::error::AppError;
use interior::payment::RefundOutcome;
use serde::Deserialize;
use serde_json::json;

use crate::infra::AppServices;

pub(super) fn router() -> Router<AppServices> {
    Router::new()
        .route("/api/v1/admin/overview", get(overview))
        .route("/api/v1/admin/reports/bookings", get(booking_report))
        .route("/api/v1/admin/backup", post(backup))
        .route("/api/v1/admin/restore", post(restore))
        .route("/api/v1/admin/users/:user_id/block", post(block_user))
        .route("/api/v1/admin/users/:user_id/unblock", post(unblock_user))
        .route("/api/v1/admin/users/:user_id/stats", get(user_stats))
        .route("/api/v1/admin/owners/:user_id/stats", get(owner_stats))
        .route("/api/v1/admin/bookings/:id/refund", post(admin_refund))
        .route("/api/v1/admin/listings/:id/moderate", post(moderate_listing))
}

async fn overview(State(services): State<AppServices>) -> Result<Json<Overview>, AppError> {
    Ok(Json(services.backoffice.overview()?))
}

#[derive(Debug, Default, Deserialize)]
struct ReportQuery {
    format: Option<ReportFormat>,
}

/// Bookings report: inline JSON by default, downloadable JSON/CSV when a
/// format is requested.
async fn booking_report(
    State(services): State<AppServices>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, AppError> {
    let rows = services.backoffice.booking_report()?;

    let Some(format) = query.format else {
        return Ok(Json(rows).into_response());
    };

    let bytes = match format {
        ReportFormat::Json => booking_report_json(&rows)?,
        ReportFormat::Csv => booking_report_csv(&rows)?,
    };

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", format.file_name()),
            ),
        ],
        bytes,
    )
        .into_response())
}

async fn backup(State(services): State<AppServices>) -> Result<Response, AppError> {
    let report = services.backoffice.write_backup(&services.backup_dir)?;
    Ok((StatusCode::CREATED, Json(report)).into_response())
}

async fn restore(
    State(services): State<AppServices>,
    Json(dump): Json<DatabaseDump>,
) -> Result<Json<serde_json::Value>, AppError> {
    let counts = json!({
        "users": dump.users.len(),
        "listings": dump.catalog.listings.len(),
        "bookings": dump.bookings.len(),
        "ledger_entries": dump.ledger.len(),
        "reviews": dump.reviews.len(),
    });
    services.backoffice.restore(dump)?;
    Ok(Json(json!({ "status": "restored", "counts": counts })))
}

async fn block_user(
    State(services): State<AppServices>,
    Path(user_id): Path<u64>,
) -> Result<Json<UserAccount>, AppError> {
    Ok(Json(services.accounts.block(UserId(user_id))?))
}

async fn unblock_user(
    State(services): State<AppServices>,
    Path(user_id): Path<u64>,
) -> Result<Json<UserAccount>, AppError> {
    Ok(Json(services.accounts.unblock(UserId(user_id))?))
}

async fn user_stats(
    State(services): State<AppServices>,
    Path(user_id): Path<u64>,
) -> Result<Json<UserStats>, AppError> {
    Ok(Json(services.backoffice.user_stats(UserId(user_id))?))
}

async fn owner_stats(
    State(services): State<AppServices>,
    Path(user_id): Path<u64>,
) -> Result<Json<OwnerStats>, AppError> {
    Ok(Json(services.backoffice.owner_stats(UserId(user_id))?))
}

async fn admin_refund(
    State(services): State<AppServices>,
    Path(id): Path<u64>,
) -> Result<Json<RefundOutcome>, AppError> {
    Ok(Json(
        services.payments.process_admin_refund(BookingId(id)).await?,
    ))
}

#[derive(Debug, Deserialize)]
struct ModerateListingRequest {
    is_active: Option<bool>,
    is_featured: Option<bool>,
}

async fn moderate_listing(
    State(services): State<AppServices>,
    Path(id): Path<u64>,
    Json(request): Json<ModerateListingRequest>,
) -> Result<Json<interior::catalog::Listing>, AppError> {
    let update = ListingUpdate {
        is_active: request.is_active,
        is_featured: request.is_featured,
        ..ListingUpdate::default()
    };
    Ok(Json(
        services.catalog.update_listing(ListingId(id), update).await?,
    ))
}
