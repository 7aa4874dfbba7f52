use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use interior::accounts::UserId;
use interior::catalog::ListingId;
use interior::error::AppError;
use interior::review::{Review, ReviewId, ReviewRequest};
use serde::Deserialize;

use crate::infra::AppServices;

pub(super) fn router() -> Router<AppServices> {
    Router::new()
        .route("/api/v1/reviews", post(submit))
        .route("/api/v1/reviews/pending", get(pending))
        .route("/api/v1/reviews/:id/approve", post(approve))
        .route("/api/v1/reviews/:id/reject", post(reject))
        .route("/api/v1/listings/:id/reviews", get(for_listing))
        .route("/api/v1/users/:user_id/reviews", get(by_author))
}

async fn submit(
    State(services): State<AppServices>,
    Json(request): Json<ReviewRequest>,
) -> Result<(StatusCode, Json<Review>), AppError> {
    let review = services.reviews.submit(request)?;
    Ok((StatusCode::CREATED, Json(review)))
}

#[derive(Debug, Deserialize)]
struct PendingQuery {
    limit: Option<usize>,
}

async fn pending(
    State(services): State<AppServices>,
    Query(query): Query<PendingQuery>,
) -> Result<Json<Vec<Review>>, AppError> {
    Ok(Json(services.reviews.pending(query.limit.unwrap_or(20))?))
}

async fn approve(
    State(services): State<AppServices>,
    Path(id): Path<u64>,
) -> Result<Json<Review>, AppError> {
    Ok(Json(services.reviews.approve(ReviewId(id))?))
}

async fn reject(
    State(services): State<AppServices>,
    Path(id): Path<u64>,
) -> Result<StatusCode, AppError> {
    services.reviews.reject(ReviewId(id))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn for_listing(
    State(services): State<AppServices>,
    Path(id): Path<u64>,
) -> Result<Json<Vec<Review>>, AppError> {
    Ok(Json(services.reviews.approved_for(ListingId(id))?))
}

async fn by_author(
    State(services): State<AppServices>,
    Path(user_id): Path<u64>,
) -> Result<Json<Vec<Review>>, AppError> {
    Ok(Json(services.reviews.by_author(UserId(user_id))?))
}
