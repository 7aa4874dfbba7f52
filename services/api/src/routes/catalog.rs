use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use interior::accounts::UserId;
use interior::catalog::{
    ListingId, ListingImageId, ListingUpdate, NewListing, NewListingImage, Page, SearchFilter,
};
use interior::error::AppError;
use serde::Deserialize;
use serde_json::json;

use crate::infra::AppServices;

pub(super) fn router() -> Router<AppServices> {
    Router::new()
        .route("/api/v1/listings", get(search).post(create))
        .route("/api/v1/listings/featured", get(featured))
        .route("/api/v1/listings/:id", get(detail).put(update))
        .route("/api/v1/listings/:id/related", get(related))
        .route("/api/v1/listings/:id/images", get(images).post(add_image))
        .route(
            "/api/v1/listings/:id/images/:image_id/primary",
            post(set_primary_image),
        )
        .route("/api/v1/listings/:id/favorite", post(toggle_favorite))
        .route("/api/v1/users/:user_id/favorites", get(favorites))
}

async fn search(
    State(services): State<AppServices>,
    Query(filter): Query<SearchFilter>,
) -> Result<Json<Page<interior::catalog::ListingSummary>>, AppError> {
    Ok(Json(services.catalog.search(&filter)?))
}

#[derive(Debug, Deserialize)]
struct LimitQuery {
    limit: Option<usize>,
}

async fn featured(
    State(services): State<AppServices>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<interior::catalog::ListingSummary>>, AppError> {
    Ok(Json(services.catalog.featured(query.limit.unwrap_or(6))?))
}

async fn detail(
    State(services): State<AppServices>,
    Path(id): Path<u64>,
) -> Result<Json<interior::catalog::ListingDetail>, AppError> {
    Ok(Json(services.catalog.detail(ListingId(id))?))
}

async fn related(
    State(services): State<AppServices>,
    Path(id): Path<u64>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<interior::catalog::ListingSummary>>, AppError> {
    Ok(Json(
        services
            .catalog
            .related(ListingId(id), query.limit.unwrap_or(4))?,
    ))
}

async fn create(
    State(services): State<AppServices>,
    Json(listing): Json<NewListing>,
) -> Result<(StatusCode, Json<interior::catalog::Listing>), AppError> {
    let listing = services.catalog.create_listing(listing).await?;
    Ok((StatusCode::CREATED, Json(listing)))
}

async fn update(
    State(services): State<AppServices>,
    Path(id): Path<u64>,
    Json(update): Json<ListingUpdate>,
) -> Result<Json<interior::catalog::Listing>, AppError> {
    Ok(Json(
        services.catalog.update_listing(ListingId(id), update).await?,
    ))
}

#[derive(Debug, Deserialize)]
struct ImagePayload {
    #[serde(default)]
    alt_text: String,
    #[serde(default)]
    is_primary: bool,
    #[serde(default)]
    sort_order: u16,
}

async fn images(
    State(services): State<AppServices>,
    Path(id): Path<u64>,
) -> Result<Json<Vec<interior::catalog::ImageView>>, AppError> {
    Ok(Json(services.catalog.images_of(ListingId(id))?))
}

async fn add_image(
    State(services): State<AppServices>,
    Path(id): Path<u64>,
    Json(payload): Json<ImagePayload>,
) -> Result<(StatusCode, Json<interior::catalog::ListingImage>), AppError> {
    let image = services.catalog.add_image(NewListingImage {
        listing_id: ListingId(id),
        alt_text: payload.alt_text,
        is_primary: payload.is_primary,
        sort_order: payload.sort_order,
    })?;
    Ok((StatusCode::CREATED, Json(image)))
}

async fn set_primary_image(
    State(services): State<AppServices>,
    Path((id, image_id)): Path<(u64, u64)>,
) -> Result<Json<serde_json::Value>, AppError> {
    services
        .catalog
        .set_primary_image(ListingId(id), ListingImageId(image_id))?;
    Ok(Json(json!({ "status": "ok" })))
}

#[derive(Debug, Deserialize)]
struct FavoriteRequest {
    user_id: u64,
}

async fn toggle_favorite(
    State(services): State<AppServices>,
    Path(id): Path<u64>,
    Json(request): Json<FavoriteRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let favorited = services
        .catalog
        .toggle_favorite(UserId(request.user_id), ListingId(id))?;
    Ok(Json(json!({ "favorited": favorited })))
}

async fn favorites(
    State(services): State<AppServices>,
    Path(user_id): Path<u64>,
) -> Result<Json<Vec<interior::catalog::ListingSummary>>, AppError> {
    Ok(Json(services.catalog.favorites_of(UserId(user_id))?))
}
