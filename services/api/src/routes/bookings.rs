use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use interior::accounts::UserId;
use interior::booking::{Booking, BookingId, BookingRequest, BookingStatus, Quote};
use interior::catalog::{ListingId, RentalPeriodId};
use interior::error::AppError;
use interior::payment::RefundOutcome;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::infra::AppServices;

pub(super) fn router() -> Router<AppServices> {
    Router::new()
        .route("/api/v1/bookings", post(create))
        .route("/api/v1/bookings/quote", get(quote))
        .route("/api/v1/bookings/:id", get(get_booking))
        .route("/api/v1/bookings/:id/confirm", post(confirm))
        .route("/api/v1/bookings/:id/complete", post(complete))
        .route("/api/v1/bookings/:id/cancel", post(cancel))
        .route("/api/v1/users/:user_id/bookings", get(of_user))
        .route("/api/v1/listings/:id/bookings", get(of_listing))
}

#[derive(Debug, Deserialize)]
struct QuoteQuery {
    listing_id: u64,
    period_id: u64,
    periods_count: u32,
}

async fn quote(
    State(services): State<AppServices>,
    Query(query): Query<QuoteQuery>,
) -> Result<Json<Quote>, AppError> {
    Ok(Json(services.bookings.quote(
        ListingId(query.listing_id),
        RentalPeriodId(query.period_id),
        query.periods_count,
    )?))
}

async fn create(
    State(services): State<AppServices>,
    Json(request): Json<BookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let booking = services.bookings.create(request)?;
    Ok((StatusCode::CREATED, Json(booking)))
}

async fn get_booking(
    State(services): State<AppServices>,
    Path(id): Path<u64>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(services.bookings.get(BookingId(id))?))
}

async fn confirm(
    State(services): State<AppServices>,
    Path(id): Path<u64>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(services.bookings.confirm(BookingId(id))?))
}

async fn complete(
    State(services): State<AppServices>,
    Path(id): Path<u64>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(services.bookings.complete(BookingId(id))?))
}

#[derive(Debug, Serialize)]
struct CancellationResponse {
    booking: Booking,
    #[serde(skip_serializing_if = "Option::is_none")]
    refund: Option<RefundOutcome>,
}

/// Cancel a booking, applying the prepayment rule first: outside the lead
/// window a refund is requested, inside it the prepayment is forfeited. A
/// refund failure is reported but never blocks the cancellation itself.
async fn cancel(
    State(services): State<AppServices>,
    Path(id): Path<u64>,
) -> Result<Json<CancellationResponse>, AppError> {
    let id = BookingId(id);
    let booking = services.bookings.get(id)?;
    if !booking.is_cancellable() {
        return Err(AppError::Booking(
            interior::booking::BookingError::NotCancellable,
        ));
    }

    let refund = match services
        .payments
        .process_cancellation_refund(id, Utc::now())
        .await
    {
        Ok(outcome) => Some(outcome),
        Err(err) => {
            warn!(booking = id.0, error = %err, "cancellation refund failed");
            None
        }
    };

    let booking = services.bookings.cancel(id)?;
    Ok(Json(CancellationResponse { booking, refund }))
}

#[derive(Debug, Deserialize)]
struct UserBookingsQuery {
    status: Option<BookingStatus>,
}

async fn of_user(
    State(services): State<AppServices>,
    Path(user_id): Path<u64>,
    Query(query): Query<UserBookingsQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    Ok(Json(
        services.bookings.of_user(UserId(user_id), query.status)?,
    ))
}

#[derive(Debug, Deserialize)]
struct ListingBookingsQuery {
    #[serde(default)]
    include_cancelled: bool,
}

async fn of_listing(
    State(services): State<AppServices>,
    Path(id): Path<u64>,
    Query(query): Query<ListingBookingsQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    Ok(Json(
        services
            .bookings
            .of_listing(ListingId(id), query.include_cancelled)?,
    ))
}
