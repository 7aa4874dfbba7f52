use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::domain::decimal_string;
use super::gateway::{GatewayError, PaymentGateway};
use super::ledger::TransactionLedger;
use super::service::{PaymentError, PaymentService};
use super::webhook::WebhookEvent;
use crate::booking::{BookingId, BookingRepository};
use crate::notify::Mailer;

/// Router builder exposing the checkout endpoints and the provider webhook.
pub fn payment_router<B, L, G, M>(service: Arc<PaymentService<B, L, G, M>>) -> Router
where
    B: BookingRepository + 'static,
    L: TransactionLedger + 'static,
    G: PaymentGateway + 'static,
    M: Mailer + 'static,
{
    Router::new()
        .route(
            "/api/v1/bookings/:id/payment",
            post(initiate_handler::<B, L, G, M>).get(status_handler::<B, L, G, M>),
        )
        .route(
            "/api/v1/bookings/:id/payment/return",
            get(return_handler::<B, L, G, M>),
        )
        .route(
            "/api/v1/bookings/:id/penalty",
            get(penalty_handler::<B, L, G, M>),
        )
        .route("/webhooks/payment", post(webhook_handler::<B, L, G, M>))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct InitiatePaymentRequest {
    pub(crate) return_url: Option<String>,
}

pub(crate) async fn initiate_handler<B, L, G, M>(
    State(service): State<Arc<PaymentService<B, L, G, M>>>,
    Path(booking_id): Path<u64>,
    payload: Option<Json<InitiatePaymentRequest>>,
) -> Response
where
    B: BookingRepository + 'static,
    L: TransactionLedger + 'static,
    G: PaymentGateway + 'static,
    M: Mailer + 'static,
{
    let request = payload.map(|Json(body)| body).unwrap_or_default();
    match service
        .initiate(BookingId(booking_id), request.return_url.as_deref())
        .await
    {
        Ok(created) => {
            let body = json!({
                "payment_id": created.id,
                "confirmation_url": created.confirmation_url,
                "amount_minor": created.amount_minor,
            });
            (StatusCode::CREATED, Json(body)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn status_handler<B, L, G, M>(
    State(service): State<Arc<PaymentService<B, L, G, M>>>,
    Path(booking_id): Path<u64>,
) -> Response
where
    B: BookingRepository + 'static,
    L: TransactionLedger + 'static,
    G: PaymentGateway + 'static,
    M: Mailer + 'static,
{
    match service.status_of(BookingId(booking_id)).await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn return_handler<B, L, G, M>(
    State(service): State<Arc<PaymentService<B, L, G, M>>>,
    Path(booking_id): Path<u64>,
) -> Response
where
    B: BookingRepository + 'static,
    L: TransactionLedger + 'static,
    G: PaymentGateway + 'static,
    M: Mailer + 'static,
{
    match service.confirm_from_return(BookingId(booking_id)).await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn penalty_handler<B, L, G, M>(
    State(service): State<Arc<PaymentService<B, L, G, M>>>,
    Path(booking_id): Path<u64>,
) -> Response
where
    B: BookingRepository + 'static,
    L: TransactionLedger + 'static,
    G: PaymentGateway + 'static,
    M: Mailer + 'static,
{
    let lead_hours = service.config().cancellation_lead_hours;
    match service.penalty_for(BookingId(booking_id)) {
        Ok(penalty) => {
            let message = if penalty.has_penalty {
                format!(
                    "Cancelling less than {lead_hours} hours before the start forfeits the prepayment of {}.",
                    decimal_string(penalty.penalty_minor)
                )
            } else if penalty.refundable_minor > 0 {
                format!(
                    "Cancelling more than {lead_hours} hours before the start refunds the prepayment."
                )
            } else {
                "No prepayment has been made.".to_string()
            };

            let body = json!({
                "has_penalty": penalty.has_penalty,
                "penalty_minor": penalty.penalty_minor,
                "refundable_minor": penalty.refundable_minor,
                "hours_until_start": penalty.hours_until_start,
                "message": message,
            });
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => error_response(err),
    }
}

/// Provider webhook intake. Failures answer non-2xx so the provider retries;
/// the handler is safe to re-invoke because event processing is idempotent
/// per external object id.
pub(crate) async fn webhook_handler<B, L, G, M>(
    State(service): State<Arc<PaymentService<B, L, G, M>>>,
    Json(event): Json<WebhookEvent>,
) -> Response
where
    B: BookingRepository + 'static,
    L: TransactionLedger + 'static,
    G: PaymentGateway + 'static,
    M: Mailer + 'static,
{
    match service.process_webhook(event).await {
        Ok(outcome) => {
            let body = json!({ "status": "ok", "action": outcome });
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => {
            error!(error = %err, "webhook processing failed");
            error_response(err)
        }
    }
}

fn error_response(err: PaymentError) -> Response {
    let status = match &err {
        PaymentError::UnknownBooking => StatusCode::NOT_FOUND,
        PaymentError::NotPayable
        | PaymentError::AlreadyPaid
        | PaymentError::MissingPaymentRef
        | PaymentError::NothingToRefund
        | PaymentError::RefundAlreadyRequested => StatusCode::CONFLICT,
        PaymentError::MissingBookingMetadata => StatusCode::BAD_REQUEST,
        PaymentError::Gateway(GatewayError::NotConfigured) => StatusCode::SERVICE_UNAVAILABLE,
        PaymentError::Gateway(_) => StatusCode::BAD_GATEWAY,
        PaymentError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let body = json!({ "error": err.to_string() });
    (status, Json(body)).into_response()
}
