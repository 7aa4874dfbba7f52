use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{
    decimal_string, prepayment_amount, LedgerStatus, NewLedgerEntry, PenaltyCheck, RefundOutcome,
};
use super::gateway::{CreatedPayment, GatewayError, PaymentGateway};
use super::ledger::TransactionLedger;
use super::webhook::{
    WebhookEvent, WebhookOutcome, EVENT_PAYMENT_CANCELED, EVENT_PAYMENT_SUCCEEDED,
    EVENT_REFUND_SUCCEEDED, EVENT_WAITING_FOR_CAPTURE,
};
use crate::booking::{Booking, BookingId, BookingRepository};
use crate::config::PaymentConfig;
use crate::notify::Mailer;
use crate::storage::RepositoryError;

const PAYMENT_METHOD: &str = "hosted_checkout";
const MAX_DESCRIPTION_LEN: usize = 128;

/// Prepayment orchestration: checkout creation, webhook event routing, and
/// the cancellation/refund rules.
pub struct PaymentService<B, L, G, M> {
    bookings: Arc<B>,
    ledger: Arc<L>,
    gateway: Arc<G>,
    mailer: Arc<M>,
    config: PaymentConfig,
}

/// Payment state of a booking as exposed over HTTP.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentStatusView {
    pub booking_id: BookingId,
    pub prepayment_paid: bool,
    pub prepayment_amount_minor: Option<i64>,
    pub total_amount_minor: i64,
    pub remaining_amount_minor: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_status: Option<String>,
}

impl<B, L, G, M> PaymentService<B, L, G, M>
where
    B: BookingRepository + 'static,
    L: TransactionLedger + 'static,
    G: PaymentGateway + 'static,
    M: Mailer + 'static,
{
    pub fn new(
        bookings: Arc<B>,
        ledger: Arc<L>,
        gateway: Arc<G>,
        mailer: Arc<M>,
        config: PaymentConfig,
    ) -> Self {
        Self {
            bookings,
            ledger,
            gateway,
            mailer,
            config,
        }
    }

    pub fn config(&self) -> &PaymentConfig {
        &self.config
    }

    /// Prepayment due for a booking total under the configured rules.
    pub fn prepayment_for(&self, total_minor: i64) -> i64 {
        prepayment_amount(
            total_minor,
            self.config.prepayment_percent,
            self.config.min_charge_minor,
        )
    }

    /// Create a hosted-checkout payment for the booking's prepayment and
    /// store the returned external id.
    pub async fn initiate(
        &self,
        booking_id: BookingId,
        return_url: Option<&str>,
    ) -> Result<CreatedPayment, PaymentError> {
        let mut booking = self.booking(booking_id)?;
        if !booking.status.is_active() {
            return Err(PaymentError::NotPayable);
        }
        if booking.prepayment_paid {
            return Err(PaymentError::AlreadyPaid);
        }

        let amount = self.prepayment_for(booking.total_amount_minor);
        let mut description = format!(
            "Prepayment {}% for booking #{}",
            self.config.prepayment_percent, booking.id.0
        );
        description.truncate(MAX_DESCRIPTION_LEN);
        let return_url = return_url.unwrap_or(&self.config.return_url);

        let created = self
            .gateway
            .create(amount, booking.id, &description, return_url)
            .await?;

        booking.payment_ref = Some(created.id.clone());
        booking.updated_at = Utc::now();
        self.bookings.update(booking)?;

        info!(
            booking = booking_id.0,
            payment = %created.id,
            amount = %decimal_string(amount),
            "checkout payment created"
        );
        Ok(created)
    }

    /// Current payment state; polls the provider when a payment reference
    /// exists and the prepayment is still unpaid.
    pub async fn status_of(&self, booking_id: BookingId) -> Result<PaymentStatusView, PaymentError> {
        let booking = self.booking(booking_id)?;
        let mut view = Self::view_of(&booking);

        if let Some(payment_ref) = booking.payment_ref.as_deref() {
            if !booking.prepayment_paid {
                match self.gateway.find(payment_ref).await {
                    Ok(snapshot) => view.gateway_status = Some(snapshot.status),
                    Err(err) => {
                        warn!(booking = booking_id.0, error = %err, "payment status poll failed");
                    }
                }
            }
        }

        Ok(view)
    }

    /// Return-URL landing: verify the payment at the provider and, when it
    /// settled while the customer was away, record it the same way the
    /// `succeeded` webhook would.
    pub async fn confirm_from_return(
        &self,
        booking_id: BookingId,
    ) -> Result<PaymentStatusView, PaymentError> {
        let booking = self.booking(booking_id)?;
        let Some(payment_ref) = booking.payment_ref.clone() else {
            return Ok(Self::view_of(&booking));
        };

        let snapshot = self.gateway.find(&payment_ref).await?;
        if snapshot.paid && !booking.prepayment_paid {
            self.mark_paid(booking, &payment_ref, snapshot.amount_minor)?;
        }

        let booking = self.booking(booking_id)?;
        let mut view = Self::view_of(&booking);
        view.gateway_status = Some(snapshot.status);
        Ok(view)
    }

    /// Route one provider event. Idempotent per external object id: the
    /// ledger's get-or-create is the only thing standing between webhook
    /// redelivery and double side effects.
    pub async fn process_webhook(
        &self,
        event: WebhookEvent,
    ) -> Result<WebhookOutcome, PaymentError> {
        match event.event.as_str() {
            EVENT_WAITING_FOR_CAPTURE => self.handle_waiting_for_capture(&event).await,
            EVENT_PAYMENT_SUCCEEDED => self.handle_payment_succeeded(&event),
            EVENT_PAYMENT_CANCELED => self.handle_payment_canceled(&event),
            EVENT_REFUND_SUCCEEDED => self.handle_refund_succeeded(&event),
            other => {
                info!(event = other, "ignoring unhandled webhook event");
                Ok(WebhookOutcome::Ignored)
            }
        }
    }

    /// Would cancelling now forfeit the prepayment?
    pub fn cancellation_penalty(&self, booking: &Booking, now: DateTime<Utc>) -> PenaltyCheck {
        let hours_until_start =
            (booking.starts_at - now).num_seconds() as f64 / 3600.0;

        if !booking.prepayment_paid {
            return PenaltyCheck {
                has_penalty: false,
                penalty_minor: 0,
                refundable_minor: 0,
                hours_until_start,
            };
        }

        let prepayment = booking.prepayment_amount_minor.unwrap_or(0);
        if hours_until_start < self.config.cancellation_lead_hours as f64 {
            PenaltyCheck {
                has_penalty: true,
                penalty_minor: prepayment,
                refundable_minor: 0,
                hours_until_start,
            }
        } else {
            PenaltyCheck {
                has_penalty: false,
                penalty_minor: 0,
                refundable_minor: prepayment,
                hours_until_start,
            }
        }
    }

    pub fn penalty_for(&self, booking_id: BookingId) -> Result<PenaltyCheck, PaymentError> {
        let booking = self.booking(booking_id)?;
        Ok(self.cancellation_penalty(&booking, Utc::now()))
    }

    /// Apply the cancellation rule: inside the lead window the prepayment is
    /// forfeited, outside it a full refund is requested from the provider.
    pub async fn process_cancellation_refund(
        &self,
        booking_id: BookingId,
        now: DateTime<Utc>,
    ) -> Result<RefundOutcome, PaymentError> {
        let booking = self.booking(booking_id)?;
        if !booking.prepayment_paid {
            return Ok(RefundOutcome::NotPaid);
        }

        let penalty = self.cancellation_penalty(&booking, now);
        if penalty.has_penalty {
            info!(
                booking = booking_id.0,
                penalty = %decimal_string(penalty.penalty_minor),
                "late cancellation, prepayment forfeited"
            );
            return Ok(RefundOutcome::Forfeited {
                penalty_minor: penalty.penalty_minor,
            });
        }

        self.request_refund(booking).await
    }

    /// Back-office refund override: returns the full prepayment regardless
    /// of the cancellation window.
    pub async fn process_admin_refund(
        &self,
        booking_id: BookingId,
    ) -> Result<RefundOutcome, PaymentError> {
        let booking = self.booking(booking_id)?;
        if !booking.prepayment_paid {
            return Err(PaymentError::NothingToRefund);
        }
        self.request_refund(booking).await
    }

    /// Single refund path shared by cancellation and admin refunds. Both are
    /// guarded here so they cannot race each other into a double refund: a
    /// prior request stamp or an existing refunded ledger row stops the
    /// second attempt.
    async fn request_refund(&self, mut booking: Booking) -> Result<RefundOutcome, PaymentError> {
        if booking.refund_requested_at.is_some() {
            return Err(PaymentError::RefundAlreadyRequested);
        }
        let refunded_before = self
            .ledger
            .entries_of(booking.id)?
            .iter()
            .any(|entry| entry.status == LedgerStatus::Refunded);
        if refunded_before {
            return Err(PaymentError::RefundAlreadyRequested);
        }

        let payment_ref = booking
            .payment_ref
            .clone()
            .ok_or(PaymentError::MissingPaymentRef)?;
        let amount = booking
            .prepayment_amount_minor
            .ok_or(PaymentError::NothingToRefund)?;

        let refund = self.gateway.refund(&payment_ref, amount).await?;
        booking.refund_requested_at = Some(Utc::now());
        booking.updated_at = Utc::now();
        self.bookings.update(booking.clone())?;

        info!(
            booking = booking.id.0,
            refund = %refund.id,
            amount = %decimal_string(amount),
            "refund requested"
        );
        Ok(RefundOutcome::Requested {
            refund_id: refund.id,
            amount_minor: amount,
        })
    }

    async fn handle_waiting_for_capture(
        &self,
        event: &WebhookEvent,
    ) -> Result<WebhookOutcome, PaymentError> {
        // Two-stage charge collapsed to one stage: settle the hold right away
        // and let the follow-up `succeeded` event write the ledger row.
        let booking = self.booking_from(event)?;
        let snapshot = self.gateway.capture(&event.object.id).await?;
        info!(
            booking = booking.id.0,
            payment = %event.object.id,
            status = %snapshot.status,
            "hold captured"
        );
        Ok(WebhookOutcome::Captured)
    }

    fn handle_payment_succeeded(&self, event: &WebhookEvent) -> Result<WebhookOutcome, PaymentError> {
        let booking = self.booking_from(event)?;
        let amount = event
            .amount_minor()
            .unwrap_or_else(|| self.prepayment_for(booking.total_amount_minor));

        let (_, created) = self.ledger.record_once(NewLedgerEntry {
            booking_id: booking.id,
            status: LedgerStatus::Succeeded,
            amount_minor: amount,
            payment_method: PAYMENT_METHOD.to_string(),
            external_id: event.object.id.clone(),
        })?;
        if !created {
            return Ok(WebhookOutcome::AlreadyProcessed);
        }

        self.mark_paid(booking, &event.object.id, amount)?;
        Ok(WebhookOutcome::PrepaymentRecorded)
    }

    fn handle_payment_canceled(&self, event: &WebhookEvent) -> Result<WebhookOutcome, PaymentError> {
        let mut booking = self.booking_from(event)?;

        let (_, created) = self.ledger.record_once(NewLedgerEntry {
            booking_id: booking.id,
            status: LedgerStatus::Canceled,
            amount_minor: event.amount_minor().unwrap_or(0),
            payment_method: PAYMENT_METHOD.to_string(),
            external_id: event.object.id.clone(),
        })?;
        if !created {
            return Ok(WebhookOutcome::AlreadyProcessed);
        }

        // The hold never settled, so the stored reference is dead weight.
        if !booking.prepayment_paid {
            booking.payment_ref = None;
            booking.updated_at = Utc::now();
            self.bookings.update(booking.clone())?;
        }

        info!(booking = booking.id.0, payment = %event.object.id, "payment cancelled");
        Ok(WebhookOutcome::PaymentCancelled)
    }

    fn handle_refund_succeeded(&self, event: &WebhookEvent) -> Result<WebhookOutcome, PaymentError> {
        let mut booking = self.booking_from(event)?;
        let amount = event
            .amount_minor()
            .or(booking.prepayment_amount_minor)
            .unwrap_or(0);

        let (_, created) = self.ledger.record_once(NewLedgerEntry {
            booking_id: booking.id,
            status: LedgerStatus::Refunded,
            amount_minor: -amount,
            payment_method: PAYMENT_METHOD.to_string(),
            external_id: event.object.id.clone(),
        })?;
        if !created {
            return Ok(WebhookOutcome::AlreadyProcessed);
        }

        booking.prepayment_paid = false;
        booking.updated_at = Utc::now();
        self.bookings.update(booking.clone())?;

        info!(
            booking = booking.id.0,
            refund = %event.object.id,
            amount = %decimal_string(amount),
            "refund recorded"
        );
        Ok(WebhookOutcome::RefundRecorded)
    }

    fn mark_paid(
        &self,
        mut booking: Booking,
        payment_id: &str,
        amount: i64,
    ) -> Result<(), PaymentError> {
        booking.prepayment_paid = true;
        booking.prepayment_amount_minor = Some(amount);
        booking.payment_ref = Some(payment_id.to_string());
        booking.prepayment_paid_at = Some(Utc::now());
        booking.updated_at = Utc::now();
        self.bookings.update(booking.clone())?;

        if let Err(err) = self.mailer.payment_receipt(&booking, amount) {
            warn!(booking = booking.id.0, error = %err, "receipt delivery failed");
        }
        if let Err(err) = self.mailer.staff_alert(
            "Prepayment received",
            &format!(
                "Booking #{} received a prepayment of {}",
                booking.id.0,
                decimal_string(amount)
            ),
        ) {
            warn!(booking = booking.id.0, error = %err, "staff alert failed");
        }

        info!(
            booking = booking.id.0,
            payment = payment_id,
            amount = %decimal_string(amount),
            "prepayment recorded"
        );
        Ok(())
    }

    fn booking(&self, id: BookingId) -> Result<Booking, PaymentError> {
        self.bookings.fetch(id)?.ok_or(PaymentError::UnknownBooking)
    }

    fn booking_from(&self, event: &WebhookEvent) -> Result<Booking, PaymentError> {
        let booking_id = event
            .object
            .metadata
            .booking_id
            .ok_or(PaymentError::MissingBookingMetadata)?;
        self.booking(BookingId(booking_id))
    }

    fn view_of(booking: &Booking) -> PaymentStatusView {
        PaymentStatusView {
            booking_id: booking.id,
            prepayment_paid: booking.prepayment_paid,
            prepayment_amount_minor: booking.prepayment_amount_minor,
            total_amount_minor: booking.total_amount_minor,
            remaining_amount_minor: booking.remaining_amount_minor(),
            gateway_status: None,
        }
    }
}

/// Error raised by payment operations.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("booking not found")]
    UnknownBooking,
    #[error("prepayment is not available for this booking")]
    NotPayable,
    #[error("the prepayment has already been made")]
    AlreadyPaid,
    #[error("webhook event carries no booking metadata")]
    MissingBookingMetadata,
    #[error("no payment is associated with this booking")]
    MissingPaymentRef,
    #[error("there is no prepayment to refund")]
    NothingToRefund,
    #[error("a refund has already been requested for this booking")]
    RefundAlreadyRequested,
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
