//! Outbound notification seam: payment receipts, staff alerts, and booking
//! lifecycle notices. Actual delivery (SMTP, messengers) is an external
//! concern; the service ships a tracing-backed implementation and a
//! recording one for tests and demos.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::info;

use crate::booking::domain::Booking;
use crate::payment::domain::decimal_string;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingNotice {
    Created,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingNotice {
    pub const fn label(self) -> &'static str {
        match self {
            BookingNotice::Created => "created",
            BookingNotice::Confirmed => "confirmed",
            BookingNotice::Cancelled => "cancelled",
            BookingNotice::Completed => "completed",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("mail transport unavailable: {0}")]
    Transport(String),
}

/// Outbound delivery hook.
pub trait Mailer: Send + Sync {
    fn payment_receipt(&self, booking: &Booking, amount_minor: i64) -> Result<(), MailError>;
    fn staff_alert(&self, subject: &str, body: &str) -> Result<(), MailError>;
    fn booking_notice(&self, booking: &Booking, notice: BookingNotice) -> Result<(), MailError>;
}

/// Logs every delivery through the telemetry pipeline.
#[derive(Debug, Clone, Default)]
pub struct TracingMailer;

impl Mailer for TracingMailer {
    fn payment_receipt(&self, booking: &Booking, amount_minor: i64) -> Result<(), MailError> {
        info!(
            booking = booking.id.0,
            amount = %decimal_string(amount_minor),
            "payment receipt dispatched"
        );
        Ok(())
    }

    fn staff_alert(&self, subject: &str, body: &str) -> Result<(), MailError> {
        info!(subject, body, "staff alert dispatched");
        Ok(())
    }

    fn booking_notice(&self, booking: &Booking, notice: BookingNotice) -> Result<(), MailError> {
        info!(
            booking = booking.id.0,
            notice = notice.label(),
            "booking notice dispatched"
        );
        Ok(())
    }
}

/// One recorded delivery, for assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Receipt {
        booking_id: u64,
        amount_minor: i64,
    },
    StaffAlert {
        subject: String,
    },
    Notice {
        booking_id: u64,
        notice: BookingNotice,
    },
}

/// In-memory mailer backing tests and the CLI demo.
#[derive(Debug, Clone, Default)]
pub struct RecordingMailer {
    deliveries: Arc<Mutex<Vec<Delivery>>>,
}

impl RecordingMailer {
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().expect("mailer mutex poisoned").clone()
    }
}

impl Mailer for RecordingMailer {
    fn payment_receipt(&self, booking: &Booking, amount_minor: i64) -> Result<(), MailError> {
        self.deliveries
            .lock()
            .expect("mailer mutex poisoned")
            .push(Delivery::Receipt {
                booking_id: booking.id.0,
                amount_minor,
            });
        Ok(())
    }

    fn staff_alert(&self, subject: &str, _body: &str) -> Result<(), MailError> {
        self.deliveries
            .lock()
            .expect("mailer mutex poisoned")
            .push(Delivery::StaffAlert {
                subject: subject.to_string(),
            });
        Ok(())
    }

    fn booking_notice(&self, booking: &Booking, notice: BookingNotice) -> Result<(), MailError> {
        self.deliveries
            .lock()
            .expect("mailer mutex poisoned")
            .push(Delivery::Notice {
                booking_id: booking.id.0,
                notice,
            });
        Ok(())
    }
}
