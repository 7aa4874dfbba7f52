//! Prepayment handling: amount math, the hosted-checkout gateway seam, the
//! append-only transaction ledger, webhook event routing, and refunds.

pub mod domain;
pub mod gateway;
pub mod ledger;
pub mod router;
pub mod service;
pub mod webhook;

pub use domain::{
    decimal_string, minor_from_decimal, prepayment_amount, LedgerEntry, LedgerEntryId,
    LedgerStatus, NewLedgerEntry, PenaltyCheck, RefundOutcome,
};
pub use gateway::{
    CreatedPayment, CreatedRefund, GatewayError, HostedCheckoutClient, PaymentGateway,
    PaymentSnapshot,
};
pub use ledger::TransactionLedger;
pub use router::payment_router;
pub use service::{PaymentError, PaymentService, PaymentStatusView};
pub use webhook::{
    WebhookEvent, WebhookObject, WebhookOutcome, EVENT_PAYMENT_CANCELED,
    EVENT_PAYMENT_SUCCEEDED, EVENT_REFUND_SUCCEEDED, EVENT_WAITING_FOR_CAPTURE,
};
