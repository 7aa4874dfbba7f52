use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::booking::BookingId;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct LedgerEntryId(pub u64);

/// Financial outcome a ledger row records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerStatus {
    Succeeded,
    Canceled,
    Refunded,
}

impl LedgerStatus {
    pub const fn label(self) -> &'static str {
        match self {
            LedgerStatus::Succeeded => "succeeded",
            LedgerStatus::Canceled => "canceled",
            LedgerStatus::Refunded => "refunded",
        }
    }
}

/// Append-only record of one financial event tied to a booking.
///
/// `external_id` is the provider's object id (payment id for charges, refund
/// id for refunds) and is unique across the ledger; this uniqueness is what
/// makes webhook redelivery harmless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: LedgerEntryId,
    pub booking_id: BookingId,
    pub status: LedgerStatus,
    /// Minor currency units; negative for refunds.
    pub amount_minor: i64,
    pub payment_method: String,
    pub external_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLedgerEntry {
    pub booking_id: BookingId,
    pub status: LedgerStatus,
    pub amount_minor: i64,
    pub payment_method: String,
    pub external_id: String,
}

/// Prepayment due for a booking total: `percent` of the total, rounded
/// half-up to a minor unit and floored at the provider's minimum charge.
pub fn prepayment_amount(total_minor: i64, percent: u32, min_charge_minor: i64) -> i64 {
    let raw = (total_minor * i64::from(percent) + 50) / 100;
    raw.max(min_charge_minor)
}

/// Parse a decimal money string ("100.00") into minor units.
pub fn minor_from_decimal(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    let (sign, raw) = match raw.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, raw),
    };

    let (whole, frac) = match raw.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (raw, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return None;
    }

    let whole: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().ok()?
    };
    let frac_minor = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().ok()? * 10,
        2 => frac.parse::<i64>().ok()?,
        _ => return None,
    };

    Some(sign * (whole * 100 + frac_minor))
}

/// Render minor units as a decimal money string.
pub fn decimal_string(minor: i64) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

/// Outcome of asking "what happens to the prepayment if this booking is
/// cancelled right now".
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PenaltyCheck {
    pub has_penalty: bool,
    pub penalty_minor: i64,
    /// Prepayment that would come back if cancelled now.
    pub refundable_minor: i64,
    pub hours_until_start: f64,
}

/// Result of a refund request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RefundOutcome {
    /// No prepayment was collected, nothing to do.
    NotPaid,
    /// Cancelled inside the lead window; the prepayment is kept.
    Forfeited { penalty_minor: i64 },
    /// A refund was requested from the provider.
    Requested {
        refund_id: String,
        amount_minor: i64,
    },
}
