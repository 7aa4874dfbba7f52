use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::accounts::UserId;
use crate::catalog::{ListingId, RentalPeriodId};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct BookingId(pub u64);

/// Fixed status vocabulary for a booking.
///
/// `Completed` and `Cancelled` are terminal; only `Pending` and `Confirmed`
/// bookings occupy their time interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub const fn label(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// Active bookings block the listing's calendar.
    pub const fn is_active(self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub listing_id: ListingId,
    pub tenant_id: UserId,
    pub period_id: RentalPeriodId,
    pub status: BookingStatus,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub periods_count: u32,
    pub price_per_period_minor: i64,
    pub total_amount_minor: i64,
    pub comment: String,
    pub prepayment_paid: bool,
    pub prepayment_amount_minor: Option<i64>,
    /// External payment id assigned by the hosted-checkout provider.
    pub payment_ref: Option<String>,
    pub prepayment_paid_at: Option<DateTime<Utc>>,
    /// Stamped when a refund has been requested from the provider; guards
    /// against issuing a second refund for the same prepayment.
    pub refund_requested_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn is_cancellable(&self) -> bool {
        self.status.is_active()
    }

    pub fn remaining_amount_minor(&self) -> i64 {
        self.total_amount_minor - self.prepayment_amount_minor.unwrap_or(0)
    }
}

/// Creation payload; the repository assigns the id and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBooking {
    pub listing_id: ListingId,
    pub tenant_id: UserId,
    pub period_id: RentalPeriodId,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub periods_count: u32,
    pub price_per_period_minor: i64,
    pub total_amount_minor: i64,
    pub comment: String,
}

/// Price breakdown for a prospective booking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub price_per_period_minor: i64,
    pub total_minor: i64,
    pub total_hours: u64,
    pub period_description: String,
}

/// Half-open interval overlap: `[a_start, a_end)` intersects `[b_start, b_end)`.
pub fn intervals_overlap(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && a_end > b_start
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn touching_intervals_do_not_overlap() {
        assert!(!intervals_overlap(at(10), at(12), at(12), at(14)));
        assert!(!intervals_overlap(at(12), at(14), at(10), at(12)));
    }

    #[test]
    fn nested_and_crossing_intervals_overlap() {
        assert!(intervals_overlap(at(10), at(14), at(11), at(12)));
        assert!(intervals_overlap(at(10), at(12), at(11), at(14)));
        assert!(intervals_overlap(at(11), at(14), at(10), at(12)));
    }

    #[test]
    fn status_activity_matches_lifecycle() {
        assert!(BookingStatus::Pending.is_active());
        assert!(BookingStatus::Confirmed.is_active());
        assert!(!BookingStatus::Completed.is_active());
        assert!(BookingStatus::Cancelled.is_terminal());
    }
}
