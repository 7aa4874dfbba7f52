use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::accounts::UserId;
use crate::booking::BookingId;
use crate::catalog::ListingId;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ReviewId(pub u64);

/// A rating left by a renter. Hidden from the public catalog until a
/// moderator approves it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub listing_id: ListingId,
    pub author_id: UserId,
    /// The completed booking backing the review, when one exists.
    pub booking_id: Option<BookingId>,
    pub rating: u8,
    pub comment: String,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReview {
    pub listing_id: ListingId,
    pub author_id: UserId,
    pub booking_id: Option<BookingId>,
    pub rating: u8,
    pub comment: String,
}
