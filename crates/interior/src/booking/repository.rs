use chrono::{DateTime, Utc};

use super::domain::{Booking, BookingId, NewBooking};
use crate::accounts::UserId;
use crate::catalog::ListingId;
use crate::storage::RepositoryError;

/// Storage abstraction for bookings.
pub trait BookingRepository: Send + Sync {
    fn insert(&self, booking: NewBooking) -> Result<Booking, RepositoryError>;
    fn update(&self, booking: Booking) -> Result<(), RepositoryError>;
    fn fetch(&self, id: BookingId) -> Result<Option<Booking>, RepositoryError>;
    /// Active (pending/confirmed) bookings of a listing whose half-open
    /// interval intersects `[starts_at, ends_at)`, optionally excluding one
    /// booking (edits re-check availability against everyone else).
    fn overlapping(
        &self,
        listing: ListingId,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
        exclude: Option<BookingId>,
    ) -> Result<Vec<Booking>, RepositoryError>;
    fn of_user(&self, user: UserId) -> Result<Vec<Booking>, RepositoryError>;
    fn of_listing(&self, listing: ListingId) -> Result<Vec<Booking>, RepositoryError>;
    fn all(&self) -> Result<Vec<Booking>, RepositoryError>;
    fn replace_all(&self, bookings: Vec<Booking>) -> Result<(), RepositoryError>;
}
