use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tracing::{info, warn};

use super::domain::{Booking, BookingId, BookingStatus, NewBooking, Quote};
use super::repository::BookingRepository;
use crate::accounts::UserId;
use crate::catalog::{CatalogRepository, ListingId, RentalPeriodId};
use crate::notify::{BookingNotice, Mailer};
use crate::storage::RepositoryError;

/// Incoming booking request as accepted by the HTTP surface.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub listing_id: ListingId,
    pub tenant_id: UserId,
    pub period_id: RentalPeriodId,
    pub starts_at: DateTime<Utc>,
    pub periods_count: u32,
    #[serde(default)]
    pub comment: String,
}

/// Quoting, availability checking, and the booking state machine.
pub struct BookingService<B, C, M> {
    bookings: Arc<B>,
    catalog: Arc<C>,
    mailer: Arc<M>,
}

impl<B, C, M> BookingService<B, C, M>
where
    B: BookingRepository + 'static,
    C: CatalogRepository + 'static,
    M: Mailer + 'static,
{
    pub fn new(bookings: Arc<B>, catalog: Arc<C>, mailer: Arc<M>) -> Self {
        Self {
            bookings,
            catalog,
            mailer,
        }
    }

    /// Price a prospective booking without persisting anything.
    pub fn quote(
        &self,
        listing_id: ListingId,
        period_id: RentalPeriodId,
        periods_count: u32,
    ) -> Result<Quote, BookingError> {
        let period = self
            .catalog
            .period(period_id)?
            .ok_or(BookingError::PeriodNotFound)?;
        let price = self
            .catalog
            .active_price(listing_id, period_id)?
            .ok_or(BookingError::PriceNotFound)?;

        if periods_count < price.min_periods || periods_count > price.max_periods {
            return Err(BookingError::PeriodsOutOfRange {
                min: price.min_periods,
                max: price.max_periods,
            });
        }

        Ok(Quote {
            price_per_period_minor: price.price_minor,
            total_minor: price.price_minor * i64::from(periods_count),
            total_hours: u64::from(period.hours_count) * u64::from(periods_count),
            period_description: period.description,
        })
    }

    /// True when no pending/confirmed booking of the listing intersects the
    /// half-open interval. Storage failures count as unavailable.
    pub fn is_available(
        &self,
        listing_id: ListingId,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
        exclude: Option<BookingId>,
    ) -> bool {
        match self
            .bookings
            .overlapping(listing_id, starts_at, ends_at, exclude)
        {
            Ok(conflicts) => conflicts.is_empty(),
            Err(err) => {
                warn!(listing = listing_id.0, error = %err, "availability check failed");
                false
            }
        }
    }

    /// Create a booking in `Pending` status after price and availability
    /// checks.
    pub fn create(&self, request: BookingRequest) -> Result<Booking, BookingError> {
        let listing = self
            .catalog
            .listing(request.listing_id)?
            .ok_or(BookingError::ListingNotFound)?;
        if !listing.is_active {
            return Err(BookingError::ListingInactive);
        }

        let quote = self.quote(request.listing_id, request.period_id, request.periods_count)?;
        let ends_at = request.starts_at + Duration::hours(quote.total_hours as i64);

        if !self.is_available(request.listing_id, request.starts_at, ends_at, None) {
            return Err(BookingError::Conflict);
        }

        let booking = self.bookings.insert(NewBooking {
            listing_id: request.listing_id,
            tenant_id: request.tenant_id,
            period_id: request.period_id,
            starts_at: request.starts_at,
            ends_at,
            periods_count: request.periods_count,
            price_per_period_minor: quote.price_per_period_minor,
            total_amount_minor: quote.total_minor,
            comment: request.comment,
        })?;

        info!(
            booking = booking.id.0,
            listing = booking.listing_id.0,
            total = booking.total_amount_minor,
            "booking created"
        );
        self.notify(&booking, BookingNotice::Created);
        Ok(booking)
    }

    /// Pending → Confirmed.
    pub fn confirm(&self, id: BookingId) -> Result<Booking, BookingError> {
        let mut booking = self.fetch(id)?;
        if booking.status != BookingStatus::Pending {
            return Err(BookingError::ConfirmRequiresPending);
        }

        booking.status = BookingStatus::Confirmed;
        booking.updated_at = Utc::now();
        self.bookings.update(booking.clone())?;
        info!(booking = id.0, "booking confirmed");
        self.notify(&booking, BookingNotice::Confirmed);
        Ok(booking)
    }

    /// Confirmed → Completed.
    pub fn complete(&self, id: BookingId) -> Result<Booking, BookingError> {
        let mut booking = self.fetch(id)?;
        if booking.status != BookingStatus::Confirmed {
            return Err(BookingError::CompleteRequiresConfirmed);
        }

        booking.status = BookingStatus::Completed;
        booking.updated_at = Utc::now();
        self.bookings.update(booking.clone())?;
        info!(booking = id.0, "booking completed");
        self.notify(&booking, BookingNotice::Completed);
        Ok(booking)
    }

    /// Pending|Confirmed → Cancelled. Refund handling happens upstream, in
    /// the payment service.
    pub fn cancel(&self, id: BookingId) -> Result<Booking, BookingError> {
        let mut booking = self.fetch(id)?;
        if !booking.is_cancellable() {
            return Err(BookingError::NotCancellable);
        }

        booking.status = BookingStatus::Cancelled;
        booking.updated_at = Utc::now();
        self.bookings.update(booking.clone())?;
        info!(booking = id.0, "booking cancelled");
        self.notify(&booking, BookingNotice::Cancelled);
        Ok(booking)
    }

    pub fn get(&self, id: BookingId) -> Result<Booking, BookingError> {
        self.fetch(id)
    }

    /// A user's bookings, newest first, optionally narrowed to one status.
    pub fn of_user(
        &self,
        user: UserId,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>, BookingError> {
        let mut bookings = self.bookings.of_user(user)?;
        if let Some(status) = status {
            bookings.retain(|booking| booking.status == status);
        }
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    /// A listing's bookings ordered by start time.
    pub fn of_listing(
        &self,
        listing: ListingId,
        include_cancelled: bool,
    ) -> Result<Vec<Booking>, BookingError> {
        let mut bookings = self.bookings.of_listing(listing)?;
        if !include_cancelled {
            bookings.retain(|booking| booking.status != BookingStatus::Cancelled);
        }
        bookings.sort_by(|a, b| a.starts_at.cmp(&b.starts_at));
        Ok(bookings)
    }

    fn fetch(&self, id: BookingId) -> Result<Booking, BookingError> {
        self.bookings.fetch(id)?.ok_or(BookingError::NotFound)
    }

    fn notify(&self, booking: &Booking, notice: BookingNotice) {
        if let Err(err) = self.mailer.booking_notice(booking, notice) {
            warn!(booking = booking.id.0, error = %err, "booking notice failed");
        }
    }
}

/// Error raised by booking operations.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("booking not found")]
    NotFound,
    #[error("listing not found")]
    ListingNotFound,
    #[error("this listing is not accepting bookings")]
    ListingInactive,
    #[error("rental period not found")]
    PeriodNotFound,
    #[error("no active price for the selected period")]
    PriceNotFound,
    #[error("periods count must be between {min} and {max}")]
    PeriodsOutOfRange { min: u32, max: u32 },
    #[error("the listing is already booked for the requested interval")]
    Conflict,
    #[error("only a pending booking can be confirmed")]
    ConfirmRequiresPending,
    #[error("only a confirmed booking can be completed")]
    CompleteRequiresConfirmed,
    #[error("this booking can no longer be cancelled")]
    NotCancellable,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
