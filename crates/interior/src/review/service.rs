use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use super::domain::{NewReview, Review, ReviewId};
use super::profanity::validate_comment;
use super::repository::ReviewRepository;
use crate::accounts::UserId;
use crate::booking::{BookingRepository, BookingStatus};
use crate::catalog::{CatalogRepository, ListingId};
use crate::storage::RepositoryError;

/// Incoming review submission.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewRequest {
    pub listing_id: ListingId,
    pub author_id: UserId,
    pub rating: u8,
    pub comment: String,
}

/// Review submission and moderation.
pub struct ReviewService<V, C, B> {
    reviews: Arc<V>,
    catalog: Arc<C>,
    bookings: Arc<B>,
}

impl<V, C, B> ReviewService<V, C, B>
where
    V: ReviewRepository + 'static,
    C: CatalogRepository + 'static,
    B: BookingRepository + 'static,
{
    pub fn new(reviews: Arc<V>, catalog: Arc<C>, bookings: Arc<B>) -> Self {
        Self {
            reviews,
            catalog,
            bookings,
        }
    }

    /// Validate and store an unapproved review. When the author has a
    /// completed booking for the listing, the review links to it.
    pub fn submit(&self, request: ReviewRequest) -> Result<Review, ReviewError> {
        let listing = self
            .catalog
            .listing(request.listing_id)?
            .ok_or(ReviewError::ListingNotFound)?;
        if !listing.is_active {
            return Err(ReviewError::ListingNotFound);
        }

        if !(1..=5).contains(&request.rating) {
            return Err(ReviewError::InvalidRating);
        }
        validate_comment(&request.comment).map_err(ReviewError::InvalidComment)?;

        let completed_booking = self
            .bookings
            .of_user(request.author_id)?
            .into_iter()
            .find(|booking| {
                booking.listing_id == request.listing_id
                    && booking.status == BookingStatus::Completed
            })
            .map(|booking| booking.id);

        match self.reviews.insert(NewReview {
            listing_id: request.listing_id,
            author_id: request.author_id,
            booking_id: completed_booking,
            rating: request.rating,
            comment: request.comment,
        }) {
            Ok(review) => {
                info!(
                    review = review.id.0,
                    listing = review.listing_id.0,
                    rating = review.rating,
                    "review submitted for moderation"
                );
                Ok(review)
            }
            Err(RepositoryError::Conflict) => Err(ReviewError::AlreadyReviewed),
            Err(err) => Err(err.into()),
        }
    }

    /// Make a review publicly visible.
    pub fn approve(&self, id: ReviewId) -> Result<Review, ReviewError> {
        let mut review = self.fetch(id)?;
        review.is_approved = true;
        self.reviews.update(review.clone())?;
        info!(review = id.0, "review approved");
        Ok(review)
    }

    /// Drop a review that failed moderation.
    pub fn reject(&self, id: ReviewId) -> Result<(), ReviewError> {
        self.fetch(id)?;
        self.reviews.remove(id)?;
        info!(review = id.0, "review rejected");
        Ok(())
    }

    pub fn approved_for(&self, listing: ListingId) -> Result<Vec<Review>, ReviewError> {
        Ok(self.reviews.for_listing(listing, true)?)
    }

    pub fn pending(&self, limit: usize) -> Result<Vec<Review>, ReviewError> {
        Ok(self.reviews.pending(limit)?)
    }

    pub fn by_author(&self, author: UserId) -> Result<Vec<Review>, ReviewError> {
        Ok(self.reviews.by_author(author)?)
    }

    fn fetch(&self, id: ReviewId) -> Result<Review, ReviewError> {
        self.reviews.fetch(id)?.ok_or(ReviewError::NotFound)
    }
}

/// Error raised by review operations.
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("review not found")]
    NotFound,
    #[error("listing not found")]
    ListingNotFound,
    #[error("you have already reviewed this listing")]
    AlreadyReviewed,
    #[error("rating must be between 1 and 5")]
    InvalidRating,
    #[error("{0}")]
    InvalidComment(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
