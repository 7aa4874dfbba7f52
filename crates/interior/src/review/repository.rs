use super::domain::{NewReview, Review, ReviewId};
use crate::accounts::UserId;
use crate::catalog::ListingId;
use crate::storage::RepositoryError;

/// Storage abstraction for reviews.
pub trait ReviewRepository: Send + Sync {
    /// Insert a review; fails with `Conflict` when the (listing, author)
    /// pair already has one.
    fn insert(&self, review: NewReview) -> Result<Review, RepositoryError>;
    fn update(&self, review: Review) -> Result<(), RepositoryError>;
    fn remove(&self, id: ReviewId) -> Result<(), RepositoryError>;
    fn fetch(&self, id: ReviewId) -> Result<Option<Review>, RepositoryError>;
    fn for_listing(
        &self,
        listing: ListingId,
        approved_only: bool,
    ) -> Result<Vec<Review>, RepositoryError>;
    fn by_author(&self, author: UserId) -> Result<Vec<Review>, RepositoryError>;
    /// Oldest unapproved reviews, for the moderation queue.
    fn pending(&self, limit: usize) -> Result<Vec<Review>, RepositoryError>;
    fn all(&self) -> Result<Vec<Review>, RepositoryError>;
    fn replace_all(&self, reviews: Vec<Review>) -> Result<(), RepositoryError>;
}
