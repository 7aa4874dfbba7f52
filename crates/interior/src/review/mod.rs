//! Reviews: one per (listing, author), moderated before publication, with a
//! profanity screen on submitted comments.

pub mod domain;
pub mod profanity;
pub mod repository;
pub mod service;

pub use domain::{NewReview, Review, ReviewId};
pub use profanity::{censor, contains_profanity, validate_comment};
pub use repository::ReviewRepository;
pub use service::{ReviewError, ReviewRequest, ReviewService};
