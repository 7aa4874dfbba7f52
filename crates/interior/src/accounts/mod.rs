//! User accounts: roles, registration validation, and moderation actions.

pub mod domain;
pub mod repository;
pub mod service;

pub use domain::{normalize_phone, validate_username, NewUserAccount, UserAccount, UserId, UserRole};
pub use repository::UserRepository;
pub use service::{AccountError, AccountService};
