use super::domain::{NewUserAccount, UserAccount, UserId};
use crate::storage::RepositoryError;

/// Storage abstraction for accounts so services can be exercised in isolation.
pub trait UserRepository: Send + Sync {
    /// Insert a new account; fails with `Conflict` when the username is taken.
    fn insert(&self, user: NewUserAccount) -> Result<UserAccount, RepositoryError>;
    fn update(&self, user: UserAccount) -> Result<(), RepositoryError>;
    fn fetch(&self, id: UserId) -> Result<Option<UserAccount>, RepositoryError>;
    fn by_username(&self, username: &str) -> Result<Option<UserAccount>, RepositoryError>;
    fn all(&self) -> Result<Vec<UserAccount>, RepositoryError>;
    /// Replace the whole table; used by backup restore.
    fn replace_all(&self, users: Vec<UserAccount>) -> Result<(), RepositoryError>;
}
