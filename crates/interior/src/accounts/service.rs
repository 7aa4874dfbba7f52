use std::sync::Arc;

use tracing::info;

use super::domain::{normalize_phone, validate_username, NewUserAccount, UserAccount, UserId};
use super::repository::UserRepository;
use crate::storage::RepositoryError;

/// Registration and moderation operations over user accounts.
pub struct AccountService<U> {
    users: Arc<U>,
}

impl<U> AccountService<U>
where
    U: UserRepository + 'static,
{
    pub fn new(users: Arc<U>) -> Self {
        Self { users }
    }

    pub fn register(&self, mut account: NewUserAccount) -> Result<UserAccount, AccountError> {
        if !validate_username(&account.username) {
            return Err(AccountError::InvalidUsername);
        }
        account.phone = normalize_phone(&account.phone);

        match self.users.insert(account) {
            Ok(user) => {
                info!(user = %user.username, role = user.role.label(), "account registered");
                Ok(user)
            }
            Err(RepositoryError::Conflict) => Err(AccountError::UsernameTaken),
            Err(err) => Err(err.into()),
        }
    }

    pub fn get(&self, id: UserId) -> Result<UserAccount, AccountError> {
        self.users.fetch(id)?.ok_or(AccountError::NotFound)
    }

    /// Block an account. Administrators are never blockable.
    pub fn block(&self, id: UserId) -> Result<UserAccount, AccountError> {
        let mut user = self.get(id)?;
        if matches!(user.role, super::domain::UserRole::Admin) {
            return Err(AccountError::CannotBlockAdmin);
        }

        user.is_blocked = true;
        self.users.update(user.clone())?;
        info!(user = %user.username, "account blocked");
        Ok(user)
    }

    pub fn unblock(&self, id: UserId) -> Result<UserAccount, AccountError> {
        let mut user = self.get(id)?;
        user.is_blocked = false;
        self.users.update(user.clone())?;
        info!(user = %user.username, "account unblocked");
        Ok(user)
    }
}

/// Error raised by account operations.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("username may contain only latin letters, digits, and underscores")]
    InvalidUsername,
    #[error("a user with this username already exists")]
    UsernameTaken,
    #[error("account not found")]
    NotFound,
    #[error("administrator accounts cannot be blocked")]
    CannotBlockAdmin,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
