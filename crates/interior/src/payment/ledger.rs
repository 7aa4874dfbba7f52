use super::domain::{LedgerEntry, NewLedgerEntry};
use crate::booking::BookingId;
use crate::storage::RepositoryError;

/// Append-only transaction ledger keyed on the provider's external id.
pub trait TransactionLedger: Send + Sync {
    /// Get-or-create semantics: when a row with the same `external_id`
    /// already exists it is returned with `false` and nothing is written.
    /// This is the only defense against webhook redelivery, so it must hold
    /// under concurrent calls.
    fn record_once(&self, entry: NewLedgerEntry) -> Result<(LedgerEntry, bool), RepositoryError>;
    fn find_external(&self, external_id: &str) -> Result<Option<LedgerEntry>, RepositoryError>;
    fn entries_of(&self, booking: BookingId) -> Result<Vec<LedgerEntry>, RepositoryError>;
    fn all(&self) -> Result<Vec<LedgerEntry>, RepositoryError>;
    fn replace_all(&self, entries: Vec<LedgerEntry>) -> Result<(), RepositoryError>;
}
