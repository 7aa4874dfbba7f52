use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::report::BackofficeService;
use crate::accounts::{UserAccount, UserRepository};
use crate::booking::{Booking, BookingRepository};
use crate::catalog::{CatalogRepository, CatalogSnapshot};
use crate::payment::{LedgerEntry, TransactionLedger};
use crate::review::{Review, ReviewRepository};
use crate::storage::RepositoryError;

/// Everything the service persists, as one JSON document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseDump {
    pub created_at: DateTime<Utc>,
    pub users: Vec<UserAccount>,
    pub catalog: CatalogSnapshot,
    pub bookings: Vec<Booking>,
    pub ledger: Vec<LedgerEntry>,
    pub reviews: Vec<Review>,
}

/// What a backup run produced.
#[derive(Debug, Clone, Serialize)]
pub struct BackupReport {
    pub path: PathBuf,
    pub bytes: u64,
    pub users: usize,
    pub listings: usize,
    pub bookings: usize,
    pub ledger_entries: usize,
    pub reviews: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    #[error("backup io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("backup serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl<U, C, B, L, V> BackofficeService<U, C, B, L, V>
where
    U: UserRepository + 'static,
    C: CatalogRepository + 'static,
    B: BookingRepository + 'static,
    L: TransactionLedger + 'static,
    V: ReviewRepository + 'static,
{
    /// Collect every repository's rows into one dump document.
    pub fn dump(&self) -> Result<DatabaseDump, BackupError> {
        Ok(DatabaseDump {
            created_at: Utc::now(),
            users: self.users.all()?,
            catalog: self.catalog.snapshot()?,
            bookings: self.bookings.all()?,
            ledger: self.ledger.all()?,
            reviews: self.reviews.all()?,
        })
    }

    /// Dump to a timestamped JSON file under `dir`.
    pub fn write_backup(&self, dir: &Path) -> Result<BackupReport, BackupError> {
        let dump = self.dump()?;
        fs::create_dir_all(dir)?;

        let file_name = format!("backup-{}.json", dump.created_at.format("%Y%m%d-%H%M%S"));
        let path = dir.join(file_name);
        let bytes = serde_json::to_vec_pretty(&dump)?;
        fs::write(&path, &bytes)?;

        info!(path = %path.display(), bytes = bytes.len(), "database backup written");
        Ok(BackupReport {
            path,
            bytes: bytes.len() as u64,
            users: dump.users.len(),
            listings: dump.catalog.listings.len(),
            bookings: dump.bookings.len(),
            ledger_entries: dump.ledger.len(),
            reviews: dump.reviews.len(),
        })
    }

    /// Replace every repository's contents with the dump's rows.
    pub fn restore(&self, dump: DatabaseDump) -> Result<(), BackupError> {
        self.users.replace_all(dump.users)?;
        self.catalog.restore(dump.catalog)?;
        self.bookings.replace_all(dump.bookings)?;
        self.ledger.replace_all(dump.ledger)?;
        self.reviews.replace_all(dump.reviews)?;
        info!("database restored from dump");
        Ok(())
    }

    /// Load and restore a dump file written by `write_backup`.
    pub fn restore_from_file(&self, path: &Path) -> Result<DatabaseDump, BackupError> {
        let bytes = fs::read(path)?;
        let dump: DatabaseDump = serde_json::from_slice(&bytes)?;
        self.restore(dump.clone())?;
        Ok(dump)
    }
}
