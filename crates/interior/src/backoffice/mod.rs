//! Back-office reporting: dashboard aggregates, tabular exports, and the
//! manual dump/restore backup.

pub mod backup;
pub mod export;
pub mod report;

pub use backup::{BackupError, BackupReport, DatabaseDump};
pub use export::{booking_report_csv, booking_report_json, ExportError, ReportFormat};
pub use report::{
    BackofficeService, BookingCounts, BookingReportRow, CategoryCounts, CityCounts,
    ListingCounts, Overview, OwnerStats, ReviewCounts, RevenueTotals, UserCounts, UserStats,
};
