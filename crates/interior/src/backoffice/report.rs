use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::accounts::{UserId, UserRepository, UserRole};
use crate::booking::{BookingRepository, BookingStatus};
use crate::catalog::{CatalogRepository, ListingId};
use crate::payment::{LedgerStatus, TransactionLedger};
use crate::review::ReviewRepository;
use crate::storage::RepositoryError;

/// Aggregates, report rows, and per-user statistics for the back office.
pub struct BackofficeService<U, C, B, L, V> {
    pub(crate) users: Arc<U>,
    pub(crate) catalog: Arc<C>,
    pub(crate) bookings: Arc<B>,
    pub(crate) ledger: Arc<L>,
    pub(crate) reviews: Arc<V>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListingCounts {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub featured: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryCounts {
    pub total: usize,
    pub active: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingCounts {
    pub total: usize,
    pub pending: usize,
    pub confirmed: usize,
    pub completed: usize,
    pub cancelled: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewCounts {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub avg_rating: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserCounts {
    pub total: usize,
    pub active: usize,
    pub blocked: usize,
    pub verified: usize,
    pub moderators: usize,
    pub admins: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CityCounts {
    pub total: usize,
    pub active: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RevenueTotals {
    /// Net prepayments recorded in the ledger (refunds subtract).
    pub prepayments_minor: i64,
    /// Total volume of completed bookings.
    pub completed_volume_minor: i64,
}

/// The admin dashboard payload.
#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub listings: ListingCounts,
    pub categories: CategoryCounts,
    pub bookings: BookingCounts,
    pub reviews: ReviewCounts,
    pub users: UserCounts,
    pub cities: CityCounts,
    pub revenue: RevenueTotals,
}

/// One exported row of the bookings report.
#[derive(Debug, Clone, Serialize)]
pub struct BookingReportRow {
    pub booking_id: u64,
    pub listing: String,
    pub tenant: String,
    pub status: &'static str,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub periods_count: u32,
    pub total_minor: i64,
    pub prepayment_paid: bool,
    pub prepayment_minor: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserStats {
    pub bookings: BookingCounts,
    pub favorites: usize,
    pub reviews: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct OwnerStats {
    pub listings: usize,
    pub active_listings: usize,
    pub bookings: usize,
    pub completed_revenue_minor: i64,
}

impl<U, C, B, L, V> BackofficeService<U, C, B, L, V>
where
    U: UserRepository + 'static,
    C: CatalogRepository + 'static,
    B: BookingRepository + 'static,
    L: TransactionLedger + 'static,
    V: ReviewRepository + 'static,
{
    pub fn new(
        users: Arc<U>,
        catalog: Arc<C>,
        bookings: Arc<B>,
        ledger: Arc<L>,
        reviews: Arc<V>,
    ) -> Self {
        Self {
            users,
            catalog,
            bookings,
            ledger,
            reviews,
        }
    }

    pub fn overview(&self) -> Result<Overview, RepositoryError> {
        let listings = self.catalog.listings()?;
        let categories = self.catalog.categories()?;
        let cities = self.catalog.cities()?;
        let bookings = self.bookings.all()?;
        let reviews = self.reviews.all()?;
        let users = self.users.all()?;
        let ledger = self.ledger.all()?;

        let approved: Vec<_> = reviews.iter().filter(|review| review.is_approved).collect();
        let avg_rating = if approved.is_empty() {
            0.0
        } else {
            let sum: u32 = approved.iter().map(|review| u32::from(review.rating)).sum();
            let avg = f64::from(sum) / approved.len() as f64;
            (avg * 10.0).round() / 10.0
        };

        let prepayments_minor = ledger
            .iter()
            .filter(|entry| {
                matches!(entry.status, LedgerStatus::Succeeded | LedgerStatus::Refunded)
            })
            .map(|entry| entry.amount_minor)
            .sum();
        let completed_volume_minor = bookings
            .iter()
            .filter(|booking| booking.status == BookingStatus::Completed)
            .map(|booking| booking.total_amount_minor)
            .sum();

        Ok(Overview {
            listings: ListingCounts {
                total: listings.len(),
                active: listings.iter().filter(|listing| listing.is_active).count(),
                inactive: listings.iter().filter(|listing| !listing.is_active).count(),
                featured: listings.iter().filter(|listing| listing.is_featured).count(),
            },
            categories: CategoryCounts {
                total: categories.len(),
                active: categories.iter().filter(|category| category.is_active).count(),
            },
            bookings: booking_counts(bookings.iter().map(|booking| booking.status)),
            reviews: ReviewCounts {
                total: reviews.len(),
                pending: reviews.iter().filter(|review| !review.is_approved).count(),
                approved: approved.len(),
                avg_rating,
            },
            users: UserCounts {
                total: users.len(),
                active: users.iter().filter(|user| user.is_active).count(),
                blocked: users.iter().filter(|user| user.is_blocked).count(),
                verified: users.iter().filter(|user| user.email_verified).count(),
                moderators: users
                    .iter()
                    .filter(|user| user.role == UserRole::Moderator)
                    .count(),
                admins: users
                    .iter()
                    .filter(|user| user.role == UserRole::Admin)
                    .count(),
            },
            cities: CityCounts {
                total: cities.len(),
                active: cities.iter().filter(|city| city.is_active).count(),
            },
            revenue: RevenueTotals {
                prepayments_minor,
                completed_volume_minor,
            },
        })
    }

    /// Export rows for every booking, newest first.
    pub fn booking_report(&self) -> Result<Vec<BookingReportRow>, RepositoryError> {
        let listings: HashMap<ListingId, String> = self
            .catalog
            .listings()?
            .into_iter()
            .map(|listing| (listing.id, listing.title))
            .collect();
        let users: HashMap<UserId, String> = self
            .users
            .all()?
            .into_iter()
            .map(|user| (user.id, user.username))
            .collect();

        let mut bookings = self.bookings.all()?;
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(bookings
            .into_iter()
            .map(|booking| BookingReportRow {
                booking_id: booking.id.0,
                listing: listings
                    .get(&booking.listing_id)
                    .cloned()
                    .unwrap_or_default(),
                tenant: users.get(&booking.tenant_id).cloned().unwrap_or_default(),
                status: booking.status.label(),
                starts_at: booking.starts_at,
                ends_at: booking.ends_at,
                periods_count: booking.periods_count,
                total_minor: booking.total_amount_minor,
                prepayment_paid: booking.prepayment_paid,
                prepayment_minor: booking.prepayment_amount_minor,
            })
            .collect())
    }

    pub fn user_stats(&self, user: UserId) -> Result<UserStats, RepositoryError> {
        let bookings = self.bookings.of_user(user)?;
        Ok(UserStats {
            bookings: booking_counts(bookings.iter().map(|booking| booking.status)),
            favorites: self.catalog.favorites_of(user)?.len(),
            reviews: self.reviews.by_author(user)?.len(),
        })
    }

    pub fn owner_stats(&self, owner: UserId) -> Result<OwnerStats, RepositoryError> {
        let owned: Vec<_> = self
            .catalog
            .listings()?
            .into_iter()
            .filter(|listing| listing.owner_id == owner)
            .collect();

        let mut bookings = 0;
        let mut completed_revenue_minor = 0;
        for listing in &owned {
            for booking in self.bookings.of_listing(listing.id)? {
                bookings += 1;
                if booking.status == BookingStatus::Completed {
                    completed_revenue_minor += booking.total_amount_minor;
                }
            }
        }

        Ok(OwnerStats {
            listings: owned.len(),
            active_listings: owned.iter().filter(|listing| listing.is_active).count(),
            bookings,
            completed_revenue_minor,
        })
    }
}

fn booking_counts(statuses: impl Iterator<Item = BookingStatus>) -> BookingCounts {
    let mut counts = BookingCounts {
        total: 0,
        pending: 0,
        confirmed: 0,
        completed: 0,
        cancelled: 0,
    };
    for status in statuses {
        counts.total += 1;
        match status {
            BookingStatus::Pending => counts.pending += 1,
            BookingStatus::Confirmed => counts.confirmed += 1,
            BookingStatus::Completed => counts.completed += 1,
            BookingStatus::Cancelled => counts.cancelled += 1,
        }
    }
    counts
}
