//! `Mutex<HashMap>`-backed repositories. These back the API service, the CLI
//! demo, and the test suites; a production deployment would put a real
//! database behind the same traits.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::RepositoryError;
use crate::accounts::{NewUserAccount, UserAccount, UserId, UserRepository};
use crate::booking::domain::{intervals_overlap, Booking, BookingId, BookingStatus, NewBooking};
use crate::booking::BookingRepository;
use crate::catalog::{
    CatalogRepository, CatalogSnapshot, CategoryId, City, CityId, Favorite, Listing, ListingId,
    ListingImage, ListingImageId, ListingPrice, NewListing, NewListingImage, RentalPeriod,
    RentalPeriodId, SpaceCategory,
};
use crate::payment::{LedgerEntry, LedgerEntryId, NewLedgerEntry, TransactionLedger};
use crate::review::{NewReview, Review, ReviewId, ReviewRepository};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().expect("repository mutex poisoned")
}

// ---------------------------------------------------------------------------
// Catalog

#[derive(Default)]
struct CatalogState {
    cities: HashMap<CityId, City>,
    categories: HashMap<CategoryId, SpaceCategory>,
    periods: HashMap<RentalPeriodId, RentalPeriod>,
    listings: HashMap<ListingId, Listing>,
    images: HashMap<ListingImageId, ListingImage>,
    prices: Vec<ListingPrice>,
    favorites: Vec<Favorite>,
    next_listing_id: u64,
    next_image_id: u64,
}

#[derive(Default, Clone)]
pub struct InMemoryCatalogRepository {
    state: Arc<Mutex<CatalogState>>,
}

impl CatalogRepository for InMemoryCatalogRepository {
    fn put_city(&self, city: City) -> Result<City, RepositoryError> {
        lock(&self.state).cities.insert(city.id, city.clone());
        Ok(city)
    }

    fn cities(&self) -> Result<Vec<City>, RepositoryError> {
        let mut cities: Vec<City> = lock(&self.state).cities.values().cloned().collect();
        cities.sort_by_key(|city| city.id);
        Ok(cities)
    }

    fn city(&self, id: CityId) -> Result<Option<City>, RepositoryError> {
        Ok(lock(&self.state).cities.get(&id).cloned())
    }

    fn put_category(&self, category: SpaceCategory) -> Result<SpaceCategory, RepositoryError> {
        lock(&self.state)
            .categories
            .insert(category.id, category.clone());
        Ok(category)
    }

    fn categories(&self) -> Result<Vec<SpaceCategory>, RepositoryError> {
        let mut categories: Vec<SpaceCategory> =
            lock(&self.state).categories.values().cloned().collect();
        categories.sort_by_key(|category| category.id);
        Ok(categories)
    }

    fn category(&self, id: CategoryId) -> Result<Option<SpaceCategory>, RepositoryError> {
        Ok(lock(&self.state).categories.get(&id).cloned())
    }

    fn put_period(&self, period: RentalPeriod) -> Result<RentalPeriod, RepositoryError> {
        lock(&self.state).periods.insert(period.id, period.clone());
        Ok(period)
    }

    fn periods(&self) -> Result<Vec<RentalPeriod>, RepositoryError> {
        let mut periods: Vec<RentalPeriod> =
            lock(&self.state).periods.values().cloned().collect();
        periods.sort_by_key(|period| period.sort_order);
        Ok(periods)
    }

    fn period(&self, id: RentalPeriodId) -> Result<Option<RentalPeriod>, RepositoryError> {
        Ok(lock(&self.state).periods.get(&id).cloned())
    }

    fn insert_listing(
        &self,
        listing: NewListing,
        slug: String,
    ) -> Result<Listing, RepositoryError> {
        let mut state = lock(&self.state);
        state.next_listing_id += 1;
        let now = Utc::now();
        let listing = Listing {
            id: ListingId(state.next_listing_id),
            title: listing.title,
            slug,
            address: listing.address,
            city_id: listing.city_id,
            category_id: listing.category_id,
            area_sqm: listing.area_sqm,
            max_capacity: listing.max_capacity,
            description: listing.description,
            owner_id: listing.owner_id,
            is_active: true,
            is_featured: listing.is_featured,
            views_count: 0,
            latitude: None,
            longitude: None,
            created_at: now,
            updated_at: now,
        };
        state.listings.insert(listing.id, listing.clone());
        Ok(listing)
    }

    fn update_listing(&self, listing: Listing) -> Result<(), RepositoryError> {
        let mut state = lock(&self.state);
        if !state.listings.contains_key(&listing.id) {
            return Err(RepositoryError::NotFound);
        }
        state.listings.insert(listing.id, listing);
        Ok(())
    }

    fn listing(&self, id: ListingId) -> Result<Option<Listing>, RepositoryError> {
        Ok(lock(&self.state).listings.get(&id).cloned())
    }

    fn listings(&self) -> Result<Vec<Listing>, RepositoryError> {
        let mut listings: Vec<Listing> = lock(&self.state).listings.values().cloned().collect();
        listings.sort_by_key(|listing| listing.id);
        Ok(listings)
    }

    fn record_view(&self, id: ListingId) -> Result<(), RepositoryError> {
        let mut state = lock(&self.state);
        let listing = state
            .listings
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        listing.views_count += 1;
        Ok(())
    }

    fn insert_image(&self, image: NewListingImage) -> Result<ListingImage, RepositoryError> {
        let mut state = lock(&self.state);
        if !state.listings.contains_key(&image.listing_id) {
            return Err(RepositoryError::NotFound);
        }

        // A primary insert takes the flag over from the previous primary.
        if image.is_primary {
            let listing_id = image.listing_id;
            for existing in state.images.values_mut() {
                if existing.listing_id == listing_id {
                    existing.is_primary = false;
                }
            }
        }

        state.next_image_id += 1;
        let stored = ListingImage {
            id: ListingImageId(state.next_image_id),
            listing_id: image.listing_id,
            alt_text: image.alt_text,
            is_primary: image.is_primary,
            sort_order: image.sort_order,
            uploaded_at: Utc::now(),
        };
        state.images.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn set_primary_image(
        &self,
        listing: ListingId,
        image: ListingImageId,
    ) -> Result<(), RepositoryError> {
        let mut state = lock(&self.state);
        let belongs = state
            .images
            .get(&image)
            .map(|stored| stored.listing_id == listing)
            .unwrap_or(false);
        if !belongs {
            return Err(RepositoryError::NotFound);
        }

        for existing in state.images.values_mut() {
            if existing.listing_id == listing {
                existing.is_primary = existing.id == image;
            }
        }
        Ok(())
    }

    fn images_of(&self, listing: ListingId) -> Result<Vec<ListingImage>, RepositoryError> {
        let mut images: Vec<ListingImage> = lock(&self.state)
            .images
            .values()
            .filter(|image| image.listing_id == listing)
            .cloned()
            .collect();
        images.sort_by_key(|image| image.id);
        Ok(images)
    }

    fn upsert_price(&self, price: ListingPrice) -> Result<ListingPrice, RepositoryError> {
        let mut state = lock(&self.state);
        let position = state
            .prices
            .iter()
            .position(|row| row.listing_id == price.listing_id && row.period_id == price.period_id);
        match position {
            Some(index) => state.prices[index] = price.clone(),
            None => state.prices.push(price.clone()),
        }
        Ok(price)
    }

    fn prices_of(&self, listing: ListingId) -> Result<Vec<ListingPrice>, RepositoryError> {
        Ok(lock(&self.state)
            .prices
            .iter()
            .filter(|price| price.listing_id == listing)
            .cloned()
            .collect())
    }

    fn active_price(
        &self,
        listing: ListingId,
        period: RentalPeriodId,
    ) -> Result<Option<ListingPrice>, RepositoryError> {
        Ok(lock(&self.state)
            .prices
            .iter()
            .find(|price| {
                price.listing_id == listing && price.period_id == period && price.is_active
            })
            .cloned())
    }

    fn add_favorite(&self, user: UserId, listing: ListingId) -> Result<bool, RepositoryError> {
        let mut state = lock(&self.state);
        let exists = state
            .favorites
            .iter()
            .any(|favorite| favorite.user_id == user && favorite.listing_id == listing);
        if exists {
            return Ok(false);
        }
        state.favorites.push(Favorite {
            user_id: user,
            listing_id: listing,
            created_at: Utc::now(),
        });
        Ok(true)
    }

    fn remove_favorite(&self, user: UserId, listing: ListingId) -> Result<bool, RepositoryError> {
        let mut state = lock(&self.state);
        let before = state.favorites.len();
        state
            .favorites
            .retain(|favorite| !(favorite.user_id == user && favorite.listing_id == listing));
        Ok(state.favorites.len() < before)
    }

    fn is_favorite(&self, user: UserId, listing: ListingId) -> Result<bool, RepositoryError> {
        Ok(lock(&self.state)
            .favorites
            .iter()
            .any(|favorite| favorite.user_id == user && favorite.listing_id == listing))
    }

    fn favorites_of(&self, user: UserId) -> Result<Vec<Favorite>, RepositoryError> {
        Ok(lock(&self.state)
            .favorites
            .iter()
            .filter(|favorite| favorite.user_id == user)
            .cloned()
            .collect())
    }

    fn snapshot(&self) -> Result<CatalogSnapshot, RepositoryError> {
        let state = lock(&self.state);
        let mut snapshot = CatalogSnapshot {
            cities: state.cities.values().cloned().collect(),
            categories: state.categories.values().cloned().collect(),
            periods: state.periods.values().cloned().collect(),
            listings: state.listings.values().cloned().collect(),
            images: state.images.values().cloned().collect(),
            prices: state.prices.clone(),
            favorites: state.favorites.clone(),
        };
        snapshot.cities.sort_by_key(|city| city.id);
        snapshot.categories.sort_by_key(|category| category.id);
        snapshot.periods.sort_by_key(|period| period.id);
        snapshot.listings.sort_by_key(|listing| listing.id);
        snapshot.images.sort_by_key(|image| image.id);
        Ok(snapshot)
    }

    fn restore(&self, snapshot: CatalogSnapshot) -> Result<(), RepositoryError> {
        let mut state = lock(&self.state);
        state.next_listing_id = snapshot
            .listings
            .iter()
            .map(|listing| listing.id.0)
            .max()
            .unwrap_or(0);
        state.next_image_id = snapshot
            .images
            .iter()
            .map(|image| image.id.0)
            .max()
            .unwrap_or(0);
        state.cities = snapshot
            .cities
            .into_iter()
            .map(|city| (city.id, city))
            .collect();
        state.categories = snapshot
            .categories
            .into_iter()
            .map(|category| (category.id, category))
            .collect();
        state.periods = snapshot
            .periods
            .into_iter()
            .map(|period| (period.id, period))
            .collect();
        state.listings = snapshot
            .listings
            .into_iter()
            .map(|listing| (listing.id, listing))
            .collect();
        state.images = snapshot
            .images
            .into_iter()
            .map(|image| (image.id, image))
            .collect();
        state.prices = snapshot.prices;
        state.favorites = snapshot.favorites;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Bookings

#[derive(Default)]
struct BookingState {
    bookings: HashMap<BookingId, Booking>,
    next_id: u64,
}

#[derive(Default, Clone)]
pub struct InMemoryBookingRepository {
    state: Arc<Mutex<BookingState>>,
}

impl BookingRepository for InMemoryBookingRepository {
    fn insert(&self, booking: NewBooking) -> Result<Booking, RepositoryError> {
        let mut state = lock(&self.state);
        state.next_id += 1;
        let now = Utc::now();
        let booking = Booking {
            id: BookingId(state.next_id),
            listing_id: booking.listing_id,
            tenant_id: booking.tenant_id,
            period_id: booking.period_id,
            status: BookingStatus::Pending,
            starts_at: booking.starts_at,
            ends_at: booking.ends_at,
            periods_count: booking.periods_count,
            price_per_period_minor: booking.price_per_period_minor,
            total_amount_minor: booking.total_amount_minor,
            comment: booking.comment,
            prepayment_paid: false,
            prepayment_amount_minor: None,
            payment_ref: None,
            prepayment_paid_at: None,
            refund_requested_at: None,
            created_at: now,
            updated_at: now,
        };
        state.bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    fn update(&self, booking: Booking) -> Result<(), RepositoryError> {
        let mut state = lock(&self.state);
        if !state.bookings.contains_key(&booking.id) {
            return Err(RepositoryError::NotFound);
        }
        state.bookings.insert(booking.id, booking);
        Ok(())
    }

    fn fetch(&self, id: BookingId) -> Result<Option<Booking>, RepositoryError> {
        Ok(lock(&self.state).bookings.get(&id).cloned())
    }

    fn overlapping(
        &self,
        listing: ListingId,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
        exclude: Option<BookingId>,
    ) -> Result<Vec<Booking>, RepositoryError> {
        Ok(lock(&self.state)
            .bookings
            .values()
            .filter(|booking| {
                booking.listing_id == listing
                    && booking.status.is_active()
                    && Some(booking.id) != exclude
                    && intervals_overlap(booking.starts_at, booking.ends_at, starts_at, ends_at)
            })
            .cloned()
            .collect())
    }

    fn of_user(&self, user: UserId) -> Result<Vec<Booking>, RepositoryError> {
        Ok(lock(&self.state)
            .bookings
            .values()
            .filter(|booking| booking.tenant_id == user)
            .cloned()
            .collect())
    }

    fn of_listing(&self, listing: ListingId) -> Result<Vec<Booking>, RepositoryError> {
        Ok(lock(&self.state)
            .bookings
            .values()
            .filter(|booking| booking.listing_id == listing)
            .cloned()
            .collect())
    }

    fn all(&self) -> Result<Vec<Booking>, RepositoryError> {
        let mut bookings: Vec<Booking> = lock(&self.state).bookings.values().cloned().collect();
        bookings.sort_by_key(|booking| booking.id);
        Ok(bookings)
    }

    fn replace_all(&self, bookings: Vec<Booking>) -> Result<(), RepositoryError> {
        let mut state = lock(&self.state);
        state.next_id = bookings.iter().map(|booking| booking.id.0).max().unwrap_or(0);
        state.bookings = bookings
            .into_iter()
            .map(|booking| (booking.id, booking))
            .collect();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Transaction ledger

#[derive(Default)]
struct LedgerState {
    entries: Vec<LedgerEntry>,
    next_id: u64,
}

#[derive(Default, Clone)]
pub struct InMemoryLedger {
    state: Arc<Mutex<LedgerState>>,
}

impl TransactionLedger for InMemoryLedger {
    fn record_once(&self, entry: NewLedgerEntry) -> Result<(LedgerEntry, bool), RepositoryError> {
        // One lock for lookup and insert keeps get-or-create atomic under
        // concurrent webhook deliveries.
        let mut state = lock(&self.state);
        if let Some(existing) = state
            .entries
            .iter()
            .find(|stored| stored.external_id == entry.external_id)
        {
            return Ok((existing.clone(), false));
        }

        state.next_id += 1;
        let stored = LedgerEntry {
            id: LedgerEntryId(state.next_id),
            booking_id: entry.booking_id,
            status: entry.status,
            amount_minor: entry.amount_minor,
            payment_method: entry.payment_method,
            external_id: entry.external_id,
            created_at: Utc::now(),
        };
        state.entries.push(stored.clone());
        Ok((stored, true))
    }

    fn find_external(&self, external_id: &str) -> Result<Option<LedgerEntry>, RepositoryError> {
        Ok(lock(&self.state)
            .entries
            .iter()
            .find(|entry| entry.external_id == external_id)
            .cloned())
    }

    fn entries_of(&self, booking: BookingId) -> Result<Vec<LedgerEntry>, RepositoryError> {
        Ok(lock(&self.state)
            .entries
            .iter()
            .filter(|entry| entry.booking_id == booking)
            .cloned()
            .collect())
    }

    fn all(&self) -> Result<Vec<LedgerEntry>, RepositoryError> {
        Ok(lock(&self.state).entries.clone())
    }

    fn replace_all(&self, entries: Vec<LedgerEntry>) -> Result<(), RepositoryError> {
        let mut state = lock(&self.state);
        state.next_id = entries.iter().map(|entry| entry.id.0).max().unwrap_or(0);
        state.entries = entries;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Reviews

#[derive(Default)]
struct ReviewState {
    reviews: HashMap<ReviewId, Review>,
    next_id: u64,
}

#[derive(Default, Clone)]
pub struct InMemoryReviewRepository {
    state: Arc<Mutex<ReviewState>>,
}

impl ReviewRepository for InMemoryReviewRepository {
    fn insert(&self, review: NewReview) -> Result<Review, RepositoryError> {
        let mut state = lock(&self.state);
        let duplicate = state.reviews.values().any(|stored| {
            stored.listing_id == review.listing_id && stored.author_id == review.author_id
        });
        if duplicate {
            return Err(RepositoryError::Conflict);
        }

        state.next_id += 1;
        let stored = Review {
            id: ReviewId(state.next_id),
            listing_id: review.listing_id,
            author_id: review.author_id,
            booking_id: review.booking_id,
            rating: review.rating,
            comment: review.comment,
            is_approved: false,
            created_at: Utc::now(),
        };
        state.reviews.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn update(&self, review: Review) -> Result<(), RepositoryError> {
        let mut state = lock(&self.state);
        if !state.reviews.contains_key(&review.id) {
            return Err(RepositoryError::NotFound);
        }
        state.reviews.insert(review.id, review);
        Ok(())
    }

    fn remove(&self, id: ReviewId) -> Result<(), RepositoryError> {
        lock(&self.state)
            .reviews
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn fetch(&self, id: ReviewId) -> Result<Option<Review>, RepositoryError> {
        Ok(lock(&self.state).reviews.get(&id).cloned())
    }

    fn for_listing(
        &self,
        listing: ListingId,
        approved_only: bool,
    ) -> Result<Vec<Review>, RepositoryError> {
        let mut reviews: Vec<Review> = lock(&self.state)
            .reviews
            .values()
            .filter(|review| {
                review.listing_id == listing && (!approved_only || review.is_approved)
            })
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }

    fn by_author(&self, author: UserId) -> Result<Vec<Review>, RepositoryError> {
        let mut reviews: Vec<Review> = lock(&self.state)
            .reviews
            .values()
            .filter(|review| review.author_id == author)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }

    fn pending(&self, limit: usize) -> Result<Vec<Review>, RepositoryError> {
        let mut reviews: Vec<Review> = lock(&self.state)
            .reviews
            .values()
            .filter(|review| !review.is_approved)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        reviews.truncate(limit);
        Ok(reviews)
    }

    fn all(&self) -> Result<Vec<Review>, RepositoryError> {
        let mut reviews: Vec<Review> = lock(&self.state).reviews.values().cloned().collect();
        reviews.sort_by_key(|review| review.id);
        Ok(reviews)
    }

    fn replace_all(&self, reviews: Vec<Review>) -> Result<(), RepositoryError> {
        let mut state = lock(&self.state);
        state.next_id = reviews.iter().map(|review| review.id.0).max().unwrap_or(0);
        state.reviews = reviews
            .into_iter()
            .map(|review| (review.id, review))
            .collect();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Users

#[derive(Default)]
struct UserState {
    users: HashMap<UserId, UserAccount>,
    next_id: u64,
}

#[derive(Default, Clone)]
pub struct InMemoryUserRepository {
    state: Arc<Mutex<UserState>>,
}

impl UserRepository for InMemoryUserRepository {
    fn insert(&self, user: NewUserAccount) -> Result<UserAccount, RepositoryError> {
        let mut state = lock(&self.state);
        let taken = state
            .users
            .values()
            .any(|stored| stored.username == user.username);
        if taken {
            return Err(RepositoryError::Conflict);
        }

        state.next_id += 1;
        let stored = UserAccount {
            id: UserId(state.next_id),
            username: user.username,
            email: user.email,
            phone: user.phone,
            company: user.company,
            role: user.role,
            is_active: true,
            is_blocked: false,
            email_verified: false,
            created_at: Utc::now(),
        };
        state.users.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn update(&self, user: UserAccount) -> Result<(), RepositoryError> {
        let mut state = lock(&self.state);
        if !state.users.contains_key(&user.id) {
            return Err(RepositoryError::NotFound);
        }
        state.users.insert(user.id, user);
        Ok(())
    }

    fn fetch(&self, id: UserId) -> Result<Option<UserAccount>, RepositoryError> {
        Ok(lock(&self.state).users.get(&id).cloned())
    }

    fn by_username(&self, username: &str) -> Result<Option<UserAccount>, RepositoryError> {
        Ok(lock(&self.state)
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    fn all(&self) -> Result<Vec<UserAccount>, RepositoryError> {
        let mut users: Vec<UserAccount> = lock(&self.state).users.values().cloned().collect();
        users.sort_by_key(|user| user.id);
        Ok(users)
    }

    fn replace_all(&self, users: Vec<UserAccount>) -> Result<(), RepositoryError> {
        let mut state = lock(&self.state);
        state.next_id = users.iter().map(|user| user.id.0).max().unwrap_or(0);
        state.users = users.into_iter().map(|user| (user.id, user)).collect();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::UserRole;

    fn listing_fixture(repo: &InMemoryCatalogRepository) -> Listing {
        repo.put_city(City {
            id: CityId(1),
            name: "Moscow".to_string(),
            region: "Moscow".to_string(),
            is_active: true,
        })
        .unwrap();
        repo.put_category(SpaceCategory {
            id: CategoryId(1),
            name: "Loft".to_string(),
            slug: "loft".to_string(),
            description: String::new(),
            is_active: true,
        })
        .unwrap();
        repo.insert_listing(
            NewListing {
                title: "Loft on Main".to_string(),
                address: "Main st. 1".to_string(),
                city_id: CityId(1),
                category_id: CategoryId(1),
                area_sqm: 80.0,
                max_capacity: 20,
                description: "A loft.".to_string(),
                owner_id: UserId(1),
                is_featured: false,
            },
            "loft-on-main".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn primary_image_stays_unique_across_inserts_and_updates() {
        let repo = InMemoryCatalogRepository::default();
        let listing = listing_fixture(&repo);

        let first = repo
            .insert_image(NewListingImage {
                listing_id: listing.id,
                alt_text: "front".to_string(),
                is_primary: true,
                sort_order: 0,
            })
            .unwrap();
        let second = repo
            .insert_image(NewListingImage {
                listing_id: listing.id,
                alt_text: "hall".to_string(),
                is_primary: true,
                sort_order: 1,
            })
            .unwrap();

        let primaries: Vec<_> = repo
            .images_of(listing.id)
            .unwrap()
            .into_iter()
            .filter(|image| image.is_primary)
            .collect();
        assert_eq!(primaries.len(), 1);
        assert_eq!(primaries[0].id, second.id);

        repo.set_primary_image(listing.id, first.id).unwrap();
        let primaries: Vec<_> = repo
            .images_of(listing.id)
            .unwrap()
            .into_iter()
            .filter(|image| image.is_primary)
            .collect();
        assert_eq!(primaries.len(), 1);
        assert_eq!(primaries[0].id, first.id);
    }

    #[test]
    fn ledger_record_once_is_idempotent_per_external_id() {
        let ledger = InMemoryLedger::default();
        let entry = NewLedgerEntry {
            booking_id: BookingId(1),
            status: crate::payment::LedgerStatus::Succeeded,
            amount_minor: 10_000,
            payment_method: "hosted_checkout".to_string(),
            external_id: "pay-1".to_string(),
        };

        let (first, created) = ledger.record_once(entry.clone()).unwrap();
        assert!(created);
        let (second, created) = ledger.record_once(entry).unwrap();
        assert!(!created);
        assert_eq!(first.id, second.id);
        assert_eq!(ledger.all().unwrap().len(), 1);
    }

    #[test]
    fn username_uniqueness_is_enforced() {
        let repo = InMemoryUserRepository::default();
        repo.insert(NewUserAccount {
            username: "renter".to_string(),
            email: "a@example.com".to_string(),
            phone: String::new(),
            company: String::new(),
            role: UserRole::User,
        })
        .unwrap();
        let err = repo
            .insert(NewUserAccount {
                username: "renter".to_string(),
                email: "b@example.com".to_string(),
                phone: String::new(),
                company: String::new(),
                role: UserRole::User,
            })
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict));
    }
}
