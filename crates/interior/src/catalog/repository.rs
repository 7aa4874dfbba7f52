use serde::{Deserialize, Serialize};

use super::domain::{
    CategoryId, City, CityId, Favorite, Listing, ListingId, ListingImage, ListingImageId,
    ListingPrice, NewListing, NewListingImage, RentalPeriod, RentalPeriodId, SpaceCategory,
};
use crate::accounts::UserId;
use crate::storage::RepositoryError;

/// Storage abstraction for the catalog.
///
/// Reference rows (cities, categories, periods) are written with caller-chosen
/// ids via the `put_*` methods; listing/image rows get repository-assigned ids.
pub trait CatalogRepository: Send + Sync {
    fn put_city(&self, city: City) -> Result<City, RepositoryError>;
    fn cities(&self) -> Result<Vec<City>, RepositoryError>;
    fn city(&self, id: CityId) -> Result<Option<City>, RepositoryError>;

    fn put_category(&self, category: SpaceCategory) -> Result<SpaceCategory, RepositoryError>;
    fn categories(&self) -> Result<Vec<SpaceCategory>, RepositoryError>;
    fn category(&self, id: CategoryId) -> Result<Option<SpaceCategory>, RepositoryError>;

    fn put_period(&self, period: RentalPeriod) -> Result<RentalPeriod, RepositoryError>;
    fn periods(&self) -> Result<Vec<RentalPeriod>, RepositoryError>;
    fn period(&self, id: RentalPeriodId) -> Result<Option<RentalPeriod>, RepositoryError>;

    fn insert_listing(&self, listing: NewListing, slug: String)
        -> Result<Listing, RepositoryError>;
    fn update_listing(&self, listing: Listing) -> Result<(), RepositoryError>;
    fn listing(&self, id: ListingId) -> Result<Option<Listing>, RepositoryError>;
    fn listings(&self) -> Result<Vec<Listing>, RepositoryError>;
    /// Atomically bump the view counter.
    fn record_view(&self, id: ListingId) -> Result<(), RepositoryError>;

    /// Insert an image; a primary insert demotes any existing primary so a
    /// listing never carries two primary images.
    fn insert_image(&self, image: NewListingImage) -> Result<ListingImage, RepositoryError>;
    /// Promote one image to primary, demoting every other image of the listing.
    fn set_primary_image(
        &self,
        listing: ListingId,
        image: ListingImageId,
    ) -> Result<(), RepositoryError>;
    fn images_of(&self, listing: ListingId) -> Result<Vec<ListingImage>, RepositoryError>;

    /// Insert or replace the price row for (listing, period).
    fn upsert_price(&self, price: ListingPrice) -> Result<ListingPrice, RepositoryError>;
    fn prices_of(&self, listing: ListingId) -> Result<Vec<ListingPrice>, RepositoryError>;
    fn active_price(
        &self,
        listing: ListingId,
        period: RentalPeriodId,
    ) -> Result<Option<ListingPrice>, RepositoryError>;

    /// Add a favorite; returns false when the pair already exists.
    fn add_favorite(&self, user: UserId, listing: ListingId) -> Result<bool, RepositoryError>;
    fn remove_favorite(&self, user: UserId, listing: ListingId) -> Result<bool, RepositoryError>;
    fn is_favorite(&self, user: UserId, listing: ListingId) -> Result<bool, RepositoryError>;
    fn favorites_of(&self, user: UserId) -> Result<Vec<Favorite>, RepositoryError>;

    fn snapshot(&self) -> Result<CatalogSnapshot, RepositoryError>;
    fn restore(&self, snapshot: CatalogSnapshot) -> Result<(), RepositoryError>;
}

/// Full catalog contents, the unit of backup and restore.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub cities: Vec<City>,
    pub categories: Vec<SpaceCategory>,
    pub periods: Vec<RentalPeriod>,
    pub listings: Vec<Listing>,
    pub images: Vec<ListingImage>,
    pub prices: Vec<ListingPrice>,
    pub favorites: Vec<Favorite>,
}
