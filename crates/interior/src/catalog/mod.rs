//! Listing catalog: cities, categories, rental periods, prices, images,
//! favorites, and the search/filter surface.

pub mod domain;
pub mod filter;
pub mod repository;
pub mod service;

pub use domain::{
    slugify, CategoryId, City, CityId, Favorite, Listing, ListingId, ListingImage, ListingImageId,
    ListingPrice, ListingUpdate, NewListing, NewListingImage, RentalPeriod, RentalPeriodId,
    SpaceCategory,
};
pub use filter::{Page, SearchFilter, SortOrder};
pub use repository::{CatalogRepository, CatalogSnapshot};
pub use service::{
    CatalogError, CatalogService, ImageView, ListingDetail, ListingStats, ListingSummary,
    PriceView,
};
