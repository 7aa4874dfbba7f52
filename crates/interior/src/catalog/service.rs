use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{
    slugify, Listing, ListingId, ListingImage, ListingImageId, ListingPrice, ListingUpdate,
    NewListing, NewListingImage,
};
use super::filter::{Page, SearchFilter, SortOrder};
use super::repository::CatalogRepository;
use crate::accounts::UserId;
use crate::booking::repository::BookingRepository;
use crate::geo::Geocoder;
use crate::review::repository::ReviewRepository;
use crate::storage::RepositoryError;

/// Catalog card as shown in search results and favorites.
#[derive(Debug, Clone, Serialize)]
pub struct ListingSummary {
    pub id: ListingId,
    pub title: String,
    pub slug: String,
    pub address: String,
    pub city: String,
    pub category: String,
    pub area_sqm: f64,
    pub max_capacity: u32,
    pub is_featured: bool,
    pub views_count: u64,
    pub min_price_minor: Option<i64>,
    pub avg_rating: f64,
    pub reviews_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_image: Option<ImageView>,
    pub created_at: chrono::DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageView {
    pub id: ListingImageId,
    pub alt_text: String,
    pub is_primary: bool,
    pub sort_order: u16,
}

#[derive(Debug, Clone, Serialize)]
pub struct PriceView {
    pub period_id: super::domain::RentalPeriodId,
    pub period_code: String,
    pub period_description: String,
    pub price_minor: i64,
    pub is_active: bool,
    pub min_periods: u32,
    pub max_periods: u32,
}

/// Aggregated numbers for one listing's detail page.
#[derive(Debug, Clone, Serialize)]
pub struct ListingStats {
    pub avg_rating: f64,
    pub reviews_count: usize,
    pub rating_distribution: BTreeMap<u8, usize>,
    pub views_count: u64,
    pub bookings_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListingDetail {
    #[serde(flatten)]
    pub listing: Listing,
    pub city: String,
    pub category: String,
    pub prices: Vec<PriceView>,
    pub images: Vec<ImageView>,
    pub stats: ListingStats,
}

/// Catalog browsing, listing management, and favorites.
pub struct CatalogService<C, V, B, G> {
    catalog: Arc<C>,
    reviews: Arc<V>,
    bookings: Arc<B>,
    geocoder: Arc<G>,
}

impl<C, V, B, G> CatalogService<C, V, B, G>
where
    C: CatalogRepository + 'static,
    V: ReviewRepository + 'static,
    B: BookingRepository + 'static,
    G: Geocoder + 'static,
{
    pub fn new(catalog: Arc<C>, reviews: Arc<V>, bookings: Arc<B>, geocoder: Arc<G>) -> Self {
        Self {
            catalog,
            reviews,
            bookings,
            geocoder,
        }
    }

    /// Filter, sort, and paginate active listings.
    pub fn search(&self, filter: &SearchFilter) -> Result<Page<ListingSummary>, CatalogError> {
        let cities: HashMap<_, _> = self
            .catalog
            .cities()?
            .into_iter()
            .map(|city| (city.id, city))
            .collect();

        let mut summaries = Vec::new();
        for listing in self.catalog.listings()? {
            if !listing.is_active {
                continue;
            }
            if let Some(city) = filter.city {
                if listing.city_id != city {
                    continue;
                }
            }
            if let Some(category) = filter.category {
                if listing.category_id != category {
                    continue;
                }
            }
            if let Some(min_area) = filter.min_area {
                if listing.area_sqm < min_area {
                    continue;
                }
            }
            if let Some(max_area) = filter.max_area {
                if listing.area_sqm > max_area {
                    continue;
                }
            }
            if let Some(min_capacity) = filter.min_capacity {
                if listing.max_capacity < min_capacity {
                    continue;
                }
            }

            if let Some(query) = filter.search.as_deref() {
                let query = query.to_lowercase();
                let city_name = cities
                    .get(&listing.city_id)
                    .map(|city| city.name.to_lowercase())
                    .unwrap_or_default();
                let haystacks = [
                    listing.title.to_lowercase(),
                    listing.description.to_lowercase(),
                    listing.address.to_lowercase(),
                    city_name,
                ];
                if !haystacks.iter().any(|haystack| haystack.contains(&query)) {
                    continue;
                }
            }

            let prices = self.catalog.prices_of(listing.id)?;
            let active_prices: Vec<&ListingPrice> =
                prices.iter().filter(|price| price.is_active).collect();

            if let Some(min_price) = filter.min_price_minor {
                if !active_prices.iter().any(|price| price.price_minor >= min_price) {
                    continue;
                }
            }
            if let Some(max_price) = filter.max_price_minor {
                if !active_prices.iter().any(|price| price.price_minor <= max_price) {
                    continue;
                }
            }

            summaries.push(self.summarize(listing, &cities)?);
        }

        sort_summaries(&mut summaries, filter.sort);
        Ok(Page::slice(summaries, filter.page(), filter.per_page()))
    }

    /// Featured listings, falling back to the most viewed when too few
    /// listings carry the flag.
    pub fn featured(&self, limit: usize) -> Result<Vec<ListingSummary>, CatalogError> {
        let cities: HashMap<_, _> = self
            .catalog
            .cities()?
            .into_iter()
            .map(|city| (city.id, city))
            .collect();

        let listings = self.catalog.listings()?;
        let mut featured: Vec<&Listing> = listings
            .iter()
            .filter(|listing| listing.is_active && listing.is_featured)
            .collect();

        if featured.len() < limit {
            featured = listings.iter().filter(|listing| listing.is_active).collect();
            featured.sort_by(|a, b| b.views_count.cmp(&a.views_count));
        }

        featured
            .into_iter()
            .take(limit)
            .map(|listing| self.summarize(listing.clone(), &cities))
            .collect()
    }

    /// Listings sharing a category or city with the given one.
    pub fn related(
        &self,
        id: ListingId,
        limit: usize,
    ) -> Result<Vec<ListingSummary>, CatalogError> {
        let subject = self.catalog.listing(id)?.ok_or(CatalogError::NotFound)?;
        let cities: HashMap<_, _> = self
            .catalog
            .cities()?
            .into_iter()
            .map(|city| (city.id, city))
            .collect();

        let mut related: Vec<Listing> = self
            .catalog
            .listings()?
            .into_iter()
            .filter(|listing| {
                listing.id != id
                    && listing.is_active
                    && (listing.category_id == subject.category_id
                        || listing.city_id == subject.city_id)
            })
            .collect();
        related.sort_by(|a, b| b.views_count.cmp(&a.views_count));

        related
            .into_iter()
            .take(limit)
            .map(|listing| self.summarize(listing, &cities))
            .collect()
    }

    /// Full detail for one listing; records the page view.
    pub fn detail(&self, id: ListingId) -> Result<ListingDetail, CatalogError> {
        self.catalog.record_view(id)?;
        let listing = self.catalog.listing(id)?.ok_or(CatalogError::NotFound)?;

        let city = self
            .catalog
            .city(listing.city_id)?
            .map(|city| city.name)
            .unwrap_or_default();
        let category = self
            .catalog
            .category(listing.category_id)?
            .map(|category| category.name)
            .unwrap_or_default();

        let periods: HashMap<_, _> = self
            .catalog
            .periods()?
            .into_iter()
            .map(|period| (period.id, period))
            .collect();
        let mut prices: Vec<PriceView> = self
            .catalog
            .prices_of(id)?
            .into_iter()
            .map(|price| {
                let period = periods.get(&price.period_id);
                PriceView {
                    period_id: price.period_id,
                    period_code: period.map(|p| p.code.clone()).unwrap_or_default(),
                    period_description: period.map(|p| p.description.clone()).unwrap_or_default(),
                    price_minor: price.price_minor,
                    is_active: price.is_active,
                    min_periods: price.min_periods,
                    max_periods: price.max_periods,
                }
            })
            .collect();
        prices.sort_by_key(|price| {
            periods
                .get(&price.period_id)
                .map(|period| period.sort_order)
                .unwrap_or(u16::MAX)
        });

        let images = self.images_ordered(id)?;
        let stats = self.stats(&listing)?;

        Ok(ListingDetail {
            listing,
            city,
            category,
            prices,
            images,
            stats,
        })
    }

    pub async fn create_listing(&self, new: NewListing) -> Result<Listing, CatalogError> {
        if new.area_sqm <= 0.0 {
            return Err(CatalogError::InvalidArea);
        }
        if new.max_capacity == 0 {
            return Err(CatalogError::InvalidCapacity);
        }
        let city = self
            .catalog
            .city(new.city_id)?
            .ok_or(CatalogError::CityNotFound)?;
        self.catalog
            .category(new.category_id)?
            .ok_or(CatalogError::CategoryNotFound)?;

        let slug = self.unique_slug(&new.title)?;
        let point = self.lookup_coordinates(&city.name, &new.address).await;

        let mut listing = self.catalog.insert_listing(new, slug)?;
        if let Some(point) = point {
            listing.latitude = Some(point.latitude);
            listing.longitude = Some(point.longitude);
            self.catalog.update_listing(listing.clone())?;
        }

        info!(listing = listing.id.0, slug = %listing.slug, "listing created");
        Ok(listing)
    }

    pub async fn update_listing(
        &self,
        id: ListingId,
        update: ListingUpdate,
    ) -> Result<Listing, CatalogError> {
        let mut listing = self.catalog.listing(id)?.ok_or(CatalogError::NotFound)?;
        let old_address = listing.address.clone();
        let old_city = listing.city_id;

        if let Some(title) = update.title {
            listing.title = title;
        }
        if let Some(address) = update.address {
            listing.address = address;
        }
        if let Some(city_id) = update.city_id {
            self.catalog
                .city(city_id)?
                .ok_or(CatalogError::CityNotFound)?;
            listing.city_id = city_id;
        }
        if let Some(category_id) = update.category_id {
            self.catalog
                .category(category_id)?
                .ok_or(CatalogError::CategoryNotFound)?;
            listing.category_id = category_id;
        }
        if let Some(area_sqm) = update.area_sqm {
            if area_sqm <= 0.0 {
                return Err(CatalogError::InvalidArea);
            }
            listing.area_sqm = area_sqm;
        }
        if let Some(max_capacity) = update.max_capacity {
            if max_capacity == 0 {
                return Err(CatalogError::InvalidCapacity);
            }
            listing.max_capacity = max_capacity;
        }
        if let Some(description) = update.description {
            listing.description = description;
        }
        if let Some(is_active) = update.is_active {
            listing.is_active = is_active;
        }
        if let Some(is_featured) = update.is_featured {
            listing.is_featured = is_featured;
        }

        // Re-geocode only when the location actually moved.
        if listing.address != old_address || listing.city_id != old_city {
            let city_name = self
                .catalog
                .city(listing.city_id)?
                .map(|city| city.name)
                .unwrap_or_default();
            if let Some(point) = self.lookup_coordinates(&city_name, &listing.address).await {
                listing.latitude = Some(point.latitude);
                listing.longitude = Some(point.longitude);
            }
        }

        listing.updated_at = Utc::now();
        self.catalog.update_listing(listing.clone())?;
        info!(listing = id.0, "listing updated");
        Ok(listing)
    }

    pub fn add_image(&self, image: NewListingImage) -> Result<ListingImage, CatalogError> {
        self.catalog
            .listing(image.listing_id)?
            .ok_or(CatalogError::NotFound)?;
        Ok(self.catalog.insert_image(image)?)
    }

    pub fn set_primary_image(
        &self,
        listing: ListingId,
        image: ListingImageId,
    ) -> Result<(), CatalogError> {
        match self.catalog.set_primary_image(listing, image) {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound) => Err(CatalogError::ImageNotFound),
            Err(err) => Err(err.into()),
        }
    }

    pub fn images_of(&self, listing: ListingId) -> Result<Vec<ImageView>, CatalogError> {
        self.images_ordered(listing)
    }

    pub fn set_price(&self, price: ListingPrice) -> Result<ListingPrice, CatalogError> {
        if price.price_minor < 1 {
            return Err(CatalogError::InvalidPrice);
        }
        if price.min_periods == 0 || price.min_periods > price.max_periods {
            return Err(CatalogError::InvalidPrice);
        }
        self.catalog
            .listing(price.listing_id)?
            .ok_or(CatalogError::NotFound)?;
        Ok(self.catalog.upsert_price(price)?)
    }

    /// Add or remove a favorite; returns true when the listing is now
    /// favorited.
    pub fn toggle_favorite(&self, user: UserId, listing: ListingId) -> Result<bool, CatalogError> {
        self.catalog.listing(listing)?.ok_or(CatalogError::NotFound)?;

        if self.catalog.is_favorite(user, listing)? {
            self.catalog.remove_favorite(user, listing)?;
            Ok(false)
        } else {
            self.catalog.add_favorite(user, listing)?;
            Ok(true)
        }
    }

    pub fn is_favorite(&self, user: UserId, listing: ListingId) -> Result<bool, CatalogError> {
        Ok(self.catalog.is_favorite(user, listing)?)
    }

    pub fn favorites_of(&self, user: UserId) -> Result<Vec<ListingSummary>, CatalogError> {
        let cities: HashMap<_, _> = self
            .catalog
            .cities()?
            .into_iter()
            .map(|city| (city.id, city))
            .collect();

        let mut favorites = self.catalog.favorites_of(user)?;
        favorites.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut summaries = Vec::new();
        for favorite in favorites {
            if let Some(listing) = self.catalog.listing(favorite.listing_id)? {
                summaries.push(self.summarize(listing, &cities)?);
            }
        }
        Ok(summaries)
    }

    fn stats(&self, listing: &Listing) -> Result<ListingStats, CatalogError> {
        let reviews = self.reviews.for_listing(listing.id, true)?;
        let mut rating_distribution: BTreeMap<u8, usize> =
            (1..=5).map(|rating| (rating, 0)).collect();
        for review in &reviews {
            *rating_distribution.entry(review.rating).or_insert(0) += 1;
        }

        let bookings_count = self.bookings.of_listing(listing.id)?.len();

        Ok(ListingStats {
            avg_rating: average_rating(&reviews),
            reviews_count: reviews.len(),
            rating_distribution,
            views_count: listing.views_count,
            bookings_count,
        })
    }

    fn summarize(
        &self,
        listing: Listing,
        cities: &HashMap<super::domain::CityId, super::domain::City>,
    ) -> Result<ListingSummary, CatalogError> {
        let min_price_minor = self
            .catalog
            .prices_of(listing.id)?
            .into_iter()
            .filter(|price| price.is_active)
            .map(|price| price.price_minor)
            .min();

        let reviews = self.reviews.for_listing(listing.id, true)?;
        let images = self.images_ordered(listing.id)?;
        let primary_image = images.into_iter().next();

        let category = self
            .catalog
            .category(listing.category_id)?
            .map(|category| category.name)
            .unwrap_or_default();

        Ok(ListingSummary {
            id: listing.id,
            title: listing.title,
            slug: listing.slug,
            address: listing.address,
            city: cities
                .get(&listing.city_id)
                .map(|city| city.name.clone())
                .unwrap_or_default(),
            category,
            area_sqm: listing.area_sqm,
            max_capacity: listing.max_capacity,
            is_featured: listing.is_featured,
            views_count: listing.views_count,
            min_price_minor,
            avg_rating: average_rating(&reviews),
            reviews_count: reviews.len(),
            primary_image,
            created_at: listing.created_at,
        })
    }

    /// Primary first, then by sort order.
    fn images_ordered(&self, listing: ListingId) -> Result<Vec<ImageView>, CatalogError> {
        let mut images = self.catalog.images_of(listing)?;
        images.sort_by(|a, b| {
            b.is_primary
                .cmp(&a.is_primary)
                .then(a.sort_order.cmp(&b.sort_order))
        });
        Ok(images
            .into_iter()
            .map(|image| ImageView {
                id: image.id,
                alt_text: image.alt_text,
                is_primary: image.is_primary,
                sort_order: image.sort_order,
            })
            .collect())
    }

    fn unique_slug(&self, title: &str) -> Result<String, CatalogError> {
        let base = slugify(title);
        let taken: Vec<String> = self
            .catalog
            .listings()?
            .into_iter()
            .map(|listing| listing.slug)
            .collect();

        if !taken.contains(&base) {
            return Ok(base);
        }
        let mut suffix = 2;
        loop {
            let candidate = format!("{base}-{suffix}");
            if !taken.contains(&candidate) {
                return Ok(candidate);
            }
            suffix += 1;
        }
    }

    async fn lookup_coordinates(
        &self,
        city: &str,
        address: &str,
    ) -> Option<crate::geo::GeoPoint> {
        match self.geocoder.geocode(city, address).await {
            Ok(point) => point,
            Err(err) => {
                warn!(error = %err, "geocoding failed, coordinates left unset");
                None
            }
        }
    }
}

fn average_rating(reviews: &[crate::review::Review]) -> f64 {
    if reviews.is_empty() {
        return 0.0;
    }
    let sum: u32 = reviews.iter().map(|review| u32::from(review.rating)).sum();
    let avg = f64::from(sum) / reviews.len() as f64;
    (avg * 10.0).round() / 10.0
}

fn sort_summaries(summaries: &mut [ListingSummary], sort: SortOrder) {
    match sort {
        SortOrder::Newest => summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortOrder::PriceAsc => summaries.sort_by_key(|summary| {
            summary.min_price_minor.unwrap_or(i64::MAX)
        }),
        SortOrder::PriceDesc => {
            summaries.sort_by_key(|summary| summary.min_price_minor.unwrap_or(i64::MIN));
            summaries.reverse();
        }
        SortOrder::AreaAsc => summaries.sort_by(|a, b| {
            a.area_sqm
                .partial_cmp(&b.area_sqm)
                .unwrap_or(Ordering::Equal)
        }),
        SortOrder::AreaDesc => summaries.sort_by(|a, b| {
            b.area_sqm
                .partial_cmp(&a.area_sqm)
                .unwrap_or(Ordering::Equal)
        }),
        SortOrder::Popular => summaries.sort_by(|a, b| b.views_count.cmp(&a.views_count)),
        SortOrder::Rating => summaries.sort_by(|a, b| {
            b.avg_rating
                .partial_cmp(&a.avg_rating)
                .unwrap_or(Ordering::Equal)
        }),
    }
}

/// Error raised by catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("listing not found")]
    NotFound,
    #[error("city not found")]
    CityNotFound,
    #[error("category not found")]
    CategoryNotFound,
    #[error("image not found")]
    ImageNotFound,
    #[error("area must be positive")]
    InvalidArea,
    #[error("capacity must be at least one person")]
    InvalidCapacity,
    #[error("price must be positive and period bounds consistent")]
    InvalidPrice,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
