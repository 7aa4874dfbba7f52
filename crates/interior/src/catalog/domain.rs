use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::accounts::UserId;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CityId(pub u64);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CategoryId(pub u64);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct RentalPeriodId(pub u64);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ListingId(pub u64);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ListingImageId(pub u64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub id: CityId,
    pub name: String,
    pub region: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaceCategory {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub is_active: bool,
}

/// One rentable time unit (hour, day, week, month) with its hour length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalPeriod {
    pub id: RentalPeriodId,
    pub code: String,
    pub description: String,
    pub hours_count: u32,
    pub sort_order: u16,
}

/// A rentable space offered on the marketplace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub title: String,
    pub slug: String,
    pub address: String,
    pub city_id: CityId,
    pub category_id: CategoryId,
    pub area_sqm: f64,
    pub max_capacity: u32,
    pub description: String,
    pub owner_id: UserId,
    pub is_active: bool,
    pub is_featured: bool,
    pub views_count: u64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Creation payload; slug and coordinates are derived by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewListing {
    pub title: String,
    pub address: String,
    pub city_id: CityId,
    pub category_id: CategoryId,
    pub area_sqm: f64,
    pub max_capacity: u32,
    pub description: String,
    pub owner_id: UserId,
    #[serde(default)]
    pub is_featured: bool,
}

/// Partial update; `None` fields keep their current values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingUpdate {
    pub title: Option<String>,
    pub address: Option<String>,
    pub city_id: Option<CityId>,
    pub category_id: Option<CategoryId>,
    pub area_sqm: Option<f64>,
    pub max_capacity: Option<u32>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingImage {
    pub id: ListingImageId,
    pub listing_id: ListingId,
    pub alt_text: String,
    pub is_primary: bool,
    pub sort_order: u16,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewListingImage {
    pub listing_id: ListingId,
    #[serde(default)]
    pub alt_text: String,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub sort_order: u16,
}

/// Price of a listing for one rental period, unique per (listing, period).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingPrice {
    pub listing_id: ListingId,
    pub period_id: RentalPeriodId,
    pub price_minor: i64,
    pub is_active: bool,
    pub min_periods: u32,
    pub max_periods: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Favorite {
    pub user_id: UserId,
    pub listing_id: ListingId,
    pub created_at: DateTime<Utc>,
}

/// Lowercased, dash-separated URL name derived from a title.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut last_dash = true;
    for ch in value.chars() {
        if ch.is_alphanumeric() {
            for lower in ch.to_lowercase() {
                slug.push(lower);
            }
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Loft on Main St."), "loft-on-main-st");
        assert_eq!(slugify("  Photo  Studio #7 "), "photo-studio-7");
        assert_eq!(slugify("Штаб-квартира"), "штаб-квартира");
    }
}
