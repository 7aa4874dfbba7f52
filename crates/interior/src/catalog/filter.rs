use serde::{Deserialize, Serialize};

use super::domain::{CategoryId, CityId};

/// Search and filter parameters for the public catalog.
///
/// Deserializes directly from the listings query string; every field is
/// optional and unknown ids simply match nothing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchFilter {
    pub search: Option<String>,
    pub city: Option<CityId>,
    pub category: Option<CategoryId>,
    pub min_area: Option<f64>,
    pub max_area: Option<f64>,
    pub min_price_minor: Option<i64>,
    pub max_price_minor: Option<i64>,
    pub min_capacity: Option<u32>,
    #[serde(default)]
    pub sort: SortOrder,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

impl SearchFilter {
    pub const DEFAULT_PER_PAGE: usize = 12;

    pub fn page(&self) -> usize {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> usize {
        self.per_page.unwrap_or(Self::DEFAULT_PER_PAGE).clamp(1, 100)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    AreaAsc,
    AreaDesc,
    Popular,
    Rating,
}

/// One page of results plus pagination metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// Slice a fully sorted result set down to the requested page.
    pub fn slice(mut items: Vec<T>, page: usize, per_page: usize) -> Self {
        let total = items.len();
        let total_pages = total.div_ceil(per_page).max(1);
        let page = page.clamp(1, total_pages);
        let start = (page - 1) * per_page;
        let items: Vec<T> = if start >= total {
            Vec::new()
        } else {
            items.drain(start..(start + per_page).min(total)).collect()
        };

        Self {
            items,
            page,
            per_page,
            total,
            total_pages,
        }
    }
}
