//! Catalog filtering, sorting and pagination.
//!
//! Listing parameters arrive as raw query-string values and are read
//! leniently: a malformed filter or sort is ignored rather than rejected, and
//! page numbers take the leading integer of whatever was sent.
//!
//! ```
//! use emporium_core::{PriceSort, ProductFilter, ProductQuery};
//!
//! let query = ProductQuery::from_params(Some("5"), Some("2"), Some("desc"), Some("category:Books"));
//! assert_eq!(query.page.page_size, 5);
//! assert_eq!(query.page.page, 2);
//! assert_eq!(query.sort, Some(PriceSort::Desc));
//! assert_eq!(query.filter, Some(ProductFilter::Category("Books".to_owned())));
//! ```

use core::cmp::Ordering;

use serde::Serialize;

use crate::product::Product;
use crate::types::lenient;

/// A single catalog filter, parsed from `key:value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductFilter {
    /// Exact, case-sensitive category match.
    Category(String),
    /// Products listed (or unlisted) for sale.
    Status(bool),
    /// Products with at least one unit in stock.
    Available,
}

impl ProductFilter {
    /// Parse `key:value`, splitting at the first colon.
    ///
    /// Unknown keys, a missing colon and a `status` value other than `true`
    /// or `false` all yield `None`, meaning "no filter".
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let (key, value) = raw.split_once(':')?;
        match key.trim() {
            "category" => Some(Self::Category(value.trim().to_owned())),
            "status" => match value.trim() {
                "true" => Some(Self::Status(true)),
                "false" => Some(Self::Status(false)),
                _ => None,
            },
            "available" => Some(Self::Available),
            _ => None,
        }
    }

    /// Whether `product` passes the filter.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        match self {
            Self::Category(category) => product.category == *category,
            Self::Status(status) => product.status == *status,
            Self::Available => product.is_available(),
        }
    }
}

/// Price ordering for catalog listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSort {
    Asc,
    Desc,
}

impl PriceSort {
    /// Parse `asc` or `desc`; anything else means "unsorted".
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Requested page, both numbers at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub const DEFAULT_PAGE_SIZE: u32 = 10;

    /// Read page and page size leniently, defaulting to 1 and 10 and
    /// flooring both to 1.
    #[must_use]
    pub fn from_params(page: Option<&str>, limit: Option<&str>) -> Self {
        Self {
            page: lenient_positive(page, 1),
            page_size: lenient_positive(limit, Self::DEFAULT_PAGE_SIZE),
        }
    }

    /// Number of rows to skip.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: Self::DEFAULT_PAGE_SIZE,
        }
    }
}

/// `parseInt`-style read: unparseable or zero means `default`, negatives
/// floor to one, huge values saturate.
fn lenient_positive(raw: Option<&str>, default: u32) -> u32 {
    match raw.and_then(lenient::int_prefix) {
        None | Some(0) => default,
        Some(n) if n < 1 => 1,
        Some(n) => u32::try_from(n).unwrap_or(u32::MAX),
    }
}

/// Pagination metadata for one page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub total_pages: u32,
    pub page: u32,
    pub prev_page: Option<u32>,
    pub next_page: Option<u32>,
    pub has_prev_page: bool,
    pub has_next_page: bool,
}

impl PageInfo {
    /// Compute page metadata. There is always at least one page.
    #[must_use]
    pub fn new(request: PageRequest, total: u64) -> Self {
        let pages = total.div_ceil(u64::from(request.page_size)).max(1);
        let total_pages = u32::try_from(pages).unwrap_or(u32::MAX);
        let page = request.page;
        let prev_page = (page > 1).then(|| page - 1);
        let next_page = (page < total_pages).then(|| page + 1);
        Self {
            total_pages,
            page,
            prev_page,
            next_page,
            has_prev_page: prev_page.is_some(),
            has_next_page: next_page.is_some(),
        }
    }
}

/// One page of results with its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub info: PageInfo,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            info: PageInfo::new(request, total),
        }
    }
}

/// A full catalog listing request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    pub filter: Option<ProductFilter>,
    pub sort: Option<PriceSort>,
    pub page: PageRequest,
}

impl ProductQuery {
    /// Build a query from raw `limit`, `page`, `sort` and `query` values.
    #[must_use]
    pub fn from_params(
        limit: Option<&str>,
        page: Option<&str>,
        sort: Option<&str>,
        query: Option<&str>,
    ) -> Self {
        Self {
            filter: query.and_then(ProductFilter::parse),
            sort: sort.and_then(PriceSort::parse),
            page: PageRequest::from_params(page, limit),
        }
    }

    /// Whether `product` passes the filter, if any.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        self.filter.as_ref().is_none_or(|f| f.matches(product))
    }

    /// Listing order: price when sorted, then creation time, then id.
    #[must_use]
    pub fn compare(&self, a: &Product, b: &Product) -> Ordering {
        let by_price = match self.sort {
            Some(PriceSort::Asc) => a.price.cmp(&b.price),
            Some(PriceSort::Desc) => b.price.cmp(&a.price),
            None => Ordering::Equal,
        };
        by_price
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    }

    /// Filter, order and slice an in-memory catalog.
    #[must_use]
    pub fn apply<'a>(&self, products: impl IntoIterator<Item = &'a Product>) -> Page<Product> {
        let mut matching: Vec<&Product> = products.into_iter().filter(|p| self.matches(p)).collect();
        matching.sort_by(|a, b| self.compare(a, b));

        let total = matching.len() as u64;
        let skip = usize::try_from(self.page.offset()).unwrap_or(usize::MAX);
        let take = usize::try_from(self.page.page_size).unwrap_or(usize::MAX);
        let items = matching
            .into_iter()
            .skip(skip)
            .take(take)
            .cloned()
            .collect();
        Page::new(items, total, self.page)
    }
}
