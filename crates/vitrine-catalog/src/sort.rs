use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use vitrine_core::Product;

/// Catalog ordering applied after filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    /// Input order, as served by the catalog.
    #[default]
    Featured,
    PriceAsc,
    PriceDesc,
    NameAsc,
    NameDesc,
    /// Largest discount first; products without a discount go last.
    DiscountDesc,
}

impl SortKey {
    pub const ALL: [SortKey; 6] = [
        SortKey::Featured,
        SortKey::PriceAsc,
        SortKey::PriceDesc,
        SortKey::NameAsc,
        SortKey::NameDesc,
        SortKey::DiscountDesc,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Featured => "featured",
            SortKey::PriceAsc => "price-asc",
            SortKey::PriceDesc => "price-desc",
            SortKey::NameAsc => "name-asc",
            SortKey::NameDesc => "name-desc",
            SortKey::DiscountDesc => "discount",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortKey::ALL
            .into_iter()
            .find(|key| key.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let valid: Vec<&str> = SortKey::ALL.iter().map(|k| k.as_str()).collect();
                format!("unknown sort key \"{s}\" (expected one of: {})", valid.join(", "))
            })
    }
}

/// Returns a sorted copy of `products`. The sort is stable, so ties keep
/// their catalog order.
#[must_use]
pub fn sort_products(products: &[Product], key: SortKey) -> Vec<Product> {
    let mut sorted = products.to_vec();
    match key {
        SortKey::Featured => {}
        SortKey::PriceAsc => sorted.sort_by(|a, b| a.price.total_cmp(&b.price)),
        SortKey::PriceDesc => sorted.sort_by(|a, b| b.price.total_cmp(&a.price)),
        SortKey::NameAsc => sorted.sort_by_cached_key(|p| p.name.to_lowercase()),
        SortKey::NameDesc => {
            sorted.sort_by(|a, b| b.name.to_lowercase().cmp(&a.name.to_lowercase()));
        }
        SortKey::DiscountDesc => sorted.sort_by(|a, b| by_discount_desc(a, b)),
    }
    sorted
}

fn by_discount_desc(a: &Product, b: &Product) -> Ordering {
    match (a.discount_percent(), b.discount_percent()) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
