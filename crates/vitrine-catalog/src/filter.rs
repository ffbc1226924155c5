//! Declarative product filtering.
//!
//! A [`FilterSpec`] combines independent dimensions (price, category,
//! country, named attributes) with AND; values selected within one dimension
//! combine with OR. An empty dimension places no constraint. Products whose
//! fields are missing or malformed simply fail the dimension in question.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use vitrine_core::{resolve_category_ref, Category, Product};

/// Inclusive price bounds. An unset bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
}

impl PriceRange {
    #[must_use]
    pub fn between(low: f64, high: f64) -> Self {
        Self {
            low: Some(low),
            high: Some(high),
        }
    }

    /// `low <= price <= high`. A NaN price never matches; an inverted range
    /// matches nothing.
    #[must_use]
    pub fn contains(&self, price: f64) -> bool {
        if price.is_nan() {
            return false;
        }
        self.low.map_or(true, |low| price >= low) && self.high.map_or(true, |high| price <= high)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    #[serde(default)]
    pub price_range: PriceRange,
    #[serde(default)]
    pub selected_categories: BTreeSet<String>,
    #[serde(default)]
    pub selected_countries: BTreeSet<String>,
    /// Attribute key to acceptable values. Keys with an empty value set are
    /// ignored.
    #[serde(default)]
    pub selected_filters: BTreeMap<String, BTreeSet<String>>,
}

impl FilterSpec {
    /// `true` when no dimension constrains anything.
    #[must_use]
    pub fn is_unconstrained(&self) -> bool {
        self.price_range == PriceRange::default()
            && self.selected_categories.is_empty()
            && self.selected_countries.is_empty()
            && self.selected_filters.values().all(BTreeSet::is_empty)
    }
}

/// A [`FilterSpec`] prepared for one filtering pass over a catalog.
///
/// Building the matcher resolves the category tree once so that each product
/// check is a handful of set lookups.
pub struct ProductMatcher<'a> {
    spec: &'a FilterSpec,
    known_categories: HashSet<&'a str>,
}

impl<'a> ProductMatcher<'a> {
    #[must_use]
    pub fn new(categories: &'a [Category], spec: &'a FilterSpec) -> Self {
        let known_categories = if spec.selected_categories.is_empty() {
            HashSet::new()
        } else {
            Category::flatten(categories)
                .into_iter()
                .map(|c| c.id.as_str())
                .collect()
        };
        Self {
            spec,
            known_categories,
        }
    }

    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        self.spec.price_range.contains(product.price)
            && self.matches_category(product)
            && self.matches_country(product)
            && self.matches_attributes(product)
    }

    fn matches_category(&self, product: &Product) -> bool {
        if self.spec.selected_categories.is_empty() {
            return true;
        }
        // A reference to a category the catalog does not know counts as no category.
        resolve_category_ref(product).is_some_and(|id| {
            self.known_categories.contains(id) && self.spec.selected_categories.contains(id)
        })
    }

    fn matches_country(&self, product: &Product) -> bool {
        if self.spec.selected_countries.is_empty() {
            return true;
        }
        product
            .country
            .as_deref()
            .is_some_and(|country| self.spec.selected_countries.contains(country))
    }

    fn matches_attributes(&self, product: &Product) -> bool {
        self.spec
            .selected_filters
            .iter()
            .filter(|(_, accepted)| !accepted.is_empty())
            .all(|(key, accepted)| {
                product
                    .attribute(key)
                    .is_some_and(|value| attribute_matches(value, accepted))
            })
    }
}

/// Returns the products matching `spec`, in input order.
///
/// Never mutates or reorders `products`; sorting is a separate step.
#[must_use]
pub fn filter(products: &[Product], categories: &[Category], spec: &FilterSpec) -> Vec<Product> {
    let matcher = ProductMatcher::new(categories, spec);
    let matched: Vec<Product> = products
        .iter()
        .filter(|p| matcher.matches(p))
        .cloned()
        .collect();
    tracing::trace!(
        input = products.len(),
        matched = matched.len(),
        "catalog filter pass"
    );
    matched
}

fn attribute_matches(value: &Value, accepted: &BTreeSet<String>) -> bool {
    match value {
        Value::Array(values) => values
            .iter()
            .filter_map(scalar_string)
            .any(|v| accepted.contains(v.as_ref())),
        other => scalar_string(other).is_some_and(|v| accepted.contains(v.as_ref())),
    }
}

/// Stringifies a string or number attribute value; other JSON kinds have no
/// string form for matching purposes.
///
/// Whole floats render without a fractional part so `42.0` and `42` compare
/// equal to the selected value `"42"`.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn scalar_string(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => {
            if n.is_f64() {
                let f = n.as_f64()?;
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    return Some(Cow::Owned(format!("{}", f as i64)));
                }
            }
            Some(Cow::Owned(n.to_string()))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn products(value: Value) -> Vec<Product> {
        serde_json::from_value(value).expect("product fixtures should deserialize")
    }

    fn categories() -> Vec<Category> {
        serde_json::from_value(json!([
            {"_id": "c1", "name": "Eyewear", "children": [{"_id": "c1a", "name": "Sunglasses"}]},
            {"_id": "c2", "name": "Footwear"}
        ]))
        .unwrap()
    }

    fn ids(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.id.as_str()).collect()
    }

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| (*v).to_owned()).collect()
    }

    #[test]
    fn price_and_category_scenario() {
        let catalog = products(json!([
            {"_id": 1, "price": 1000, "categoryId": {"_id": "c1"}},
            {"_id": 2, "price": 5000, "categoryId": {"_id": "c2"}}
        ]));
        let spec = FilterSpec {
            price_range: PriceRange::between(0.0, 3000.0),
            selected_categories: set(&["c1"]),
            ..FilterSpec::default()
        };
        let result = filter(&catalog, &categories(), &spec);
        assert_eq!(ids(&result), ["1"]);
    }

    #[test]
    fn price_bounds_are_inclusive() {
        let catalog = products(json!([
            {"_id": "low", "price": 100},
            {"_id": "mid", "price": 150},
            {"_id": "high", "price": 200},
            {"_id": "below", "price": 99.99},
            {"_id": "above", "price": 200.01}
        ]));
        let spec = FilterSpec {
            price_range: PriceRange::between(100.0, 200.0),
            ..FilterSpec::default()
        };
        assert_eq!(ids(&filter(&catalog, &[], &spec)), ["low", "mid", "high"]);
    }

    #[test]
    fn inverted_price_range_matches_nothing() {
        let catalog = products(json!([{"_id": "a", "price": 10}]));
        let spec = FilterSpec {
            price_range: PriceRange::between(50.0, 5.0),
            ..FilterSpec::default()
        };
        assert!(filter(&catalog, &[], &spec).is_empty());
    }

    #[test]
    fn empty_category_selection_ignores_category_values() {
        let catalog = products(json!([
            {"_id": "a", "price": 1, "categoryId": "c1"},
            {"_id": "b", "price": 1, "category": "unknown"},
            {"_id": "c", "price": 1}
        ]));
        let result = filter(&catalog, &[], &FilterSpec::default());
        assert_eq!(ids(&result), ["a", "b", "c"]);
    }

    #[test]
    fn category_resolves_from_either_field_and_nested_children() {
        let catalog = products(json!([
            {"_id": "a", "price": 1, "categoryId": "c1a"},
            {"_id": "b", "price": 1, "category": {"_id": "c1a"}},
            {"_id": "c", "price": 1, "category": "c2"},
            {"_id": "d", "price": 1}
        ]));
        let spec = FilterSpec {
            selected_categories: set(&["c1a"]),
            ..FilterSpec::default()
        };
        assert_eq!(ids(&filter(&catalog, &categories(), &spec)), ["a", "b"]);
    }

    #[test]
    fn unresolved_category_reference_fails_category_filter() {
        let catalog = products(json!([{"_id": "a", "price": 1, "categoryId": "ghost"}]));
        let spec = FilterSpec {
            selected_categories: set(&["ghost"]),
            ..FilterSpec::default()
        };
        assert!(filter(&catalog, &categories(), &spec).is_empty());
    }

    #[test]
    fn multiple_categories_combine_with_or() {
        let catalog = products(json!([
            {"_id": "a", "price": 1, "categoryId": "c1"},
            {"_id": "b", "price": 1, "categoryId": "c2"}
        ]));
        let spec = FilterSpec {
            selected_categories: set(&["c1", "c2"]),
            ..FilterSpec::default()
        };
        assert_eq!(ids(&filter(&catalog, &categories(), &spec)), ["a", "b"]);
    }

    #[test]
    fn country_filter_rejects_products_without_country() {
        let catalog = products(json!([
            {"_id": "a", "price": 1, "country": "Italy"},
            {"_id": "b", "price": 1, "country": "Japan"},
            {"_id": "c", "price": 1}
        ]));
        let spec = FilterSpec {
            selected_countries: set(&["Italy", "France"]),
            ..FilterSpec::default()
        };
        assert_eq!(ids(&filter(&catalog, &[], &spec)), ["a"]);
    }

    #[test]
    fn attribute_filter_matches_scalars_and_collections() {
        let catalog = products(json!([
            {"_id": "scalar", "price": 1, "attributes": {"frameMaterial": "acetate"}},
            {"_id": "array", "price": 1, "attributes": {"frameMaterial": ["metal", "acetate"]}},
            {"_id": "miss", "price": 1, "attributes": {"frameMaterial": "titanium"}},
            {"_id": "absent", "price": 1, "attributes": {"lensColor": "green"}},
            {"_id": "object", "price": 1, "attributes": {"frameMaterial": {"name": "acetate"}}}
        ]));
        let mut spec = FilterSpec::default();
        spec.selected_filters
            .insert("frameMaterial".to_owned(), set(&["acetate"]));
        assert_eq!(ids(&filter(&catalog, &[], &spec)), ["scalar", "array"]);
    }

    #[test]
    fn numeric_attributes_match_their_string_form() {
        let catalog = products(json!([
            {"_id": "int", "price": 1, "attributes": {"size": 42}},
            {"_id": "float", "price": 1, "attributes": {"size": 42.0}},
            {"_id": "half", "price": 1, "attributes": {"size": [41.5, 43]}},
            {"_id": "other", "price": 1, "attributes": {"size": 40}}
        ]));
        let mut spec = FilterSpec::default();
        spec.selected_filters
            .insert("size".to_owned(), set(&["42", "41.5"]));
        assert_eq!(ids(&filter(&catalog, &[], &spec)), ["int", "float", "half"]);
    }

    #[test]
    fn attribute_keys_combine_with_and_and_empty_sets_are_ignored() {
        let catalog = products(json!([
            {"_id": "both", "price": 1, "attributes": {"sizeSystem": "EU", "color": "red"}},
            {"_id": "one", "price": 1, "attributes": {"sizeSystem": "EU", "color": "blue"}}
        ]));
        let mut spec = FilterSpec::default();
        spec.selected_filters.insert("sizeSystem".to_owned(), set(&["EU"]));
        spec.selected_filters.insert("color".to_owned(), set(&["red"]));
        spec.selected_filters.insert("width".to_owned(), BTreeSet::new());
        assert_eq!(ids(&filter(&catalog, &[], &spec)), ["both"]);
    }

    #[test]
    fn filtering_is_idempotent_and_preserves_order() {
        let catalog = products(json!([
            {"_id": "z", "price": 30, "country": "Italy", "categoryId": "c2"},
            {"_id": "a", "price": 10, "country": "Italy", "categoryId": "c1"},
            {"_id": "m", "price": 20, "country": "Spain", "categoryId": "c1"},
            {"_id": "b", "price": 15, "country": "Italy", "categoryId": "c1a"}
        ]));
        let spec = FilterSpec {
            price_range: PriceRange::between(10.0, 30.0),
            selected_categories: set(&["c1", "c2", "c1a"]),
            selected_countries: set(&["Italy"]),
            ..FilterSpec::default()
        };
        let once = filter(&catalog, &categories(), &spec);
        let twice = filter(&once, &categories(), &spec);
        assert_eq!(ids(&once), ["z", "a", "b"]);
        assert_eq!(once, twice);
    }

    #[test]
    fn filter_does_not_mutate_input() {
        let catalog = products(json!([{"_id": "a", "price": 5}, {"_id": "b", "price": 500}]));
        let before = catalog.clone();
        let spec = FilterSpec {
            price_range: PriceRange::between(0.0, 10.0),
            ..FilterSpec::default()
        };
        let _ = filter(&catalog, &[], &spec);
        assert_eq!(catalog, before);
    }

    #[test]
    fn spec_deserializes_from_camel_case_json() {
        let spec: FilterSpec = serde_json::from_value(json!({
            "priceRange": {"low": 0, "high": 3000},
            "selectedCategories": ["c1"],
            "selectedFilters": {"frameMaterial": ["acetate"]}
        }))
        .unwrap();
        assert_eq!(spec.price_range, PriceRange::between(0.0, 3000.0));
        assert!(spec.selected_countries.is_empty());
        assert!(!spec.is_unconstrained());
        assert!(FilterSpec::default().is_unconstrained());
    }
}
