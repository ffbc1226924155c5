use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::Value;
use vitrine_core::{resolve_category_ref, Product};

use crate::filter::scalar_string;

/// Option lists for the filter UI, derived from a product collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Facets {
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub countries: BTreeSet<String>,
    /// Category id to number of products referencing it.
    pub categories: BTreeMap<String, usize>,
    /// Attribute key to every distinct stringified value seen under it.
    pub attributes: BTreeMap<String, BTreeSet<String>>,
}

impl Facets {
    #[must_use]
    pub fn from_products(products: &[Product]) -> Self {
        let mut facets = Facets::default();
        for product in products {
            if !product.price.is_nan() {
                let price = product.price;
                facets.price_min = Some(facets.price_min.map_or(price, |m| m.min(price)));
                facets.price_max = Some(facets.price_max.map_or(price, |m| m.max(price)));
            }
            if let Some(country) = &product.country {
                facets.countries.insert(country.clone());
            }
            if let Some(category) = resolve_category_ref(product) {
                *facets.categories.entry(category.to_owned()).or_default() += 1;
            }
            for (key, value) in &product.attributes {
                let values = facets.attributes.entry(key.clone()).or_default();
                match value {
                    Value::Array(items) => {
                        let scalars = items.iter().filter_map(scalar_string);
                        values.extend(scalars.map(std::borrow::Cow::into_owned));
                    }
                    other => values.extend(scalar_string(other).map(|v| v.into_owned())),
                }
            }
        }
        facets.attributes.retain(|_, values| !values.is_empty());
        facets
    }
}
