use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::de;

/// A catalog entry as served by `GET /products`.
///
/// Products are owned by the remote catalog; the client only ever holds
/// read-only copies. The category reference arrives under either `categoryId`
/// or `category` depending on which backend code path produced the payload;
/// use [`resolve_category_ref`] instead of reading either field directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id", alias = "id", deserialize_with = "de::id_string")]
    pub id: String,
    #[serde(default, deserialize_with = "de::string_or_empty")]
    pub slug: String,
    #[serde(default, alias = "title", deserialize_with = "de::string_or_empty")]
    pub name: String,
    #[serde(deserialize_with = "de::lenient_f64")]
    pub price: f64,
    /// Pre-discount price. Only drives the discount badge; not validated
    /// against `price`.
    #[serde(
        default,
        deserialize_with = "de::opt_lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub original_price: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_count")]
    pub stock: u32,
    #[serde(
        default,
        deserialize_with = "opt_category_ref",
        skip_serializing_if = "Option::is_none"
    )]
    pub category_id: Option<CategoryRef>,
    #[serde(
        default,
        deserialize_with = "opt_category_ref",
        skip_serializing_if = "Option::is_none"
    )]
    pub category: Option<CategoryRef>,
    #[serde(
        default,
        deserialize_with = "de::opt_non_empty_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub country: Option<String>,
    /// Category-specific attributes, e.g. `frameMaterial` for eyewear or
    /// `sizeSystem` for footwear. Values are scalars or arrays of scalars.
    #[serde(
        default,
        alias = "specifications",
        deserialize_with = "de::object_or_empty",
        skip_serializing_if = "Map::is_empty"
    )]
    pub attributes: Map<String, Value>,
}

impl Product {
    /// Returns the raw attribute value stored under `key`, if any.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    #[must_use]
    pub fn is_in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Rounded percentage off the original price, for the discount badge.
    ///
    /// `None` unless `original_price > price > 0`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn discount_percent(&self) -> Option<u32> {
        let original = self.original_price?;
        if self.price > 0.0 && original > self.price {
            Some(((original - self.price) / original * 100.0).round() as u32)
        } else {
            None
        }
    }
}

/// A product's pointer at its category: either a bare identifier or a
/// populated category document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CategoryRef {
    Id(String),
    Populated {
        #[serde(rename = "_id")]
        id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        slug: Option<String>,
    },
}

impl CategoryRef {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            CategoryRef::Id(id) | CategoryRef::Populated { id, .. } => id,
        }
    }

    /// Interprets a raw JSON value as a category reference.
    ///
    /// Returns `None` for `null`, empty strings, and objects without an
    /// `_id`/`id` field.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(_) | Value::Number(_) => de::id_from_value(value).map(CategoryRef::Id),
            Value::Object(obj) => {
                let id = obj
                    .get("_id")
                    .or_else(|| obj.get("id"))
                    .and_then(de::id_from_value)?;
                let text = |key: &str| {
                    obj.get(key)
                        .and_then(Value::as_str)
                        .filter(|s| !s.is_empty())
                        .map(str::to_owned)
                };
                Some(CategoryRef::Populated {
                    id,
                    name: text("name"),
                    slug: text("slug"),
                })
            }
            _ => None,
        }
    }
}

fn opt_category_ref<'de, D>(deserializer: D) -> Result<Option<CategoryRef>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(CategoryRef::from_value(&value))
}

/// Resolves the category identifier of `product`.
///
/// `categoryId` wins when both legacy fields are populated. Returns `None`
/// when neither is.
#[must_use]
pub fn resolve_category_ref(product: &Product) -> Option<&str> {
    product
        .category_id
        .as_ref()
        .or(product.category.as_ref())
        .map(CategoryRef::id)
}

/// A named grouping of products, possibly with nested subcategories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(rename = "_id", alias = "id", deserialize_with = "de::id_string")]
    pub id: String,
    #[serde(default, deserialize_with = "de::string_or_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "de::string_or_empty")]
    pub slug: String,
    #[serde(
        default = "default_active",
        alias = "isActive",
        deserialize_with = "de::bool_or_true"
    )]
    pub active: bool,
    #[serde(
        default,
        deserialize_with = "de::null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub children: Vec<Category>,
}

impl Category {
    /// Depth-first walk over `categories` and all of their descendants.
    #[must_use]
    pub fn flatten(categories: &[Category]) -> Vec<&Category> {
        let mut out = Vec::new();
        let mut stack: Vec<&Category> = categories.iter().rev().collect();
        while let Some(category) = stack.pop() {
            out.push(category);
            stack.extend(category.children.iter().rev());
        }
        out
    }
}

fn default_active() -> bool {
    true
}
