//! Canonicalization of list responses from the storefront API.
//!
//! ## Observed envelope shapes
//!
//! Different backend routes wrap the same logical list differently:
//!
//! 1. `{ "data": [..] }`: flat data array.
//! 2. `{ "success": true, "data": { "items": [..], "pagination": {..} } }`:
//!    nested and paginated. Some routes name the inner array after the
//!    resource (`data.products`) instead of `items`.
//! 3. `{ "products": [..] }` / `{ "categories": [..] }` / `{ "items": [..] }`:
//!    a directly named array.
//! 4. `[..]`: a bare array.
//!
//! Shapes are tried in that order; the first match wins. A body matching none
//! of them degrades to an empty list with a [`Diagnostic::UnrecognizedShape`]
//! rather than an error. Elements that fail to deserialize into the target
//! type are skipped and reported as [`Diagnostic::MalformedItem`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which envelope a response arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WireShape {
    FlatData,
    NestedPaginated,
    NamedArray,
    BareArray,
}

/// Pagination block of the nested shape. Every field is optional because the
/// backend omits them freely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub pages: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The body matched none of the known envelopes.
    UnrecognizedShape { found: String },
    /// Element `index` of the list could not be read as the target type.
    MalformedItem { index: usize, reason: String },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::UnrecognizedShape { found } => {
                write!(f, "unrecognized response shape: {found}")
            }
            Diagnostic::MalformedItem { index, reason } => {
                write!(f, "skipped malformed item #{index}: {reason}")
            }
        }
    }
}

/// Canonical list result.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<T> {
    pub items: Vec<T>,
    /// `None` when no envelope matched.
    pub shape: Option<WireShape>,
    pub pagination: Option<Pagination>,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Normalized<T> {
    /// `true` when an envelope matched and every element was readable.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.shape.is_some() && self.diagnostics.is_empty()
    }
}

struct Extracted<'a> {
    items: &'a [Value],
    pagination: Option<&'a Value>,
}

type Matcher = for<'a> fn(&'a Value, &[&str]) -> Option<Extracted<'a>>;

/// Envelope matchers in priority order.
const MATCHERS: [(WireShape, Matcher); 4] = [
    (WireShape::FlatData, match_flat_data as Matcher),
    (WireShape::NestedPaginated, match_nested_paginated as Matcher),
    (WireShape::NamedArray, match_named_array as Matcher),
    (WireShape::BareArray, match_bare_array as Matcher),
];

/// Generic array key accepted alongside the resource-specific names.
const GENERIC_LIST_KEY: &str = "items";

fn match_flat_data<'a>(body: &'a Value, _names: &[&str]) -> Option<Extracted<'a>> {
    let items = body.as_object()?.get("data")?.as_array()?;
    Some(Extracted {
        items,
        pagination: None,
    })
}

fn match_nested_paginated<'a>(body: &'a Value, names: &[&str]) -> Option<Extracted<'a>> {
    let obj = body.as_object()?;
    if obj.get("success").and_then(Value::as_bool) == Some(false) {
        return None;
    }
    let data = obj.get("data")?.as_object()?;
    let items = std::iter::once(GENERIC_LIST_KEY)
        .chain(names.iter().copied())
        .find_map(|key| data.get(key).and_then(Value::as_array))?;
    Some(Extracted {
        items,
        pagination: data.get("pagination").or_else(|| obj.get("pagination")),
    })
}

fn match_named_array<'a>(body: &'a Value, names: &[&str]) -> Option<Extracted<'a>> {
    let obj = body.as_object()?;
    let items = std::iter::once(GENERIC_LIST_KEY)
        .chain(names.iter().copied())
        .find_map(|key| obj.get(key).and_then(Value::as_array))?;
    Some(Extracted {
        items,
        pagination: obj.get("pagination"),
    })
}

fn match_bare_array<'a>(body: &'a Value, _names: &[&str]) -> Option<Extracted<'a>> {
    Some(Extracted {
        items: body.as_array()?,
        pagination: None,
    })
}

/// Short description of an unmatched body for diagnostics.
fn describe(body: &Value) -> String {
    match body {
        Value::Null => "null".to_owned(),
        Value::Bool(_) => "boolean".to_owned(),
        Value::Number(_) => "number".to_owned(),
        Value::String(_) => "string".to_owned(),
        Value::Array(_) => "array".to_owned(),
        Value::Object(obj) => {
            let keys: Vec<&str> = obj.keys().map(String::as_str).collect();
            format!("object with keys [{}]", keys.join(", "))
        }
    }
}

/// Normalizes a list response into [`Normalized<T>`].
///
/// `names` lists the resource-specific array keys the endpoint may use
/// (`"products"`, `"categories"`, ...); `"items"` is always accepted.
///
/// Never fails: an unknown envelope yields an empty list plus a diagnostic.
#[must_use]
pub fn normalize_list<T>(body: &Value, names: &[&str]) -> Normalized<T>
where
    T: DeserializeOwned,
{
    let Some((shape, extracted)) = MATCHERS
        .iter()
        .find_map(|(shape, matcher)| matcher(body, names).map(|e| (*shape, e)))
    else {
        let found = describe(body);
        tracing::warn!(%found, ?names, "unrecognized response shape, treating as empty list");
        return Normalized {
            items: Vec::new(),
            shape: None,
            pagination: None,
            diagnostics: vec![Diagnostic::UnrecognizedShape { found }],
        };
    };

    let mut items = Vec::with_capacity(extracted.items.len());
    let mut diagnostics = Vec::new();
    for (index, raw) in extracted.items.iter().enumerate() {
        match T::deserialize(raw) {
            Ok(item) => items.push(item),
            Err(e) => {
                tracing::warn!(index, error = %e, "skipping malformed list item");
                diagnostics.push(Diagnostic::MalformedItem {
                    index,
                    reason: e.to_string(),
                });
            }
        }
    }

    let pagination = extracted
        .pagination
        .and_then(|p| serde_json::from_value::<Pagination>(p.clone()).ok());

    tracing::debug!(
        ?shape,
        count = items.len(),
        skipped = diagnostics.len(),
        "normalized list response"
    );

    Normalized {
        items,
        shape: Some(shape),
        pagination,
        diagnostics,
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
