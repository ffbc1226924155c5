use serde::{Deserialize, Serialize};

use crate::de;
use crate::products::Product;

/// Identity of a cart line: two additions with the same key merge into one
/// line instead of creating a duplicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CartKey {
    pub product_id: String,
    pub size: Option<String>,
    pub color: Option<String>,
}

impl CartKey {
    /// Builds a key, treating empty size/color strings as absent.
    #[must_use]
    pub fn new(product_id: impl Into<String>, size: Option<&str>, color: Option<&str>) -> Self {
        Self {
            product_id: product_id.into(),
            size: non_empty(size),
            color: non_empty(color),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|s| !s.is_empty()).map(str::to_owned)
}

/// One line of the cart.
///
/// The remote cart populates the product under `product` or `productId`;
/// both deserialize into [`CartItem::product`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(alias = "productId")]
    pub product: Product,
    #[serde(deserialize_with = "de::positive_quantity")]
    pub quantity: u32,
    #[serde(
        default,
        deserialize_with = "de::opt_non_empty_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub size: Option<String>,
    #[serde(
        default,
        deserialize_with = "de::opt_non_empty_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub color: Option<String>,
}

impl CartItem {
    #[must_use]
    pub fn key(&self) -> CartKey {
        CartKey {
            product_id: self.product.id.clone(),
            size: self.size.clone(),
            color: self.color.clone(),
        }
    }

    #[must_use]
    pub fn matches(&self, key: &CartKey) -> bool {
        self.product.id == key.product_id && self.size == key.size && self.color == key.color
    }

    #[must_use]
    pub fn line_total(&self) -> f64 {
        f64::from(self.quantity) * self.product.price
    }
}

/// In-memory cart: an ordered list of lines with unique [`CartKey`]s and
/// `quantity >= 1` on every line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a cart from lines loaded from a backing store.
    ///
    /// Lines sharing a key are merged (quantities summed) and zero-quantity
    /// lines are dropped, so a cart built this way always upholds the
    /// invariants.
    #[must_use]
    pub fn from_items(items: Vec<CartItem>) -> Self {
        let mut cart = Self::new();
        for item in items {
            let CartItem {
                product,
                quantity,
                size,
                color,
            } = item;
            cart.add(product, quantity, size.as_deref(), color.as_deref());
        }
        cart
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn into_items(self) -> Vec<CartItem> {
        self.items
    }

    #[must_use]
    pub fn get(&self, key: &CartKey) -> Option<&CartItem> {
        self.items.iter().find(|item| item.matches(key))
    }

    #[must_use]
    pub fn contains(&self, key: &CartKey) -> bool {
        self.get(key).is_some()
    }

    /// Adds `quantity` units of `product`, merging into an existing line with
    /// the same key. A zero quantity is a no-op.
    pub fn add(
        &mut self,
        product: Product,
        quantity: u32,
        size: Option<&str>,
        color: Option<&str>,
    ) {
        if quantity == 0 {
            return;
        }
        let key = CartKey::new(product.id.clone(), size, color);
        if let Some(existing) = self.items.iter_mut().find(|item| item.matches(&key)) {
            existing.quantity = existing.quantity.saturating_add(quantity);
            return;
        }
        self.items.push(CartItem {
            product,
            quantity,
            size: key.size,
            color: key.color,
        });
    }

    /// Removes the line with exactly this key. Returns `false` when no line
    /// matched.
    pub fn remove(&mut self, key: &CartKey) -> bool {
        let before = self.items.len();
        self.items.retain(|item| !item.matches(key));
        self.items.len() != before
    }

    /// Sets the quantity of the line with this key. A non-positive quantity
    /// removes the line. Returns `false` when no line matched.
    pub fn set_quantity(&mut self, key: &CartKey, quantity: i64) -> bool {
        let quantity = u32::try_from(quantity.max(0)).unwrap_or(u32::MAX);
        if quantity == 0 {
            return self.remove(key);
        }
        match self.items.iter_mut().find(|item| item.matches(key)) {
            Some(item) => {
                item.quantity = quantity;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    #[must_use]
    pub fn total_price(&self) -> f64 {
        self.items.iter().map(CartItem::line_total).sum()
    }
}
