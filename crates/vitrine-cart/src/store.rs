//! Cart Reconciliation Store.
//!
//! Owns the in-memory cart and routes every mutation to the backing store of
//! the current [`AuthMode`]: local persistent storage while anonymous, the
//! remote cart endpoint while signed in. Remote mutations are followed by a
//! full re-fetch; local mutations are persisted before they become visible.
//!
//! Mutations and reloads run one at a time, in the order they were issued.
//! Lookups never wait for them and never touch the network.

use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use vitrine_client::{
    normalize_list, AddToCartRequest, ApiClient, CartLineVariant, UpdateCartItemRequest,
};
use vitrine_core::{AppConfig, Cart, CartItem, CartKey, Product};

use crate::error::CartError;
use crate::mode::{transition, AuthMode, MergePolicy, ReloadAction};
use crate::storage::{load_json, save_json, KeyValueStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartStoreOptions {
    /// Storage key holding the anonymous cart.
    pub storage_key: String,
    pub merge_policy: MergePolicy,
}

impl Default for CartStoreOptions {
    fn default() -> Self {
        Self {
            storage_key: "cart".to_owned(),
            merge_policy: MergePolicy::KeepSeparate,
        }
    }
}

impl CartStoreOptions {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            storage_key: config.cart_storage_key.clone(),
            merge_policy: MergePolicy::from_flag(config.cart_merge_on_login),
        }
    }
}

/// Snapshot of the store's mode and last operation outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartStatus {
    pub mode: AuthMode,
    /// `true` while a backend call is in flight.
    pub loading: bool,
    /// User-facing message of the last failed operation; cleared by the next
    /// successful one.
    pub error: Option<String>,
}

struct CartState {
    cart: Cart,
    mode: AuthMode,
    loading: bool,
    error: Option<String>,
}

pub struct CartStore {
    client: ApiClient,
    storage: Arc<dyn KeyValueStore>,
    options: CartStoreOptions,
    state: RwLock<CartState>,
    /// FIFO queue for mutations and reloads.
    ops: Mutex<()>,
}

impl CartStore {
    /// Creates an empty store in [`AuthMode::Unauthenticated`]. Call
    /// [`CartStore::initialize`] to load the stored cart and probe the
    /// session.
    #[must_use]
    pub fn new(
        client: ApiClient,
        storage: Arc<dyn KeyValueStore>,
        options: CartStoreOptions,
    ) -> Self {
        Self {
            client,
            storage,
            options,
            state: RwLock::new(CartState {
                cart: Cart::new(),
                mode: AuthMode::Unauthenticated,
                loading: false,
                error: None,
            }),
            ops: Mutex::new(()),
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, CartState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, CartState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    #[must_use]
    pub fn mode(&self) -> AuthMode {
        self.read_state().mode
    }

    #[must_use]
    pub fn status(&self) -> CartStatus {
        let state = self.read_state();
        CartStatus {
            mode: state.mode,
            loading: state.loading,
            error: state.error.clone(),
        }
    }

    /// Copy of the current cart.
    #[must_use]
    pub fn cart(&self) -> Cart {
        self.read_state().cart.clone()
    }

    #[must_use]
    pub fn is_in_cart(&self, product_id: &str, size: Option<&str>, color: Option<&str>) -> bool {
        self.read_state()
            .cart
            .contains(&CartKey::new(product_id, size, color))
    }

    #[must_use]
    pub fn get_cart_item(
        &self,
        product_id: &str,
        size: Option<&str>,
        color: Option<&str>,
    ) -> Option<CartItem> {
        self.read_state()
            .cart
            .get(&CartKey::new(product_id, size, color))
            .cloned()
    }

    // -----------------------------------------------------------------------
    // Mode
    // -----------------------------------------------------------------------

    /// Loads the anonymous cart, then probes the session and switches to the
    /// remote cart if the shopper is signed in.
    ///
    /// # Errors
    ///
    /// Returns [`CartError`] if the remote load fails, or if the local cart
    /// cannot be read and the shopper is not signed in. The failure is also
    /// recorded in [`CartStore::status`].
    pub async fn initialize(&self) -> Result<AuthMode, CartError> {
        let _queue = self.ops.lock().await;
        let local = if self.mode() == AuthMode::Unauthenticated {
            self.tracked("initialize", async { self.load_local() }).await
        } else {
            Ok(())
        };
        let mode = AuthMode::from_authenticated(self.client.is_authenticated().await);
        self.apply_mode(mode).await?;
        // An unreadable local cart only matters while it is the active one.
        if mode == AuthMode::Unauthenticated {
            local?;
        }
        Ok(mode)
    }

    /// Re-probes the session and applies the resulting mode.
    ///
    /// # Errors
    ///
    /// Returns [`CartError`] if the reload for a changed mode fails.
    pub async fn sync_auth(&self) -> Result<AuthMode, CartError> {
        let _queue = self.ops.lock().await;
        let mode = AuthMode::from_authenticated(self.client.is_authenticated().await);
        self.apply_mode(mode).await?;
        Ok(mode)
    }

    /// Switches to `mode` as reported by an external authentication check.
    ///
    /// # Errors
    ///
    /// Returns [`CartError`] if the reload for a changed mode fails.
    pub async fn set_auth_mode(&self, mode: AuthMode) -> Result<(), CartError> {
        let _queue = self.ops.lock().await;
        self.apply_mode(mode).await
    }

    /// Explicit sign-out: back to the cart stored on this device.
    ///
    /// # Errors
    ///
    /// Returns [`CartError`] if the local cart cannot be read.
    pub async fn logout(&self) -> Result<(), CartError> {
        self.set_auth_mode(AuthMode::Unauthenticated).await
    }

    async fn apply_mode(&self, new: AuthMode) -> Result<(), CartError> {
        let old = self.mode();
        let action = transition(old, new, self.options.merge_policy);
        if action == ReloadAction::None {
            return Ok(());
        }
        tracing::info!(from = %old, to = %new, ?action, "cart mode changed");
        {
            // The previous store's lines never carry over into the new mode.
            let mut state = self.write_state();
            state.mode = new;
            state.cart = Cart::new();
        }

        self.tracked("mode_change", async {
            match action {
                ReloadAction::None => Ok(()),
                ReloadAction::LoadLocal => self.load_local(),
                ReloadAction::LoadRemote => self.load_remote().await,
                ReloadAction::MergeLocalThenLoadRemote => {
                    let merged = self.merge_local_into_remote().await;
                    let loaded = self.load_remote().await;
                    merged.and(loaded)
                }
            }
        })
        .await
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Reloads the cart from the active backing store.
    ///
    /// # Errors
    ///
    /// Returns [`CartError`] if the backing store cannot be read.
    pub async fn reload(&self) -> Result<(), CartError> {
        let _queue = self.ops.lock().await;
        self.tracked("reload", async {
            match self.mode() {
                AuthMode::Unauthenticated => self.load_local(),
                AuthMode::Authenticated => self.load_remote().await,
            }
        })
        .await
    }

    /// Adds `quantity` units, merging into the line with the same key. A
    /// zero quantity does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`CartError`] if the backing store rejects the change; the
    /// cart keeps its previous contents.
    pub async fn add_item(
        &self,
        product: &Product,
        quantity: u32,
        size: Option<&str>,
        color: Option<&str>,
    ) -> Result<(), CartError> {
        if quantity == 0 {
            return Ok(());
        }
        let key = CartKey::new(product.id.as_str(), size, color);
        let _queue = self.ops.lock().await;

        self.tracked("add_item", async {
            match self.mode() {
                AuthMode::Unauthenticated => self.commit_local(|cart| {
                    cart.add(
                        product.clone(),
                        quantity,
                        key.size.as_deref(),
                        key.color.as_deref(),
                    );
                }),
                AuthMode::Authenticated => {
                    let request = AddToCartRequest {
                        product_id: key.product_id.clone(),
                        quantity,
                        size: key.size.clone(),
                        color: key.color.clone(),
                    };
                    self.client.add_to_cart(&request).await?;
                    self.load_remote().await
                }
            }
        })
        .await
    }

    /// Removes the line with exactly this key. A key that matches no line is
    /// a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`CartError`] if the backing store rejects the change.
    pub async fn remove_item(
        &self,
        product_id: &str,
        size: Option<&str>,
        color: Option<&str>,
    ) -> Result<(), CartError> {
        let key = CartKey::new(product_id, size, color);
        let _queue = self.ops.lock().await;
        self.remove_queued(&key).await
    }

    /// Sets the quantity of the line with this key. Zero or negative removes
    /// the line; a key that matches no line is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`CartError`] if the backing store rejects the change.
    pub async fn update_quantity(
        &self,
        product_id: &str,
        quantity: i64,
        size: Option<&str>,
        color: Option<&str>,
    ) -> Result<(), CartError> {
        let key = CartKey::new(product_id, size, color);
        let _queue = self.ops.lock().await;
        if quantity <= 0 {
            return self.remove_queued(&key).await;
        }
        if !self.read_state().cart.contains(&key) {
            tracing::debug!(product_id, "quantity update for absent cart line ignored");
            return Ok(());
        }

        self.tracked("update_quantity", async {
            match self.mode() {
                AuthMode::Unauthenticated => self.commit_local(|cart| {
                    cart.set_quantity(&key, quantity);
                }),
                AuthMode::Authenticated => {
                    let request = UpdateCartItemRequest {
                        quantity: u32::try_from(quantity).unwrap_or(u32::MAX),
                        size: key.size.clone(),
                        color: key.color.clone(),
                    };
                    self.client
                        .update_cart_item(&key.product_id, &request)
                        .await?;
                    self.load_remote().await
                }
            }
        })
        .await
    }

    /// Empties the cart in the active backing store.
    ///
    /// # Errors
    ///
    /// Returns [`CartError`] if the backing store rejects the change.
    pub async fn clear_cart(&self) -> Result<(), CartError> {
        let _queue = self.ops.lock().await;
        self.tracked("clear_cart", async {
            match self.mode() {
                AuthMode::Unauthenticated => self.commit_local(Cart::clear),
                AuthMode::Authenticated => {
                    self.client.clear_cart().await?;
                    self.load_remote().await
                }
            }
        })
        .await
    }

    async fn remove_queued(&self, key: &CartKey) -> Result<(), CartError> {
        if !self.read_state().cart.contains(key) {
            tracing::debug!(product_id = %key.product_id, "remove for absent cart line ignored");
            return Ok(());
        }
        self.tracked("remove_item", async {
            match self.mode() {
                AuthMode::Unauthenticated => self.commit_local(|cart| {
                    cart.remove(key);
                }),
                AuthMode::Authenticated => {
                    self.client
                        .remove_cart_item(&key.product_id, &variant_of(key))
                        .await?;
                    self.load_remote().await
                }
            }
        })
        .await
    }

    // -----------------------------------------------------------------------
    // Backends
    // -----------------------------------------------------------------------

    /// Runs one backend operation, maintaining the loading flag and the
    /// recorded error.
    async fn tracked<T, F>(&self, operation: &'static str, fut: F) -> Result<T, CartError>
    where
        F: Future<Output = Result<T, CartError>>,
    {
        self.write_state().loading = true;
        let result = fut.await;

        let mut state = self.write_state();
        state.loading = false;
        match &result {
            Ok(_) => state.error = None,
            Err(e) => {
                tracing::warn!(operation, mode = %state.mode, error = %e, "cart operation failed");
                state.error = Some(e.user_message());
            }
        }
        drop(state);
        result
    }

    /// Applies `mutate` to a copy of the cart, persists the copy, and only
    /// then publishes it.
    fn commit_local<F>(&self, mutate: F) -> Result<(), CartError>
    where
        F: FnOnce(&mut Cart),
    {
        let mut next = self.cart();
        mutate(&mut next);
        save_json(self.storage.as_ref(), &self.options.storage_key, next.items())?;
        self.write_state().cart = next;
        Ok(())
    }

    fn read_local_cart(&self) -> Result<Cart, CartError> {
        let Some(body) = load_json::<Value>(self.storage.as_ref(), &self.options.storage_key)?
        else {
            return Ok(Cart::new());
        };
        let normalized = normalize_list::<CartItem>(&body, &["cart"]);
        if !normalized.is_clean() {
            tracing::warn!(
                skipped = normalized.diagnostics.len(),
                "stored cart was partially unreadable"
            );
        }
        Ok(Cart::from_items(normalized.items))
    }

    fn load_local(&self) -> Result<(), CartError> {
        let cart = self.read_local_cart()?;
        tracing::debug!(lines = cart.item_count(), "loaded local cart");
        self.write_state().cart = cart;
        Ok(())
    }

    async fn load_remote(&self) -> Result<(), CartError> {
        let fetched = self.client.fetch_cart().await?;
        let cart = Cart::from_items(fetched.items);
        tracing::debug!(lines = cart.item_count(), "loaded remote cart");
        self.write_state().cart = cart;
        Ok(())
    }

    /// Posts every local line to the remote cart in order. On failure the
    /// lines not yet accepted are written back to local storage.
    async fn merge_local_into_remote(&self) -> Result<(), CartError> {
        let local = self.read_local_cart()?;
        if local.is_empty() {
            return Ok(());
        }
        let total = local.item_count();

        let mut pending = local.into_items().into_iter();
        while let Some(item) = pending.next() {
            let request = AddToCartRequest {
                product_id: item.product.id.clone(),
                quantity: item.quantity,
                size: item.size.clone(),
                color: item.color.clone(),
            };
            if let Err(e) = self.client.add_to_cart(&request).await {
                let remaining: Vec<CartItem> = std::iter::once(item).chain(pending).collect();
                tracing::warn!(
                    merged = total - remaining.len(),
                    remaining = remaining.len(),
                    "merge into remote cart stopped early"
                );
                save_json(self.storage.as_ref(), &self.options.storage_key, &remaining)?;
                return Err(e.into());
            }
        }

        self.storage.remove(&self.options.storage_key)?;
        tracing::info!(lines = total, "merged local cart into remote cart");
        Ok(())
    }
}

fn variant_of(key: &CartKey) -> CartLineVariant {
    CartLineVariant {
        size: key.size.clone(),
        color: key.color.clone(),
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
