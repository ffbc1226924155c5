//! Remote cart endpoints, used while the shopper is signed in.

use reqwest::Method;
use vitrine_core::CartItem;

use crate::error::ApiError;
use crate::normalize::{normalize_list, Normalized};
use crate::types::{AddToCartRequest, CartLineVariant, UpdateCartItemRequest};

use super::ApiClient;

impl ApiClient {
    /// Fetches `GET /cart`.
    ///
    /// # Errors
    ///
    /// Transport errors only; lines the normalizer cannot read are reported
    /// as diagnostics.
    pub async fn fetch_cart(&self) -> Result<Normalized<CartItem>, ApiError> {
        let body = self.get_json(&["cart"], &[]).await?;
        Ok(normalize_list(&body, &["cart", "cartItems"]))
    }

    /// `POST /cart/add`.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from the transport.
    pub async fn add_to_cart(&self, request: &AddToCartRequest) -> Result<(), ApiError> {
        self.send_json(Method::POST, &["cart", "add"], &[], Some(request))
            .await
            .map(drop)
    }

    /// `PUT /cart/{product_id}` with an absolute quantity.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from the transport.
    pub async fn update_cart_item(
        &self,
        product_id: &str,
        request: &UpdateCartItemRequest,
    ) -> Result<(), ApiError> {
        self.send_json(Method::PUT, &["cart", product_id], &[], Some(request))
            .await
            .map(drop)
    }

    /// `DELETE /cart/{product_id}` with the variant selector in the body.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from the transport.
    pub async fn remove_cart_item(
        &self,
        product_id: &str,
        variant: &CartLineVariant,
    ) -> Result<(), ApiError> {
        self.send_json(Method::DELETE, &["cart", product_id], &[], Some(variant))
            .await
            .map(drop)
    }

    /// `DELETE /cart`.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from the transport.
    pub async fn clear_cart(&self) -> Result<(), ApiError> {
        self.send_json::<()>(Method::DELETE, &["cart"], &[], None)
            .await
            .map(drop)
    }
}
