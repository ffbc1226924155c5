//! Catalog endpoints: products and categories.

use vitrine_core::{Category, Product};

use crate::error::ApiError;
use crate::normalize::{normalize_list, Normalized};
use crate::types::ProductQuery;

use super::ApiClient;

impl ApiClient {
    /// Fetches `GET /products` and normalizes whichever envelope the server
    /// used.
    ///
    /// # Errors
    ///
    /// Transport errors only; an unrecognized body is an empty list with a
    /// diagnostic, not an error.
    pub async fn fetch_products(
        &self,
        query: &ProductQuery,
    ) -> Result<Normalized<Product>, ApiError> {
        let body = self.get_json(&["products"], &query.to_query_pairs()).await?;
        Ok(normalize_list(&body, &["products"]))
    }

    /// Fetches `GET /categories`.
    ///
    /// # Errors
    ///
    /// Transport errors only, as for [`ApiClient::fetch_products`].
    pub async fn fetch_categories(&self) -> Result<Normalized<Category>, ApiError> {
        let body = self.get_json(&["categories"], &[]).await?;
        Ok(normalize_list(&body, &["categories"]))
    }
}
