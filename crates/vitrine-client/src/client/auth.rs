//! Session probe.

use serde_json::Value;

use crate::error::ApiError;

use super::ApiClient;

impl ApiClient {
    /// Fetches `GET /auth/profile`.
    ///
    /// # Errors
    ///
    /// [`ApiError::Unauthenticated`] on 401/404, otherwise any transport error.
    pub async fn fetch_profile(&self) -> Result<Value, ApiError> {
        self.get_json(&["auth", "profile"], &[]).await
    }

    /// Probes the session. Every failure, whatever its cause, reads as
    /// "not signed in"; nothing is propagated to the caller.
    pub async fn is_authenticated(&self) -> bool {
        match self.fetch_profile().await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(error = %e, "auth probe failed, treating session as anonymous");
                false
            }
        }
    }
}
