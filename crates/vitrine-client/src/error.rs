use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Network-level failure: connection refused/reset, timeout, TLS.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by {url} (retry after {retry_after_secs:?}s)")]
    RateLimited {
        url: String,
        retry_after_secs: Option<u64>,
    },

    /// 401/404 from an `auth/` endpoint.
    #[error("not authenticated (HTTP {status} from {url})")]
    Unauthenticated { status: u16, url: String },

    #[error("{message} (HTTP {status} from {url})")]
    Status {
        status: u16,
        url: String,
        message: String,
    },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid API base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },
}

impl ApiError {
    /// Short message suitable for showing to a shopper.
    ///
    /// Server-provided messages are passed through; transport failures get a
    /// generic description.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { message, .. } => message.clone(),
            ApiError::Http(_) => "network error, please check your connection".to_owned(),
            ApiError::RateLimited { .. } => {
                "too many requests, please try again shortly".to_owned()
            }
            ApiError::Unauthenticated { .. } => "please sign in to continue".to_owned(),
            ApiError::Deserialize { .. } | ApiError::InvalidBaseUrl { .. } => {
                "API request failed".to_owned()
            }
        }
    }
}
