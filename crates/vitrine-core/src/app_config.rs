use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// Root of the storefront REST API, e.g. `"http://localhost:5000/api"`.
    pub api_base_url: String,
    pub http_timeout_secs: u64,
    pub http_user_agent: String,
    pub http_max_retries: u32,
    pub http_backoff_base_secs: u64,
    /// Bearer credential attached to every API request, if any.
    pub session_token: Option<String>,
    /// Directory backing the local key-value store used by anonymous carts.
    pub storage_dir: PathBuf,
    pub cart_storage_key: String,
    pub favorites_storage_key: String,
    /// Push the anonymous cart into the remote cart on login instead of
    /// leaving it behind in local storage.
    pub cart_merge_on_login: bool,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("api_base_url", &self.api_base_url)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("http_user_agent", &self.http_user_agent)
            .field("http_max_retries", &self.http_max_retries)
            .field("http_backoff_base_secs", &self.http_backoff_base_secs)
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "[redacted]"),
            )
            .field("storage_dir", &self.storage_dir)
            .field("cart_storage_key", &self.cart_storage_key)
            .field("favorites_storage_key", &self.favorites_storage_key)
            .field("cart_merge_on_login", &self.cart_merge_on_login)
            .finish()
    }
}
