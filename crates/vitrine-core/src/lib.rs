pub mod app_config;
pub mod cart;
pub mod config;
pub mod de;
pub mod products;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use cart::{Cart, CartItem, CartKey};
pub use config::{load_app_config, load_app_config_from_env};
pub use products::{resolve_category_ref, Category, CategoryRef, Product};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
