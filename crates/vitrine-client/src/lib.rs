pub mod client;
pub mod error;
pub mod normalize;
mod rate_limit;
pub mod types;

pub use client::{ApiClient, TransportOptions};
pub use error::ApiError;
pub use normalize::{normalize_list, Diagnostic, Normalized, Pagination, WireShape};
pub use types::{AddToCartRequest, CartLineVariant, ProductQuery, SortOrder, UpdateCartItemRequest};
