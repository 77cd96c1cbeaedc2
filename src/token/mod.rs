//! OAuth credential state and its refresh lifecycle.

pub mod lifecycle;
pub mod record;

pub use lifecycle::{TokenLifecycleManager, REFRESH_MARGIN_MS};
pub use record::{TokenError, TokenRecord};
