mod google;
mod registry;
mod traits;

pub use google::GoogleProvider;
pub use registry::ProviderRegistry;
pub use traits::{OAuthProvider, ProviderKind, RefreshCapability, TokenSet, UserProfile};

use crate::config::Config;

/// Register every provider that has credentials configured.
pub fn register_defaults(registry: &mut ProviderRegistry, config: &Config) {
    if let (Some(id), Some(secret)) = (&config.google_client_id, &config.google_client_secret) {
        registry.register(Box::new(
            GoogleProvider::new(id.clone(), secret.clone())
                .with_token_url(config.google_token_url.clone()),
        ));
    }
}
