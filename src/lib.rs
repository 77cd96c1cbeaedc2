pub mod api;
pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod providers;
pub mod session;
pub mod store;
pub mod token;

pub use config::Config;
pub use error::AuthError;

use std::sync::Arc;

use auth::SignInGate;
use crypto::CryptoEngine;
use providers::ProviderRegistry;
use store::SessionStore;
use token::TokenLifecycleManager;

/// Shared application state passed to all API handlers.
///
/// Built once at startup and never mutated afterwards.
pub struct AppState {
    pub config: Config,
    pub crypto: CryptoEngine,
    pub registry: ProviderRegistry,
    pub lifecycle: TokenLifecycleManager,
    pub sessions: SessionStore,
    pub gate: SignInGate,
}

impl AppState {
    pub fn new(config: Config, registry: ProviderRegistry) -> Result<Self, AuthError> {
        let crypto = CryptoEngine::new(&config.master_key, &config.hmac_secret)?;
        let lifecycle = TokenLifecycleManager::from_registry(&registry);
        let sessions = SessionStore::from_config(&config);

        Ok(Self {
            config,
            crypto,
            registry,
            lifecycle,
            sessions,
            gate: SignInGate::google_only(),
        })
    }
}

pub type SharedState = Arc<AppState>;
