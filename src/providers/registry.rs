use std::collections::HashMap;

use super::traits::{OAuthProvider, ProviderKind, RefreshCapability};

/// Registry of configured OAuth providers, keyed by provider kind.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderKind, Box<dyn OAuthProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider, replacing any previous one of the same kind.
    pub fn register(&mut self, provider: Box<dyn OAuthProvider>) {
        self.providers.insert(provider.kind(), provider);
    }

    /// Get a provider by kind.
    pub fn get(&self, kind: ProviderKind) -> Option<&dyn OAuthProvider> {
        self.providers.get(&kind).map(|p| p.as_ref())
    }

    /// Look up a provider by its path name (e.g. "google").
    pub fn find(&self, name: &str) -> Option<&dyn OAuthProvider> {
        name.parse().ok().and_then(|kind| self.get(kind))
    }

    /// List registered providers, sorted by id.
    pub fn list(&self) -> Vec<&dyn OAuthProvider> {
        let mut providers: Vec<&dyn OAuthProvider> =
            self.providers.values().map(|p| p.as_ref()).collect();
        providers.sort_by_key(|p| p.kind().as_str());
        providers
    }

    /// Refresh capability of every registered provider.
    pub fn capabilities(&self) -> HashMap<ProviderKind, RefreshCapability> {
        self.providers
            .iter()
            .map(|(kind, p)| (*kind, p.refresh_capability()))
            .collect()
    }

    pub fn count(&self) -> usize {
        self.providers.len()
    }
}
