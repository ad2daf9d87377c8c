//! # Provider Registry
//!
//! Ordered list of storage providers. Registration order is the priority
//! order: when more than one provider claims a strategy, the earliest wins.

use super::BlobStorageProvider;
use std::fmt;
use std::sync::Arc;

/// Ordered provider list, built once at start-up
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn BlobStorageProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a provider at the lowest priority
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn BlobStorageProvider>) -> Self {
        self.register(provider);
        self
    }

    /// Append a provider at the lowest priority
    pub fn register(&mut self, provider: Arc<dyn BlobStorageProvider>) {
        self.providers.push(provider);
    }

    /// First provider, in registration order, that supports `strategy`
    pub fn select(&self, strategy: &str) -> Option<&Arc<dyn BlobStorageProvider>> {
        self.providers
            .iter()
            .find(|provider| provider.supports_strategy(strategy))
    }

    /// Provider names in priority order
    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}
