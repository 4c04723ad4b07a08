//! DNS record backends.
//!
//! A [`Backend`] owns one address record per domain. Three implementations are provided:
//! [`cloudflare::CloudflareBackend`] drives the Cloudflare v4 REST API,
//! [`memory::InMemoryBackend`] keeps records in process memory, and [`file::FileBackend`]
//! persists the in-memory records to a JSON file on every update.
//!
//! Backends are declared by identifier in [`Config::backends`][crate::config::Config::backends]
//! and built once at startup into a [`BackendRegistry`].

use crate::config::{BackendConfig, Config};
use crate::error::Error;
use std::collections::HashMap;
use std::sync::Arc;

pub mod cloudflare;
pub mod file;
pub mod memory;

#[allow(clippy::module_name_repetitions)]
pub use cloudflare::CloudflareBackend;
#[allow(clippy::module_name_repetitions)]
pub use file::FileBackend;
#[allow(clippy::module_name_repetitions)]
pub use memory::InMemoryBackend;

/// `DynBackend` is a type alias for a [`Backend`] shared between concurrent requests.
#[allow(clippy::module_name_repetitions)]
pub type DynBackend = Arc<dyn Backend + Send + Sync>;

/// An async trait describing a store of one address record per domain.
#[async_trait::async_trait]
pub trait Backend {
    /// Point `domain` at `address`.
    ///
    /// An empty `address` removes the domain's record, and is a no-op if there is none. Otherwise
    /// the record is created if missing, rewritten if it holds a different address, and left
    /// alone if it already matches. Backends holding several records for a name manage only the
    /// first one they find.
    async fn update(&self, domain: &str, address: &str) -> Result<(), Error>;
}

/// Backends by identifier. Read-only once built.
#[derive(Default, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct BackendRegistry {
    backends: HashMap<String, DynBackend>,
}

impl BackendRegistry {
    /// Build every backend declared in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if an HTTP client can't be constructed, or the errors of
    /// [`FileBackend::try_from_file`] for file backends.
    pub async fn from_config(config: &Config) -> Result<Self, Error> {
        let mut registry = BackendRegistry::default();
        for (name, backend_config) in &config.backends {
            let backend: DynBackend = match backend_config {
                BackendConfig::Cloudflare {
                    api_token,
                    base_url,
                    ttl,
                } => Arc::new(CloudflareBackend::new(
                    api_token,
                    base_url.as_deref(),
                    *ttl,
                    config.backend_timeout,
                )?),
                BackendConfig::Memory => Arc::new(InMemoryBackend::default()),
                BackendConfig::File { path } => Arc::new(FileBackend::try_from_file(path).await?),
            };
            tracing::debug!("registered backend \"{name}\"");
            registry.register(name, backend);
        }
        Ok(registry)
    }

    pub fn register(&mut self, name: impl Into<String>, backend: DynBackend) {
        self.backends.insert(name.into(), backend);
    }

    pub fn get(&self, name: &str) -> Option<&DynBackend> {
        self.backends.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;

    #[tokio::test]
    async fn registry_builds_declared_backends() {
        let config = test_config();
        let registry = BackendRegistry::from_config(&config).await.unwrap();
        let backend = registry.get("mem").unwrap();
        backend.update("home.example.com", "192.0.2.1").await.unwrap();
        assert!(registry.get("cloudflare").is_none());
    }
}
