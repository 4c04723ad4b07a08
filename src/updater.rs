//! Update dispatch.
//!
//! After a request has [authenticated][crate::auth], the [`Updater`] turns its request code into
//! a target address, routes the domain to its backend through
//! [`Config::domains`][crate::config::Config::domains], and then repeats the same update for
//! every alias listed in [`Config::aliases`][crate::config::Config::aliases], depth first and in
//! declared order.
//!
//! The first failing alias aborts the fan-out. Updates already applied are not rolled back, so a
//! failed request may still have changed the primary domain and earlier aliases.

use crate::backend::BackendRegistry;
use crate::config::Shared;
use crate::error::Error;
use crate::request::{RequestCode, UpdateRequest};
use std::future::Future;
use std::pin::Pin;

/// Address used for echo requests when the transport couldn't report the caller's address.
pub const UNKNOWN_CLIENT_ADDRESS: &str = "0.0.0.0";

#[derive(Clone)]
pub struct Updater {
    config: Shared,
    backends: BackendRegistry,
}

type ApplyFuture<'a> = Pin<Box<dyn Future<Output = Result<(), Error>> + Send + 'a>>;

impl Updater {
    pub fn new(config: Shared, backends: BackendRegistry) -> Self {
        Updater { config, backends }
    }

    /// Apply an authenticated request, returning the address that was applied. The address is
    /// empty for offline requests.
    pub async fn dispatch(&self, req: &UpdateRequest) -> Result<String, Error> {
        let address = match req.request_code()? {
            RequestCode::Register if req.address.is_empty() => return Err(Error::MissingAddress),
            RequestCode::Register => req.address.clone(),
            RequestCode::Offline => String::new(),
            RequestCode::EchoRegister => req
                .client_address
                .clone()
                .unwrap_or_else(|| UNKNOWN_CLIENT_ADDRESS.to_string()),
        };
        self.resolve_and_apply(&req.domain, &address).await?;
        Ok(address)
    }

    /// Update `domain` and, transitively, its aliases to `address`.
    pub async fn resolve_and_apply(&self, domain: &str, address: &str) -> Result<(), Error> {
        self.apply(domain, address, &mut Vec::new()).await
    }

    // `path` holds the chain of domains that led here, to catch alias cycles.
    fn apply<'a>(
        &'a self,
        domain: &'a str,
        address: &'a str,
        path: &'a mut Vec<String>,
    ) -> ApplyFuture<'a> {
        Box::pin(async move {
            if path.iter().any(|seen| seen == domain) {
                return Err(Error::CyclicAliasConfiguration(domain.to_string()));
            }

            let backend_name = self
                .config
                .domains
                .get(domain)
                .ok_or_else(|| Error::UnknownDomain(domain.to_string()))?;
            let backend = self
                .backends
                .get(backend_name)
                .ok_or_else(|| Error::UnknownBackend {
                    domain: domain.to_string(),
                    backend: backend_name.clone(),
                })?;

            backend.update(domain, address).await?;
            tracing::info!("updated \"{domain}\" to \"{address}\" via \"{backend_name}\"");

            if let Some(aliases) = self.config.aliases.get(domain) {
                path.push(domain.to_string());
                for alias in aliases {
                    self.apply(alias, address, path).await?;
                }
                path.pop();
            }
            Ok(())
        })
    }
}
