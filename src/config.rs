use crate::error::Error;
use ipnetwork::IpNetwork;
use serde::Deserialize;
use serde_with::{serde_as, DurationSeconds};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub type Shared = Arc<Config>;

#[serde_as]
#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(default = "default_api_timeout")]
    pub api_timeout: Duration,
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(default = "default_backend_timeout")]
    pub backend_timeout: Duration,
    pub server_key: String,
    pub username: String,
    pub password: String,
    pub domains: HashMap<String, String>,
    #[serde(default)]
    pub aliases: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub backends: HashMap<String, BackendConfig>,
    #[serde(default)]
    pub trusted_proxies: Vec<IpNetwork>,
}

/// The backend implementations a domain can be routed to, tagged by `type`.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendConfig {
    Cloudflare {
        api_token: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default = "default_record_ttl")]
        ttl: u32,
    },
    Memory,
    File {
        path: String,
    },
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3495))
}

fn default_api_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_backend_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_record_ttl() -> u32 {
    60
}

impl Config {
    pub fn try_from_file(p: impl AsRef<Path>) -> Result<Self, Error> {
        let f = File::open(p)?;
        let reader = BufReader::new(f);
        let conf: Config = serde_json::from_reader(reader)?;
        conf.validate()?;
        conf.warn_inconsistencies();
        Ok(conf)
    }

    pub fn validate(&self) -> Result<(), Error> {
        for (name, value) in [
            ("server_key", &self.server_key),
            ("username", &self.username),
            ("password", &self.password),
        ] {
            if value.is_empty() {
                return Err(Error::InvalidConfig(format!("{name} not set")));
            }
        }
        if self.domains.is_empty() {
            return Err(Error::InvalidConfig("no domains configured".to_string()));
        }
        Ok(())
    }

    /// Whether forwarded-address headers from `peer` should be believed.
    pub fn is_trusted_proxy(&self, peer: IpAddr) -> bool {
        self.trusted_proxies
            .iter()
            .any(|network| network.contains(peer))
    }

    // These are reported at runtime as well, so they only warrant a warning here.
    fn warn_inconsistencies(&self) {
        for (domain, backend) in &self.domains {
            if !self.backends.contains_key(backend) {
                tracing::warn!("domain \"{domain}\" uses undeclared backend \"{backend}\"");
            }
        }
        for (domain, aliases) in &self.aliases {
            for alias in aliases {
                if !self.domains.contains_key(alias) {
                    tracing::warn!("alias \"{alias}\" of \"{domain}\" is not a configured domain");
                }
            }
        }
    }
}
