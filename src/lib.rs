//! DIP Crab
//!
//! A dynamic DNS update server for clients speaking the [GnuDIP] protocol.
//!
//! Clients fetch a short-lived signed salt, prove knowledge of the shared password against it,
//! and ask for their domain to be registered at an address, taken offline, or registered at the
//! address they were seen from. Record changes are carried out by a pluggable [DNS
//! backend][backend], such as [Cloudflare], and repeated for any configured aliases of the domain.
//!
//! The server keeps no session state: a salt is validated from its own signature.
//!
//! [GnuDIP]: http://gnudip2.sourceforge.net/
//! [Cloudflare]: https://developers.cloudflare.com/api/
//!
#![warn(clippy::pedantic)]

pub mod api;
pub mod auth;
pub mod backend;
pub mod challenge;
pub mod config;
pub mod digest;
pub mod error;
pub mod request;
pub mod updater;

pub use api::new as new_http;
pub use backend::{Backend, BackendRegistry};
pub use config::{Config, Shared};
pub use updater::Updater;
