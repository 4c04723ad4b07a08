//! HTTP API speaking the GnuDIP update protocol.
//!
//! # API Endpoints
//!
//! ## `/healthcheck` (GET)
//!
//!   Returns HTTP 200 (OK) and the JSON body `{"ok":"healthy"}` when the service is operational.
//!
//! ## `/gnudip/cgi-bin/gdipupdt.cgi` (GET)
//!
//!   Without query parameters, issues a [salt challenge][crate::challenge] as an HTML page with
//!   `salt`, `sign` and `time` meta tags:
//!
//!   ```html
//!   <meta name="salt" content="0fX2kd8QpL">
//!   <meta name="sign" content="6d8f0bb1c6f1f5c1bd0b5c43a43f0a1e">
//!   <meta name="time" content="1700000000">
//!   ```
//!
//!   With query parameters, performs an [update request][crate::request]. The client echoes the
//!   three challenge values back within ten seconds, together with
//!   `pass = md5(md5(password) + "." + salt)`:
//!
//!   ```bash
//!   ❯ curl 'http://localhost:3495/gnudip/cgi-bin/gdipupdt.cgi?salt=0fX2kd8QpL&time=1700000000&sign=6d8f0bb1c6f1f5c1bd0b5c43a43f0a1e&user=gnudip&pass=...&domn=home.example.com&addr=203.0.113.7&reqc=0'
//!   ```
//!
//!   Requests missing a parameter, or with a non-numeric `time`, get HTTP 400 (Bad Request) and
//!   the error as a plain text body. Every other outcome is an HTTP 200 page whose `retc` meta tag
//!   is `0` on success and `1` on failure. Echo requests (`reqc=2`) also get the registered
//!   address back in an `addr` meta tag.
//!
//!   The address used for echo requests is the TCP peer address. When the peer is within a
//!   [`Config::trusted_proxies`][crate::config::Config::trusted_proxies] network the first
//!   address from its `True-Client-IP`, `X-Real-IP` or `X-Forwarded-For` header is used instead.

mod api_error;
mod model;
mod routes;
pub mod server;

pub use server::new;
