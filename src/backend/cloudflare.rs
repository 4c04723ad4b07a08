//! A [Cloudflare v4 API][cf-api] implementation of the [`Backend`][super::Backend] trait.
//!
//! The zone for a domain is taken to be its last two labels, e.g. `home.example.com` is managed
//! in the `example.com` zone. The first `A` or `AAAA` record named after the domain is the one
//! the backend owns; any other records under the same name are left untouched.
//!
//! [cf-api]: https://developers.cloudflare.com/api/

use crate::backend::Backend;
use crate::error::Error;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::net::IpAddr;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.cloudflare.com/client/v4";

#[derive(Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct CloudflareBackend {
    http: Client,
    api_token: String,
    base_url: String,
    ttl: u32,
}

#[derive(Deserialize, Debug)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
}

#[derive(Deserialize, Debug)]
struct ApiMessage {
    code: i64,
    message: String,
}

#[derive(Deserialize, Debug)]
struct Zone {
    id: String,
}

#[derive(Deserialize, Debug)]
struct DnsRecord {
    id: String,
    #[serde(rename = "type")]
    record_type: String,
    content: String,
}

impl CloudflareBackend {
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the HTTP client can't be built.
    pub fn new(
        api_token: &str,
        base_url: Option<&str>,
        ttl: u32,
        timeout: Duration,
    ) -> Result<Self, Error> {
        Ok(CloudflareBackend {
            http: Client::builder().timeout(timeout).build()?,
            api_token: api_token.to_string(),
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            ttl,
        })
    }

    async fn zone_id(&self, domain: &str) -> Result<String, Error> {
        let zone_name = zone_name(domain);
        let zones: Vec<Zone> = self
            .call(
                self.http
                    .get(format!("{}/zones", self.base_url))
                    .query(&[("name", zone_name)]),
            )
            .await?;
        zones
            .into_iter()
            .next()
            .map(|zone| zone.id)
            .ok_or_else(|| Error::ZoneNotFound(zone_name.to_string()))
    }

    async fn owned_record(&self, zone_id: &str, domain: &str) -> Result<Option<DnsRecord>, Error> {
        let records: Vec<DnsRecord> = self
            .call(
                self.http
                    .get(format!("{}/zones/{zone_id}/dns_records", self.base_url))
                    .query(&[("name", domain)]),
            )
            .await?;
        Ok(records
            .into_iter()
            .find(|r| r.record_type == "A" || r.record_type == "AAAA"))
    }

    async fn call<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, Error> {
        let envelope: Envelope<T> = request
            .bearer_auth(&self.api_token)
            .send()
            .await?
            .json()
            .await?;
        if !envelope.success {
            let messages: Vec<String> = envelope
                .errors
                .iter()
                .map(|e| format!("{} ({})", e.message, e.code))
                .collect();
            return Err(Error::Cloudflare(messages.join("; ")));
        }
        envelope
            .result
            .ok_or_else(|| Error::Cloudflare("response carried no result".to_string()))
    }
}

#[async_trait::async_trait]
impl Backend for CloudflareBackend {
    async fn update(&self, domain: &str, address: &str) -> Result<(), Error> {
        let zone_id = self.zone_id(domain).await?;
        let existing = self.owned_record(&zone_id, domain).await?;
        let records_url = format!("{}/zones/{zone_id}/dns_records", self.base_url);

        match (existing, address.is_empty()) {
            (None, true) => Ok(()),
            (Some(record), true) => {
                tracing::debug!("deleting {} record {} for {domain}", record.record_type, record.id);
                self.call::<serde_json::Value>(
                    self.http.delete(format!("{records_url}/{}", record.id)),
                )
                .await?;
                Ok(())
            }
            (None, false) => {
                tracing::debug!("creating {} record for {domain}", record_type(address));
                self.call::<serde_json::Value>(self.http.post(records_url).json(&json!({
                    "type": record_type(address),
                    "name": domain,
                    "content": address,
                    "ttl": self.ttl,
                    "proxied": false,
                })))
                .await?;
                Ok(())
            }
            (Some(record), false) if record.content == address => Ok(()),
            (Some(record), false) => {
                tracing::debug!("updating record {} for {domain}", record.id);
                self.call::<serde_json::Value>(
                    self.http
                        .patch(format!("{records_url}/{}", record.id))
                        .json(&json!({
                            "type": record_type(address),
                            "content": address,
                        })),
                )
                .await?;
                Ok(())
            }
        }
    }
}

fn zone_name(domain: &str) -> &str {
    let mut dots = domain.rmatch_indices('.');
    match (dots.next(), dots.next()) {
        (Some(_), Some((second_last, _))) => &domain[second_last + 1..],
        _ => domain,
    }
}

// Addresses that don't parse are sent as A records and left for the API to reject.
fn record_type(address: &str) -> &'static str {
    match address.parse::<IpAddr>() {
        Ok(IpAddr::V6(_)) => "AAAA",
        _ => "A",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ok(result: Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "errors": [],
            "messages": [],
            "result": result,
        }))
    }

    async fn server_with_zone() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/zones"))
            .and(query_param("name", "example.com"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ok(json!([{ "id": "zone1", "name": "example.com" }])))
            .mount(&server)
            .await;
        server
    }

    async fn with_records(server: &MockServer, records: Value) {
        Mock::given(method("GET"))
            .and(path("/zones/zone1/dns_records"))
            .and(query_param("name", "home.example.com"))
            .respond_with(ok(records))
            .mount(server)
            .await;
    }

    fn backend(server: &MockServer) -> CloudflareBackend {
        CloudflareBackend::new(
            "test-token",
            Some(server.uri().as_str()),
            60,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn zone_is_last_two_labels() {
        assert_eq!(zone_name("home.example.com"), "example.com");
        assert_eq!(zone_name("a.b.example.co"), "example.co");
        assert_eq!(zone_name("example.com"), "example.com");
        assert_eq!(zone_name("localhost"), "localhost");
    }

    #[test]
    fn record_type_follows_address_family() {
        assert_eq!(record_type("192.0.2.1"), "A");
        assert_eq!(record_type("2001:db8::1"), "AAAA");
        assert_eq!(record_type("not-an-ip"), "A");
    }

    #[tokio::test]
    async fn creates_missing_record() {
        let server = server_with_zone().await;
        with_records(&server, json!([])).await;
        Mock::given(method("POST"))
            .and(path("/zones/zone1/dns_records"))
            .and(body_json(json!({
                "type": "A",
                "name": "home.example.com",
                "content": "192.0.2.1",
                "ttl": 60,
                "proxied": false,
            })))
            .respond_with(ok(json!({ "id": "rec1" })))
            .expect(1)
            .mount(&server)
            .await;

        backend(&server)
            .update("home.example.com", "192.0.2.1")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn patches_changed_record() {
        let server = server_with_zone().await;
        with_records(
            &server,
            json!([
                { "id": "txt1", "type": "TXT", "content": "hello" },
                { "id": "rec1", "type": "A", "content": "192.0.2.1" },
                { "id": "rec2", "type": "A", "content": "192.0.2.9" },
            ]),
        )
        .await;
        Mock::given(method("PATCH"))
            .and(path("/zones/zone1/dns_records/rec1"))
            .and(body_json(json!({ "type": "A", "content": "192.0.2.2" })))
            .respond_with(ok(json!({ "id": "rec1" })))
            .expect(1)
            .mount(&server)
            .await;

        backend(&server)
            .update("home.example.com", "192.0.2.2")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn matching_record_is_left_alone() {
        let server = server_with_zone().await;
        with_records(
            &server,
            json!([{ "id": "rec1", "type": "A", "content": "192.0.2.1" }]),
        )
        .await;
        Mock::given(method("PATCH"))
            .respond_with(ok(json!({})))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ok(json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let backend = backend(&server);
        backend.update("home.example.com", "192.0.2.1").await.unwrap();
        backend.update("home.example.com", "192.0.2.1").await.unwrap();
    }

    #[tokio::test]
    async fn empty_address_deletes_record() {
        let server = server_with_zone().await;
        with_records(
            &server,
            json!([{ "id": "rec1", "type": "A", "content": "192.0.2.1" }]),
        )
        .await;
        Mock::given(method("DELETE"))
            .and(path("/zones/zone1/dns_records/rec1"))
            .respond_with(ok(json!({ "id": "rec1" })))
            .expect(1)
            .mount(&server)
            .await;

        backend(&server).update("home.example.com", "").await.unwrap();
    }

    #[tokio::test]
    async fn empty_address_without_record_is_a_no_op() {
        let server = server_with_zone().await;
        with_records(&server, json!([])).await;
        Mock::given(method("DELETE"))
            .respond_with(ok(json!({})))
            .expect(0)
            .mount(&server)
            .await;

        backend(&server).update("home.example.com", "").await.unwrap();
    }

    #[tokio::test]
    async fn unknown_zone_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/zones"))
            .respond_with(ok(json!([])))
            .mount(&server)
            .await;

        let err = backend(&server)
            .update("home.example.com", "192.0.2.1")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ZoneNotFound(zone) if zone == "example.com"));
    }

    #[tokio::test]
    async fn api_failure_carries_messages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/zones"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "success": false,
                "errors": [{ "code": 9109, "message": "Invalid access token" }],
                "messages": [],
                "result": null,
            })))
            .mount(&server)
            .await;

        let err = backend(&server)
            .update("home.example.com", "192.0.2.1")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Cloudflare(msg) if msg == "Invalid access token (9109)"));
    }
}
