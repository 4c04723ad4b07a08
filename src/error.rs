//! Error types.

use std::num::ParseIntError;

/// Error enumerates the possible DIP Crab error states.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Returned when an [update request][crate::request::UpdateRequest] is missing one of the
    /// required wire parameters, or supplies it with an empty value.
    #[error("`{0}` is missing")]
    MissingField(&'static str),

    /// Returned when the `time` wire parameter is not a base-10 integer.
    #[error("`time` is not a valid timestamp: {0}")]
    InvalidTimeFormat(#[source] ParseIntError),

    /// Returned when a challenge is presented more than
    /// [`CHALLENGE_TTL_SECS`][crate::auth::CHALLENGE_TTL_SECS] after it was issued.
    #[error("salt value too old")]
    ExpiredChallenge,

    /// Returned when the `salt`/`time` pair presented by the client does not match the `sign`
    /// value under the server key.
    #[error("invalid signature")]
    InvalidSignature,

    /// Returned when the password proof does not match the configured password for the
    /// presented salt.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Returned when `reqc` is not one of `0`, `1` or `2`.
    #[error("invalid client request code \"{0}\"")]
    InvalidRequestCode(String),

    /// Returned when a register request carries no address.
    #[error("no address to register")]
    MissingAddress,

    /// Returned when the requested domain is not present in the
    /// [`Config::domains`][crate::config::Config::domains] table.
    #[error("invalid domain \"{0}\"")]
    UnknownDomain(String),

    /// Returned when a domain maps to a backend identifier that has no registered
    /// [`Backend`][crate::backend::Backend]. This is a configuration defect.
    #[error("no backend available for domain \"{domain}\"")]
    UnknownBackend { domain: String, backend: String },

    /// Returned when following [`Config::aliases`][crate::config::Config::aliases] leads back to
    /// a domain already on the current alias path.
    #[error("alias configuration for \"{0}\" is cyclic")]
    CyclicAliasConfiguration(String),

    /// Returned when a Cloudflare API call reports `success: false`.
    #[error("cloudflare API error: {0}")]
    Cloudflare(String),

    /// Returned when no Cloudflare zone matches the zone derived from a domain.
    #[error("no cloudflare zone found for \"{0}\"")]
    ZoneNotFound(String),

    /// Returned when an HTTP backend request fails in transit.
    #[error("backend request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Returned when the loaded [`Config`][crate::config::Config] is unusable.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Returned when a generic IO error occurs.
    #[error("an IO error occurred")]
    IO(#[from] std::io::Error),

    /// Returned when processing JSON from disk (e.g. to
    /// [trying to load a `Config`][crate::config::Config::try_from_file], or to
    /// [trying to load a `FileBackend`][crate::backend::file::FileBackend::try_from_file]) fails
    /// due to invalid JSON content.
    #[error("invalid JSON")]
    InvalidJSON(#[from] serde_json::Error),
}

impl Error {
    /// True for request decoding failures, which are answered before authentication runs.
    pub fn is_decode(&self) -> bool {
        matches!(self, Error::MissingField(_) | Error::InvalidTimeFormat(_))
    }

    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            Error::ExpiredChallenge | Error::InvalidSignature | Error::InvalidCredentials
        )
    }

    /// True for failures caused by the server's own configuration rather than by the client.
    pub fn is_configuration_defect(&self) -> bool {
        matches!(
            self,
            Error::UnknownBackend { .. } | Error::CyclicAliasConfiguration(_)
        )
    }

    /// The text shown to clients. Authentication failures all read the same so the response
    /// doesn't reveal which part of the proof was wrong.
    pub fn public_message(&self) -> String {
        if self.is_auth() {
            "invalid login attempt".to_string()
        } else {
            self.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_share_one_public_message() {
        let messages: Vec<String> = [
            Error::ExpiredChallenge,
            Error::InvalidSignature,
            Error::InvalidCredentials,
        ]
        .iter()
        .map(Error::public_message)
        .collect();
        assert!(messages.iter().all(|m| m == "invalid login attempt"));
    }

    #[test]
    fn unknown_backend_is_a_configuration_defect() {
        let err = Error::UnknownBackend {
            domain: "home.example.com".into(),
            backend: "route53".into(),
        };
        assert!(err.is_configuration_defect());
        assert!(!err.public_message().contains("route53"));
        assert!(!Error::UnknownDomain("x.example.com".into()).is_configuration_defect());
    }

    #[test]
    fn decode_errors_are_classified() {
        assert!(Error::MissingField("reqc").is_decode());
        assert!(!Error::InvalidSignature.is_decode());
        assert_eq!(Error::MissingField("reqc").to_string(), "`reqc` is missing");
    }
}
