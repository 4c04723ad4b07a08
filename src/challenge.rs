//! Salt challenges.
//!
//! A challenge is never stored. The server signs `salt` and `time` with its key, the client echoes
//! all three back with its update request, and the [authenticator][crate::auth] re-derives the
//! signature to check them.

use crate::config::Shared;
use crate::digest::digest;
use rand::distributions::Alphanumeric;
use rand::Rng;
use time::OffsetDateTime;

pub const SALT_LEN: usize = 10;

/// A freshly issued salt, its issue time in seconds since the epoch, and the signature binding
/// both to the server key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub salt: String,
    pub issued_at: i64,
    pub signature: String,
}

#[derive(Clone)]
pub struct ChallengeIssuer {
    config: Shared,
}

impl ChallengeIssuer {
    pub fn new(config: Shared) -> Self {
        ChallengeIssuer { config }
    }

    pub fn issue(&self) -> Challenge {
        self.issue_at(unix_now())
    }

    pub fn issue_at(&self, now: i64) -> Challenge {
        let salt = random_salt();
        let signature = sign(&salt, now, &self.config.server_key);
        tracing::debug!("issued salt {salt} at {now}");
        Challenge {
            salt,
            issued_at: now,
            signature,
        }
    }
}

/// `digest("{salt}.{issued_at}.{server_key}")`
pub fn sign(salt: &str, issued_at: i64, server_key: &str) -> String {
    digest(format!("{salt}.{issued_at}.{server_key}"))
}

pub(crate) fn unix_now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

fn random_salt() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SALT_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;
    use std::sync::Arc;

    #[test]
    fn salt_is_ten_alphanumerics() {
        let issuer = ChallengeIssuer::new(Arc::new(test_config()));
        let challenge = issuer.issue();
        assert_eq!(challenge.salt.len(), SALT_LEN);
        assert!(challenge.salt.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn salts_differ_between_challenges() {
        let issuer = ChallengeIssuer::new(Arc::new(test_config()));
        assert_ne!(issuer.issue().salt, issuer.issue().salt);
    }

    #[test]
    fn signature_binds_salt_time_and_key() {
        let config = Arc::new(test_config());
        let issuer = ChallengeIssuer::new(config.clone());
        let challenge = issuer.issue_at(1_700_000_000);
        assert_eq!(challenge.issued_at, 1_700_000_000);
        assert_eq!(
            challenge.signature,
            digest(format!("{}.1700000000.{}", challenge.salt, config.server_key))
        );
        assert_ne!(
            challenge.signature,
            sign(&challenge.salt, 1_700_000_000, "some-other-key")
        );
    }

    #[test]
    fn issue_uses_current_time() {
        let issuer = ChallengeIssuer::new(Arc::new(test_config()));
        let before = unix_now();
        let challenge = issuer.issue();
        assert!(challenge.issued_at >= before && challenge.issued_at <= unix_now());
    }
}
