//! Request authentication.
//!
//! Every update request proves itself from scratch; there is no session. The checks run in order
//! and stop at the first failure:
//!
//! 1. the challenge was issued no more than [`CHALLENGE_TTL_SECS`] ago,
//! 2. `sign` matches the signature re-derived from `salt`, `time` and the server key,
//! 3. `pass` equals `digest(digest(password) + "." + salt)`.

use crate::challenge::{sign, unix_now};
use crate::config::Shared;
use crate::digest::digest;
use crate::error::Error;
use crate::request::UpdateRequest;

pub const CHALLENGE_TTL_SECS: i64 = 10;

#[derive(Clone)]
pub struct Authenticator {
    config: Shared,
}

impl Authenticator {
    pub fn new(config: Shared) -> Self {
        Authenticator { config }
    }

    pub fn authenticate(&self, req: &UpdateRequest) -> Result<(), Error> {
        self.authenticate_at(req, unix_now())
    }

    pub fn authenticate_at(&self, req: &UpdateRequest, now: i64) -> Result<(), Error> {
        if now > req.time.saturating_add(CHALLENGE_TTL_SECS) {
            return Err(Error::ExpiredChallenge);
        }

        if sign(&req.salt, req.time, &self.config.server_key) != req.sign {
            return Err(Error::InvalidSignature);
        }

        if password_proof(&self.config.password, &req.salt) != req.pass {
            return Err(Error::InvalidCredentials);
        }

        // One shared credential covers every configured domain; the user name isn't checked.
        if req.user != self.config.username {
            tracing::debug!(
                "accepted request from user \"{}\" with the shared credential",
                req.user
            );
        }
        Ok(())
    }
}

/// The proof a client holding `password` sends for `salt`.
pub fn password_proof(password: &str, salt: &str) -> String {
    digest(format!("{}.{salt}", digest(password)))
}
