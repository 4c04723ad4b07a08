//! The GnuDIP update request wire contract.
//!
//! | param  | meaning                                             |
//! |--------|-----------------------------------------------------|
//! | `salt` | echoed challenge salt                               |
//! | `time` | echoed challenge issue time (integer seconds)       |
//! | `sign` | echoed challenge signature                          |
//! | `user` | account name                                        |
//! | `pass` | password proof bound to `salt`                      |
//! | `domn` | target domain                                       |
//! | `addr` | proposed address (always required)                  |
//! | `reqc` | `0` register, `1` offline, `2` echo-register        |

use crate::error::Error;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestCode {
    /// Register the address passed with the request.
    Register,
    /// Remove the domain's address record.
    Offline,
    /// Register the address the request was seen from and pass it back.
    EchoRegister,
}

impl FromStr for RequestCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0" => Ok(RequestCode::Register),
            "1" => Ok(RequestCode::Offline),
            "2" => Ok(RequestCode::EchoRegister),
            other => Err(Error::InvalidRequestCode(other.to_string())),
        }
    }
}

impl fmt::Display for RequestCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            RequestCode::Register => "0",
            RequestCode::Offline => "1",
            RequestCode::EchoRegister => "2",
        };
        f.write_str(code)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateRequest {
    pub salt: String,
    pub time: i64,
    pub sign: String,
    pub user: String,
    pub pass: String,
    pub domain: String,
    pub address: String,
    /// Source address of the caller as seen by the transport, if it could tell.
    pub client_address: Option<String>,
    /// The raw `reqc` value. Interpreted only after authentication, see [`Self::request_code`].
    pub code: String,
}

impl UpdateRequest {
    /// Decode the wire parameters. Every parameter is required and must be non-empty; fields are
    /// checked in wire order so the first missing one is reported.
    pub fn decode(params: &HashMap<String, String>) -> Result<Self, Error> {
        let field = |name: &'static str| -> Result<String, Error> {
            params
                .get(name)
                .filter(|v| !v.is_empty())
                .cloned()
                .ok_or(Error::MissingField(name))
        };

        let salt = field("salt")?;
        let time = field("time")?
            .parse::<i64>()
            .map_err(Error::InvalidTimeFormat)?;

        Ok(UpdateRequest {
            salt,
            time,
            sign: field("sign")?,
            user: field("user")?,
            pass: field("pass")?,
            domain: field("domn")?,
            address: field("addr")?,
            client_address: None,
            code: field("reqc")?,
        })
    }

    #[must_use]
    pub fn with_client_address(mut self, client_address: Option<String>) -> Self {
        self.client_address = client_address;
        self
    }

    pub fn request_code(&self) -> Result<RequestCode, Error> {
        self.code.parse()
    }

    pub fn is_offline(&self) -> bool {
        matches!(self.request_code(), Ok(RequestCode::Offline))
    }
}
