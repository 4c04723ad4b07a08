use crate::challenge::Challenge;
use crate::config::Config;
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse, Response};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::net::{IpAddr, SocketAddr};

/// The HTML page GnuDIP clients scrape. Result values travel as `<meta>` tags, written in key
/// order, and the message is shown in the body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(super) struct ResponsePage {
    pub msg: String,
    pub meta: BTreeMap<&'static str, String>,
}

impl ResponsePage {
    pub fn salt(challenge: &Challenge) -> Self {
        ResponsePage {
            msg: "Salt generated".to_string(),
            meta: BTreeMap::from([
                ("salt", challenge.salt.clone()),
                ("time", challenge.issued_at.to_string()),
                ("sign", challenge.signature.clone()),
            ]),
        }
    }

    pub fn update_succeeded(offline: bool, echoed_address: Option<String>) -> Self {
        let mut meta = BTreeMap::from([("retc", "0".to_string())]);
        if let Some(addr) = echoed_address {
            meta.insert("addr", addr);
        }
        ResponsePage {
            msg: format!("Successful {} request", request_kind(offline)),
            meta,
        }
    }

    pub fn update_failed(offline: bool, reason: &str) -> Self {
        ResponsePage {
            msg: format!("Failed {} request: {reason}", request_kind(offline)),
            meta: BTreeMap::from([("retc", "1".to_string())]),
        }
    }

    pub fn render(&self) -> String {
        let mut meta_tags = String::new();
        for (key, value) in &self.meta {
            // Writing to a String can't fail.
            let _ = writeln!(
                meta_tags,
                "<meta name=\"{}\" content=\"{}\">",
                escape(key),
                escape(value)
            );
        }
        format!(
            r#"<!DOCTYPE HTML PUBLIC "-//W3C//DTD HTML 4.01 Transitional//EN"
                      "http://www.w3.org/TR/html4/loose.dtd">
<html>
<head>
<title>
GnuDIP Update Server
</title>
{meta_tags}</head>
<body>
<center>
<h2>GnuDIP Update Server</h2>
{}
</center>
</body>
</html>
"#,
            escape(&self.msg)
        )
    }
}

impl IntoResponse for ResponsePage {
    fn into_response(self) -> Response {
        Html(self.render()).into_response()
    }
}

fn request_kind(offline: bool) -> &'static str {
    if offline {
        "offline"
    } else {
        "update"
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Forwarded-address headers, in order of precedence.
const CLIENT_IP_HEADERS: [&str; 3] = ["true-client-ip", "x-real-ip", "x-forwarded-for"];

/// The address the request came from: the TCP peer, or the address a trusted proxy forwarded
/// for it. `None` when the transport didn't report a peer.
pub(super) fn client_address(
    config: &Config,
    peer: Option<SocketAddr>,
    headers: &HeaderMap,
) -> Option<String> {
    let peer = peer?.ip();
    if config.is_trusted_proxy(peer) {
        if let Some(forwarded) = forwarded_address(headers) {
            return Some(forwarded.to_string());
        }
    }
    Some(peer.to_string())
}

fn forwarded_address(headers: &HeaderMap) -> Option<IpAddr> {
    CLIENT_IP_HEADERS.iter().find_map(|name| {
        headers
            .get(*name)?
            .to_str()
            .ok()?
            .split(',')
            .next()?
            .trim()
            .parse()
            .ok()
    })
}
