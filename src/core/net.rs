// src/core/net.rs
// Thin blocking HTTP helpers shared by the fetchers and the webhook sink.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;

use crate::config::consts::{HTTP_TIMEOUT_SECS, USER_AGENT};

#[derive(Debug, Error)]
pub enum NetError {
    /// Connect/read failure or timeout.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

impl NetError {
    pub fn status(&self) -> Option<u16> {
        match self {
            NetError::Status { status, .. } => Some(*status),
            NetError::Transport(e) => e.status().map(|s| s.as_u16()),
        }
    }
}

/// Every request carries a timeout; a slow upstream becomes an error, not a hang.
pub fn client() -> Result<Client, NetError> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()?)
}

pub fn http_get(client: &Client, url: &str) -> Result<String, NetError> {
    logd!("GET {url}");
    let resp = client.get(url).send()?;
    let status = resp.status();
    let body = resp.text()?;
    if !status.is_success() {
        return Err(NetError::Status { status: status.as_u16(), body: clip(&body) });
    }
    Ok(body)
}

/// POST a JSON body. Only the listed statuses count as success.
pub fn post_json<T: Serialize + ?Sized>(
    client: &Client,
    url: &str,
    body: &T,
    ok: &[StatusCode],
) -> Result<StatusCode, NetError> {
    let resp = client.post(url).json(body).send()?;
    let status = resp.status();
    if ok.contains(&status) {
        return Ok(status);
    }
    let text = resp.text().unwrap_or_default();
    Err(NetError::Status { status: status.as_u16(), body: clip(&text) })
}

/// Replace spaces with '+' the way the stats site builds its own links,
/// and percent-encode the few bytes that would break a query string.
pub fn query_escape(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        match ch {
            ' ' => out.push('+'),
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' | '~' | '\'' => out.push(ch),
            _ => {
                let mut buf = [0u8; 4];
                for b in ch.encode_utf8(&mut buf).bytes() {
                    out.push_str(&format!("%{b:02X}"));
                }
            }
        }
    }
    out
}

/// Same as `query_escape` but with `%20` for spaces, for URL paths.
pub fn path_escape(name: &str) -> String {
    query_escape(name).replace('+', "%20")
}

fn clip(body: &str) -> String {
    const MAX: usize = 200;
    let t = body.trim();
    match t.char_indices().nth(MAX) {
        Some((i, _)) => join!(&t[..i], "…"),
        None => t.to_string(),
    }
}
