// src/report/notify.rs
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;

use crate::config::consts::WEBHOOK_MAX_CHARS;
use crate::core::net::{self, NetError};

/// Delivery receipt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ack {
    /// HTTP status of the last request, 0 for local sinks.
    pub status: u16,
    /// Number of messages the text was sent as.
    pub parts: usize,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("webhook rejected message: {0}")]
    Net(#[from] NetError),

    #[error("nothing to send")]
    Empty,
}

/// Where the rendered leaderboard goes.
pub trait Notifier {
    fn notify(&self, text: &str) -> Result<Ack, NotifyError>;
}

#[derive(Serialize)]
struct WebhookBody<'a> {
    content: &'a str,
}

/// Chat webhook taking `{"content": "..."}`. 200 and 204 are success.
pub struct WebhookNotifier {
    client: Client,
    url: String,
    max_chars: usize,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self, NetError> {
        Ok(Self { client: net::client()?, url: url.into(), max_chars: WEBHOOK_MAX_CHARS })
    }
}

impl Notifier for WebhookNotifier {
    fn notify(&self, text: &str) -> Result<Ack, NotifyError> {
        let parts = split_message(text, self.max_chars);
        if parts.is_empty() {
            return Err(NotifyError::Empty);
        }
        let mut last = StatusCode::NO_CONTENT;
        for part in &parts {
            last = net::post_json(
                &self.client,
                &self.url,
                &WebhookBody { content: part },
                &[StatusCode::OK, StatusCode::NO_CONTENT],
            )?;
        }
        Ok(Ack { status: last.as_u16(), parts: parts.len() })
    }
}

/// Prints instead of sending. Used for dry runs and when no webhook is set.
pub struct StdoutNotifier;

impl Notifier for StdoutNotifier {
    fn notify(&self, text: &str) -> Result<Ack, NotifyError> {
        if text.trim().is_empty() {
            return Err(NotifyError::Empty);
        }
        println!("📤 Message preview:\n{text}");
        Ok(Ack { status: 0, parts: 1 })
    }
}

/// Split into chunks of at most `max` chars, breaking between lines.
/// A single line longer than `max` is cut at char boundaries.
pub fn split_message(text: &str, max: usize) -> Vec<String> {
    let max = max.max(1);
    let mut parts = Vec::new();
    let mut cur = String::new();
    let mut cur_len = 0usize;

    for line in text.trim().lines() {
        let mut line = line;
        let mut len = line.chars().count();

        while len > max {
            if cur_len > 0 {
                parts.push(std::mem::take(&mut cur));
                cur_len = 0;
            }
            let cut = line.char_indices().nth(max).map(|(i, _)| i).unwrap_or(line.len());
            parts.push(line[..cut].to_string());
            line = &line[cut..];
            len -= max;
        }

        let extra = if cur_len == 0 { len } else { len + 1 };
        if cur_len + extra > max {
            parts.push(std::mem::take(&mut cur));
            cur_len = 0;
        }
        if cur_len > 0 {
            cur.push('\n');
            cur_len += 1;
        }
        cur.push_str(line);
        cur_len += len;
    }
    if !cur.is_empty() {
        parts.push(cur);
    }
    parts
}
