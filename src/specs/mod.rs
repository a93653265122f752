// src/specs/mod.rs
//! # Upstream source "specs"
//!
//! Each spec knows how to read one upstream source and hand back a single
//! normalized number per character: cumulative experience.
//!
//! ## What lives here
//! - The [`Fetcher`] capability and its error type.
//! - `experience`: the character page's experience table (HTML).
//! - `api`: a JSON endpoint exposing a character's experience total.
//!
//! ## What does **not** live here
//! - Politeness delays, worker counts, ordering (`scrape`).
//! - Deciding what a number means relative to yesterday (`engine`).
//! - Persistence (`store`).
//!
//! Parsers are plain functions over the fetched text so they can be tested
//! offline against captured pages.

pub mod api;
pub mod experience;

use thiserror::Error;

use crate::core::net::NetError;
use crate::model::XpValue;

pub use api::JsonApiFetcher;
pub use experience::HtmlTableFetcher;

/// One character's current standing as reported upstream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Observation {
    /// Name as the source spells it, when the source reports one.
    pub reported_name: Option<String>,
    pub experience: XpValue,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Net(#[from] NetError),

    #[error("character not found upstream")]
    NotFound,

    #[error("unreadable response: {0}")]
    Parse(String),

    #[error("upstream reports '{reported}' for '{requested}'")]
    NameMismatch { requested: String, reported: String },

    #[error("no XP data for {0}")]
    NoRowForDate(String),

    #[error("not supported by this source: {0}")]
    Unsupported(String),
}

impl FetchError {
    /// 429 is worth calling out in logs; nothing retries on it.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, FetchError::Net(e) if e.status() == Some(429))
    }
}

/// Resolves one character to its cumulative experience.
pub trait Fetcher: Sync {
    fn fetch(&self, name: &str) -> Result<Observation, FetchError>;
}

/// Sources that publish their own per-day "XP gained" figure.
pub trait DailyGainSource: Sync {
    /// Gain recorded for `date` (`YYYY-MM-DD`), matched by exact string equality.
    fn daily_gain(&self, name: &str, date: &str) -> Result<i64, FetchError>;
}
