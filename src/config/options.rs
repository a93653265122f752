// src/config/options.rs
use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use super::consts::*;
use crate::model::parse_date_key;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },

    #[error("invalid config file {path}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },

    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },

    #[error("{0}")]
    Usage(String),
}

/// Which stored snapshot today's values are compared against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompareWith {
    /// Most recent dated entry strictly before today.
    PreviousDay,
    /// Whatever the last run stored, even earlier today.
    LastValue,
}

/// On-disk shape of the state file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreLayout {
    /// `{ name: xp }`
    Flat,
    /// `{ "YYYY-MM-DD": { name: xp } }`
    Dated,
}

/// What a drop in XP turns into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClampPolicy {
    ClampToZero,
    Keep,
}

/// What to do with a state file that exists but cannot be read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CorruptStatePolicy {
    Abort,
    /// Back the file up next to itself and start from an empty history.
    StartEmpty,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    Html,
    Json,
}

macro_rules! from_str_table {
    ($ty:ty, $key:literal, { $($text:literal => $val:expr),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = ConfigError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($val),)+
                    other => Err(ConfigError::Invalid { key: $key, value: other.to_string() }),
                }
            }
        }
    };
}

from_str_table!(CompareWith, "compare", {
    "previous-day" => CompareWith::PreviousDay,
    "yesterday" => CompareWith::PreviousDay,
    "last-value" => CompareWith::LastValue,
    "last" => CompareWith::LastValue,
});
from_str_table!(StoreLayout, "layout", {
    "flat" => StoreLayout::Flat,
    "dated" => StoreLayout::Dated,
    "history" => StoreLayout::Dated,
});
from_str_table!(CorruptStatePolicy, "on-corrupt", {
    "abort" => CorruptStatePolicy::Abort,
    "reset" => CorruptStatePolicy::StartEmpty,
    "start-empty" => CorruptStatePolicy::StartEmpty,
});
from_str_table!(SourceKind, "source", {
    "html" => SourceKind::Html,
    "json" => SourceKind::Json,
});

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JsonSource {
    /// URL with a `{name}` placeholder.
    pub url: String,
    pub xp_pointer: String,
    /// Where the upstream spelling of the name lives, if anywhere.
    pub name_pointer: Option<String>,
}

impl Default for JsonSource {
    fn default() -> Self {
        Self {
            url: s!(DEFAULT_JSON_URL),
            xp_pointer: s!(DEFAULT_JSON_XP_POINTER),
            name_pointer: Some(s!(DEFAULT_JSON_NAME_POINTER)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HtmlSource {
    pub base_url: String,
    pub table_class: String,
    pub date_col: usize,
    pub gained_col: usize,
    /// Column holding cumulative experience, when the page has one.
    pub total_col: Option<usize>,
}

impl Default for HtmlSource {
    fn default() -> Self {
        Self {
            base_url: s!(DEFAULT_BASE_URL),
            table_class: s!(XP_TABLE_CLASS),
            date_col: COL_DATE,
            gained_col: COL_GAINED,
            total_col: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct CommitOptions {
    pub enabled: bool,
    pub push: bool,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    /// Run this program with the state path instead of git.
    pub command: Option<String>,
}

/// Everything a run needs, assembled once at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub roster_path: PathBuf,
    pub state_path: PathBuf,
    pub layout: StoreLayout,
    pub compare_with: CompareWith,
    pub clamp: ClampPolicy,
    pub on_corrupt_state: CorruptStatePolicy,
    pub source: SourceKind,
    pub html: HtmlSource,
    pub json: JsonSource,
    pub webhook_url: Option<String>,
    pub workers: usize,
    pub pause_ms: u64,
    pub jitter_ms: u64,
    /// Overrides "today". Also the target date for daily-gains mode.
    pub date: Option<NaiveDate>,
    pub dry_run: bool,
    pub commit: CommitOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            roster_path: PathBuf::from(DEFAULT_ROSTER_FILE),
            state_path: PathBuf::from(DEFAULT_STATE_FILE),
            layout: StoreLayout::Dated,
            compare_with: CompareWith::PreviousDay,
            clamp: ClampPolicy::ClampToZero,
            on_corrupt_state: CorruptStatePolicy::Abort,
            source: SourceKind::Html,
            html: HtmlSource::default(),
            json: JsonSource::default(),
            webhook_url: None,
            workers: WORKERS,
            pause_ms: REQUEST_PAUSE_MS,
            jitter_ms: JITTER_MS,
            date: None,
            dry_run: false,
            commit: CommitOptions::default(),
        }
    }
}

impl Config {
    /// Layer environment variables on top. `lookup` is `std::env::var` in
    /// production; tests pass a closure over a map.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("XP_ROSTER") { self.roster_path = PathBuf::from(v); }
        if let Some(v) = get("XP_STATE") { self.state_path = PathBuf::from(v); }
        if let Some(v) = get("XP_LAYOUT") { self.layout = v.parse()?; }
        if let Some(v) = get("XP_COMPARE") { self.compare_with = v.parse()?; }
        if let Some(v) = get("XP_SOURCE") { self.source = v.parse()?; }
        if let Some(v) = get("XP_WEBHOOK_URL").or_else(|| get("DISCORD_WEBHOOK_URL")) {
            self.webhook_url = Some(v.trim().to_string());
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 || self.workers > MAX_WORKERS {
            return Err(ConfigError::Invalid { key: "workers", value: self.workers.to_string() });
        }
        if let Some(url) = &self.webhook_url {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(ConfigError::Invalid { key: "webhook", value: url.clone() });
            }
        }
        if self.source == SourceKind::Json && !self.json.url.contains("{name}") {
            return Err(ConfigError::Invalid { key: "json.url", value: self.json.url.clone() });
        }
        if self.layout == StoreLayout::Flat && self.compare_with == CompareWith::PreviousDay {
            logw!("flat layout keeps one snapshot; previous-day compares against the file's last write date");
        }
        Ok(())
    }

    /// "Today" for this run: the override, or the current UTC date.
    pub fn today(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| chrono::Utc::now().date_naive())
    }

    pub fn set_date(&mut self, text: &str) -> Result<(), ConfigError> {
        self.date = Some(
            parse_date_key(text)
                .ok_or_else(|| ConfigError::Invalid { key: "date", value: text.to_string() })?,
        );
        Ok(())
    }
}
