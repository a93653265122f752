// src/store.rs
//
// Sole owner of the state file.
//
// Two on-disk layouts (see `StoreLayout`):
//   Dated: { "2025-06-14": { "Ilumine": 1001500, ... }, ... }
//   Flat:  { "Ilumine": 1001500, ... }
//
// In memory both are a `History`. A flat file loads as a single entry keyed
// by the file's last write date (UTC); saving a flat store writes the newest
// entry only.
//
// Writes go to a temp file in the same directory, then rename over the
// target, so a crash leaves either the old or the new file.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::config::consts::CORRUPT_SUFFIX;
use crate::config::options::{CorruptStatePolicy, StoreLayout};
use crate::model::{date_key, parse_date_key, DateKey, History, Snapshot};

#[derive(Debug, Error)]
pub enum StateError {
    #[error("cannot read state {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("state {path} is corrupt: {detail}")]
    Corrupt { path: PathBuf, detail: String },

    #[error("cannot write state {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("cannot encode state: {0}")]
    Encode(#[from] serde_json::Error),
}

pub struct Store {
    path: PathBuf,
    layout: StoreLayout,
    on_corrupt: CorruptStatePolicy,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>, layout: StoreLayout, on_corrupt: CorruptStatePolicy) -> Self {
        Self { path: path.into(), layout, on_corrupt }
    }

    pub fn path(&self) -> &Path { &self.path }

    /// Missing file → empty history. Unreadable file → per `CorruptStatePolicy`.
    pub fn load(&self) -> Result<History, StateError> {
        if !self.path.exists() {
            logf!("no state at {}; starting empty", self.path.display());
            return Ok(History::new());
        }
        match self.read() {
            Ok(h) => {
                logd!("state: {} dated entries from {}", h.len(), self.path.display());
                Ok(h)
            }
            Err(e @ StateError::Corrupt { .. }) => match self.on_corrupt {
                CorruptStatePolicy::Abort => Err(e),
                CorruptStatePolicy::StartEmpty => {
                    let backup = self.backup_path();
                    fs::copy(&self.path, &backup)
                        .map_err(|source| StateError::Write { path: backup.clone(), source })?;
                    logw!("{e}; copied to {} and starting from empty history", backup.display());
                    Ok(History::new())
                }
            },
            Err(e) => Err(e),
        }
    }

    fn read(&self) -> Result<History, StateError> {
        let text = fs::read_to_string(&self.path)
            .map_err(|source| StateError::Read { path: self.path.clone(), source })?;
        let corrupt = |detail: String| StateError::Corrupt { path: self.path.clone(), detail };

        if text.trim().is_empty() {
            return Ok(History::new());
        }

        match self.layout {
            StoreLayout::Dated => {
                let history: History = serde_json::from_str(&text).map_err(|e| corrupt(e.to_string()))?;
                if let Some(bad) = history.keys().find(|k| parse_date_key(k).is_none()) {
                    return Err(corrupt(format!("'{bad}' is not a YYYY-MM-DD date")));
                }
                Ok(history)
            }
            StoreLayout::Flat => {
                let snapshot: Snapshot = serde_json::from_str(&text).map_err(|e| corrupt(e.to_string()))?;
                let mut history = History::new();
                history.insert(self.modified_key(), snapshot);
                Ok(history)
            }
        }
    }

    /// Full overwrite, atomically.
    pub fn save(&self, history: &History) -> Result<(), StateError> {
        let mut body = match self.layout {
            StoreLayout::Dated => serde_json::to_string_pretty(history)?,
            StoreLayout::Flat => {
                let latest = history.values().next_back().cloned().unwrap_or_default();
                serde_json::to_string_pretty(&latest)?
            }
        };
        body.push('\n');

        let write_err = |source: io::Error| StateError::Write { path: self.path.clone(), source };
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(write_err)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(write_err)?;
        tmp.write_all(body.as_bytes()).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;

        logf!("state saved to {}", self.path.display());
        Ok(())
    }

    /// Layout-aware upsert.
    ///
    /// Dated: `upsert_today`.
    /// Flat: one snapshot only, so "unchanged" means equal to the stored
    /// snapshot whatever date it was written on; a change replaces it.
    pub fn upsert(&self, history: History, date: &str, snapshot: Snapshot) -> (History, bool) {
        match self.layout {
            StoreLayout::Dated => upsert_today(history, date, snapshot),
            StoreLayout::Flat => {
                if history.values().next_back() == Some(&snapshot) {
                    return (history, false);
                }
                let mut fresh = History::new();
                fresh.insert(date.to_string(), snapshot);
                (fresh, true)
            }
        }
    }

    fn backup_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".");
        name.push(CORRUPT_SUFFIX);
        self.path.with_file_name(name)
    }

    fn modified_key(&self) -> DateKey {
        let when: DateTime<Utc> = fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .map(DateTime::from)
            .unwrap_or_else(|_| Utc::now());
        date_key(when.date_naive())
    }
}

/// Set `date -> snapshot`. `changed` is false iff the same snapshot was
/// already stored under `date`; the history then comes back untouched.
pub fn upsert_today(mut history: History, date: &str, snapshot: Snapshot) -> (History, bool) {
    if history.get(date) == Some(&snapshot) {
        return (history, false);
    }
    history.insert(date.to_string(), snapshot);
    (history, true)
}

