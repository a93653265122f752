// src/roster.rs
// The ordered list of tracked characters, read once from a text file.
//
// One name per line. Blank lines and `#` comments are skipped, surrounding
// whitespace is trimmed, inner whitespace collapsed. A name repeated with
// different casing is the same character; the first spelling wins.

use std::{fs, path::{Path, PathBuf}};

use thiserror::Error;

use crate::core::sanitize::normalize_ws;
use crate::model::{same_name, CharacterName};

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("cannot read roster {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Roster {
    names: Vec<CharacterName>,
}

impl Roster {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<CharacterName> = Vec::new();
        for raw in names {
            let name = normalize_ws(raw.as_ref());
            if name.is_empty() { continue; }
            if out.iter().any(|n| same_name(n, &name)) {
                logw!("roster: duplicate entry '{name}' ignored");
                continue;
            }
            out.push(name);
        }
        Self { names: out }
    }

    pub fn parse(text: &str) -> Self {
        Self::new(
            text.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#')),
        )
    }

    pub fn load(path: &Path) -> Result<Self, RosterError> {
        let text = fs::read_to_string(path)
            .map_err(|source| RosterError::Read { path: path.to_path_buf(), source })?;
        let roster = Self::parse(&text);
        logd!("roster: {} characters from {}", roster.len(), path.display());
        Ok(roster)
    }

    pub fn names(&self) -> &[CharacterName] { &self.names }
    pub fn len(&self) -> usize { self.names.len() }
    pub fn is_empty(&self) -> bool { self.names.is_empty() }
}
