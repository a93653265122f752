// src/config/file.rs
//
// Optional TOML config file. Every key is optional; present keys override
// the defaults and are in turn overridden by environment and CLI.
//
//   roster = "characters.txt"
//   state = "xp_log.json"
//   layout = "dated"              # flat | dated
//   compare = "previous-day"      # previous-day | last-value
//   clamp = "clamp-to-zero"       # clamp-to-zero | keep
//   on_corrupt_state = "abort"    # abort | start-empty
//   source = "html"               # html | json
//   webhook = "https://discord.com/api/webhooks/..."
//   workers = 1
//   pause_ms = 1000
//
//   [html]
//   base_url = "https://guildstats.eu"
//   table_class = "chart_table"
//   gained_col = 1
//   total_col = 4                 # needed for tracking with source = "html"
//
//   [json]
//   url = "https://example.org/character/{name}"
//   xp_pointer = "/character/experience"
//   name_pointer = "/character/name"
//
//   [commit]
//   enabled = true
//   push = true
//   user_name = "github-actions"
//   user_email = "github-actions@github.com"

use std::{fs, path::{Path, PathBuf}};

use serde::Deserialize;

use super::consts::DEFAULT_CONFIG_FILE;
use super::options::*;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub roster: Option<PathBuf>,
    pub state: Option<PathBuf>,
    pub layout: Option<StoreLayout>,
    pub compare: Option<CompareWith>,
    pub clamp: Option<ClampPolicy>,
    pub on_corrupt_state: Option<CorruptStatePolicy>,
    pub source: Option<SourceKind>,
    pub webhook: Option<String>,
    pub workers: Option<usize>,
    pub pause_ms: Option<u64>,
    pub jitter_ms: Option<u64>,
    #[serde(default)]
    pub html: HtmlSection,
    #[serde(default)]
    pub json: JsonSection,
    #[serde(default)]
    pub commit: CommitSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HtmlSection {
    pub base_url: Option<String>,
    pub table_class: Option<String>,
    pub date_col: Option<usize>,
    pub gained_col: Option<usize>,
    pub total_col: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonSection {
    pub url: Option<String>,
    pub xp_pointer: Option<String>,
    pub name_pointer: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommitSection {
    pub enabled: Option<bool>,
    pub push: Option<bool>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub command: Option<String>,
}

pub fn parse(text: &str, path: &Path) -> Result<FileConfig, ConfigError> {
    toml::from_str(text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
}

/// Read `explicit` if given (must exist), else the default file if present.
pub fn load(explicit: Option<&Path>) -> Result<Option<FileConfig>, ConfigError> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => {
            let p = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !p.exists() { return Ok(None); }
            p
        }
    };
    let text = fs::read_to_string(&path)
        .map_err(|source| ConfigError::Read { path: path.clone(), source })?;
    logd!("config file: {}", path.display());
    parse(&text, &path).map(Some)
}

impl FileConfig {
    pub fn apply(self, cfg: &mut Config) {
        macro_rules! set {
            ($src:expr => $dst:expr) => { if let Some(v) = $src { $dst = v; } };
        }
        set!(self.roster => cfg.roster_path);
        set!(self.state => cfg.state_path);
        set!(self.layout => cfg.layout);
        set!(self.compare => cfg.compare_with);
        set!(self.clamp => cfg.clamp);
        set!(self.on_corrupt_state => cfg.on_corrupt_state);
        set!(self.source => cfg.source);
        set!(self.workers => cfg.workers);
        set!(self.pause_ms => cfg.pause_ms);
        set!(self.jitter_ms => cfg.jitter_ms);
        if self.webhook.is_some() { cfg.webhook_url = self.webhook; }

        set!(self.html.base_url => cfg.html.base_url);
        set!(self.html.table_class => cfg.html.table_class);
        set!(self.html.date_col => cfg.html.date_col);
        set!(self.html.gained_col => cfg.html.gained_col);
        if self.html.total_col.is_some() { cfg.html.total_col = self.html.total_col; }

        set!(self.json.url => cfg.json.url);
        set!(self.json.xp_pointer => cfg.json.xp_pointer);
        if self.json.name_pointer.is_some() {
            // empty string disables the name check
            cfg.json.name_pointer = self.json.name_pointer.filter(|p| !p.is_empty());
        }

        set!(self.commit.enabled => cfg.commit.enabled);
        set!(self.commit.push => cfg.commit.push);
        if self.commit.user_name.is_some() { cfg.commit.user_name = self.commit.user_name; }
        if self.commit.user_email.is_some() { cfg.commit.user_email = self.commit.user_email; }
        if self.commit.command.is_some() { cfg.commit.command = self.commit.command; }
    }
}
