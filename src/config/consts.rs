// src/config/consts.rs

// Net config
pub const DEFAULT_BASE_URL: &str = "https://guildstats.eu";
pub const CHARACTER_PATH: &str = "/character?name=";
pub const DEFAULT_JSON_URL: &str = "https://api.tibiadata.com/v4/character/{name}";
pub const DEFAULT_JSON_XP_POINTER: &str = "/character/character/experience";
pub const DEFAULT_JSON_NAME_POINTER: &str = "/character/character/name";
pub const HTTP_TIMEOUT_SECS: u64 = 15;
pub const USER_AGENT: &str = concat!("xp_tracker/", env!("CARGO_PKG_VERSION"));

// Experience table on the character page: date, then the XP gained that
// day. No cumulative column is assumed; set `[html] total_col` to use one.
pub const XP_TABLE_CLASS: &str = "chart_table";
pub const COL_DATE: usize = 0;
pub const COL_GAINED: usize = 1;

// Local files
pub const DEFAULT_ROSTER_FILE: &str = "characters.txt";
pub const DEFAULT_STATE_FILE: &str = "xp_log.json";
pub const DEFAULT_CONFIG_FILE: &str = "xp_tracker.toml";
pub const CORRUPT_SUFFIX: &str = "corrupt";

// Notification
pub const WEBHOOK_MAX_CHARS: usize = 2000;

// Concurrency
pub const WORKERS: usize = 1;
pub const MAX_WORKERS: usize = 8;
pub const REQUEST_PAUSE_MS: u64 = 1000; // be polite
pub const JITTER_MS: u64 = 250; // extra 0..250 ms
