// src/model.rs
//
// Shared data shapes: one observation instant (Snapshot) and the dated
// sequence of them (History).
//
// Snapshot keys keep the roster's spelling. Matching against other
// spellings (upstream pages, an older roster file) goes through
// `lookup_ci`, never through raw map access.

use std::collections::BTreeMap;

use chrono::NaiveDate;

pub type CharacterName = String;
pub type XpValue = u64;

/// ISO 8601 calendar date, `YYYY-MM-DD`. Sorts chronologically as a string.
pub type DateKey = String;

pub type Snapshot = BTreeMap<CharacterName, XpValue>;
pub type History = BTreeMap<DateKey, Snapshot>;

pub const DATE_FMT: &str = "%Y-%m-%d";

pub fn date_key(date: NaiveDate) -> DateKey {
    date.format(DATE_FMT).to_string()
}

pub fn parse_date_key(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FMT).ok()
}

/// Case-insensitive name comparison used everywhere names from different
/// sources meet.
pub fn same_name(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// Exact hit first, then a case-insensitive scan.
pub fn lookup_ci(snapshot: &Snapshot, name: &str) -> Option<XpValue> {
    if let Some(v) = snapshot.get(name) {
        return Some(*v);
    }
    snapshot
        .iter()
        .find(|(k, _)| same_name(k, name))
        .map(|(_, v)| *v)
}

/// Remove any key matching `name` case-insensitively. Returns how many went.
pub fn remove_ci(snapshot: &mut Snapshot, name: &str) -> usize {
    let before = snapshot.len();
    snapshot.retain(|k, _| !same_name(k, name));
    before - snapshot.len()
}
