// src/engine/delta.rs
//
// Today's observations against a prior snapshot, ranked.
//
// Never fails: anything missing degrades into FirstSeen/Errored records.
// Every roster name yields exactly one record.

use std::ops::Bound;

use crate::config::options::{ClampPolicy, CompareWith};
use crate::model::{lookup_ci, CharacterName, DateKey, History, Snapshot, XpValue};

use super::types::*;

pub fn compute(
    roster: &[CharacterName],
    today: &Snapshot,
    previous: &Snapshot,
    clamp: ClampPolicy,
    window: ComparisonWindow,
) -> Report {
    let mut records = Vec::with_capacity(roster.len());

    for name in roster {
        let Some(now) = lookup_ci(today, name) else {
            records.push(GainRecord::errored(name, None));
            continue;
        };
        let Some(before) = lookup_ci(previous, name) else {
            records.push(GainRecord::first_seen(name, now));
            continue;
        };

        let raw = gain_between(before, now);
        let gain = match clamp {
            ClampPolicy::ClampToZero if raw < 0 => {
                logw!("{name}: XP went down ({before} -> {now}); counting as 0");
                0
            }
            _ => raw,
        };
        records.push(GainRecord::comparable(name, gain, Some(now)));
    }

    rank(window, records)
}

/// `now - before`, saturating at the `i64` bounds.
fn gain_between(before: XpValue, now: XpValue) -> i64 {
    let diff = i128::from(now) - i128::from(before);
    i64::try_from(diff).unwrap_or(if diff > 0 { i64::MAX } else { i64::MIN })
}

/// Order records and hand out places. Comparable first by gain (desc);
/// `sort_by` is stable, so ties keep input (roster) order. FirstSeen and
/// Errored follow, each group in input order.
pub fn rank(window: ComparisonWindow, records: Vec<GainRecord>) -> Report {
    let mut comparable = Vec::new();
    let mut first_seen = Vec::new();
    let mut errored = Vec::new();
    for mut r in records {
        r.place = None;
        match r.status {
            Status::Comparable => comparable.push(r),
            Status::FirstSeen => first_seen.push(r),
            Status::Errored => errored.push(r),
        }
    }

    comparable.sort_by(|a, b| b.gain.unwrap_or(0).cmp(&a.gain.unwrap_or(0)));
    for (i, r) in comparable.iter_mut().enumerate() {
        r.place = Place::from_index(i);
    }

    comparable.extend(first_seen);
    comparable.extend(errored);
    Report { window, records: comparable }
}

/// The snapshot today is measured against, with its date.
///
/// - `PreviousDay`: newest entry strictly before `today`.
/// - `LastValue`: newest entry on or before `today`.
///
/// Entries dated after `today` (clock skew, `--date` backfills) are never used.
pub fn previous_for<'h>(
    history: &'h History,
    today: &str,
    compare: CompareWith,
) -> Option<(&'h DateKey, &'h Snapshot)> {
    let mut older = history
        .range::<str, _>((Bound::Unbounded, Bound::Included(today)))
        .rev();
    match compare {
        CompareWith::PreviousDay => older.find(|(k, _)| k.as_str() < today),
        CompareWith::LastValue => older.next(),
    }
}
