// src/engine/types.rs
use crate::model::{CharacterName, DateKey, XpValue};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// Present today and in the previous snapshot.
    Comparable,
    /// Fetched today, never stored before.
    FirstSeen,
    /// Fetch failed or character missing upstream.
    Errored,
}

/// Podium decoration for the top three comparable entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Place { First, Second, Third }

impl Place {
    pub fn from_index(i: usize) -> Option<Place> {
        match i {
            0 => Some(Place::First),
            1 => Some(Place::Second),
            2 => Some(Place::Third),
            _ => None,
        }
    }

    pub fn medal(self) -> &'static str {
        match self {
            Place::First => "🥇",
            Place::Second => "🥈",
            Place::Third => "🥉",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GainRecord {
    pub name: CharacterName,
    /// `Some` iff `status == Comparable`.
    pub gain: Option<i64>,
    pub status: Status,
    pub place: Option<Place>,
    /// Today's value, when fetched.
    pub current: Option<XpValue>,
    /// Why the record is `Errored`.
    pub error: Option<String>,
}

impl GainRecord {
    pub fn comparable(name: &str, gain: i64, current: Option<XpValue>) -> Self {
        Self { name: name.to_string(), gain: Some(gain), status: Status::Comparable, place: None, current, error: None }
    }

    pub fn first_seen(name: &str, current: XpValue) -> Self {
        Self { name: name.to_string(), gain: None, status: Status::FirstSeen, place: None, current: Some(current), error: None }
    }

    pub fn errored(name: &str, error: Option<String>) -> Self {
        Self { name: name.to_string(), gain: None, status: Status::Errored, place: None, current: None, error }
    }
}

/// What the numbers in a report are measured against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ComparisonWindow {
    Between { from: DateKey, to: DateKey },
    SinceLastKnown { to: DateKey },
    Daily { date: DateKey },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
    pub window: ComparisonWindow,
    /// Comparable by gain (desc, stable), then FirstSeen, then Errored.
    pub records: Vec<GainRecord>,
}

impl Report {
    pub fn count(&self, status: Status) -> usize {
        self.records.iter().filter(|r| r.status == status).count()
    }

    /// False when every record is `Errored`: nothing worth sending.
    pub fn is_reportable(&self) -> bool {
        self.records.iter().any(|r| r.status != Status::Errored)
    }
}
