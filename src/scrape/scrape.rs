// src/scrape/scrape.rs
use std::{
    sync::{atomic::{AtomicUsize, Ordering}, mpsc},
    thread,
    time::Duration,
};

use crate::{
    config::Config,
    model::{same_name, CharacterName, Snapshot},
    progress::Progress,
    report::render::thousands,
    roster::Roster,
    specs::{DailyGainSource, FetchError, Fetcher},
};

/// Request pacing: worker cap plus a pause after every request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pace {
    pub workers: usize,
    pub pause_ms: u64,
    pub jitter_ms: u64,
}

impl Pace {
    pub fn from_config(cfg: &Config) -> Self {
        Self { workers: cfg.workers, pause_ms: cfg.pause_ms, jitter_ms: cfg.jitter_ms }
    }

    /// No waiting at all; for tests and offline sources.
    pub fn immediate() -> Self {
        Self { workers: 1, pause_ms: 0, jitter_ms: 0 }
    }

    fn delay_after(&self, i: usize) -> Duration {
        let jitter = if self.jitter_ms == 0 { 0 } else { (i as u64 * 37) % self.jitter_ms };
        Duration::from_millis(self.pause_ms + jitter)
    }
}

/// Run `op` once per name, at most `pace.workers` at a time.
/// Results come back in input order; one failure never stops the others.
/// `on_result` runs on the calling thread as results arrive.
pub fn fetch_all<T, F>(
    names: &[CharacterName],
    pace: Pace,
    op: F,
    mut on_result: impl FnMut(&str, &Result<T, FetchError>),
) -> Vec<Result<T, FetchError>>
where
    T: Send,
    F: Fn(&str) -> Result<T, FetchError> + Sync,
{
    let mut slots: Vec<Option<Result<T, FetchError>>> = names.iter().map(|_| None).collect();
    if names.is_empty() {
        return Vec::new();
    }

    let counter = AtomicUsize::new(0);
    let workers = pace.workers.min(names.len()).max(1);
    let (res_tx, res_rx) = mpsc::channel::<(usize, Result<T, FetchError>)>();

    thread::scope(|scope| {
        for _ in 0..workers {
            let tx = res_tx.clone();
            let (counter, op) = (&counter, &op);
            scope.spawn(move || {
                loop {
                    let i = counter.fetch_add(1, Ordering::Relaxed);
                    if i >= names.len() {
                        break;
                    }
                    let result = op(&names[i]);
                    if tx.send((i, result)).is_err() {
                        break;
                    }
                    if i + 1 < names.len() {
                        thread::sleep(pace.delay_after(i)); // be polite
                    }
                }
            });
        }
        drop(res_tx); // main thread is sole receiver now

        for (i, result) in res_rx.iter() {
            on_result(&names[i], &result);
            slots[i] = Some(result);
        }
    });

    slots
        .into_iter()
        .map(|s| s.unwrap_or_else(|| Err(FetchError::Parse(s!("worker ended early")))))
        .collect()
}

/// Today's observations for the whole roster.
#[derive(Debug, Default)]
pub struct Collected {
    pub snapshot: Snapshot,
    /// Failed characters with the reason, in roster order.
    pub errors: Vec<(CharacterName, String)>,
}

impl Collected {
    pub fn is_empty(&self) -> bool { self.snapshot.is_empty() }
}

pub fn collect_snapshot(
    roster: &Roster,
    fetcher: &dyn Fetcher,
    pace: Pace,
    mut progress: Option<&mut dyn Progress>,
) -> Collected {
    if let Some(p) = progress.as_deref_mut() {
        p.begin(roster.len());
    }

    let fetch_one = |name: &str| -> Result<u64, FetchError> {
        let obs = fetcher.fetch(name)?;
        match obs.reported_name {
            Some(reported) if !same_name(&reported, name) => Err(FetchError::NameMismatch {
                requested: name.to_string(),
                reported,
            }),
            _ => Ok(obs.experience),
        }
    };

    let results = fetch_all(roster.names(), pace, fetch_one, |name, result| {
        match result {
            Ok(xp) => {
                logf!("{name}: {xp} XP");
                if let Some(p) = progress.as_deref_mut() {
                    p.item_done(name, &join!(&thousands(*xp as i64), " XP"));
                }
            }
            Err(e) => {
                if e.is_rate_limited() {
                    logw!("{name}: rate limited upstream");
                }
                loge!("{name}: {e}");
                if let Some(p) = progress.as_deref_mut() {
                    p.item_failed(name, &e.to_string());
                }
            }
        }
    });

    if let Some(p) = progress.as_deref_mut() {
        p.finish();
    }

    let mut out = Collected::default();
    for (name, result) in roster.names().iter().zip(results) {
        match result {
            Ok(xp) => { out.snapshot.insert(name.clone(), xp); }
            Err(e) => out.errors.push((name.clone(), e.to_string())),
        }
    }
    out
}

/// Per-character gain on `date` as published by the source, in roster order.
pub fn collect_daily_gains(
    roster: &Roster,
    source: &dyn DailyGainSource,
    date: &str,
    pace: Pace,
    mut progress: Option<&mut dyn Progress>,
) -> Vec<(CharacterName, Result<i64, String>)> {
    if let Some(p) = progress.as_deref_mut() {
        p.begin(roster.len());
    }

    let results = fetch_all(roster.names(), pace, |name| source.daily_gain(name, date), |name, result| {
        match result {
            Ok(gain) => {
                logf!("{name}: {gain} XP on {date}");
                if let Some(p) = progress.as_deref_mut() {
                    p.item_done(name, &format!("{} XP on {date}", thousands(*gain)));
                }
            }
            Err(e) => {
                loge!("{name}: {e}");
                if let Some(p) = progress.as_deref_mut() {
                    p.item_failed(name, &e.to_string());
                }
            }
        }
    });

    if let Some(p) = progress.as_deref_mut() {
        p.finish();
    }

    roster
        .names()
        .iter()
        .cloned()
        .zip(results.into_iter().map(|r| r.map_err(|e| e.to_string())))
        .collect()
}
