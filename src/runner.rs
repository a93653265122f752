// src/runner.rs
//
// One tracking run, start to finish:
//   roster → history → fetch → previous → upsert → report → save → hook → notify
//
// Fetch failures, hook failures and notify failures never fail the run.
// Only configuration, roster and state problems do.

use chrono::Duration;
use thiserror::Error;

use crate::{
    config::{ClampPolicy, CompareWith, Config, ConfigError, SourceKind, StoreLayout},
    core::net::NetError,
    engine::{compute, previous_for, rank, ComparisonWindow, GainRecord, Report, Status},
    model::{date_key, remove_ci, DateKey, Snapshot},
    progress::Progress,
    report::{
        render, render_lines, CommandHook, GitCommitHook, Notifier, PostSaveHook, SaveSummary,
        StdoutNotifier, WebhookNotifier,
    },
    roster::{Roster, RosterError},
    scrape::{collect_daily_gains, collect_snapshot, Collected, Pace},
    specs::{DailyGainSource, Fetcher, HtmlTableFetcher, JsonApiFetcher},
    store::{StateError, Store},
};

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Roster(#[from] RosterError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error("cannot set up HTTP client: {0}")]
    Net(#[from] NetError),
}

/// How a run ended. All of these are success.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// Roster file had no names.
    EmptyRoster,
    /// Every fetch failed; nothing written.
    NothingFetched,
    /// Today's snapshot was already stored; nothing written or sent.
    Unchanged,
    /// Saved, but there was nothing earlier to compare against.
    InsufficientHistory,
    /// Every record errored; nothing sent.
    NothingToReport,
    /// Report rendered and handed to the notifier.
    Reported { delivered: bool },
}

/// What a run produced, for the CLI and tests.
#[derive(Clone, Debug)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub report: Option<Report>,
    /// The message as rendered, when one was.
    pub message: Option<String>,
    pub saved: bool,
}

impl RunSummary {
    fn bare(outcome: RunOutcome) -> Self {
        Self { outcome, report: None, message: None, saved: false }
    }
}

/// Collaborators a run talks to. The CLI builds real ones from `Config`;
/// tests pass fakes.
pub struct Services<'a> {
    pub fetcher: &'a dyn Fetcher,
    pub notifier: &'a dyn Notifier,
    pub hook: Option<&'a dyn PostSaveHook>,
}

pub fn run(
    cfg: &Config,
    services: &Services<'_>,
    progress: Option<&mut dyn Progress>,
) -> Result<RunSummary, RunError> {
    let roster = Roster::load(&cfg.roster_path)?;
    if roster.is_empty() {
        logw!("roster {} has no names", cfg.roster_path.display());
        return Ok(RunSummary::bare(RunOutcome::EmptyRoster));
    }

    let store = Store::new(&cfg.state_path, cfg.layout, cfg.on_corrupt_state);
    let history = store.load()?;
    let today = date_key(cfg.today());

    let collected = collect_snapshot(&roster, services.fetcher, Pace::from_config(cfg), progress);
    if collected.is_empty() {
        logw!("no character could be fetched; state left alone");
        return Ok(RunSummary::bare(RunOutcome::NothingFetched));
    }

    let previous: Option<(DateKey, Snapshot)> = previous_for(&history, &today, cfg.compare_with)
        .map(|(k, s)| (k.clone(), s.clone()));

    // A recorded value is never dropped: a character that fails today keeps
    // what was already stored for today (dated) or last (flat).
    let stored = match cfg.layout {
        StoreLayout::Dated => history.get(&today),
        StoreLayout::Flat => history.values().next_back(),
    };
    let to_save = carry_forward(stored, &collected.snapshot);
    let (history, changed) = store.upsert(history, &today, to_save);
    if !changed {
        logf!("snapshot for {today} already stored; nothing to do");
        return Ok(RunSummary::bare(RunOutcome::Unchanged));
    }

    let window = match (&previous, cfg.compare_with) {
        (Some((from, _)), CompareWith::PreviousDay) => {
            ComparisonWindow::Between { from: from.clone(), to: today.clone() }
        }
        _ => ComparisonWindow::SinceLastKnown { to: today.clone() },
    };
    let empty = Snapshot::new();
    let before = previous.as_ref().map(|(_, s)| s).unwrap_or(&empty);
    let mut report = compute(roster.names(), &collected.snapshot, before, cfg.clamp, window);
    attach_errors(&mut report, &collected);
    log_records(&report);

    let saved = if cfg.dry_run {
        logf!("dry run: state not written");
        false
    } else {
        store.save(&history)?;
        if let Some(hook) = services.hook {
            let summary = SaveSummary { date: today.clone(), lines: render_lines(&report) };
            if let Err(e) = hook.after_save(store.path(), &summary) {
                logw!("post-save hook failed: {e}");
            }
        }
        true
    };

    let mut summary = RunSummary { outcome: RunOutcome::InsufficientHistory, report: None, message: None, saved };
    if previous.is_none() {
        logf!("no earlier snapshot to compare with; baseline saved");
    } else if !report.is_reportable() {
        logw!("every character errored; nothing to report");
        summary.outcome = RunOutcome::NothingToReport;
    } else {
        let text = render(&report);
        summary.outcome = RunOutcome::Reported { delivered: deliver(services.notifier, &text) };
        summary.message = Some(text);
    }
    summary.report = Some(report);
    Ok(summary)
}

/// Stateless mode: the source's own per-day gain for every character on
/// `cfg.date` (yesterday, UTC, by default), ranked and sent.
pub fn run_daily_gains(
    cfg: &Config,
    source: &dyn DailyGainSource,
    notifier: &dyn Notifier,
    progress: Option<&mut dyn Progress>,
) -> Result<RunSummary, RunError> {
    let roster = Roster::load(&cfg.roster_path)?;
    if roster.is_empty() {
        logw!("roster {} has no names", cfg.roster_path.display());
        return Ok(RunSummary::bare(RunOutcome::EmptyRoster));
    }

    let date = date_key(
        cfg.date.unwrap_or_else(|| chrono::Utc::now().date_naive() - Duration::days(1)),
    );
    let gains = collect_daily_gains(&roster, source, &date, Pace::from_config(cfg), progress);

    let records = gains
        .into_iter()
        .map(|(name, result)| match result {
            Ok(gain) if cfg.clamp == ClampPolicy::ClampToZero => {
                GainRecord::comparable(&name, gain.max(0), None)
            }
            Ok(gain) => GainRecord::comparable(&name, gain, None),
            Err(cause) => GainRecord::errored(&name, Some(cause)),
        })
        .collect();
    let report = rank(ComparisonWindow::Daily { date }, records);
    log_records(&report);

    let mut summary = RunSummary::bare(RunOutcome::NothingToReport);
    if report.is_reportable() {
        let text = render(&report);
        summary.outcome = RunOutcome::Reported { delivered: deliver(notifier, &text) };
        summary.message = Some(text);
    } else {
        logw!("no gains could be read; nothing to report");
    }
    summary.report = Some(report);
    Ok(summary)
}

/// Overlay today's fetched values on a stored snapshot. Names that were not
/// fetched (errored, or no longer on the roster) keep their stored value.
fn carry_forward(stored: Option<&Snapshot>, fetched: &Snapshot) -> Snapshot {
    let mut out = stored.cloned().unwrap_or_default();
    for (name, xp) in fetched {
        remove_ci(&mut out, name);
        out.insert(name.clone(), *xp);
    }
    out
}

fn attach_errors(report: &mut Report, collected: &Collected) {
    for r in report.records.iter_mut().filter(|r| r.status == Status::Errored) {
        r.error = collected
            .errors
            .iter()
            .find(|(name, _)| name == &r.name)
            .map(|(_, cause)| cause.clone())
            .or_else(|| Some(s!("not fetched")));
    }
}

fn log_records(report: &Report) {
    for r in &report.records {
        match r.status {
            Status::Comparable => logf!("{}: +{} XP", r.name, r.gain.unwrap_or(0)),
            Status::FirstSeen => logf!("{}: first seen at {} XP", r.name, r.current.unwrap_or(0)),
            Status::Errored => logw!("{}: errored ({})", r.name, r.error.as_deref().unwrap_or("unknown")),
        }
    }
    logf!(
        "{} comparable, {} first seen, {} errored",
        report.count(Status::Comparable),
        report.count(Status::FirstSeen),
        report.count(Status::Errored)
    );
}

fn deliver(notifier: &dyn Notifier, text: &str) -> bool {
    match notifier.notify(text) {
        Ok(ack) => {
            logf!("notification sent ({} part(s), status {})", ack.parts, ack.status);
            true
        }
        Err(e) => {
            loge!("notification failed: {e}");
            false
        }
    }
}

/* ---------------- building real collaborators from Config ---------------- */

/// Tracking needs cumulative XP. The HTML table only has it when a
/// `total_col` is configured.
pub fn build_fetcher(cfg: &Config) -> Result<Box<dyn Fetcher>, RunError> {
    if cfg.source == SourceKind::Html && cfg.html.total_col.is_none() {
        return Err(ConfigError::Usage(s!(
            "the experience table shows daily gains only; set [html] total_col, \
             use --source json, or run --daily-gains"
        ))
        .into());
    }
    Ok(match cfg.source {
        SourceKind::Html => Box::new(HtmlTableFetcher::new(cfg.html.clone())?),
        SourceKind::Json => Box::new(JsonApiFetcher::new(cfg.json.clone())?),
    })
}

/// Only the HTML table publishes a per-day gain column.
pub fn build_daily_source(cfg: &Config) -> Result<HtmlTableFetcher, RunError> {
    if cfg.source != SourceKind::Html {
        return Err(ConfigError::Usage(s!("daily gains need --source html")).into());
    }
    Ok(HtmlTableFetcher::new(cfg.html.clone())?)
}

/// Webhook when configured and not a dry run; stdout otherwise.
pub fn build_notifier(cfg: &Config) -> Result<Box<dyn Notifier>, RunError> {
    match (&cfg.webhook_url, cfg.dry_run) {
        (Some(url), false) => Ok(Box::new(WebhookNotifier::new(url.clone())?)),
        (None, false) => {
            logw!("no webhook configured; printing instead");
            Ok(Box::new(StdoutNotifier))
        }
        (_, true) => Ok(Box::new(StdoutNotifier)),
    }
}

pub fn build_hook(cfg: &Config) -> Option<Box<dyn PostSaveHook>> {
    let c = &cfg.commit;
    if !c.enabled {
        return None;
    }
    Some(match &c.command {
        Some(program) => Box::new(CommandHook { program: program.clone() }),
        None => Box::new(GitCommitHook {
            push: c.push,
            user_name: c.user_name.clone(),
            user_email: c.user_email.clone(),
            repo_dir: None,
        }),
    })
}
