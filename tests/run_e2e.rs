// tests/run_e2e.rs
//
// Whole runs against fake collaborators: no network, real files.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use xp_tracker::config::{CompareWith, Config, StoreLayout};
use xp_tracker::engine::Status;
use xp_tracker::model::{date_key, parse_date_key};
use xp_tracker::report::{Ack, HookError, Notifier, NotifyError, PostSaveHook, SaveSummary};
use xp_tracker::runner::{run, run_daily_gains, RunError, RunOutcome, Services};
use xp_tracker::specs::{DailyGainSource, FetchError, Fetcher, Observation};

/* ---------------- fakes ---------------- */

#[derive(Default)]
struct FakeFetcher {
    xp: HashMap<String, u64>,
    /// name -> what the source claims the character is called
    reported: HashMap<String, String>,
}

impl FakeFetcher {
    fn with(pairs: &[(&str, u64)]) -> Self {
        Self { xp: pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect(), ..Self::default() }
    }
}

impl Fetcher for FakeFetcher {
    fn fetch(&self, name: &str) -> Result<Observation, FetchError> {
        let experience = *self.xp.get(name).ok_or(FetchError::NotFound)?;
        Ok(Observation { reported_name: self.reported.get(name).cloned(), experience })
    }
}

struct FakeDaily(HashMap<String, i64>);

impl DailyGainSource for FakeDaily {
    fn daily_gain(&self, name: &str, date: &str) -> Result<i64, FetchError> {
        self.0.get(name).copied().ok_or_else(|| FetchError::NoRowForDate(date.to_string()))
    }
}

#[derive(Default)]
struct RecordingNotifier {
    sent: RefCell<Vec<String>>,
    fail: bool,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, text: &str) -> Result<Ack, NotifyError> {
        if self.fail {
            return Err(NotifyError::Empty);
        }
        self.sent.borrow_mut().push(text.to_string());
        Ok(Ack { status: 204, parts: 1 })
    }
}

#[derive(Default)]
struct RecordingHook {
    calls: RefCell<Vec<(PathBuf, SaveSummary)>>,
    fail: bool,
}

impl PostSaveHook for RecordingHook {
    fn after_save(&self, path: &Path, summary: &SaveSummary) -> Result<(), HookError> {
        self.calls.borrow_mut().push((path.to_path_buf(), summary.clone()));
        if self.fail {
            return Err(HookError::Failed {
                program: "git".into(),
                step: "push".into(),
                code: Some(1),
                stderr: "rejected".into(),
            });
        }
        Ok(())
    }
}

/* ---------------- helpers ---------------- */

struct Env {
    _dir: tempfile::TempDir,
    cfg: Config,
}

fn env(roster: &str, date: Option<&str>) -> Env {
    let dir = tempfile::tempdir().unwrap();
    let roster_path = dir.path().join("characters.txt");
    fs::write(&roster_path, roster).unwrap();
    let cfg = Config {
        roster_path,
        state_path: dir.path().join("xp_log.json"),
        date: date.and_then(parse_date_key),
        pause_ms: 0,
        jitter_ms: 0,
        ..Config::default()
    };
    Env { _dir: dir, cfg }
}

fn on(cfg: &Config, date: &str) -> Config {
    Config { date: parse_date_key(date), ..cfg.clone() }
}

fn services<'a>(f: &'a dyn Fetcher, n: &'a dyn Notifier, h: Option<&'a dyn PostSaveHook>) -> Services<'a> {
    Services { fetcher: f, notifier: n, hook: h }
}

/* ---------------- tracking runs ---------------- */

#[test]
fn first_run_saves_baseline_without_notifying() {
    let e = env("A\nB\n", Some("2025-06-13"));
    let notifier = RecordingNotifier::default();
    let fetcher = FakeFetcher::with(&[("A", 100), ("B", 200)]);

    let s = run(&e.cfg, &services(&fetcher, &notifier, None), None).unwrap();
    assert_eq!(s.outcome, RunOutcome::InsufficientHistory);
    assert!(s.saved);
    assert!(notifier.sent.borrow().is_empty());

    let text = fs::read_to_string(&e.cfg.state_path).unwrap();
    let on_disk: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(on_disk["2025-06-13"]["A"], 100);
}

#[test]
fn second_day_reports_the_reference_example() {
    let e = env("A\nB\nC\n", None);
    let notifier = RecordingNotifier::default();

    let day1 = on(&e.cfg, "2025-06-13");
    run(&day1, &services(&FakeFetcher::with(&[("A", 100), ("B", 200)]), &notifier, None), None).unwrap();

    let day2 = on(&e.cfg, "2025-06-14");
    let fetcher = FakeFetcher::with(&[("A", 150), ("B", 180), ("C", 50)]);
    let s = run(&day2, &services(&fetcher, &notifier, None), None).unwrap();

    assert_eq!(s.outcome, RunOutcome::Reported { delivered: true });
    let sent = notifier.sent.borrow();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0],
        "🏆 XP gains 2025-06-13 → 2025-06-14\n\
         🥇 A: 50 XP\n\
         🥈 B: 0 XP\n\
         🆕 C: first seen at 50 XP (no earlier value)"
    );

    let history: xp_tracker::model::History =
        serde_json::from_str(&fs::read_to_string(&e.cfg.state_path).unwrap()).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history["2025-06-14"]["C"], 50);
}

#[test]
fn rerun_with_same_data_is_a_no_op() {
    let e = env("A\nB\n", None);
    let notifier = RecordingNotifier::default();
    let hook = RecordingHook::default();

    run(&on(&e.cfg, "2025-06-13"), &services(&FakeFetcher::with(&[("A", 100), ("B", 200)]), &notifier, None), None)
        .unwrap();
    let day2 = on(&e.cfg, "2025-06-14");
    let fetcher = FakeFetcher::with(&[("A", 150), ("B", 210)]);
    run(&day2, &services(&fetcher, &notifier, Some(&hook)), None).unwrap();

    let before = fs::read(&e.cfg.state_path).unwrap();
    let s = run(&day2, &services(&fetcher, &notifier, Some(&hook)), None).unwrap();

    assert_eq!(s.outcome, RunOutcome::Unchanged);
    assert!(!s.saved);
    assert_eq!(fs::read(&e.cfg.state_path).unwrap(), before);
    assert_eq!(notifier.sent.borrow().len(), 1);
    assert_eq!(hook.calls.borrow().len(), 1);
}

#[test]
fn same_day_rerun_with_a_failed_fetch_keeps_todays_values() {
    let e = env("A\nB\n", None);
    let notifier = RecordingNotifier::default();

    run(&on(&e.cfg, "2025-06-13"), &services(&FakeFetcher::with(&[("A", 100), ("B", 200)]), &notifier, None), None)
        .unwrap();
    let day2 = on(&e.cfg, "2025-06-14");
    run(&day2, &services(&FakeFetcher::with(&[("A", 150), ("B", 250)]), &notifier, None), None).unwrap();
    assert_eq!(notifier.sent.borrow().len(), 1);

    // B fails on the re-run; A is unchanged, so the merged entry is too.
    let s = run(&day2, &services(&FakeFetcher::with(&[("A", 150)]), &notifier, None), None).unwrap();
    assert_eq!(s.outcome, RunOutcome::Unchanged);
    assert_eq!(notifier.sent.borrow().len(), 1);

    let history: xp_tracker::model::History =
        serde_json::from_str(&fs::read_to_string(&e.cfg.state_path).unwrap()).unwrap();
    assert_eq!(history["2025-06-14"]["B"], 250);

    let s = run(
        &on(&e.cfg, "2025-06-15"),
        &services(&FakeFetcher::with(&[("A", 160), ("B", 260)]), &notifier, None),
        None,
    )
    .unwrap();
    let msg = s.message.unwrap();
    assert!(msg.contains("🥇 A: 10 XP"), "{msg}");
    assert!(msg.contains("🥈 B: 10 XP"), "{msg}");
    assert!(!msg.contains("first seen"), "{msg}");
}

#[test]
fn same_day_rerun_with_new_values_keeps_unfetched_ones() {
    let e = env("A\nB\n", None);
    let notifier = RecordingNotifier::default();
    let day = on(&e.cfg, "2025-06-14");

    run(&day, &services(&FakeFetcher::with(&[("A", 100), ("B", 200)]), &notifier, None), None).unwrap();
    let s = run(&day, &services(&FakeFetcher::with(&[("A", 120)]), &notifier, None), None).unwrap();
    assert!(s.saved);

    let history: xp_tracker::model::History =
        serde_json::from_str(&fs::read_to_string(&e.cfg.state_path).unwrap()).unwrap();
    assert_eq!(history["2025-06-14"]["A"], 120);
    assert_eq!(history["2025-06-14"]["B"], 200);
}

#[test]
fn nothing_fetched_writes_nothing() {
    let e = env("A\nB\n", Some("2025-06-14"));
    let notifier = RecordingNotifier::default();

    let s = run(&e.cfg, &services(&FakeFetcher::default(), &notifier, None), None).unwrap();
    assert_eq!(s.outcome, RunOutcome::NothingFetched);
    assert!(!e.cfg.state_path.exists());
    assert!(notifier.sent.borrow().is_empty());
}

#[test]
fn empty_roster_is_not_an_error() {
    let e = env("# nobody yet\n\n", Some("2025-06-14"));
    let notifier = RecordingNotifier::default();
    let s = run(&e.cfg, &services(&FakeFetcher::default(), &notifier, None), None).unwrap();
    assert_eq!(s.outcome, RunOutcome::EmptyRoster);
}

#[test]
fn failed_character_is_listed_with_its_cause() {
    let e = env("A\nB\n", None);
    let notifier = RecordingNotifier::default();
    run(&on(&e.cfg, "2025-06-13"), &services(&FakeFetcher::with(&[("A", 100), ("B", 200)]), &notifier, None), None)
        .unwrap();

    let s = run(&on(&e.cfg, "2025-06-14"), &services(&FakeFetcher::with(&[("A", 130)]), &notifier, None), None)
        .unwrap();
    assert_eq!(s.outcome, RunOutcome::Reported { delivered: true });

    let report = s.report.unwrap();
    assert_eq!(report.count(Status::Errored), 1);
    let msg = s.message.unwrap();
    assert!(msg.contains("🥇 A: 30 XP"));
    assert!(msg.ends_with("⚠️ B: no data (character not found upstream)"), "{msg}");
}

#[test]
fn name_mismatch_counts_as_errored() {
    let e = env("A\n", Some("2025-06-14"));
    let notifier = RecordingNotifier::default();
    let mut fetcher = FakeFetcher::with(&[("A", 100)]);
    fetcher.reported.insert("A".into(), "Somebody Else".into());

    let s = run(&e.cfg, &services(&fetcher, &notifier, None), None).unwrap();
    assert_eq!(s.outcome, RunOutcome::NothingFetched);
}

#[test]
fn notify_failure_still_persists() {
    let e = env("A\n", None);
    let ok = RecordingNotifier::default();
    run(&on(&e.cfg, "2025-06-13"), &services(&FakeFetcher::with(&[("A", 100)]), &ok, None), None).unwrap();

    let failing = RecordingNotifier { fail: true, ..Default::default() };
    let s = run(&on(&e.cfg, "2025-06-14"), &services(&FakeFetcher::with(&[("A", 140)]), &failing, None), None)
        .unwrap();
    assert_eq!(s.outcome, RunOutcome::Reported { delivered: false });
    assert!(s.saved);
    assert!(fs::read_to_string(&e.cfg.state_path).unwrap().contains("2025-06-14"));
}

#[test]
fn hook_gets_commit_summary_and_its_failure_is_swallowed() {
    let e = env("A\n", Some("2025-06-14"));
    let notifier = RecordingNotifier::default();
    let hook = RecordingHook { fail: true, ..Default::default() };

    let s = run(&e.cfg, &services(&FakeFetcher::with(&[("A", 1)]), &notifier, Some(&hook)), None).unwrap();
    assert_eq!(s.outcome, RunOutcome::InsufficientHistory);

    let calls = hook.calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, e.cfg.state_path);
    assert!(calls[0].1.commit_message().starts_with("Daily XP update 2025-06-14"));
}

#[test]
fn dry_run_notifies_but_never_writes() {
    let e = env("A\n", Some("2025-06-14"));
    fs::write(&e.cfg.state_path, "{\n  \"2025-06-13\": {\n    \"A\": 10\n  }\n}\n").unwrap();
    let before = fs::read(&e.cfg.state_path).unwrap();

    let cfg = Config { dry_run: true, ..e.cfg.clone() };
    let notifier = RecordingNotifier::default();
    let s = run(&cfg, &services(&FakeFetcher::with(&[("A", 25)]), &notifier, None), None).unwrap();

    assert_eq!(s.outcome, RunOutcome::Reported { delivered: true });
    assert!(!s.saved);
    assert_eq!(fs::read(&e.cfg.state_path).unwrap(), before);
}

#[test]
fn stored_names_match_roster_case_insensitively() {
    let e = env("Hex Good\n", Some("2025-06-14"));
    fs::write(&e.cfg.state_path, r#"{"2025-06-13": {"hex good": 1000}}"#).unwrap();
    let notifier = RecordingNotifier::default();

    let s = run(&e.cfg, &services(&FakeFetcher::with(&[("Hex Good", 1500)]), &notifier, None), None).unwrap();
    assert!(s.message.unwrap().contains("🥇 Hex Good: 500 XP"));
}

#[test]
fn corrupt_state_aborts_the_run() {
    let e = env("A\n", Some("2025-06-14"));
    fs::write(&e.cfg.state_path, "not json").unwrap();
    let notifier = RecordingNotifier::default();

    let err = run(&e.cfg, &services(&FakeFetcher::with(&[("A", 1)]), &notifier, None), None).unwrap_err();
    assert!(matches!(err, RunError::State(_)));
    assert_eq!(fs::read_to_string(&e.cfg.state_path).unwrap(), "not json");
}

#[test]
fn missing_roster_is_an_error() {
    let e = env("", None);
    let cfg = Config { roster_path: e.cfg.roster_path.with_file_name("nope.txt"), ..e.cfg.clone() };
    let notifier = RecordingNotifier::default();
    let err = run(&cfg, &services(&FakeFetcher::default(), &notifier, None), None).unwrap_err();
    assert!(matches!(err, RunError::Roster(_)));
}

#[test]
fn flat_layout_carries_forward_failed_characters() {
    // Flat files date their one snapshot by write time, so run on "today".
    let e = env("A\nB\n", None);
    let cfg = Config { layout: StoreLayout::Flat, compare_with: CompareWith::LastValue, ..e.cfg.clone() };
    fs::write(&cfg.state_path, r#"{"A": 100, "B": 200}"#).unwrap();
    let notifier = RecordingNotifier::default();

    let s = run(&cfg, &services(&FakeFetcher::with(&[("A", 150)]), &notifier, None), None).unwrap();
    assert_eq!(s.outcome, RunOutcome::Reported { delivered: true });

    let on_disk: HashMap<String, u64> =
        serde_json::from_str(&fs::read_to_string(&cfg.state_path).unwrap()).unwrap();
    assert_eq!(on_disk, HashMap::from([("A".to_string(), 150), ("B".to_string(), 200)]));

    let msg = s.message.unwrap();
    assert!(msg.starts_with(&format!("🏆 XP gains since last known value ({})", date_key(cfg.today()))));
    assert!(msg.contains("🥇 A: 50 XP"));
}

/* ---------------- daily gains ---------------- */

#[test]
fn daily_gains_ranks_and_lists_missing_rows() {
    let e = env("Low\nHigh\nGone\nTie\n", Some("2025-06-13"));
    let source = FakeDaily(HashMap::from([
        ("Low".to_string(), 10),
        ("High".to_string(), 5_000),
        ("Tie".to_string(), 10),
    ]));
    let notifier = RecordingNotifier::default();

    let s = run_daily_gains(&e.cfg, &source, &notifier, None).unwrap();
    assert_eq!(s.outcome, RunOutcome::Reported { delivered: true });
    assert!(!e.cfg.state_path.exists());
    assert_eq!(
        notifier.sent.borrow()[0],
        "🏆 Daily XP gains for 2025-06-13\n\
         🥇 High: 5,000 XP\n\
         🥈 Low: 10 XP\n\
         🥉 Tie: 10 XP\n\
         ⚠️ Gone: no data (no XP data for 2025-06-13)"
    );
}

#[test]
fn daily_gains_with_no_rows_sends_nothing() {
    let e = env("A\n", Some("2025-06-13"));
    let notifier = RecordingNotifier::default();
    let s = run_daily_gains(&e.cfg, &FakeDaily(HashMap::new()), &notifier, None).unwrap();
    assert_eq!(s.outcome, RunOutcome::NothingToReport);
    assert!(notifier.sent.borrow().is_empty());
}
