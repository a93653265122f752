// src/cli.rs
use std::{env, path::PathBuf};

use crate::config::{file, Config, ConfigError};
use crate::progress::ConsoleProgress;
use crate::runner::{self, RunError, RunOutcome, RunSummary, Services};

const HELP: &str = include_str!("cli_help.txt");

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Fetch, store, compare, notify.
    Track,
    /// Stateless: report the source's own gains for one day.
    DailyGains,
    Help,
}

#[derive(Debug)]
pub struct Invocation {
    pub command: Command,
    pub config: Config,
}

/// Parse args, load the config file and environment, run.
/// `Ok(None)` when only help was printed.
pub fn run() -> Result<Option<RunSummary>, RunError> {
    let inv = parse_args(env::args().skip(1), |k| env::var(k).ok())?;
    let cfg = &inv.config;

    let summary = match inv.command {
        Command::Help => {
            eprintln!("{HELP}");
            return Ok(None);
        }
        Command::Track => {
            let fetcher = runner::build_fetcher(cfg)?;
            let notifier = runner::build_notifier(cfg)?;
            let hook = runner::build_hook(cfg);
            let services = Services {
                fetcher: fetcher.as_ref(),
                notifier: notifier.as_ref(),
                hook: hook.as_deref(),
            };
            let mut progress = ConsoleProgress::new();
            runner::run(cfg, &services, Some(&mut progress))?
        }
        Command::DailyGains => {
            let source = runner::build_daily_source(cfg)?;
            let notifier = runner::build_notifier(cfg)?;
            let mut progress = ConsoleProgress::new();
            runner::run_daily_gains(cfg, &source, notifier.as_ref(), Some(&mut progress))?
        }
    };

    println!("{}", outcome_line(&summary.outcome));
    Ok(Some(summary))
}

pub fn outcome_line(outcome: &RunOutcome) -> &'static str {
    match outcome {
        RunOutcome::EmptyRoster => "No characters in roster.",
        RunOutcome::NothingFetched => "No data scraped for any characters.",
        RunOutcome::Unchanged => "No XP changes.",
        RunOutcome::InsufficientHistory => "XP data saved; nothing earlier to compare with yet.",
        RunOutcome::NothingToReport => "Nothing to report.",
        RunOutcome::Reported { delivered: true } => "✅ Report sent.",
        RunOutcome::Reported { delivered: false } => "❌ Report could not be delivered.",
    }
}

/// Defaults, then the TOML file, then `env`, then flags.
pub fn parse_args<I, F>(args: I, env: F) -> Result<Invocation, ConfigError>
where
    I: IntoIterator<Item = String>,
    F: Fn(&str) -> Option<String>,
{
    let args: Vec<String> = args.into_iter().collect();

    let explicit = match args.iter().position(|a| a == "--config") {
        Some(i) => Some(PathBuf::from(
            args.get(i + 1).ok_or_else(|| usage("Missing value for --config"))?,
        )),
        None => None,
    };

    let mut config = Config::default();
    if let Some(fc) = file::load(explicit.as_deref())? {
        fc.apply(&mut config);
    }
    config.apply_env(env)?;

    let mut command = Command::Track;
    let mut it = args.into_iter();
    while let Some(a) = it.next() {
        let mut value = |flag: &str| it.next().ok_or_else(|| usage(&format!("Missing value for {flag}")));
        match a.as_str() {
            "--config" => { value("--config")?; }
            "--roster" | "-r" => config.roster_path = PathBuf::from(value("--roster")?),
            "--state" | "-s" => config.state_path = PathBuf::from(value("--state")?),
            "--layout" => config.layout = value("--layout")?.parse()?,
            "--compare" => config.compare_with = value("--compare")?.parse()?,
            "--keep-negative" => config.clamp = crate::config::ClampPolicy::Keep,
            "--on-corrupt" => config.on_corrupt_state = value("--on-corrupt")?.parse()?,
            "--source" => config.source = value("--source")?.parse()?,
            "--webhook" => config.webhook_url = Some(value("--webhook")?),
            "--workers" | "-j" => {
                let v = value("--workers")?;
                config.workers = v
                    .parse()
                    .map_err(|_| ConfigError::Invalid { key: "workers", value: v })?;
            }
            "--date" => config.set_date(&value("--date")?)?,
            "--dry-run" | "-n" => config.dry_run = true,
            "--commit" => config.commit.enabled = true,
            "--push" => {
                config.commit.enabled = true;
                config.commit.push = true;
            }
            "--daily-gains" => command = Command::DailyGains,
            "-h" | "--help" => command = Command::Help,
            _ => return Err(usage(&format!("Unknown arg: {a}"))),
        }
    }

    if command != Command::Help {
        config.validate()?;
    }
    Ok(Invocation { command, config })
}

fn usage(msg: &str) -> ConfigError {
    ConfigError::Usage(msg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClampPolicy, CompareWith, StoreLayout};

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn no_env(_: &str) -> Option<String> { None }

    #[test]
    fn flags_override_env() {
        let env = |k: &str| (k == "XP_STATE").then(|| s!("from_env.json"));
        let inv = parse_args(
            args(&["--state", "cli.json", "--layout", "flat", "--compare", "last-value", "--keep-negative"]),
            env,
        )
        .unwrap();
        assert_eq!(inv.command, Command::Track);
        assert_eq!(inv.config.state_path, PathBuf::from("cli.json"));
        assert_eq!(inv.config.layout, StoreLayout::Flat);
        assert_eq!(inv.config.compare_with, CompareWith::LastValue);
        assert_eq!(inv.config.clamp, ClampPolicy::Keep);
    }

    #[test]
    fn env_applies_when_no_flag() {
        let env = |k: &str| (k == "DISCORD_WEBHOOK_URL").then(|| s!("https://hooks.test/x"));
        let inv = parse_args(args(&[]), env).unwrap();
        assert_eq!(inv.config.webhook_url.as_deref(), Some("https://hooks.test/x"));
    }

    #[test]
    fn push_implies_commit_and_daily_mode_parses() {
        let inv = parse_args(args(&["--push", "--daily-gains", "--date", "2025-06-13"]), no_env).unwrap();
        assert!(inv.config.commit.enabled && inv.config.commit.push);
        assert_eq!(inv.command, Command::DailyGains);
        assert_eq!(inv.config.date.map(crate::model::date_key).as_deref(), Some("2025-06-13"));
    }

    #[test]
    fn bad_input_is_rejected() {
        assert!(matches!(parse_args(args(&["--bogus"]), no_env), Err(ConfigError::Usage(_))));
        assert!(matches!(parse_args(args(&["--state"]), no_env), Err(ConfigError::Usage(_))));
        assert!(matches!(
            parse_args(args(&["--workers", "0"]), no_env),
            Err(ConfigError::Invalid { key: "workers", .. })
        ));
        assert!(matches!(
            parse_args(args(&["--date", "14/06/2025"]), no_env),
            Err(ConfigError::Invalid { key: "date", .. })
        ));
        assert!(matches!(
            parse_args(args(&["--webhook", "ftp://nope"]), no_env),
            Err(ConfigError::Invalid { key: "webhook", .. })
        ));
    }

    #[test]
    fn missing_explicit_config_file_is_an_error() {
        let r = parse_args(args(&["--config", "/definitely/not/here.toml"]), no_env);
        assert!(matches!(r, Err(ConfigError::Read { .. })));
    }
}
