// src/report/render.rs
use crate::engine::{ComparisonWindow, GainRecord, Report, Status};

const FIRST_SEEN_MARK: &str = "🆕";
const ERROR_MARK: &str = "⚠️";

/// `1234567` → `1,234,567`; the sign is kept.
pub fn thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn header(window: &ComparisonWindow) -> String {
    match window {
        ComparisonWindow::Between { from, to } => format!("🏆 XP gains {from} → {to}"),
        ComparisonWindow::SinceLastKnown { to } => format!("🏆 XP gains since last known value ({to})"),
        ComparisonWindow::Daily { date } => format!("🏆 Daily XP gains for {date}"),
    }
}

pub fn render_line(r: &GainRecord) -> String {
    match r.status {
        Status::Comparable => {
            let body = format!("{}: {} XP", r.name, thousands(r.gain.unwrap_or(0)));
            match r.place {
                Some(p) => join!(p.medal(), " ", &body),
                None => body,
            }
        }
        Status::FirstSeen => match r.current {
            Some(xp) => format!(
                "{FIRST_SEEN_MARK} {}: first seen at {} XP (no earlier value)",
                r.name,
                thousands(xp as i64)
            ),
            None => format!("{FIRST_SEEN_MARK} {}: first seen (no earlier value)", r.name),
        },
        Status::Errored => match &r.error {
            Some(cause) => format!("{ERROR_MARK} {}: no data ({cause})", r.name),
            None => format!("{ERROR_MARK} {}: no data", r.name),
        },
    }
}

/// Header, then one line per record in report order.
pub fn render(report: &Report) -> String {
    let mut out = header(&report.window);
    for r in &report.records {
        out.push('\n');
        out.push_str(&render_line(r));
    }
    out
}

/// Lines without the header, for commit messages.
pub fn render_lines(report: &Report) -> Vec<String> {
    report.records.iter().map(render_line).collect()
}
