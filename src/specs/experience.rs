// src/specs/experience.rs
//! Scraping *spec* for a character's experience history page.
//!
//! Purpose:
//! - GET `<base>/character?name=Name+With+Spaces`.
//! - Find the experience table (`<table class="chart_table">` by default).
//! - Each data row: date in the first cell (first whitespace token, e.g.
//!   `2025-06-14` out of `2025-06-14 Sat`) and the XP gained that day in the
//!   second. Column positions come from [`HtmlSource`].
//! - A cumulative-experience column is only read when `total_col` is set;
//!   without it the page serves daily gains but not tracking.
//!
//! Non-Responsibilities:
//! - No delays, no retries, no caching.
//!
//! Rows whose first cell is not an ISO date (totals, footers) are ignored.

use reqwest::blocking::Client;

use crate::config::consts::CHARACTER_PATH;
use crate::config::options::HtmlSource;
use crate::core::html::{find_table_by_class, table_rows};
use crate::core::net::{self, NetError};
use crate::core::sanitize::parse_xp_number;
use crate::model::{parse_date_key, DateKey, XpValue};

use super::{DailyGainSource, FetchError, Fetcher, Observation};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpRow {
    pub date: DateKey,
    pub gained: Option<i64>,
    pub total: Option<XpValue>,
}

pub struct HtmlTableFetcher {
    client: Client,
    src: HtmlSource,
}

impl HtmlTableFetcher {
    pub fn new(src: HtmlSource) -> Result<Self, NetError> {
        Ok(Self { client: net::client()?, src })
    }

    pub fn url_for(&self, name: &str) -> String {
        join!(self.src.base_url.trim_end_matches('/'), CHARACTER_PATH, &net::query_escape(name))
    }

    fn rows(&self, name: &str) -> Result<Vec<ExpRow>, FetchError> {
        let doc = net::http_get(&self.client, &self.url_for(name))?;
        let rows = parse_experience_table(&doc, &self.src)?;
        logd!("{name}: {} experience rows", rows.len());
        Ok(rows)
    }
}

impl Fetcher for HtmlTableFetcher {
    fn fetch(&self, name: &str) -> Result<Observation, FetchError> {
        if self.src.total_col.is_none() {
            return Err(FetchError::Unsupported(s!("no cumulative XP column configured ([html] total_col)")));
        }
        let rows = self.rows(name)?;
        let experience = latest_total(&rows)
            .ok_or_else(|| FetchError::Parse(s!("no experience total in table")))?;
        Ok(Observation { reported_name: None, experience })
    }
}

impl DailyGainSource for HtmlTableFetcher {
    fn daily_gain(&self, name: &str, date: &str) -> Result<i64, FetchError> {
        let rows = self.rows(name)?;
        gain_on(&rows, date).ok_or_else(|| FetchError::NoRowForDate(date.to_string()))
    }
}

/// Pure parse of a fetched page.
/// Missing table means the site has no record of the character.
pub fn parse_experience_table(doc: &str, src: &HtmlSource) -> Result<Vec<ExpRow>, FetchError> {
    let table = find_table_by_class(doc, &src.table_class).ok_or(FetchError::NotFound)?;

    let mut out = Vec::new();
    for cells in table_rows(table) {
        let Some(date_cell) = cells.get(src.date_col) else { continue };
        let date = date_cell.split_whitespace().next().unwrap_or("");
        if parse_date_key(date).is_none() {
            continue;
        }
        let gained = cells.get(src.gained_col).and_then(|c| parse_xp_number(c));
        let total = src
            .total_col
            .and_then(|col| cells.get(col))
            .and_then(|c| parse_xp_number(c))
            .and_then(|v| u64::try_from(v).ok());
        out.push(ExpRow { date: date.to_string(), gained, total });
    }
    Ok(out)
}

/// Cumulative total on the most recent date that has one.
pub fn latest_total(rows: &[ExpRow]) -> Option<XpValue> {
    rows.iter()
        .filter(|r| r.total.is_some())
        .max_by(|a, b| a.date.cmp(&b.date))
        .and_then(|r| r.total)
}

/// Gain recorded on exactly `date`.
pub fn gain_on(rows: &[ExpRow], date: &str) -> Option<i64> {
    rows.iter().find(|r| r.date == date).and_then(|r| r.gained)
}
