// src/scrape/mod.rs
mod scrape;

pub use scrape::{collect_daily_gains, collect_snapshot, fetch_all, Collected, Pace};
