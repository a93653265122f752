// src/lib.rs

#[macro_use]
pub mod macros;
#[macro_use]
pub mod log;

pub mod cli;
pub mod config;
pub mod core;
pub mod engine;
pub mod model;
pub mod progress;
pub mod report;
pub mod roster;
pub mod runner;
pub mod scrape;
pub mod specs;
pub mod store;
