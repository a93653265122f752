// src/engine/mod.rs

pub mod delta;
pub mod types;

pub use delta::{compute, previous_for, rank};
pub use types::*;
