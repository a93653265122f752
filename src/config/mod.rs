// src/config/mod.rs

pub mod consts;
pub mod file;
pub mod options;

pub use options::{
    ClampPolicy, CommitOptions, CompareWith, Config, ConfigError, CorruptStatePolicy,
    SourceKind, StoreLayout,
};
