//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module reads the TOML file that lists which devices the
//! service creates at startup, and falls back to a single U2F device when the
//! file does not exist yet (first run).

pub mod config;
