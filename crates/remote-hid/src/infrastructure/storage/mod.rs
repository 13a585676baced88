//! Storage infrastructure: the TOML configuration file.
//!
//! The `config` sub-module reads `config.toml` from the platform config
//! directory (or an explicit path) and falls back to defaults when the file
//! does not exist yet.

pub mod config;
