//! Shared types, error model, configuration and HTTP client for labbook.
//!
//! This crate is the foundation depended on by all other labbook crates.
//! It provides:
//! - [`LabbookError`] — the unified error type
//! - Domain types ([`ArchivedPage`], [`ContentFragment`], [`PageOutcome`])
//! - Configuration ([`AppConfig`], [`RunConfig`], config loading)
//! - [`build_client`] — the one HTTP client used for every fetch

pub mod client;
pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use client::build_client;
pub use config::{
    AppConfig, HttpConfig, PathsConfig, RunConfig, SiteConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from,
};
pub use error::{LabbookError, Result};
pub use types::{ArchivedPage, ContentFragment, PageOutcome, TEMPLATE_PLACEHOLDER, label_for};
