//! # relnotes
//!
//! Turns repository activity between two release points (closed issues,
//! finished pull requests, comments, commits, and timeline events) into a
//! structured, markdown-formatted changelog.
//!
//! Maintainers define thematic chapters keyed by issue/PR labels; every
//! closed issue and unlinked pull request is classified into matching
//! chapters, and completeness anomalies (missing PR links, missing labels,
//! missing curated notes) are collected into warning sections.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod github;
pub mod notes;

pub use crate::cli::Cli;

/// The current version of relnotes.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
