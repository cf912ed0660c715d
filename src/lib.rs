//! # git-squash
//!
//! Squashes a linear run of granular commits into fewer, date-grouped
//! commits with drafted messages.
//!
//! ## Pipeline
//!
//! - [`git::GitRepository::read_history`] reads commits oldest-first.
//! - [`squash::analyze`] buckets them into size-bounded, same-date groups.
//! - [`squash::plan`] drafts a message per group through a
//!   [`squash::Summarizer`], retrying and falling back as needed.
//! - [`squash::RewriteExecutor`] previews or writes the squashed branch.
//!
//! ## Quick Start
//!
//! ```rust
//! use git_squash::config::SquashConfig;
//! use git_squash::squash::analyze;
//!
//! let groups = analyze(&[], &SquashConfig::default());
//! assert!(groups.is_empty());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod claude;
pub mod cli;
pub mod config;
pub mod data;
pub mod git;
pub mod squash;
pub mod utils;

pub use crate::cli::Cli;

/// The current version of git-squash.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
