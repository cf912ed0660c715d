//! Squash planning: grouping, message drafting, validation and rewriting.

pub mod analyzer;
pub mod backend;
pub mod error;
pub mod executor;
pub mod format;
pub mod planner;
pub mod types;
pub mod validator;

#[cfg(test)]
pub(crate) mod test_utils;

pub use analyzer::{analyze, categorize, select_commits};
pub use backend::{DeterministicSummarizer, LiveSummarizer, Summarizer};
pub use error::{BackendError, SquashError};
pub use executor::{
    derive_branch_name, ChangeSet, ExecutionReport, ExecutionStatus, HistoryWriter,
    RewriteExecutor,
};
pub use planner::plan;
pub use types::{
    ChangeCategory, CommitGroup, DraftMessage, PlanOutcome, SquashOperation, SquashPlan,
};
pub use validator::{validate, ValidationResult, Violation};
