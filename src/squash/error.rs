//! Error types for the squash pipeline.

use thiserror::Error;

/// Fatal input and configuration errors.
///
/// These abort the run before anything in the repository changes.
#[derive(Error, Debug)]
pub enum SquashError {
    /// Start date could not be parsed.
    #[error("Invalid date '{0}'. Expected YYYY-MM-DD")]
    InvalidDate(String),

    /// No repository at the requested location.
    #[error("Git repository not found at {0}")]
    RepositoryNotFound(String),

    /// The requested range holds no commits.
    #[error("No commits found in range {0}")]
    NoCommitsInRange(String),

    /// No commit falls inside the start/end date window.
    #[error("No commits dated {0}")]
    NoCommitsInDateWindow(String),

    /// A merge commit was found in the range.
    #[error("Commit {0} is a merge commit. Only linear history can be squashed")]
    NonLinearHistory(String),

    /// The commits inside the date window are not one unbroken run.
    #[error("Commits inside the date window must form one unbroken run; commit {0} breaks it")]
    NonContiguousSelection(String),

    /// Configuration rejected by validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Retryable failures from a summarization backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The service could not be reached, rejected the request, or timed out.
    #[error("Summarization backend unavailable: {0}")]
    Unavailable(String),

    /// The service answered but no message could be extracted.
    #[error("Malformed summarization response: {0}")]
    MalformedResponse(String),
}
