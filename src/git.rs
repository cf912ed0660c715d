//! Git operations and repository management.

pub mod commit;
pub mod repository;
pub mod rewrite;

pub use commit::{CommitInfo, FileChange, FileStatus};
pub use repository::GitRepository;

/// Number of hex characters to show in abbreviated commit hashes.
pub const SHORT_HASH_LEN: usize = 8;
