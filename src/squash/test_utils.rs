//! Shared test fixtures for the `squash` module.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::DateTime;

use crate::config::SquashConfig;
use crate::git::{CommitInfo, FileChange, FileStatus};
use crate::squash::backend::{BackendFuture, Summarizer};
use crate::squash::error::BackendError;
use crate::squash::types::{CategorizedCommit, ChangeCategory, CommitGroup, DraftMessage, SquashPlan};
use crate::squash::validator::Violation;

/// A file change with `lines` additions.
pub(crate) fn file(path: &str, status: FileStatus, lines: usize) -> FileChange {
    FileChange {
        path: path.to_string(),
        status,
        additions: lines,
        deletions: 0,
    }
}

/// A commit with explicit files, dated by an RFC 3339 timestamp.
///
/// The parent hash is `parent-of-{hash}` so plans built from it have a base.
pub(crate) fn commit_with_files(
    hash: &str,
    rfc3339: &str,
    subject: &str,
    files: Vec<FileChange>,
) -> CommitInfo {
    let date = DateTime::parse_from_rfc3339(rfc3339).unwrap();
    CommitInfo::new(
        hash,
        Some(format!("parent-of-{hash}")),
        "Test User",
        "test@example.com",
        date,
        subject,
        files,
    )
}

/// A commit touching `src/lib.rs` with `lines` changed lines.
pub(crate) fn commit_on(hash: &str, rfc3339: &str, subject: &str, lines: usize) -> CommitInfo {
    commit_with_files(
        hash,
        rfc3339,
        subject,
        vec![file("src/lib.rs", FileStatus::Modified, lines)],
    )
}

/// Pairs a commit with a fixed category.
pub(crate) fn categorized(commit: CommitInfo, category: ChangeCategory) -> CategorizedCommit {
    CategorizedCommit { commit, category }
}

/// A single-date group built from `(hash, subject, category)` triples.
///
/// Commits are a minute apart, so at most 60 entries.
pub(crate) fn group_of(entries: &[(&str, &str, ChangeCategory)]) -> CommitGroup {
    let commits = entries
        .iter()
        .enumerate()
        .map(|(idx, (hash, subject, category))| {
            categorized(
                commit_on(hash, &format!("2025-06-20T08:{idx:02}:00Z"), subject, 5),
                *category,
            )
        })
        .collect();
    let date = chrono::NaiveDate::from_ymd_opt(2025, 6, 20).unwrap();
    CommitGroup::new(date, None, commits).unwrap()
}

/// Summarizer that replays scripted results and records the guidance it got.
///
/// Once the script runs out every call fails with `Unavailable`.
pub(crate) struct ScriptedSummarizer {
    results: Mutex<VecDeque<Result<DraftMessage, BackendError>>>,
    guidance: Arc<Mutex<Vec<Vec<Violation>>>>,
}

impl ScriptedSummarizer {
    pub(crate) fn new(results: Vec<Result<DraftMessage, BackendError>>) -> Self {
        Self {
            results: Mutex::new(VecDeque::from(results)),
            guidance: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Guidance passed on each call, in call order.
    pub(crate) fn guidance_log(&self) -> Arc<Mutex<Vec<Vec<Violation>>>> {
        self.guidance.clone()
    }
}

impl Summarizer for ScriptedSummarizer {
    fn name(&self) -> &str {
        "scripted"
    }

    fn summarize<'a>(
        &'a self,
        _group: &'a CommitGroup,
        _config: &'a SquashConfig,
        guidance: &'a [Violation],
    ) -> BackendFuture<'a, DraftMessage> {
        self.guidance.lock().unwrap().push(guidance.to_vec());
        let next = self
            .results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::Unavailable("script exhausted".to_string())));
        Box::pin(async move { next })
    }

    fn suggest_branch_name<'a>(&'a self, _plan: &'a SquashPlan) -> BackendFuture<'a, String> {
        Box::pin(async move { Err(BackendError::Unavailable("offline".to_string())) })
    }
}
