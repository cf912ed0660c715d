//! Commit values read from the repository.

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use git2::{Commit, Delta, Diff, Patch, Repository};
use serde::{Deserialize, Serialize};

use crate::git::SHORT_HASH_LEN;

/// How a file was touched by a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// New file.
    Added,
    /// Content changed.
    Modified,
    /// File removed.
    Deleted,
    /// File moved.
    Renamed,
    /// File copied.
    Copied,
    /// File mode or kind changed.
    Typechange,
    /// Anything git2 reports that does not fit above.
    Other,
}

impl FileStatus {
    fn from_delta(delta: Delta) -> Self {
        match delta {
            Delta::Added => Self::Added,
            Delta::Modified => Self::Modified,
            Delta::Deleted => Self::Deleted,
            Delta::Renamed => Self::Renamed,
            Delta::Copied => Self::Copied,
            Delta::Typechange => Self::Typechange,
            _ => Self::Other,
        }
    }
}

/// Per-file change statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    /// Path relative to the repository root (new path for renames).
    pub path: String,
    /// Change kind.
    pub status: FileStatus,
    /// Lines added.
    pub additions: usize,
    /// Lines removed.
    pub deletions: usize,
}

/// An immutable snapshot of one commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    /// Full SHA-1 hash.
    pub hash: String,
    /// First parent hash, `None` for a root commit.
    pub parent: Option<String>,
    /// Author name.
    pub author_name: String,
    /// Author email.
    pub author_email: String,
    /// Author timestamp with its original UTC offset.
    pub date: DateTime<FixedOffset>,
    /// First line of the commit message.
    pub subject: String,
    /// Files changed relative to the first parent.
    pub files: Vec<FileChange>,
    /// Total lines added.
    pub additions: usize,
    /// Total lines removed.
    pub deletions: usize,
}

impl CommitInfo {
    /// Builds a commit value from explicit parts, summing the file stats.
    pub fn new(
        hash: impl Into<String>,
        parent: Option<String>,
        author_name: impl Into<String>,
        author_email: impl Into<String>,
        date: DateTime<FixedOffset>,
        subject: impl Into<String>,
        files: Vec<FileChange>,
    ) -> Self {
        let additions = files.iter().map(|f| f.additions).sum();
        let deletions = files.iter().map(|f| f.deletions).sum();
        Self {
            hash: hash.into(),
            parent,
            author_name: author_name.into(),
            author_email: author_email.into(),
            date,
            subject: subject.into(),
            files,
            additions,
            deletions,
        }
    }

    /// Creates a `CommitInfo` from a `git2::Commit`.
    pub fn from_git_commit(repo: &Repository, commit: &Commit) -> Result<Self> {
        let author = commit.author();
        let when = author.when();
        let offset = FixedOffset::east_opt(when.offset_minutes() * 60).unwrap_or_else(|| Utc.fix());
        let date = DateTime::from_timestamp(when.seconds(), 0)
            .context("Invalid commit timestamp")?
            .with_timezone(&offset);

        let subject = commit
            .message()
            .unwrap_or("")
            .lines()
            .next()
            .unwrap_or("")
            .trim()
            .to_string();

        let parent = if commit.parent_count() > 0 {
            Some(commit.parent_id(0).context("Failed to read parent id")?.to_string())
        } else {
            None
        };

        let files = Self::collect_file_changes(repo, commit)?;

        Ok(Self::new(
            commit.id().to_string(),
            parent,
            author.name().unwrap_or("Unknown"),
            author.email().unwrap_or("unknown@example.com"),
            date,
            subject,
            files,
        ))
    }

    /// Diffs the commit against its first parent and records line stats per file.
    fn collect_file_changes(repo: &Repository, commit: &Commit) -> Result<Vec<FileChange>> {
        let commit_tree = commit.tree().context("Failed to get commit tree")?;
        let parent_tree = if commit.parent_count() > 0 {
            Some(
                commit
                    .parent(0)
                    .context("Failed to get parent commit")?
                    .tree()
                    .context("Failed to get parent tree")?,
            )
        } else {
            None
        };

        let diff = repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&commit_tree), None)
            .context("Failed to create diff")?;

        file_changes_from_diff(&diff)
    }

    /// Lines added plus lines removed.
    pub fn changed_lines(&self) -> usize {
        self.additions + self.deletions
    }

    /// Abbreviated hash for display.
    pub fn short_hash(&self) -> &str {
        let len = SHORT_HASH_LEN.min(self.hash.len());
        &self.hash[..len]
    }

    /// Iterates the changed paths.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.path.as_str())
    }
}

fn file_changes_from_diff(diff: &Diff<'_>) -> Result<Vec<FileChange>> {
    let mut changes = Vec::with_capacity(diff.deltas().len());
    for (idx, delta) in diff.deltas().enumerate() {
        let Some(path) = delta
            .new_file()
            .path()
            .or_else(|| delta.old_file().path())
            .and_then(|p| p.to_str())
        else {
            continue;
        };

        // Binary files produce no patch; they count as zero lines.
        let (additions, deletions) = match Patch::from_diff(diff, idx).context("Failed to build patch")? {
            Some(patch) => {
                let (_, additions, deletions) =
                    patch.line_stats().context("Failed to read patch line stats")?;
                (additions, deletions)
            }
            None => (0, 0),
        };

        changes.push(FileChange {
            path: path.to_string(),
            status: FileStatus::from_delta(delta.status()),
            additions,
            deletions,
        });
    }
    Ok(changes)
}
