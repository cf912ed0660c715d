//! Git repository operations

use std::path::Path;

use anyhow::{Context, Result};
use git2::{BranchType, Oid, Repository, Sort, Status};
use tracing::debug;

use crate::git::CommitInfo;
use crate::squash::SquashError;

/// Git repository wrapper
pub struct GitRepository {
    repo: Repository,
}

/// Working directory status
#[derive(Debug)]
pub struct WorkingDirectoryStatus {
    /// Whether the working directory has no changes
    pub clean: bool,
    /// Files with uncommitted changes
    pub changes: Vec<FileStatus>,
}

/// File status information
#[derive(Debug)]
pub struct FileStatus {
    /// Git status flags (e.g., "AM", "??", "M ")
    pub status: String,
    /// Path to the file relative to repository root
    pub file: String,
}

impl GitRepository {
    /// Open repository at specified path, searching parent directories
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let repo = Repository::discover(path)
            .map_err(|_| SquashError::RepositoryNotFound(path.display().to_string()))?;

        Ok(Self { repo })
    }

    /// Wraps an already opened repository
    pub fn from_repository(repo: Repository) -> Self {
        Self { repo }
    }

    /// Get working directory status, ignoring untracked files
    pub fn get_working_directory_status(&self) -> Result<WorkingDirectoryStatus> {
        let mut options = git2::StatusOptions::new();
        options.include_untracked(false).include_ignored(false);
        let statuses = self
            .repo
            .statuses(Some(&mut options))
            .context("Failed to get repository status")?;

        let changes: Vec<FileStatus> = statuses
            .iter()
            .filter_map(|entry| {
                entry.path().map(|path| FileStatus {
                    status: format_status_flags(entry.status()),
                    file: path.to_string(),
                })
            })
            .collect();

        Ok(WorkingDirectoryStatus {
            clean: changes.is_empty(),
            changes,
        })
    }

    /// Get access to the underlying git2::Repository
    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// Check if a local branch exists
    pub fn branch_exists(&self, branch_name: &str) -> Result<bool> {
        match self.repo.find_branch(branch_name, BranchType::Local) {
            Ok(_) => Ok(true),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to look up branch {branch_name}")),
        }
    }

    /// Returns `base`, or `base-2`, `base-3`, ... for the first name not taken
    pub fn unique_branch_name(&self, base: &str) -> Result<String> {
        if !self.branch_exists(base)? {
            return Ok(base.to_string());
        }
        let mut n = 2;
        loop {
            let candidate = format!("{base}-{n}");
            if !self.branch_exists(&candidate)? {
                return Ok(candidate);
            }
            n += 1;
        }
    }

    /// Reads the commits of `range` oldest-first.
    ///
    /// `a..b` selects commits reachable from `b` but not from `a`; any other
    /// revision (e.g. `HEAD`) selects it and all its ancestors. Merge commits
    /// are rejected since a squash of them has no single parent line.
    pub fn read_history(&self, range: &str) -> Result<Vec<CommitInfo>> {
        let mut walker = self.repo.revwalk().context("Failed to create revwalk")?;
        walker
            .set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)
            .context("Failed to set revwalk order")?;

        if let Some((start_spec, end_spec)) = range.split_once("..") {
            if end_spec.contains("..") {
                anyhow::bail!("Invalid range format: {}", range);
            }
            let end_spec = if end_spec.is_empty() { "HEAD" } else { end_spec };
            walker
                .push(self.resolve_commit(end_spec)?)
                .context("Failed to push end commit")?;
            walker
                .hide(self.resolve_commit(start_spec)?)
                .context("Failed to hide start commit")?;
        } else {
            walker
                .push(self.resolve_commit(range)?)
                .context("Failed to push commit")?;
        }

        let mut commits = Vec::new();
        for oid in walker {
            let oid = oid.context("Failed to get commit OID from walker")?;
            let commit = self
                .repo
                .find_commit(oid)
                .context("Failed to find commit")?;

            if commit.parent_count() > 1 {
                return Err(SquashError::NonLinearHistory(oid.to_string()).into());
            }

            commits.push(CommitInfo::from_git_commit(&self.repo, &commit)?);
        }

        if commits.is_empty() {
            return Err(SquashError::NoCommitsInRange(range.to_string()).into());
        }

        debug!(range, count = commits.len(), "Read commit history");
        Ok(commits)
    }

    fn resolve_commit(&self, spec: &str) -> Result<Oid> {
        let commit = self
            .repo
            .revparse_single(spec)
            .with_context(|| format!("Failed to parse commit: {}", spec))?
            .peel_to_commit()
            .with_context(|| format!("{} does not point at a commit", spec))?;
        Ok(commit.id())
    }
}

/// Format git status flags into string representation
fn format_status_flags(flags: Status) -> String {
    let mut status = String::new();

    if flags.contains(Status::INDEX_NEW) {
        status.push('A');
    } else if flags.contains(Status::INDEX_MODIFIED) {
        status.push('M');
    } else if flags.contains(Status::INDEX_DELETED) {
        status.push('D');
    } else if flags.contains(Status::INDEX_RENAMED) {
        status.push('R');
    } else if flags.contains(Status::INDEX_TYPECHANGE) {
        status.push('T');
    } else {
        status.push(' ');
    }

    if flags.contains(Status::WT_MODIFIED) {
        status.push('M');
    } else if flags.contains(Status::WT_DELETED) {
        status.push('D');
    } else if flags.contains(Status::WT_TYPECHANGE) {
        status.push('T');
    } else if flags.contains(Status::WT_RENAMED) {
        status.push('R');
    } else {
        status.push(' ');
    }

    status
}
