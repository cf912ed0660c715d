//! Applies a finished plan to the repository, or previews it.

use std::fmt::Write as _;

use anyhow::Result;
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::claude::prompts::sanitize_branch_slug;
use crate::config::SquashConfig;
use crate::squash::backend::{default_branch_slug, Summarizer};
use crate::squash::types::{CommitGroup, PlanOutcome, SquashPlan};

/// What one squashed commit replaces, and whose name it carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    /// Oldest commit of the range.
    pub first: String,
    /// Newest commit of the range; its tree becomes the new commit's tree.
    pub last: String,
    /// Author of the oldest commit.
    pub author_name: String,
    /// Author email of the oldest commit.
    pub author_email: String,
    /// Author time of the oldest commit.
    pub author_date: DateTime<FixedOffset>,
}

impl ChangeSet {
    /// Change set covering every commit in `group`.
    pub fn for_group(group: &CommitGroup) -> Self {
        let first = group.first();
        Self {
            first: first.hash.clone(),
            last: group.last().hash.clone(),
            author_name: first.author_name.clone(),
            author_email: first.author_email.clone(),
            author_date: first.date,
        }
    }
}

/// Write access to history, as needed by [`RewriteExecutor`].
pub trait HistoryWriter {
    /// Records commit `target` under `name`, or under `name-2`, `name-3`, ...
    /// when taken, and returns the full ref name. Never overwrites a ref.
    fn create_backup_ref(&mut self, name: &str, target: &str) -> Result<String>;

    /// Creates branch `name` pointing at `base`, or unborn when `base` is `None`.
    fn create_branch(&mut self, name: &str, base: Option<&str>) -> Result<()>;

    /// Adds one commit on top of `branch` and returns its hash.
    fn commit(&mut self, branch: &str, message: &str, changes: &ChangeSet) -> Result<String>;
}

/// How far execution got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// No squashed commit was written (dry run, or an early failure).
    NotAttempted,
    /// Some squashed commits exist on the new branch, but not all.
    PartiallyApplied,
    /// Every operation was written.
    Completed,
}

/// Why execution stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionFailure {
    /// Index of the operation being written, `None` for backup or branch setup.
    pub operation_index: Option<usize>,
    /// Error chain of the failing call.
    pub message: String,
}

/// Outcome of [`RewriteExecutor::execute`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionReport {
    /// Final status.
    pub status: ExecutionStatus,
    /// Whether this was a dry run.
    pub dry_run: bool,
    /// Human-readable description of the plan.
    pub preview: String,
    /// Target branch, as passed in.
    pub branch: String,
    /// Backup ref, once created.
    pub backup_ref: Option<String>,
    /// Hashes of squashed commits written so far, in order.
    pub created_commits: Vec<String>,
    /// Set when execution stopped early.
    pub failure: Option<ExecutionFailure>,
}

impl ExecutionReport {
    /// Whether every operation was written.
    pub fn is_completed(&self) -> bool {
        self.status == ExecutionStatus::Completed
    }
}

/// Renders the plan for review before anything is written.
pub fn render_preview(plan: &SquashPlan, target_branch: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Squash plan: {}", plan.summary_stats());
    let _ = writeln!(out, "Target branch: {target_branch}");
    if plan.fallback_count() > 0 {
        let _ = writeln!(
            out,
            "Fallback messages: {} of {} groups",
            plan.fallback_count(),
            plan.len()
        );
    }

    for (idx, op) in plan.operations.iter().enumerate() {
        let count = op.group.len();
        let noun = if count == 1 { "commit" } else { "commits" };
        let outcome = match &op.outcome {
            PlanOutcome::Accepted { attempts } => format!("accepted after {attempts} attempt(s)"),
            PlanOutcome::FallbackAccepted { attempts, .. } => {
                format!("fallback after {attempts} attempt(s)")
            }
        };
        let _ = writeln!(
            out,
            "\n[{}/{}] {} ({count} {noun}, {}..{}) {outcome}",
            idx + 1,
            plan.len(),
            op.group.label(),
            op.group.first().short_hash(),
            op.group.last().short_hash(),
        );
        for line in op.commit_message().lines() {
            if line.is_empty() {
                out.push('\n');
            } else {
                let _ = writeln!(out, "    {line}");
            }
        }
    }
    out
}

/// Backup ref name for a run started at `now`, e.g. `backup/pre-squash-20250620-081500`.
pub fn backup_ref_name(prefix: &str, now: DateTime<Utc>) -> String {
    format!("{prefix}/pre-squash-{}", now.format("%Y%m%d-%H%M%S"))
}

/// Picks `{branch_prefix}/{slug}` for a plan.
///
/// The backend is asked first; any failure or unusable answer falls back to
/// the category and date derived slug.
pub async fn derive_branch_name(
    plan: &SquashPlan,
    backend: &dyn Summarizer,
    config: &SquashConfig,
) -> String {
    let suggested = match tokio::time::timeout(
        config.attempt_timeout,
        backend.suggest_branch_name(plan),
    )
    .await
    {
        Ok(Ok(name)) => sanitize_branch_slug(&name),
        Ok(Err(err)) => {
            warn!("Branch name suggestion failed: {err}");
            None
        }
        Err(_) => {
            warn!("Branch name suggestion timed out");
            None
        }
    };

    let slug = suggested
        .or_else(|| sanitize_branch_slug(&default_branch_slug(plan)))
        .unwrap_or_else(|| "updates".to_string());
    format!("{}/{slug}", config.branch_prefix)
}

/// Writes squashed commits through a [`HistoryWriter`].
pub struct RewriteExecutor<'a> {
    writer: &'a mut dyn HistoryWriter,
    config: &'a SquashConfig,
}

impl<'a> RewriteExecutor<'a> {
    /// Creates an executor over `writer`.
    pub fn new(writer: &'a mut dyn HistoryWriter, config: &'a SquashConfig) -> Self {
        Self { writer, config }
    }

    /// Previews the plan, or writes it when `dry_run` is false.
    ///
    /// The backup ref is created before any other write. The first failing
    /// call stops the run; the report says what was already written.
    pub fn execute(&mut self, plan: &SquashPlan, target_branch: &str, dry_run: bool) -> ExecutionReport {
        let mut report = ExecutionReport {
            status: ExecutionStatus::NotAttempted,
            dry_run,
            preview: render_preview(plan, target_branch),
            branch: target_branch.to_string(),
            backup_ref: None,
            created_commits: Vec::new(),
            failure: None,
        };

        if dry_run {
            debug!(operations = plan.len(), "Dry run, nothing written");
            return report;
        }
        let Some(tip) = plan.tip() else {
            report.status = ExecutionStatus::Completed;
            return report;
        };

        let backup_name = backup_ref_name(&self.config.backup_prefix, Utc::now());
        match self.writer.create_backup_ref(&backup_name, &tip.hash) {
            Ok(full_ref) => {
                info!(backup = %full_ref, target = %tip.short_hash(), "Created backup ref");
                report.backup_ref = Some(full_ref);
            }
            Err(err) => return fail(report, None, &err),
        }

        if let Err(err) = self.writer.create_branch(target_branch, plan.base()) {
            return fail(report, None, &err);
        }
        info!(branch = target_branch, base = ?plan.base(), "Created target branch");

        for (idx, op) in plan.operations.iter().enumerate() {
            let changes = ChangeSet::for_group(&op.group);
            match self.writer.commit(target_branch, &op.commit_message(), &changes) {
                Ok(hash) => {
                    debug!(index = idx, commit = %hash, "Wrote squashed commit");
                    report.created_commits.push(hash);
                }
                Err(err) => return fail(report, Some(idx), &err),
            }
        }

        report.status = ExecutionStatus::Completed;
        info!(
            branch = target_branch,
            commits = report.created_commits.len(),
            "Rewrite completed"
        );
        report
    }
}

fn fail(
    mut report: ExecutionReport,
    operation_index: Option<usize>,
    err: &anyhow::Error,
) -> ExecutionReport {
    warn!(index = ?operation_index, "Rewrite stopped: {err:#}");
    report.status = if report.created_commits.is_empty() {
        ExecutionStatus::NotAttempted
    } else {
        ExecutionStatus::PartiallyApplied
    };
    report.failure = Some(ExecutionFailure {
        operation_index,
        message: format!("{err:#}"),
    });
    report
}
