//! CLI interface for git-squash.

use std::io::{BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use tracing::info;

use crate::claude::create_ai_client;
use crate::config::{parse_date, DateTimezone, SquashConfig};
use crate::data::{save_plan, PlanDocument};
use crate::squash::executor::render_preview;
use crate::squash::{
    analyze, derive_branch_name, plan, select_commits, DeterministicSummarizer, ExecutionReport,
    LiveSummarizer, RewriteExecutor, Summarizer,
};
use crate::utils::{check_ai_credentials, check_git_repository_at, check_working_directory_clean};

/// git-squash: squash granular commits into date-grouped commits with drafted messages.
#[derive(Parser, Debug)]
#[command(name = "git-squash")]
#[command(about = "Squashes granular commits into date-grouped commits", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Previews the plan without writing anything (the default).
    #[arg(long, conflicts_with = "execute")]
    pub dry_run: bool,

    /// Writes a backup branch and the squashed branch.
    #[arg(long)]
    pub execute: bool,

    /// Leaves commits dated before this day out of the plan.
    #[arg(long, visible_alias = "from", value_name = "YYYY-MM-DD", value_parser = parse_date)]
    pub start_date: Option<NaiveDate>,

    /// Leaves commits dated after this day out of the plan (inclusive bound).
    #[arg(long, visible_alias = "to", value_name = "YYYY-MM-DD", value_parser = parse_date)]
    pub end_date: Option<NaiveDate>,

    /// Maximum characters in a whole message (default: 800).
    #[arg(long, value_name = "N")]
    pub message_limit: Option<usize>,

    /// Maximum characters in a subject line (default: 50).
    #[arg(long, value_name = "N")]
    pub subject_limit: Option<usize>,

    /// Maximum characters per body line (default: 72).
    #[arg(long, value_name = "N")]
    pub body_width: Option<usize>,

    /// Maximum changed lines per squashed commit before a day is split (default: 500).
    #[arg(long, value_name = "N")]
    pub size_threshold: Option<usize>,

    /// Summarization attempts per group before the fallback message is used (default: 3).
    #[arg(long, value_name = "N")]
    pub max_retries: Option<u32>,

    /// Seconds allowed for one summarization attempt (default: 60).
    #[arg(long, value_name = "SECS")]
    pub attempt_timeout: Option<u64>,

    /// Prefix for the squashed branch (default: squash).
    #[arg(long, value_name = "PREFIX")]
    pub branch_prefix: Option<String>,

    /// Prefix for the backup branch (default: backup).
    #[arg(long, value_name = "PREFIX")]
    pub backup_prefix: Option<String>,

    /// Timezone that decides each commit's calendar date: local, author, or utc.
    #[arg(long, value_name = "TZ")]
    pub timezone: Option<DateTimezone>,

    /// Commit range to squash (e.g., HEAD, main..HEAD, abc123..def456).
    #[arg(long, value_name = "RANGE", default_value = "HEAD")]
    pub range: String,

    /// Path inside the repository to operate on.
    #[arg(long, value_name = "PATH", default_value = ".")]
    pub repo: PathBuf,

    /// Drafts messages offline with the deterministic summarizer.
    #[arg(long)]
    pub test_mode: bool,

    /// Claude API model to use (if not specified, uses ANTHROPIC_MODEL or default).
    #[arg(long)]
    pub model: Option<String>,

    /// Saves the plan to a file (.yaml/.yml for YAML, anything else for JSON).
    #[arg(long, value_name = "FILE")]
    pub save_plan: Option<PathBuf>,

    /// Skips the confirmation prompt in execute mode.
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Enables debug logging.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Builds and validates the configuration from the flags.
    pub fn build_config(&self) -> Result<SquashConfig> {
        let mut config = SquashConfig {
            start_date: self.start_date,
            end_date: self.end_date,
            test_mode: self.test_mode,
            ..SquashConfig::default()
        };
        if let Some(total) = self.message_limit {
            config.limits.total = total;
        }
        if let Some(subject) = self.subject_limit {
            config.limits.subject = subject;
        }
        if let Some(width) = self.body_width {
            config.limits.body_line = width;
        }
        if let Some(threshold) = self.size_threshold {
            config.size_threshold = threshold;
        }
        if let Some(attempts) = self.max_retries {
            config.max_attempts = attempts;
        }
        if let Some(secs) = self.attempt_timeout {
            config.attempt_timeout = Duration::from_secs(secs);
        }
        if let Some(prefix) = &self.branch_prefix {
            config.branch_prefix = prefix.clone();
        }
        if let Some(prefix) = &self.backup_prefix {
            config.backup_prefix = prefix.clone();
        }
        if let Some(timezone) = self.timezone {
            config.timezone = timezone;
        }
        Ok(config.validate()?)
    }

    /// Executes the CLI command.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config()?;

        // Fail on missing credentials before reading any history.
        let backend: Box<dyn Summarizer> = if config.test_mode {
            Box::new(DeterministicSummarizer)
        } else {
            let credentials = check_ai_credentials(self.model.as_deref())?;
            Box::new(LiveSummarizer::new(create_ai_client(&credentials)?))
        };

        let mut repo = check_git_repository_at(&self.repo)?;
        let history = repo.read_history(&self.range)?;
        let selected = select_commits(&history, &config)?;
        info!(
            range = %self.range,
            read = history.len(),
            selected = selected.len(),
            "Selected commits"
        );

        let backend_label = backend.describe();
        let groups = analyze(selected, &config);
        println!(
            "🔍 Planning {} commits in {} groups with the {backend_label} summarizer...",
            selected.len(),
            groups.len(),
        );
        let plan = plan(groups, backend.as_ref(), &config).await;

        let branch = derive_branch_name(&plan, backend.as_ref(), &config).await;
        let branch = repo.unique_branch_name(&branch)?;

        if let Some(path) = &self.save_plan {
            save_plan(&PlanDocument::new(&plan, &backend_label, &branch), path)?;
            println!("💾 Plan saved to: {}", path.display());
        }

        println!("\n{}", render_preview(&plan, &branch));

        if !self.execute {
            println!("Dry run: nothing was written. Re-run with --execute to apply.");
            return Ok(());
        }

        check_working_directory_clean(&repo)?;
        if !self.yes
            && !confirm(
                &format!("Create {branch} with {} squashed commits?", plan.len()),
                std::io::stdin().is_terminal(),
                &mut std::io::BufReader::new(std::io::stdin()),
            )?
        {
            println!("❌ Squash cancelled by user");
            return Ok(());
        }

        let report = RewriteExecutor::new(&mut repo, &config).execute(&plan, &branch, false);
        finish(&report)
    }
}

/// Prints the outcome of a real run; an incomplete run becomes an error.
fn finish(report: &ExecutionReport) -> Result<()> {
    let backup = report.backup_ref.as_deref().unwrap_or("(not created)");
    if report.is_completed() {
        println!(
            "✅ Created {} with {} squashed commits",
            report.branch,
            report.created_commits.len()
        );
        println!("🛟 Backup of the original tip: {backup}");
        return Ok(());
    }

    let failure = report
        .failure
        .as_ref()
        .map(|f| f.message.as_str())
        .unwrap_or("unknown failure");
    Err(anyhow::anyhow!(
        "Rewrite stopped ({:?}) after {} of the planned commits: {failure}. \
         Original history is preserved at {backup}; the partial branch is {}",
        report.status,
        report.created_commits.len(),
        report.branch
    ))
    .context("Squash execution failed")
}

/// Asks a yes/no question; anything but `y`/`yes` declines.
fn confirm(question: &str, is_terminal: bool, reader: &mut (dyn BufRead + Send)) -> Result<bool> {
    if !is_terminal {
        eprintln!("warning: stdin is not interactive, pass --yes to apply without a prompt");
        return Ok(false);
    }

    print!("❓ {question} [y/N] ");
    std::io::stdout().flush()?;

    let mut input = String::new();
    let bytes = reader
        .read_line(&mut input)
        .context("Failed to read confirmation")?;
    if bytes == 0 {
        eprintln!("warning: stdin closed, cancelling");
        return Ok(false);
    }
    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}
