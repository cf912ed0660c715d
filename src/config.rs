//! Squash configuration.
//!
//! A [`SquashConfig`] is built once (CLI flags over defaults), validated, and
//! then passed by reference through the analyzer, planner, and executor.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::squash::SquashError;

/// Default model used by the live summarizer.
pub const DEFAULT_MODEL: &str = "claude-3-7-sonnet-20250219";

/// Characters and sequences git rejects in ref names.
const INVALID_REF_SEQUENCES: &[&str] = &[" ", "..", "~", "^", ":", "?", "*", "[", "\\"];

/// Length limits applied to drafted commit messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageLimits {
    /// Maximum subject line length in characters.
    pub subject: usize,
    /// Maximum length of each body line in characters.
    pub body_line: usize,
    /// Maximum length of the whole message (subject, blank line, body).
    pub total: usize,
}

impl Default for MessageLimits {
    fn default() -> Self {
        Self {
            subject: 50,
            body_line: 72,
            total: 800,
        }
    }
}

/// Timezone used to assign commits to calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateTimezone {
    /// The machine's local timezone.
    #[default]
    Local,
    /// The offset recorded on each commit's author timestamp.
    Author,
    /// Coordinated universal time.
    Utc,
}

impl DateTimezone {
    /// Returns the calendar date of `timestamp` in this timezone.
    pub fn calendar_date(self, timestamp: &DateTime<FixedOffset>) -> NaiveDate {
        match self {
            Self::Local => timestamp.with_timezone(&Local).date_naive(),
            Self::Author => timestamp.date_naive(),
            Self::Utc => timestamp.with_timezone(&Utc).date_naive(),
        }
    }
}

impl fmt::Display for DateTimezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Author => write!(f, "author"),
            Self::Utc => write!(f, "utc"),
        }
    }
}

impl FromStr for DateTimezone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "author" => Ok(Self::Author),
            "utc" => Ok(Self::Utc),
            other => Err(format!(
                "unknown timezone '{other}' (expected local, author, or utc)"
            )),
        }
    }
}

/// Read-only settings threaded through the squash pipeline.
#[derive(Debug, Clone)]
pub struct SquashConfig {
    /// Message length limits.
    pub limits: MessageLimits,
    /// Maximum aggregate changed lines per group.
    pub size_threshold: usize,
    /// Commits dated before this day are left out of the plan.
    pub start_date: Option<NaiveDate>,
    /// Commits dated after this day are left out of the plan.
    pub end_date: Option<NaiveDate>,
    /// Timezone for calendar dates.
    pub timezone: DateTimezone,
    /// Summarization attempts per group before falling back.
    pub max_attempts: u32,
    /// Upper bound on a single summarization attempt.
    pub attempt_timeout: Duration,
    /// Prefix for the squashed branch.
    pub branch_prefix: String,
    /// Prefix for the backup branch.
    pub backup_prefix: String,
    /// Use the deterministic summarizer instead of the live service.
    pub test_mode: bool,
}

impl Default for SquashConfig {
    fn default() -> Self {
        Self {
            limits: MessageLimits::default(),
            size_threshold: 500,
            start_date: None,
            end_date: None,
            timezone: DateTimezone::default(),
            max_attempts: 3,
            attempt_timeout: Duration::from_secs(60),
            branch_prefix: "squash".to_string(),
            backup_prefix: "backup".to_string(),
            test_mode: false,
        }
    }
}

impl SquashConfig {
    /// Checks that the configuration is usable.
    ///
    /// Trailing slashes on the branch prefixes are tolerated and stripped.
    pub fn validate(mut self) -> Result<Self, SquashError> {
        let limits = self.limits;
        if limits.subject == 0 || limits.body_line == 0 || limits.total == 0 {
            return Err(SquashError::InvalidConfig(format!(
                "message limits must be positive (subject {}, body {}, total {})",
                limits.subject, limits.body_line, limits.total
            )));
        }
        if limits.subject > limits.total {
            return Err(SquashError::InvalidConfig(format!(
                "subject limit ({}) cannot exceed total message limit ({})",
                limits.subject, limits.total
            )));
        }
        if self.size_threshold == 0 {
            return Err(SquashError::InvalidConfig(
                "size threshold must be positive".to_string(),
            ));
        }
        if !(1..=10).contains(&self.max_attempts) {
            return Err(SquashError::InvalidConfig(format!(
                "max attempts must be between 1 and 10, got {}",
                self.max_attempts
            )));
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(SquashError::InvalidConfig(format!(
                    "end date {end} is before start date {start}"
                )));
            }
        }
        if self.attempt_timeout.is_zero() {
            return Err(SquashError::InvalidConfig(
                "attempt timeout must be positive".to_string(),
            ));
        }

        self.branch_prefix = validate_prefix("branch prefix", &self.branch_prefix)?;
        self.backup_prefix = validate_prefix("backup prefix", &self.backup_prefix)?;
        Ok(self)
    }

    /// Returns the calendar date of `timestamp` in the configured timezone.
    pub fn calendar_date(&self, timestamp: &DateTime<FixedOffset>) -> NaiveDate {
        self.timezone.calendar_date(timestamp)
    }

    /// Whether `date` lies within the inclusive start/end window.
    pub fn in_date_window(&self, date: NaiveDate) -> bool {
        self.start_date.map_or(true, |start| date >= start)
            && self.end_date.map_or(true, |end| date <= end)
    }

    /// Human-readable form of the date window, e.g. `between 2025-06-20 and 2025-06-21`.
    pub fn describe_date_window(&self) -> String {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => format!("between {start} and {end}"),
            (Some(start), None) => format!("on or after {start}"),
            (None, Some(end)) => format!("on or before {end}"),
            (None, None) => "at any date".to_string(),
        }
    }
}

fn validate_prefix(label: &str, prefix: &str) -> Result<String, SquashError> {
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(SquashError::InvalidConfig(format!("{label} cannot be empty")));
    }
    if let Some(bad) = INVALID_REF_SEQUENCES.iter().find(|seq| trimmed.contains(**seq)) {
        return Err(SquashError::InvalidConfig(format!(
            "{label} contains invalid sequence '{bad}': {prefix}"
        )));
    }
    if trimmed.chars().any(char::is_control) {
        return Err(SquashError::InvalidConfig(format!(
            "{label} contains control characters: {prefix:?}"
        )));
    }
    Ok(trimmed.to_string())
}

/// Parses a `YYYY-MM-DD` start or end date.
pub fn parse_date(value: &str) -> Result<NaiveDate, SquashError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| SquashError::InvalidDate(value.to_string()))
}
