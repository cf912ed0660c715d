//! Commit message length rules.

use std::fmt;

use serde::Serialize;

use crate::config::MessageLimits;
use crate::squash::types::DraftMessage;

/// A single broken rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// Subject is blank.
    EmptySubject,
    /// Subject longer than the limit.
    SubjectTooLong {
        /// Subject length in characters.
        length: usize,
        /// Configured limit.
        limit: usize,
    },
    /// One body line longer than the wrap width.
    BodyLineTooLong {
        /// Zero-based index into the body's lines.
        line_index: usize,
        /// Line length in characters.
        length: usize,
        /// Configured limit.
        limit: usize,
    },
    /// Whole message longer than the total limit.
    TotalTooLong {
        /// Message length in characters.
        length: usize,
        /// Configured limit.
        limit: usize,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySubject => write!(f, "subject line is empty"),
            Self::SubjectTooLong { length, limit } => {
                write!(f, "subject line is {length} characters (limit {limit})")
            }
            Self::BodyLineTooLong {
                line_index,
                length,
                limit,
            } => write!(
                f,
                "body line {} is {length} characters (limit {limit})",
                line_index + 1
            ),
            Self::TotalTooLong { length, limit } => {
                write!(f, "message is {length} characters in total (limit {limit})")
            }
        }
    }
}

/// Outcome of [`validate`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationResult {
    /// Every rule broken, in subject, body, total order.
    pub violations: Vec<Violation>,
}

impl ValidationResult {
    /// True when no rule is broken.
    pub fn ok(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Checks a draft against the configured limits.
///
/// Lengths are counted in characters, not bytes.
pub fn validate(draft: &DraftMessage, limits: &MessageLimits) -> ValidationResult {
    let mut violations = Vec::new();

    let subject_len = draft.subject.chars().count();
    if draft.subject.trim().is_empty() {
        violations.push(Violation::EmptySubject);
    } else if subject_len > limits.subject {
        violations.push(Violation::SubjectTooLong {
            length: subject_len,
            limit: limits.subject,
        });
    }

    for (line_index, line) in draft.body.lines().enumerate() {
        let length = line.chars().count();
        if length > limits.body_line {
            violations.push(Violation::BodyLineTooLong {
                line_index,
                length,
                limit: limits.body_line,
            });
        }
    }

    let total = draft.full_text().chars().count();
    if total > limits.total {
        violations.push(Violation::TotalTooLong {
            length: total,
            limit: limits.total,
        });
    }

    ValidationResult { violations }
}
