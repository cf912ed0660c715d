//! Value types shared by the squash pipeline.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::git::CommitInfo;
use crate::squash::analyzer::review_notes;

/// Coarse classification of what a commit does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeCategory {
    /// New functionality.
    Feature,
    /// Bug fix.
    Fix,
    /// Test-only change.
    Test,
    /// Documentation-only change.
    Docs,
    /// Restructuring without behaviour change.
    Refactor,
    /// Everything else.
    Chore,
}

impl ChangeCategory {
    /// All categories in tie-break priority order, highest first.
    pub const PRIORITY: [Self; 6] = [
        Self::Fix,
        Self::Feature,
        Self::Test,
        Self::Refactor,
        Self::Docs,
        Self::Chore,
    ];

    /// Position in [`Self::PRIORITY`]; lower wins ties.
    pub fn priority_rank(self) -> usize {
        Self::PRIORITY
            .iter()
            .position(|c| *c == self)
            .unwrap_or(Self::PRIORITY.len())
    }

    /// Lowercase label used in messages and branch names.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Feature => "feature",
            Self::Fix => "fix",
            Self::Test => "test",
            Self::Docs => "docs",
            Self::Refactor => "refactor",
            Self::Chore => "chore",
        }
    }

    /// Short phrase describing a batch of changes in this category.
    pub fn summary_phrase(self) -> &'static str {
        match self {
            Self::Feature => "new features",
            Self::Fix => "bug fixes",
            Self::Test => "test updates",
            Self::Docs => "documentation updates",
            Self::Refactor => "code cleanup",
            Self::Chore => "maintenance",
        }
    }

    /// Picks the most frequent category, breaking ties by priority.
    ///
    /// Returns [`ChangeCategory::Chore`] for an empty input.
    pub fn dominant<I>(categories: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        let mut counts = [0usize; 6];
        for category in categories {
            counts[category.priority_rank()] += 1;
        }
        Self::PRIORITY
            .iter()
            .zip(counts)
            .filter(|(_, count)| *count > 0)
            // max_by_key keeps the last maximum, so walk lowest priority first
            .rev()
            .max_by_key(|(_, count)| *count)
            .map_or(Self::Chore, |(category, _)| *category)
    }
}

impl fmt::Display for ChangeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A commit paired with its derived category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorizedCommit {
    /// The commit.
    pub commit: CommitInfo,
    /// Category derived from subject and paths.
    pub category: ChangeCategory,
}

/// Flags raised by commit subjects that reviewers should see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewNote {
    /// Security or otherwise urgent work.
    CriticalChanges,
    /// Stubs, fakes, or temporary code.
    MockedDependencies,
    /// Work in progress.
    IncompleteFeatures,
}

impl ReviewNote {
    /// Human-readable description.
    pub fn description(self) -> &'static str {
        match self {
            Self::CriticalChanges => "contains critical or security changes",
            Self::MockedDependencies => "uses mocked or temporary code",
            Self::IncompleteFeatures => "contains incomplete work",
        }
    }
}

/// Marks one slice of a date that was split by size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPart {
    /// 1-based index of this slice.
    pub index: usize,
    /// Number of slices for the date.
    pub total: usize,
}

impl fmt::Display for GroupPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "part {}/{}", self.index, self.total)
    }
}

/// A contiguous, same-date, size-bounded run of commits.
///
/// Always holds at least one commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitGroup {
    date: NaiveDate,
    part: Option<GroupPart>,
    commits: Vec<CategorizedCommit>,
    dominant: ChangeCategory,
    notes: Vec<ReviewNote>,
}

impl CommitGroup {
    /// Builds a group, returning `None` when `commits` is empty.
    pub fn new(
        date: NaiveDate,
        part: Option<GroupPart>,
        commits: Vec<CategorizedCommit>,
    ) -> Option<Self> {
        if commits.is_empty() {
            return None;
        }
        let dominant = ChangeCategory::dominant(commits.iter().map(|c| c.category));
        let notes = review_notes(commits.iter().map(|c| c.commit.subject.as_str()));
        Some(Self {
            date,
            part,
            commits,
            dominant,
            notes,
        })
    }

    /// Calendar date shared by the commits.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Slice marker when the date was split by size.
    pub fn part(&self) -> Option<GroupPart> {
        self.part
    }

    /// Commits in original order.
    pub fn commits(&self) -> &[CategorizedCommit] {
        &self.commits
    }

    /// Most frequent category.
    pub fn dominant_category(&self) -> ChangeCategory {
        self.dominant
    }

    /// Review flags raised by the commit subjects.
    pub fn notes(&self) -> &[ReviewNote] {
        &self.notes
    }

    /// Number of commits.
    pub fn len(&self) -> usize {
        self.commits.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    /// Oldest commit.
    pub fn first(&self) -> &CommitInfo {
        &self.commits[0].commit
    }

    /// Newest commit.
    pub fn last(&self) -> &CommitInfo {
        &self.commits[self.commits.len() - 1].commit
    }

    /// Sum of changed lines over all commits.
    pub fn changed_lines(&self) -> usize {
        self.commits.iter().map(|c| c.commit.changed_lines()).sum()
    }

    /// Count per category, in priority order, omitting zeros.
    pub fn category_tally(&self) -> Vec<(ChangeCategory, usize)> {
        ChangeCategory::PRIORITY
            .iter()
            .map(|cat| {
                (
                    *cat,
                    self.commits.iter().filter(|c| c.category == *cat).count(),
                )
            })
            .filter(|(_, count)| *count > 0)
            .collect()
    }

    /// Date plus part marker, e.g. `2025-06-20 part 1/2`.
    pub fn label(&self) -> String {
        match self.part {
            Some(part) => format!("{} {part}", self.date),
            None => self.date.to_string(),
        }
    }
}

/// A subject and body produced for one group.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DraftMessage {
    /// Subject line.
    pub subject: String,
    /// Body, possibly empty, lines separated by `\n`.
    pub body: String,
}

impl DraftMessage {
    /// Creates a draft.
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// Renders `subject` or `subject\n\nbody`.
    pub fn full_text(&self) -> String {
        if self.body.is_empty() {
            self.subject.clone()
        } else {
            format!("{}\n\n{}", self.subject, self.body)
        }
    }
}

/// How a group's message was accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PlanOutcome {
    /// A backend draft passed validation.
    Accepted {
        /// Attempts used, starting at 1.
        attempts: u32,
    },
    /// Attempts ran out and the synthesized message was used.
    FallbackAccepted {
        /// Attempts used before falling back.
        attempts: u32,
        /// Last failure seen.
        reason: String,
    },
}

impl PlanOutcome {
    /// Whether the fallback message was used.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::FallbackAccepted { .. })
    }
}

/// A finalized group ready to be written as one commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SquashOperation {
    /// The commits being replaced.
    pub group: CommitGroup,
    /// Accepted message.
    pub message: DraftMessage,
    /// Category shown in the provenance note.
    pub category: ChangeCategory,
    /// Terminal planning state.
    pub outcome: PlanOutcome,
}

impl SquashOperation {
    /// Provenance line recording which commits were squashed.
    pub fn provenance_note(&self) -> String {
        let count = self.group.len();
        let noun = if count == 1 { "commit" } else { "commits" };
        format!(
            "[{}] squashed {count} {noun}: {}..{}",
            self.category,
            self.group.first().short_hash(),
            self.group.last().short_hash()
        )
    }

    /// Message written to the new commit: accepted text plus provenance.
    pub fn commit_message(&self) -> String {
        format!("{}\n\n{}", self.message.full_text(), self.provenance_note())
    }
}

/// Ordered operations produced by the planner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SquashPlan {
    /// One operation per group, in history order.
    pub operations: Vec<SquashOperation>,
}

impl SquashPlan {
    /// Wraps planned operations.
    pub fn new(operations: Vec<SquashOperation>) -> Self {
        Self { operations }
    }

    /// Number of squashed commits the plan produces.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Whether the plan has nothing to do.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Number of original commits covered.
    pub fn total_original_commits(&self) -> usize {
        self.operations.iter().map(|op| op.group.len()).sum()
    }

    /// Parent of the first planned commit, `None` when the plan starts at a root commit.
    pub fn base(&self) -> Option<&str> {
        self.operations
            .first()
            .and_then(|op| op.group.first().parent.as_deref())
    }

    /// Newest commit covered by the plan.
    pub fn tip(&self) -> Option<&CommitInfo> {
        self.operations.last().map(|op| op.group.last())
    }

    /// Earliest and latest group dates.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.operations.first()?.group.date();
        let last = self.operations.last()?.group.date();
        Some((first, last))
    }

    /// Most frequent category across all commits in the plan.
    pub fn dominant_category(&self) -> ChangeCategory {
        ChangeCategory::dominant(
            self.operations
                .iter()
                .flat_map(|op| op.group.commits().iter().map(|c| c.category)),
        )
    }

    /// Number of groups that used the fallback message.
    pub fn fallback_count(&self) -> usize {
        self.operations
            .iter()
            .filter(|op| op.outcome.is_fallback())
            .count()
    }

    /// One-line summary, e.g. `12 commits -> 3 squashed commits`.
    pub fn summary_stats(&self) -> String {
        format!(
            "{} commits -> {} squashed commits",
            self.total_original_commits(),
            self.len()
        )
    }
}
