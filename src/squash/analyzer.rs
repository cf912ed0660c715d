//! Commit categorization and date-based grouping.
//!
//! Categories come from subject text and changed paths only; diff content is
//! never inspected. Groups are contiguous runs of same-date commits, split
//! greedily when their changed-line total exceeds the size threshold.

use std::path::Path;
use std::sync::LazyLock;

use chrono::NaiveDate;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::debug;

use crate::config::SquashConfig;
use crate::git::{CommitInfo, FileChange, FileStatus};
use crate::squash::error::SquashError;
use crate::squash::types::{CategorizedCommit, ChangeCategory, CommitGroup, GroupPart, ReviewNote};

/// Added lines above which a new source file counts as a feature.
pub const NON_TRIVIAL_SOURCE_LINES: usize = 10;

const TEST_PATTERNS: &[&str] = &[
    "**/tests/**",
    "**/test/**",
    "**/__tests__/**",
    "**/spec/**",
    "**/*_test.*",
    "**/test_*.*",
    "**/*.test.*",
    "**/*.spec.*",
    "**/*_spec.*",
];

const DOC_PATTERNS: &[&str] = &[
    "**/*.md",
    "**/*.rst",
    "**/*.adoc",
    "**/docs/**",
    "**/doc/**",
    "**/README*",
    "**/CHANGELOG*",
    "**/LICENSE*",
];

const SOURCE_EXTENSIONS: &[&str] = &[
    "rs", "py", "js", "jsx", "ts", "tsx", "go", "java", "kt", "scala", "c", "h", "cc", "cpp",
    "hpp", "cs", "rb", "swift", "php", "sh", "ex", "exs", "hs", "ml", "zig", "lua", "dart",
];

const BUG_WORDS: &[&str] = &["bug", "bugs", "bugfix", "hotfix"];
const REFACTOR_WORDS: &[&str] = &[
    "refactor",
    "refactors",
    "refactored",
    "refactoring",
    "cleanup",
    "restructure",
    "reorganize",
    "rename",
    "simplify",
];
const FEATURE_VERBS: &[&str] = &["add", "adds", "implement", "implements", "introduce", "support", "create"];

const CRITICAL_KEYWORDS: &[&str] = &["critical", "security", "vulnerability", "urgent", "hotfix"];
const MOCKED_KEYWORDS: &[&str] = &["mock", "stub", "fake", "temporary", "todo"];
const INCOMPLETE_KEYWORDS: &[&str] = &["wip", "incomplete", "partial", "draft", "placeholder"];

static TEST_PATHS: LazyLock<GlobSet> = LazyLock::new(|| build_globset(TEST_PATTERNS));
static DOC_PATHS: LazyLock<GlobSet> = LazyLock::new(|| build_globset(DOC_PATTERNS));

fn build_globset(patterns: &[&str]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match GlobBuilder::new(pattern).literal_separator(true).build() {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => debug!("Skipping invalid glob {pattern}: {e}"),
        }
    }
    builder.build().unwrap_or_else(|_| GlobSet::empty())
}

/// Derives a category from a subject line and the changed files.
///
/// Checked in order: conventional-commit prefix, test-only paths, fix
/// wording, docs-only paths, refactor wording, new source files or feature
/// verbs, and finally chore.
pub fn categorize(subject: &str, files: &[FileChange]) -> ChangeCategory {
    if let Some(category) = conventional_category(subject) {
        return category;
    }

    if !files.is_empty() && files.iter().all(|f| TEST_PATHS.is_match(&f.path)) {
        return ChangeCategory::Test;
    }

    let lower = subject.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    if words
        .iter()
        .any(|w| (w.starts_with("fix") && !w.starts_with("fixture")) || BUG_WORDS.contains(w))
    {
        return ChangeCategory::Fix;
    }

    if !files.is_empty() && files.iter().all(|f| DOC_PATHS.is_match(&f.path)) {
        return ChangeCategory::Docs;
    }

    if lower.contains("clean up") || words.iter().any(|w| REFACTOR_WORDS.contains(w)) {
        return ChangeCategory::Refactor;
    }

    let adds_source = files.iter().any(|f| {
        f.status == FileStatus::Added
            && f.additions >= NON_TRIVIAL_SOURCE_LINES
            && is_source_path(&f.path)
    });
    let feature_verb = words.first().is_some_and(|w| FEATURE_VERBS.contains(w));
    if adds_source || feature_verb {
        return ChangeCategory::Feature;
    }

    ChangeCategory::Chore
}

/// Maps a conventional-commit prefix (`type(scope)!: ...`) to a category.
fn conventional_category(subject: &str) -> Option<ChangeCategory> {
    let (prefix, _) = subject.split_once(':')?;
    let prefix = prefix.trim_end_matches('!');
    let kind = match prefix.find('(') {
        Some(paren) if prefix.ends_with(')') => &prefix[..paren],
        Some(_) => return None,
        None => prefix,
    };
    match kind.to_ascii_lowercase().as_str() {
        "feat" | "feature" => Some(ChangeCategory::Feature),
        "fix" => Some(ChangeCategory::Fix),
        "docs" | "doc" => Some(ChangeCategory::Docs),
        "test" | "tests" => Some(ChangeCategory::Test),
        "refactor" | "perf" => Some(ChangeCategory::Refactor),
        "chore" | "style" | "build" | "ci" => Some(ChangeCategory::Chore),
        _ => None,
    }
}

fn is_source_path(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

/// Collects review flags raised by any of the subjects.
pub fn review_notes<'a, I>(subjects: I) -> Vec<ReviewNote>
where
    I: IntoIterator<Item = &'a str>,
{
    let all = subjects
        .into_iter()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ");

    [
        (ReviewNote::CriticalChanges, CRITICAL_KEYWORDS),
        (ReviewNote::MockedDependencies, MOCKED_KEYWORDS),
        (ReviewNote::IncompleteFeatures, INCOMPLETE_KEYWORDS),
    ]
    .into_iter()
    .filter(|(_, keywords)| keywords.iter().any(|kw| all.contains(kw)))
    .map(|(note, _)| note)
    .collect()
}

/// Splits `items` into contiguous slices whose summed size stays within
/// `threshold`.
///
/// Greedy left-to-right: an item joins the current slice unless that would
/// push the total past the threshold. An item larger than the threshold
/// always gets a slice of its own. Reaching the threshold exactly is allowed.
pub fn split_by_size<T, F>(items: &[T], threshold: usize, size: F) -> Vec<&[T]>
where
    F: Fn(&T) -> usize,
{
    let mut slices = Vec::new();
    let mut start = 0;
    let mut running = 0usize;

    for (idx, item) in items.iter().enumerate() {
        let item_size = size(item);
        if idx > start && running.saturating_add(item_size) > threshold {
            slices.push(&items[start..idx]);
            start = idx;
            running = 0;
        }
        running = running.saturating_add(item_size);
    }
    if start < items.len() {
        slices.push(&items[start..]);
    }
    slices
}

/// Buckets commits into size-bounded, same-date groups.
///
/// Commits dated outside the configured start/end window are dropped first.
/// Order is preserved and every remaining commit lands in exactly one group.
/// An empty result is not an error.
pub fn analyze(commits: &[CommitInfo], config: &SquashConfig) -> Vec<CommitGroup> {
    let dated: Vec<(NaiveDate, &CommitInfo)> = commits
        .iter()
        .map(|c| (config.calendar_date(&c.date), c))
        .filter(|(date, _)| config.in_date_window(*date))
        .collect();

    let mut groups = Vec::new();
    let mut run_start = 0;
    while run_start < dated.len() {
        let date = dated[run_start].0;
        let run_len = dated[run_start..]
            .iter()
            .take_while(|(d, _)| *d == date)
            .count();
        let run = &dated[run_start..run_start + run_len];
        run_start += run_len;

        let slices = split_by_size(run, config.size_threshold, |(_, c)| c.changed_lines());
        let total = slices.len();
        for (idx, slice) in slices.into_iter().enumerate() {
            let part = (total > 1).then_some(GroupPart {
                index: idx + 1,
                total,
            });
            let commits = slice
                .iter()
                .map(|(_, c)| CategorizedCommit {
                    commit: (*c).clone(),
                    category: categorize(&c.subject, &c.files),
                })
                .collect();
            if let Some(group) = CommitGroup::new(date, part, commits) {
                debug!(
                    date = %group.label(),
                    commits = group.len(),
                    changed_lines = group.changed_lines(),
                    dominant = %group.dominant_category(),
                    "Built commit group"
                );
                groups.push(group);
            }
        }
    }

    groups
}

/// Where a commit's date falls relative to the configured window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WindowPosition {
    Before,
    Inside,
    After,
}

fn window_position(commit: &CommitInfo, config: &SquashConfig) -> WindowPosition {
    let date = config.calendar_date(&commit.date);
    if config.start_date.is_some_and(|start| date < start) {
        WindowPosition::Before
    } else if config.end_date.is_some_and(|end| date > end) {
        WindowPosition::After
    } else {
        WindowPosition::Inside
    }
}

/// Returns the commits inside the date window, checking they form one run.
///
/// Commits before the window must all precede it and commits after it must
/// all follow it. Rewriting starts at the parent of the first kept commit,
/// so a stray commit inside the run would silently be folded into a squash.
pub fn select_commits<'a>(
    commits: &'a [CommitInfo],
    config: &SquashConfig,
) -> Result<&'a [CommitInfo], SquashError> {
    if config.start_date.is_none() && config.end_date.is_none() {
        return Ok(commits);
    }
    let positions: Vec<WindowPosition> =
        commits.iter().map(|c| window_position(c, config)).collect();

    let first = positions
        .iter()
        .position(|p| *p == WindowPosition::Inside)
        .ok_or_else(|| SquashError::NoCommitsInDateWindow(config.describe_date_window()))?;
    let run_len = positions[first..]
        .iter()
        .take_while(|p| **p == WindowPosition::Inside)
        .count();
    let end = first + run_len;

    let stray = positions[..first]
        .iter()
        .position(|p| *p != WindowPosition::Before)
        .or_else(|| {
            positions[end..]
                .iter()
                .position(|p| *p != WindowPosition::After)
                .map(|idx| end + idx)
        });
    if let Some(idx) = stray {
        return Err(SquashError::NonContiguousSelection(
            commits[idx].short_hash().to_string(),
        ));
    }

    debug!(
        window = %config.describe_date_window(),
        kept = run_len,
        dropped_before = first,
        dropped_after = commits.len() - end,
        "Selected commits by date"
    );
    Ok(&commits[first..end])
}
