//! Data processing and serialization.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::squash::{ChangeCategory, PlanOutcome, SquashPlan};

pub mod yaml;

pub use yaml::*;

/// Exported view of a plan, written by `--save-plan`.
#[derive(Debug, Clone, Serialize)]
pub struct PlanDocument {
    /// Version of git-squash that produced the plan.
    pub version: String,
    /// When the document was generated.
    pub generated_at: DateTime<Utc>,
    /// Summarization backend that drafted the messages.
    pub backend: String,
    /// Branch the plan would be written to.
    pub target_branch: String,
    /// One-line summary, e.g. `12 commits -> 3 squashed commits`.
    pub summary: String,
    /// Number of groups that used the fallback message.
    pub fallback_count: usize,
    /// Planned operations in history order.
    pub operations: Vec<OperationRecord>,
}

/// One planned squash in a [`PlanDocument`].
#[derive(Debug, Clone, Serialize)]
pub struct OperationRecord {
    /// Group date, with a part marker when the date was split.
    pub group: String,
    /// Dominant category of the group.
    pub category: ChangeCategory,
    /// How the message was accepted.
    pub outcome: PlanOutcome,
    /// Full hashes of the commits being replaced, oldest first.
    pub commits: Vec<String>,
    /// Message the squashed commit will carry.
    pub message: String,
}

impl PlanDocument {
    /// Builds the document for `plan`.
    pub fn new(plan: &SquashPlan, backend: &str, target_branch: &str) -> Self {
        let operations = plan
            .operations
            .iter()
            .map(|op| OperationRecord {
                group: op.group.label(),
                category: op.category,
                outcome: op.outcome.clone(),
                commits: op
                    .group
                    .commits()
                    .iter()
                    .map(|c| c.commit.hash.clone())
                    .collect(),
                message: op.commit_message(),
            })
            .collect();

        Self {
            version: crate::VERSION.to_string(),
            generated_at: Utc::now(),
            backend: backend.to_string(),
            target_branch: target_branch.to_string(),
            summary: plan.summary_stats(),
            fallback_count: plan.fallback_count(),
            operations,
        }
    }
}

/// Writes `document` as YAML for `.yaml`/`.yml` paths, JSON otherwise.
pub fn save_plan<P: AsRef<Path>>(document: &PlanDocument, path: P) -> Result<()> {
    let path = path.as_ref();
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    if is_yaml {
        write_yaml_file(document, path)
    } else {
        let json = serde_json::to_string_pretty(document).context("Failed to serialize plan")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write file: {}", path.display()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::squash::{DraftMessage, SquashOperation};
    use tempfile::TempDir;

    fn sample_plan() -> SquashPlan {
        let commits = vec![
            crate::squash::types::CategorizedCommit {
                commit: crate::git::CommitInfo::new(
                    "aaaa1111bbbb",
                    None,
                    "Ada",
                    "ada@example.com",
                    DateTime::parse_from_rfc3339("2025-06-20T08:00:00Z").unwrap(),
                    "Fix crash",
                    Vec::new(),
                ),
                category: ChangeCategory::Fix,
            },
        ];
        let date = chrono::NaiveDate::from_ymd_opt(2025, 6, 20).unwrap();
        let group = crate::squash::CommitGroup::new(date, None, commits).unwrap();
        SquashPlan::new(vec![SquashOperation {
            category: ChangeCategory::Fix,
            message: DraftMessage::new("Fix crash on empty input", "- guard the parser"),
            outcome: PlanOutcome::FallbackAccepted {
                attempts: 3,
                reason: "backend down".to_string(),
            },
            group,
        }])
    }

    #[test]
    fn saves_json_by_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plan.json");
        let doc = PlanDocument::new(&sample_plan(), "deterministic", "squash/fix-2025-06-20");
        save_plan(&doc, &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["summary"], "1 commits -> 1 squashed commits");
        assert_eq!(value["fallback_count"], 1);
        assert_eq!(value["operations"][0]["category"], "fix");
        assert_eq!(value["operations"][0]["outcome"]["state"], "fallback_accepted");
        assert_eq!(value["operations"][0]["commits"][0], "aaaa1111bbbb");
    }

    #[test]
    fn saves_yaml_for_yaml_extensions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plan.YML");
        let doc = PlanDocument::new(&sample_plan(), "deterministic", "squash/x");
        save_plan(&doc, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_yaml::Value = serde_yaml::from_str(&text).unwrap();
        assert_eq!(value["target_branch"].as_str(), Some("squash/x"));
        let message = value["operations"][0]["message"].as_str().unwrap();
        assert!(message.starts_with("Fix crash on empty input\n\n- guard the parser"));
        assert!(message.ends_with("[fix] squashed 1 commit: aaaa1111..aaaa1111"));
    }
}
