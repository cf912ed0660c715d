//! Prompt templates and response parsing for squash summaries.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::SquashConfig;
use crate::squash::types::{CommitGroup, SquashPlan};
use crate::squash::validator::Violation;

/// Commit subjects listed before the prompt switches to a count.
const MAX_LISTED_SUBJECTS: usize = 15;

/// Changed paths listed before the prompt switches to a count.
const MAX_LISTED_PATHS: usize = 40;

/// Longest branch suffix accepted from the model.
pub const MAX_BRANCH_SLUG_LEN: usize = 50;

/// System prompt for squash commit messages.
pub const SYSTEM_PROMPT: &str = "You are an expert software engineer who writes focused, \
high-quality git commit messages following the 50/72 rule and git best practices. \
Each message you write replaces a batch of small commits with a single squashed commit, \
so it must describe what changed across the whole batch and why it matters.";

/// System prompt for branch name suggestions.
pub const BRANCH_SYSTEM_PROMPT: &str =
    "You suggest concise, descriptive git branch names in kebab-case.";

static COMMIT_MESSAGE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<commit-message>\s*(.*?)\s*</commit-message>").unwrap()
});

static BRANCH_NAME_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<branch-name>([^<]+)</branch-name>").unwrap());

/// Builds the user prompt for one group.
///
/// On retries `guidance` carries the problems found in the previous draft.
pub fn build_user_prompt(
    group: &CommitGroup,
    config: &SquashConfig,
    guidance: &[Violation],
) -> String {
    let limits = &config.limits;
    let mut prompt = format!(
        "Summarize these {} commits from {} into one squashed commit message.\n\n",
        group.len(),
        group.label()
    );

    prompt.push_str("Original commit messages:\n");
    for commit in group.commits().iter().take(MAX_LISTED_SUBJECTS) {
        prompt.push_str(&format!("- [{}] {}\n", commit.category, commit.commit.subject));
    }
    if group.len() > MAX_LISTED_SUBJECTS {
        prompt.push_str(&format!(
            "... and {} more\n",
            group.len() - MAX_LISTED_SUBJECTS
        ));
    }

    let mut paths: Vec<&str> = group
        .commits()
        .iter()
        .flat_map(|c| c.commit.paths())
        .collect();
    paths.sort_unstable();
    paths.dedup();
    prompt.push_str(&format!(
        "\nFiles changed ({} lines changed in total):\n",
        group.changed_lines()
    ));
    for path in paths.iter().take(MAX_LISTED_PATHS) {
        prompt.push_str(&format!("- {path}\n"));
    }
    if paths.len() > MAX_LISTED_PATHS {
        prompt.push_str(&format!("... and {} more\n", paths.len() - MAX_LISTED_PATHS));
    }

    let tally = group
        .category_tally()
        .iter()
        .map(|(category, count)| format!("{count} {category}"))
        .collect::<Vec<_>>()
        .join(", ");
    prompt.push_str(&format!("\nChange summary: {tally}\n"));

    for note in group.notes() {
        prompt.push_str(&format!("WARNING: {}\n", note.description()));
    }

    prompt.push_str(&format!(
        "\nWrite the message following the 50/72 rule:\n\
         1. Subject line of at most {subject} characters, imperative mood, \
         first letter capitalized, no trailing period.\n\
         2. A blank line.\n\
         3. Body lines of at most {body} characters. Use \"- \" bullets for key \
         changes, ordered by significance. Add \"note:\" entries for incomplete \
         work or breaking changes.\n\
         Keep the whole message under {total} characters.\n",
        subject = limits.subject,
        body = limits.body_line,
        total = limits.total,
    ));

    if !guidance.is_empty() {
        prompt.push_str("\nYour previous message was rejected:\n");
        for violation in guidance {
            prompt.push_str(&format!("- {violation}\n"));
        }
        prompt.push_str("Write a shorter message that fixes every problem above.\n");
    }

    prompt.push_str(
        "\nFormat your response exactly as:\n\
         <commit-message>\n\
         Subject line here\n\
         \n\
         Body content here\n\
         </commit-message>",
    );
    prompt
}

/// Extracts the message between `<commit-message>` tags.
///
/// Without tags, the whole response is used when its first line would fit as
/// a subject.
pub fn parse_commit_message(response: &str, subject_limit: usize) -> Option<String> {
    if let Some(captures) = COMMIT_MESSAGE_TAG.captures(response) {
        let message = captures.get(1)?.as_str().trim();
        return (!message.is_empty()).then(|| message.to_string());
    }

    let trimmed = response.trim();
    let first_line = trimmed.lines().next()?;
    if !first_line.trim().is_empty() && first_line.chars().count() <= subject_limit {
        return Some(trimmed.to_string());
    }
    None
}

/// Builds the user prompt asking for a branch name suffix.
pub fn build_branch_name_prompt(plan: &SquashPlan) -> String {
    let mut prompt =
        String::from("Suggest a concise branch name (2-3 words) for these squashed commits:\n\n");
    for op in &plan.operations {
        prompt.push_str(&format!("- {}\n", op.message.subject));
    }
    prompt.push_str(
        "\nGuidelines:\n\
         - Focus on the main feature or fix\n\
         - Use kebab-case (e.g. \"cache-layer\", \"user-auth\", \"api-fixes\")\n\
         - Be descriptive but brief\n\n\
         Format your response exactly as: <branch-name>your-suggestion</branch-name>",
    );
    prompt
}

/// Extracts and sanitizes the suggestion between `<branch-name>` tags.
pub fn parse_branch_name(response: &str) -> Option<String> {
    let raw = BRANCH_NAME_TAG.captures(response)?.get(1)?.as_str();
    sanitize_branch_slug(raw)
}

/// Lowercases `raw` and reduces it to `[a-z0-9-]`, collapsing separators.
///
/// Returns `None` when nothing usable remains or the result is too long.
pub fn sanitize_branch_slug(raw: &str) -> Option<String> {
    let mut slug = String::with_capacity(raw.len());
    for ch in raw.trim().to_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            slug.push(ch);
        } else if (ch.is_whitespace() || ch == '_' || ch == '-' || ch == '/')
            && !slug.is_empty()
            && !slug.ends_with('-')
        {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-').to_string();
    (!slug.is_empty() && slug.len() <= MAX_BRANCH_SLUG_LEN).then_some(slug)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::squash::test_utils::group_of;
    use crate::squash::types::ChangeCategory;

    #[test]
    fn user_prompt_lists_subjects_tally_and_limits() {
        let group = group_of(&[
            ("a1", "Fix crash on empty input", ChangeCategory::Fix),
            ("b2", "WIP: document parser", ChangeCategory::Docs),
        ]);
        let prompt = build_user_prompt(&group, &SquashConfig::default(), &[]);

        assert!(prompt.contains("2 commits from 2025-06-20"));
        assert!(prompt.contains("- [fix] Fix crash on empty input"));
        assert!(prompt.contains("- src/lib.rs"));
        assert!(prompt.contains("Change summary: 1 fix, 1 docs"));
        assert!(prompt.contains("WARNING: contains incomplete work"));
        assert!(prompt.contains("at most 50 characters"));
        assert!(!prompt.contains("previous message was rejected"));
    }

    #[test]
    fn user_prompt_includes_retry_guidance() {
        let group = group_of(&[("a1", "Tweak", ChangeCategory::Chore)]);
        let guidance = [Violation::SubjectTooLong {
            length: 64,
            limit: 50,
        }];
        let prompt = build_user_prompt(&group, &SquashConfig::default(), &guidance);
        assert!(prompt.contains("previous message was rejected"));
        assert!(prompt.contains("- subject line is 64 characters (limit 50)"));
    }

    #[test]
    fn parses_tagged_message() {
        let response = "Sure!\n<commit-message>\nAdd parser\n\n- lexer\n</commit-message>\nDone";
        assert_eq!(
            parse_commit_message(response, 50).as_deref(),
            Some("Add parser\n\n- lexer")
        );
    }

    #[test]
    fn falls_back_to_raw_message() {
        assert_eq!(
            parse_commit_message("Add parser\n\n- lexer", 50).as_deref(),
            Some("Add parser\n\n- lexer")
        );
        let rambling = "Here is a long preamble that is certainly not a commit subject line at all";
        assert_eq!(parse_commit_message(rambling, 50), None);
        assert_eq!(parse_commit_message("<commit-message> </commit-message>", 50), None);
    }

    #[test]
    fn branch_names_are_sanitized() {
        assert_eq!(
            parse_branch_name("<branch-name>Cache Layer_Improvements!</branch-name>").as_deref(),
            Some("cache-layer-improvements")
        );
        assert_eq!(sanitize_branch_slug("--api // fixes--").as_deref(), Some("api-fixes"));
        assert_eq!(sanitize_branch_slug("!!!"), None);
        assert_eq!(sanitize_branch_slug(&"a".repeat(51)), None);
        assert_eq!(parse_branch_name("no tags here"), None);
    }
}
