//! Summarization backends.
//!
//! A [`Summarizer`] turns one [`CommitGroup`] into a [`DraftMessage`]. The
//! planner only sees the trait, so the live Claude-backed implementation and
//! the deterministic offline one are interchangeable.

use std::future::Future;
use std::pin::Pin;

use tracing::debug;

use crate::claude::ai::AiClient;
use crate::claude::error::ClaudeError;
use crate::claude::prompts;
use crate::config::{MessageLimits, SquashConfig};
use crate::squash::error::BackendError;
use crate::squash::format::{enforce_limits, normalize_draft};
use crate::squash::types::{CommitGroup, DraftMessage, SquashPlan};
use crate::squash::validator::Violation;

/// Boxed future returned by [`Summarizer`] methods.
pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, BackendError>> + Send + 'a>>;

/// Produces commit messages for groups of commits.
pub trait Summarizer: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Name shown to the user; live backends add the model.
    fn describe(&self) -> String {
        self.name().to_string()
    }

    /// Drafts a message for `group`.
    ///
    /// `guidance` lists what was wrong with the previous draft for this group
    /// and is empty on the first attempt.
    fn summarize<'a>(
        &'a self,
        group: &'a CommitGroup,
        config: &'a SquashConfig,
        guidance: &'a [Violation],
    ) -> BackendFuture<'a, DraftMessage>;

    /// Suggests a branch name suffix (without prefix) for a finished plan.
    fn suggest_branch_name<'a>(&'a self, plan: &'a SquashPlan) -> BackendFuture<'a, String>;
}

/// Builds the offline message for a group: category and date in the subject,
/// one bullet per commit in the body, trimmed to `limits`.
///
/// The planner also uses this as its fallback, so it never fails.
pub fn synthesize_message(group: &CommitGroup, limits: &MessageLimits) -> DraftMessage {
    let category = group.dominant_category();
    let mut subject = format!(
        "{category}: {} ({})",
        category.summary_phrase(),
        group.date()
    );
    if let Some(part) = group.part() {
        subject.push_str(&format!(" {part}"));
    }

    let body: Vec<String> = group
        .notes()
        .iter()
        .map(|note| format!("- note: {}", note.description()))
        .chain(
            group
                .commits()
                .iter()
                .map(|c| format!("- {}: {}", c.category, c.commit.subject)),
        )
        .collect();

    enforce_limits(&DraftMessage::new(subject, body.join("\n")), limits)
}

/// Branch suffix derived from the plan's dominant category and date range,
/// e.g. `fix-2025-06-20` or `feature-2025-06-20-to-2025-06-22`.
pub fn default_branch_slug(plan: &SquashPlan) -> String {
    let category = plan.dominant_category();
    match plan.date_range() {
        Some((first, last)) if first == last => format!("{category}-{first}"),
        Some((first, last)) => format!("{category}-{first}-to-{last}"),
        None => "updates".to_string(),
    }
}

/// Offline summarizer used in test mode or without credentials.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeterministicSummarizer;

impl Summarizer for DeterministicSummarizer {
    fn name(&self) -> &str {
        "deterministic"
    }

    fn summarize<'a>(
        &'a self,
        group: &'a CommitGroup,
        config: &'a SquashConfig,
        _guidance: &'a [Violation],
    ) -> BackendFuture<'a, DraftMessage> {
        Box::pin(async move { Ok(synthesize_message(group, &config.limits)) })
    }

    fn suggest_branch_name<'a>(&'a self, plan: &'a SquashPlan) -> BackendFuture<'a, String> {
        Box::pin(async move { Ok(default_branch_slug(plan)) })
    }
}

/// Summarizer backed by a remote language model.
pub struct LiveSummarizer {
    client: Box<dyn AiClient>,
}

impl LiveSummarizer {
    /// Wraps an AI client.
    pub fn new(client: Box<dyn AiClient>) -> Self {
        let metadata = client.get_metadata();
        debug!(
            provider = %metadata.provider,
            model = %metadata.model,
            max_response_length = metadata.max_response_length,
            "Using AI client"
        );
        Self { client }
    }
}

/// Sorts client errors into the two retryable kinds.
fn classify_client_error(err: &anyhow::Error) -> BackendError {
    match err.downcast_ref::<ClaudeError>() {
        Some(ClaudeError::InvalidResponseFormat(msg)) => {
            BackendError::MalformedResponse(msg.clone())
        }
        _ => BackendError::Unavailable(format!("{err:#}")),
    }
}

impl Summarizer for LiveSummarizer {
    fn name(&self) -> &str {
        "claude"
    }

    fn describe(&self) -> String {
        format!("{} ({})", self.name(), self.client.get_metadata().model)
    }

    fn summarize<'a>(
        &'a self,
        group: &'a CommitGroup,
        config: &'a SquashConfig,
        guidance: &'a [Violation],
    ) -> BackendFuture<'a, DraftMessage> {
        Box::pin(async move {
            let user_prompt = prompts::build_user_prompt(group, config, guidance);
            let response = self
                .client
                .send_request(prompts::SYSTEM_PROMPT, &user_prompt)
                .await
                .map_err(|e| classify_client_error(&e))?;

            let raw = prompts::parse_commit_message(&response, config.limits.subject)
                .ok_or_else(|| {
                    BackendError::MalformedResponse(
                        "no <commit-message> block in response".to_string(),
                    )
                })?;

            let draft = normalize_draft(&raw);
            if draft.subject.is_empty() {
                return Err(BackendError::MalformedResponse(
                    "response has an empty subject line".to_string(),
                ));
            }
            debug!(
                group = %group.label(),
                subject = %draft.subject,
                body_lines = draft.body.lines().count(),
                "Parsed drafted commit message"
            );
            Ok(draft)
        })
    }

    fn suggest_branch_name<'a>(&'a self, plan: &'a SquashPlan) -> BackendFuture<'a, String> {
        Box::pin(async move {
            let prompt = prompts::build_branch_name_prompt(plan);
            let response = self
                .client
                .send_request(prompts::BRANCH_SYSTEM_PROMPT, &prompt)
                .await
                .map_err(|e| classify_client_error(&e))?;
            prompts::parse_branch_name(&response).ok_or_else(|| {
                BackendError::MalformedResponse("no usable <branch-name> in response".to_string())
            })
        })
    }
}
