//! Turns commit groups into finalized squash operations.
//!
//! Each group runs through a small state machine:
//!
//! ```text
//! Summarizing -> Validating -> Accepted
//!      ^              |
//!      |              v
//!      +-------- Retrying -> Exhausted -> FallbackAccepted
//! ```
//!
//! Backend failures and invalid drafts both go through `Retrying`. Once the
//! attempt budget is spent the group falls back to the synthesized message,
//! so every group ends in a terminal state and [`plan`] never fails.

use tracing::{debug, info, warn};

use crate::config::SquashConfig;
use crate::squash::backend::{synthesize_message, Summarizer};
use crate::squash::error::BackendError;
use crate::squash::types::{CommitGroup, DraftMessage, PlanOutcome, SquashOperation, SquashPlan};
use crate::squash::validator::{validate, Violation};

/// Per-group planning state.
#[derive(Debug)]
enum GroupState {
    Summarizing {
        attempt: u32,
        guidance: Vec<Violation>,
    },
    Validating {
        attempt: u32,
        draft: DraftMessage,
    },
    Retrying {
        attempt: u32,
        reason: String,
        guidance: Vec<Violation>,
    },
    Exhausted {
        attempts: u32,
        reason: String,
    },
    Accepted {
        attempts: u32,
        draft: DraftMessage,
    },
    FallbackAccepted {
        attempts: u32,
        reason: String,
        draft: DraftMessage,
    },
}

/// Plans every group in order, one backend call at a time.
///
/// The returned plan has exactly one operation per input group, in input
/// order.
pub async fn plan(
    groups: Vec<CommitGroup>,
    backend: &dyn Summarizer,
    config: &SquashConfig,
) -> SquashPlan {
    let total = groups.len();
    let mut operations = Vec::with_capacity(total);

    for (idx, group) in groups.into_iter().enumerate() {
        info!(
            group = idx + 1,
            total,
            date = %group.label(),
            commits = group.len(),
            backend = backend.name(),
            "Planning commit group"
        );
        operations.push(plan_group(group, backend, config).await);
    }

    let plan = SquashPlan::new(operations);
    info!(
        summary = %plan.summary_stats(),
        fallbacks = plan.fallback_count(),
        "Planning finished"
    );
    plan
}

/// Drives one group to a terminal state.
async fn plan_group(
    group: CommitGroup,
    backend: &dyn Summarizer,
    config: &SquashConfig,
) -> SquashOperation {
    let mut state = GroupState::Summarizing {
        attempt: 1,
        guidance: Vec::new(),
    };

    let (message, outcome) = loop {
        state = match state {
            GroupState::Summarizing { attempt, guidance } => {
                debug!(attempt, date = %group.label(), "Requesting summary");
                match summarize_attempt(backend, &group, config, &guidance).await {
                    Ok(draft) => GroupState::Validating { attempt, draft },
                    Err(err) => {
                        warn!(attempt, date = %group.label(), "Summary attempt failed: {err}");
                        GroupState::Retrying {
                            attempt,
                            reason: err.to_string(),
                            guidance,
                        }
                    }
                }
            }
            GroupState::Validating { attempt, draft } => {
                let result = validate(&draft, &config.limits);
                if result.ok() {
                    GroupState::Accepted {
                        attempts: attempt,
                        draft,
                    }
                } else {
                    let reason = result
                        .violations
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join("; ");
                    warn!(attempt, date = %group.label(), "Draft rejected: {reason}");
                    GroupState::Retrying {
                        attempt,
                        reason,
                        guidance: result.violations,
                    }
                }
            }
            GroupState::Retrying {
                attempt,
                reason,
                guidance,
            } => {
                if attempt < config.max_attempts {
                    GroupState::Summarizing {
                        attempt: attempt + 1,
                        guidance,
                    }
                } else {
                    GroupState::Exhausted {
                        attempts: attempt,
                        reason,
                    }
                }
            }
            GroupState::Exhausted { attempts, reason } => {
                warn!(
                    attempts,
                    date = %group.label(),
                    "Attempts exhausted, using synthesized message"
                );
                GroupState::FallbackAccepted {
                    attempts,
                    draft: synthesize_message(&group, &config.limits),
                    reason,
                }
            }
            GroupState::Accepted { attempts, draft } => {
                break (draft, PlanOutcome::Accepted { attempts });
            }
            GroupState::FallbackAccepted {
                attempts,
                reason,
                draft,
            } => {
                break (draft, PlanOutcome::FallbackAccepted { attempts, reason });
            }
        };
    };

    SquashOperation {
        category: group.dominant_category(),
        group,
        message,
        outcome,
    }
}

/// One backend call bounded by the configured attempt timeout.
async fn summarize_attempt(
    backend: &dyn Summarizer,
    group: &CommitGroup,
    config: &SquashConfig,
    guidance: &[Violation],
) -> Result<DraftMessage, BackendError> {
    match tokio::time::timeout(
        config.attempt_timeout,
        backend.summarize(group, config, guidance),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => Err(BackendError::Unavailable(format!(
            "attempt timed out after {}s",
            config.attempt_timeout.as_secs_f64()
        ))),
    }
}
