//! Preflight validation checks for early failure detection
//!
//! These run before any history is read or any request is sent, so a missing
//! key or a dirty work tree fails fast with a clear message.

use std::fmt;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::claude::ClaudeError;
use crate::config::DEFAULT_MODEL;
use crate::git::GitRepository;

/// Environment variables checked for an API key, in order.
pub const API_KEY_VARS: &[&str] = &["ANTHROPIC_API_KEY", "CLAUDE_API_KEY"];

/// Environment variable naming the model when `--model` is absent.
pub const MODEL_VAR: &str = "ANTHROPIC_MODEL";

/// Result of AI credential validation
pub struct AiCredentialInfo {
    /// The model that will be used
    pub model: String,
    /// API key for the Anthropic API
    pub api_key: String,
}

impl fmt::Debug for AiCredentialInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiCredentialInfo")
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Validate AI credentials are available before processing
///
/// Reads the environment with `~/.git-squash/settings.json` as fallback.
pub fn check_ai_credentials(model_override: Option<&str>) -> Result<AiCredentialInfo> {
    use crate::utils::settings::get_env_var;

    resolve_credentials(model_override, |key| get_env_var(key).ok())
}

/// Credential resolution over an arbitrary variable lookup.
fn resolve_credentials<F>(model_override: Option<&str>, lookup: F) -> Result<AiCredentialInfo>
where
    F: Fn(&str) -> Option<String>,
{
    let model = model_override
        .map(String::from)
        .or_else(|| lookup(MODEL_VAR))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    let api_key = API_KEY_VARS
        .iter()
        .find_map(|key| lookup(key).filter(|v| !v.trim().is_empty()))
        .ok_or(ClaudeError::ApiKeyNotFound)?;

    Ok(AiCredentialInfo { model, api_key })
}

/// Validate `path` is inside a git repository and open it
pub fn check_git_repository_at<P: AsRef<Path>>(path: P) -> Result<GitRepository> {
    GitRepository::open_at(path.as_ref()).with_context(|| {
        format!(
            "Not in a git repository: {}. Run from within a repository or pass --repo.",
            path.as_ref().display()
        )
    })
}

/// Validate working directory is clean (no uncommitted changes)
///
/// Staged and unstaged modifications count; untracked files do not, since
/// the rewrite never touches the work tree.
pub fn check_working_directory_clean(repo: &GitRepository) -> Result<()> {
    let status = repo
        .get_working_directory_status()
        .context("Failed to get working directory status")?;

    if !status.clean {
        let mut message = String::from("Working directory has uncommitted changes:\n");
        for change in &status.changes {
            message.push_str(&format!("  {} {}\n", change.status, change.file));
        }
        message.push_str("\nPlease commit or stash your changes before proceeding.");
        bail!(message);
    }

    Ok(())
}
