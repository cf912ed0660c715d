//! Claude API integration for drafting squash commit messages.

pub mod ai;
pub mod error;
pub mod prompts;

#[cfg(test)]
pub(crate) mod test_utils;

pub use ai::claude::ClaudeAiClient;
pub use ai::{AiClient, AiClientMetadata};
pub use error::ClaudeError;

use anyhow::Result;

use crate::utils::preflight::AiCredentialInfo;

/// Builds the AI client described by validated credentials.
pub fn create_ai_client(credentials: &AiCredentialInfo) -> Result<Box<dyn AiClient>> {
    let client = ClaudeAiClient::new(credentials.model.clone(), credentials.api_key.clone())?;
    Ok(Box::new(client))
}
