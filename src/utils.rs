//! Utility functions and helpers.

pub mod preflight;
pub mod settings;

pub use preflight::{
    check_ai_credentials, check_git_repository_at, check_working_directory_clean,
    AiCredentialInfo,
};
pub use settings::{get_env_var, Settings};
