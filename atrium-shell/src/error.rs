// Error types for the shell host

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShellError {
    #[error("Tenant not found: {0}")]
    TenantNotFound(String),

    #[error("Invalid tenant configuration for '{tenant}': {reason}")]
    Configuration { tenant: String, reason: String },

    #[error("Failed to load tenant settings: {0}")]
    LoadError(String),

    #[error("Failed to save tenant settings: {0}")]
    SaveError(String),

    #[error("Shell context creation failed for '{tenant}': {reason}")]
    ContextCreation { tenant: String, reason: String },

    #[error("Teardown of tenant '{tenant}' partially failed: {}", failures.join("; "))]
    Teardown {
        tenant: String,
        failures: Vec<String>,
    },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ShellError>;
