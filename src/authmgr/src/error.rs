//! Error types for the authorization manager

use crate::guard::Denial;
use thiserror::Error;

/// Authorization manager errors
///
/// Configuration problems and guard denials are errors. Unknown capabilities
/// and unknown roles are ordinary "not granted" answers.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// A trusted range could not be parsed as an IPv4 CIDR block
    #[error("Invalid CIDR range '{range}': {reason}")]
    InvalidCidr {
        /// Range as written in the configuration
        range: String,
        /// Parser message
        reason: String,
    },

    /// Configuration table with an invalid shape (empty names and the like)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A guarded action was refused; the host must not perform it
    #[error("Access denied for capability '{capability}': {denial}")]
    AccessDenied {
        capability: String,
        denial: Denial,
    },

    /// Configuration text is not valid JSON for the expected tables
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// I/O error while reading configuration
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for authorization operations
pub type Result<T> = std::result::Result<T, AuthzError>;
