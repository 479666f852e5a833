//! Error types for the workspace storage operator
//!
//! Provides structured error types for strategy resolution, claim
//! provisioning, and removal-event cleanup.

use thiserror::Error;

/// Unified error type for the operator
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // =========================================================================
    // Provisioning Errors
    // =========================================================================
    #[error("Provisioning failed for machine '{machine}': {reason}")]
    Provisioning { machine: String, reason: String },

    // =========================================================================
    // Cleanup Errors
    // =========================================================================
    #[error("Cleanup failed for workspace '{workspace_id}': {reason}")]
    Cleanup {
        workspace_id: String,
        reason: String,
    },

    // =========================================================================
    // Kubernetes Errors
    // =========================================================================
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    // =========================================================================
    // Parse Errors
    // =========================================================================
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where a failure takes effect, and therefore how far it propagates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureScope {
    /// Aborts subsystem startup; not recoverable
    Startup,
    /// Fails the single workspace-start operation that triggered it
    WorkspaceStart,
    /// Scoped to one removal event; reported, never propagated across events
    RemovalEvent,
}

impl Error {
    /// Classify this error by the operation it fails
    pub fn scope(&self) -> FailureScope {
        match self {
            Error::Configuration(_)
            | Error::YamlParse(_)
            | Error::JsonParse(_)
            | Error::Io(_)
            | Error::Internal(_) => FailureScope::Startup,

            Error::Provisioning { .. } => FailureScope::WorkspaceStart,

            Error::Cleanup { .. } | Error::Kube(_) => FailureScope::RemovalEvent,
        }
    }

    /// Check if this error must abort the operation that raised it
    pub fn is_fatal(&self) -> bool {
        !matches!(self.scope(), FailureScope::RemovalEvent)
    }
}

/// Result type alias for the operator
pub type Result<T> = std::result::Result<T, Error>;
