//! Error types for the finance workflow orchestrator

use thiserror::Error;

/// Result type alias for orchestrator operations
pub type Result<T> = std::result::Result<T, OrchestrationError>;

#[derive(Error, Debug)]
pub enum OrchestrationError {

    // =============================
    // Composition Errors
    // =============================

    #[error("Unknown capability: {0}")]
    UnknownCapability(String),

    #[error("Unsupported workflow kind: {0}")]
    UnsupportedWorkflowKind(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // =============================
    // Execution Errors
    // =============================

    #[error("Reasoning service error: {0}")]
    ServiceError(String),

    #[error("Invalid tool input: {0}")]
    InvalidToolInput(String),

    // =============================
    // Job Lifecycle Errors
    // =============================

    #[error("Job not found: {0}")]
    NotFound(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Results unavailable: {0}")]
    ResultsUnavailable(String),

    #[error("Audit error: {0}")]
    AuditError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    Internal(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
