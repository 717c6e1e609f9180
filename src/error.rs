//! Error types for the resume intake agent.

/// Top-level error type for the agent.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Mailbox error: {0}")]
    Mailbox(#[from] MailboxError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Configuration-related errors. These only occur at bootstrap and
/// terminate the process with a non-zero exit.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Mailbox access errors.
///
/// `SearchFailed` aborts the whole pass (the Scheduler's retry wrapper is
/// the recovery mechanism). Read and attachment-fetch failures are scoped
/// to one message and never stop the batch.
#[derive(Debug, thiserror::Error)]
pub enum MailboxError {
    #[error("Mailbox search failed: {0}")]
    SearchFailed(String),

    #[error("Failed to read message {id}: {reason}")]
    ReadFailed { id: String, reason: String },

    #[error("Failed to fetch attachment {handle} from message {id}: {reason}")]
    AttachmentFetchFailed {
        id: String,
        handle: String,
        reason: String,
    },

    #[error("Failed to decode attachment data: {0}")]
    Decode(String),

    #[error("HTTP error: {0}")]
    Http(String),
}

/// Reasoning-collaborator errors.
///
/// Classification failures are converted to a safe-reject by the caller;
/// structuring failures become a rejection record. Neither aborts a pass.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response from LLM: {0}")]
    InvalidResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Tabular-store errors. A failed write must not be silently dropped, so
/// these propagate and end the per-message attempt as Failed.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Failed to open sheet {name}: {reason}")]
    OpenFailed { name: String, reason: String },

    #[error("Failed to create sheet {name}: {reason}")]
    CreateFailed { name: String, reason: String },

    #[error("Failed to append row to sheet {name}: {reason}")]
    AppendFailed { name: String, reason: String },

    #[error("Failed to share sheet {name} with {identity}: {reason}")]
    ShareFailed {
        name: String,
        identity: String,
        reason: String,
    },

    #[error("HTTP error: {0}")]
    Http(String),
}

/// Pass-level pipeline errors, the cases that end a `run_once` early and
/// surface to the Scheduler as a retryable attempt failure.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Discovery failed: {0}")]
    Discovery(#[from] MailboxError),

    #[error("Sink write failed: {0}")]
    Sink(#[from] SinkError),
}

/// Result type alias for the agent.
pub type Result<T> = std::result::Result<T, Error>;
