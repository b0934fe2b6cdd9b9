//! Error types for the Samovar domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Samovar operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Conversation store errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Intent classifier errors ---
    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Errors from the conversation/profile persistence layer.
///
/// The backend being unreachable is fatal to the current request; the core
/// never retries — callers decide whether to retry or drop the message.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Persistence backend unavailable: {0}")]
    Unavailable(String),

    #[error("Corrupt record for key {key}: {reason}")]
    CorruptRecord { key: String, reason: String },
}

#[derive(Debug, Error)]
pub enum ToolError {
    /// The model requested a tool name that is not registered.
    #[error("Unknown tool: {0}")]
    Unknown(String),

    /// The model's tool-call arguments failed to parse as a JSON object.
    #[error("Malformed tool arguments for {tool_name}: {reason}")]
    MalformedArguments { tool_name: String, reason: String },

    /// The tool's own implementation failed (missing credential, upstream
    /// HTTP failure, ...). Propagates up through the orchestrator as a
    /// cycle failure.
    #[error("Tool execution failed: {tool_name} — {reason}")]
    Execution { tool_name: String, reason: String },
}

#[derive(Debug, Clone, Error)]
pub enum ClassifierError {
    #[error("Intent classifier unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::Api {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn unknown_tool_displays_name() {
        let err = Error::Tool(ToolError::Unknown("search".into()));
        assert!(err.to_string().contains("search"));
    }

    #[test]
    fn store_error_wraps_into_top_level() {
        let err: Error = StoreError::Unavailable("connection refused".into()).into();
        assert!(matches!(err, Error::Store(StoreError::Unavailable(_))));
    }
}
