//! Error types for the runtime boundary and the analysis pipeline.
//!
//! `RuntimeError` never reaches the end user: the analyzer and refiner absorb
//! it and substitute the deterministic fallback. `PipelineError` is the only
//! error a caller of `analyze_prompt` can observe.

use thiserror::Error;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Failure talking to the local model runtime.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Runtime binary '{binary}' not found on PATH")]
    NotInstalled { binary: String },

    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' exited with code {code:?}: {stderr}")]
    NonZeroExit {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Timeout exceeded: {operation} took longer than {after_ms}ms")]
    Timeout { operation: String, after_ms: u64 },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Runtime returned an empty response")]
    EmptyResponse,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RuntimeError {
    /// True when the runtime could not be reached at all, as opposed to
    /// answering with something unusable.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::NotInstalled { .. } | Self::Spawn { .. } | Self::Timeout { .. }
        ) || matches!(self, Self::Transport(e) if e.is_connect() || e.is_timeout())
    }

    /// True when the runtime answered but the answer could not be used.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::MalformedResponse(_) | Self::EmptyResponse | Self::Json(_)
        )
    }
}

/// User-visible validation failure, raised before any backend call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Please enter a prompt to analyze")]
    EmptyPrompt,
}
