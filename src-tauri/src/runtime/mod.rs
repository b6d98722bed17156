//! Local model runtime boundary.
//!
//! The runtime is an opaque black box reached either over its local HTTP API
//! or by spawning its command-line binary. Both transports implement
//! `ModelRuntime`; everything upstream (probe, analyzer, refiner) only sees
//! the trait, so the two are interchangeable.
//!
//!   - http.rs:    reqwest client for `/api/tags` + `/api/generate`
//!   - cli.rs:     tokio::process for `list` + `run`
//!   - listing.rs: model-listing parser shared by both
//!   - pull.rs:    model download with progress reporting

pub mod cli;
pub mod http;
pub mod listing;
pub mod pull;

use crate::config::{RuntimeConfig, Transport};
use crate::error::{RuntimeError, RuntimeResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub use cli::CliRuntime;
pub use http::HttpRuntime;

/// One generation request. The runtime is asked for the whole response at
/// once; nothing upstream consumes partial output.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub prompt: String,
    /// Ask the runtime to constrain output to JSON.
    pub json: bool,
    pub temperature: f32,
    pub top_p: f32,
}

impl GenerateRequest {
    /// Structured analysis: low temperature, JSON-constrained.
    pub fn structured(prompt: String) -> Self {
        Self {
            prompt,
            json: true,
            temperature: 0.3,
            top_p: 0.9,
        }
    }

    /// Free-text rewrite.
    pub fn free_text(prompt: String) -> Self {
        Self {
            prompt,
            json: false,
            temperature: 0.7,
            top_p: 0.9,
        }
    }
}

#[async_trait]
pub trait ModelRuntime: Send + Sync {
    fn transport(&self) -> Transport;

    /// The runtime's lightweight status operation: lists local models.
    async fn list_models(&self) -> RuntimeResult<Vec<String>>;

    /// Full round trip: submit the payload, return the complete response text.
    async fn generate(&self, request: &GenerateRequest) -> RuntimeResult<String>;
}

/// Build the runtime selected by `config.transport`.
pub fn from_config(config: &RuntimeConfig) -> Arc<dyn ModelRuntime> {
    match config.transport {
        Transport::Http => Arc::new(HttpRuntime::new(
            &config.base_url,
            &config.model,
            config.generate_timeout,
        )),
        Transport::Cli => Arc::new(CliRuntime::new(
            &config.binary,
            &config.model,
            config.generate_timeout,
        )),
    }
}

/// Result of one availability probe. Recomputed on every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityStatus {
    pub is_installed: bool,
    pub is_running: bool,
    pub available_models: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AvailabilityStatus {
    pub fn running(models: Vec<String>) -> Self {
        Self {
            is_installed: true,
            is_running: true,
            available_models: models,
            error: None,
        }
    }

    pub fn unavailable(error: impl Into<String>) -> Self {
        Self {
            is_installed: false,
            is_running: false,
            available_models: Vec::new(),
            error: Some(error.into()),
        }
    }

    /// Running with at least one model to talk to.
    pub fn is_ready(&self) -> bool {
        self.is_running && !self.available_models.is_empty()
    }

    /// Whether `model` is pulled locally. `llama3.2` matches `llama3.2:latest`.
    pub fn has_model(&self, model: &str) -> bool {
        self.available_models.iter().any(|m| {
            m == model
                || m.strip_prefix(model)
                    .is_some_and(|rest| rest.starts_with(':'))
        })
    }
}

/// Probe the runtime within `timeout`.
///
/// Never fails: timeout, spawn error, non-zero exit and malformed listing all
/// become an `unavailable` status. When the timer wins, the pending listing
/// future is dropped, which aborts the HTTP request or kills the child
/// process (spawned with `kill_on_drop`).
pub async fn probe(runtime: &dyn ModelRuntime, timeout: Duration) -> AvailabilityStatus {
    let start = std::time::Instant::now();
    let outcome = tokio::time::timeout(timeout, runtime.list_models()).await;
    let elapsed_ms = start.elapsed().as_millis();

    match outcome {
        Ok(Ok(models)) => {
            log::info!(
                "[PROBE] {} runtime up in {}ms, {} model(s): [{}]",
                runtime.transport().as_str(),
                elapsed_ms,
                models.len(),
                models.join(", ")
            );
            AvailabilityStatus::running(models)
        }
        Ok(Err(e)) => {
            log::info!("[PROBE] Runtime not available: {}", e);
            AvailabilityStatus::unavailable(e.to_string())
        }
        Err(_) => {
            let err = RuntimeError::Timeout {
                operation: "availability probe".to_string(),
                after_ms: timeout.as_millis() as u64,
            };
            log::info!("[PROBE] {}", err);
            AvailabilityStatus::unavailable(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Listing(Vec<&'static str>);

    #[async_trait]
    impl ModelRuntime for Listing {
        fn transport(&self) -> Transport {
            Transport::Http
        }
        async fn list_models(&self) -> RuntimeResult<Vec<String>> {
            Ok(self.0.iter().map(|s| s.to_string()).collect())
        }
        async fn generate(&self, _: &GenerateRequest) -> RuntimeResult<String> {
            Err(RuntimeError::EmptyResponse)
        }
    }

    struct Hangs;

    #[async_trait]
    impl ModelRuntime for Hangs {
        fn transport(&self) -> Transport {
            Transport::Cli
        }
        async fn list_models(&self) -> RuntimeResult<Vec<String>> {
            std::future::pending().await
        }
        async fn generate(&self, _: &GenerateRequest) -> RuntimeResult<String> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn probe_reports_models() {
        let status = probe(&Listing(vec!["llama3.2:3b-instruct-fp16"]), Duration::from_secs(1)).await;
        assert!(status.is_installed && status.is_running);
        assert!(status.is_ready());
        assert!(status.error.is_none());
    }

    #[tokio::test]
    async fn running_without_models_is_not_ready() {
        let status = probe(&Listing(vec![]), Duration::from_secs(1)).await;
        assert!(status.is_running);
        assert!(!status.is_ready());
    }

    #[tokio::test]
    async fn probe_times_out_in_bounded_time() {
        let start = std::time::Instant::now();
        let status = probe(&Hangs, Duration::from_millis(100)).await;
        assert!(start.elapsed() < Duration::from_secs(1));
        assert!(!status.is_installed);
        assert!(!status.is_running);
        assert!(status.available_models.is_empty());
        assert!(status.error.as_deref().unwrap_or("").contains("100ms"));
    }

    #[test]
    fn has_model_matches_tags() {
        let status = AvailabilityStatus::running(vec![
            "llama3.2:latest".to_string(),
            "mistral:7b".to_string(),
        ]);
        assert!(status.has_model("llama3.2"));
        assert!(status.has_model("mistral:7b"));
        assert!(!status.has_model("llama3"));
        assert!(!status.has_model("qwen2.5"));
    }

    #[test]
    fn status_serializes_camel_case() {
        let json = serde_json::to_value(AvailabilityStatus::running(vec!["a".into()])).unwrap();
        assert_eq!(json["isRunning"], true);
        assert_eq!(json["availableModels"][0], "a");
        assert!(json.get("error").is_none());
    }
}
