//! Prompt rewriting.
//!
//! The model path returns the runtime's trimmed text verbatim. The fallback
//! composes a rewrite from the analysis alone and is a pure function of
//! `(prompt, analysis)`.

use super::prompts;
use super::types::{AnalysisResult, Complexity, FallbackReason, Origin};
use crate::config::RuntimeConfig;
use crate::error::{RuntimeError, RuntimeResult};
use crate::runtime::{self, GenerateRequest, ModelRuntime};
use std::fmt::Write as _;
use std::sync::Arc;

/// Key elements restated in the fallback rewrite.
const FALLBACK_KEY_ELEMENTS: usize = 4;

#[derive(Clone)]
pub struct Refiner {
    runtime: Arc<dyn ModelRuntime>,
    config: RuntimeConfig,
}

impl Refiner {
    pub fn new(runtime: Arc<dyn ModelRuntime>, config: RuntimeConfig) -> Self {
        Self { runtime, config }
    }

    pub fn from_config(config: RuntimeConfig) -> Self {
        Self::new(runtime::from_config(&config), config)
    }

    pub fn with_model_enabled(&self, enabled: bool) -> Self {
        Self {
            runtime: Arc::clone(&self.runtime),
            config: self.config.clone().with_model_enabled(enabled),
        }
    }

    pub async fn refine(&self, prompt: &str, analysis: &AnalysisResult) -> String {
        self.refine_traced(prompt, analysis).await.0
    }

    pub async fn refine_traced(&self, prompt: &str, analysis: &AnalysisResult) -> (String, Origin) {
        if !self.config.model_enabled {
            return (
                compose_fallback(prompt, analysis),
                Origin::Fallback(FallbackReason::Disabled),
            );
        }

        match self.ask_model(prompt, analysis).await {
            Ok(text) => (text, Origin::Model),
            Err(e) => {
                log::warn!("[REFINE] Falling back to template rewrite: {}", e);
                (compose_fallback(prompt, analysis), Origin::from_error(&e))
            }
        }
    }

    async fn ask_model(&self, prompt: &str, analysis: &AnalysisResult) -> RuntimeResult<String> {
        let request = GenerateRequest::free_text(prompts::build_refine_payload(prompt, analysis));
        let start = std::time::Instant::now();
        let reply = self.runtime.generate(&request).await?;
        log::info!("[REFINE] Rewrite in {}ms", start.elapsed().as_millis());

        let text = reply.trim();
        if text.is_empty() {
            return Err(RuntimeError::EmptyResponse);
        }
        Ok(text.to_string())
    }
}

fn framing(tier: Complexity) -> Option<&'static str> {
    match tier {
        Complexity::Complex => Some(
            "As an expert software architect, help me with the following task. \
             Consider trade-offs and scalability in your answer.",
        ),
        Complexity::Moderate => Some("Please help me with the following task, working through it carefully."),
        Complexity::Simple => None,
    }
}

/// Deterministic rewrite: framing, the original prompt unchanged, the
/// technique's structure as a numbered list, up to four key elements, and a
/// closing instruction.
pub fn compose_fallback(prompt: &str, analysis: &AnalysisResult) -> String {
    let mut out = String::new();
    if let Some(frame) = framing(analysis.complexity) {
        out.push_str(frame);
        out.push_str("\n\n");
    }
    out.push_str(prompt);

    if !analysis.structure.is_empty() {
        out.push_str("\n\nPlease structure your response as follows:\n");
        for (i, step) in analysis.structure.iter().enumerate() {
            let _ = writeln!(out, "{}. {}", i + 1, step);
        }
    }

    if !analysis.key_elements.is_empty() {
        out.push_str("\nMake sure to address:\n");
        for element in analysis.key_elements.iter().take(FALLBACK_KEY_ELEMENTS) {
            let _ = writeln!(out, "- {}", element);
        }
    }

    let _ = write!(
        out,
        "\nApply the {} approach and be specific and actionable in your answer.",
        analysis.technique
    );
    out
}
