//! Model-backed prompt analysis with keyword fallback.
//!
//! Probe, ask, extract, validate, resolve against the catalog. Any failure
//! along the way hands the prompt to `heuristics::classify`; callers always
//! get a usable `AnalysisResult`.

use super::parse::{self, RawAnalysis};
use super::prompts;
use super::types::{
    dedup_capped, AnalysisResult, FallbackReason, Origin, MAX_ALTERNATIVES, MAX_IMPROVEMENTS,
};
use crate::config::RuntimeConfig;
use crate::error::RuntimeResult;
use crate::heuristics;
use crate::runtime::{self, AvailabilityStatus, GenerateRequest, ModelRuntime};
use crate::techniques::{self, Technique};
use std::sync::Arc;

#[derive(Clone)]
pub struct Analyzer {
    runtime: Arc<dyn ModelRuntime>,
    config: RuntimeConfig,
}

impl Analyzer {
    pub fn new(runtime: Arc<dyn ModelRuntime>, config: RuntimeConfig) -> Self {
        Self { runtime, config }
    }

    /// Build the runtime from `config` and wrap it.
    pub fn from_config(config: RuntimeConfig) -> Self {
        Self::new(runtime::from_config(&config), config)
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn runtime(&self) -> Arc<dyn ModelRuntime> {
        Arc::clone(&self.runtime)
    }

    /// Same analyzer with model-assisted mode switched on or off.
    pub fn with_model_enabled(&self, enabled: bool) -> Self {
        Self {
            runtime: Arc::clone(&self.runtime),
            config: self.config.clone().with_model_enabled(enabled),
        }
    }

    pub async fn probe(&self) -> AvailabilityStatus {
        runtime::probe(self.runtime.as_ref(), self.config.probe_timeout).await
    }

    pub async fn analyze(&self, text: &str) -> AnalysisResult {
        self.analyze_traced(text).await.0
    }

    /// Analyze and report where the result came from.
    pub async fn analyze_traced(&self, text: &str) -> (AnalysisResult, Origin) {
        if !self.config.model_enabled {
            log::info!("[ANALYZE] Model-assisted mode off, using keyword classifier");
            return (heuristics::classify(text), Origin::Fallback(FallbackReason::Disabled));
        }

        let status = self.probe().await;
        if !status.is_ready() {
            log::info!(
                "[ANALYZE] Runtime not ready ({}), using keyword classifier",
                status.error.as_deref().unwrap_or("no models installed")
            );
            return (heuristics::classify(text), Origin::Fallback(FallbackReason::Unavailable));
        }
        if !status.has_model(&self.config.model) {
            log::info!(
                "[ANALYZE] Model {} not pulled ({} installed), using keyword classifier",
                self.config.model,
                status.available_models.len()
            );
            return (heuristics::classify(text), Origin::Fallback(FallbackReason::Unavailable));
        }

        match self.ask_model(text).await {
            Ok(result) => (result, Origin::Model),
            Err(e) => {
                let origin = Origin::from_error(&e);
                if e.is_malformed() {
                    log::warn!("[ANALYZE] Unusable model output: {}", e);
                } else {
                    log::error!("[ANALYZE] Runtime call failed: {}", e);
                }
                (heuristics::classify(text), origin)
            }
        }
    }

    async fn ask_model(&self, text: &str) -> RuntimeResult<AnalysisResult> {
        let request = GenerateRequest::structured(prompts::build_analyze_payload(text));
        let start = std::time::Instant::now();
        let reply = self.runtime.generate(&request).await?;
        log::info!(
            "[ANALYZE] {} reply in {}ms ({} chars)",
            self.runtime.transport().as_str(),
            start.elapsed().as_millis(),
            reply.len()
        );

        let raw = parse::parse_analysis(&reply).inspect_err(|_| {
            log::warn!("[ANALYZE] raw: {}", preview(&reply));
        })?;
        Ok(assemble(text, raw))
    }
}

/// Promote a validated reply to an `AnalysisResult`, resolving every
/// technique reference through the catalog.
pub fn assemble(text: &str, raw: RawAnalysis) -> AnalysisResult {
    let tier = raw.complexity;
    let primary = techniques::resolve(&raw.technique).unwrap_or_else(|| {
        let default = techniques::default_for(tier);
        log::warn!(
            "[ANALYZE] Unknown technique {:?}, using {} default {}",
            raw.technique,
            tier,
            default.key
        );
        default
    });

    let mut alternatives: Vec<&'static Technique> = Vec::new();
    for candidate in raw.alternatives.iter().filter_map(|a| techniques::resolve(a)) {
        if candidate.key != primary.key && !alternatives.iter().any(|t| t.key == candidate.key) {
            alternatives.push(candidate);
        }
        if alternatives.len() == MAX_ALTERNATIVES {
            break;
        }
    }
    if alternatives.is_empty() {
        alternatives = techniques::related(primary.key)
            .into_iter()
            .take(MAX_ALTERNATIVES)
            .collect();
    }

    let improvements = dedup_capped(&raw.improvements, MAX_IMPROVEMENTS);
    let tips = if raw.tips.is_empty() {
        heuristics::tips_for(tier)
    } else {
        dedup_capped(&raw.tips, 3)
    };

    AnalysisResult {
        complexity: tier,
        technique: primary.name.to_string(),
        technique_description: primary.description.to_string(),
        technique_link: Some(primary.link.to_string()),
        rationale: raw.justification,
        structure: primary.structure_owned(),
        key_elements: heuristics::key_elements(text, tier),
        improvements: (!improvements.is_empty()).then_some(improvements),
        alternative_techniques: (!alternatives.is_empty())
            .then(|| alternatives.iter().map(|t| t.summary()).collect()),
        tips: Some(tips),
    }
}

/// First 200 characters, for logs.
pub(crate) fn preview(text: &str) -> &str {
    match text.char_indices().nth(200) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
