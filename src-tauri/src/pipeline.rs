//! Prompt pipeline.
//!
//! validate → analyze → refine. Only an empty prompt is reported back as an
//! error; runtime failures are absorbed by the analyzer and refiner and show
//! up as fallback origins in the report.

use crate::error::PipelineError;
use crate::llm::{compose_fallback, AnalysisResult, Analyzer, Origin, Refiner};
use serde::{Deserialize, Serialize};

/// Everything the presentation layer renders for one prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptReport {
    pub analysis: AnalysisResult,
    pub refined_prompt: String,
    pub analysis_origin: Origin,
    pub refinement_origin: Origin,
}

/// Reject blank input before any backend is touched.
pub fn validate(text: &str) -> Result<&str, PipelineError> {
    if text.trim().is_empty() {
        return Err(PipelineError::EmptyPrompt);
    }
    Ok(text)
}

/// Analyze a prompt and rewrite it. Re-analysing a refined prompt is the
/// same call with the refined text.
///
/// The runtime is asked to rewrite only when it produced the analysis; a
/// fallback analysis gets the template rewrite under the same origin.
pub async fn analyze_prompt(
    analyzer: &Analyzer,
    refiner: &Refiner,
    text: &str,
) -> Result<PromptReport, PipelineError> {
    let text = validate(text)?;
    let start = std::time::Instant::now();

    let (analysis, analysis_origin) = analyzer.analyze_traced(text).await;
    let analyze_ms = start.elapsed().as_millis();
    let (refined_prompt, refinement_origin) = if analysis_origin.is_model() {
        refiner.refine_traced(text, &analysis).await
    } else {
        (compose_fallback(text, &analysis), analysis_origin)
    };

    log::info!(
        "[PIPELINE] {} words: {} / {} (analysis {:?} in {}ms, refinement {:?}, total {}ms)",
        text.split_whitespace().count(),
        analysis.complexity,
        analysis.technique,
        analysis_origin,
        analyze_ms,
        refinement_origin,
        start.elapsed().as_millis()
    );

    Ok(PromptReport {
        analysis,
        refined_prompt,
        analysis_origin,
        refinement_origin,
    })
}
