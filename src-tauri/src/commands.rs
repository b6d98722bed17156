//! Tauri command handlers.
//!
//! Thin wrappers that bridge frontend invoke() calls to the pipeline,
//! the runtime and the preference store. Errors cross the boundary as
//! strings.

use crate::config::RuntimeConfig;
use crate::llm::{AnalysisResult, Analyzer, Refiner};
use crate::pipeline::{self, PromptReport};
use crate::runtime::pull::{self, ModelDownloadProgress};
use crate::runtime::AvailabilityStatus;
use crate::settings::{self, Preferences};
use tauri::{Emitter, Manager};

/// Event carrying `ModelDownloadProgress` payloads during `pull_model`.
pub const MODEL_PROGRESS_EVENT: &str = "llm:model-progress";

/// Shared analyzer/refiner pair, built once at startup.
pub struct AppState {
    analyzer: Analyzer,
    refiner: Refiner,
}

impl AppState {
    pub fn new(config: RuntimeConfig) -> Self {
        let analyzer = Analyzer::from_config(config.clone());
        let refiner = Refiner::new(analyzer.runtime(), config);
        Self { analyzer, refiner }
    }

    fn config(&self) -> &RuntimeConfig {
        self.analyzer.config()
    }

    /// Analyzer and refiner for one request. An explicit flag from the
    /// frontend wins over the persisted preference; `IMPROVER_MODEL_ENABLED=0`
    /// switches the model off regardless.
    fn for_request(&self, model_enabled: Option<bool>) -> (Analyzer, Refiner) {
        let requested = model_enabled.unwrap_or_else(|| settings::load().model_enabled);
        let enabled = requested && self.config().model_enabled;
        (
            self.analyzer.with_model_enabled(enabled),
            self.refiner.with_model_enabled(enabled),
        )
    }
}

#[tauri::command]
pub async fn get_availability(state: tauri::State<'_, AppState>) -> Result<AvailabilityStatus, String> {
    Ok(state.analyzer.probe().await)
}

/// Tauri command: analyze a prompt and produce its refined version.
#[tauri::command]
pub async fn analyze_prompt(
    state: tauri::State<'_, AppState>,
    prompt: String,
    model_enabled: Option<bool>,
) -> Result<PromptReport, String> {
    let (analyzer, refiner) = state.for_request(model_enabled);
    pipeline::analyze_prompt(&analyzer, &refiner, &prompt)
        .await
        .map_err(|e| e.to_string())
}

/// Tauri command: rewrite a prompt from an analysis the frontend already has.
#[tauri::command]
pub async fn generate_refined_prompt(
    state: tauri::State<'_, AppState>,
    prompt: String,
    analysis: AnalysisResult,
    model_enabled: Option<bool>,
) -> Result<String, String> {
    let prompt = pipeline::validate(&prompt).map_err(|e| e.to_string())?;
    let (_, refiner) = state.for_request(model_enabled);
    Ok(refiner.refine(prompt, &analysis).await)
}

/// Tauri command: download the configured model (or `model`), streaming
/// progress to the frontend as `llm:model-progress` events.
#[tauri::command]
pub async fn pull_model(
    app: tauri::AppHandle,
    state: tauri::State<'_, AppState>,
    model: Option<String>,
) -> Result<(), String> {
    let binary = state.config().binary.clone();
    let model = model.unwrap_or_else(|| state.config().model.clone());
    pull::pull_model(&binary, &model, move |progress: ModelDownloadProgress| {
        let _ = app.emit(MODEL_PROGRESS_EVENT, &progress);
    })
    .await
    .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn get_model_enabled() -> bool {
    settings::load().model_enabled
}

#[tauri::command]
pub fn set_model_enabled(enabled: bool) -> Result<(), String> {
    settings::save(&Preferences {
        model_enabled: enabled,
    })
}

/// Tauri command: copy text to the system clipboard.
#[tauri::command]
pub fn copy_to_clipboard(text: String) -> Result<(), String> {
    let mut clipboard = arboard::Clipboard::new().map_err(|e| e.to_string())?;
    clipboard.set_text(&text).map_err(|e| e.to_string())?;
    log::info!("[PIPELINE] Copied {} chars to clipboard", text.len());
    Ok(())
}

#[tauri::command]
pub fn app_version(app: tauri::AppHandle) -> String {
    app.package_info().version.to_string()
}
