//! Improver: prompt analysis and refinement over a local model runtime.
//!
//! Module declarations, startup helpers, and (with the `desktop` feature)
//! the Tauri app shell. No business logic lives here.
//!
//! Domains:
//!   - runtime/:      the local model runtime (HTTP or CLI), probe, pull
//!   - llm/:          Analyzer + Refiner with their fallbacks
//!   - techniques.rs: technique catalog
//!   - heuristics.rs: keyword/length fallback classifier
//!   - pipeline.rs:   validate → analyze → refine
//!   - commands.rs:   Tauri command registry (desktop only)

#[cfg(feature = "desktop")]
mod commands;
pub mod config;
pub mod error;
pub mod heuristics;
pub mod llm;
pub mod pipeline;
pub mod runtime;
pub mod settings;
pub mod techniques;

pub use config::RuntimeConfig;
pub use error::{PipelineError, RuntimeError};
pub use llm::{AnalysisResult, Analyzer, Origin, Refiner};
pub use pipeline::PromptReport;

/// Load `.env.local` or `.env` from the project root, first one found wins.
///
/// Uses CARGO_MANIFEST_DIR (compile-time path to src-tauri/) so the files are
/// found regardless of the binary's working directory.
pub fn load_env_files() {
    let manifest_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    let project_root = manifest_dir.parent().unwrap_or(manifest_dir);

    for env_file in [".env.local", ".env"] {
        let path = project_root.join(env_file);
        if path.exists() {
            match dotenvy::from_path(&path) {
                Ok(_) => eprintln!("[STARTUP] Loaded {}", path.display()),
                Err(e) => eprintln!("[STARTUP] Failed to load {}: {}", path.display(), e),
            }
            break;
        }
    }
}

/// Env files first, then the logger, so `RUST_LOG` from `.env` applies.
pub fn init_logging() {
    load_env_files();
    let _ = env_logger::try_init();
}

/// Entry point, called by the Tauri runtime.
#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    init_logging();

    let config = RuntimeConfig::from_env();
    log::info!(
        "[STARTUP] {} transport at {}, model {}, model-assisted mode {}",
        config.transport.as_str(),
        config.base_url,
        config.model,
        if settings::load().model_enabled { "on" } else { "off" }
    );

    tauri::Builder::default()
        .plugin(tauri_plugin_shell::init())
        .manage(commands::AppState::new(config))
        .invoke_handler(tauri::generate_handler![
            commands::get_availability,
            commands::analyze_prompt,
            commands::generate_refined_prompt,
            commands::pull_model,
            commands::get_model_enabled,
            commands::set_model_enabled,
            commands::copy_to_clipboard,
            commands::app_version,
        ])
        .setup(|_app| {
            log::info!("Improver starting up");
            Ok(())
        })
        .run(tauri::generate_context!())
        .expect("Error running Improver");
}
