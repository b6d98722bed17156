//! LLM domain: prompt analysis and refinement.
//!
//! Public API for the analysis layer. External code should only use the
//! items exported here.
//!
//!   - analyze.rs: Analyzer: probe, ask, parse, resolve; keyword fallback
//!   - refine.rs:  Refiner: model rewrite or deterministic template
//!   - parse.rs:   JSON extraction + field validation of model replies
//!   - prompts.rs: instruction payloads
//!   - types.rs:   AnalysisResult, Origin

pub mod analyze;
pub mod parse;
pub mod prompts;
pub mod refine;
pub mod types;

pub use analyze::Analyzer;
pub use refine::{compose_fallback, Refiner};
pub use types::{AnalysisResult, Complexity, FallbackReason, Origin, TechniqueSummary};
