//! Integration tests for the analyze → refine flow with a scripted runtime.
//!
//! The fake answers from a fixed script so every branch of the analyzer
//! (model reply, prose-wrapped JSON, garbage, transport failure) can be
//! exercised without a local model.

use async_trait::async_trait;
use improver_lib::config::Transport;
use improver_lib::error::RuntimeResult;
use improver_lib::heuristics;
use improver_lib::llm::{compose_fallback, Analyzer, Complexity, FallbackReason, Origin, Refiner};
use improver_lib::runtime::{GenerateRequest, ModelRuntime};
use improver_lib::{pipeline, techniques, PipelineError, RuntimeConfig, RuntimeError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Pops one scripted reply per `generate` call. Runs dry → `EmptyResponse`.
struct ScriptedRuntime {
    models: Vec<String>,
    replies: Mutex<VecDeque<RuntimeResult<String>>>,
    seen: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedRuntime {
    fn new(replies: Vec<RuntimeResult<String>>) -> Arc<Self> {
        Arc::new(Self {
            models: vec!["llama3.2:3b-instruct-fp16".to_string()],
            replies: Mutex::new(replies.into()),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn without_models() -> Arc<Self> {
        Arc::new(Self {
            models: Vec::new(),
            replies: Mutex::new(VecDeque::new()),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<GenerateRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelRuntime for ScriptedRuntime {
    fn transport(&self) -> Transport {
        Transport::Cli
    }

    async fn list_models(&self) -> RuntimeResult<Vec<String>> {
        Ok(self.models.clone())
    }

    async fn generate(&self, request: &GenerateRequest) -> RuntimeResult<String> {
        self.seen.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(RuntimeError::EmptyResponse))
    }
}

fn pair(runtime: Arc<ScriptedRuntime>) -> (Analyzer, Refiner) {
    let config = RuntimeConfig::default();
    (
        Analyzer::new(runtime.clone(), config.clone()),
        Refiner::new(runtime, config),
    )
}

#[tokio::test]
async fn prose_wrapped_json_with_unknown_technique_uses_tier_default() {
    let runtime = ScriptedRuntime::new(vec![
        Ok("Sure, here is the analysis you asked for:\n\n```json\n{\"complexity\": \"moderate\", \"technique\": \"mega-prompting\", \"alternatives\": [\"few-shot\"]}\n```\nLet me know!".to_string()),
        Ok("Refined: explain step by step".to_string()),
    ]);
    let (analyzer, refiner) = pair(runtime.clone());

    let report = pipeline::analyze_prompt(&analyzer, &refiner, "explain how a hash map works")
        .await
        .unwrap();

    assert_eq!(report.analysis_origin, Origin::Model);
    assert_eq!(report.analysis.complexity, Complexity::Moderate);
    assert_eq!(
        report.analysis.technique,
        techniques::default_for(Complexity::Moderate).name
    );
    let alts = report.analysis.alternative_techniques.unwrap();
    assert_eq!(alts[0].name, techniques::get("few-shot").unwrap().name);
    assert_eq!(report.refined_prompt, "Refined: explain step by step");

    let requests = runtime.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].json && !requests[1].json);
    assert!(requests[0].prompt.contains("\"explain how a hash map works\""));
    assert!(requests[1].prompt.contains("Return ONLY the refined prompt"));
}

#[tokio::test]
async fn garbage_analysis_is_not_followed_by_a_model_rewrite() {
    let runtime = ScriptedRuntime::new(vec![
        Ok("{\"complexity\": \"extreme\", \"technique\": \"react\"}".to_string()),
        Ok("this rewrite must never be used".to_string()),
    ]);
    let (analyzer, refiner) = pair(runtime.clone());
    let text = "build a login page";

    let report = pipeline::analyze_prompt(&analyzer, &refiner, text).await.unwrap();

    assert_eq!(runtime.requests().len(), 1);
    assert_eq!(report.analysis_origin, Origin::Fallback(FallbackReason::MalformedResponse));
    assert_eq!(report.refinement_origin, report.analysis_origin);
    assert_eq!(report.analysis, heuristics::classify(text));
    assert_eq!(report.refined_prompt, compose_fallback(text, &report.analysis));
}

#[tokio::test]
async fn failed_rewrite_after_model_analysis_uses_template() {
    let runtime = ScriptedRuntime::new(vec![
        Ok("{\"complexity\": \"moderate\", \"technique\": \"few-shot\"}".to_string()),
        Err(RuntimeError::NonZeroExit {
            command: "ollama run".to_string(),
            code: Some(1),
            stderr: "error: model not found".to_string(),
        }),
    ]);
    let (analyzer, refiner) = pair(runtime.clone());
    let text = "build a login page";

    let report = pipeline::analyze_prompt(&analyzer, &refiner, text).await.unwrap();

    assert_eq!(runtime.requests().len(), 2);
    assert_eq!(report.analysis_origin, Origin::Model);
    assert_eq!(report.refinement_origin, Origin::Fallback(FallbackReason::Transport));
    assert_eq!(report.refined_prompt, compose_fallback(text, &report.analysis));
}

#[tokio::test]
async fn runtime_without_models_is_not_asked() {
    let runtime = ScriptedRuntime::without_models();
    let (analyzer, refiner) = pair(runtime.clone());
    let report = pipeline::analyze_prompt(&analyzer, &refiner, "fix this").await.unwrap();
    assert_eq!(report.analysis_origin, Origin::Fallback(FallbackReason::Unavailable));
    assert_eq!(report.refinement_origin, report.analysis_origin);
    assert!(runtime.requests().is_empty());
}

#[tokio::test]
async fn empty_prompt_never_reaches_the_runtime() {
    let runtime = ScriptedRuntime::new(vec![]);
    let (analyzer, refiner) = pair(runtime.clone());
    let err = pipeline::analyze_prompt(&analyzer, &refiner, "  \n ").await.unwrap_err();
    assert_eq!(err, PipelineError::EmptyPrompt);
    assert!(runtime.requests().is_empty());
}

#[tokio::test]
async fn refined_prompt_can_be_reanalyzed() {
    let config = RuntimeConfig::default().with_model_enabled(false);
    let analyzer = Analyzer::from_config(config.clone());
    let refiner = Refiner::from_config(config);

    let first = pipeline::analyze_prompt(&analyzer, &refiner, "fix this").await.unwrap();
    let second = pipeline::analyze_prompt(&analyzer, &refiner, &first.refined_prompt)
        .await
        .unwrap();
    assert!(second.analysis.complexity >= first.analysis.complexity);
}

const CORPUS: &[&str] = &[
    "fix this",
    "What is the capital of France?",
    "Summarize this article in three bullet points",
    "refactor this function to be more readable",
    "Create a REST API for a todo app with authentication and rate limiting",
    "Design a scalable microservice architecture for an e-commerce platform with a database per service",
    "debug why my React component re-renders on every keystroke and fix the performance issue",
    "optimize optimize optimize optimize optimize optimize optimize optimize optimize optimize",
    "Écris un poème sur la mer 🌊",
];

#[tokio::test]
async fn analysis_invariants_hold_across_corpus() {
    let config = RuntimeConfig::default().with_model_enabled(false);
    let analyzer = Analyzer::from_config(config);
    for text in CORPUS {
        let result = analyzer.analyze(text).await;
        assert!(Complexity::ALL.contains(&result.complexity));
        assert!(!result.structure.is_empty(), "empty structure for {:?}", text);
        assert!(result.key_elements.len() <= 8);
        let mut unique = result.key_elements.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), result.key_elements.len(), "duplicates for {:?}", text);
        assert!(result.improvements.as_ref().map_or(0, Vec::len) <= 3);
    }
}

#[test]
fn catalog_tiers_resolve_and_related_excludes_self() {
    for tier in Complexity::ALL {
        let ranked = techniques::by_complexity(tier);
        assert!(!ranked.is_empty());
        for technique in ranked {
            assert!(techniques::get(technique.key).is_some());
        }
    }
    for technique in techniques::all() {
        assert!(techniques::related(technique.key)
            .iter()
            .all(|r| r.key != technique.key));
    }
}

#[test]
fn scenario_prompts() {
    let optimize = vec!["optimize"; 35].join(" ");
    assert_eq!(heuristics::classify(&optimize).complexity, Complexity::Moderate);

    let design = format!(
        "design a distributed system architecture {}",
        vec!["carefully"; 60].join(" ")
    );
    assert_eq!(heuristics::classify(&design).complexity, Complexity::Complex);

    let simple = heuristics::classify("fix this");
    assert_eq!(simple.complexity, Complexity::Simple);
    assert_eq!(simple.technique, techniques::default_for(Complexity::Simple).name);
}
