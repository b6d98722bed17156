//! Prompt benchmark CLI for Improver.
//!
//! Runs each prompt through validate → analyze → refine and prints one CSV
//! row per prompt. Summary goes to stderr so stdout stays machine-readable.
//!
//! Usage:
//!   cargo run -- "<prompt>" ["<prompt>" ...]       Prompts as arguments
//!   cargo run -- --file prompts.txt                One prompt per line
//!   cargo run -- --file prompts.txt --fallback-only  Keyword classifier only

use improver_lib::llm::{FallbackReason, Origin};
use improver_lib::{pipeline, Analyzer, Refiner, RuntimeConfig};
use std::io::Write;
use std::time::Instant;

fn origin_label(origin: Origin) -> &'static str {
    match origin {
        Origin::Model => "model",
        Origin::Fallback(FallbackReason::Disabled) => "fallback:disabled",
        Origin::Fallback(FallbackReason::Unavailable) => "fallback:unavailable",
        Origin::Fallback(FallbackReason::Transport) => "fallback:transport",
        Origin::Fallback(FallbackReason::MalformedResponse) => "fallback:malformed",
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn read_prompts(args: &[String]) -> Result<Vec<String>, String> {
    let mut prompts = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--fallback-only" => {}
            "--file" => {
                let path = iter.next().ok_or("--file requires a path")?;
                let raw = std::fs::read_to_string(path)
                    .map_err(|e| format!("Failed to read {}: {}", path, e))?;
                prompts.extend(
                    raw.lines()
                        .map(str::trim)
                        .filter(|l| !l.is_empty() && !l.starts_with('#'))
                        .map(str::to_string),
                );
            }
            other => prompts.push(other.to_string()),
        }
    }
    Ok(prompts)
}

#[tokio::main]
async fn main() {
    improver_lib::init_logging();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let fallback_only = args.iter().any(|a| a == "--fallback-only");
    let prompts = match read_prompts(&args) {
        Ok(p) if !p.is_empty() => p,
        Ok(_) => {
            eprintln!("Usage:");
            eprintln!("  prompt-bench [--fallback-only] \"<prompt>\" ...");
            eprintln!("  prompt-bench [--fallback-only] --file <prompts.txt>");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let mut config = RuntimeConfig::from_env();
    if fallback_only {
        config = config.with_model_enabled(false);
    }
    let analyzer = Analyzer::from_config(config.clone());
    let refiner = Refiner::new(analyzer.runtime(), config);

    if !fallback_only {
        let status = analyzer.probe().await;
        eprintln!(
            "[BENCH] runtime running={} models=[{}]",
            status.is_running,
            status.available_models.join(", ")
        );
    }

    println!("words,tier,technique,origin,latency_ms");
    let mut latencies: Vec<f64> = Vec::new();
    let mut model_hits = 0usize;

    for prompt in &prompts {
        let start = Instant::now();
        let report = match pipeline::analyze_prompt(&analyzer, &refiner, prompt).await {
            Ok(r) => r,
            Err(e) => {
                log::warn!("[BENCH] Skipping prompt: {}", e);
                continue;
            }
        };
        let latency_ms = start.elapsed().as_micros() as f64 / 1000.0;

        println!(
            "{},{},{},{},{:.2}",
            prompt.split_whitespace().count(),
            report.analysis.complexity,
            csv_field(&report.analysis.technique),
            origin_label(report.analysis_origin),
            latency_ms
        );
        std::io::stdout().flush().ok();

        if report.analysis_origin.is_model() {
            model_hits += 1;
        }
        latencies.push(latency_ms);
    }

    // Print summary
    eprintln!("\n--- Benchmark Summary ---");
    eprintln!("  Prompts processed: {}", latencies.len());
    eprintln!("  Model-backed analyses: {}", model_hits);
    if !latencies.is_empty() {
        latencies.sort_by(|a, b| a.total_cmp(b));
        let mean = latencies.iter().sum::<f64>() / latencies.len() as f64;
        eprintln!(
            "  Latency: mean={:.1}ms p50={:.1}ms max={:.1}ms",
            mean,
            latencies[latencies.len() / 2],
            latencies[latencies.len() - 1]
        );
    }
}
