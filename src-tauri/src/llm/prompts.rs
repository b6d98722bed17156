//! Instruction payloads sent to the runtime.
//!
//! The analysis prompt pins the output schema and enumerates the catalog's
//! key set; the refine prompt asks for free text only.

use super::types::AnalysisResult;
use crate::techniques;

/// ANALYZE system instruction. `{technique_keys}` is replaced with the
/// catalog's key list at build time of the payload.
pub const ANALYZE_SYSTEM_PROMPT: &str = r#"You are an expert prompt engineer. Analyze the user's prompt and return structured feedback.

<rules>
1. Respond with ONE JSON object and nothing else. No prose, no markdown.
2. "complexity" MUST be exactly one of: "simple", "moderate", "complex".
   - simple: basic tasks, direct questions, simple transformations
   - moderate: multi-step processes, reasoning, integration tasks
   - complex: system design, architecture, full applications, advanced algorithms
3. "technique" MUST be one of these keys: {technique_keys}
4. "alternatives" lists 0-2 further keys from the same set, most suitable first.
5. "improvements" lists 0-3 short, concrete suggestions for the prompt.
6. "tips" lists 1-3 short, general prompting tips relevant to this prompt.
</rules>

<response_format>
{
  "complexity": "simple" | "moderate" | "complex",
  "technique": "<technique key>",
  "justification": "<one or two sentences on why this technique fits>",
  "alternatives": ["<technique key>", ...],
  "improvements": ["<suggestion>", ...],
  "tips": ["<tip>", ...]
}
</response_format>"#;

/// Build the full analysis payload: system instruction + quoted user prompt.
pub fn build_analyze_payload(prompt: &str) -> String {
    let keys = techniques::keys()
        .map(|k| format!("\"{}\"", k))
        .collect::<Vec<_>>()
        .join(", ");
    let system = ANALYZE_SYSTEM_PROMPT.replace("{technique_keys}", &keys);
    format!(
        "{system}\n\nAnalyze this prompt and provide structured feedback: \"{prompt}\"",
        system = system,
        prompt = prompt
    )
}

/// Build the rewrite payload from the original prompt and its analysis.
pub fn build_refine_payload(original: &str, analysis: &AnalysisResult) -> String {
    format!(
        r#"Based on this analysis, create an improved version of the original prompt.

Original prompt: "{original}"

Analysis:
- Complexity: {complexity}
- Recommended technique: {technique}
- Structure: {structure}
- Key elements: {elements}

Create a refined prompt that:
1. Follows the {technique} technique
2. Includes all key elements
3. Has clear structure
4. Is specific and actionable

Return ONLY the refined prompt, no explanation or markdown."#,
        original = original,
        complexity = analysis.complexity,
        technique = analysis.technique,
        structure = analysis.structure.join(", "),
        elements = analysis.key_elements.join(", "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics;

    #[test]
    fn analyze_payload_lists_every_key_and_quotes_prompt() {
        let payload = build_analyze_payload("sort a list");
        for key in techniques::keys() {
            assert!(payload.contains(&format!("\"{}\"", key)), "missing {}", key);
        }
        assert!(!payload.contains("{technique_keys}"));
        assert!(payload.ends_with("\"sort a list\""));
    }

    #[test]
    fn refine_payload_carries_analysis() {
        let analysis = heuristics::classify("build a REST API");
        let payload = build_refine_payload("build a REST API", &analysis);
        assert!(payload.contains("Original prompt: \"build a REST API\""));
        assert!(payload.contains(&analysis.technique));
        assert!(payload.contains(&analysis.key_elements[0]));
    }
}
