//! Keyword/length fallback classifier.
//!
//! Takes over whenever the model path can't produce a result. Pure and
//! total: the same text always yields the same `AnalysisResult`.
//!
//! `key_elements` is also used by the model-backed analyzer.

use crate::llm::types::{dedup_capped, AnalysisResult, Complexity, MAX_ALTERNATIVES, MAX_KEY_ELEMENTS};
use crate::techniques;
use regex::Regex;
use std::sync::LazyLock;

/// Above this many words a prompt is at least moderate.
pub const MODERATE_WORD_THRESHOLD: usize = 30;
/// Above this many words a prompt is complex.
pub const COMPLEX_WORD_THRESHOLD: usize = 60;

static ACTION_TERMS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:build(?:s|ing|ers?)?|built|creat(?:e|es|ed|ing)|implement(?:s|ed|ing)?|refactor(?:s|ed|ing)?|optimi[sz](?:e|es|ed|ing)|debug(?:s|ged|ging|ger)?|design(?:s|ed|ing|ers?)?|develop(?:s|ed|ing|ers?)?)\b",
    )
    .unwrap()
});

static SYSTEM_TERMS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:system|application|architecture|api|database|service)s?\b").unwrap()
});

/// Domain hints, each contributing a pair of key elements when matched.
static DOMAIN_HINTS: LazyLock<Vec<(Regex, [&'static str; 2])>> = LazyLock::new(|| {
    vec![
        (
            Regex::new(r"(?i)\b(?:api|endpoints?|rest|graphql|http)\b").unwrap(),
            ["API endpoints and methods", "request/response formats"],
        ),
        (
            Regex::new(r"(?i)\b(?:build(?:s|ing)?|built|creat(?:e|es|ed|ing)|develop(?:s|ed|ing)?|implement(?:s|ed|ing)?|mak(?:e|es|ing))\b").unwrap(),
            ["technology stack", "core features and requirements"],
        ),
        (
            Regex::new(r"(?i)\b(?:optimi[sz](?:e|es|ed|ing|ation)|performance|faster|speed\s+up|latency)\b").unwrap(),
            ["current performance metrics", "optimization targets"],
        ),
        (
            Regex::new(r"(?i)\b(?:debug(?:s|ged|ging)?|fix(?:es|ed|ing)?|errors?|bugs?|crash(?:es|ed|ing)?|exceptions?)\b").unwrap(),
            ["error messages and stack traces", "steps to reproduce"],
        ),
    ]
});

const COMPLEX_ELEMENTS: [&str; 3] = [
    "system architecture",
    "scalability requirements",
    "integration points",
];
const MODERATE_ELEMENTS: [&str; 2] = ["step-by-step process", "success criteria"];
const UNIVERSAL_ELEMENTS: [&str; 2] = ["specific constraints", "desired output format"];

const GENERIC_IMPROVEMENTS: [&str; 3] = [
    "Add specific context about your environment and constraints",
    "Specify the expected output format",
    "Include examples of the desired result",
];

const SIMPLE_TIPS: &[&str] = &[
    "Be specific: Vague prompts lead to vague responses",
    "Specify format: Tell the AI exactly how you want the output structured",
];
const MODERATE_TIPS: &[&str] = &[
    "Provide context: Background information helps the AI understand your needs",
    "Use examples: Show don't just tell when you need specific patterns",
    "Think step-by-step: Break complex tasks into smaller parts",
];
const COMPLEX_TIPS: &[&str] = &[
    "Constrain scope: Set boundaries to keep responses focused",
    "Think step-by-step: Break complex tasks into smaller parts",
    "Iterate: Refine your prompts based on the responses you get",
];

/// Raw signals extracted from a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptSignals {
    pub word_count: usize,
    pub action_terms: bool,
    pub system_terms: bool,
}

impl PromptSignals {
    pub fn from_text(text: &str) -> Self {
        Self {
            word_count: text.split_whitespace().count(),
            action_terms: ACTION_TERMS.is_match(text),
            system_terms: SYSTEM_TERMS.is_match(text),
        }
    }
}

/// Tier decision. Rules only ever upgrade: simple, then moderate, then complex.
pub fn complexity_for(signals: PromptSignals) -> Complexity {
    let mut tier = Complexity::Simple;
    if signals.word_count > MODERATE_WORD_THRESHOLD || signals.action_terms {
        tier = Complexity::Moderate;
    }
    if signals.word_count > COMPLEX_WORD_THRESHOLD || signals.system_terms {
        tier = Complexity::Complex;
    }
    tier
}

/// Key elements for a prompt at a given tier: domain pairs, tier phrases,
/// universal phrases; deduplicated and capped.
pub fn key_elements(text: &str, tier: Complexity) -> Vec<String> {
    let mut elements: Vec<&str> = Vec::new();
    for (pattern, pair) in DOMAIN_HINTS.iter() {
        if pattern.is_match(text) {
            elements.extend_from_slice(pair);
        }
    }
    match tier {
        Complexity::Complex => elements.extend_from_slice(&COMPLEX_ELEMENTS),
        Complexity::Moderate => elements.extend_from_slice(&MODERATE_ELEMENTS),
        Complexity::Simple => {}
    }
    elements.extend_from_slice(&UNIVERSAL_ELEMENTS);
    dedup_capped(elements, MAX_KEY_ELEMENTS)
}

/// Generic improvement suggestions: one for simple prompts, two otherwise.
pub fn improvements_for(tier: Complexity) -> Vec<String> {
    let count = match tier {
        Complexity::Simple => 1,
        _ => 2,
    };
    GENERIC_IMPROVEMENTS
        .iter()
        .take(count)
        .map(|s| s.to_string())
        .collect()
}

/// Tips for a tier label; unrecognised labels get the moderate set.
pub fn tips_for_label(label: &str) -> Vec<String> {
    tips_for(Complexity::from_label(label).unwrap_or(Complexity::Moderate))
}

pub fn tips_for(tier: Complexity) -> Vec<String> {
    let tips = match tier {
        Complexity::Simple => SIMPLE_TIPS,
        Complexity::Moderate => MODERATE_TIPS,
        Complexity::Complex => COMPLEX_TIPS,
    };
    tips.iter().map(|s| s.to_string()).collect()
}

/// Classify a prompt without any model.
pub fn classify(text: &str) -> AnalysisResult {
    let signals = PromptSignals::from_text(text);
    let tier = complexity_for(signals);

    let ranked = techniques::by_complexity(tier);
    let primary = ranked
        .first()
        .copied()
        .unwrap_or_else(|| techniques::default_for(tier));
    let alternatives: Vec<_> = ranked
        .iter()
        .skip(1)
        .take(MAX_ALTERNATIVES)
        .map(|t| t.summary())
        .collect();

    log::debug!(
        "[FALLBACK] words={} action={} system={} → {} / {}",
        signals.word_count,
        signals.action_terms,
        signals.system_terms,
        tier,
        primary.key
    );

    AnalysisResult {
        complexity: tier,
        technique: primary.name.to_string(),
        technique_description: primary.description.to_string(),
        technique_link: Some(primary.link.to_string()),
        rationale: None,
        structure: primary.structure_owned(),
        key_elements: key_elements(text, tier),
        improvements: Some(improvements_for(tier)),
        alternative_techniques: if alternatives.is_empty() {
            None
        } else {
            Some(alternatives)
        },
        tips: Some(tips_for(tier)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(word: &str, n: usize) -> String {
        vec![word; n].join(" ")
    }

    #[test]
    fn short_plain_prompt_is_simple() {
        let result = classify("fix this");
        assert_eq!(result.complexity, Complexity::Simple);
        assert_eq!(result.technique, techniques::default_for(Complexity::Simple).name);
        assert!(result.improvements.as_ref().map_or(0, |i| i.len()) <= 1);
    }

    #[test]
    fn word_count_alone_reaches_moderate() {
        let result = classify(&words("hello", 35));
        assert_eq!(result.complexity, Complexity::Moderate);
        let result = classify(&words("optimize", 35));
        assert_eq!(result.complexity, Complexity::Moderate);
    }

    #[test]
    fn word_count_alone_reaches_complex() {
        assert_eq!(classify(&words("hello", 61)).complexity, Complexity::Complex);
        assert_eq!(classify(&words("hello", 60)).complexity, Complexity::Moderate);
    }

    #[test]
    fn action_term_upgrades_short_prompt() {
        assert_eq!(classify("refactor my loop").complexity, Complexity::Moderate);
        assert_eq!(classify("Debugging help please").complexity, Complexity::Moderate);
    }

    #[test]
    fn system_term_upgrades_to_complex() {
        let text = format!(
            "design a distributed system architecture {}",
            words("please", 60)
        );
        assert_eq!(classify(&text).complexity, Complexity::Complex);
        assert_eq!(classify("what is a database").complexity, Complexity::Complex);
    }

    #[test]
    fn api_is_matched_as_a_word_not_a_substring() {
        assert_eq!(classify("a rapid answer").complexity, Complexity::Simple);
    }

    #[test]
    fn terms_match_whole_words_and_inflections() {
        for text in ["an apiary", "systemic risk", "the servicer", "a debutante", "rebuild it"] {
            let signals = PromptSignals::from_text(text);
            assert!(!signals.action_terms && !signals.system_terms, "{:?} matched", text);
        }
        assert_eq!(classify("it builds slowly").complexity, Complexity::Moderate);
        assert_eq!(classify("debugged yesterday").complexity, Complexity::Moderate);
        assert_eq!(classify("two systems").complexity, Complexity::Complex);
        assert_eq!(classify("list the APIs").complexity, Complexity::Complex);
    }

    #[test]
    fn domain_hints_ignore_longer_words() {
        let elements = key_elements("a makeshift prefix for the errorless debutante", Complexity::Simple);
        assert_eq!(elements, vec!["specific constraints", "desired output format"]);
        let elements = key_elements("it crashed after the fixes", Complexity::Simple);
        assert_eq!(elements[0], "error messages and stack traces");
    }

    #[test]
    fn tier_is_monotonic_in_word_count() {
        for action in [false, true] {
            for system in [false, true] {
                let mut previous = Complexity::Simple;
                for word_count in 0..120 {
                    let tier = complexity_for(PromptSignals {
                        word_count,
                        action_terms: action,
                        system_terms: system,
                    });
                    assert!(tier >= previous, "tier dropped at {} words", word_count);
                    previous = tier;
                }
            }
        }
    }

    #[test]
    fn key_elements_are_capped_and_unique() {
        let text = "build an API to debug and optimize the database service";
        let elements = key_elements(text, Complexity::Complex);
        assert_eq!(elements.len(), MAX_KEY_ELEMENTS);
        let mut sorted = elements.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), elements.len());
        assert_eq!(elements[0], "API endpoints and methods");
    }

    #[test]
    fn key_elements_for_plain_simple_prompt() {
        assert_eq!(
            key_elements("hello there", Complexity::Simple),
            vec!["specific constraints", "desired output format"]
        );
        assert_eq!(
            key_elements("fix this", Complexity::Simple),
            vec![
                "error messages and stack traces",
                "steps to reproduce",
                "specific constraints",
                "desired output format"
            ]
        );
    }

    #[test]
    fn alternatives_follow_the_primary() {
        let result = classify(&words("hello", 40));
        let alts = result.alternative_techniques.unwrap();
        assert_eq!(alts.len(), 2);
        assert_eq!(alts[0].name, "Chain of Thought (CoT)");
        assert_eq!(alts[1].name, "The Lede Structure");
    }

    #[test]
    fn improvements_and_tips_per_tier() {
        assert_eq!(improvements_for(Complexity::Simple).len(), 1);
        assert_eq!(improvements_for(Complexity::Complex).len(), 2);
        for tier in Complexity::ALL {
            let tips = tips_for(tier);
            assert!((2..=3).contains(&tips.len()));
        }
        assert_eq!(tips_for_label("bogus"), tips_for(Complexity::Moderate));
    }

    #[test]
    fn classify_is_deterministic() {
        let text = "Create a REST API for a todo application with auth";
        let a = serde_json::to_string(&classify(text)).unwrap();
        let b = serde_json::to_string(&classify(text)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn structure_is_never_empty() {
        let long = words("word", 100);
        for text in ["", "x", "build a thing", long.as_str()] {
            assert!(!classify(text).structure.is_empty());
        }
    }
}
