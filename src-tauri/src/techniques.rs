//! Technique catalog, the single authoritative table of prompt-engineering
//! techniques.
//!
//! Both the model-backed analyzer (to map model output onto canonical
//! entries) and the keyword fallback (to pick defaults per tier) read from
//! here. Content is fixed at build time.

use crate::llm::types::{Complexity, TechniqueSummary};
use serde::Serialize;

const THOUGHTWORKS_LINK: &str =
    "https://www.thoughtworks.com/insights/blog/generative-ai/improve-ai-outputs-advanced-prompt-techniques";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TechniqueSource {
    Thoughtworks,
    PromptingGuide,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Technique {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub when_to_use: &'static str,
    pub structure: &'static [&'static str],
    pub link: &'static str,
    pub source: TechniqueSource,
}

impl Technique {
    pub fn summary(&self) -> TechniqueSummary {
        TechniqueSummary {
            name: self.name.to_string(),
            description: self.description.to_string(),
            link: Some(self.link.to_string()),
        }
    }

    pub fn structure_owned(&self) -> Vec<String> {
        self.structure.iter().map(|s| s.to_string()).collect()
    }
}

static TECHNIQUES: &[Technique] = &[
    // ── Structural framing ──
    Technique {
        key: "the-lede",
        name: "The Lede Structure",
        description: "Structures prompts like a news article with the most important information first",
        when_to_use: "When you need comprehensive, well-organized responses with clear context",
        structure: &[
            "What: The topic or action",
            "Why: The purpose or goal",
            "Where: The location or context",
            "When: The timeframe",
            "How: The method",
            "How much: The scale",
            "Why (deeper): The reasoning",
        ],
        link: THOUGHTWORKS_LINK,
        source: TechniqueSource::Thoughtworks,
    },
    Technique {
        key: "user-story",
        name: "User Story Format",
        description: "Frames requests in the agile user story format to clarify intent and success criteria",
        when_to_use: "For feature requests, development tasks, or when you need clear acceptance criteria",
        structure: &[
            "As a [role/persona]",
            "I want to [action/feature]",
            "So that [benefit/value]",
            "Acceptance criteria: [specific requirements]",
        ],
        link: THOUGHTWORKS_LINK,
        source: TechniqueSource::Thoughtworks,
    },
    Technique {
        key: "situation-behavior",
        name: "Situation-Behavior-Impact",
        description: "Provides context, describes the situation, and clarifies desired outcomes",
        when_to_use: "For problem-solving, feedback, or when analyzing cause and effect",
        structure: &[
            "Situation: Describe the current context",
            "Behavior: What is happening or needs to happen",
            "Impact: What are the consequences or desired outcomes",
        ],
        link: THOUGHTWORKS_LINK,
        source: TechniqueSource::Thoughtworks,
    },
    Technique {
        key: "context-action-result",
        name: "Context-Action-Result (CAR)",
        description: "Structures prompts with clear context, required actions, and expected results",
        when_to_use: "For task-oriented requests where you need specific deliverables",
        structure: &[
            "Context: Background information and constraints",
            "Action: Specific tasks to be performed",
            "Result: Expected output format and criteria",
        ],
        link: THOUGHTWORKS_LINK,
        source: TechniqueSource::Thoughtworks,
    },
    // ── Reasoning ──
    Technique {
        key: "zero-shot",
        name: "Zero-Shot Prompting",
        description: "Direct prompting without examples, relying on the model's pre-trained knowledge",
        when_to_use: "For simple, straightforward tasks where the model likely understands the request",
        structure: &["Clear, direct instruction", "Specify output format if needed"],
        link: "https://www.promptingguide.ai/techniques/zeroshot",
        source: TechniqueSource::PromptingGuide,
    },
    Technique {
        key: "few-shot",
        name: "Few-Shot Prompting",
        description: "Provides examples to demonstrate the desired pattern or format",
        when_to_use: "When you need specific formatting or when the task benefits from examples",
        structure: &[
            "Task description",
            "Example 1: Input → Output",
            "Example 2: Input → Output",
            "Your actual request",
        ],
        link: "https://www.promptingguide.ai/techniques/fewshot",
        source: TechniqueSource::PromptingGuide,
    },
    Technique {
        key: "chain-of-thought",
        name: "Chain of Thought (CoT)",
        description: "Encourages step-by-step reasoning to solve complex problems",
        when_to_use: "For mathematical problems, logic puzzles, or multi-step reasoning tasks",
        structure: &[
            "Problem statement",
            "Request: \"Let's think step by step\"",
            "Or provide example with reasoning steps",
        ],
        link: "https://www.promptingguide.ai/techniques/cot",
        source: TechniqueSource::PromptingGuide,
    },
    Technique {
        key: "self-consistency",
        name: "Self-Consistency",
        description: "Generates multiple reasoning paths and selects the most consistent answer",
        when_to_use: "For complex reasoning where accuracy is critical",
        structure: &[
            "Problem statement",
            "Request multiple solutions",
            "Ask for consensus or most likely answer",
        ],
        link: "https://www.promptingguide.ai/techniques/consistency",
        source: TechniqueSource::PromptingGuide,
    },
    Technique {
        key: "tree-of-thoughts",
        name: "Tree of Thoughts (ToT)",
        description: "Explores multiple reasoning paths in a tree structure for complex problem-solving",
        when_to_use: "For complex problems with multiple possible approaches",
        structure: &[
            "Problem definition",
            "Request exploration of multiple approaches",
            "Evaluation criteria for each path",
            "Selection of best approach",
        ],
        link: "https://www.promptingguide.ai/techniques/tot",
        source: TechniqueSource::PromptingGuide,
    },
    Technique {
        key: "retrieval-augmented",
        name: "Retrieval Augmented Generation (RAG)",
        description: "Combines retrieval of relevant information with generation",
        when_to_use: "When working with specific documents or knowledge bases",
        structure: &[
            "Provide relevant context/documents",
            "Specific question about the context",
            "Request citation of sources",
        ],
        link: "https://www.promptingguide.ai/techniques/rag",
        source: TechniqueSource::PromptingGuide,
    },
    Technique {
        key: "react",
        name: "ReAct (Reasoning + Acting)",
        description: "Combines reasoning with action planning for task completion",
        when_to_use: "For tasks requiring both planning and execution steps",
        structure: &[
            "Task description",
            "Thought: Reasoning about the task",
            "Action: What to do",
            "Observation: Result of action",
            "Repeat until complete",
        ],
        link: "https://www.promptingguide.ai/techniques/react",
        source: TechniqueSource::PromptingGuide,
    },
    Technique {
        key: "role-prompting",
        name: "Role Prompting",
        description: "Assigns a specific role or expertise to the AI for domain-specific responses",
        when_to_use: "When you need expertise in a specific domain",
        structure: &[
            "You are a [specific role/expert]",
            "Your expertise includes [domains]",
            "Task or question",
            "Constraints or style requirements",
        ],
        link: "https://www.promptingguide.ai/techniques/roles",
        source: TechniqueSource::PromptingGuide,
    },
];

/// Per-tier recommendation order. The first key is the tier's default.
const BY_COMPLEXITY: &[(Complexity, &[&str])] = &[
    (Complexity::Simple, &["zero-shot", "role-prompting", "user-story"]),
    (
        Complexity::Moderate,
        &["few-shot", "chain-of-thought", "the-lede", "context-action-result"],
    ),
    (
        Complexity::Complex,
        &["tree-of-thoughts", "react", "self-consistency", "situation-behavior"],
    ),
];

/// Adjacency table for "related techniques". Unlisted keys have none.
const RELATED: &[(&str, &[&str])] = &[
    ("chain-of-thought", &["tree-of-thoughts", "self-consistency", "react"]),
    ("few-shot", &["zero-shot", "chain-of-thought"]),
    ("the-lede", &["context-action-result", "user-story"]),
    ("user-story", &["situation-behavior", "the-lede"]),
    ("tree-of-thoughts", &["chain-of-thought", "react", "self-consistency"]),
];

/// Every catalog entry, in declaration order.
pub fn all() -> &'static [Technique] {
    TECHNIQUES
}

/// Every catalog key, in declaration order.
pub fn keys() -> impl Iterator<Item = &'static str> {
    TECHNIQUES.iter().map(|t| t.key)
}

/// Exact-key lookup.
pub fn get(key: &str) -> Option<&'static Technique> {
    TECHNIQUES.iter().find(|t| t.key == key)
}

/// Lenient lookup for identifiers coming from the model: exact key, then a
/// normalised key (`Chain_of thought` → `chain-of-thought`), then display
/// name with or without its parenthetical (`Chain of Thought (CoT)`,
/// `chain of thought`).
pub fn resolve(raw: &str) -> Option<&'static Technique> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Some(t) = get(raw) {
        return Some(t);
    }

    let normalized = normalize_key(raw);
    if let Some(t) = get(&normalized) {
        return Some(t);
    }

    TECHNIQUES.iter().find(|t| {
        let name = t.name.to_lowercase();
        let short = name.split(" (").next().unwrap_or(&name).trim().to_string();
        let wanted = raw.to_lowercase();
        name == wanted || short == wanted || normalize_key(&short) == normalized
    })
}

fn normalize_key(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Techniques recommended for a tier, most suitable first.
pub fn by_complexity(tier: Complexity) -> Vec<&'static Technique> {
    BY_COMPLEXITY
        .iter()
        .find(|(t, _)| *t == tier)
        .map(|(_, keys)| keys.iter().filter_map(|k| get(k)).collect())
        .unwrap_or_default()
}

/// The tier's default technique.
pub fn default_for(tier: Complexity) -> &'static Technique {
    by_complexity(tier)
        .into_iter()
        .next()
        .unwrap_or(&TECHNIQUES[0])
}

/// Techniques related to `key`. Never includes `key` itself.
pub fn related(key: &str) -> Vec<&'static Technique> {
    RELATED
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, keys)| {
            keys.iter()
                .filter(|k| **k != key)
                .filter_map(|k| get(k))
                .collect()
        })
        .unwrap_or_default()
}
