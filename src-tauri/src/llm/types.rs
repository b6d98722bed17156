//! Analysis result types.
//!
//! `AnalysisResult` is what the presentation layer renders. It is produced by
//! either the model-backed analyzer or the keyword fallback, and is never
//! mutated after construction.

use serde::{Deserialize, Serialize};

/// Key elements are capped at this many entries.
pub const MAX_KEY_ELEMENTS: usize = 8;
/// At most this many improvement suggestions are kept.
pub const MAX_IMPROVEMENTS: usize = 3;
/// At most this many alternative techniques are offered.
pub const MAX_ALTERNATIVES: usize = 2;

/// Complexity tier. Ordered: `Simple < Moderate < Complex`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    Moderate,
    Complex,
}

impl Complexity {
    pub const ALL: [Complexity; 3] = [Self::Simple, Self::Moderate, Self::Complex];

    /// Parse a tier reported by an untrusted source. Case and surrounding
    /// whitespace are ignored; anything outside the closed set is `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "simple" => Some(Self::Simple),
            "moderate" => Some(Self::Moderate),
            "complex" => Some(Self::Complex),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Moderate => "moderate",
            Self::Complex => "complex",
        }
    }

    /// Display label for the UI.
    pub fn label(self) -> &'static str {
        match self {
            Self::Simple => "Simple",
            Self::Moderate => "Moderate",
            Self::Complex => "Complex",
        }
    }
}

impl std::fmt::Display for Complexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name, description and link of a technique, as shown for alternatives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechniqueSummary {
    pub name: String,
    pub description: String,
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub complexity: Complexity,
    /// Display name of the primary technique.
    pub technique: String,
    pub technique_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technique_link: Option<String>,
    /// Why the model picked this technique. Absent on the fallback path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    /// Structural steps, copied from the matched catalog entry. Never empty.
    pub structure: Vec<String>,
    /// Deduplicated, order-preserving, at most `MAX_KEY_ELEMENTS`.
    pub key_elements: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub improvements: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternative_techniques: Option<Vec<TechniqueSummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tips: Option<Vec<String>>,
}

/// Why a result came from the deterministic path instead of the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FallbackReason {
    /// Model-assisted mode is switched off.
    Disabled,
    /// Runtime not installed, not running, or the probe timed out.
    Unavailable,
    /// Process spawn failure, non-zero exit, HTTP error, network error.
    Transport,
    /// The runtime answered but its output was unusable.
    MalformedResponse,
}

/// Where a value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "reason")]
pub enum Origin {
    Model,
    Fallback(FallbackReason),
}

impl Origin {
    pub fn is_model(self) -> bool {
        matches!(self, Self::Model)
    }

    pub fn from_error(err: &crate::error::RuntimeError) -> Self {
        if err.is_malformed() {
            Self::Fallback(FallbackReason::MalformedResponse)
        } else if err.is_unavailable() {
            Self::Fallback(FallbackReason::Unavailable)
        } else {
            Self::Fallback(FallbackReason::Transport)
        }
    }
}

/// Order-preserving dedup + cap. Blank entries are dropped.
pub fn dedup_capped<I, S>(items: I, cap: usize) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for item in items {
        let item = item.as_ref().trim();
        if item.is_empty() || out.iter().any(|e| e.eq_ignore_ascii_case(item)) {
            continue;
        }
        out.push(item.to_string());
        if out.len() == cap {
            break;
        }
    }
    out
}
