//! Style profile model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of common phrases kept on a profile
pub const MAX_COMMON_PHRASES: usize = 10;

/// How formally the user writes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Formality {
    Formal,
    SemiFormal,
    Casual,
    VeryCasual,
    /// Anything the analysis returned that isn't one of the known levels
    Other(String),
}

impl Formality {
    /// Label used when no analysis is available
    pub const BALANCED: &'static str = "balanced";

    /// Parse a free-text label, tolerating case, spaces and underscores
    pub fn parse(label: &str) -> Self {
        let key: String = label
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == ' ' || c == '_' { '-' } else { c })
            .collect();

        match key.as_str() {
            "formal" => Self::Formal,
            "semi-formal" | "semiformal" => Self::SemiFormal,
            "casual" => Self::Casual,
            "very-casual" => Self::VeryCasual,
            "" => Self::default(),
            _ => Self::Other(label.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Formal => "formal",
            Self::SemiFormal => "semi-formal",
            Self::Casual => "casual",
            Self::VeryCasual => "very casual",
            Self::Other(label) => label,
        }
    }
}

impl Default for Formality {
    fn default() -> Self {
        Self::Other(Self::BALANCED.to_string())
    }
}

impl fmt::Display for Formality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Formality {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<Formality> for String {
    fn from(f: Formality) -> Self {
        f.as_str().to_string()
    }
}

/// Where the semantic fields of a profile came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisSource {
    /// Parsed from the completion provider's answer
    Model,
    /// The answer was malformed; defaults were used
    Defaults,
}

/// Summary of how the user writes, derived per request from sent mail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleProfile {
    /// Up to five distinct greeting lines, first-seen order
    pub greeting_patterns: Vec<String>,
    /// Up to five distinct closing lines, first-seen order
    pub closing_patterns: Vec<String>,
    #[serde(rename = "formality_level")]
    pub formality: Formality,
    /// Up to ten phrases the user tends to repeat
    pub common_phrases: Vec<String>,
    pub primary_role: String,
    pub dominant_language: String,
    /// Number of sent emails that were analyzed
    pub sample_count: usize,
    pub analysis_source: AnalysisSource,
}
