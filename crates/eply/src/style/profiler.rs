//! Style profile construction from sent mail
//!
//! Combines the heuristic greeting/closing scan with a single semantic
//! analysis call to the completion provider. Profiling never fails the
//! request: a malformed analysis falls back to defaults and any other
//! failure yields no profile at all.

use anyhow::{Context, Result};
use log::{debug, error, warn};
use serde::Deserialize;
use std::sync::Arc;

use super::patterns::extract_patterns;
use super::profile::{AnalysisSource, Formality, MAX_COMMON_PHRASES, StyleProfile};
use crate::llm::{Completion, CompletionRequest};
use crate::models::Email;
use crate::text::truncate;

/// Sent emails whose bodies are sent for semantic analysis
const ANALYSIS_SAMPLE_EMAILS: usize = 10;
const ANALYSIS_SAMPLE_MAX_CHARS: usize = 4000;
const ANALYSIS_SEPARATOR: &str = "\n---\n";

const ANALYSIS_SYSTEM_PROMPT: &str = "You analyze how a person writes email. \
From the email texts you are given, determine:\n\
1. The overall formality level (formal, semi-formal, casual, or very casual)\n\
2. Phrases or expressions the writer uses repeatedly\n\
3. The main communication context (business, academic, personal, customer service, ...)\n\
4. The language the writer mostly uses\n\n\
Answer with a single JSON object with exactly these keys:\n\
- formality_level (string)\n\
- common_phrases (array of strings)\n\
- primary_role (string)\n\
- dominant_language (string)";

const DEFAULT_ROLE: &str = "general";
const DEFAULT_LANGUAGE: &str = "English";

/// Why an analysis answer could not be used
#[derive(Debug, thiserror::Error)]
pub enum AnalysisParseError {
    #[error("analysis answer was empty")]
    Empty,
    #[error("analysis answer is not a valid JSON object: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// The model-derived half of a style profile
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticAnalysis {
    pub formality: Formality,
    pub common_phrases: Vec<String>,
    pub primary_role: String,
    pub dominant_language: String,
}

impl Default for SemanticAnalysis {
    fn default() -> Self {
        Self {
            formality: Formality::default(),
            common_phrases: Vec::new(),
            primary_role: DEFAULT_ROLE.to_string(),
            dominant_language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

/// Wire shape of the analysis answer; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AnalysisPayload {
    formality_level: Option<String>,
    common_phrases: Vec<String>,
    primary_role: Option<String>,
    dominant_language: Option<String>,
}

impl From<AnalysisPayload> for SemanticAnalysis {
    fn from(payload: AnalysisPayload) -> Self {
        let defaults = Self::default();
        let non_empty = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            formality: payload
                .formality_level
                .map(|f| Formality::parse(&f))
                .unwrap_or(defaults.formality),
            common_phrases: payload
                .common_phrases
                .into_iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .take(MAX_COMMON_PHRASES)
                .collect(),
            primary_role: non_empty(payload.primary_role).unwrap_or(defaults.primary_role),
            dominant_language: non_empty(payload.dominant_language)
                .unwrap_or(defaults.dominant_language),
        }
    }
}

/// Parse the completion provider's analysis answer.
///
/// The JSON object may be wrapped in a fenced code block or surrounded by
/// prose; the embedded object is located first.
pub fn parse_analysis(answer: &str) -> Result<SemanticAnalysis, AnalysisParseError> {
    let payload = embedded_payload(answer).trim();
    if payload.is_empty() {
        return Err(AnalysisParseError::Empty);
    }
    let parsed: AnalysisPayload = serde_json::from_str(payload)?;
    Ok(parsed.into())
}

fn embedded_payload(answer: &str) -> &str {
    if let Some((_, rest)) = answer.split_once("```json") {
        return rest.split("```").next().unwrap_or(rest);
    }
    if let Some((_, rest)) = answer.split_once("```") {
        return rest.split("```").next().unwrap_or(rest);
    }
    match (answer.find('{'), answer.rfind('}')) {
        (Some(start), Some(end)) if start < end => &answer[start..=end],
        _ => answer,
    }
}

/// Builds [`StyleProfile`]s using an injected completion provider
pub struct StyleProfiler {
    completion: Arc<dyn Completion>,
}

impl StyleProfiler {
    pub fn new(completion: Arc<dyn Completion>) -> Self {
        Self { completion }
    }

    /// Build a style profile from the user's sent mail.
    ///
    /// Returns `None` when there is nothing to analyze or when profiling
    /// fails for any reason other than a malformed analysis answer.
    pub fn build_profile(&self, sent_emails: &[Email]) -> Option<StyleProfile> {
        match self.try_build_profile(sent_emails) {
            Ok(profile) => profile,
            Err(e) => {
                error!("Error analyzing writing style: {:#}", e);
                None
            }
        }
    }

    fn try_build_profile(&self, sent_emails: &[Email]) -> Result<Option<StyleProfile>> {
        let bodies: Vec<&str> = sent_emails
            .iter()
            .map(|email| email.body.as_str())
            .filter(|body| !body.trim().is_empty())
            .collect();

        if bodies.is_empty() {
            debug!("No sent email bodies to analyze");
            return Ok(None);
        }

        let patterns = extract_patterns(sent_emails);

        let sample = bodies
            .iter()
            .take(ANALYSIS_SAMPLE_EMAILS)
            .copied()
            .collect::<Vec<_>>()
            .join(ANALYSIS_SEPARATOR);
        let sample = truncate(&sample, ANALYSIS_SAMPLE_MAX_CHARS);

        let request = CompletionRequest::new(
            ANALYSIS_SYSTEM_PROMPT,
            format!("Analyze these email texts:\n\n{}", sample),
        )
        .max_tokens(500)
        .temperature(0.2);

        let answer = self
            .completion
            .complete(&request)
            .context("Style analysis request failed")?;

        let (analysis, analysis_source) = match parse_analysis(&answer) {
            Ok(analysis) => (analysis, AnalysisSource::Model),
            Err(e) => {
                warn!("Style analysis answer unusable, using defaults: {}", e);
                (SemanticAnalysis::default(), AnalysisSource::Defaults)
            }
        };

        Ok(Some(StyleProfile {
            greeting_patterns: patterns.greetings,
            closing_patterns: patterns.closings,
            formality: analysis.formality,
            common_phrases: analysis.common_phrases,
            primary_role: analysis.primary_role,
            dominant_language: analysis.dominant_language,
            sample_count: bodies.len(),
            analysis_source,
        }))
    }
}
