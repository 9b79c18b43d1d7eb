//! Writing-style analysis of the user's sent mail

mod patterns;
mod profile;
mod profiler;

pub use patterns::{MAX_PATTERNS, Patterns, extract_patterns};
pub use profile::{AnalysisSource, Formality, MAX_COMMON_PHRASES, StyleProfile};
pub use profiler::{AnalysisParseError, SemanticAnalysis, StyleProfiler, parse_analysis};
