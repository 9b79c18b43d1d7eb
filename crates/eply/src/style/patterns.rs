//! Greeting and closing extraction from sent mail

use regex::Regex;
use std::sync::LazyLock;

use crate::models::Email;

/// Maximum distinct values kept per category
pub const MAX_PATTERNS: usize = 5;

const GREETING_SCAN_LINES: usize = 3;
const GREETING_MAX_CHARS: usize = 60;
const CLOSING_SCAN_LINES: usize = 5;
const CLOSING_MAX_CHARS: usize = 100;

static GREETING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(hi|hello|dear|good|hey|greetings|morning|afternoon|evening|hallo|beste|dag|goedemorgen|goedemiddag|goedenavond|hoi)\b",
    )
    .unwrap()
});

static CLOSING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(thanks|thank you|regards|best|sincerely|cheers|best regards|kind regards|warm regards|met vriendelijke groet|groeten|bedankt|alvast bedankt|mvg)\b",
    )
    .unwrap()
});

/// Greeting and closing lines found in a user's sent mail
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Patterns {
    pub greetings: Vec<String>,
    pub closings: Vec<String>,
}

/// Scan sent emails for the user's habitual greeting and closing lines.
///
/// Per email, the first of its first three non-empty lines that starts with
/// a greeting word (and is shorter than 60 characters) is recorded. Every
/// line among the last five that starts with a closing word (and is shorter
/// than 100 characters) is recorded. Results are deduplicated in first-seen
/// order and capped at [`MAX_PATTERNS`] each.
pub fn extract_patterns(sent_emails: &[Email]) -> Patterns {
    let mut greetings = OrderedSet::default();
    let mut closings = OrderedSet::default();

    for email in sent_emails {
        let body = email.body.trim();
        if body.is_empty() {
            continue;
        }
        let lines: Vec<&str> = body.lines().collect();

        if let Some(greeting) = find_greeting(&lines) {
            greetings.insert(greeting);
        }
        for closing in find_closings(&lines) {
            closings.insert(closing);
        }
    }

    Patterns {
        greetings: greetings.into_first(MAX_PATTERNS),
        closings: closings.into_first(MAX_PATTERNS),
    }
}

fn find_greeting(lines: &[&str]) -> Option<String> {
    lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .take(GREETING_SCAN_LINES)
        .find(|line| line.chars().count() < GREETING_MAX_CHARS && GREETING_RE.is_match(line))
        .map(str::to_string)
}

fn find_closings(lines: &[&str]) -> Vec<String> {
    let start = lines.len().saturating_sub(CLOSING_SCAN_LINES);
    lines[start..]
        .iter()
        .map(|line| line.trim())
        .filter(|line| {
            !line.is_empty()
                && line.chars().count() < CLOSING_MAX_CHARS
                && CLOSING_RE.is_match(line)
        })
        .map(str::to_string)
        .collect()
}

/// Insertion-ordered set of strings
#[derive(Default)]
struct OrderedSet {
    items: Vec<String>,
}

impl OrderedSet {
    fn insert(&mut self, value: String) {
        if !self.items.contains(&value) {
            self.items.push(value);
        }
    }

    fn into_first(mut self, n: usize) -> Vec<String> {
        self.items.truncate(n);
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sent(id: &str, body: &str) -> Email {
        Email::builder(id).from("me@example.com").body(body).build()
    }

    #[test]
    fn test_extracts_greeting_and_closing() {
        let emails = vec![sent(
            "s1",
            "Hi Anna,\n\nThe slides are attached.\n\nCheers,\nTom",
        )];
        let patterns = extract_patterns(&emails);
        assert_eq!(patterns.greetings, vec!["Hi Anna,"]);
        assert_eq!(patterns.closings, vec!["Cheers,"]);
    }

    #[test]
    fn test_no_keywords_yields_empty() {
        let emails = vec![
            sent("s1", "Sure, works for me.\nSee you at noon."),
            sent("s2", "Attached.\n\nT."),
        ];
        assert_eq!(extract_patterns(&emails), Patterns::default());
    }

    #[test]
    fn test_greeting_only_first_three_non_empty_lines() {
        let emails = vec![sent(
            "s1",
            "\n\nOk.\n\nNoted.\nAlso.\nHello there\nbody",
        )];
        assert!(extract_patterns(&emails).greetings.is_empty());
    }

    #[test]
    fn test_greeting_stops_after_first_hit() {
        let emails = vec![sent("s1", "Hey Bob,\nHello again\nbody")];
        assert_eq!(extract_patterns(&emails).greetings, vec!["Hey Bob,"]);
    }

    #[test]
    fn test_long_greeting_line_is_ignored() {
        let long = format!("Hello {}", "x".repeat(60));
        let emails = vec![sent("s1", &format!("{long}\nbody"))];
        assert!(extract_patterns(&emails).greetings.is_empty());
    }

    #[test]
    fn test_greeting_requires_word_boundary() {
        let emails = vec![sent("s1", "History of the project\nbody")];
        assert!(extract_patterns(&emails).greetings.is_empty());
    }

    #[test]
    fn test_multiple_closings_per_email() {
        let emails = vec![sent(
            "s1",
            "Beste Jan,\n\nZie bijlage.\n\nAlvast bedankt!\nGroeten,\nPiet",
        )];
        let patterns = extract_patterns(&emails);
        assert_eq!(patterns.greetings, vec!["Beste Jan,"]);
        assert_eq!(patterns.closings, vec!["Alvast bedankt!", "Groeten,"]);
    }

    #[test]
    fn test_dedup_and_cap_preserve_first_seen_order() {
        let emails: Vec<Email> = (0..8)
            .map(|i| {
                sent(
                    &format!("s{i}"),
                    &format!("Hi person{},\nbody\nThanks {}\nBest", i % 7, i % 7),
                )
            })
            .collect();

        let patterns = extract_patterns(&emails);
        assert_eq!(
            patterns.greetings,
            vec!["Hi person0,", "Hi person1,", "Hi person2,", "Hi person3,", "Hi person4,"]
        );
        assert_eq!(patterns.closings.len(), MAX_PATTERNS);
        assert_eq!(patterns.closings[0], "Thanks 0");
        assert_eq!(patterns.closings[1], "Best");

        let mut unique = patterns.closings.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), patterns.closings.len());
    }
}
