//! Sender display-name resolution
//!
//! Replies greet the sender by name, so a name is derived from the `From`
//! header, then from the signature block, then from the address itself.

use log::{debug, warn};
use regex::Regex;
use std::sync::LazyLock;

use crate::models::Email;

/// Signature openers checked in order when the header carries no name
const SENDER_MARKERS: &[&str] = &[
    "--",
    "Best regards",
    "Kind regards",
    "Regards",
    "Thanks",
    "Thank you",
    "Met vriendelijke groet",
    "Vriendelijke groeten",
    "Groeten",
    "MVG",
];

/// Characters of body examined from a signature marker onwards
const SIGNATURE_WINDOW_CHARS: usize = 150;
/// Lines after the marker line that may hold the name
const NAME_LOOKAHEAD_LINES: usize = 2;
const MAX_NAME_WORDS: usize = 3;

static MARKER_RES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    SENDER_MARKERS
        .iter()
        .filter_map(|marker| {
            Regex::new(&format!("(?i){}", regex::escape(marker)))
                .ok()
                .map(|re| (*marker, re))
        })
        .collect()
});

static LOCAL_PART_NOISE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9_.\-]+").unwrap());

/// Derive a display name for the sender of `email`.
///
/// Returns an empty string when no name can be found.
pub fn resolve_sender_name(email: &Email) -> String {
    let sender = email.sender();

    if let Some(name) = sender.name {
        debug!("Sender name taken from From header");
        return name;
    }

    if let Some(name) = name_from_signature(&email.body) {
        debug!("Sender name taken from signature block");
        return name;
    }

    if email.from.contains('@') {
        return name_from_address(&sender.email);
    }

    warn!("Could not resolve a sender name for message {}", email.id.as_str());
    String::new()
}

fn name_from_signature(body: &str) -> Option<String> {
    for (marker, re) in MARKER_RES.iter() {
        let Some(found) = re.find(body) else {
            continue;
        };
        // A marker opening the body is not a signature
        if found.start() == 0 {
            continue;
        }

        let window = char_window(&body[found.start()..], SIGNATURE_WINDOW_CHARS);
        let mut lines = window.split('\n');
        let marker_line = lines.next().unwrap_or_default();

        let trailing = marker_line
            .get(found.len()..)
            .unwrap_or_default()
            .trim_start_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace())
            .trim();
        if is_plausible_name(trailing) {
            return Some(trailing.to_string());
        }

        let next = lines
            .take(NAME_LOOKAHEAD_LINES)
            .map(str::trim)
            .find(|line| is_plausible_name(line));
        if let Some(name) = next {
            return Some(name.to_string());
        }

        debug!("No name found after signature marker {:?}", marker);
    }

    None
}

/// One to three words, and not an address or link
fn is_plausible_name(candidate: &str) -> bool {
    let words = candidate.split_whitespace().count();
    (1..=MAX_NAME_WORDS).contains(&words)
        && !candidate.contains('@')
        && !candidate.contains("http")
}

fn char_window(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Title-cased words of the address's local part, e.g. `jane.doe42` -> `Jane Doe`
fn name_from_address(address: &str) -> String {
    let local = address.split('@').next().unwrap_or_default();
    LOCAL_PART_NOISE_RE
        .replace_all(local, " ")
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
