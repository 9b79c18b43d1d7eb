//! Text normalization for email bodies
//!
//! Pure helpers shared by the style profiler and the reply composer:
//! signature stripping, header-line removal, sentence-aware truncation and
//! HTML-to-plain-text conversion.

use regex::Regex;
use std::sync::LazyLock;

/// Phrases that open a signature block, English and Dutch.
///
/// Matching is literal and case-sensitive; the earliest occurrence of any
/// marker wins regardless of its position in this list.
pub const SIGNATURE_MARKERS: &[&str] = &[
    "--",
    "Best regards",
    "Kind regards",
    "Regards",
    "Thanks",
    "Thank you",
    "Met vriendelijke groet",
    "Vriendelijke groeten",
    "Groeten",
    "Bedankt",
    "Alvast bedankt",
    "MVG",
];

/// Appended to text cut by [`truncate`]
pub const TRUNCATION_MARKER: &str = " [TRUNCATED...]";

/// Default bound for email bodies embedded in prompts
pub const DEFAULT_MAX_LENGTH: usize = 2000;

/// Header-like first lines are only recognised by a colon this early in the line
const HEADER_COLON_WINDOW: usize = 30;

/// Line width handed to html2text
const HTML_RENDER_WIDTH: usize = 1_000;

static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").unwrap());
static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").unwrap());
/// Known element names only, so `<jan@uh.be>` is not mistaken for a tag
static MARKUP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)</?(?:html|head|body|p|div|span|br|hr|a|b|i|u|em|strong|small|font|img|ul|ol|li|table|thead|tbody|tr|td|th|h[1-6]|blockquote|pre|code|style|script|meta)(?:\s[^<>]*)?/?>",
    )
    .unwrap()
});
static NUMERIC_ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&#(?:[xX]([0-9a-fA-F]{1,6})|([0-9]{1,7}));").unwrap()
});
static BLANK_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Strip the signature block and any leading header-like lines from a body.
///
/// The body is cut at the earliest signature marker. Then, while the first
/// line looks like a header or quote line (`Subject:`, `Re:`, or a colon
/// within its first 30 characters), that line is dropped. Trailing
/// whitespace is removed. Applying this twice yields the same string.
pub fn normalize(raw_body: &str) -> String {
    let cut = SIGNATURE_MARKERS
        .iter()
        .filter_map(|marker| raw_body.find(marker))
        .min()
        .unwrap_or(raw_body.len());

    let mut body = &raw_body[..cut];
    loop {
        let (first, rest) = body.split_once('\n').unwrap_or((body, ""));
        if !looks_like_header(first) {
            break;
        }
        body = rest;
    }

    body.trim_end().to_string()
}

fn looks_like_header(line: &str) -> bool {
    line.starts_with("Subject:")
        || line.to_lowercase().starts_with("re:")
        || line.chars().take(HEADER_COLON_WINDOW).any(|c| c == ':')
}

/// Bound `text` to `max_length` characters, preferring a sentence boundary.
///
/// Text that fits is returned unchanged. Otherwise the first `max_length`
/// characters are kept; if their last period sits beyond 75% of the bound
/// the cut happens right after that period. [`TRUNCATION_MARKER`] is
/// appended in both cases.
pub fn truncate(text: &str, max_length: usize) -> String {
    let Some((end, _)) = text.char_indices().nth(max_length) else {
        return text.to_string();
    };

    let prefix = &text[..end];
    if let Some(period) = prefix.rfind('.') {
        let period_chars = prefix[..period].chars().count();
        if period_chars * 4 > max_length * 3 {
            return format!("{}{}", &prefix[..=period], TRUNCATION_MARKER);
        }
    }

    format!("{}{}", prefix, TRUNCATION_MARKER)
}

/// Normalize and bound a body in one step, the form every prompt embeds
pub fn prepare_for_prompt(raw_body: &str) -> String {
    truncate(&normalize(raw_body), DEFAULT_MAX_LENGTH)
}

/// Whether the text contains HTML elements
pub fn contains_markup(text: &str) -> bool {
    MARKUP_RE.is_match(text)
}

/// Convert an HTML fragment to readable plain text
pub fn html_to_text(html: &str) -> String {
    let html = SCRIPT_RE.replace_all(html, "");
    let html = STYLE_RE.replace_all(&html, "");

    let rendered = html2text::from_read(html.as_bytes(), HTML_RENDER_WIDTH);
    let text = rendered
        .replace('\u{a0}', " ")
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");

    BLANK_RUN_RE.replace_all(&text, "\n\n").trim().to_string()
}

/// Decode the HTML entities that show up in Gmail snippets and bodies
pub fn decode_html_entities(s: &str) -> String {
    let decoded = NUMERIC_ENTITY_RE.replace_all(s, |caps: &regex::Captures| {
        let code = match (caps.get(1), caps.get(2)) {
            (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
            (_, Some(dec)) => dec.as_str().parse().ok(),
            _ => None,
        };
        code.and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    });

    decoded
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_is_identity() {
        let text = "Short body. Nothing to cut.";
        assert_eq!(truncate(text, 2000), text);
        assert_eq!(truncate(text, text.chars().count()), text);
    }

    #[test]
    fn test_truncate_cuts_at_late_period() {
        // 90 chars of sentence, a period, then filler past the bound
        let text = format!("{}.{}", "a".repeat(89), "b".repeat(50));
        let out = truncate(&text, 100);
        assert_eq!(out, format!("{}.{}", "a".repeat(89), TRUNCATION_MARKER));
    }

    #[test]
    fn test_truncate_hard_cut_when_period_too_early() {
        let text = format!("{}.{}", "a".repeat(10), "b".repeat(200));
        let out = truncate(&text, 100);
        assert_eq!(out.chars().count(), 100 + TRUNCATION_MARKER.chars().count());
        assert!(out.ends_with(TRUNCATION_MARKER));
        assert!(out.starts_with("aaaaaaaaaa.bbb"));
    }

    #[test]
    fn test_truncate_counts_characters_not_bytes() {
        let text = "é".repeat(30);
        assert_eq!(truncate(&text, 30), text);
        let out = truncate(&text, 10);
        assert_eq!(out, format!("{}{}", "é".repeat(10), TRUNCATION_MARKER));
    }

    #[test]
    fn test_normalize_strips_signature() {
        let body = "Can you send the report?\n\nBest regards,\nAlice\nACME Corp";
        let out = normalize(body);
        assert_eq!(out, "Can you send the report?");
        assert!(!out.contains("Best regards"));
        assert!(!out.contains("Alice"));
    }

    #[test]
    fn test_normalize_uses_earliest_marker() {
        // "Regards" comes before "--" in the text but after it in the list
        let body = "Please review.\nRegards\nBob\n-- \nsent from phone";
        assert_eq!(normalize(body), "Please review.");
    }

    #[test]
    fn test_normalize_markers_are_case_sensitive() {
        let body = "Dag Matthias,\n\nBezorg je je poster?\n\nMvg,\nFrank";
        assert_eq!(normalize(body), body);
    }

    #[test]
    fn test_normalize_drops_subject_line() {
        assert_eq!(normalize("Subject: Lunch\nAre you free?"), "Are you free?");
        assert_eq!(normalize("RE: Lunch\nAre you free?"), "Are you free?");
        assert_eq!(normalize("On Monday Bob wrote: hi\nAre you free?"), "Are you free?");
    }

    #[test]
    fn test_normalize_keeps_late_colon() {
        let body = "Hi team, the plan for tomorrow is this: meet at ten.";
        assert_eq!(normalize(body), body);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let bodies = [
            "Subject: x\nTime: 5pm\nSee you there.\nThanks\nBob",
            "Hello,\nQuick question about the invoice.\n\n--\nsig",
            "Plain body with no markers",
            "",
        ];
        for body in bodies {
            let once = normalize(body);
            assert_eq!(normalize(&once), once, "not idempotent for {body:?}");
        }
    }

    #[test]
    fn test_prepare_for_prompt_bounds_length() {
        let body = "word ".repeat(1000);
        let out = prepare_for_prompt(&body);
        assert!(out.chars().count() <= DEFAULT_MAX_LENGTH + TRUNCATION_MARKER.chars().count());
    }

    #[test]
    fn test_html_to_text() {
        let html = "<html><head><style>p { color: red; }</style></head>\
                    <body><p>Hello&nbsp;there,</p><div>Line one<br>Line two</div>\
                    <script>alert(1)</script><p>Tom &amp; Jerry</p></body></html>";
        let text = html_to_text(html);
        let lines: Vec<&str> = text.lines().map(str::trim).collect();

        assert!(lines.contains(&"Hello there,"));
        assert!(lines.contains(&"Line one"));
        assert!(lines.contains(&"Line two"));
        assert!(lines.contains(&"Tom & Jerry"));
        assert!(!text.contains("alert"));
        assert!(!text.contains("color"));
        assert!(!contains_markup(&text));
    }

    #[test]
    fn test_contains_markup() {
        assert!(contains_markup("<p>Hi</p>"));
        assert!(contains_markup("Hi<br/>there"));
        assert!(contains_markup("<a href=\"https://uh.be\">link</a>"));
        assert!(contains_markup("<DIV class=\"x\">Hi</DIV>"));
        assert!(!contains_markup("3 < 4 and 5 > 2"));
        assert!(!contains_markup("plain text"));
    }

    #[test]
    fn test_angle_bracket_address_is_not_markup() {
        assert!(!contains_markup("Please loop in Jan <jan@uh.be> on this."));
        assert!(!contains_markup("Mail <a@b.c> or <info@uh.be>"));
        assert!(!contains_markup("See <https://uh.be/poster>"));
    }

    #[test]
    fn test_decode_html_entities() {
        let input = "Hello &amp; welcome &lt;user&gt;";
        assert_eq!(decode_html_entities(input), "Hello & welcome <user>");
        assert_eq!(decode_html_entities("&amp;lt;"), "&lt;");
        assert_eq!(decode_html_entities("&#39;"), "'");
    }

    #[test]
    fn test_decode_numeric_entities() {
        assert_eq!(decode_html_entities("Don&#8217;t forget"), "Don\u{2019}t forget");
        assert_eq!(decode_html_entities("it&#x27;s &#X41;"), "it's A");
        assert_eq!(decode_html_entities("caf&#233;"), "caf\u{e9}");
        assert_eq!(decode_html_entities("bad &#xFFFFFF; ref"), "bad &#xFFFFFF; ref");
        assert_eq!(decode_html_entities("&amp;#39;"), "&#39;");
    }
}
