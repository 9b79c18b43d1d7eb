//! Reply composition
//!
//! Two attempts at most: a personalized prompt carrying the full style
//! profile and formatting directives, then a simpler fallback prompt. The
//! result is always plain text.

use log::{error, info, warn};
use serde::Serialize;
use std::sync::Arc;

use crate::error::DraftError;
use crate::llm::{Completion, CompletionRequest};
use crate::models::Email;
use crate::style::StyleProfile;
use crate::text::{contains_markup, html_to_text, prepare_for_prompt};

const PERSONALIZED_SYSTEM_PROMPT: &str =
    "You are an assistant helping write email replies in the user's personal style.";
const FALLBACK_SYSTEM_PROMPT: &str =
    "You are an assistant helping write email replies that match the user's writing style.";

const DEFAULT_GREETING: &str = "Hello";
const DEFAULT_CLOSING: &str = "Regards";

/// Which attempt produced a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    Personalized,
    Fallback,
}

/// What to do when the personalized attempt fails with a provider error
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Provider errors are handled like an empty result
    #[default]
    OnEmptyOrError,
    /// Provider errors propagate; only an empty result falls back
    OnEmptyOnly,
}

/// A generated reply and how it was obtained
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedReply {
    pub text: String,
    pub source: ReplySource,
    /// Why the personalized attempt was abandoned, when it was
    pub degraded: Option<String>,
}

/// Generates reply text through an injected completion provider
pub struct ReplyComposer {
    completion: Arc<dyn Completion>,
    policy: FallbackPolicy,
}

impl ReplyComposer {
    pub fn new(completion: Arc<dyn Completion>) -> Self {
        Self {
            completion,
            policy: FallbackPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FallbackPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Compose a reply to `target`.
    ///
    /// The personalized attempt only runs when a profile is given. Fails
    /// with [`DraftError::GenerationFailed`] when no attempt yields text.
    pub fn compose_reply(
        &self,
        target: &Email,
        profile: Option<&StyleProfile>,
        sender_name: &str,
    ) -> Result<ComposedReply, DraftError> {
        let mut degraded = None;

        if let Some(profile) = profile {
            let request = personalized_request(target, profile, sender_name);
            match self.completion.complete(&request) {
                Ok(answer) => {
                    let text = clean_reply(&answer);
                    if !text.is_empty() {
                        return Ok(ComposedReply {
                            text,
                            source: ReplySource::Personalized,
                            degraded: None,
                        });
                    }
                    warn!("Personalized reply was empty, falling back");
                    degraded = Some("personalized reply was empty".to_string());
                }
                Err(e) if self.policy == FallbackPolicy::OnEmptyOrError => {
                    warn!("Personalized reply failed, falling back: {:#}", e);
                    degraded = Some(format!("personalized reply failed: {:#}", e));
                }
                Err(e) => {
                    error!("Personalized reply failed: {:#}", e);
                    return Err(DraftError::from_completion(e));
                }
            }
        } else {
            info!("No style profile available, using fallback reply");
        }

        let request = fallback_request(target, profile, sender_name);
        let answer = self.completion.complete(&request).map_err(|e| {
            error!("Fallback reply failed: {:#}", e);
            DraftError::from_completion(e)
        })?;

        let text = clean_reply(&answer);
        if text.is_empty() {
            error!("Both reply attempts produced no text");
            return Err(DraftError::GenerationFailed);
        }

        Ok(ComposedReply {
            text,
            source: ReplySource::Fallback,
            degraded,
        })
    }
}

/// Trim the answer and strip any markup the model produced anyway
fn clean_reply(answer: &str) -> String {
    let text = answer.trim();
    if contains_markup(text) {
        html_to_text(text)
    } else {
        text.to_string()
    }
}

fn first_joined(items: &[String], n: usize, default: &str) -> String {
    if items.is_empty() {
        return default.to_string();
    }
    items.iter().take(n).cloned().collect::<Vec<_>>().join(", ")
}

fn personalized_request(
    target: &Email,
    profile: &StyleProfile,
    sender_name: &str,
) -> CompletionRequest {
    let sender_info = if sender_name.is_empty() {
        "Unknown"
    } else {
        sender_name
    };
    let subject = if target.subject.is_empty() {
        "(No subject)"
    } else {
        target.subject.as_str()
    };

    let prompt = format!(
        "Based on the following email:\n\n\
         Subject: {subject}\n\
         From: {from}\n\
         Sender name: {sender_info}\n\
         Message: {body}\n\n\
         Generate a reply that matches the following writing style:\n\n\
         Formality level: {formality}\n\
         Typical greeting style: {greetings}\n\
         Typical closing style: {closings}\n\
         Common phrases I use: {phrases}\n\
         Primary communication context: {role}\n\n\
         Write in {language} unless the email is clearly in another language.\n\
         Be concise and clear.\n\
         Use my typical greeting and closing style.\n\n\
         IMPORTANT INSTRUCTIONS:\n\
         1. Generate ONLY plain text without ANY HTML tags\n\
         2. Address the email to the actual sender by name if appropriate\n\
         3. If using a greeting with a name, use \"{sender_name}\" as the recipient's name, not a generic placeholder\n\
         4. Do not include any formatting, styling, or HTML tags in your response\n\
         5. Use only plain text with standard line breaks\n\
         6. Use proper capitalization (first words of sentences, proper nouns, the word \"I\", and beginnings of lines)\n\
         7. Write in a casual, natural human tone and avoid formulaic or AI-sounding phrases\n\
         8. Skip the \"thank you for your email\" opening unless truly warranted\n\
         9. Be direct and personal, like a real person having a conversation\n\
         10. Vary your greeting styles instead of always using the same formula\n\
         11. Avoid excessive politeness or corporate-sounding language",
        from = if target.from.is_empty() { "(Unknown sender)" } else { target.from.as_str() },
        body = prepare_for_prompt(&target.body),
        formality = profile.formality,
        greetings = first_joined(&profile.greeting_patterns, 2, DEFAULT_GREETING),
        closings = first_joined(&profile.closing_patterns, 2, DEFAULT_CLOSING),
        phrases = first_joined(&profile.common_phrases, 3, ""),
        role = profile.primary_role,
        language = profile.dominant_language,
    );

    CompletionRequest::new(PERSONALIZED_SYSTEM_PROMPT, prompt)
}

fn fallback_request(
    target: &Email,
    profile: Option<&StyleProfile>,
    sender_name: &str,
) -> CompletionRequest {
    let body = prepare_for_prompt(&target.body);
    let body = if sender_name.is_empty() {
        body
    } else {
        format!("Email from {}:\n\n{}", sender_name, body)
    };

    let Some(profile) = profile else {
        return CompletionRequest::new(
            FALLBACK_SYSTEM_PROMPT,
            format!(
                "Please write a professional and helpful reply to this email:\n\n{}",
                body
            ),
        );
    };

    let greetings = first_joined(&profile.greeting_patterns, 3, "");
    let closings = first_joined(&profile.closing_patterns, 3, "");
    let phrases = first_joined(&profile.common_phrases, 5, "");

    let mut system = format!(
        "{}\nThe user typically writes with a {} tone.",
        FALLBACK_SYSTEM_PROMPT, profile.formality
    );
    let mut characteristics = String::new();
    if !greetings.is_empty() {
        system.push_str(&format!("\nThey often begin emails with: {}", greetings));
        characteristics.push_str(&format!("My typical greetings: {}\n", greetings));
    }
    if !closings.is_empty() {
        system.push_str(&format!("\nThey typically close with: {}", closings));
        characteristics.push_str(&format!("My typical closings: {}\n", closings));
    }
    if !phrases.is_empty() {
        system.push_str(&format!("\nCommon phrases they use: {}", phrases));
    }
    characteristics.push_str(&format!("Formality level: {}\n", profile.formality));

    let user = format!(
        "This is the email I received:\n\n{}\n\n\
         Write a reply that matches my personal writing style with these characteristics:\n\n\
         {}\n\
         Make sure your reply sounds natural and in my own voice.",
        body, characteristics
    );

    CompletionRequest::new(system, user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderKind;
    use crate::style::{AnalysisSource, Formality};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays queued answers in order and records every request
    struct QueuedCompletion {
        answers: Mutex<VecDeque<anyhow::Result<String>>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl QueuedCompletion {
        fn new(answers: Vec<anyhow::Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                answers: Mutex::new(answers.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<CompletionRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Completion for QueuedCompletion {
        fn complete(&self, request: &CompletionRequest) -> anyhow::Result<String> {
            self.requests.lock().unwrap().push(request.clone());
            self.answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(String::new()))
        }
    }

    fn ok(text: &str) -> anyhow::Result<String> {
        Ok(text.to_string())
    }

    fn target() -> Email {
        Email::builder("t1")
            .from("Frank <frank@uh.be>")
            .subject("Poster")
            .body("Dag Matthias,\n\nBezorg je je poster?\n\nMvg,\nFrank")
            .build()
    }

    fn profile() -> StyleProfile {
        StyleProfile {
            greeting_patterns: vec!["Beste Jan,".to_string(), "Beste Els,".to_string()],
            closing_patterns: vec!["Groeten,".to_string()],
            formality: Formality::SemiFormal,
            common_phrases: vec!["geen probleem".to_string()],
            primary_role: "academic".to_string(),
            dominant_language: "Dutch".to_string(),
            sample_count: 3,
            analysis_source: AnalysisSource::Model,
        }
    }

    #[test]
    fn test_personalized_reply_returned_trimmed() {
        let completion = QueuedCompletion::new(vec![ok("  Beste Frank,\n\nKomt eraan.\n\nGroeten,\n")]);
        let composer = ReplyComposer::new(completion.clone());

        let reply = composer.compose_reply(&target(), Some(&profile()), "Frank").unwrap();
        assert_eq!(reply.text, "Beste Frank,\n\nKomt eraan.\n\nGroeten,");
        assert_eq!(reply.source, ReplySource::Personalized);
        assert_eq!(reply.degraded, None);

        let requests = completion.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].system_prompt, PERSONALIZED_SYSTEM_PROMPT);
        assert_eq!(requests[0].max_tokens, 800);
        let prompt = &requests[0].user_prompt;
        assert!(prompt.contains("Subject: Poster"));
        assert!(prompt.contains("Sender name: Frank"));
        assert!(prompt.contains("Formality level: semi-formal"));
        assert!(prompt.contains("Typical greeting style: Beste Jan,, Beste Els,"));
        assert!(prompt.contains("Write in Dutch"));
        assert!(prompt.contains("11. Avoid excessive politeness"));
    }

    #[test]
    fn test_empty_personalized_reply_falls_back() {
        let completion = QueuedCompletion::new(vec![ok("   "), ok("Hoi Frank, komt goed.")]);
        let composer = ReplyComposer::new(completion.clone());

        let reply = composer.compose_reply(&target(), Some(&profile()), "Frank").unwrap();
        assert_eq!(reply.text, "Hoi Frank, komt goed.");
        assert_eq!(reply.source, ReplySource::Fallback);
        assert!(reply.degraded.is_some());

        let requests = completion.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[1].system_prompt.contains("semi-formal tone"));
        assert!(requests[1].system_prompt.contains("They typically close with: Groeten,"));
        assert!(requests[1].user_prompt.contains("Email from Frank:\n\nDag Matthias,"));
        assert!(!requests[1].user_prompt.contains("IMPORTANT INSTRUCTIONS"));
    }

    #[test]
    fn test_no_profile_uses_plain_fallback() {
        let completion = QueuedCompletion::new(vec![ok("Sure, will do.")]);
        let composer = ReplyComposer::new(completion.clone());

        let reply = composer.compose_reply(&target(), None, "").unwrap();
        assert_eq!(reply.source, ReplySource::Fallback);
        assert_eq!(reply.degraded, None);

        let requests = completion.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].system_prompt, FALLBACK_SYSTEM_PROMPT);
        assert!(
            requests[0]
                .user_prompt
                .starts_with("Please write a professional and helpful reply to this email:\n\nDag Matthias,")
        );
    }

    #[test]
    fn test_provider_error_falls_back_by_default() {
        let completion =
            QueuedCompletion::new(vec![Err(anyhow::anyhow!("rate limited")), ok("Fallback text")]);
        let composer = ReplyComposer::new(completion);

        let reply = composer.compose_reply(&target(), Some(&profile()), "Frank").unwrap();
        assert_eq!(reply.text, "Fallback text");
        assert!(reply.degraded.unwrap().contains("rate limited"));
    }

    #[test]
    fn test_provider_error_propagates_when_configured() {
        let completion =
            QueuedCompletion::new(vec![Err(anyhow::anyhow!("rate limited")), ok("unused")]);
        let composer = ReplyComposer::new(completion.clone()).with_policy(FallbackPolicy::OnEmptyOnly);

        let err = composer
            .compose_reply(&target(), Some(&profile()), "Frank")
            .unwrap_err();
        assert!(matches!(
            err,
            DraftError::Provider {
                provider: ProviderKind::Completion,
                ..
            }
        ));
        assert_eq!(completion.requests().len(), 1);
    }

    #[test]
    fn test_both_attempts_empty_is_generation_failure() {
        let composer = ReplyComposer::new(QueuedCompletion::new(vec![ok(""), ok("\n")]));
        let err = composer
            .compose_reply(&target(), Some(&profile()), "Frank")
            .unwrap_err();
        assert!(matches!(err, DraftError::GenerationFailed));
    }

    #[test]
    fn test_fallback_provider_error_propagates() {
        let composer =
            ReplyComposer::new(QueuedCompletion::new(vec![Err(anyhow::anyhow!("network down"))]));
        let err = composer.compose_reply(&target(), None, "Frank").unwrap_err();
        assert!(matches!(err, DraftError::Provider { .. }));
    }

    #[test]
    fn test_angle_bracket_address_survives_verbatim() {
        let answer = "Hi Frank,\n\nPlease loop in Jan <jan@uh.be> on this.\n\nGroeten,";
        let completion = QueuedCompletion::new(vec![ok(&format!("  {answer}\n"))]);
        let composer = ReplyComposer::new(completion);

        let reply = composer.compose_reply(&target(), Some(&profile()), "Frank").unwrap();
        assert_eq!(reply.text, answer);
        assert_eq!(reply.source, ReplySource::Personalized);
        assert_eq!(clean_reply(answer), answer);
    }

    #[test]
    fn test_markup_is_stripped_from_reply() {
        let completion =
            QueuedCompletion::new(vec![ok("<p>Beste Frank,</p><p>Komt eraan.<br>Groeten,</p>")]);
        let composer = ReplyComposer::new(completion);

        let reply = composer.compose_reply(&target(), Some(&profile()), "Frank").unwrap();
        assert!(!contains_markup(&reply.text));
        assert!(reply.text.starts_with("Beste Frank,"));
        assert!(reply.text.contains("Groeten,"));
    }
}
