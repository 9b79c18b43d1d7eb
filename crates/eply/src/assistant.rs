//! Personalized draft generation
//!
//! Runs the full pipeline for one incoming email: fetch it, resolve the
//! sender's name, profile the user's sent mail, compose a reply, and save
//! the reply as a draft. Each stage finishes before the next begins.

use log::{error, info, warn};
use std::sync::Arc;

use crate::compose::{FallbackPolicy, ReplyComposer};
use crate::error::DraftError;
use crate::llm::Completion;
use crate::mailbox::Mailbox;
use crate::models::{Email, EmailId, PersonalizedDraft};
use crate::query::list_sent;
use crate::sender::resolve_sender_name;
use crate::style::StyleProfiler;

/// Tunables for [`DraftAssistant`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssistantOptions {
    /// Number of sent emails fetched for style profiling
    pub sent_sample_size: u32,
    pub fallback_policy: FallbackPolicy,
}

impl Default for AssistantOptions {
    fn default() -> Self {
        Self {
            sent_sample_size: 30,
            fallback_policy: FallbackPolicy::default(),
        }
    }
}

/// Drafts replies in the user's own style
pub struct DraftAssistant {
    mailbox: Arc<dyn Mailbox>,
    profiler: StyleProfiler,
    composer: ReplyComposer,
    options: AssistantOptions,
}

impl DraftAssistant {
    pub fn new(mailbox: Arc<dyn Mailbox>, completion: Arc<dyn Completion>) -> Self {
        Self::with_options(mailbox, completion, AssistantOptions::default())
    }

    pub fn with_options(
        mailbox: Arc<dyn Mailbox>,
        completion: Arc<dyn Completion>,
        options: AssistantOptions,
    ) -> Self {
        Self {
            mailbox,
            profiler: StyleProfiler::new(completion.clone()),
            composer: ReplyComposer::new(completion).with_policy(options.fallback_policy),
            options,
        }
    }

    /// Generate a reply to `email_id` and save it as a draft to the sender
    pub fn generate_personalized_draft(
        &self,
        email_id: &EmailId,
    ) -> Result<PersonalizedDraft, DraftError> {
        info!("Generating personalized draft for {}", email_id);

        let target = self.mailbox.get_message(email_id).map_err(|e| {
            error!("Failed to fetch email {}: {:#}", email_id, e);
            DraftError::from_mailbox(e)
        })?;

        let sender_name = resolve_sender_name(&target);
        info!("Resolved sender name: {:?}", sender_name);

        let sent_emails = self.fetch_sent_mail()?;
        let profile = self.profiler.build_profile(&sent_emails);
        match &profile {
            Some(p) => info!(
                "Style profile built from {} sent emails ({:?})",
                p.sample_count, p.analysis_source
            ),
            None => info!("No style profile available"),
        }

        let reply = self
            .composer
            .compose_reply(&target, profile.as_ref(), &sender_name)?;
        if let Some(reason) = &reply.degraded {
            warn!("Draft for {} used the fallback reply: {}", email_id, reason);
        }

        let subject = reply_subject(&target.subject);
        let draft_id = self
            .mailbox
            .create_draft(&target.from, &subject, &reply.text)
            .map_err(|e| {
                error!("Failed to create draft for {}: {:#}", email_id, e);
                DraftError::from_mailbox(e)
            })?;

        Ok(PersonalizedDraft {
            reply_text: reply.text,
            draft_id,
            sender_name: (!sender_name.is_empty()).then_some(sender_name),
            style_profile: profile,
            source: reply.source,
        })
    }

    fn fetch_sent_mail(&self) -> Result<Vec<Email>, DraftError> {
        list_sent(self.mailbox.as_ref(), self.options.sent_sample_size).map_err(|e| {
            error!("Failed to fetch sent mail: {:#}", e);
            DraftError::from_mailbox(e)
        })
    }
}

/// Subject for a reply, without stacking `Re:` prefixes
pub fn reply_subject(subject: &str) -> String {
    let trimmed = subject.trim();
    if trimmed
        .get(..3)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("re:"))
    {
        trimmed.to_string()
    } else {
        format!("Re: {}", trimmed)
    }
}
