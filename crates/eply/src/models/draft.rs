//! Draft model for replies saved back to the mailbox

use serde::{Deserialize, Serialize};

use crate::compose::ReplySource;
use crate::style::StyleProfile;

/// Provider-side identifier of a created draft
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DraftId(pub String);

impl DraftId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Result of a full drafting run
#[derive(Debug, Clone, Serialize)]
pub struct PersonalizedDraft {
    /// Plain-text reply that was saved as the draft body
    pub reply_text: String,
    /// Draft created in the mailbox
    pub draft_id: DraftId,
    /// Resolved display name of the original sender
    pub sender_name: Option<String>,
    /// Style profile used for the reply, when one could be built
    pub style_profile: Option<StyleProfile>,
    /// Which composer attempt produced the reply
    pub source: ReplySource,
}
