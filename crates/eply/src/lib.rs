//! Eply - Reply drafting in the user's own writing style
//!
//! This crate provides the platform-independent core:
//! - Domain models (Email, EmailAddress, PersonalizedDraft)
//! - Gmail API client, OAuth web flow and per-user token storage
//! - Completion provider abstraction with an OpenAI-compatible client
//! - Style profiling of sent mail and reply composition
//! - Query API for the HTTP layer
//!
//! External services sit behind the [`Mailbox`], [`Completion`] and
//! [`TokenSource`] traits and are injected at construction.

pub mod assistant;
pub mod compose;
pub mod config;
pub mod error;
pub mod gmail;
pub mod llm;
pub mod mailbox;
pub mod models;
pub mod query;
pub mod sender;
pub mod style;
pub mod text;

pub use assistant::{AssistantOptions, DraftAssistant, reply_subject};
pub use compose::{ComposedReply, FallbackPolicy, ReplyComposer, ReplySource};
pub use config::{CompletionConfig, GmailCredentials};
pub use error::{AuthenticationError, DraftError, MessageNotFoundError, ProviderKind};
pub use gmail::{
    BearerToken, GmailAuth, GmailClient, StoredCredential, TokenGrant, TokenSource, TokenStore,
    api::ProfileResponse,
};
pub use llm::{Completion, CompletionRequest, OpenAiClient};
pub use mailbox::{MailFilter, Mailbox, MessagePage};
pub use models::{DraftId, Email, EmailAddress, EmailId, EmailSummary, PersonalizedDraft};
pub use query::{InboxPage, get_email_detail, list_inbox, list_sent};
pub use sender::resolve_sender_name;
pub use style::{AnalysisSource, Formality, StyleProfile, StyleProfiler};
