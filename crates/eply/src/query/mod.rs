//! Query API for the HTTP layer
//!
//! Provides high-level read functions over a [`crate::Mailbox`] that return
//! data shaped for display.

mod emails;

pub use emails::{InboxPage, fetch_messages, get_email_detail, list_inbox, list_sent};
