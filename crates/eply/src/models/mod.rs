//! Domain models for mail entities

mod draft;
mod email;

pub use draft::{DraftId, PersonalizedDraft};
pub use email::{Email, EmailAddress, EmailBuilder, EmailId, EmailSummary};
