//! Reply drafting handler

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use eply::{DraftAssistant, DraftId, EmailId, Mailbox, PersonalizedDraft, ReplySource, StyleProfile};
use log::info;
use serde::{Deserialize, Serialize};

use super::{gmail_for, run_blocking};
use crate::error::ApiError;
use crate::extract::BearerAuth;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateReplyRequest {
    pub email_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateReplyResponse {
    pub success: bool,
    pub reply: String,
    pub draft_id: DraftId,
    pub sender_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_analysis: Option<StyleProfile>,
    pub source: ReplySource,
}

impl From<PersonalizedDraft> for GenerateReplyResponse {
    fn from(draft: PersonalizedDraft) -> Self {
        Self {
            success: true,
            reply: draft.reply_text,
            draft_id: draft.draft_id,
            sender_name: draft.sender_name,
            style_analysis: draft.style_profile,
            source: draft.source,
        }
    }
}

/// Draft a reply to one message in the caller's own style
pub async fn generate_reply(
    State(state): State<AppState>,
    BearerAuth(token): BearerAuth,
    payload: Result<Json<GenerateReplyRequest>, JsonRejection>,
) -> Result<Json<GenerateReplyResponse>, ApiError> {
    let Json(request) = payload?;
    let email_id = request
        .email_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Email ID is required".to_string()))?;

    let completion = state.completion.clone();
    let options = state.options;

    let draft = run_blocking(move || {
        let mailbox: Arc<dyn Mailbox> = Arc::new(gmail_for(token));
        DraftAssistant::with_options(mailbox, completion, options)
            .generate_personalized_draft(&EmailId::new(email_id))
            .map_err(ApiError::from)
    })
    .await?;

    info!(
        "Created draft {} ({:?} reply)",
        draft.draft_id.as_str(),
        draft.source
    );
    Ok(Json(draft.into()))
}
