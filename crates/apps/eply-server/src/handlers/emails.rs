//! Mailbox listing handlers

use axum::{
    Json,
    extract::{Query, rejection::QueryRejection},
};
use eply::{Email, EmailId, InboxPage, get_email_detail, list_inbox, list_sent};
use serde::{Deserialize, Serialize};

use super::{gmail_for, run_blocking};
use crate::error::ApiError;
use crate::extract::BearerAuth;

const DEFAULT_INBOX_PAGE: u32 = 20;
const DEFAULT_SENT_PAGE: u32 = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxQuery {
    pub max_results: Option<u32>,
    pub page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentQuery {
    pub max_results: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct DetailQuery {
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SentEmailsResponse {
    pub emails: Vec<Email>,
}

#[derive(Debug, Serialize)]
pub struct EmailDetailResponse {
    pub email: Email,
}

pub async fn list_inbox_emails(
    BearerAuth(token): BearerAuth,
    query: Result<Query<InboxQuery>, QueryRejection>,
) -> Result<Json<InboxPage>, ApiError> {
    let Query(query) = query?;
    let max_results = query.max_results.unwrap_or(DEFAULT_INBOX_PAGE);
    let page_token = query.page_token.filter(|t| !t.is_empty());

    let page = run_blocking(move || {
        list_inbox(&gmail_for(token), page_token.as_deref(), max_results)
            .map_err(ApiError::from_provider)
    })
    .await?;

    Ok(Json(page))
}

pub async fn list_sent_emails(
    BearerAuth(token): BearerAuth,
    query: Result<Query<SentQuery>, QueryRejection>,
) -> Result<Json<SentEmailsResponse>, ApiError> {
    let Query(query) = query?;
    let max_results = query.max_results.unwrap_or(DEFAULT_SENT_PAGE);

    let emails = run_blocking(move || {
        list_sent(&gmail_for(token), max_results).map_err(ApiError::from_provider)
    })
    .await?;

    Ok(Json(SentEmailsResponse { emails }))
}

pub async fn email_detail(
    BearerAuth(token): BearerAuth,
    query: Result<Query<DetailQuery>, QueryRejection>,
) -> Result<Json<EmailDetailResponse>, ApiError> {
    let Query(query) = query?;
    let id = query
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Email ID is required".to_string()))?;

    let email = run_blocking(move || {
        get_email_detail(&gmail_for(token), &EmailId::new(id)).map_err(ApiError::from_provider)
    })
    .await?;

    Ok(Json(EmailDetailResponse { email }))
}
