//! OAuth web flow handlers

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use eply::TokenGrant;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::{gmail_for, run_blocking};
use crate::error::ApiError;
use crate::extract::BearerAuth;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AuthUrlQuery {
    pub redirect_uri: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthUrlResponse {
    pub auth_url: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub code: Option<String>,
    pub redirect_uri: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
    pub token_type: String,
}

impl From<TokenGrant> for TokenResponse {
    fn from(grant: TokenGrant) -> Self {
        Self {
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            expires_in: grant.expires_in,
            token_type: grant.token_type,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub expires_in: Option<u64>,
    pub token_type: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Consent screen URL for the Gmail scopes
pub async fn auth_url(
    State(state): State<AppState>,
    Query(query): Query<AuthUrlQuery>,
) -> Result<Json<AuthUrlResponse>, ApiError> {
    let auth = state.auth()?;
    let redirect_uri =
        non_empty(query.redirect_uri).unwrap_or_else(|| state.config.redirect_uri.clone());

    Ok(Json(AuthUrlResponse {
        auth_url: auth.authorization_url(&redirect_uri),
    }))
}

/// Exchange an authorization code and remember the tokens for the account
pub async fn exchange_token(
    State(state): State<AppState>,
    payload: Result<Json<TokenRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Json(request) = payload?;
    let code = non_empty(request.code)
        .ok_or_else(|| ApiError::BadRequest("Authorization code is required".to_string()))?;
    let redirect_uri =
        non_empty(request.redirect_uri).unwrap_or_else(|| state.config.redirect_uri.clone());
    let auth = state.auth()?;

    let grant = run_blocking(move || {
        let grant = auth
            .exchange_code(&code, &redirect_uri)
            .map_err(ApiError::from_provider)?;
        let profile = gmail_for(grant.access_token.clone())
            .get_profile()
            .map_err(ApiError::from_provider)?;

        auth.remember(&profile.email_address, &grant)
            .map_err(|e| ApiError::Internal(format!("Failed to store tokens: {:#}", e)))?;
        info!("Stored tokens for {}", profile.email_address);
        Ok(grant)
    })
    .await?;

    Ok(Json(grant.into()))
}

/// Trade a refresh token for a new access token
pub async fn refresh_token(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let Json(request) = payload?;
    let refresh_token = non_empty(request.refresh_token)
        .ok_or_else(|| ApiError::BadRequest("Refresh token is required".to_string()))?;
    let auth = state.auth()?;

    let grant = run_blocking(move || {
        let grant = auth.refresh(&refresh_token).map_err(ApiError::from_provider)?;

        // Keep the stored copy in sync for the CLI path
        match gmail_for(grant.access_token.clone()).get_profile() {
            Ok(profile) => {
                if let Err(e) = auth.remember(&profile.email_address, &grant) {
                    warn!("Failed to store refreshed tokens: {:#}", e);
                }
            }
            Err(e) => warn!("Could not resolve account for refreshed token: {:#}", e),
        }
        Ok(grant)
    })
    .await?;

    Ok(Json(RefreshResponse {
        access_token: grant.access_token,
        expires_in: grant.expires_in,
        token_type: grant.token_type,
    }))
}

/// Check the caller's access token against the Gmail profile endpoint
pub async fn verify_token(BearerAuth(token): BearerAuth) -> Response {
    let result = run_blocking(move || {
        gmail_for(token)
            .get_profile()
            .map_err(ApiError::from_provider)
    })
    .await;

    match result {
        Ok(profile) => Json(VerifyResponse {
            valid: true,
            email: Some(profile.email_address),
            error: None,
        })
        .into_response(),
        Err(e) => {
            warn!("Token verification failed: {}", e);
            (
                StatusCode::UNAUTHORIZED,
                Json(VerifyResponse {
                    valid: false,
                    email: None,
                    error: Some(e.to_string()),
                }),
            )
                .into_response()
        }
    }
}

/// Drop the stored tokens for the caller's account
pub async fn logout(
    State(state): State<AppState>,
    BearerAuth(token): BearerAuth,
) -> Result<Json<MessageResponse>, ApiError> {
    let auth = state.auth()?;

    run_blocking(move || {
        let profile = gmail_for(token)
            .get_profile()
            .map_err(ApiError::from_provider)?;
        let removed = auth
            .forget(&profile.email_address)
            .map_err(|e| ApiError::Internal(format!("Failed to remove tokens: {:#}", e)))?;
        if removed {
            info!("Removed stored tokens for {}", profile.email_address);
        }
        Ok(())
    })
    .await?;

    Ok(Json(MessageResponse {
        message: "Logged out successfully".to_string(),
    }))
}
