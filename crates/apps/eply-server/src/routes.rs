//! Route definitions

use axum::{
    Router,
    http::{HeaderValue, Method},
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};

use crate::{handlers, state::AppState};

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.allowed_origins);

    Router::new()
        .route("/health", get(handlers::health::health_check))
        // OAuth web flow
        .route("/auth/url", get(handlers::auth::auth_url))
        .route("/auth/token", post(handlers::auth::exchange_token))
        .route("/auth/refresh", post(handlers::auth::refresh_token))
        .route("/auth/verify-token", get(handlers::auth::verify_token))
        .route("/auth/logout", post(handlers::auth::logout))
        // Mailbox
        .route("/get-emails", get(handlers::emails::list_inbox_emails))
        .route("/get-sent-emails", get(handlers::emails::list_sent_emails))
        .route("/get-email-detail", get(handlers::emails::email_detail))
        // Drafting
        .route("/generate-reply", post(handlers::reply::generate_reply))
        .layer(cors)
        .with_state(state)
}

/// Any origin when none are configured, otherwise only the listed ones
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}
