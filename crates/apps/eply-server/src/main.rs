//! Eply server
//!
//! HTTP API for the reply drafting assistant, plus a `draft` command that
//! drafts a reply for an account whose tokens are already stored.

mod error;
mod extract;
mod handlers;
mod routes;
mod settings;
mod state;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use eply::{
    AssistantOptions, Completion, CompletionConfig, DraftAssistant, EmailId, GmailAuth,
    GmailClient, GmailCredentials, OpenAiClient, StoredCredential, TokenStore,
};
use log::{error, info, warn};
use tokio::{net::TcpListener, signal};

use crate::settings::ServerConfig;
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "eply-server", version, about = "Draft Gmail replies in your own writing style")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Draft a reply to one message using stored tokens
    Draft {
        /// Gmail address whose stored tokens are used
        #[arg(short, long)]
        user: String,
        /// Gmail message id to reply to
        email_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    if let Err(e) = config::init() {
        error!("Failed to initialize config directory: {:#}", e);
    }

    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve().await,
        Command::Draft { user, email_id } => draft(user, email_id).await,
    }
}

fn completion_client() -> Result<Arc<OpenAiClient>> {
    let config = CompletionConfig::from_env()?;
    let client = OpenAiClient::new(&config);
    info!("Using completion model {}", client.model());
    Ok(Arc::new(client))
}

fn gmail_auth() -> Result<Arc<GmailAuth>> {
    let credentials = GmailCredentials::load()?;
    let store = TokenStore::open_default().context("Failed to open token store")?;
    Ok(Arc::new(GmailAuth::new(credentials, Arc::new(store))))
}

async fn serve() -> Result<()> {
    let server_config = ServerConfig::load()?;
    let completion: Arc<dyn Completion> = completion_client()?;

    let auth = match gmail_auth() {
        Ok(auth) => Some(auth),
        Err(e) => {
            warn!("OAuth endpoints disabled: {:#}", e);
            None
        }
    };

    let addr = server_config.bind_address();
    let state = AppState {
        auth,
        completion,
        config: Arc::new(server_config),
        options: AssistantOptions::default(),
    };
    let app = routes::create_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Eply server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn draft(user: String, email_id: String) -> Result<()> {
    let auth = gmail_auth()?;
    let completion: Arc<dyn Completion> = completion_client()?;

    let draft = tokio::task::spawn_blocking(move || {
        let tokens = Arc::new(StoredCredential::new(auth, user));
        let mailbox = Arc::new(GmailClient::new(tokens));
        DraftAssistant::new(mailbox, completion).generate_personalized_draft(&EmailId::new(email_id))
    })
    .await??;

    println!("Draft {} created", draft.draft_id.as_str());
    if let Some(name) = &draft.sender_name {
        println!("Replying to {}", name);
    }
    println!();
    println!("{}", draft.reply_text);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
