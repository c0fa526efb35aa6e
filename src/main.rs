//! Client Portal Backend
//!
//! REST backend for client portals: access control, invitation lifecycle and
//! per-project document trees, persisted in SQLite.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod models;
mod notify;
mod portal;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;
use notify::{LogNotifier, Notifier};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub notifier: Arc<dyn Notifier>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Client Portal Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!(
        max_free_files = config.quota.max_free_files,
        max_free_projects = config.quota.max_free_projects,
        "Free plan limits"
    );

    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (PORTAL_API_PSK). Gateway authentication is disabled!");
    }

    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    let state = AppState {
        repo,
        notifier: Arc::new(LogNotifier),
        config: Arc::new(config.clone()),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let psk = state.config.api_psk.clone();

    let api_routes = Router::new()
        // Session
        .route("/session/sync", post(api::sync_session))
        // Projects
        .route("/projects", get(api::list_projects).post(api::create_project))
        .route(
            "/projects/{project_id}",
            get(api::get_project).delete(api::delete_project),
        )
        .route("/projects/{project_id}/activity", get(api::list_activity))
        // Document tree
        .route("/projects/{project_id}/folders", get(api::list_folders))
        .route("/projects/{project_id}/files", get(api::list_files))
        .route("/projects/{project_id}/tree", get(api::get_tree))
        .route("/projects/{project_id}/documents", post(api::create_document))
        .route("/documents/{document_id}", delete(api::delete_document))
        .route(
            "/documents/{document_id}/versions",
            get(api::list_versions).post(api::add_version),
        )
        // Membership
        .route(
            "/portals/{portal_id}/members",
            get(api::list_members).post(api::invite_member),
        )
        .route("/portals/{portal_id}/members/resend", post(api::resend_invite))
        .route("/portals/{portal_id}/me", get(api::get_my_membership))
        .route("/portal-members/{member_id}", delete(api::remove_member))
        .route("/invites/{token}/accept", post(api::accept_invite))
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
