pub mod auth;
pub mod dashboard;
pub mod health;
pub mod ini_editor;
pub mod login;
pub mod servers;

use arkdash::{
    security::CredentialLookup,
    session::SessionStore,
    storage::{servers_path, settings_path, ServerList},
};
use axum::{
    routing::{get, post},
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use sysinfo::System;
use tokio::sync::Mutex;
use tower_http::services::ServeDir;

#[derive(Clone)]
pub struct AppState {
    pub settings_path: PathBuf,
    pub servers: ServerList,
    pub credentials: Arc<dyn CredentialLookup>,
    pub sessions: SessionStore,
    pub system: Arc<Mutex<System>>,
}

pub fn build_router(state: AppState) -> Router {
    let web_dir = web_dir();
    Router::new()
        .route("/", get(login::login_page).post(login::login_submit))
        .route("/logout", get(login::logout))
        .route("/dashboard", get(dashboard::dashboard_page))
        .route("/partials/server-table", get(dashboard::server_table_partial))
        .route("/api/server_status", get(dashboard::server_status_api))
        .route("/server/:server_id/:action", post(servers::server_action))
        .route("/api/server_update/:server_id", post(servers::server_update))
        .route("/edit_ini/:server_id/:which", get(ini_editor::edit_ini_page).post(ini_editor::save_ini))
        .route("/add_server", get(servers::add_server_page).post(servers::add_server_submit))
        .route("/delete_server/:server_id", post(servers::delete_server))
        .route("/health", get(health::health))
        .nest_service("/web", ServeDir::new(web_dir))
        .with_state(state)
}

pub fn default_state(credentials: Arc<dyn CredentialLookup>) -> AppState {
    AppState {
        settings_path: settings_path(),
        servers: ServerList::new(servers_path()),
        credentials,
        sessions: SessionStore::new(),
        system: Arc::new(Mutex::new(System::new())),
    }
}

fn web_dir() -> PathBuf {
    std::env::var("ARKDASH_WEB_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("web"))
}
