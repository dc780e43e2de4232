use crate::routes::{auth::CurrentUser, AppState};
use crate::services::current_datetime;
use crate::views::dashboard::{render_dashboard_page, render_server_table, server_rows};
use arkdash::error::StatusError;
use arkdash::models::ServerRecord;
use arkdash::session::Session;
use arkdash::status::{statuses, ProcessStatus};
use arkdash::storage::load_settings;
use axum::{extract::State, http::StatusCode, response::Html, Json};
use tracing::warn;

/// Shows the message a preceding POST left in the session, once.
pub async fn dashboard_page(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> Result<Html<String>, (StatusCode, String)> {
    let message = state.sessions.take_flash(&session.token).await;
    render_dashboard(&state, &session, message.as_deref()).await
}

pub async fn server_table_partial(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> Result<Html<String>, (StatusCode, String)> {
    let (table, _) = server_table(&state, &session).await?;
    Ok(Html(table))
}

#[derive(serde::Serialize)]
pub struct ServerStatusResponse {
    statuses: Vec<ProcessStatus>,
}

pub async fn server_status_api(
    State(state): State<AppState>,
    CurrentUser(_session): CurrentUser,
) -> Result<Json<ServerStatusResponse>, (StatusCode, String)> {
    let servers = state
        .servers
        .load()
        .await
        .map_err(|message| (StatusCode::INTERNAL_SERVER_ERROR, message))?;
    let statuses = current_statuses(&state, &servers)
        .await?
        .map_err(|err| (StatusCode::SERVICE_UNAVAILABLE, err.to_string()))?;
    Ok(Json(ServerStatusResponse { statuses }))
}

async fn render_dashboard(
    state: &AppState,
    session: &Session,
    message: Option<&str>,
) -> Result<Html<String>, (StatusCode, String)> {
    let (table, status_error) = server_table(state, session).await?;
    let notices: Vec<&str> = message.into_iter().chain(status_error.as_deref()).collect();
    Ok(Html(render_dashboard_page(&table, session, &notices)))
}

async fn server_table(
    state: &AppState,
    session: &Session,
) -> Result<(String, Option<String>), (StatusCode, String)> {
    let servers = state
        .servers
        .load()
        .await
        .map_err(|message| (StatusCode::INTERNAL_SERVER_ERROR, message))?;
    let (statuses, status_error) = match current_statuses(state, &servers).await? {
        Ok(statuses) => (Some(statuses), None),
        Err(err) => {
            warn!(error = %err, "could not determine server status");
            (None, Some(err.to_string()))
        }
    };
    let rows = server_rows(&servers, statuses.as_deref());
    let table = render_server_table(&rows, session.is_admin(), &current_datetime());
    Ok((table, status_error))
}

/// The outer error is a glue failure (settings unreadable); the inner one is
/// the process table being unavailable.
async fn current_statuses(
    state: &AppState,
    servers: &[ServerRecord],
) -> Result<Result<Vec<ProcessStatus>, StatusError>, (StatusCode, String)> {
    let settings = load_settings(&state.settings_path)
        .await
        .map_err(|message| (StatusCode::INTERNAL_SERVER_ERROR, message))?;
    let mut system = state.system.lock().await;
    Ok(statuses(&mut *system, servers, &settings.server_executable))
}
