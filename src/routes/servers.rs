use crate::forms::ServerForm;
use crate::routes::{auth::CurrentUser, AppState};
use crate::services::launch_action;
use crate::views::servers::render_add_server_page;
use arkdash::scripts::{resolve_script, run_captured, ServerAction};
use arkdash::session::Session;
use arkdash::storage::load_settings;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use std::path::PathBuf;
use tracing::info;

/// Leaves `message` for the dashboard and sends the browser there, so a
/// reload does not repeat the POST.
async fn back_to_dashboard(state: &AppState, session: &Session, message: String) -> Redirect {
    state.sessions.set_flash(&session.token, message).await;
    Redirect::to("/dashboard")
}

pub async fn server_action(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path((server_id, action)): Path<(String, String)>,
) -> Redirect {
    let server = match state.servers.find(&server_id).await {
        Ok(server) => server,
        Err(message) => return back_to_dashboard(&state, &session, message).await,
    };

    let message = match ServerAction::parse(&action) {
        Some(parsed) => match launch_action(&server, parsed) {
            Ok(()) => {
                info!(server = %server.name, action = %action, username = %session.username, "server action");
                format!("{} {}!", server.name, parsed.progress_label())
            }
            Err(err) => format!("Error running action '{action}' for {}: {err}", server.name),
        },
        None => format!("Unknown action '{action}'."),
    };

    back_to_dashboard(&state, &session, message).await
}

#[derive(serde::Serialize)]
pub struct UpdateResponse {
    success: bool,
    message: String,
    output: String,
}

impl UpdateResponse {
    fn failed(message: String) -> Self {
        Self {
            success: false,
            message,
            output: String::new(),
        }
    }
}

pub async fn server_update(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(server_id): Path<String>,
) -> (StatusCode, Json<UpdateResponse>) {
    let server = match state.servers.find(&server_id).await {
        Ok(server) => server,
        Err(message) => return (StatusCode::NOT_FOUND, Json(UpdateResponse::failed(message))),
    };
    let settings = match load_settings(&state.settings_path).await {
        Ok(settings) => settings,
        Err(message) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(UpdateResponse::failed(message)),
            )
        }
    };

    let folder = PathBuf::from(&server.folder);
    let script = resolve_script(&folder, &settings.update_script);
    info!(server = %server.name, username = %session.username, "running update");

    let response = match run_captured(&script, &folder).await {
        Ok(output) if output.success => UpdateResponse {
            success: true,
            message: format!("{} update complete!", server.name),
            output: output.stdout,
        },
        Ok(output) => UpdateResponse {
            success: false,
            message: format!("Update failed for {}.", server.name),
            output: output.stderr,
        },
        Err(err) => UpdateResponse::failed(format!("Error running update: {err}")),
    };
    (StatusCode::OK, Json(response))
}

pub async fn add_server_page(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> Response {
    if !session.is_admin() {
        let message = "Only admin users can add servers.".to_string();
        return back_to_dashboard(&state, &session, message).await.into_response();
    }
    Html(render_add_server_page(&session, &ServerForm::default(), None)).into_response()
}

pub async fn add_server_submit(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Form(form): Form<ServerForm>,
) -> Response {
    if !session.is_admin() {
        let message = "Only admin users can add servers.".to_string();
        return back_to_dashboard(&state, &session, message).await.into_response();
    }

    match state.servers.add(form.to_record()).await {
        Ok(server) => {
            info!(server = %server.name, id = %server.id, username = %session.username, "server added");
            back_to_dashboard(&state, &session, "Server added!".to_string())
                .await
                .into_response()
        }
        Err(message) => Html(render_add_server_page(&session, &form, Some(&message))).into_response(),
    }
}

pub async fn delete_server(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(server_id): Path<String>,
) -> Redirect {
    if !session.is_admin() {
        let message = "Only admin users can delete servers.".to_string();
        return back_to_dashboard(&state, &session, message).await;
    }

    let message = match state.servers.remove(&server_id).await {
        Ok(removed) => {
            info!(server = %removed.name, username = %session.username, "server deleted");
            format!("Deleted server: {}", removed.name)
        }
        Err(message) => message,
    };
    back_to_dashboard(&state, &session, message).await
}
