use crate::routes::{auth::CurrentUser, AppState};
use crate::services::save_failure_message;
use crate::views::ini_editor::render_ini_editor;
use arkdash::ini;
use arkdash::models::{IniKind, ServerRecord};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Html,
    Form,
};
use std::collections::HashMap;
use tracing::warn;

pub async fn edit_ini_page(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path((server_id, which)): Path<(String, String)>,
) -> Result<Html<String>, (StatusCode, String)> {
    let (server, kind) = resolve_target(&state, &server_id, &which).await?;
    let path = server.ini_path(kind);

    let html = match ini::parse(path).await {
        Ok(document) => render_ini_editor(&session, &server, kind, Some(&document), None),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "cannot open config for editing");
            render_ini_editor(&session, &server, kind, None, Some(&err.to_string()))
        }
    };
    Ok(Html(html))
}

pub async fn save_ini(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path((server_id, which)): Path<(String, String)>,
    Form(edits): Form<HashMap<String, String>>,
) -> Result<Html<String>, (StatusCode, String)> {
    let (server, kind) = resolve_target(&state, &server_id, &which).await?;
    let path = server.ini_path(kind);

    let document = match ini::parse(path).await {
        Ok(document) => document,
        Err(err) => {
            return Ok(Html(render_ini_editor(
                &session,
                &server,
                kind,
                None,
                Some(&err.to_string()),
            )))
        }
    };

    let message = match ini::save(path, &document, &edits).await {
        Ok(_) => "Settings saved!".to_string(),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "saving config failed");
            save_failure_message(&err, path)
        }
    };

    let html = match ini::parse(path).await {
        Ok(saved) => render_ini_editor(&session, &server, kind, Some(&saved), Some(&message)),
        Err(err) => render_ini_editor(
            &session,
            &server,
            kind,
            None,
            Some(&format!("{message} {err}")),
        ),
    };
    Ok(Html(html))
}

async fn resolve_target(
    state: &AppState,
    server_id: &str,
    which: &str,
) -> Result<(ServerRecord, IniKind), (StatusCode, String)> {
    let kind = IniKind::parse(which)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("unknown config file '{which}'")))?;
    let server = state
        .servers
        .find(server_id)
        .await
        .map_err(|message| (StatusCode::NOT_FOUND, message))?;
    Ok((server, kind))
}
