use crate::forms::LoginForm;
use crate::routes::{auth::session_token, AppState};
use crate::views::login::render_login_page;
use arkdash::security::authenticate;
use arkdash::session::{expired_session_cookie, session_cookie};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use tracing::{info, warn};

pub async fn login_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        if state.sessions.get(&token).await.is_some() {
            return Redirect::to("/dashboard").into_response();
        }
    }
    Html(render_login_page(None)).into_response()
}

pub async fn login_submit(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    let username = form.username.trim();
    match authenticate(state.credentials.as_ref(), username, &form.password) {
        Some(user) => {
            let token = state.sessions.create(&user.username, user.role).await;
            info!(username = %user.username, "operator logged in");
            (
                [(header::SET_COOKIE, session_cookie(&token))],
                Redirect::to("/dashboard"),
            )
                .into_response()
        }
        None => {
            warn!(username = %username, "rejected login");
            (
                StatusCode::UNAUTHORIZED,
                Html(render_login_page(Some("Invalid credentials."))),
            )
                .into_response()
        }
    }
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        if let Some(session) = state.sessions.remove(&token).await {
            info!(username = %session.username, "operator logged out");
        }
    }
    (
        [(header::SET_COOKIE, expired_session_cookie())],
        Redirect::to("/"),
    )
        .into_response()
}
