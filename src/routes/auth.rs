use crate::routes::AppState;
use arkdash::session::{token_from_cookie_header, Session};
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
    response::Redirect,
};

/// A logged-in operator. Requests without a valid session are sent back to
/// the login form.
pub struct CurrentUser(pub Session);

#[async_trait::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = session_token(&parts.headers) else {
            return Err(Redirect::to("/"));
        };
        state
            .sessions
            .get(&token)
            .await
            .map(CurrentUser)
            .ok_or_else(|| Redirect::to("/"))
    }
}

pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|value| token_from_cookie_header(value).map(str::to_string))
}
