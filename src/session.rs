use crate::models::Role;
use crate::security::random_token;
use std::time::{Duration, Instant};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;

pub const SESSION_COOKIE: &str = "arkdash_session";
pub const SESSION_TTL: Duration = Duration::from_secs(12 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub username: String,
    pub role: Role,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

struct Entry {
    session: Session,
    created_at: Instant,
    flash: Option<String>,
}

/// Logged-in operators keyed by cookie token. Lives only in memory, so a
/// restart logs everyone out. Sessions expire `ttl` after login.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<String, Entry>>>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_ttl(SESSION_TTL)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    pub async fn create(&self, username: &str, role: Role) -> String {
        let token = random_token(32);
        let entry = Entry {
            session: Session {
                token: token.clone(),
                username: username.to_string(),
                role,
            },
            created_at: Instant::now(),
            flash: None,
        };
        let mut sessions = self.inner.lock().await;
        sessions.retain(|_, entry| entry.created_at.elapsed() < self.ttl);
        sessions.insert(token.clone(), entry);
        token
    }

    pub async fn get(&self, token: &str) -> Option<Session> {
        let mut sessions = self.inner.lock().await;
        let expired = sessions.get(token)?.created_at.elapsed() >= self.ttl;
        if expired {
            sessions.remove(token);
            return None;
        }
        sessions.get(token).map(|entry| entry.session.clone())
    }

    pub async fn remove(&self, token: &str) -> Option<Session> {
        self.inner.lock().await.remove(token).map(|entry| entry.session)
    }

    /// Stores a message shown once on the next page the session loads.
    pub async fn set_flash(&self, token: &str, message: String) {
        if let Some(entry) = self.inner.lock().await.get_mut(token) {
            entry.flash = Some(message);
        }
    }

    pub async fn take_flash(&self, token: &str) -> Option<String> {
        self.inner.lock().await.get_mut(token)?.flash.take()
    }
}

/// Extracts the session token from a `Cookie` header value.
pub fn token_from_cookie_header(header: &str) -> Option<&str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

pub fn session_cookie(token: &str) -> String {
    format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; Secure; SameSite=Lax; Max-Age={}",
        SESSION_TTL.as_secs()
    )
}

pub fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; Secure; SameSite=Lax; Max-Age=0")
}
