use crate::models::ServerRecord;
use crate::status::DEFAULT_SERVER_EXECUTABLE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub server_executable: String,
    pub bind_address: String,
    pub update_script: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            server_executable: DEFAULT_SERVER_EXECUTABLE.to_string(),
            bind_address: "0.0.0.0:5443".to_string(),
            update_script: "update.bat".to_string(),
        }
    }
}

impl AppSettings {
    pub fn validate(&self) -> Result<(), String> {
        for (field, value) in [
            ("server_executable", &self.server_executable),
            ("bind_address", &self.bind_address),
            ("update_script", &self.update_script),
        ] {
            if value.trim().is_empty() {
                return Err(format!("{field} must not be empty"));
            }
        }
        Ok(())
    }
}

pub fn base_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("ARKDASH_DATA_DIR") {
        return PathBuf::from(dir);
    }
    if let Ok(appdata) = std::env::var("APPDATA") {
        return PathBuf::from(appdata).join("arkdash");
    }
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("arkdash");
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".config").join("arkdash");
    }
    PathBuf::from("arkdash-data")
}

pub fn settings_path() -> PathBuf {
    base_dir().join("settings.json")
}

pub fn servers_path() -> PathBuf {
    base_dir().join("servers.json")
}

pub async fn load_settings(path: &Path) -> Result<AppSettings, String> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => serde_json::from_str(&contents)
            .map_err(|err| format!("failed to parse settings: {err}")),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(AppSettings::default()),
        Err(err) => Err(format!("failed to read settings: {err}")),
    }
}

/// Handle on `servers.json`. Every read-modify-write goes through one lock
/// shared by all clones, so concurrent requests cannot interleave their
/// writes or clobber each other's temp file.
#[derive(Debug, Clone)]
pub struct ServerList {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl ServerList {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Records without an id get one and the list is written back so the id
    /// stays stable across loads.
    pub async fn load(&self) -> Result<Vec<ServerRecord>, String> {
        let _guard = self.lock.lock().await;
        load_servers(&self.path).await
    }

    pub async fn find(&self, server_id: &str) -> Result<ServerRecord, String> {
        self.load()
            .await?
            .into_iter()
            .find(|server| server.id == server_id)
            .ok_or_else(|| "Server not found.".to_string())
    }

    pub async fn add(&self, mut server: ServerRecord) -> Result<ServerRecord, String> {
        server.validate()?;
        let _guard = self.lock.lock().await;
        let mut servers = load_servers(&self.path).await?;
        server.id = new_server_id();
        servers.push(server.clone());
        save_servers(&self.path, &servers).await?;
        Ok(server)
    }

    pub async fn remove(&self, server_id: &str) -> Result<ServerRecord, String> {
        let _guard = self.lock.lock().await;
        let mut servers = load_servers(&self.path).await?;
        let index = servers
            .iter()
            .position(|server| server.id == server_id)
            .ok_or_else(|| "Server not found.".to_string())?;
        let removed = servers.remove(index);
        save_servers(&self.path, &servers).await?;
        Ok(removed)
    }
}

/// Callers hold the list lock.
async fn load_servers(path: &Path) -> Result<Vec<ServerRecord>, String> {
    let mut servers: Vec<ServerRecord> = match tokio::fs::read_to_string(path).await {
        Ok(contents) => serde_json::from_str(&contents)
            .map_err(|err| format!("failed to parse servers: {err}"))?,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(format!("failed to read servers: {err}")),
    };

    let mut assigned = 0;
    for server in servers.iter_mut().filter(|server| server.id.trim().is_empty()) {
        server.id = new_server_id();
        assigned += 1;
    }
    if assigned > 0 {
        info!(assigned, "assigned ids to legacy server records");
        save_servers(path, &servers).await?;
    }

    Ok(servers)
}

/// Writes a temp file and renames it over the list, which replaces the
/// target atomically on every supported platform.
async fn save_servers(path: &Path, servers: &[ServerRecord]) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|err| format!("failed to create servers dir: {err}"))?;
    }

    let data = serde_json::to_string_pretty(servers)
        .map_err(|err| format!("failed to serialize servers: {err}"))?;

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, data)
        .await
        .map_err(|err| format!("failed to write temp servers: {err}"))?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|err| format!("failed to move servers into place: {err}"))
}

fn new_server_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
