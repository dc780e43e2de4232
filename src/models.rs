use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerRecord {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub folder: String,
    pub start_script: String,
    pub stop_script: String,
    pub game_ini: String,
    pub gameusersettings_ini: String,
}

impl ServerRecord {
    pub fn validate(&self) -> Result<(), String> {
        for (field, value) in [
            ("name", &self.name),
            ("folder", &self.folder),
            ("start_script", &self.start_script),
            ("stop_script", &self.stop_script),
            ("game_ini", &self.game_ini),
            ("gameusersettings_ini", &self.gameusersettings_ini),
        ] {
            if value.trim().is_empty() {
                return Err(format!("{field} must not be empty"));
            }
        }
        Ok(())
    }

    pub fn ini_path(&self, kind: IniKind) -> &Path {
        match kind {
            IniKind::Game => Path::new(&self.game_ini),
            IniKind::GameUserSettings => Path::new(&self.gameusersettings_ini),
        }
    }
}

/// The two INI files every server carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IniKind {
    Game,
    GameUserSettings,
}

impl IniKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "game" => Some(IniKind::Game),
            "gameusersettings" => Some(IniKind::GameUserSettings),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IniKind::Game => "game",
            IniKind::GameUserSettings => "gameusersettings",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}
