use arkdash::models::ServerRecord;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub folder: String,
    #[serde(default)]
    pub start_script: String,
    #[serde(default)]
    pub stop_script: String,
    #[serde(default)]
    pub game_ini: String,
    #[serde(default)]
    pub gameusersettings_ini: String,
}

impl ServerForm {
    /// The id is assigned when the record is stored.
    pub fn to_record(&self) -> ServerRecord {
        ServerRecord {
            id: String::new(),
            name: self.name.trim().to_string(),
            folder: self.folder.trim().to_string(),
            start_script: self.start_script.trim().to_string(),
            stop_script: self.stop_script.trim().to_string(),
            game_ini: self.game_ini.trim().to_string(),
            gameusersettings_ini: self.gameusersettings_ini.trim().to_string(),
        }
    }
}
