use arkdash::error::{ConfigError, WriteStage};
use arkdash::ini::backup_path;
use arkdash::models::ServerRecord;
use arkdash::scripts::{resolve_script, restart, spawn_detached, ServerAction};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Start and stop return as soon as the script is launched. Restart runs in
/// the background so the request does not wait for the stop script.
pub fn launch_action(server: &ServerRecord, action: ServerAction) -> Result<(), String> {
    let folder = PathBuf::from(&server.folder);
    let start_script = resolve_script(&folder, &server.start_script);
    let stop_script = resolve_script(&folder, &server.stop_script);

    match action {
        ServerAction::Start => spawn_detached(&start_script, &folder),
        ServerAction::Stop => spawn_detached(&stop_script, &folder),
        ServerAction::Restart => {
            let name = server.name.clone();
            tokio::spawn(async move {
                if let Err(err) = restart(&stop_script, &start_script, &folder).await {
                    warn!(server = %name, error = %err, "restart failed");
                }
            });
            Ok(())
        }
    }
}

pub fn save_failure_message(err: &ConfigError, path: &Path) -> String {
    match err.stage() {
        Some(WriteStage::Backup) => format!("Backup failed, nothing was changed: {err}"),
        Some(WriteStage::Primary) => format!(
            "Saving failed; {} still holds the previous settings: {err}",
            backup_path(path).display()
        ),
        None => err.to_string(),
    }
}

pub fn current_datetime() -> String {
    let format = time::format_description::parse("[year]-[month]-[day] [hour]:[minute]:[second]")
        .unwrap_or_else(|_| time::format_description::parse("[year]-[month]-[day]").expect("format"));
    let now = time::OffsetDateTime::now_local().unwrap_or_else(|_| time::OffsetDateTime::now_utc());
    now.format(&format).unwrap_or_else(|_| "n/a".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_message_names_the_backup_for_primary_errors() {
        let err = ConfigError::Io {
            stage: WriteStage::Primary,
            path: PathBuf::from("/srv/Game.ini"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let message = save_failure_message(&err, Path::new("/srv/Game.ini"));
        assert!(message.contains("Game.ini.bak"));

        let err = ConfigError::Io {
            stage: WriteStage::Backup,
            path: PathBuf::from("/srv/Game.ini.bak"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(save_failure_message(&err, Path::new("/srv/Game.ini")).starts_with("Backup failed"));
    }

    #[test]
    fn datetime_has_date_part() {
        let value = current_datetime();
        assert!(value.len() >= 10);
    }
}
