use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerAction {
    Start,
    Stop,
    Restart,
}

impl ServerAction {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "start" => Some(ServerAction::Start),
            "stop" => Some(ServerAction::Stop),
            "restart" => Some(ServerAction::Restart),
            _ => None,
        }
    }

    pub fn progress_label(&self) -> &'static str {
        match self {
            ServerAction::Start => "starting",
            ServerAction::Stop => "stopping",
            ServerAction::Restart => "restarting",
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ScriptOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Relative scripts live in the server folder.
pub fn resolve_script(folder: &Path, script: &str) -> PathBuf {
    let path = Path::new(script);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        folder.join(path)
    }
}

fn script_command(script: &Path, cwd: &Path) -> Command {
    #[cfg(windows)]
    let mut command = {
        let mut command = Command::new("cmd");
        command.arg("/C").arg(script);
        command
    };
    #[cfg(not(windows))]
    let mut command = Command::new(script);

    command.current_dir(cwd).stdin(Stdio::null());
    command
}

/// Starts the script without waiting for it. Must run inside a tokio runtime,
/// which reaps the child once it exits.
pub fn spawn_detached(script: &Path, cwd: &Path) -> Result<(), String> {
    let child = script_command(script, cwd)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|err| format!("failed to run {}: {err}", script.display()))?;
    info!(script = %script.display(), pid = ?child.id(), "launched script");
    Ok(())
}

pub async fn run_captured(script: &Path, cwd: &Path) -> Result<ScriptOutput, String> {
    let mut command = script_command(script, cwd);
    let output = command
        .output()
        .await
        .map_err(|err| format!("failed to run {}: {err}", script.display()))?;

    let result = ScriptOutput {
        success: output.status.success(),
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };
    if result.success {
        info!(script = %script.display(), "script finished");
    } else {
        warn!(script = %script.display(), exit_code = ?result.exit_code, "script failed");
    }
    Ok(result)
}

/// Waits for the stop script before launching the start script. The start
/// script runs even if stopping reported a failure.
pub async fn restart(stop_script: &Path, start_script: &Path, cwd: &Path) -> Result<(), String> {
    match run_captured(stop_script, cwd).await {
        Ok(output) if !output.success => {
            warn!(stderr = %output.stderr.trim(), "stop script failed before restart");
        }
        Ok(_) => {}
        Err(err) => warn!(error = %err, "stop script did not run before restart"),
    }
    spawn_detached(start_script, cwd)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_actions() {
        assert_eq!(ServerAction::parse("restart"), Some(ServerAction::Restart));
        assert_eq!(ServerAction::parse("update"), None);
        assert_eq!(ServerAction::Stop.progress_label(), "stopping");
    }

    #[test]
    fn relative_scripts_resolve_against_folder() {
        let folder = Path::new("/srv/ark/island");
        assert_eq!(
            resolve_script(folder, "update.bat"),
            PathBuf::from("/srv/ark/island/update.bat")
        );
        assert_eq!(
            resolve_script(folder, "/opt/scripts/start.sh"),
            PathBuf::from("/opt/scripts/start.sh")
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn missing_script_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let script = dir.path().join("does-not-exist.sh");
        assert!(run_captured(&script, dir.path()).await.is_err());
        assert!(spawn_detached(&script, dir.path()).is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_output_in_working_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let output = run_captured(Path::new("/bin/pwd"), dir.path())
            .await
            .expect("pwd");
        assert!(output.success);
        assert_eq!(output.exit_code, Some(0));
        let name = dir.path().file_name().expect("name").to_string_lossy().to_string();
        assert!(output.stdout.trim_end().ends_with(&name));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn reports_non_zero_exit() {
        let dir = tempfile::tempdir().expect("tempdir");
        let output = run_captured(Path::new("/bin/false"), dir.path())
            .await
            .expect("false");
        assert!(!output.success);
        assert_eq!(output.exit_code, Some(1));
    }
}
