use crate::error::StatusError;
use crate::models::ServerRecord;
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use sysinfo::{ProcessRefreshKind, System, UpdateKind};
use tracing::debug;

pub const DEFAULT_SERVER_EXECUTABLE: &str = "ArkAscendedServer.exe";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessStatus {
    Running,
    Stopped,
}

impl ProcessStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessStatus::Running => "running",
            ProcessStatus::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub pid: u32,
    pub name: String,
    pub cwd: Option<PathBuf>,
}

/// Source of the OS-wide process list.
pub trait ProcessTable {
    /// Processes that vanish or hide their metadata are left out rather
    /// than reported; an error means the listing itself is unavailable.
    fn snapshot(&mut self) -> Result<Vec<ProcessEntry>, StatusError>;
}

impl ProcessTable for System {
    fn snapshot(&mut self) -> Result<Vec<ProcessEntry>, StatusError> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(StatusError::SystemQuery(format!(
                "process listing is not supported on {}",
                std::env::consts::OS
            )));
        }

        self.refresh_processes_specifics(ProcessRefreshKind::new().with_cwd(UpdateKind::Always));
        let entries = self
            .processes()
            .values()
            .map(|process| ProcessEntry {
                pid: process.pid().as_u32(),
                name: process.name().to_string(),
                cwd: process
                    .cwd()
                    .filter(|cwd| !cwd.as_os_str().is_empty())
                    .map(Path::to_path_buf),
            })
            .collect::<Vec<_>>();
        debug!(count = entries.len(), "scanned process table");

        let own_pid = sysinfo::get_current_pid()
            .map_err(|err| StatusError::SystemQuery(err.to_string()))?;
        check_listing(&entries, own_pid.as_u32())?;
        Ok(entries)
    }
}

/// A readable process table always lists the caller. An empty or partial
/// listing (masked procfs, restricted container) is reported as unavailable
/// instead of every server looking stopped.
pub fn check_listing(entries: &[ProcessEntry], own_pid: u32) -> Result<(), StatusError> {
    if entries.is_empty() {
        return Err(StatusError::SystemQuery("process table is empty".to_string()));
    }
    if !entries.iter().any(|entry| entry.pid == own_pid) {
        return Err(StatusError::SystemQuery(format!(
            "process table does not list the current process ({own_pid})"
        )));
    }
    Ok(())
}

pub fn status(
    table: &mut impl ProcessTable,
    server: &ServerRecord,
    executable: &str,
) -> Result<ProcessStatus, StatusError> {
    let processes = table.snapshot()?;
    Ok(match_status(&processes, server, executable))
}

/// Evaluates every server against a single scan of the process table.
pub fn statuses(
    table: &mut impl ProcessTable,
    servers: &[ServerRecord],
    executable: &str,
) -> Result<Vec<ProcessStatus>, StatusError> {
    let processes = table.snapshot()?;
    Ok(servers
        .iter()
        .map(|server| match_status(&processes, server, executable))
        .collect())
}

pub fn match_status(
    processes: &[ProcessEntry],
    server: &ServerRecord,
    executable: &str,
) -> ProcessStatus {
    let folder = comparable_path(Path::new(&server.folder));
    let running = processes
        .iter()
        .filter(|process| process.name == executable)
        .filter_map(|process| process.cwd.as_deref())
        .any(|cwd| comparable_path(cwd).starts_with(&folder));

    if running {
        ProcessStatus::Running
    } else {
        ProcessStatus::Stopped
    }
}

/// Absolute, lexically normalized and lower-cased; the game servers run on a
/// case-insensitive file system.
pub fn comparable_path(path: &Path) -> String {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|dir| dir.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    normalize(&absolute).to_string_lossy().to_lowercase()
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeTable {
        entries: Vec<ProcessEntry>,
        scans: usize,
    }

    impl FakeTable {
        fn new(entries: Vec<(&str, Option<&str>)>) -> Self {
            Self {
                entries: entries
                    .into_iter()
                    .enumerate()
                    .map(|(index, (name, cwd))| ProcessEntry {
                        pid: index as u32 + 100,
                        name: name.to_string(),
                        cwd: cwd.map(PathBuf::from),
                    })
                    .collect(),
                scans: 0,
            }
        }
    }

    impl ProcessTable for FakeTable {
        fn snapshot(&mut self) -> Result<Vec<ProcessEntry>, StatusError> {
            self.scans += 1;
            Ok(self.entries.clone())
        }
    }

    struct UnavailableTable;

    impl ProcessTable for UnavailableTable {
        fn snapshot(&mut self) -> Result<Vec<ProcessEntry>, StatusError> {
            Err(StatusError::SystemQuery("no procfs".to_string()))
        }
    }

    fn server(folder: &str) -> ServerRecord {
        ServerRecord {
            id: "1".to_string(),
            name: "Island".to_string(),
            folder: folder.to_string(),
            start_script: "start.bat".to_string(),
            stop_script: "stop.bat".to_string(),
            game_ini: "Game.ini".to_string(),
            gameusersettings_ini: "GameUserSettings.ini".to_string(),
        }
    }

    #[test]
    fn stopped_without_matching_process() {
        let mut table = FakeTable::new(vec![("bash", Some("/srv/ark/island"))]);
        let result = status(&mut table, &server("/srv/ark/island"), DEFAULT_SERVER_EXECUTABLE);
        assert_eq!(result.expect("status"), ProcessStatus::Stopped);
    }

    #[test]
    fn running_when_cwd_equals_folder() {
        let mut table = FakeTable::new(vec![(DEFAULT_SERVER_EXECUTABLE, Some("/srv/ark/island"))]);
        let result = status(&mut table, &server("/srv/ark/island"), DEFAULT_SERVER_EXECUTABLE);
        assert_eq!(result.expect("status"), ProcessStatus::Running);
    }

    #[test]
    fn running_from_subdirectory_with_different_case() {
        let mut table = FakeTable::new(vec![(
            DEFAULT_SERVER_EXECUTABLE,
            Some("/SRV/Ark/Island/ShooterGame/Binaries/Win64"),
        )]);
        let result = status(&mut table, &server("/srv/ark/island/"), DEFAULT_SERVER_EXECUTABLE);
        assert_eq!(result.expect("status"), ProcessStatus::Running);
    }

    #[test]
    fn other_folder_or_executable_is_stopped() {
        let mut table = FakeTable::new(vec![
            (DEFAULT_SERVER_EXECUTABLE, Some("/srv/ark/ragnarok")),
            ("ArkAscendedServer", Some("/srv/ark/island")),
            (DEFAULT_SERVER_EXECUTABLE, None),
        ]);
        let result = status(&mut table, &server("/srv/ark/island"), DEFAULT_SERVER_EXECUTABLE);
        assert_eq!(result.expect("status"), ProcessStatus::Stopped);
    }

    #[test]
    fn unavailable_process_table_is_an_error() {
        let result = status(&mut UnavailableTable, &server("/srv/ark"), DEFAULT_SERVER_EXECUTABLE);
        assert!(matches!(result, Err(StatusError::SystemQuery(_))));
    }

    #[test]
    fn statuses_share_one_scan() {
        let mut table = FakeTable::new(vec![(DEFAULT_SERVER_EXECUTABLE, Some("/srv/ark/island"))]);
        let servers = vec![server("/srv/ark/island"), server("/srv/ark/ragnarok")];
        let result = statuses(&mut table, &servers, DEFAULT_SERVER_EXECUTABLE).expect("statuses");
        assert_eq!(result, vec![ProcessStatus::Running, ProcessStatus::Stopped]);
        assert_eq!(table.scans, 1);
    }

    #[test]
    fn relative_folders_are_resolved_and_normalized() {
        let cwd = std::env::current_dir().expect("cwd");
        let expected = cwd.join("ark").to_string_lossy().to_lowercase();
        assert_eq!(comparable_path(Path::new("./ark/../ark/")), expected);
    }

    #[test]
    fn real_process_table_reports_unknown_folder_as_stopped() {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return;
        }
        let mut system = System::new();
        let folder = std::env::temp_dir().join("arkdash-no-such-server");
        let result = status(
            &mut system,
            &server(&folder.to_string_lossy()),
            DEFAULT_SERVER_EXECUTABLE,
        );
        assert_eq!(result.expect("status"), ProcessStatus::Stopped);
    }

    fn entry(pid: u32) -> ProcessEntry {
        ProcessEntry {
            pid,
            name: "bash".to_string(),
            cwd: None,
        }
    }

    #[test]
    fn listing_without_own_process_is_unavailable() {
        assert!(matches!(check_listing(&[], 42), Err(StatusError::SystemQuery(_))));
        assert!(matches!(
            check_listing(&[entry(1), entry(7)], 42),
            Err(StatusError::SystemQuery(_))
        ));
        assert!(check_listing(&[entry(1), entry(42)], 42).is_ok());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn real_process_table_reports_own_working_directory() {
        let mut system = System::new();
        let entries = system.snapshot().expect("snapshot");
        let own = entries
            .iter()
            .find(|entry| entry.pid == std::process::id())
            .expect("own process listed");
        let cwd = own.cwd.as_deref().expect("own cwd");
        let expected = std::env::current_dir().expect("current dir");
        assert_eq!(
            std::fs::canonicalize(cwd).expect("canonical cwd"),
            std::fs::canonicalize(expected).expect("canonical current dir")
        );
    }
}
