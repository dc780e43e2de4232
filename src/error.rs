use std::path::PathBuf;
use thiserror::Error;

/// Which of the two writes of an INI save failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStage {
    Backup,
    Primary,
}

impl std::fmt::Display for WriteStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteStage::Backup => f.write_str("backup"),
            WriteStage::Primary => f.write_str("config"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A `Primary` failure happens only after the backup was written, so
    /// `<path>.bak` holds the pre-edit content.
    #[error("failed to write {stage} file {}: {source}", .path.display())]
    Io {
        stage: WriteStage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    pub fn stage(&self) -> Option<WriteStage> {
        match self {
            ConfigError::Parse { .. } => None,
            ConfigError::Io { stage, .. } => Some(*stage),
        }
    }
}

#[derive(Debug, Error)]
pub enum StatusError {
    #[error("process list unavailable: {0}")]
    SystemQuery(String),
}
