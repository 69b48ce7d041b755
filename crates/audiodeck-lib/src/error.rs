//! Error types for the audiodeck engine.
//!
//! Resource failures never escape their caller: the renderer turns them into
//! error nodes and the exporter into skipped entries. Only the export-level
//! variants reach the user as a blocking notification.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to retrieve one resource.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Non-success response. `reason` is the status text, e.g. "Not Found".
    #[error("{reason}")]
    Status { status: u16, reason: String },

    /// Request never produced a response.
    #[error("{0}")]
    Transport(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FetchError {
    pub fn status(status: u16, reason: impl Into<String>) -> Self {
        Self::Status {
            status,
            reason: reason.into(),
        }
    }

    pub fn not_found() -> Self {
        Self::status(404, "Not Found")
    }
}

/// Export-level failures, each surfaced to the user.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("archive library not loaded. Cannot create ZIP file.")]
    MissingCapability,

    #[error("export already in progress")]
    Busy,

    #[error("no files to export")]
    Hidden,

    #[error("创建 ZIP 文件失败: {0}")]
    Serialize(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),

    #[error("failed to load audio: {0}")]
    Fetch(#[from] FetchError),

    #[error("cannot decode audio: {0}")]
    Decode(String),

    #[error("audio output unavailable: {0}")]
    Output(String),

    #[error("playback thread unavailable")]
    Closed,

    #[error("failed to spawn playback thread: {0}")]
    Spawn(std::io::Error),
}

#[derive(Debug, Error)]
pub enum PrepareError {
    #[error("input file not found at {0}")]
    InputMissing(PathBuf),

    #[error("no non-empty lines found in {0}")]
    NoLines(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
