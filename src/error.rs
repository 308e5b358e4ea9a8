use std::{io, path::PathBuf};

use thiserror::Error;

/// Failures touching the profile store file. All of them are fatal for the invocation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to create config directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode config file {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("profile `{name}` in {path} is invalid: {source}")]
    InvalidProfile {
        path: PathBuf,
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Why a single probe did not get a response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("Timeout")]
    Timeout,
    #[error("{0}")]
    Transport(String),
}

/// Failures selecting a profile to apply.
#[derive(Debug, Error)]
pub enum SwitchError {
    #[error("Configuration not found: {name}")]
    ProfileNotFound { name: String, available: Vec<String> },
}

/// Failures reading or writing the Claude settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("settings file {path} is not a JSON object")]
    NotAnObject { path: PathBuf },
    #[error("failed to write settings file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
