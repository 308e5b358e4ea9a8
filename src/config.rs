use dirs::home_dir;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Timeout for a single ad-hoc probe
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(5000);

/// Per-probe timeout used when sweeping every profile
pub const SWEEP_PROBE_TIMEOUT: Duration = Duration::from_millis(3000);

pub const BASE_URL_VAR: &str = "ANTHROPIC_BASE_URL";
pub const AUTH_TOKEN_VAR: &str = "ANTHROPIC_AUTH_TOKEN";

fn home() -> PathBuf {
    home_dir().unwrap_or_else(|| PathBuf::from("./"))
}

/// Get the config base directory path (without creating it)
/// Can be overridden with CLAUDE_CONFIG_DIR environment variable for testing
pub fn config_dir() -> PathBuf {
    if let Ok(custom_dir) = env::var("CLAUDE_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        home().join(".claude-config")
    }
}

/// Get the path to the profile store file
pub fn store_path() -> PathBuf {
    config_dir().join("configs.json")
}

/// Get the Claude settings path (can be overridden with CLAUDE_SETTINGS_PATH env var)
pub fn claude_settings_path() -> PathBuf {
    if let Ok(p) = env::var("CLAUDE_SETTINGS_PATH") {
        PathBuf::from(p)
    } else {
        home().join(".claude").join("settings.json")
    }
}

/// Shell rc file that receives `export` lines on Unix
pub fn shell_rc_path() -> PathBuf {
    let shell = env::var("SHELL").unwrap_or_else(|_| "/bin/bash".to_string());
    let file = if shell.contains("zsh") { ".zshrc" } else { ".bashrc" };
    home().join(file)
}
