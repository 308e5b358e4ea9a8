//! The Claude settings file and its `env` block.

use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::claude_settings_path;
use crate::error::SettingsError;

/// Flags added to `env` on apply when the user has not set them.
pub const PRIVACY_FLAGS: [(&str, &str); 2] = [
    ("DISABLE_TELEMETRY", "1"),
    ("CLAUDE_CODE_DISABLE_NONESSENTIAL_TRAFFIC", "1"),
];

#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn open_default() -> Self {
        Self::new(claude_settings_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current settings object; a missing file reads as `{}`
    pub fn read(&self) -> Result<Map<String, Value>, SettingsError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(source) => {
                return Err(SettingsError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        let value: Value =
            serde_json::from_str(&content).map_err(|source| SettingsError::Parse {
                path: self.path.clone(),
                source,
            })?;
        match value {
            Value::Object(obj) => Ok(obj),
            _ => Err(SettingsError::NotAnObject {
                path: self.path.clone(),
            }),
        }
    }

    pub fn write(&self, settings: &Map<String, Value>) -> Result<(), SettingsError> {
        let write_err = |source| SettingsError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let content = serde_json::to_string_pretty(settings)
            .map_err(|e| write_err(std::io::Error::other(e)))?;
        fs::write(&self.path, content).map_err(write_err)?;
        debug!(path = %self.path.display(), "wrote settings file");
        Ok(())
    }

    /// Merge `pairs` into the `env` block, then add any missing privacy flags.
    pub fn merge_env(&self, pairs: &[(&str, &str)]) -> Result<(), SettingsError> {
        let mut settings = self.read()?;
        let mut env = match settings.get("env") {
            Some(Value::Object(env)) => env.clone(),
            _ => Map::new(),
        };
        for (name, value) in pairs {
            env.insert((*name).to_string(), Value::String((*value).to_string()));
        }
        for (name, value) in PRIVACY_FLAGS {
            env.entry(name)
                .or_insert_with(|| Value::String(value.to_string()));
        }
        settings.insert("env".to_string(), Value::Object(env));
        self.write(&settings)
    }

    /// Drop `names` from the `env` block; the file is left alone if nothing changes.
    pub fn remove_env(&self, names: &[&str]) -> Result<(), SettingsError> {
        let mut settings = self.read()?;
        let Some(Value::Object(env)) = settings.get_mut("env") else {
            return Ok(());
        };
        let before = env.len();
        for name in names {
            env.shift_remove(*name);
        }
        if env.len() == before {
            return Ok(());
        }
        self.write(&settings)
    }

    pub fn env_value(&self, name: &str) -> Result<Option<String>, SettingsError> {
        let settings = self.read()?;
        Ok(settings
            .get("env")
            .and_then(|env| env.get(name))
            .and_then(Value::as_str)
            .map(str::to_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn merge_creates_file_and_adds_privacy_flags() {
        let dir = TempDir::new().unwrap();
        let settings = SettingsFile::new(dir.path().join(".claude").join("settings.json"));

        settings
            .merge_env(&[("ANTHROPIC_BASE_URL", "https://a.example")])
            .unwrap();

        let written: Value =
            serde_json::from_str(&fs::read_to_string(settings.path()).unwrap()).unwrap();
        assert_eq!(
            written,
            json!({
                "env": {
                    "ANTHROPIC_BASE_URL": "https://a.example",
                    "DISABLE_TELEMETRY": "1",
                    "CLAUDE_CODE_DISABLE_NONESSENTIAL_TRAFFIC": "1"
                }
            })
        );
    }

    #[test]
    fn merge_keeps_other_keys_and_existing_flags() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{"model": "opus", "env": {"DISABLE_TELEMETRY": "0", "ANTHROPIC_BASE_URL": "https://old.example"}}"#,
        )
        .unwrap();
        let settings = SettingsFile::new(&path);

        settings
            .merge_env(&[("ANTHROPIC_BASE_URL", "https://new.example")])
            .unwrap();

        let obj = settings.read().unwrap();
        assert_eq!(obj["model"], "opus");
        assert_eq!(obj["env"]["DISABLE_TELEMETRY"], "0");
        assert_eq!(obj["env"]["ANTHROPIC_BASE_URL"], "https://new.example");
        assert_eq!(obj["env"]["CLAUDE_CODE_DISABLE_NONESSENTIAL_TRAFFIC"], "1");
    }

    #[test]
    fn remove_env_drops_only_named_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{"env": {"ANTHROPIC_BASE_URL": "u", "ANTHROPIC_AUTH_TOKEN": "t", "DISABLE_TELEMETRY": "1"}}"#,
        )
        .unwrap();
        let settings = SettingsFile::new(&path);

        settings
            .remove_env(&["ANTHROPIC_BASE_URL", "ANTHROPIC_AUTH_TOKEN"])
            .unwrap();

        assert_eq!(
            Value::Object(settings.read().unwrap()),
            json!({"env": {"DISABLE_TELEMETRY": "1"}})
        );
    }

    #[test]
    fn remove_env_without_file_does_not_create_one() {
        let dir = TempDir::new().unwrap();
        let settings = SettingsFile::new(dir.path().join("settings.json"));

        settings.remove_env(&["ANTHROPIC_BASE_URL"]).unwrap();
        assert!(!settings.path().exists());
    }

    #[test]
    fn non_object_settings_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "[1, 2]").unwrap();

        assert!(matches!(
            SettingsFile::new(&path).merge_env(&[("A", "b")]),
            Err(SettingsError::NotAnObject { .. })
        ));
    }

    #[test]
    fn env_value_reads_strings() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"env": {"ANTHROPIC_BASE_URL": "https://a.example"}}"#).unwrap();
        let settings = SettingsFile::new(&path);

        assert_eq!(
            settings.env_value("ANTHROPIC_BASE_URL").unwrap().as_deref(),
            Some("https://a.example")
        );
        assert_eq!(settings.env_value("ANTHROPIC_AUTH_TOKEN").unwrap(), None);
    }
}
