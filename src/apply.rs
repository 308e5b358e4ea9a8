//! Making a selected profile take effect.

use tracing::{info, warn};

use crate::config::{AUTH_TOKEN_VAR, BASE_URL_VAR};
use crate::env::EnvironmentPort;
use crate::error::SwitchError;
use crate::settings::SettingsFile;
use crate::store::{Profile, ProfileSet};

/// Which variables a target could not write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub failed: Vec<String>,
}

impl ApplyReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, name: &str, ok: bool) {
        if !ok {
            self.failed.push(name.to_string());
        }
    }

    fn all_failed(names: &[&str]) -> Self {
        Self {
            failed: names.iter().map(|n| n.to_string()).collect(),
        }
    }
}

/// Where a profile gets written.
pub trait ApplyTarget {
    fn apply(&mut self, pairs: &[(&str, &str)]) -> ApplyReport;
    fn clear(&mut self, names: &[&str]) -> ApplyReport;
    /// Short human name for messages, e.g. `environment variables`
    fn describe(&self) -> String;

    fn reload_hint(&self) -> Option<String> {
        None
    }

    /// Whether `export`-style commands for the current terminal are worth printing
    fn wants_shell_commands(&self) -> bool {
        false
    }
}

/// Writes through an [`EnvironmentPort`].
pub struct EnvironmentTarget<'a> {
    port: &'a mut dyn EnvironmentPort,
}

impl<'a> EnvironmentTarget<'a> {
    pub fn new(port: &'a mut dyn EnvironmentPort) -> Self {
        Self { port }
    }
}

impl ApplyTarget for EnvironmentTarget<'_> {
    fn apply(&mut self, pairs: &[(&str, &str)]) -> ApplyReport {
        let mut report = ApplyReport::default();
        for (name, value) in pairs {
            report.record(name, self.port.set(name, value));
        }
        report
    }

    fn clear(&mut self, names: &[&str]) -> ApplyReport {
        let mut report = ApplyReport::default();
        for name in names {
            report.record(name, self.port.clear(name));
        }
        report
    }

    fn describe(&self) -> String {
        "environment variables".to_string()
    }

    fn reload_hint(&self) -> Option<String> {
        self.port.reload_hint()
    }

    fn wants_shell_commands(&self) -> bool {
        true
    }
}

/// Merges into the `env` block of the Claude settings file.
pub struct SettingsTarget {
    file: SettingsFile,
}

impl SettingsTarget {
    pub fn new(file: SettingsFile) -> Self {
        Self { file }
    }
}

impl ApplyTarget for SettingsTarget {
    fn apply(&mut self, pairs: &[(&str, &str)]) -> ApplyReport {
        match self.file.merge_env(pairs) {
            Ok(()) => ApplyReport::default(),
            Err(e) => {
                warn!(error = %e, "failed to update settings file");
                let names: Vec<&str> = pairs.iter().map(|(n, _)| *n).collect();
                ApplyReport::all_failed(&names)
            }
        }
    }

    fn clear(&mut self, names: &[&str]) -> ApplyReport {
        match self.file.remove_env(names) {
            Ok(()) => ApplyReport::default(),
            Err(e) => {
                warn!(error = %e, "failed to clear settings file");
                ApplyReport::all_failed(names)
            }
        }
    }

    fn describe(&self) -> String {
        format!("settings file {}", self.file.path().display())
    }
}

/// Look up `name` and write its URL and token to `target`.
///
/// The target is not touched when the profile does not exist.
pub fn apply_profile<'p>(
    profiles: &'p ProfileSet,
    name: &str,
    target: &mut dyn ApplyTarget,
) -> Result<(&'p Profile, ApplyReport), SwitchError> {
    let profile = profiles
        .get(name)
        .ok_or_else(|| SwitchError::ProfileNotFound {
            name: name.to_string(),
            available: profiles.names(),
        })?;

    let report = target.apply(&profile.env_pairs());
    if report.is_complete() {
        info!(profile = name, target = %target.describe(), "applied profile");
    } else {
        warn!(profile = name, failed = ?report.failed, "profile applied partially");
    }
    Ok((profile, report))
}

/// Remove both profile variables from `target`.
pub fn clear_profile_vars(target: &mut dyn ApplyTarget) -> ApplyReport {
    target.clear(&[BASE_URL_VAR, AUTH_TOKEN_VAR])
}

/// First 20 characters of a token followed by `...`
pub fn mask_token(token: &str) -> String {
    let prefix: String = token.chars().take(20).collect();
    format!("{prefix}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MemoryEnvironment;
    use crate::store::default_profiles;
    use tempfile::TempDir;

    #[test]
    fn apply_sets_both_variables() {
        let profiles = default_profiles();
        let mut env = MemoryEnvironment::new();

        let (profile, report) =
            apply_profile(&profiles, "official", &mut EnvironmentTarget::new(&mut env)).unwrap();

        assert!(report.is_complete());
        assert_eq!(profile.description, "Official Anthropic API");
        assert_eq!(
            env.get(BASE_URL_VAR).as_deref(),
            Some("https://api.anthropic.com")
        );
        assert_eq!(
            env.get(AUTH_TOKEN_VAR).as_deref(),
            Some("YOUR_OFFICIAL_TOKEN_HERE")
        );
    }

    #[test]
    fn unknown_profile_leaves_environment_untouched() {
        let profiles = default_profiles();
        let mut env = MemoryEnvironment::new();
        env.set(BASE_URL_VAR, "https://keep.example");

        let err = apply_profile(&profiles, "missing", &mut EnvironmentTarget::new(&mut env))
            .unwrap_err();

        let SwitchError::ProfileNotFound { name, available } = err;
        assert_eq!(name, "missing");
        assert_eq!(available.len(), 5);
        assert_eq!(env.vars().len(), 1);
        assert_eq!(
            env.get(BASE_URL_VAR).as_deref(),
            Some("https://keep.example")
        );
    }

    #[test]
    fn unknown_profile_leaves_settings_untouched() {
        let dir = TempDir::new().unwrap();
        let file = SettingsFile::new(dir.path().join("settings.json"));
        let mut target = SettingsTarget::new(file.clone());

        assert!(apply_profile(&default_profiles(), "nope", &mut target).is_err());
        assert!(!file.path().exists());
    }

    #[test]
    fn partial_failure_is_reported() {
        let profiles = default_profiles();
        let mut env = MemoryEnvironment::new().fail_on(AUTH_TOKEN_VAR);

        let (_, report) =
            apply_profile(&profiles, "local", &mut EnvironmentTarget::new(&mut env)).unwrap();

        assert!(!report.is_complete());
        assert_eq!(report.failed, vec![AUTH_TOKEN_VAR.to_string()]);
        assert_eq!(
            env.get(BASE_URL_VAR).as_deref(),
            Some("http://localhost:8080")
        );
    }

    #[test]
    fn settings_target_writes_env_block() {
        let dir = TempDir::new().unwrap();
        let file = SettingsFile::new(dir.path().join("settings.json"));
        let mut target = SettingsTarget::new(file.clone());

        let (_, report) = apply_profile(&default_profiles(), "openai", &mut target).unwrap();

        assert!(report.is_complete());
        assert_eq!(
            file.env_value(BASE_URL_VAR).unwrap().as_deref(),
            Some("https://api.openai.com/v1")
        );
        assert_eq!(
            file.env_value("DISABLE_TELEMETRY").unwrap().as_deref(),
            Some("1")
        );
    }

    #[test]
    fn settings_write_failure_is_a_warning_not_an_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let mut target = SettingsTarget::new(SettingsFile::new(blocker.join("settings.json")));

        let (_, report) = apply_profile(&default_profiles(), "azure", &mut target).unwrap();

        assert_eq!(report.failed, vec![BASE_URL_VAR, AUTH_TOKEN_VAR]);
    }

    #[test]
    fn clear_removes_both_variables() {
        let mut env = MemoryEnvironment::new();
        env.set(BASE_URL_VAR, "u");
        env.set(AUTH_TOKEN_VAR, "t");

        let report = clear_profile_vars(&mut EnvironmentTarget::new(&mut env));

        assert!(report.is_complete());
        assert!(env.vars().is_empty());
    }

    #[test]
    fn mask_token_keeps_twenty_chars() {
        assert_eq!(
            mask_token("sk-ant-REDACTED"),
            "sk-ant-0123456789abc..."
        );
        assert_eq!(mask_token("short"), "short...");
        assert_eq!(mask_token("ключ"), "ключ...");
    }
}
