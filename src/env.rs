//! Persistent environment variables, behind a small capability trait.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Somewhere environment variables can be set and cleared.
///
/// `set` and `clear` report success as a plain flag; the caller decides how loud to be
/// about a partial failure.
pub trait EnvironmentPort {
    fn set(&mut self, name: &str, value: &str) -> bool;
    fn clear(&mut self, name: &str) -> bool;
    fn get(&self, name: &str) -> Option<String>;

    /// Hint printed after a successful change, if the shell needs reloading
    fn reload_hint(&self) -> Option<String> {
        None
    }
}

/// In-process map, used by tests and dry runs.
#[derive(Debug, Default, Clone)]
pub struct MemoryEnvironment {
    vars: HashMap<String, String>,
    failing: Vec<String>,
}

impl MemoryEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `set`/`clear` of `name` report failure
    pub fn fail_on(mut self, name: &str) -> Self {
        self.failing.push(name.to_string());
        self
    }

    pub fn vars(&self) -> &HashMap<String, String> {
        &self.vars
    }
}

impl EnvironmentPort for MemoryEnvironment {
    fn set(&mut self, name: &str, value: &str) -> bool {
        if self.failing.iter().any(|n| n == name) {
            return false;
        }
        self.vars.insert(name.to_string(), value.to_string());
        true
    }

    fn clear(&mut self, name: &str) -> bool {
        if self.failing.iter().any(|n| n == name) {
            return false;
        }
        self.vars.remove(name);
        true
    }

    fn get(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

/// Unix: keeps one `export NAME="value"` line per variable in a shell rc file.
#[derive(Debug, Clone)]
pub struct RcFileEnvironment {
    rc_file: PathBuf,
}

impl RcFileEnvironment {
    pub fn new(rc_file: impl Into<PathBuf>) -> Self {
        Self {
            rc_file: rc_file.into(),
        }
    }

    fn read_lines(&self) -> std::io::Result<Vec<String>> {
        match fs::read_to_string(&self.rc_file) {
            Ok(content) => Ok(content.lines().map(str::to_string).collect()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// Drops every `export name=` line, then appends `replacement`.
    /// A removal that matches nothing leaves the file untouched.
    fn rewrite(&self, name: &str, replacement: Option<String>) -> std::io::Result<()> {
        let existing = self.read_lines()?;
        let before = existing.len();
        let mut lines: Vec<String> = existing
            .into_iter()
            .filter(|line| !is_export_of(line, name))
            .collect();
        if replacement.is_none() && lines.len() == before {
            return Ok(());
        }
        lines.extend(replacement);

        let mut content = lines.join("\n");
        content.push('\n');
        fs::write(&self.rc_file, content)
    }
}

fn is_export_of(line: &str, name: &str) -> bool {
    line.trim_start()
        .strip_prefix("export ")
        .and_then(|rest| rest.trim_start().strip_prefix(name))
        .is_some_and(|rest| rest.starts_with('='))
}

fn export_line(name: &str, value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('$', "\\$")
        .replace('`', "\\`");
    format!("export {name}=\"{escaped}\"")
}

impl EnvironmentPort for RcFileEnvironment {
    fn set(&mut self, name: &str, value: &str) -> bool {
        match self.rewrite(name, Some(export_line(name, value))) {
            Ok(()) => {
                debug!(rc_file = %self.rc_file.display(), name, "wrote export line");
                true
            }
            Err(e) => {
                warn!(rc_file = %self.rc_file.display(), name, error = %e, "failed to set env var");
                false
            }
        }
    }

    fn clear(&mut self, name: &str) -> bool {
        match self.rewrite(name, None) {
            Ok(()) => {
                debug!(rc_file = %self.rc_file.display(), name, "removed export line");
                true
            }
            Err(e) => {
                warn!(rc_file = %self.rc_file.display(), name, error = %e, "failed to clear env var");
                false
            }
        }
    }

    fn get(&self, name: &str) -> Option<String> {
        env::var(name).ok()
    }

    fn reload_hint(&self) -> Option<String> {
        let rc = self.rc_file.display();
        Some(format!(
            "Updated {rc}, please reload terminal or run: source {rc}"
        ))
    }
}

/// Windows: user-level variables through `setx` and the registry.
#[cfg(windows)]
#[derive(Debug, Clone, Default)]
pub struct WindowsEnvironment;

#[cfg(windows)]
impl EnvironmentPort for WindowsEnvironment {
    fn set(&mut self, name: &str, value: &str) -> bool {
        run_quiet(std::process::Command::new("setx").arg(name).arg(value))
    }

    fn clear(&mut self, name: &str) -> bool {
        run_quiet(
            std::process::Command::new("reg")
                .args(["delete", "HKCU\\Environment", "/F", "/V"])
                .arg(name),
        )
    }

    fn get(&self, name: &str) -> Option<String> {
        env::var(name).ok()
    }

    fn reload_hint(&self) -> Option<String> {
        Some("Open a new terminal for the change to take effect".to_string())
    }
}

#[cfg(windows)]
fn run_quiet(command: &mut std::process::Command) -> bool {
    match command.output() {
        Ok(output) if output.status.success() => true,
        Ok(output) => {
            warn!(
                status = ?output.status.code(),
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "environment command failed"
            );
            false
        }
        Err(e) => {
            warn!(error = %e, "failed to run environment command");
            false
        }
    }
}

/// The environment implementation for the current OS
pub fn system_environment() -> Box<dyn EnvironmentPort> {
    #[cfg(windows)]
    {
        Box::new(WindowsEnvironment)
    }
    #[cfg(not(windows))]
    {
        Box::new(RcFileEnvironment::new(crate::config::shell_rc_path()))
    }
}
