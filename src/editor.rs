use anyhow::{Context, Result};
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Opens a file for the user and returns once they are done with it.
pub trait Editor {
    fn edit(&self, path: &Path) -> Result<()>;
}

/// `$EDITOR`, then `$VISUAL`, then the platform's basic editor.
#[derive(Debug, Clone)]
pub struct SystemEditor {
    program: String,
}

impl SystemEditor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn from_env() -> Self {
        let program = std::env::var("EDITOR")
            .or_else(|_| std::env::var("VISUAL"))
            .ok()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| {
                if cfg!(windows) {
                    "notepad".to_string()
                } else {
                    "nano".to_string()
                }
            });
        Self::new(program)
    }
}

impl Editor for SystemEditor {
    fn edit(&self, path: &Path) -> Result<()> {
        // EDITOR may carry arguments, e.g. `code --wait`
        let mut parts = self.program.split_whitespace();
        let program = parts.next().unwrap_or("nano");
        debug!(editor = %self.program, path = %path.display(), "launching editor");

        let status = Command::new(program)
            .args(parts)
            .arg(path)
            .status()
            .with_context(|| format!("Failed to launch editor '{}'", self.program))?;

        if !status.success() {
            anyhow::bail!("Editor exited with error code: {:?}", status.code());
        }
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn editor_exit_status_is_checked() {
        let file = NamedTempFile::new().unwrap();
        assert!(SystemEditor::new("true").edit(file.path()).is_ok());
        assert!(SystemEditor::new("false").edit(file.path()).is_err());
    }

    #[test]
    fn missing_editor_is_an_error() {
        let file = NamedTempFile::new().unwrap();
        let err = SystemEditor::new("definitely-not-an-editor-xyz")
            .edit(file.path())
            .unwrap_err();
        assert!(err.to_string().contains("Failed to launch editor"));
    }

    #[test]
    fn editor_arguments_are_split() {
        let file = NamedTempFile::new().unwrap();
        assert!(SystemEditor::new("test -f").edit(file.path()).is_ok());
    }
}
