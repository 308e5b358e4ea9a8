//! Console rendering for lists, connectivity reports and switch hints.

use crossterm::style::{StyledContent, Stylize};
use std::io::{self, Write};
use tracing::warn;

use crate::apply::mask_token;
use crate::config::{AUTH_TOKEN_VAR, BASE_URL_VAR};
use crate::error::ProbeError;
use crate::probe::{LatencyBand, ProbeResult, SweepObserver};
use crate::store::ProfileSet;

pub fn latency_text(ms: u64) -> StyledContent<String> {
    let text = format!("{ms}ms");
    match LatencyBand::from_ms(ms) {
        LatencyBand::Fast => text.green(),
        LatencyBand::Moderate => text.yellow(),
        LatencyBand::Slow => text.red(),
    }
}

pub fn write_banner(out: &mut impl Write) -> io::Result<()> {
    writeln!(
        out,
        "\n{}\n",
        "🔧 Claude Code Configuration Switcher".bold().cyan()
    )
}

pub fn write_profile_list(out: &mut impl Write, profiles: &ProfileSet) -> io::Result<()> {
    writeln!(out, "{}", "\n📁 Available Configurations:".cyan())?;
    for (name, profile) in profiles.iter() {
        writeln!(out, "  {}", name.green())?;
        writeln!(
            out,
            "{}",
            format!("    Description: {}", profile.description).dark_grey()
        )?;
        writeln!(out, "{}", format!("    URL: {}", profile.base_url).dark_grey())?;
        writeln!(out)?;
    }
    Ok(())
}

/// The two variables as the current process sees them
pub fn write_current(
    out: &mut impl Write,
    base_url: Option<&str>,
    token: Option<&str>,
) -> io::Result<()> {
    // an empty value counts as unset
    let base_url = base_url.filter(|v| !v.is_empty());
    let token = token.filter(|v| !v.is_empty());
    writeln!(out, "{}", "\n📋 Current Environment Variables:".cyan())?;
    writeln!(
        out,
        "{} {}",
        format!("{BASE_URL_VAR}:").white(),
        base_url.unwrap_or("Not set").green()
    )?;
    let token = token.map(mask_token).unwrap_or_else(|| "Not set".to_string());
    writeln!(out, "{} {}", format!("{AUTH_TOKEN_VAR}:").white(), token.green())
}

/// Prints `Testing <name>... ✓ 123ms` lines while a sweep runs.
pub struct ConsoleSweep<W: Write> {
    out: W,
}

impl<W: Write> ConsoleSweep<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> ConsoleSweep<W> {
    fn report(written: io::Result<()>) {
        if let Err(e) = written {
            warn!(error = %e, "failed to write sweep progress");
        }
    }
}

impl<W: Write> SweepObserver for ConsoleSweep<W> {
    fn started(&mut self, name: &str) {
        Self::report(
            write!(self.out, "{}", format!("Testing {name}... ").dark_grey())
                .and_then(|()| self.out.flush()),
        );
    }

    fn finished(&mut self, result: &ProbeResult) {
        Self::report(match result.error() {
            None => writeln!(
                self.out,
                "{} {}",
                "✓".green(),
                latency_text(result.elapsed_ms)
            ),
            Some(err) => writeln!(self.out, "{} {}", "✗".red(), err.to_string().red()),
        });
    }
}

/// Ranked report; `ranked` is expected to come out of [`crate::probe::rank`].
pub fn write_report(
    out: &mut impl Write,
    ranked: &[ProbeResult],
    profiles: &ProfileSet,
) -> io::Result<()> {
    writeln!(out, "{}", "📊 Connectivity Report:\n".cyan())?;
    for (index, result) in ranked.iter().enumerate() {
        let rank = if result.is_success() {
            format!("{}.", index + 1)
        } else {
            "✗".to_string()
        };
        let status = if result.is_success() {
            format!("{:<15}", "Online").green()
        } else {
            format!("{:<15}", "Offline").red()
        };
        let latency = if result.is_success() {
            latency_text(result.elapsed_ms)
        } else {
            "N/A".to_string().dark_grey()
        };

        writeln!(
            out,
            "  {:<3} {:<12} {} {}",
            rank, result.name, status, latency
        )?;
        let description = profiles
            .get(&result.name)
            .map(|p| p.description.as_str())
            .unwrap_or("");
        writeln!(out, "{}", format!("      {description}").dark_grey())?;

        if let Some(ProbeError::Transport(message)) = result.error() {
            writeln!(out, "{}", format!("      Error: {message}").dark_grey())?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Commands for using the values in the terminal that is already open
pub fn write_temp_commands(out: &mut impl Write, base_url: &str, token: &str) -> io::Result<()> {
    writeln!(out, "{}", "\n💡 To use immediately in current terminal:".cyan())?;
    if cfg!(windows) {
        writeln!(out, "{}", "Command Prompt (CMD):".white())?;
        writeln!(out, "{}", format!("set {BASE_URL_VAR}={base_url}").yellow())?;
        writeln!(out, "{}", format!("set {AUTH_TOKEN_VAR}={token}").yellow())?;

        writeln!(out, "{}", "\nPowerShell:".white())?;
        writeln!(out, "{}", format!("$env:{BASE_URL_VAR}=\"{base_url}\"").yellow())?;
        writeln!(out, "{}", format!("$env:{AUTH_TOKEN_VAR}=\"{token}\"").yellow())?;

        writeln!(out, "{}", "\nGit Bash / WSL:".white())?;
    } else {
        writeln!(out, "{}", "Bash/Zsh:".white())?;
    }
    writeln!(out, "{}", format!("export {BASE_URL_VAR}=\"{base_url}\"").yellow())?;
    writeln!(out, "{}", format!("export {AUTH_TOKEN_VAR}=\"{token}\"").yellow())?;
    if !cfg!(windows) {
        writeln!(out, "{}", "\nFish:".white())?;
        writeln!(out, "{}", format!("set -x {BASE_URL_VAR} \"{base_url}\"").yellow())?;
        writeln!(out, "{}", format!("set -x {AUTH_TOKEN_VAR} \"{token}\"").yellow())?;
    }
    Ok(())
}

/// Menu line for a profile, with its probe status when one is known
pub fn menu_label(name: &str, description: &str, result: Option<&ProbeResult>) -> String {
    match result {
        None => format!("{name} - {description}"),
        Some(r) => match r.error() {
            None => format!("🟢 {name} - {description} ({}ms)", r.elapsed_ms),
            Some(err) => format!("🔴 {name} - {description} ({err})"),
        },
    }
}
