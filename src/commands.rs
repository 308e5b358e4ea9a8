use anyhow::{Context, Result};
use crossterm::style::Stylize;
use std::io::{self, Write};
use std::time::Duration;
use tracing::debug;

use crate::apply::{
    ApplyReport, ApplyTarget, EnvironmentTarget, SettingsTarget, apply_profile,
    clear_profile_vars, mask_token,
};
use crate::cli::{Cli, Commands};
use crate::config::{AUTH_TOKEN_VAR, BASE_URL_VAR, DEFAULT_PROBE_TIMEOUT, SWEEP_PROBE_TIMEOUT};
use crate::editor::{Editor, SystemEditor};
use crate::env::{EnvironmentPort, system_environment};
use crate::error::SwitchError;
use crate::menu::{InteractiveMenu, MenuContext};
use crate::output::{
    ConsoleSweep, write_banner, write_current, write_profile_list, write_report,
    write_temp_commands,
};
use crate::probe::{HttpProber, ProbeResult, Prober, probe_all, rank};
use crate::settings::SettingsFile;
use crate::store::{ConfigStore, InitOutcome, ProfileSet};
use crate::tui::TuiMenu;

/// Apply `name` to `target` and tell the user how it went.
///
/// Returns `None` when the profile does not exist; nothing is written in that case.
pub fn switch_to(
    out: &mut impl Write,
    profiles: &ProfileSet,
    name: &str,
    target: &mut dyn ApplyTarget,
) -> io::Result<Option<ApplyReport>> {
    let (profile, report) = match apply_profile(profiles, name, target) {
        Ok(applied) => applied,
        Err(SwitchError::ProfileNotFound { name, available }) => {
            writeln!(out, "{} {}", "✗ Configuration not found:".red(), name)?;
            writeln!(out, "{} {}", "Available configs:".yellow(), available.join(", "))?;
            return Ok(None);
        }
    };

    writeln!(
        out,
        "{}",
        format!("\n🔄 Switching to config: {name}").blue()
    )?;
    writeln!(
        out,
        "{}",
        format!("Description: {}", profile.description).dark_grey()
    )?;

    if !report.is_complete() {
        writeln!(out, "{}", "✗ Configuration switch partially failed".red())?;
        writeln!(
            out,
            "{}",
            format!("Could not update: {}", report.failed.join(", ")).dark_grey()
        )?;
        return Ok(Some(report));
    }

    writeln!(out, "{}", "✓ Configuration switched successfully!".green())?;
    writeln!(
        out,
        "{}",
        format!("{BASE_URL_VAR}: {}", profile.base_url).dark_grey()
    )?;
    writeln!(
        out,
        "{}",
        format!("TOKEN: {}", mask_token(&profile.auth_token)).dark_grey()
    )?;
    if let Some(hint) = target.reload_hint() {
        writeln!(out, "{}", hint.yellow())?;
    }
    if target.wants_shell_commands() {
        write_temp_commands(out, &profile.base_url, &profile.auth_token)?;
    }
    Ok(Some(report))
}

/// Remove both variables from `target`, reporting the result.
pub fn clear_vars(out: &mut impl Write, target: &mut dyn ApplyTarget) -> io::Result<ApplyReport> {
    writeln!(
        out,
        "{}",
        format!("\n🧹 Clearing {}", target.describe()).blue()
    )?;
    let report = clear_profile_vars(target);
    if report.is_complete() {
        writeln!(
            out,
            "{} {BASE_URL_VAR}, {AUTH_TOKEN_VAR}",
            "✓ Cleared".green()
        )?;
        if let Some(hint) = target.reload_hint() {
            writeln!(out, "{}", hint.yellow())?;
        }
    } else {
        writeln!(
            out,
            "{} {}",
            "⚠ Could not clear:".yellow(),
            report.failed.join(", ")
        )?;
    }
    Ok(report)
}

/// Probe `profiles` one by one and print the ranked report.
pub fn run_sweep(
    out: &mut impl Write,
    prober: &dyn Prober,
    profiles: &ProfileSet,
    timeout: Duration,
) -> io::Result<Vec<ProbeResult>> {
    writeln!(out, "{}", "\n🌐 Testing API Connectivity...\n".cyan())?;
    let results = {
        let mut progress = ConsoleSweep::new(&mut *out);
        probe_all(prober, profiles, timeout, &mut progress)
    };
    writeln!(out)?;
    let ranked = rank(results);
    write_report(out, &ranked, profiles)?;
    Ok(ranked)
}

/// Collaborators chosen for this run
struct Runtime {
    store: ConfigStore,
    env: Box<dyn EnvironmentPort>,
    settings: SettingsFile,
    prober: HttpProber,
    editor: SystemEditor,
    use_settings: bool,
}

impl Runtime {
    fn with_target<T>(&mut self, f: impl FnOnce(&mut dyn ApplyTarget) -> T) -> T {
        if self.use_settings {
            f(&mut SettingsTarget::new(self.settings.clone()))
        } else {
            f(&mut EnvironmentTarget::new(self.env.as_mut()))
        }
    }
}

/// Entry point behind `main`.
pub fn run(cli: &Cli) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_banner(&mut out)?;

    let mut rt = Runtime {
        store: ConfigStore::open_default(),
        env: system_environment(),
        settings: SettingsFile::open_default(),
        prober: HttpProber::new(),
        editor: SystemEditor::from_env(),
        use_settings: cli.settings,
    };

    if rt.store.initialize()? == InitOutcome::Created {
        writeln!(
            out,
            "{} {}",
            "✓ Config file created:".green(),
            rt.store.path().display()
        )?;
        writeln!(
            out,
            "{}",
            "⚠ Please edit the config file to add your actual tokens".yellow()
        )?;
    }

    if matches!(cli.command, Some(Commands::Clear)) || cli.clear_env {
        rt.with_target(|target| clear_vars(&mut out, target))?;
    } else if cli.list {
        let profiles = rt.store.load()?;
        write_profile_list(&mut out, &profiles)?;
    } else if cli.current {
        show_current(&mut out, &rt)?;
    } else if cli.interactive {
        interactive(&mut out, &mut rt, cli)?;
    } else if cli.edit {
        edit_store(&mut out, &rt)?;
    } else if cli.test {
        test_connectivity(&mut out, &rt, cli)?;
    } else if let Some(name) = &cli.config {
        let profiles = rt.store.load()?;
        rt.with_target(|target| switch_to(&mut out, &profiles, name, target))?;
    } else {
        interactive(&mut out, &mut rt, cli)?;
    }
    Ok(())
}

/// `--timeout` if given; otherwise a single named profile gets the longer ad-hoc timeout.
fn probe_timeout(cli: &Cli, single: bool) -> Duration {
    match cli.timeout {
        Some(ms) => Duration::from_millis(ms),
        None if single => DEFAULT_PROBE_TIMEOUT,
        None => SWEEP_PROBE_TIMEOUT,
    }
}

fn show_current(out: &mut impl Write, rt: &Runtime) -> Result<()> {
    if rt.use_settings {
        let base_url = rt.settings.env_value(BASE_URL_VAR)?;
        let token = rt.settings.env_value(AUTH_TOKEN_VAR)?;
        writeln!(
            out,
            "{}",
            format!("Settings file: {}", rt.settings.path().display()).dark_grey()
        )?;
        write_current(out, base_url.as_deref(), token.as_deref())?;
    } else {
        let base_url = rt.env.get(BASE_URL_VAR);
        let token = rt.env.get(AUTH_TOKEN_VAR);
        write_current(out, base_url.as_deref(), token.as_deref())?;
    }
    Ok(())
}

fn test_connectivity(out: &mut impl Write, rt: &Runtime, cli: &Cli) -> Result<()> {
    let mut profiles = rt.store.load()?;
    let timeout = match &cli.config {
        Some(name) => {
            let Some(profile) = profiles.get(name).cloned() else {
                writeln!(out, "{} {}", "✗ Configuration not found:".red(), name)?;
                writeln!(
                    out,
                    "{} {}",
                    "Available configs:".yellow(),
                    profiles.names().join(", ")
                )?;
                return Ok(());
            };
            profiles = ProfileSet::new();
            profiles.insert(name, profile);
            probe_timeout(cli, true)
        }
        None => probe_timeout(cli, false),
    };
    debug!(?timeout, count = profiles.len(), "starting connectivity test");
    run_sweep(out, &rt.prober, &profiles, timeout)?;
    Ok(())
}

fn edit_store(out: &mut impl Write, rt: &Runtime) -> Result<()> {
    let path = rt.store.path();
    writeln!(
        out,
        "{}",
        format!("📝 Opening config file: {}", path.display()).blue()
    )?;
    rt.editor.edit(path)?;
    writeln!(out, "{}", "✓ Config file editing completed".green())?;

    let profiles = rt
        .store
        .load()
        .context("config file is no longer valid after editing")?;
    writeln!(
        out,
        "{}",
        format!("{} configuration(s) loaded", profiles.len()).dark_grey()
    )?;
    Ok(())
}

fn interactive(out: &mut impl Write, rt: &mut Runtime, cli: &Cli) -> Result<()> {
    let sweep_timeout = probe_timeout(cli, false);
    let mut driver = TuiMenu::new()?;
    let store = rt.store.clone();
    let prober = rt.prober.clone();
    let editor = rt.editor.clone();

    rt.with_target(|target| {
        let ctx = MenuContext {
            store: &store,
            prober: &prober,
            editor: &editor,
            target,
            sweep_timeout,
        };
        InteractiveMenu::new(ctx, out, cli.skip_probe()).run(&mut driver)
    })?;
    Ok(())
}
