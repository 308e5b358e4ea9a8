//! Interactive selection as an explicit loop over a few states.

use anyhow::Result;
use crossterm::style::Stylize;
use std::io::Write;
use std::time::Duration;
use tracing::debug;

use crate::apply::ApplyTarget;
use crate::commands::{run_sweep, switch_to};
use crate::editor::Editor;
use crate::output::menu_label;
use crate::probe::{ProbeResult, Prober};
use crate::store::{ConfigStore, ProfileSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuState {
    /// Optionally sweep, then show the menu
    Listing { offer_probe: bool },
    AwaitingSelection,
    Editing,
    Applying(String),
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuChoice {
    Profile(String),
    TestConnectivity,
    EditConfig,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: String,
    pub choice: MenuChoice,
}

/// Supplies the user's answers.
pub trait MenuDriver {
    /// "Test connectivity before selection?"
    fn confirm_probe(&mut self) -> Result<bool>;
    fn select(&mut self, entries: &[MenuEntry]) -> Result<MenuChoice>;
}

/// Everything the menu acts on besides the user.
pub struct MenuContext<'a> {
    pub store: &'a ConfigStore,
    pub prober: &'a dyn Prober,
    pub editor: &'a dyn Editor,
    pub target: &'a mut dyn ApplyTarget,
    pub sweep_timeout: Duration,
}

pub struct InteractiveMenu<'a, W: Write> {
    ctx: MenuContext<'a>,
    out: W,
    skip_probe: bool,
    results: Option<Vec<ProbeResult>>,
    history: Vec<MenuState>,
}

impl<'a, W: Write> InteractiveMenu<'a, W> {
    pub fn new(ctx: MenuContext<'a>, out: W, skip_probe: bool) -> Self {
        Self {
            ctx,
            out,
            skip_probe,
            results: None,
            history: Vec::new(),
        }
    }

    /// Every state entered so far, in order
    pub fn history(&self) -> &[MenuState] {
        &self.history
    }

    /// Drive the menu until a profile is applied or the user quits.
    ///
    /// Returns the name of the applied profile, if any.
    pub fn run(&mut self, driver: &mut dyn MenuDriver) -> Result<Option<String>> {
        let mut state = MenuState::Listing {
            offer_probe: !self.skip_probe,
        };
        let mut applied = None;

        loop {
            debug!(?state, "menu state");
            self.history.push(state.clone());
            state = match state {
                MenuState::Listing { offer_probe } => {
                    if offer_probe && driver.confirm_probe()? {
                        self.sweep()?;
                    }
                    MenuState::AwaitingSelection
                }
                MenuState::AwaitingSelection => {
                    let profiles = self.ctx.store.load()?;
                    let entries = self.entries(&profiles);
                    match driver.select(&entries)? {
                        MenuChoice::Profile(name) => MenuState::Applying(name),
                        MenuChoice::TestConnectivity => MenuState::Listing { offer_probe: true },
                        MenuChoice::EditConfig => MenuState::Editing,
                        MenuChoice::Quit => MenuState::Done,
                    }
                }
                MenuState::Editing => {
                    self.edit()?;
                    MenuState::Listing {
                        offer_probe: !self.skip_probe,
                    }
                }
                MenuState::Applying(name) => {
                    let profiles = self.ctx.store.load()?;
                    if switch_to(&mut self.out, &profiles, &name, &mut *self.ctx.target)?
                        .is_some()
                    {
                        applied = Some(name);
                    }
                    MenuState::Done
                }
                MenuState::Done => break,
            };
        }

        Ok(applied)
    }

    fn sweep(&mut self) -> Result<()> {
        let profiles = self.ctx.store.load()?;
        let ranked = run_sweep(
            &mut self.out,
            self.ctx.prober,
            &profiles,
            self.ctx.sweep_timeout,
        )?;
        self.results = Some(ranked);
        Ok(())
    }

    fn edit(&mut self) -> Result<()> {
        let path = self.ctx.store.path();
        writeln!(
            self.out,
            "{}",
            format!("📝 Opening config file: {}", path.display()).blue()
        )?;
        match self.ctx.editor.edit(path) {
            Ok(()) => writeln!(self.out, "{}", "✓ Config file editing completed".green())?,
            Err(e) => writeln!(self.out, "{} {e:#}", "✗".red())?,
        }
        // the file may now hold different profiles
        self.results = None;
        Ok(())
    }

    fn entries(&self, profiles: &ProfileSet) -> Vec<MenuEntry> {
        let mut entries = Vec::with_capacity(profiles.len() + 2);

        if let Some(results) = &self.results {
            for result in results {
                if let Some(profile) = profiles.get(&result.name) {
                    entries.push(MenuEntry {
                        label: menu_label(&result.name, &profile.description, Some(result)),
                        choice: MenuChoice::Profile(result.name.clone()),
                    });
                }
            }
        }
        for (name, profile) in profiles.iter() {
            let probed = self
                .results
                .as_ref()
                .is_some_and(|results| results.iter().any(|r| r.name == name));
            if !probed {
                entries.push(MenuEntry {
                    label: menu_label(name, &profile.description, None),
                    choice: MenuChoice::Profile(name.to_string()),
                });
            }
        }

        entries.push(MenuEntry {
            label: "🔄 Test connectivity".to_string(),
            choice: MenuChoice::TestConnectivity,
        });
        entries.push(MenuEntry {
            label: "📝 Edit configuration file".to_string(),
            choice: MenuChoice::EditConfig,
        });
        entries
    }
}
