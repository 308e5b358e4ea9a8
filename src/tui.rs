use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem, ListState, Paragraph},
};
use std::io::{self, IsTerminal, Write};

use crate::menu::{MenuChoice, MenuDriver, MenuEntry};

/// Prompt user for input
fn prompt_input(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Interpret a `(Y/n)` answer; empty means yes
fn parse_confirm(answer: &str) -> Option<bool> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "" | "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Selection state for one pass of the picker
pub struct Picker {
    pub labels: Vec<String>,
    pub selected: usize,
    pub outcome: Option<Option<usize>>,
}

impl Picker {
    pub fn new(entries: &[MenuEntry]) -> Self {
        Self {
            labels: entries.iter().map(|e| e.label.clone()).collect(),
            selected: 0,
            outcome: None,
        }
    }

    pub fn select_next(&mut self) {
        if !self.labels.is_empty() {
            self.selected = (self.selected + 1) % self.labels.len();
        }
    }

    pub fn select_previous(&mut self) {
        if !self.labels.is_empty() {
            self.selected = if self.selected == 0 {
                self.labels.len() - 1
            } else {
                self.selected - 1
            };
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.select_previous(),
            KeyCode::Down | KeyCode::Char('j') => self.select_next(),
            KeyCode::Enter => {
                if !self.labels.is_empty() {
                    self.outcome = Some(Some(self.selected));
                }
            }
            KeyCode::Esc | KeyCode::Char('q') => self.outcome = Some(None),
            _ => {}
        }
    }

    fn render(&self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Entries
                Constraint::Length(3), // Footer
            ])
            .split(f.area());

        Self::render_header(f, chunks[0]);
        self.render_list(f, chunks[1]);
        Self::render_footer(f, chunks[2]);
    }

    fn render_header(f: &mut Frame, area: Rect) {
        let header = Paragraph::new(Line::from(Span::styled(
            "Select configuration to switch to:",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(Color::Blue)),
        )
        .alignment(Alignment::Center);

        f.render_widget(header, area);
    }

    fn render_list(&self, f: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = self
            .labels
            .iter()
            .map(|label| {
                let style = if label.starts_with('🔄') || label.starts_with('📝') {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default().fg(Color::Gray)
                };
                ListItem::new(label.clone()).style(style)
            })
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .title(" Configurations ")
                    .border_style(Style::default().fg(Color::Blue)),
            )
            .highlight_style(
                Style::default()
                    .bg(Color::Rgb(50, 50, 100))
                    .add_modifier(Modifier::BOLD)
                    .fg(Color::White),
            )
            .highlight_symbol("❯ ");

        let mut list_state = ListState::default();
        list_state.select(Some(self.selected));

        f.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_footer(f: &mut Frame, area: Rect) {
        let key = Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD);
        let hint = Style::default().fg(Color::Gray);
        let help = Line::from(vec![
            Span::styled("↑/↓", key),
            Span::styled(": Navigate  ", hint),
            Span::styled("Enter", key),
            Span::styled(": Select  ", hint),
            Span::styled("Esc/q", key),
            Span::styled(": Quit", hint),
        ]);

        let footer = Paragraph::new(help)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(Color::Blue)),
            )
            .alignment(Alignment::Center);

        f.render_widget(footer, area);
    }
}

/// Full-screen session; the terminal is restored on drop
struct PickerScreen {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl PickerScreen {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }

    fn run(&mut self, picker: &mut Picker) -> Result<Option<usize>> {
        loop {
            self.terminal.draw(|f| picker.render(f))?;

            if event::poll(std::time::Duration::from_millis(100))?
                && let Event::Key(key) = event::read()?
            {
                picker.handle_key(key);
            }
            if let Some(outcome) = picker.outcome {
                return Ok(outcome);
            }
        }
    }
}

impl Drop for PickerScreen {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Terminal-backed answers for the interactive menu
pub struct TuiMenu;

impl TuiMenu {
    pub fn new() -> Result<Self> {
        if !io::stdin().is_terminal() || !io::stderr().is_terminal() {
            anyhow::bail!(
                "Interactive mode requires a terminal. Pass a configuration name or use --list."
            );
        }

        // Initialize color-eyre for better error reporting
        let _ = color_eyre::install();
        Ok(Self)
    }
}

impl MenuDriver for TuiMenu {
    fn confirm_probe(&mut self) -> Result<bool> {
        loop {
            let answer = prompt_input("? Test connectivity before selection? (Y/n) ")?;
            if let Some(yes) = parse_confirm(&answer) {
                return Ok(yes);
            }
        }
    }

    fn select(&mut self, entries: &[MenuEntry]) -> Result<MenuChoice> {
        let mut picker = Picker::new(entries);
        let picked = {
            let mut screen = PickerScreen::enter()?;
            screen.run(&mut picker)?
        };
        Ok(picked
            .and_then(|i| entries.get(i))
            .map(|e| e.choice.clone())
            .unwrap_or(MenuChoice::Quit))
    }
}
