use chrono::{DateTime, Utc};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{GMusic, CREDENTIALS_KEY};
use crate::boot::{App, UiLauncher};
use crate::lastfm;
use crate::storage::{StorageError, Store};

/// Store key holding the time of the previous UI start
pub const LAST_STARTED_KEY: &str = "ui.last_started";

#[derive(Debug, thiserror::Error)]
pub enum UiError {
    #[error("terminal error: {0}")]
    Terminal(#[from] io::Error),
    #[error("{0}")]
    Storage(#[from] StorageError),
}

/// What the dashboard shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dashboard {
    pub account: String,
    pub device_id: String,
    pub credentials_obtained: DateTime<Utc>,
    pub scrobbling_as: Option<String>,
    pub previous_start: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    ForgetCredentials,
}

/// Terminal-independent UI state
#[derive(Debug, Clone)]
pub struct AppState {
    dashboard: Dashboard,
    status: String,
    forget_requested: bool,
}

impl AppState {
    pub fn new(dashboard: Dashboard) -> Self {
        Self {
            dashboard,
            status: "Press q to quit, f to forget saved credentials".to_string(),
            forget_requested: false,
        }
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    /// `f` asks for confirmation, a second `f` forgets the credentials
    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> Action {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Action::Quit,
            KeyCode::Char('f') if self.forget_requested => {
                self.forget_requested = false;
                Action::ForgetCredentials
            }
            KeyCode::Char('f') => {
                self.forget_requested = true;
                self.status = "Press f again to forget saved credentials".to_string();
                Action::None
            }
            _ => {
                if self.forget_requested {
                    self.forget_requested = false;
                    self.status = "Cancelled".to_string();
                }
                Action::None
            }
        }
    }
}

/// Human readable distance between two instants
pub fn describe_age(since: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(since);
    if elapsed.num_minutes() < 1 {
        "just now".to_string()
    } else if elapsed.num_hours() < 1 {
        format!("{} minutes ago", elapsed.num_minutes())
    } else if elapsed.num_days() < 1 {
        format!("{} hours ago", elapsed.num_hours())
    } else {
        format!("{} days ago", elapsed.num_days())
    }
}

/// Starts the dashboard in the alternate screen
#[derive(Debug, Clone, Default)]
pub struct TuiLauncher;

impl<H: Store> UiLauncher<GMusic, lastfm::Client, H> for TuiLauncher {
    type App = TuiApp<H>;

    fn launch(
        &self,
        streaming: GMusic,
        scrobbler: lastfm::Client,
        store: Arc<H>,
    ) -> Result<TuiApp<H>, UiError> {
        let (terminal, previous_start) =
            record_start(&*store, setup_terminal, |terminal| {
                if let Err(e) = restore_terminal(terminal) {
                    log::warn!("Failed to restore terminal: {e}");
                }
            })?;

        let dashboard = Dashboard {
            account: streaming.account().to_string(),
            device_id: streaming.device_id().to_string(),
            credentials_obtained: streaming.credentials().obtained_at,
            scrobbling_as: scrobbler.username().map(str::to_string),
            previous_start,
        };

        Ok(TuiApp {
            terminal,
            state: AppState::new(dashboard),
            store,
            _streaming: streaming,
            _scrobbler: scrobbler,
        })
    }
}

/// Set up the terminal, then record this start. A failed setup leaves the
/// store untouched; a failed write tears the terminal down again.
fn record_start<H: Store, T>(
    store: &H,
    setup: impl FnOnce() -> io::Result<T>,
    teardown: impl FnOnce(&mut T),
) -> Result<(T, Option<DateTime<Utc>>), UiError> {
    let previous_start = store.get::<DateTime<Utc>>(LAST_STARTED_KEY)?;
    let mut terminal = setup()?;
    if let Err(e) = store.set(LAST_STARTED_KEY, &Utc::now()) {
        teardown(&mut terminal);
        return Err(e.into());
    }
    Ok((terminal, previous_start))
}

pub struct TuiApp<H: Store> {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    state: AppState,
    store: Arc<H>,
    // Held for the lifetime of the UI
    _streaming: GMusic,
    _scrobbler: lastfm::Client,
}

impl<H: Store> TuiApp<H> {
    fn event_loop(&mut self) -> io::Result<()> {
        loop {
            let state = &self.state;
            self.terminal.draw(|f| render(f, state))?;

            if !event::poll(Duration::from_millis(250))? {
                continue;
            }
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }

            match self.state.handle_key(key.code, key.modifiers) {
                Action::Quit => return Ok(()),
                Action::ForgetCredentials => self.forget_credentials(),
                Action::None => {}
            }
        }
    }

    fn forget_credentials(&mut self) {
        match self.store.remove(CREDENTIALS_KEY) {
            Ok(_) => {
                log::info!("Saved credentials removed");
                self.state
                    .set_status("Saved credentials removed, next start will ask for a login");
            }
            Err(e) => {
                log::warn!("Failed to remove saved credentials: {e}");
                self.state.set_status(format!("Failed to remove credentials: {e}"));
            }
        }
    }
}

impl<H: Store> App for TuiApp<H> {
    fn run(mut self) {
        if let Err(e) = self.event_loop() {
            log::error!("UI stopped: {e}");
        }
        if let Err(e) = restore_terminal(&mut self.terminal) {
            log::warn!("Failed to restore terminal: {e}");
        }
    }
}

fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(e);
    }
    Terminal::new(CrosstermBackend::new(stdout)).map_err(|e| {
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        let _ = disable_raw_mode();
        e
    })
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()
}

fn render(f: &mut Frame, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(6),
            Constraint::Length(3),
        ])
        .split(f.area());

    let title = Paragraph::new(Line::from(Span::styled(
        format!("Jam {}", crate::VERSION),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )))
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    let now = Utc::now();
    let dashboard = state.dashboard();
    let label = Style::default().fg(Color::Yellow);
    let lines = vec![
        Line::from(vec![
            Span::styled("Google Music: ", label),
            Span::raw(dashboard.account.as_str()),
        ]),
        Line::from(vec![
            Span::styled("Device: ", label),
            Span::raw(dashboard.device_id.as_str()),
        ]),
        Line::from(vec![
            Span::styled("Logged in: ", label),
            Span::raw(describe_age(dashboard.credentials_obtained, now)),
        ]),
        Line::from(vec![
            Span::styled("Last.fm: ", label),
            Span::raw(
                dashboard
                    .scrobbling_as
                    .clone()
                    .unwrap_or_else(|| "scrobbling disabled".to_string()),
            ),
        ]),
        Line::from(vec![
            Span::styled("Previous start: ", label),
            Span::raw(
                dashboard
                    .previous_start
                    .map(|at| describe_age(at, now))
                    .unwrap_or_else(|| "first run".to_string()),
            ),
        ]),
    ];
    let account = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Account"));
    f.render_widget(account, chunks[1]);

    let status = Paragraph::new(state.status()).block(Block::default().borders(Borders::ALL));
    f.render_widget(status, chunks[2]);
}
