/// Main TUI application

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::Duration;
use tokio::sync::watch;

use crate::core::derived::DashboardSummary;
use crate::core::refresh::SharedSnapshot;
use crate::core::{open_source, FeedKind, FeedOptions, RefreshLoop};
use crate::screens::Dashboard;
use crate::utils::AppConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Overview,
    Energy,
    Transport,
    Environment,
    Impact,
}

impl Screen {
    pub fn title(&self) -> &'static str {
        match self {
            Screen::Overview => "Overview",
            Screen::Energy => "Energy",
            Screen::Transport => "Transport",
            Screen::Environment => "Environment",
            Screen::Impact => "Impact",
        }
    }

    pub fn all() -> &'static [Screen] {
        &[
            Screen::Overview,
            Screen::Energy,
            Screen::Transport,
            Screen::Environment,
            Screen::Impact,
        ]
    }

    pub fn next(&self) -> Screen {
        let screens = Screen::all();
        let idx = screens.iter().position(|s| s == self).unwrap_or(0);
        screens[(idx + 1) % screens.len()]
    }

    pub fn prev(&self) -> Screen {
        let screens = Screen::all();
        let idx = screens.iter().position(|s| s == self).unwrap_or(0);
        screens[(idx + screens.len() - 1) % screens.len()]
    }
}

/// Feed state shown in the header
#[derive(Debug, Clone)]
pub struct FeedStatus {
    pub feed: FeedKind,
    pub interval: Duration,
    pub live: bool,
    pub refreshes: u64,
}

pub struct App {
    dashboard: Dashboard,
    refresh: RefreshLoop,
    feed: FeedKind,
    feed_options: FeedOptions,
    snapshot_rx: watch::Receiver<SharedSnapshot>,
    snapshot: SharedSnapshot,
    summary: Option<DashboardSummary>,
    current_screen: Screen,
    should_quit: bool,
    show_help: bool,
    status_message: Option<String>,
}

impl App {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let refresh = RefreshLoop::new(config.refresh_interval);
        let snapshot_rx = refresh.subscribe();

        Ok(Self {
            dashboard: Dashboard::new(),
            refresh,
            feed: config.feed,
            feed_options: config.feed_options(),
            snapshot_rx,
            snapshot: None,
            summary: None,
            current_screen: Screen::Overview,
            should_quit: false,
            show_help: false,
            status_message: None,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        // Fail before touching the terminal if the feed is unusable
        self.start_refresh()?;

        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.run_loop(&mut terminal).await;

        self.refresh.deactivate();

        // Restore terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    /// (Re)open the configured source and activate the refresh loop
    fn start_refresh(&mut self) -> Result<()> {
        let source = open_source(self.feed, &self.feed_options)
            .with_context(|| format!("Failed to open {} feed", self.feed))?;

        self.refresh
            .activate(source)
            .with_context(|| format!("Failed to load initial snapshot from {} feed", self.feed))?;

        Ok(())
    }

    fn pull_snapshot(&mut self) {
        if self.snapshot_rx.has_changed().unwrap_or(false) {
            let snapshot = self.snapshot_rx.borrow_and_update().clone();
            self.summary = snapshot.as_deref().map(DashboardSummary::from_snapshot);
            self.snapshot = snapshot;
        }
    }

    fn feed_status(&self) -> FeedStatus {
        FeedStatus {
            feed: self.feed,
            interval: self.refresh.period(),
            live: self.refresh.is_active(),
            refreshes: self.refresh.refresh_count(),
        }
    }

    async fn run_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> Result<()> {
        loop {
            // Pick up the latest snapshot from the refresh loop (non-blocking)
            self.pull_snapshot();

            terminal.draw(|f| self.render(f))?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key_event) = event::read()? {
                    if key_event.kind == KeyEventKind::Press {
                        self.handle_key(key_event.code)?;
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode) -> Result<()> {
        if self.show_help {
            if matches!(key, KeyCode::Esc | KeyCode::Char('?') | KeyCode::F(1) | KeyCode::Char('q')) {
                self.show_help = false;
            }
            return Ok(());
        }

        self.status_message = None;

        match key {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char('?') | KeyCode::F(1) => {
                self.show_help = true;
            }
            KeyCode::Right | KeyCode::Tab => {
                self.current_screen = self.current_screen.next();
            }
            KeyCode::Left | KeyCode::BackTab => {
                self.current_screen = self.current_screen.prev();
            }
            KeyCode::Char(c @ '1'..='5') => {
                let idx = c as usize - '1' as usize;
                self.current_screen = Screen::all()[idx];
            }
            KeyCode::Char('p') => {
                if self.refresh.is_active() {
                    self.refresh.deactivate();
                    self.status_message = Some("Auto-refresh paused - last snapshot kept".to_string());
                } else {
                    self.resume("Auto-refresh resumed");
                }
            }
            KeyCode::Char('r') => {
                self.resume("Snapshot refreshed");
            }
            _ => {}
        }

        Ok(())
    }

    fn resume(&mut self, message: &str) {
        match self.start_refresh() {
            Ok(()) => self.status_message = Some(message.to_string()),
            Err(e) => {
                tracing::warn!(error = %e, "refresh restart failed");
                self.status_message = Some(format!("Refresh failed: {:#}", e));
            }
        }
    }

    fn render(&self, frame: &mut ratatui::Frame) {
        self.dashboard.render(
            frame,
            self.current_screen,
            self.snapshot.as_deref(),
            self.summary.as_ref(),
            &self.feed_status(),
            self.status_message.as_deref(),
            self.show_help,
        );
    }
}
