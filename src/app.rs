use std::time::Instant;

use crossterm::event::KeyEvent;
use tracing::{info, warn};

use crate::commands::Command;
use crate::config::{Config, ConfigStore, Theme};
use crate::engine::Engine;
use crate::history::{ResultLog, ResultRow};
use crate::stats::ErrorStats;
use crate::texts::TextSource;

/// Characters listed under "trouble keys" on the results screen.
pub const HIGH_ERROR_LIMIT: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Typing,
    Results,
}

pub struct App {
    pub engine: Engine<Box<dyn ErrorStats>>,
    config: Config,
    config_store: Option<Box<dyn ConfigStore>>,
    source: TextSource,
    result_log: Option<ResultLog>,
    result_logged: bool,
    high_errors: Vec<(char, u64)>,
    should_quit: bool,
}

impl App {
    pub fn new(config: Config, mut source: TextSource, stats: Box<dyn ErrorStats>) -> Self {
        let text = source.next_text(&mut rand::thread_rng());
        let engine = Engine::new(&text, config.time_limit(), config.tab_policy, stats);

        Self {
            engine,
            config,
            config_store: None,
            source,
            result_log: None,
            result_logged: false,
            high_errors: Vec::new(),
            should_quit: false,
        }
    }

    /// Persist theme changes through `store`.
    pub fn with_config_store(mut self, store: Box<dyn ConfigStore>) -> Self {
        self.config_store = Some(store);
        self
    }

    /// Append every submitted session to `log`.
    pub fn with_result_log(mut self, log: ResultLog) -> Self {
        self.result_log = Some(log);
        self
    }

    pub fn on_key(&mut self, key: KeyEvent, now: Instant) {
        if let Some(command) = self.engine.handle_key(key, now) {
            self.run(command);
        }
        self.after_engine();
    }

    pub fn on_tick(&mut self, now: Instant) {
        self.engine.on_timers(now);
        self.after_engine();
    }

    /// Commands the engine hands back.
    fn run(&mut self, command: Command) {
        match command {
            Command::ToggleTheme => self.toggle_theme(),
            Command::NewText => self.new_text(),
            Command::Quit => self.should_quit = true,
            Command::OpenPalette | Command::Finish | Command::Reset | Command::FocusInput => {}
        }
    }

    fn toggle_theme(&mut self) {
        self.config.theme = self.config.theme.toggled();
        // only the theme is written back; command-line overrides stay transient
        if let Some(store) = &self.config_store {
            let mut stored = store.load();
            stored.theme = self.config.theme;
            if let Err(err) = store.save(&stored) {
                warn!(%err, "failed to save config");
            }
        }
    }

    fn new_text(&mut self) {
        let text = self.source.next_text(&mut rand::thread_rng());
        self.engine.reload(&text);
    }

    fn after_engine(&mut self) {
        match self.engine.result() {
            Some(result) if !self.result_logged => {
                self.result_logged = true;
                self.high_errors = self.engine.high_error_chars(HIGH_ERROR_LIMIT);
                if let Some(log) = &self.result_log {
                    let row = ResultRow::new(&self.source.label(), self.config.time_limit(), &result);
                    match log.append(&row) {
                        Ok(()) => info!(wpm = row.wpm, accuracy = row.accuracy, "result saved"),
                        Err(err) => warn!(%err, "failed to save result"),
                    }
                }
            }
            Some(_) => {}
            None => self.result_logged = false,
        }
    }

    pub fn state(&self) -> AppState {
        if self.engine.session().is_submitted() {
            AppState::Results
        } else {
            AppState::Typing
        }
    }

    pub fn theme(&self) -> Theme {
        self.config.theme
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn source_label(&self) -> String {
        self.source.label()
    }

    /// Cross-session trouble characters, captured when the session was submitted.
    pub fn high_errors(&self) -> &[(char, u64)] {
        &self.high_errors
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FileConfigStore;
    use crate::stats::MemoryErrorStats;
    use crossterm::event::{KeyCode, KeyModifiers};
    use tempfile::tempdir;

    fn app(text: &str) -> App {
        let config = Config {
            time_limit_secs: 0,
            ..Config::default()
        };
        App::new(
            config,
            TextSource::custom("test", text),
            Box::new(MemoryErrorStats::new()),
        )
    }

    fn press(app: &mut App, code: KeyCode, now: Instant) {
        app.on_key(KeyEvent::new(code, KeyModifiers::NONE), now);
    }

    fn ctrl(app: &mut App, c: char, now: Instant) {
        app.on_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL), now);
    }

    #[test]
    fn finishing_moves_to_results_and_logs_once() {
        let dir = tempdir().unwrap();
        let log = ResultLog::new(dir.path().join("results.csv"));
        let mut app = app("hi").with_result_log(log.clone());
        let t0 = Instant::now();

        press(&mut app, KeyCode::Char('h'), t0);
        press(&mut app, KeyCode::Char('x'), t0);
        assert_eq!(app.state(), AppState::Typing);

        ctrl(&mut app, 'f', t0);
        assert_eq!(app.state(), AppState::Results);
        app.on_tick(t0);
        ctrl(&mut app, 'f', t0);

        let rows = log.read_all().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].topic, "test");
        assert_eq!(rows[0].total_errors, 1);
        assert_eq!(app.high_errors(), &[('i', 1)]);
    }

    #[test]
    fn reset_after_results_allows_another_log_row() {
        let dir = tempdir().unwrap();
        let log = ResultLog::new(dir.path().join("results.csv"));
        let mut app = app("hi").with_result_log(log.clone());
        let t0 = Instant::now();

        press(&mut app, KeyCode::Char('h'), t0);
        ctrl(&mut app, 'f', t0);
        press(&mut app, KeyCode::Esc, t0);
        assert_eq!(app.state(), AppState::Typing);

        press(&mut app, KeyCode::Char('h'), t0);
        ctrl(&mut app, 'f', t0);
        assert_eq!(log.read_all().unwrap().len(), 2);
    }

    #[test]
    fn theme_toggle_is_persisted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut app = app("hi").with_config_store(Box::new(FileConfigStore::with_path(&path)));

        ctrl(&mut app, 't', Instant::now());
        assert_eq!(app.theme(), Theme::Light);
        assert_eq!(FileConfigStore::with_path(&path).load().theme, Theme::Light);
    }

    #[test]
    fn new_text_reloads_session() {
        let mut app = app("hi");
        let t0 = Instant::now();
        press(&mut app, KeyCode::Char('h'), t0);
        ctrl(&mut app, 'n', t0);
        assert!(app.engine.session().input().is_empty());
        assert!(!app.engine.session().is_started());
    }

    #[test]
    fn quit_command_sets_flag() {
        let mut app = app("hi");
        assert!(!app.should_quit());
        ctrl(&mut app, 'q', Instant::now());
        assert!(app.should_quit());
    }

    #[test]
    fn time_limit_comes_from_config() {
        let config = Config {
            time_limit_secs: 15,
            ..Config::default()
        };
        let app = App::new(
            config,
            TextSource::custom("t", "abc"),
            Box::new(MemoryErrorStats::new()),
        );
        assert_eq!(app.engine.session().time_limit(), Some(15));
        assert_eq!(app.source_label(), "t");
    }
}
