//! Ties the command layer, the session reducer, the timers and the error
//! statistics store together.
//!
//! The engine is the only thing the front-end talks to. It never blocks and
//! never reads the clock itself: every entry point takes the current instant,
//! which keeps it deterministic under test.

use std::ops::Range;
use std::time::Instant;

use crossterm::event::KeyEvent;
use tracing::{debug, info, warn};

use crate::commands::{Command, Dispatch, Dispatcher};
use crate::error::Result;
use crate::keystroke::{Key, TabPolicy};
use crate::parser::{self, Segment};
use crate::session::{Effect, Rejection, SessionEvent, SessionResult, SessionState};
use crate::stats::ErrorStats;
use crate::timers::{Scheduler, Task, TaskHandle, MISTAKE_ALERT, SESSION_TICK};

/// The transient notice shown after a mistake or a rejected keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alert {
    Mistake(char),
    Rejected(Rejection),
}

pub struct Engine<S: ErrorStats> {
    segments: Vec<Segment>,
    glosses: Vec<(Range<usize>, String)>,
    session: SessionState,
    dispatcher: Dispatcher,
    scheduler: Scheduler,
    generation: u64,
    tick: Option<TaskHandle>,
    alert: Option<(Alert, TaskHandle)>,
    stats: S,
}

impl<S: ErrorStats> Engine<S> {
    /// `raw` may contain `[surface](gloss)` annotations.
    pub fn new(raw: &str, time_limit: Option<u64>, tab_policy: TabPolicy, stats: S) -> Self {
        let segments = parser::parse(raw);
        let session = SessionState::new(&parser::plain_text(&segments), time_limit, tab_policy);

        Self {
            glosses: parser::gloss_spans(&segments),
            segments,
            session,
            dispatcher: Dispatcher::new(),
            scheduler: Scheduler::new(),
            generation: 0,
            tick: None,
            alert: None,
            stats,
        }
    }

    /// Route one key event. Commands the engine cannot carry out itself
    /// (theme, new text, quit) are handed back to the caller.
    pub fn handle_key(&mut self, event: KeyEvent, now: Instant) -> Option<Command> {
        match self.dispatcher.dispatch(event) {
            Dispatch::Run(command) => self.run(command, now),
            Dispatch::Consumed => None,
            Dispatch::Forward(event) => {
                let effects = self.session.apply(SessionEvent::Key(Key::from(event)));
                self.process(effects, now)
            }
        }
    }

    pub fn run(&mut self, command: Command, now: Instant) -> Option<Command> {
        match command {
            Command::OpenPalette => {
                self.dispatcher.open_palette();
                None
            }
            Command::Finish => {
                let effects = self.session.apply(SessionEvent::Finish);
                self.process(effects, now)
            }
            Command::Reset => {
                let effects = self.session.apply(SessionEvent::Reset);
                self.process(effects, now)
            }
            Command::FocusInput => {
                self.dispatcher.toggle_input_focus();
                None
            }
            Command::ToggleTheme | Command::NewText | Command::Quit => Some(command),
        }
    }

    /// Apply every timer due at `now`.
    pub fn on_timers(&mut self, now: Instant) {
        for fired in self.scheduler.fire_due(now) {
            if fired.generation != self.generation {
                debug!(task = ?fired.task, generation = fired.generation, "discarding stale timer");
                continue;
            }
            match fired.task {
                Task::SessionTick => {
                    let effects = self.session.apply(SessionEvent::Tick);
                    self.process(effects, fired.due);
                }
                Task::ClearMistakeAlert => self.alert = None,
            }
        }
    }

    /// Replace the practice text, discarding the current session.
    pub fn reload(&mut self, raw: &str) {
        self.cancel_timers();
        self.segments = parser::parse(raw);
        self.glosses = parser::gloss_spans(&self.segments);
        self.session = SessionState::new(
            &parser::plain_text(&self.segments),
            self.session.time_limit(),
            self.session.tab_policy(),
        );
        self.dispatcher = Dispatcher::new();
        info!(len = self.session.base_text().len(), "practice text reloaded");
    }

    fn process(&mut self, effects: Vec<Effect>, now: Instant) -> Option<Command> {
        for effect in effects {
            match effect {
                Effect::Started => {
                    let handle =
                        self.scheduler
                            .schedule_every(Task::SessionTick, self.generation, now, SESSION_TICK);
                    if let Some(old) = self.tick.replace(handle) {
                        self.scheduler.cancel(old);
                    }
                }
                Effect::Mistake(key) => {
                    if let Err(err) = self.stats.add_error(key) {
                        warn!(%err, ?key, "failed to record mistake");
                    }
                    self.show_alert(Alert::Mistake(key), now);
                }
                Effect::Rejected(rejection) => self.show_alert(Alert::Rejected(rejection), now),
                Effect::Submitted(_) => {
                    self.cancel_timers();
                    self.dispatcher.set_input_focused(false);
                }
                Effect::Reset => {
                    self.cancel_timers();
                    self.dispatcher = Dispatcher::new();
                }
                Effect::Structural(Key::Escape) => return self.run(Command::Reset, now),
                Effect::Accepted(_)
                | Effect::Erased
                | Effect::Extended
                | Effect::Ticked { .. }
                | Effect::Structural(_) => {}
            }
        }
        None
    }

    fn show_alert(&mut self, alert: Alert, now: Instant) {
        if let Some((_, old)) = self.alert.take() {
            self.scheduler.cancel(old);
        }
        let handle =
            self.scheduler
                .schedule_once(Task::ClearMistakeAlert, self.generation, now, MISTAKE_ALERT);
        self.alert = Some((alert, handle));
    }

    /// Cancel both timers and retire the current generation.
    fn cancel_timers(&mut self) {
        if let Some(handle) = self.tick.take() {
            self.scheduler.cancel(handle);
        }
        if let Some((_, handle)) = self.alert.take() {
            self.scheduler.cancel(handle);
        }
        self.generation += 1;
    }

    /// Teardown: nothing scheduled survives, whatever its generation.
    pub fn shutdown(&mut self) {
        self.cancel_timers();
        self.scheduler.cancel_all();
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn alert(&self) -> Option<Alert> {
        self.alert.map(|(alert, _)| alert)
    }

    /// Gloss covering position `index` of the (possibly extended) target.
    pub fn gloss_at(&self, index: usize) -> Option<&str> {
        let cycle = self.session.cycle_len();
        if cycle == 0 {
            return None;
        }
        let offset = index % cycle;
        self.glosses
            .iter()
            .find(|(range, _)| range.contains(&offset))
            .map(|(_, gloss)| gloss.as_str())
    }

    pub fn gloss_at_cursor(&self) -> Option<&str> {
        self.gloss_at(self.session.cursor())
    }

    pub fn result(&self) -> Option<SessionResult> {
        self.session.result()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_due()
    }

    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending()
    }

    /// Cross-session trouble characters; empty if the store cannot be read.
    pub fn high_error_chars(&self, limit: usize) -> Vec<(char, u64)> {
        self.stats.high_error_chars(limit).unwrap_or_else(|err| {
            warn!(%err, "failed to read error statistics");
            Vec::new()
        })
    }

    pub fn reset_stats(&mut self) -> Result<()> {
        self.stats.reset_stats()
    }

    pub fn stats(&self) -> &S {
        &self.stats
    }
}

impl<S: ErrorStats> Drop for Engine<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
