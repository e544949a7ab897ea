//! The typing session state machine.
//!
//! A session moves `Idle -> Active -> Submitted`. While active it may be
//! locked on an outstanding mistake, which blocks forward input until the
//! wrong character is erased. All mutation goes through [`SessionState::apply`],
//! one event at a time; the returned effects tell the caller what happened.

use std::collections::BTreeMap;

use itertools::Itertools;
use tracing::{debug, info};

use crate::keystroke::{self, Key, Keystroke, Position, Stroke, TabPolicy, TAB_WIDTH};
use crate::metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Active,
    Submitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Key(Key),
    /// One elapsed second of the session clock.
    Tick,
    Finish,
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Forward input while a mistake is outstanding.
    Locked,
    /// Backspace into input already committed as correct.
    CommittedHistory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitReason {
    Finished,
    TimeLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Started,
    Accepted(Stroke),
    /// A mistake was recorded under this key.
    Mistake(char),
    Erased,
    Rejected(Rejection),
    /// The target ran out and another copy of the base text was appended.
    Extended,
    Ticked { elapsed: u64, wpm: u32 },
    Submitted(SubmitReason),
    Reset,
    /// A key the session does not handle; belongs to the command layer.
    Structural(Key),
}

/// Frozen metrics of a submitted session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionResult {
    pub wpm: u32,
    pub accuracy: u32,
    pub wpm_history: Vec<u32>,
    pub error_map: BTreeMap<char, u64>,
    pub total_errors: u64,
    pub total_keystrokes: u64,
    pub elapsed_secs: u64,
}

impl SessionResult {
    pub fn consistency(&self) -> f64 {
        metrics::consistency(&self.wpm_history)
    }

    /// Mistyped characters, most frequent first.
    pub fn errors_by_frequency(&self) -> Vec<(char, u64)> {
        self.error_map
            .iter()
            .map(|(&c, &n)| (c, n))
            .sorted_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    base: Vec<char>,
    time_limit: Option<u64>,
    tab_policy: TabPolicy,

    target: Vec<char>,
    input: Vec<char>,
    started: bool,
    submitted: bool,
    elapsed_seconds: u64,
    mistake_count: u64,
    total_keystroke_count: u64,
    has_outstanding_mistake: bool,
    last_accepted_correct_position: usize,
    error_map: BTreeMap<char, u64>,
    wpm_history: Vec<u32>,
    wpm: u32,
    accuracy: u32,
}

impl SessionState {
    /// `text` is the de-annotated practice text; a time limit of zero means unlimited.
    pub fn new(text: &str, time_limit: Option<u64>, tab_policy: TabPolicy) -> Self {
        let base: Vec<char> = text.chars().collect();

        Self {
            target: base.clone(),
            base,
            time_limit: time_limit.filter(|&secs| secs > 0),
            tab_policy,
            input: Vec::new(),
            started: false,
            submitted: false,
            elapsed_seconds: 0,
            mistake_count: 0,
            total_keystroke_count: 0,
            has_outstanding_mistake: false,
            last_accepted_correct_position: 0,
            error_map: BTreeMap::new(),
            wpm_history: Vec::new(),
            wpm: 0,
            accuracy: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        if self.submitted {
            Phase::Submitted
        } else if self.started {
            Phase::Active
        } else {
            Phase::Idle
        }
    }

    pub fn apply(&mut self, event: SessionEvent) -> Vec<Effect> {
        let mut effects = Vec::new();
        match event {
            SessionEvent::Key(key) => self.on_key(key, &mut effects),
            SessionEvent::Tick => self.on_tick(&mut effects),
            SessionEvent::Finish => self.on_finish(&mut effects),
            SessionEvent::Reset => {
                *self = Self::new_like(self);
                debug!("session reset");
                effects.push(Effect::Reset);
            }
        }
        effects
    }

    fn new_like(other: &Self) -> Self {
        let mut fresh = Self::new("", other.time_limit, other.tab_policy);
        fresh.base = other.base.clone();
        fresh.target = other.base.clone();
        fresh
    }

    fn position(&self) -> Position<'_> {
        Position {
            target: &self.target,
            typed: self.input.len(),
            committed: self.last_accepted_correct_position,
            locked: self.has_outstanding_mistake,
        }
    }

    fn on_key(&mut self, key: Key, effects: &mut Vec<Effect>) {
        if self.submitted {
            return;
        }

        match keystroke::classify(&self.position(), key) {
            Keystroke::Content(stroke) => {
                self.begin(effects);
                self.total_keystroke_count += 1;
                self.push(stroke, effects);
                self.refresh_metrics();
            }
            Keystroke::Tab => {
                self.begin(effects);
                self.total_keystroke_count += 1;
                self.expand_tab(effects);
                self.refresh_metrics();
            }
            Keystroke::Backspace => {
                self.input.pop();
                if self.input.len() <= self.last_accepted_correct_position {
                    self.has_outstanding_mistake = false;
                }
                self.refresh_metrics();
                effects.push(Effect::Erased);
            }
            Keystroke::Locked => effects.push(Effect::Rejected(Rejection::Locked)),
            Keystroke::Committed => {
                effects.push(Effect::Rejected(Rejection::CommittedHistory))
            }
            Keystroke::Structural(key) => effects.push(Effect::Structural(key)),
            Keystroke::Ignored => {}
        }
    }

    fn begin(&mut self, effects: &mut Vec<Effect>) {
        if !self.started {
            self.started = true;
            info!(
                target_len = self.base.len(),
                time_limit = ?self.time_limit,
                "session started"
            );
            effects.push(Effect::Started);
        }
    }

    fn push(&mut self, stroke: Stroke, effects: &mut Vec<Effect>) {
        self.input.push(stroke.typed());
        match stroke.error_key() {
            None => self.last_accepted_correct_position = self.input.len(),
            Some(key) => {
                self.mistake_count += 1;
                self.has_outstanding_mistake = true;
                *self.error_map.entry(key).or_insert(0) += 1;
                effects.push(Effect::Mistake(key));
            }
        }
        effects.push(Effect::Accepted(stroke));
        self.extend_if_exhausted(effects);
    }

    fn expand_tab(&mut self, effects: &mut Vec<Effect>) {
        for _ in 0..TAB_WIDTH {
            let Some(expected) = self.target.get(self.input.len()).copied() else {
                break;
            };
            let stroke = match self.tab_policy {
                TabPolicy::Bypass => Stroke::Correct(' '),
                TabPolicy::Validate => Stroke::judge(' ', expected),
            };
            self.push(stroke, effects);
            if !stroke.is_correct() {
                break;
            }
        }
    }

    fn extend_if_exhausted(&mut self, effects: &mut Vec<Effect>) {
        if self.submitted || self.base.is_empty() || self.input.len() < self.target.len() {
            return;
        }
        self.target.extend_from_slice(&self.base);
        debug!(target_len = self.target.len(), "target text extended");
        effects.push(Effect::Extended);
    }

    fn on_tick(&mut self, effects: &mut Vec<Effect>) {
        if !self.started || self.submitted {
            return;
        }

        self.elapsed_seconds += 1;
        self.refresh_metrics();
        self.wpm_history.push(self.wpm);
        effects.push(Effect::Ticked {
            elapsed: self.elapsed_seconds,
            wpm: self.wpm,
        });

        if let Some(limit) = self.time_limit {
            if self.elapsed_seconds >= limit {
                self.submit(SubmitReason::TimeLimit, effects);
            }
        }
    }

    fn on_finish(&mut self, effects: &mut Vec<Effect>) {
        if self.submitted {
            return;
        }
        // An untouched session treats Finish as "start now".
        if !self.started {
            self.begin(effects);
            return;
        }
        self.submit(SubmitReason::Finished, effects);
    }

    fn submit(&mut self, reason: SubmitReason, effects: &mut Vec<Effect>) {
        self.refresh_metrics();
        self.submitted = true;
        info!(
            ?reason,
            wpm = self.wpm,
            accuracy = self.accuracy,
            mistakes = self.mistake_count,
            elapsed = self.elapsed_seconds,
            "session submitted"
        );
        effects.push(Effect::Submitted(reason));
    }

    fn refresh_metrics(&mut self) {
        self.wpm = metrics::wpm(&self.input, self.elapsed_seconds);
        self.accuracy = metrics::accuracy(self.total_keystroke_count, self.mistake_count);
    }

    pub fn result(&self) -> Option<SessionResult> {
        self.submitted.then(|| SessionResult {
            wpm: self.wpm,
            accuracy: self.accuracy,
            wpm_history: self.wpm_history.clone(),
            error_map: self.error_map.clone(),
            total_errors: self.mistake_count,
            total_keystrokes: self.total_keystroke_count,
            elapsed_secs: self.elapsed_seconds,
        })
    }

    pub fn base_text(&self) -> &[char] {
        &self.base
    }

    /// Length of one repetition of the base text.
    pub fn cycle_len(&self) -> usize {
        self.base.len()
    }

    pub fn target(&self) -> &[char] {
        &self.target
    }

    pub fn input(&self) -> &[char] {
        &self.input
    }

    pub fn cursor(&self) -> usize {
        self.input.len()
    }

    pub fn expected_char(&self) -> Option<char> {
        self.target.get(self.input.len()).copied()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn is_locked(&self) -> bool {
        self.has_outstanding_mistake
    }

    pub fn time_limit(&self) -> Option<u64> {
        self.time_limit
    }

    pub fn tab_policy(&self) -> TabPolicy {
        self.tab_policy
    }

    pub fn seconds_remaining(&self) -> Option<u64> {
        self.time_limit
            .map(|limit| limit.saturating_sub(self.elapsed_seconds))
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn mistake_count(&self) -> u64 {
        self.mistake_count
    }

    pub fn total_keystroke_count(&self) -> u64 {
        self.total_keystroke_count
    }

    pub fn last_accepted_correct_position(&self) -> usize {
        self.last_accepted_correct_position
    }

    pub fn error_map(&self) -> &BTreeMap<char, u64> {
        &self.error_map
    }

    pub fn wpm_history(&self) -> &[u32] {
        &self.wpm_history
    }

    pub fn wpm(&self) -> u32 {
        self.wpm
    }

    pub fn accuracy(&self) -> u32 {
        self.accuracy
    }
}
