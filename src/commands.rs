//! Global shortcuts and the command palette.
//!
//! Every key event passes through [`Dispatcher::dispatch`] before the typing
//! surface sees it. Recognised shortcuts are consumed; only the remaining keys
//! are forwarded to the keystroke classifier.

use std::fmt;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    OpenPalette,
    Finish,
    Reset,
    ToggleTheme,
    FocusInput,
    NewText,
    Quit,
}

impl Command {
    /// Commands offered by the palette, in display order.
    pub const PALETTE: [Command; 6] = [
        Command::Finish,
        Command::Reset,
        Command::NewText,
        Command::ToggleTheme,
        Command::FocusInput,
        Command::Quit,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Command::OpenPalette => "Open command palette",
            Command::Finish => "Finish session",
            Command::Reset => "Reset session",
            Command::ToggleTheme => "Toggle theme",
            Command::FocusInput => "Focus typing area",
            Command::NewText => "New text",
            Command::Quit => "Quit",
        }
    }

    /// First chord bound to this command, for hints.
    pub fn chord(self) -> Option<Chord> {
        BINDINGS
            .iter()
            .find(|binding| binding.command == self)
            .map(|binding| binding.chord)
    }
}

/// A key combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chord {
    /// ctrl (or cmd) + letter
    Primary(char),
    /// Unmodified key
    Plain(KeyCode),
}

impl Chord {
    pub fn matches(&self, event: &KeyEvent) -> bool {
        match *self {
            Chord::Primary(letter) => {
                event
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::SUPER)
                    && matches!(event.code, KeyCode::Char(c) if c.eq_ignore_ascii_case(&letter))
            }
            Chord::Plain(code) => {
                event.code == code
                    && !event
                        .modifiers
                        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER)
            }
        }
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chord::Primary(c) => write!(f, "Ctrl+{}", c.to_ascii_uppercase()),
            Chord::Plain(KeyCode::Esc) => write!(f, "Esc"),
            Chord::Plain(KeyCode::Enter) => write!(f, "Enter"),
            Chord::Plain(code) => write!(f, "{code:?}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub chord: Chord,
    pub command: Command,
}

const fn bind(chord: Chord, command: Command) -> Binding {
    Binding { chord, command }
}

/// Modifier chords, active in every mode except where the palette captures them.
pub const BINDINGS: &[Binding] = &[
    bind(Chord::Primary('k'), Command::OpenPalette),
    bind(Chord::Primary('p'), Command::OpenPalette),
    bind(Chord::Primary('f'), Command::Finish),
    bind(Chord::Primary('r'), Command::Reset),
    bind(Chord::Primary('t'), Command::ToggleTheme),
    bind(Chord::Primary('l'), Command::FocusInput),
    bind(Chord::Primary('n'), Command::NewText),
    bind(Chord::Primary('c'), Command::Quit),
    bind(Chord::Primary('q'), Command::Quit),
];

fn bound_command(event: &KeyEvent) -> Option<Command> {
    BINDINGS
        .iter()
        .find(|binding| binding.chord.matches(event))
        .map(|binding| binding.command)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum MatchKind {
    Exact,
    Prefix,
    WordStart,
    Substring,
    Fuzzy,
}

fn match_kind(label: &str, query: &str) -> Option<MatchKind> {
    let label = label.to_lowercase();
    let query = query.to_lowercase();

    if label == query {
        return Some(MatchKind::Exact);
    }
    if label.starts_with(&query) {
        return Some(MatchKind::Prefix);
    }
    if label.split_whitespace().any(|word| word.starts_with(&query)) {
        return Some(MatchKind::WordStart);
    }
    if label.contains(&query) {
        return Some(MatchKind::Substring);
    }

    let mut label_chars = label.chars();
    query
        .chars()
        .filter(|c| !c.is_whitespace())
        .all(|q| label_chars.any(|l| l == q))
        .then_some(MatchKind::Fuzzy)
}

/// Search state while the palette is open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Palette {
    query: String,
    selected: usize,
}

impl Palette {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    /// Palette commands matching the query, best matches first.
    pub fn matches(&self) -> Vec<Command> {
        if self.query.trim().is_empty() {
            return Command::PALETTE.to_vec();
        }
        let mut ranked: Vec<(MatchKind, Command)> = Command::PALETTE
            .iter()
            .filter_map(|&command| match_kind(command.label(), self.query.trim()).map(|kind| (kind, command)))
            .collect();
        ranked.sort_by_key(|(kind, _)| *kind);
        ranked.into_iter().map(|(_, command)| command).collect()
    }

    pub fn selected(&self) -> Option<Command> {
        self.matches().get(self.selected).copied()
    }

    fn push(&mut self, c: char) {
        self.query.push(c);
        self.selected = 0;
    }

    fn pop(&mut self) {
        self.query.pop();
        self.selected = 0;
    }

    fn move_selection(&mut self, down: bool) {
        let count = self.matches().len();
        if count == 0 {
            self.selected = 0;
            return;
        }
        self.selected = if down {
            (self.selected + 1) % count
        } else {
            (self.selected + count - 1) % count
        };
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Consumed; run this command.
    Run(Command),
    /// Consumed with no further action.
    Consumed,
    /// Not a shortcut; hand it to the typing surface.
    Forward(KeyEvent),
}

#[derive(Debug, Default)]
pub struct Dispatcher {
    palette: Option<Palette>,
    input_focused: bool,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch(&mut self, event: KeyEvent) -> Dispatch {
        if self.palette.is_some() {
            return self.dispatch_palette(event);
        }

        if let Some(command) = bound_command(&event) {
            return Dispatch::Run(command);
        }

        if Chord::Plain(KeyCode::Esc).matches(&event) {
            return Dispatch::Run(Command::Reset);
        }
        if Chord::Plain(KeyCode::Enter).matches(&event) && !self.input_focused {
            return Dispatch::Run(Command::Finish);
        }

        self.input_focused = true;
        Dispatch::Forward(event)
    }

    fn dispatch_palette(&mut self, event: KeyEvent) -> Dispatch {
        match bound_command(&event) {
            Some(Command::Quit) => return Dispatch::Run(Command::Quit),
            Some(Command::OpenPalette) => {
                self.close_palette();
                return Dispatch::Consumed;
            }
            Some(_) => return Dispatch::Consumed,
            None => {}
        }

        let Some(palette) = self.palette.as_mut() else {
            return Dispatch::Consumed;
        };

        match event.code {
            KeyCode::Esc => self.close_palette(),
            KeyCode::Enter => {
                let selected = palette.selected();
                self.close_palette();
                if let Some(command) = selected {
                    return Dispatch::Run(command);
                }
            }
            KeyCode::Up => palette.move_selection(false),
            KeyCode::Down | KeyCode::Tab => palette.move_selection(true),
            KeyCode::Backspace => palette.pop(),
            KeyCode::Char(c) if !c.is_control() => palette.push(c),
            _ => {}
        }
        Dispatch::Consumed
    }

    pub fn open_palette(&mut self) {
        self.palette = Some(Palette::default());
    }

    pub fn close_palette(&mut self) {
        self.palette = None;
    }

    pub fn palette(&self) -> Option<&Palette> {
        self.palette.as_ref()
    }

    pub fn is_palette_open(&self) -> bool {
        self.palette.is_some()
    }

    pub fn is_input_focused(&self) -> bool {
        self.input_focused
    }

    pub fn set_input_focused(&mut self, focused: bool) {
        self.input_focused = focused;
    }

    pub fn toggle_input_focus(&mut self) {
        self.input_focused = !self.input_focused;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn chords_map_to_commands() {
        let mut dispatcher = Dispatcher::new();
        assert_eq!(dispatcher.dispatch(ctrl('k')), Dispatch::Run(Command::OpenPalette));
        assert_eq!(dispatcher.dispatch(ctrl('f')), Dispatch::Run(Command::Finish));
        assert_eq!(dispatcher.dispatch(ctrl('r')), Dispatch::Run(Command::Reset));
        assert_eq!(dispatcher.dispatch(ctrl('t')), Dispatch::Run(Command::ToggleTheme));
        assert_eq!(dispatcher.dispatch(ctrl('l')), Dispatch::Run(Command::FocusInput));
        assert_eq!(dispatcher.dispatch(ctrl('c')), Dispatch::Run(Command::Quit));
    }

    #[test]
    fn cmd_modifier_works_like_ctrl() {
        let mut dispatcher = Dispatcher::new();
        let event = KeyEvent::new(KeyCode::Char('r'), KeyModifiers::SUPER);
        assert_eq!(dispatcher.dispatch(event), Dispatch::Run(Command::Reset));
    }

    #[test]
    fn escape_resets_when_palette_closed() {
        let mut dispatcher = Dispatcher::new();
        assert_eq!(dispatcher.dispatch(key(KeyCode::Esc)), Dispatch::Run(Command::Reset));
    }

    #[test]
    fn enter_finishes_only_when_unfocused() {
        let mut dispatcher = Dispatcher::new();
        assert_eq!(dispatcher.dispatch(key(KeyCode::Enter)), Dispatch::Run(Command::Finish));

        dispatcher.set_input_focused(true);
        let enter = key(KeyCode::Enter);
        assert_eq!(dispatcher.dispatch(enter), Dispatch::Forward(enter));
    }

    #[test]
    fn typing_focuses_input() {
        let mut dispatcher = Dispatcher::new();
        assert!(!dispatcher.is_input_focused());
        let a = key(KeyCode::Char('a'));
        assert_eq!(dispatcher.dispatch(a), Dispatch::Forward(a));
        assert!(dispatcher.is_input_focused());
    }

    #[test]
    fn palette_captures_typing() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.open_palette();

        assert_eq!(dispatcher.dispatch(key(KeyCode::Char('t'))), Dispatch::Consumed);
        assert_eq!(dispatcher.dispatch(key(KeyCode::Char('h'))), Dispatch::Consumed);
        assert_eq!(dispatcher.palette().unwrap().query(), "th");
        assert!(!dispatcher.is_input_focused());

        assert_eq!(dispatcher.dispatch(key(KeyCode::Backspace)), Dispatch::Consumed);
        assert_eq!(dispatcher.palette().unwrap().query(), "t");
    }

    #[test]
    fn escape_closes_palette_without_reset() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.open_palette();
        assert_eq!(dispatcher.dispatch(key(KeyCode::Esc)), Dispatch::Consumed);
        assert!(!dispatcher.is_palette_open());
    }

    #[test]
    fn enter_runs_selected_command() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.open_palette();
        for c in "theme".chars() {
            dispatcher.dispatch(key(KeyCode::Char(c)));
        }
        assert_eq!(
            dispatcher.dispatch(key(KeyCode::Enter)),
            Dispatch::Run(Command::ToggleTheme)
        );
        assert!(!dispatcher.is_palette_open());
    }

    #[test]
    fn enter_with_no_match_just_closes() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.open_palette();
        for c in "zzz".chars() {
            dispatcher.dispatch(key(KeyCode::Char(c)));
        }
        assert!(dispatcher.palette().unwrap().matches().is_empty());
        assert_eq!(dispatcher.dispatch(key(KeyCode::Enter)), Dispatch::Consumed);
        assert!(!dispatcher.is_palette_open());
    }

    #[test]
    fn selection_wraps() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.open_palette();
        dispatcher.dispatch(key(KeyCode::Up));
        let palette = dispatcher.palette().unwrap();
        assert_eq!(palette.selected_index(), Command::PALETTE.len() - 1);
        assert_eq!(palette.selected(), Some(Command::Quit));

        dispatcher.dispatch(key(KeyCode::Down));
        assert_eq!(dispatcher.palette().unwrap().selected(), Some(Command::Finish));
    }

    #[test]
    fn palette_swallows_other_chords_but_not_quit() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.open_palette();
        assert_eq!(dispatcher.dispatch(ctrl('r')), Dispatch::Consumed);
        assert!(dispatcher.is_palette_open());
        assert_eq!(dispatcher.dispatch(ctrl('q')), Dispatch::Run(Command::Quit));
    }

    #[test]
    fn palette_chord_toggles_closed() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.open_palette();
        assert_eq!(dispatcher.dispatch(ctrl('k')), Dispatch::Consumed);
        assert!(!dispatcher.is_palette_open());
    }

    #[test]
    fn ranking_prefers_prefix_over_fuzzy() {
        let palette = Palette {
            query: "re".to_string(),
            selected: 0,
        };
        let matches = palette.matches();
        assert_eq!(matches.first(), Some(&Command::Reset));
        assert!(matches.contains(&Command::FocusInput));
    }

    #[test]
    fn fuzzy_matches_subsequence() {
        assert_eq!(match_kind("Finish session", "fss"), Some(MatchKind::Fuzzy));
        assert_eq!(match_kind("Quit", "quit"), Some(MatchKind::Exact));
        assert_eq!(match_kind("New text", "text"), Some(MatchKind::WordStart));
        assert_eq!(match_kind("Toggle theme", "ggle"), Some(MatchKind::Substring));
        assert_eq!(match_kind("Quit", "x"), None);
    }

    #[test]
    fn chord_display() {
        assert_eq!(Chord::Primary('k').to_string(), "Ctrl+K");
        assert_eq!(Chord::Plain(KeyCode::Esc).to_string(), "Esc");
        assert_eq!(Command::Reset.chord(), Some(Chord::Primary('r')));
    }

    #[test]
    fn alt_gr_symbols_reach_the_typing_surface() {
        let mut dispatcher = Dispatcher::new();
        let event = KeyEvent::new(
            KeyCode::Char('@'),
            KeyModifiers::CONTROL | KeyModifiers::ALT,
        );
        assert_eq!(dispatcher.dispatch(event), Dispatch::Forward(event));
    }
}
