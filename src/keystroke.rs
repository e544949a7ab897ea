use clap::ValueEnum;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};

/// Spaces produced by one Tab press.
pub const TAB_WIDTH: usize = 4;

/// Marker used for line breaks, both in the target text and in the error map.
pub const NEWLINE: char = '\n';

/// Keys as the typing surface sees them, independent of the terminal backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Tab,
    Backspace,
    Escape,
    Other,
}

impl From<KeyEvent> for Key {
    fn from(event: KeyEvent) -> Self {
        let chord = event
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER);
        // some terminals report AltGr as Ctrl+Alt
        let alt_gr = event
            .modifiers
            .contains(KeyModifiers::CONTROL | KeyModifiers::ALT);

        match event.code {
            KeyCode::Char(c) if alt_gr && !c.is_ascii_alphabetic() && !c.is_control() => {
                Key::Char(c)
            }
            KeyCode::Char(_) if chord => Key::Other,
            KeyCode::Char('\n') | KeyCode::Char('\r') => Key::Enter,
            KeyCode::Char('\t') => Key::Tab,
            KeyCode::Char(c) if c.is_control() => Key::Other,
            KeyCode::Char(c) => Key::Char(c),
            KeyCode::Enter => Key::Enter,
            KeyCode::Tab => Key::Tab,
            KeyCode::Backspace => Key::Backspace,
            KeyCode::Esc => Key::Escape,
            _ => Key::Other,
        }
    }
}

/// How Tab expansion is checked against the target text.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TabPolicy {
    /// Every expanded space is accepted as typed, whatever the target holds.
    #[default]
    Bypass,
    /// Each expanded space is compared with the target; the first mismatch is a mistake.
    Validate,
}

/// Verdict for a single character compared with the expected one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stroke {
    Correct(char),
    Incorrect { typed: char, expected: char },
}

impl Stroke {
    pub fn judge(typed: char, expected: char) -> Self {
        if typed == expected {
            Stroke::Correct(typed)
        } else {
            Stroke::Incorrect { typed, expected }
        }
    }

    /// The character that lands in the input buffer.
    pub fn typed(&self) -> char {
        match *self {
            Stroke::Correct(c) => c,
            Stroke::Incorrect { typed, .. } => typed,
        }
    }

    pub fn is_correct(&self) -> bool {
        matches!(self, Stroke::Correct(_))
    }

    /// Key under which a mistake is counted: the newline marker for a wrong
    /// line break, otherwise the character that should have been typed.
    pub fn error_key(&self) -> Option<char> {
        match *self {
            Stroke::Correct(_) => None,
            Stroke::Incorrect { typed: NEWLINE, .. } => Some(NEWLINE),
            Stroke::Incorrect { expected, .. } => Some(expected),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keystroke {
    /// A character or line break that goes into the input buffer.
    Content(Stroke),
    /// Expand to [`TAB_WIDTH`] spaces.
    Tab,
    /// Remove the last input character.
    Backspace,
    /// Not content; belongs to the command layer.
    Structural(Key),
    /// Forward input while an outstanding mistake is not yet erased.
    Locked,
    /// Backspace into input that is already committed as correct.
    Committed,
    /// No effect and not counted.
    Ignored,
}

impl Keystroke {
    /// Rejections are no-ops for the session but get a visible notice.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Keystroke::Locked | Keystroke::Committed)
    }
}

/// Where the typist currently stands relative to the target.
#[derive(Debug, Clone, Copy)]
pub struct Position<'a> {
    pub target: &'a [char],
    pub typed: usize,
    pub committed: usize,
    pub locked: bool,
}

impl Position<'_> {
    pub fn expected(&self) -> Option<char> {
        self.target.get(self.typed).copied()
    }
}

pub fn classify(pos: &Position<'_>, key: Key) -> Keystroke {
    match key {
        Key::Escape => Keystroke::Structural(key),
        Key::Other => Keystroke::Ignored,
        Key::Backspace => {
            if pos.typed == 0 {
                Keystroke::Ignored
            } else if pos.locked || pos.typed > pos.committed {
                Keystroke::Backspace
            } else {
                Keystroke::Committed
            }
        }
        Key::Char(_) | Key::Enter | Key::Tab if pos.locked => Keystroke::Locked,
        Key::Char(c) => match pos.expected() {
            Some(expected) => Keystroke::Content(Stroke::judge(c, expected)),
            None => Keystroke::Ignored,
        },
        Key::Enter => match pos.expected() {
            Some(expected) => Keystroke::Content(Stroke::judge(NEWLINE, expected)),
            None => Keystroke::Ignored,
        },
        Key::Tab => match pos.expected() {
            Some(_) => Keystroke::Tab,
            None => Keystroke::Ignored,
        },
    }
}
