use ratatui::style::{Color, Modifier, Style};

use crate::config::Theme;

/// Styles used across screens for one theme.
#[derive(Debug, Clone, Copy)]
pub struct Styles {
    pub base: Style,
    pub correct: Style,
    pub incorrect: Style,
    pub pending: Style,
    pub cursor: Style,
    pub gloss: Style,
    pub accent: Style,
    pub alert: Style,
    pub hint: Style,
    pub selected: Style,
    pub chart: Style,
}

impl Styles {
    pub fn for_theme(theme: Theme) -> Self {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        match theme {
            Theme::Dark => Self {
                base: Style::default().fg(Color::White).bg(Color::Reset),
                correct: bold.fg(Color::Green),
                incorrect: bold.fg(Color::White).bg(Color::Red),
                pending: bold.add_modifier(Modifier::DIM),
                cursor: bold
                    .add_modifier(Modifier::DIM)
                    .add_modifier(Modifier::UNDERLINED),
                gloss: Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
                accent: bold.fg(Color::Yellow),
                alert: bold.fg(Color::Red),
                hint: Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
                selected: bold.fg(Color::Black).bg(Color::Yellow),
                chart: Style::default().fg(Color::Magenta),
            },
            Theme::Light => Self {
                base: Style::default().fg(Color::Black).bg(Color::White),
                correct: bold.fg(Color::Blue),
                incorrect: bold.fg(Color::White).bg(Color::Red),
                pending: Style::default().fg(Color::DarkGray),
                cursor: bold.fg(Color::Black).add_modifier(Modifier::UNDERLINED),
                gloss: Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::ITALIC),
                accent: bold.fg(Color::Blue),
                alert: bold.fg(Color::Red),
                hint: Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
                selected: bold.fg(Color::White).bg(Color::Blue),
                chart: Style::default().fg(Color::Blue),
            },
        }
    }
}
