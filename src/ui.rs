pub mod charting;
pub mod theme;

use std::mem;

use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Clear, Dataset, GraphType, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, AppState};
use crate::commands::{Command, Palette};
use crate::engine::Alert;
use crate::keystroke::NEWLINE;
use crate::session::Rejection;
use crate::time_series;
use theme::Styles;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;
const PALETTE_WIDTH: u16 = 44;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let styles = Styles::for_theme(self.theme());
        Block::default().style(styles.base).render(area, buf);

        match self.state() {
            AppState::Typing => render_typing(self, &styles, area, buf),
            AppState::Results => render_results(self, &styles, area, buf),
        }

        if let Some(palette) = self.engine.dispatcher().palette() {
            render_palette(palette, &styles, area, buf);
        }
    }
}

/// How a character is drawn in status lines.
fn visible(c: char) -> String {
    match c {
        NEWLINE => "↵".to_owned(),
        ' ' => "␣".to_owned(),
        '\t' => "⇥".to_owned(),
        c => c.to_string(),
    }
}

fn render_typing(app: &App, styles: &Styles, area: Rect, buf: &mut Buffer) {
    let session = app.engine.session();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // status
            Constraint::Length(1),
            Constraint::Min(3), // text
            Constraint::Length(1), // gloss
            Constraint::Length(1), // alert
            Constraint::Length(1), // legend
        ])
        .split(area);

    let clock = match session.seconds_remaining() {
        Some(left) => format!("{left}s left"),
        None => format!("{}s", session.elapsed_seconds()),
    };
    let status = Line::from(vec![
        Span::styled(app.source_label(), styles.accent),
        Span::raw("   "),
        Span::styled(clock, styles.pending),
        Span::raw("   "),
        Span::styled(format!("{} wpm", session.wpm()), styles.pending),
        Span::raw("   "),
        Span::styled(format!("{}% acc", session.accuracy()), styles.pending),
    ]);
    Paragraph::new(status)
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    let (lines, width) = target_lines(app, styles);
    let fits_on_one_line = lines.len() <= 1 && width < chunks[2].width as usize;
    Paragraph::new(lines)
        .alignment(if fits_on_one_line {
            // a short prompt reads best centered
            Alignment::Center
        } else {
            Alignment::Left
        })
        .wrap(Wrap { trim: false })
        .render(chunks[2], buf);

    if let Some(gloss) = app.engine.gloss_at_cursor() {
        Paragraph::new(Span::styled(gloss.to_owned(), styles.gloss))
            .alignment(Alignment::Center)
            .render(chunks[3], buf);
    }

    if let Some(alert) = app.engine.alert() {
        let message = match alert {
            Alert::Mistake(expected) => format!("mistake: expected {}", visible(expected)),
            Alert::Rejected(Rejection::Locked) => "fix the mistake first (backspace)".to_owned(),
            Alert::Rejected(Rejection::CommittedHistory) => {
                "correct text cannot be erased".to_owned()
            }
        };
        Paragraph::new(Span::styled(message, styles.alert))
            .alignment(Alignment::Center)
            .render(chunks[4], buf);
    }

    let legend = if session.is_started() || app.engine.dispatcher().is_input_focused() {
        "(esc) reset / (ctrl+f) finish / (ctrl+k) commands"
    } else {
        "start typing or press (enter) / (ctrl+k) commands"
    };
    Paragraph::new(Span::styled(legend, styles.hint)).render(chunks[5], buf);
}

/// The current lap of the target text as styled lines, plus its plain width.
fn target_lines(app: &App, styles: &Styles) -> (Vec<Line<'static>>, usize) {
    let session = app.engine.session();
    let target = session.target();
    let input = session.input();
    let cycle = session.cycle_len().max(1);
    let start = (session.last_accepted_correct_position() / cycle) * cycle;

    let mut lines = Vec::new();
    let mut spans = Vec::new();
    let mut plain = String::new();

    for (idx, &expected) in target.iter().enumerate().skip(start) {
        let (shown, style) = match input.get(idx) {
            Some(&typed) if typed == expected => (expected, styles.correct),
            Some(&typed) => (typed, styles.incorrect),
            None if idx == input.len() => (expected, styles.cursor),
            None if app.engine.gloss_at(idx).is_some() => {
                (expected, styles.pending.add_modifier(Modifier::ITALIC))
            }
            None => (expected, styles.pending),
        };

        let text = match shown {
            NEWLINE => "↵".to_owned(),
            ' ' if style == styles.incorrect => "·".to_owned(),
            c => c.to_string(),
        };
        plain.push(shown);
        spans.push(Span::styled(text, style));

        // only a newline the typist still owes (or got right) ends a row
        if expected == NEWLINE && shown == NEWLINE {
            lines.push(Line::from(mem::take(&mut spans)));
        }
    }
    if !spans.is_empty() {
        lines.push(Line::from(spans));
    }

    (lines, plain.width())
}

fn render_results(app: &App, styles: &Styles, area: Rect, buf: &mut Buffer) {
    let Some(result) = app.engine.result() else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),    // chart
            Constraint::Length(1), // stats
            Constraint::Length(1), // session mistakes
            Constraint::Length(1), // trouble keys
            Constraint::Length(1), // padding
            Constraint::Length(1), // legend
        ])
        .split(area);

    let samples = time_series::samples(&result.wpm_history);
    let (overall_duration, highest_wpm) =
        charting::compute_chart_params(&samples, app.config().time_limit());

    let tuples: Vec<(f64, f64)> = samples.iter().map(|&p| p.into()).collect();
    let datasets = vec![Dataset::default()
        .marker(ratatui::symbols::Marker::Braille)
        .style(styles.chart)
        .graph_type(GraphType::Line)
        .data(&tuples)];

    let bold = styles.accent;
    let chart = Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("seconds")
                .bounds([0.0, overall_duration])
                .labels(vec![
                    Span::styled("0", bold),
                    Span::styled(charting::format_label(overall_duration), bold),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("wpm")
                .bounds([0.0, highest_wpm])
                .labels(vec![
                    Span::styled("0", bold),
                    Span::styled(charting::format_label(highest_wpm), bold),
                ]),
        );
    chart.render(chunks[0], buf);

    Paragraph::new(Span::styled(
        format!(
            "{} wpm   {}% acc   {:.2} sd   {}s",
            result.wpm,
            result.accuracy,
            result.consistency(),
            result.elapsed_secs
        ),
        bold,
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    let mistakes = if result.error_map.is_empty() {
        "no mistakes".to_owned()
    } else {
        format!(
            "mistakes: {}",
            result
                .errors_by_frequency()
                .iter()
                .map(|&(c, n)| format!("{}×{n}", visible(c)))
                .join("  ")
        )
    };
    Paragraph::new(Span::styled(mistakes, styles.alert))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

    if !app.high_errors().is_empty() {
        let trouble = format!(
            "trouble keys overall: {}",
            app.high_errors()
                .iter()
                .map(|&(c, n)| format!("{}×{n}", visible(c)))
                .join("  ")
        );
        Paragraph::new(Span::styled(trouble, styles.hint))
            .alignment(Alignment::Center)
            .render(chunks[3], buf);
    }

    Paragraph::new(Span::styled(
        "(esc) retry / (ctrl+n) new text / (ctrl+k) commands / (ctrl+q) quit",
        styles.hint,
    ))
    .render(chunks[5], buf);
}

fn render_palette(palette: &Palette, styles: &Styles, area: Rect, buf: &mut Buffer) {
    let matches = palette.matches();
    let height = (matches.len().max(1) as u16 + 4).min(area.height);
    let popup = centered_rect(PALETTE_WIDTH.min(area.width), height, area);

    Clear.render(popup, buf);
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Commands")
        .style(styles.base);
    let inner = block.inner(popup);
    block.render(popup, buf);

    let mut lines = vec![
        Line::from(vec![
            Span::styled("> ", styles.accent),
            Span::raw(palette.query().to_owned()),
        ]),
        Line::default(),
    ];
    if matches.is_empty() {
        lines.push(Line::from(Span::styled("no matching command", styles.hint)));
    }
    let label_width = inner.width.saturating_sub(10) as usize;
    for (idx, command) in matches.iter().enumerate() {
        let style = if idx == palette.selected_index() {
            styles.selected
        } else {
            styles.base
        };
        lines.push(Line::from(Span::styled(
            format!("{:<label_width$}{}", command.label(), chord_hint(*command)),
            style,
        )));
    }

    Paragraph::new(lines).render(inner, buf);
}

fn chord_hint(command: Command) -> String {
    command
        .chord()
        .map(|chord| chord.to_string())
        .unwrap_or_default()
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    }
}
