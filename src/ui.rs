use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use coach::schedule::Phase;
use coach::session::Role;

use crate::{App, NoticeLevel};

const SIDEBAR_WIDTH: u16 = 40;
const INPUT_PREFIX: &str = "> ";

const KEY_HELP: [(&str, &str); 9] = [
    ("Enter", "ask"),
    ("Tab", "next subject"),
    ("^T", "start / stop"),
    ("^R", "reset finished"),
    ("^L", "clear chat"),
    ("^V", "voice"),
    ("^O", "concise"),
    ("PgUp/Dn", "scroll"),
    ("Esc", "quit"),
];

pub fn ui(app: &mut App, f: &mut Frame) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)])
        .split(f.area());

    render_sidebar(app, f, columns[0]);
    render_main(app, f, columns[1]);
}

fn render_sidebar(app: &App, f: &mut Frame, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Profile
            Constraint::Length(5), // Schedule
            Constraint::Length(4), // Settings
            Constraint::Length(3), // Subject
            Constraint::Min(0),    // Keys
        ])
        .split(area);

    let bold = Style::default().add_modifier(Modifier::BOLD);

    let profile = Paragraph::new(vec![
        Line::from(Span::styled(app.config.profile.name.clone(), bold)),
        Line::from(app.config.profile.class.to_string()),
    ])
    .block(Block::default().borders(Borders::ALL).title("Profile"));
    f.render_widget(profile, chunks[0]);

    render_schedule(app, f, chunks[1]);

    let check = |on: bool| if on { "[x]" } else { "[ ]" };
    let settings = Paragraph::new(vec![
        Line::from(format!(
            "{} Voice ({} Accent)",
            check(app.config.voice),
            app.config.voice_locale.accent()
        )),
        Line::from(format!("{} Concise / Revision", check(app.config.concise))),
    ])
    .block(Block::default().borders(Borders::ALL).title("Settings"));
    f.render_widget(settings, chunks[2]);

    let subject = Paragraph::new(Line::from(vec![
        Span::raw("< "),
        Span::styled(app.session.subject.to_string(), bold.fg(Color::Cyan)),
        Span::raw(" >"),
    ]))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).title("Subject"));
    f.render_widget(subject, chunks[3]);

    let keys: Vec<Line> = KEY_HELP
        .iter()
        .map(|(k, action)| {
            Line::from(vec![
                Span::styled(format!("{:<8}", k), Style::default().fg(Color::Yellow)),
                Span::raw(*action),
            ])
        })
        .collect();
    let keys = Paragraph::new(keys).block(Block::default().borders(Borders::ALL).title("Keys"));
    f.render_widget(keys, chunks[4]);
}

fn render_schedule(app: &App, f: &mut Frame, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Schedule");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let plan = &app.session.plan;
    let status = match app.status() {
        Ok(status) => status,
        Err(e) => {
            let err = Paragraph::new(format!("Timer error: {}", e))
                .style(Style::default().fg(Color::Red))
                .wrap(Wrap { trim: true });
            f.render_widget(err, inner);
            return;
        }
    };

    let remaining = status.remaining_minutes(plan).unwrap_or(0);
    let (headline, style, hint) = match status.phase {
        Phase::NotStarted => (
            plan.goal_summary(),
            Style::default().fg(Color::Blue),
            "^T start study session",
        ),
        Phase::Studying => (
            format!("STUDY TIME ({}m left)", remaining),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            "^T stop",
        ),
        Phase::OnBreak => (
            format!("BREAK TIME ({}m left)", remaining),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            "^T stop",
        ),
        Phase::Finished => (
            "Session Complete!".to_string(),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            "^R reset  ^T stop",
        ),
    };
    f.render_widget(Paragraph::new(Span::styled(headline, style)), rows[0]);

    if let Some(progress) = status.progress(plan) {
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(Color::Green))
            .ratio(progress)
            .label(format!("{}/{}m", status.elapsed_in_phase, plan.study_minutes));
        f.render_widget(gauge, rows[1]);
    }

    let hint = Paragraph::new(Span::styled(
        hint,
        Style::default().add_modifier(Modifier::DIM),
    ));
    f.render_widget(hint, rows[2]);
}

fn render_main(app: &mut App, f: &mut Frame, area: Rect) {
    let on_break = matches!(app.status(), Ok(status) if status.phase == Phase::OnBreak);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),                            // Title
            Constraint::Length(if on_break { 3 } else { 0 }), // Break banner
            Constraint::Min(3),                               // Chat
            Constraint::Length(1),                            // Notice
            Constraint::Length(3),                            // Input
        ])
        .split(area);

    let title = Paragraph::new(Span::styled(
        "The Commerce Coach",
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    if on_break {
        let banner = Paragraph::new("BREAK TIME! Step away from the screen.")
            .style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(banner, chunks[1]);
    }

    render_chat(app, f, chunks[2]);

    if let Some(notice) = &app.notice {
        let color = match notice.level {
            NoticeLevel::Info => Color::Blue,
            NoticeLevel::Warning => Color::Yellow,
            NoticeLevel::Error => Color::Red,
        };
        f.render_widget(
            Paragraph::new(Span::styled(notice.text.clone(), Style::default().fg(color))),
            chunks[3],
        );
    }

    render_input(app, f, chunks[4]);
}

fn render_chat(app: &mut App, f: &mut Frame, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Chat");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let width = inner.width as usize;
    let mut lines: Vec<Line> = Vec::new();
    for message in &app.session.messages {
        let (label, color) = match message.role {
            Role::User => ("You", Color::Yellow),
            Role::Assistant => ("Coach", Color::Cyan),
        };
        lines.push(Line::from(Span::styled(
            label,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
        lines.extend(wrap_text(&message.content, width).into_iter().map(Line::from));
        lines.push(Line::default());
    }
    if app.pending {
        lines.push(Line::from(Span::styled(
            "Thinking...",
            Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM),
        )));
    }

    let height = inner.height as usize;
    let max_scroll = lines.len().saturating_sub(height);
    if app.scroll_back as usize > max_scroll {
        app.scroll_back = max_scroll as u16;
    }
    let start = max_scroll - app.scroll_back as usize;
    let visible: Vec<Line> = lines.into_iter().skip(start).take(height).collect();

    f.render_widget(Paragraph::new(visible), inner);
}

fn render_input(app: &App, f: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Ask a doubt...");
    let inner = block.inner(area);
    f.render_widget(block, area);

    // keep the tail of long input visible
    let available = (inner.width as usize).saturating_sub(INPUT_PREFIX.width() + 1);
    let mut shown = app.input.as_str();
    while shown.width() > available {
        let mut chars = shown.chars();
        chars.next();
        shown = chars.as_str();
    }

    f.render_widget(Paragraph::new(format!("{}{}", INPUT_PREFIX, shown)), inner);
    if inner.width > 0 && inner.height > 0 {
        let x = inner.x + (INPUT_PREFIX.width() + shown.width()) as u16;
        f.set_cursor_position((x.min(inner.right().saturating_sub(1)), inner.y));
    }
}

/// Word-wrap text to `width` display columns. Words wider than a line are
/// broken mid-word; blank lines are kept.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for raw in text.lines() {
        let mut current = String::new();
        let mut current_width = 0;

        for word in raw.split_whitespace() {
            let word_width = word.width();
            if current_width > 0 && current_width + 1 + word_width > width {
                lines.push(std::mem::take(&mut current));
                current_width = 0;
            }
            if current_width > 0 {
                current.push(' ');
                current_width += 1;
            }
            if word_width <= width.saturating_sub(current_width) {
                current.push_str(word);
                current_width += word_width;
                continue;
            }
            for c in word.chars() {
                let char_width = c.width().unwrap_or(0);
                if current_width > 0 && current_width + char_width > width {
                    lines.push(std::mem::take(&mut current));
                    current_width = 0;
                }
                current.push(c);
                current_width += char_width;
            }
        }
        lines.push(current);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
