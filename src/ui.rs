//! Terminal UI rendering.
//!
//! All drawing logic lives here, separated from application state ([`App`])
//! and input handling ([`crate::input`]).  The renderer only ever sees the
//! rotator's [`DisplayFrame`], never the raw feed or the configuration.
//!
//! ## For contributors
//!
//! * The layout is a two-row split: the message panel on top and a one-line
//!   status bar at the bottom.
//! * The failure banner is drawn below the message, not instead of it.
//! * Colours and styles are defined inline. Feel free to extract them into
//!   constants or a theme struct if the palette grows.

use std::io::{self, Write};

use chrono::{DateTime, Utc};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::rotator::{Content, DisplayFrame, DisplayItem};
use crate::source::FeedItem;

/// Draw the complete UI for one frame.
///
/// Called once per tick from the main loop.  `now` is used for the relative
/// age of the current message.
pub fn draw(app: &App, frame: &mut Frame, now: DateTime<Utc>) {
    let [main_area, status_area] = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    draw_message_panel(&app.frame, frame, main_area, now);
    draw_status_bar(app, frame, status_area);
}

/// Render the current message, placeholder and failure banner.
fn draw_message_panel(display: &DisplayFrame, frame: &mut Frame, area: Rect, now: DateTime<Utc>) {
    let mut lines = content_lines(&display.content, now);

    if let Some(failure) = &display.failure {
        if !lines.is_empty() {
            lines.push(Line::raw(""));
        }
        lines.push(Line::from(Span::styled(
            format!("Service: {failure}"),
            Style::default().fg(Color::Red),
        )));
    }

    let panel = Paragraph::new(lines)
        .block(
            Block::default()
                .title(" Krisinformation ")
                .borders(Borders::ALL),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(panel, area);
}

fn content_lines(content: &Content, now: DateTime<Utc>) -> Vec<Line<'static>> {
    let dimmed = Style::default().fg(Color::DarkGray);

    match content {
        Content::Loading => vec![Line::styled("krisinfo loading feeds ...", dimmed)],
        Content::NoMessages => vec![Line::styled("No messages for the selected areas", dimmed)],
        Content::NothingRecent { oldest_days } => vec![Line::styled(
            format!("There are no messages younger than {oldest_days} days"),
            dimmed,
        )],
        Content::Blank => Vec::new(),
        Content::Item(item) => item_lines(item, now),
    }
}

fn item_lines(item: &DisplayItem, now: DateTime<Utc>) -> Vec<Line<'static>> {
    let dimmed = Style::default().fg(Color::DarkGray);
    let mut lines = Vec::new();

    let mut header = vec![Span::styled(
        item.published
            .map(|published| format_age(published, now))
            .unwrap_or_else(|| "no date".into()),
        dimmed,
    )];
    if let Some((index, total)) = item.position {
        header.push(Span::styled(format!("  #{}/{}", index + 1, total), dimmed));
    }
    lines.push(Line::from(header));

    lines.push(Line::styled(
        item.headline.clone(),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    ));

    if let Some(preamble) = &item.preamble {
        lines.push(Line::styled(preamble.clone(), Style::default().fg(Color::Gray)));
    }

    let mut footer = Vec::new();
    if !item.areas.is_empty() {
        footer.push(Span::styled("Area(s): ", dimmed.add_modifier(Modifier::BOLD)));
        footer.push(Span::styled(item.areas.join(", "), dimmed));
    }
    if let Some(sender) = &item.sender_name {
        if !footer.is_empty() {
            footer.push(Span::raw("  "));
        }
        footer.push(Span::styled("From: ", dimmed.add_modifier(Modifier::BOLD)));
        footer.push(Span::styled(sender.clone(), Style::default().fg(Color::Cyan)));
    }
    if !footer.is_empty() {
        lines.push(Line::raw(""));
        lines.push(Line::from(footer));
    }

    lines
}

/// Render the bottom status bar.
fn draw_status_bar(app: &App, frame: &mut Frame, area: Rect) {
    let status = Paragraph::new(Line::from(vec![
        Span::styled(" ", Style::default()),
        Span::styled(app.status.clone(), Style::default().fg(Color::Yellow)),
        Span::raw("  "),
        Span::styled(
            format!("{} messages", app.message_count()),
            Style::default().fg(Color::Green),
        ),
        Span::raw("  q: quit  n: next  r: refresh"),
    ]));
    frame.render_widget(status, area);
}

/// Plain-text listing used by `--once`: one block per message.
pub fn write_plain<W: Write>(
    out: &mut W,
    items: &[FeedItem],
    show_description: bool,
    now: DateTime<Utc>,
) -> io::Result<()> {
    for item in items {
        let age = item
            .published
            .map(|published| format_age(published, now))
            .unwrap_or_else(|| "no date".into());
        writeln!(out, "[{age}] {}", item.headline)?;

        if show_description {
            if let Some(preamble) = item.preamble.as_deref().filter(|p| !p.is_empty()) {
                writeln!(out, "    {preamble}")?;
            }
        }
        if !item.areas.is_empty() {
            let areas: Vec<&str> = item.areas.iter().map(|a| a.description.as_str()).collect();
            writeln!(out, "    Area(s): {}", areas.join(", "))?;
        }
        if let Some(sender) = item.sender_name.as_deref().filter(|s| !s.is_empty()) {
            writeln!(out, "    From: {sender}")?;
        }
    }
    Ok(())
}

/// Human-friendly age of a timestamp, e.g. "5 minutes ago".
pub fn format_age(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let age = now - then;
    if age.num_seconds() < 0 {
        return "in the future".into();
    }

    let plural = |n: i64, unit: &str| {
        if n == 1 {
            format!("1 {unit} ago")
        } else {
            format!("{n} {unit}s ago")
        }
    };

    match age {
        a if a.num_minutes() < 1 => "just now".into(),
        a if a.num_hours() < 1 => plural(a.num_minutes(), "minute"),
        a if a.num_days() < 1 => plural(a.num_hours(), "hour"),
        a => plural(a.num_days(), "day"),
    }
}
