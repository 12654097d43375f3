//! Browse list rendering
//!
//! Renders the main catalog view: a header with the listing title and active
//! profile, the scrollable item list with rating and favorite markers, and a
//! footer carrying either the search input, a status message, or key hints.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;
use crate::catalog::{CatalogItem, MediaKind};

/// Rows the list reserves for chrome (borders)
const LIST_CHROME_ROWS: u16 = 2;

/// Color for a vote average on the 0-10 scale
fn rating_color(vote_average: f64) -> Color {
    if vote_average >= 7.5 {
        Color::Green
    } else if vote_average >= 6.0 {
        Color::Yellow
    } else if vote_average > 0.0 {
        Color::Red
    } else {
        Color::DarkGray
    }
}

fn kind_label(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Movie => "Movies",
        MediaKind::Tv => "TV",
    }
}

/// Renders the browse view
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(5),    // Item list
            Constraint::Length(1), // Footer
        ])
        .split(area);

    render_header(frame, app, chunks[0]);
    render_list(frame, app, chunks[1]);
    render_footer(frame, app, chunks[2]);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![
        Span::styled(
            "reeldeck",
            Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            kind_label(app.media_kind),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw("  "),
        Span::styled(
            app.list_title.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ];

    if let Some(profile) = &app.active_profile {
        spans.push(Span::raw("  "));
        let style = if profile.is_kids {
            Style::default().fg(Color::Magenta)
        } else {
            Style::default().fg(Color::Green)
        };
        spans.push(Span::styled(format!("[{}]", profile.name), style));
    }

    if let Some(refreshed) = app.last_refresh {
        spans.push(Span::styled(
            format!("  refreshed {}", refreshed.format("%H:%M")),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let header = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, area);
}

fn render_list(frame: &mut Frame, app: &App, area: Rect) {
    let visible_rows = area.height.saturating_sub(LIST_CHROME_ROWS) as usize;
    let offset = scroll_offset(app.selected_index, app.items.len(), visible_rows);

    let mut lines = Vec::new();
    for (i, item) in app.items.iter().enumerate().skip(offset).take(visible_rows) {
        lines.push(item_line(app, item, i == app.selected_index));
    }

    if app.items.is_empty() {
        lines.push(Line::from(Span::styled(
            "Nothing here. Press 'r' to refresh or '/' to search.",
            Style::default().fg(Color::DarkGray),
        )));
    }

    let count_label = if app.items.is_empty() {
        String::from(" 0 titles ")
    } else {
        format!(" {}/{} titles ", app.selected_index + 1, app.items.len())
    };
    let list = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(count_label)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(list, area);
}

/// Keeps the selection visible: scrolls only when it would leave the window.
fn scroll_offset(selected: usize, total: usize, visible: usize) -> usize {
    if visible == 0 || total <= visible {
        return 0;
    }
    if selected < visible {
        0
    } else {
        (selected + 1 - visible).min(total - visible)
    }
}

fn item_line<'a>(app: &App, item: &'a CatalogItem, selected: bool) -> Line<'a> {
    let marker = if selected { "> " } else { "  " };
    let base_style = if selected {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    let mut spans = vec![Span::styled(marker, Style::default().fg(Color::Red))];

    if app.is_favorite(item.id, app.media_kind) {
        spans.push(Span::styled("♥ ", Style::default().fg(Color::Red)));
    } else {
        spans.push(Span::raw("  "));
    }

    spans.push(Span::styled(item.title.as_str(), base_style));

    if let Some(year) = item.year() {
        spans.push(Span::styled(
            format!(" ({})", year),
            Style::default().fg(Color::DarkGray),
        ));
    }

    if item.vote_average > 0.0 {
        spans.push(Span::styled(
            format!("  ★ {:.1}", item.vote_average),
            Style::default().fg(rating_color(item.vote_average)),
        ));
    }

    Line::from(spans)
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let line = if let Some(input) = &app.search_input {
        Line::from(vec![
            Span::styled("Search: ", Style::default().fg(Color::Yellow)),
            Span::raw(input.as_str()),
            Span::styled("▏", Style::default().fg(Color::Yellow)),
        ])
    } else if let Some(status) = &app.status {
        Line::from(Span::styled(
            status.as_str(),
            Style::default().fg(Color::Yellow),
        ))
    } else {
        Line::from(Span::styled(
            "↑/↓ select  Enter details  t movies/tv  c category  / search  f favorite  r refresh  ? help  q quit",
            Style::default().fg(Color::DarkGray),
        ))
    };

    frame.render_widget(Paragraph::new(line), area);
}
