//! Item detail rendering
//!
//! Renders the detail view for one title: headline facts, tagline and
//! overview, genres, top-billed cast, and recommendations. The body scrolls
//! with j/k via the view's scroll offset.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, DetailView};
use crate::catalog::{ItemDetail, MediaKind};

/// Renders the detail view
pub fn render(frame: &mut Frame, app: &App) {
    let Some(view) = &app.detail else {
        return;
    };
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(5),    // Body
            Constraint::Length(1), // Footer
        ])
        .split(area);

    render_title_bar(frame, app, view, chunks[0]);
    render_body(frame, view, chunks[1]);
    render_footer(frame, app, chunks[2]);
}

fn render_title_bar(frame: &mut Frame, app: &App, view: &DetailView, area: Rect) {
    let title = view
        .detail
        .as_ref()
        .map(|d| d.title.as_str())
        .unwrap_or("Details unavailable");

    let mut spans = vec![Span::styled(
        title,
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    )];

    if app.is_favorite(view.id, view.kind) {
        spans.push(Span::styled(" ♥", Style::default().fg(Color::Red)));
    }

    // The logo is artwork for richer front ends; here its presence is a hint
    if matches!(view.logo, Some(Some(_))) {
        spans.push(Span::styled(" ◈", Style::default().fg(Color::Cyan)));
    }

    let bar = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(bar, area);
}

fn render_body(frame: &mut Frame, view: &DetailView, area: Rect) {
    let mut lines = Vec::new();

    if let Some(detail) = &view.detail {
        lines.push(facts_line(detail, view.kind));
        lines.push(Line::from(""));

        if let Some(tagline) = &detail.tagline {
            lines.push(Line::from(Span::styled(
                tagline.as_str(),
                Style::default()
                    .fg(Color::Gray)
                    .add_modifier(Modifier::ITALIC),
            )));
            lines.push(Line::from(""));
        }

        if !detail.overview.is_empty() {
            lines.push(Line::from(detail.overview.as_str()));
            lines.push(Line::from(""));
        }

        if !detail.genres.is_empty() {
            let names: Vec<&str> = detail.genres.iter().map(|g| g.name.as_str()).collect();
            lines.push(labeled_line("Genres", names.join(", ")));
        }
        if let Some(url) = &view.poster_url {
            lines.push(labeled_line("Poster", url.clone()));
        }
        if let Some(url) = &view.backdrop_url {
            lines.push(labeled_line("Backdrop", url.clone()));
        }
        lines.push(Line::from(""));
    } else {
        lines.push(Line::from(Span::styled(
            "Could not load details for this title.",
            Style::default().fg(Color::Yellow),
        )));
        lines.push(Line::from(""));
    }

    if !view.cast.is_empty() {
        lines.push(section_heading("Cast"));
        for member in &view.cast {
            let entry = match &member.character {
                Some(character) => format!("  {} as {}", member.name, character),
                None => format!("  {}", member.name),
            };
            lines.push(Line::from(entry));
        }
        lines.push(Line::from(""));
    }

    if !view.recommendations.is_empty() {
        lines.push(section_heading("More Like This"));
        for rec in &view.recommendations {
            let mut spans = vec![Span::raw(format!("  {}", rec.title))];
            if let Some(year) = rec.year() {
                spans.push(Span::styled(
                    format!(" ({})", year),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            lines.push(Line::from(spans));
        }
    }

    let body = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        )
        .wrap(Wrap { trim: true })
        .scroll((view.scroll_offset, 0));
    frame.render_widget(body, area);
}

/// Year, runtime or seasons, certification, and rating on one line.
fn facts_line(detail: &ItemDetail, kind: MediaKind) -> Line<'static> {
    let mut facts = Vec::new();

    if let Some(date) = detail.release_date {
        facts.push(date.format("%Y").to_string());
    }
    match kind {
        MediaKind::Movie => {
            if let Some(runtime) = detail.runtime_minutes {
                facts.push(format!("{}h {:02}m", runtime / 60, runtime % 60));
            }
        }
        MediaKind::Tv => {
            if let Some(seasons) = detail.season_count {
                let plural = if seasons == 1 { "season" } else { "seasons" };
                facts.push(format!("{} {}", seasons, plural));
            }
        }
    }
    if let Some(certification) = &detail.certification {
        facts.push(certification.clone());
    }
    if detail.vote_average > 0.0 {
        facts.push(format!("★ {:.1}", detail.vote_average));
    }

    Line::from(Span::styled(
        facts.join("  •  "),
        Style::default().fg(Color::Cyan),
    ))
}

fn section_heading(text: &'static str) -> Line<'static> {
    Line::from(Span::styled(
        text,
        Style::default().add_modifier(Modifier::BOLD),
    ))
}

fn labeled_line(label: &'static str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{}: ", label), Style::default().fg(Color::DarkGray)),
        Span::raw(value),
    ])
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let line = if let Some(status) = &app.status {
        Line::from(Span::styled(
            status.as_str(),
            Style::default().fg(Color::Yellow),
        ))
    } else {
        Line::from(Span::styled(
            "j/k scroll  f favorite  Esc back  ? help  q quit",
            Style::default().fg(Color::DarkGray),
        ))
    };
    frame.render_widget(Paragraph::new(line), area);
}
