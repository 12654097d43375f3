//! Profile picker rendering
//!
//! Renders a centered list of the account's viewing profiles. Kids profiles
//! are marked; the selection is confirmed with Enter.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;

/// Renders the profile picker
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let height = (app.profiles.len() as u16 + 6).min(area.height);
    let overlay = centered_rect(44, height, area);

    let mut lines = vec![
        Line::from(Span::styled(
            "Who's watching?",
            Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    for (i, profile) in app.profiles.iter().enumerate() {
        let marker = if i == app.profile_index { "> " } else { "  " };
        let mut spans = vec![
            Span::styled(marker, Style::default().fg(Color::Red)),
            Span::styled(
                profile.name.as_str(),
                if i == app.profile_index {
                    Style::default().add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                },
            ),
        ];
        if profile.is_kids {
            spans.push(Span::styled(" (kids)", Style::default().fg(Color::Magenta)));
        }
        lines.push(Line::from(spans));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "↑/↓ select  Enter confirm  q quit",
        Style::default().fg(Color::DarkGray),
    )));

    let block = Block::default()
        .title(" Profiles ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Left);
    frame.render_widget(paragraph, overlay);
}

/// Helper function to create a centered rect
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((area.height.saturating_sub(height)) / 2),
            Constraint::Length(height),
            Constraint::Length((area.height.saturating_sub(height)) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length((area.width.saturating_sub(width)) / 2),
            Constraint::Length(width),
            Constraint::Length((area.width.saturating_sub(width)) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{FavoritesClient, Profile, ProfilesClient, ServiceConfig};
    use crate::app::AppState;
    use crate::catalog::{ApiConfig, CatalogClient};
    use crate::cli::StartupConfig;
    use ratatui::{backend::TestBackend, Terminal};

    #[test]
    fn test_profile_picker_renders_names_and_kids_marker() {
        let service = ServiceConfig {
            auth_base_url: String::new(),
            auth_api_key: String::new(),
            store_base_url: String::new(),
        };
        let mut app = App::new(
            CatalogClient::new(ApiConfig::with_base_url("http://127.0.0.1:1"), None),
            ProfilesClient::new(service.clone()),
            FavoritesClient::new(service),
            None,
            StartupConfig::default(),
        );
        app.state = AppState::ProfileSelect;
        app.profiles = vec![
            Profile {
                id: "p1".into(),
                name: "Ada".into(),
                avatar: "avatar2.png".into(),
                is_kids: false,
            },
            Profile {
                id: "p2".into(),
                name: "Kids".into(),
                avatar: "avatar5.png".into(),
                is_kids: true,
            },
        ];

        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| render(frame, &app)).unwrap();

        let content: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();

        assert!(content.contains("Who's watching?"));
        assert!(content.contains("Ada"));
        assert!(content.contains("(kids)"));
    }
}
