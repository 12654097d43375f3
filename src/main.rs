//! reeldeck - Browse movie and TV metadata from the terminal
//!
//! A terminal UI application that browses a third-party media catalog with
//! viewing profiles and per-profile favorites, backed by a durable response
//! cache so repeat browsing stays off the network.

mod account;
mod app;
mod cache;
mod catalog;
mod cli;
mod ui;

use std::io;
use std::panic;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use account::{AuthClient, FavoritesClient, ProfilesClient, ServiceConfig, Session};
use app::{App, AppState};
use cache::MediaCache;
use catalog::{ApiConfig, CatalogClient};
use cli::{Cli, StartupConfig};

/// Sets up a panic hook that restores the terminal before printing the panic
/// message. This ensures the terminal is usable even if the application
/// panics.
fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Attempt to restore the terminal
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        // Call the original panic hook
        original_hook(panic_info);
    }));
}

/// Routes diagnostics to stderr so the alternate-screen UI on stdout is
/// untouched. Enabled through RUST_LOG.
fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();
}

/// Signs in with REELDECK_EMAIL / REELDECK_PASSWORD when both are set.
/// Without them the app runs in browse-only mode.
async fn sign_in_from_env(config: &ServiceConfig) -> Option<Session> {
    let (Ok(email), Ok(password)) = (
        std::env::var("REELDECK_EMAIL"),
        std::env::var("REELDECK_PASSWORD"),
    ) else {
        return None;
    };
    match AuthClient::new(config.clone())
        .sign_in(&email, &password)
        .await
    {
        Ok(session) => Some(session),
        Err(e) => {
            warn!(error = %e, "sign-in failed; continuing without an account");
            None
        }
    }
}

/// Renders the UI based on the current application state
fn render_ui(frame: &mut ratatui::Frame, app: &App) {
    match app.state {
        AppState::Loading => {
            render_loading(frame);
        }
        AppState::ProfileSelect => {
            ui::render_profile_select(frame, app);
        }
        AppState::Browse => {
            ui::render_browse(frame, app);
        }
        AppState::Detail => {
            ui::render_item_detail(frame, app);
        }
    }

    if app.show_help {
        ui::render_help_overlay(frame);
    }
}

/// Renders a loading message while data is being fetched
fn render_loading(frame: &mut ratatui::Frame) {
    use ratatui::{
        layout::{Alignment, Constraint, Direction, Layout},
        style::{Color, Style},
        widgets::Paragraph,
    };

    let area = frame.area();

    // Center the loading message vertically
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Length(3),
            Constraint::Percentage(45),
        ])
        .split(area);

    let loading_text = Paragraph::new("Loading catalog...")
        .style(Style::default().fg(Color::Cyan))
        .alignment(Alignment::Center);

    frame.render_widget(loading_text, chunks[1]);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let startup = StartupConfig::from_cli(&cli)?;

    setup_tracing();

    let cache = MediaCache::open_default();
    if cache.is_none() {
        warn!("no cache directory available; running without a response cache");
    }

    if startup.clear_cache {
        if let Some(cache) = &cache {
            cache.clear_all();
            cache.shutdown().await;
        }
        println!("Response cache cleared.");
        return Ok(());
    }

    // Assemble clients; the catalog client carries the cache
    let catalog_client = CatalogClient::new(ApiConfig::from_env(), cache.clone());
    let service_config = ServiceConfig::from_env();
    let session = sign_in_from_env(&service_config).await;
    let profiles_client = ProfilesClient::new(service_config.clone());
    let favorites_client = FavoritesClient::new(service_config);

    // Set up panic hook to restore terminal on crash
    setup_panic_hook();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app instance
    let mut app = App::new(
        catalog_client,
        profiles_client,
        favorites_client,
        session,
        startup,
    );

    // Initial render to show loading state
    terminal.draw(|f| render_ui(f, &app))?;

    // Trigger initial data load
    app.init().await;

    // Main event loop
    loop {
        // Render UI
        terminal.draw(|f| render_ui(f, &app))?;

        // Poll for keyboard events with 100ms timeout
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key);
            }
        }

        // Run any work the key handler queued
        if let Some(action) = app.pending.take() {
            app.apply(action).await;
        }

        // Check if we should quit
        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    // Stop cache timers and flush any pending snapshot
    if let Some(cache) = &cache {
        cache.shutdown().await;
    }

    Ok(())
}
