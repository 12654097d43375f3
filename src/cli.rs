//! Command-line interface parsing
//!
//! Handles CLI arguments using clap: the initial media kind and category for
//! the browse view, and a --clear-cache maintenance flag that empties the
//! response cache and exits.

use clap::Parser;
use thiserror::Error;

use crate::catalog::{Category, MediaKind};

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The media kind is not recognized
    #[error("Invalid media kind: '{0}'. Valid kinds: movie, tv")]
    InvalidMediaKind(String),

    /// The category name is not recognized
    #[error(
        "Invalid category: '{0}'. Valid categories: popular, top-rated, now-playing, on-air, or a genre id"
    )]
    InvalidCategory(String),

    /// The category exists but not for the requested media kind
    #[error("Category '{0}' is not available for {1}")]
    CategoryKindMismatch(String, &'static str),
}

/// reeldeck - Browse movie and TV metadata from the terminal
#[derive(Parser, Debug)]
#[command(name = "reeldeck")]
#[command(about = "Browse movie and TV metadata, profiles, and favorites")]
#[command(version)]
pub struct Cli {
    /// Media kind to open with: movie (default) or tv
    #[arg(long, value_name = "KIND")]
    pub media: Option<String>,

    /// Category to open with: popular (default), top-rated, now-playing,
    /// on-air, or a numeric genre id
    #[arg(long, value_name = "CATEGORY")]
    pub category: Option<String>,

    /// Empty the response cache (memory and disk) and exit
    #[arg(long)]
    pub clear_cache: bool,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone)]
pub struct StartupConfig {
    /// Media kind the browse view opens with
    pub media_kind: MediaKind,
    /// Category the browse view opens with
    pub category: Category,
    /// Whether to clear the cache and exit instead of starting the UI
    pub clear_cache: bool,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            media_kind: MediaKind::Movie,
            category: Category::Popular,
            clear_cache: false,
        }
    }
}

/// Parses a media kind string argument.
pub fn parse_media_arg(s: &str) -> Result<MediaKind, CliError> {
    MediaKind::from_str(s).ok_or_else(|| CliError::InvalidMediaKind(s.to_string()))
}

/// Parses a category string argument.
pub fn parse_category_arg(s: &str) -> Result<Category, CliError> {
    Category::from_str(s).ok_or_else(|| CliError::InvalidCategory(s.to_string()))
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let mut config = StartupConfig {
            clear_cache: cli.clear_cache,
            ..Default::default()
        };

        if let Some(media) = &cli.media {
            config.media_kind = parse_media_arg(media)?;
        }
        if let Some(category) = &cli.category {
            config.category = parse_category_arg(category)?;
            if !config.category.applies_to(config.media_kind) {
                return Err(CliError::CategoryKindMismatch(
                    category.clone(),
                    config.media_kind.token(),
                ));
            }
        }

        Ok(config)
    }
}
