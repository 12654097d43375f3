//! Core domain types for catalog metadata
//!
//! This module contains the data types used throughout the application for
//! representing catalog listings, item details, genres, and credits, plus the
//! media-kind/category model that drives both API requests and cache keys.

pub mod client;
pub mod config;

pub use client::{CatalogClient, CatalogError};
pub use config::ApiConfig;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// The two media kinds served by the catalog API
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    #[default]
    Movie,
    Tv,
}

impl MediaKind {
    /// Stable token used in API paths and cache keys.
    ///
    /// Tokens are closed and contain no `:`, so composed cache keys cannot
    /// collide across differently-shaped inputs.
    pub fn token(self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Tv => "tv",
        }
    }

    /// Parses a user-supplied kind name (CLI input).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "movie" | "movies" | "film" | "films" => Some(MediaKind::Movie),
            "tv" | "show" | "shows" | "series" => Some(MediaKind::Tv),
            _ => None,
        }
    }

    /// The other kind; used by the browse view's kind toggle.
    pub fn toggled(self) -> Self {
        match self {
            MediaKind::Movie => MediaKind::Tv,
            MediaKind::Tv => MediaKind::Movie,
        }
    }
}

/// A browsable catalog category
///
/// Fixed categories map to dedicated listing endpoints; `Genre` maps to the
/// discover endpoint filtered by genre id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Popular,
    TopRated,
    /// Movies currently in theatres (movie only)
    NowPlaying,
    /// Shows currently airing (tv only)
    OnAir,
    Genre(u32),
}

impl Category {
    /// Stable token used in cache keys. Genre categories use the bare
    /// numeric id, so no token can contain the key separator.
    pub fn token(self) -> String {
        match self {
            Category::Popular => "popular".to_string(),
            Category::TopRated => "top_rated".to_string(),
            Category::NowPlaying => "now_playing".to_string(),
            Category::OnAir => "on_air".to_string(),
            Category::Genre(id) => id.to_string(),
        }
    }

    /// Parses a user-supplied category name (CLI input). Numeric input is
    /// treated as a genre id.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "popular" => Some(Category::Popular),
            "top_rated" | "top" => Some(Category::TopRated),
            "now_playing" => Some(Category::NowPlaying),
            "on_air" | "airing" => Some(Category::OnAir),
            other => other.parse::<u32>().ok().map(Category::Genre),
        }
    }

    /// Human-readable heading for the browse view.
    ///
    /// For genre categories the caller supplies the genre name once the genre
    /// list has loaded; until then the numeric id is shown.
    pub fn display_name(&self, kind: MediaKind, genre_name: Option<&str>) -> String {
        let noun = match kind {
            MediaKind::Movie => "Films",
            MediaKind::Tv => "TV Shows",
        };
        match self {
            Category::Popular => format!("Popular {}", noun),
            Category::TopRated => format!("Top Rated {}", noun),
            Category::NowPlaying => "Now Playing".to_string(),
            Category::OnAir => "Currently Airing".to_string(),
            Category::Genre(id) => match genre_name {
                Some(name) => format!("{} {}", name, noun),
                None => format!("Genre {} {}", id, noun),
            },
        }
    }

    /// Whether this category exists for the given media kind.
    pub fn applies_to(&self, kind: MediaKind) -> bool {
        match self {
            Category::NowPlaying => kind == MediaKind::Movie,
            Category::OnAir => kind == MediaKind::Tv,
            _ => true,
        }
    }
}

/// One item in a catalog listing or search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Catalog API item identifier
    pub id: u64,
    /// Title (movies) or name (shows), unified
    pub title: String,
    /// Short synopsis; may be empty
    pub overview: String,
    /// Poster image path relative to the image base URL
    pub poster_path: Option<String>,
    /// Backdrop image path relative to the image base URL
    pub backdrop_path: Option<String>,
    /// Average vote on a 0-10 scale
    pub vote_average: f64,
    /// Release date (movies) or first air date (shows)
    pub release_date: Option<NaiveDate>,
    /// Genre ids attached to the item
    pub genre_ids: Vec<u32>,
}

impl CatalogItem {
    /// Release year for list display, if a date is known.
    pub fn year(&self) -> Option<i32> {
        self.release_date.map(|d| d.year())
    }
}

/// A genre id/name pair from the catalog API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: u32,
    pub name: String,
}

/// Full detail record for a single item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDetail {
    pub id: u64,
    pub title: String,
    pub overview: String,
    pub tagline: Option<String>,
    pub genres: Vec<Genre>,
    /// Runtime in minutes (movies)
    pub runtime_minutes: Option<u32>,
    /// Number of seasons (shows)
    pub season_count: Option<u32>,
    /// US content certification, e.g. "PG-13" or "TV-MA"
    pub certification: Option<String>,
    pub vote_average: f64,
    pub release_date: Option<NaiveDate>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
}

/// A top-billed cast member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastMember {
    pub name: String,
    pub character: Option<String>,
}
