//! Catalog API endpoint configuration and URL building
//!
//! Credentials come from the environment; endpoints default to the TMDB v3
//! API but can be redirected for testing against a local server.

use super::{Category, MediaKind};

/// Default API base URL
const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";
/// Image base for cards/thumbnails
const DEFAULT_IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w500";
/// Image base for hero/backdrop images
const DEFAULT_IMAGE_ORIGINAL_BASE: &str = "https://image.tmdb.org/t/p/original";

/// Endpoint and credential configuration for the catalog API
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub image_base: String,
    pub image_original_base: String,
    /// Query-string API key
    pub api_key: String,
    /// Bearer token sent in the Authorization header
    pub auth_token: Option<String>,
}

impl ApiConfig {
    /// Builds a config from `REELDECK_API_KEY`, `REELDECK_API_TOKEN`, and an
    /// optional `REELDECK_API_BASE` override.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("REELDECK_API_BASE")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            image_base: DEFAULT_IMAGE_BASE.to_string(),
            image_original_base: DEFAULT_IMAGE_ORIGINAL_BASE.to_string(),
            api_key: std::env::var("REELDECK_API_KEY").unwrap_or_default(),
            auth_token: std::env::var("REELDECK_API_TOKEN").ok(),
        }
    }

    /// Creates a config pointing at a custom base URL, for tests.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            image_base: DEFAULT_IMAGE_BASE.to_string(),
            image_original_base: DEFAULT_IMAGE_ORIGINAL_BASE.to_string(),
            api_key: String::new(),
            auth_token: None,
        }
    }

    /// Listing URL for a category, before pagination.
    ///
    /// Fixed categories use their dedicated endpoints; genre categories go
    /// through discover with a genre filter.
    pub fn listing_url(&self, kind: MediaKind, category: Category) -> String {
        match category {
            Category::Genre(genre_id) => format!(
                "{}/discover/{}?api_key={}&language=en-US&with_genres={}&sort_by=popularity.desc",
                self.base_url,
                kind.token(),
                self.api_key,
                genre_id
            ),
            _ => {
                let endpoint = match (kind, category) {
                    (_, Category::Popular) => "popular",
                    (_, Category::TopRated) => "top_rated",
                    (MediaKind::Movie, _) => "now_playing",
                    (MediaKind::Tv, _) => "on_the_air",
                };
                format!(
                    "{}/{}/{}?api_key={}&language=en-US",
                    self.base_url,
                    kind.token(),
                    endpoint,
                    self.api_key
                )
            }
        }
    }

    /// Search URL for a query, before pagination.
    pub fn search_url(&self, kind: MediaKind, query: &str) -> String {
        format!(
            "{}/search/{}?api_key={}&language=en-US&query={}",
            self.base_url,
            kind.token(),
            self.api_key,
            urlencode(query)
        )
    }

    /// Genre list URL for a media kind.
    pub fn genres_url(&self, kind: MediaKind) -> String {
        format!(
            "{}/genre/{}/list?api_key={}&language=en-US",
            self.base_url,
            kind.token(),
            self.api_key
        )
    }

    /// Detail URL with the certification payload appended: release dates for
    /// movies, content ratings for shows.
    pub fn detail_url(&self, id: u64, kind: MediaKind) -> String {
        let append = match kind {
            MediaKind::Movie => "release_dates",
            MediaKind::Tv => "content_ratings",
        };
        format!(
            "{}/{}/{}?api_key={}&append_to_response={}",
            self.base_url,
            kind.token(),
            id,
            self.api_key,
            append
        )
    }

    /// Images URL for logo lookup, restricted to English/untagged artwork.
    pub fn images_url(&self, id: u64, kind: MediaKind) -> String {
        format!(
            "{}/{}/{}/images?api_key={}&include_image_language=en,null",
            self.base_url,
            kind.token(),
            id,
            self.api_key
        )
    }

    /// Credits URL for an item.
    pub fn credits_url(&self, id: u64, kind: MediaKind) -> String {
        format!(
            "{}/{}/{}/credits?api_key={}",
            self.base_url,
            kind.token(),
            id,
            self.api_key
        )
    }

    /// Recommendations URL for an item.
    pub fn recommendations_url(&self, id: u64, kind: MediaKind) -> String {
        format!(
            "{}/{}/{}/recommendations?api_key={}",
            self.base_url,
            kind.token(),
            id,
            self.api_key
        )
    }

    /// Full card-size image URL for a relative artwork path.
    pub fn card_image_url(&self, path: &str) -> String {
        format!("{}{}", self.image_base, path)
    }

    /// Full original-resolution image URL for hero/backdrop artwork.
    pub fn original_image_url(&self, path: &str) -> String {
        format!("{}{}", self.image_original_base, path)
    }

    /// Appends a page number to a listing or search URL.
    pub fn with_page(url: &str, page: u32) -> String {
        let separator = if url.contains('?') { '&' } else { '?' };
        format!("{}{}page={}", url, separator, page)
    }
}

/// Minimal percent-encoding for query values.
fn urlencode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b' ' => out.push_str("%20"),
            other => out.push_str(&format!("%{:02X}", other)),
        }
    }
    out
}
