//! Catalog API client
//!
//! Fetches listings, search results, details, artwork, credits, and
//! recommendations from the catalog API and parses them into our domain
//! types. Listings, details, and logo lookups are cache-aside: the response
//! cache is consulted before any request goes out, and successful responses
//! are written back immediately.

use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use super::config::ApiConfig;
use super::{CastMember, CatalogItem, Category, Genre, ItemDetail, MediaKind};
use crate::cache::MediaCache;

/// Pages fetched per listing or search (5 pages of 20 = up to 100 items)
const PAGES_TO_FETCH: u32 = 5;

/// Cast members shown in the detail view
const CAST_LIMIT: usize = 10;

/// Recommendations shown in the detail view
const RECOMMENDATION_LIMIT: usize = 6;

/// Longest overview a recommendation may carry and still be shown
const RECOMMENDATION_OVERVIEW_LIMIT: usize = 300;

/// Errors that can occur when fetching catalog data
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Client for the catalog metadata API
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    config: ApiConfig,
    cache: Option<MediaCache>,
}

impl CatalogClient {
    /// Creates a client. Passing a cache enables cache-aside reads for
    /// listings, details, and logo lookups; `None` always hits the network.
    pub fn new(config: ApiConfig, cache: Option<MediaCache>) -> Self {
        Self {
            client: Client::new(),
            config,
            cache,
        }
    }

    /// Fetches a catalog listing, serving from the cache when fresh.
    pub async fn fetch_catalog(
        &self,
        kind: MediaKind,
        category: Category,
    ) -> Result<Vec<CatalogItem>, CatalogError> {
        if let Some(cache) = &self.cache {
            if let Some(items) = cache.catalog(kind, category) {
                debug!(kind = kind.token(), category = %category.token(), "catalog cache hit");
                return Ok(items);
            }
        }
        self.refresh_catalog(kind, category).await
    }

    /// Fetches a catalog listing from the network unconditionally, writing
    /// the result back into the cache.
    pub async fn refresh_catalog(
        &self,
        kind: MediaKind,
        category: Category,
    ) -> Result<Vec<CatalogItem>, CatalogError> {
        let base = self.config.listing_url(kind, category);
        let items = self.fetch_pages(&base).await?;
        if let Some(cache) = &self.cache {
            cache.store_catalog(kind, category, items.clone());
        }
        Ok(items)
    }

    /// Searches for items matching a query. Search results are never cached;
    /// only (kind, category) listings enter the cache.
    pub async fn search(
        &self,
        kind: MediaKind,
        query: &str,
    ) -> Result<Vec<CatalogItem>, CatalogError> {
        let base = self.config.search_url(kind, query);
        self.fetch_pages(&base).await
    }

    /// Fetches the genre list for a media kind.
    pub async fn fetch_genres(&self, kind: MediaKind) -> Result<Vec<Genre>, CatalogError> {
        let text = self.get_text(&self.config.genres_url(kind)).await?;
        let parsed: RawGenreList = serde_json::from_str(&text)?;
        Ok(parsed.genres)
    }

    /// Fetches the full detail record for an item, serving from the cache
    /// when fresh.
    pub async fn fetch_detail(
        &self,
        id: u64,
        kind: MediaKind,
    ) -> Result<ItemDetail, CatalogError> {
        if let Some(cache) = &self.cache {
            if let Some(detail) = cache.detail(id, kind) {
                debug!(id, kind = kind.token(), "detail cache hit");
                return Ok(detail);
            }
        }
        let text = self.get_text(&self.config.detail_url(id, kind)).await?;
        let raw: RawDetail = serde_json::from_str(&text)?;
        let detail = raw.into_detail(kind);
        if let Some(cache) = &self.cache {
            cache.store_detail(id, kind, detail.clone());
        }
        Ok(detail)
    }

    /// Looks up an item's logo path, serving from the cache when fresh.
    /// A "no logo" result is cached as well, so the miss is not refetched.
    pub async fn fetch_logo(
        &self,
        id: u64,
        kind: MediaKind,
    ) -> Result<Option<String>, CatalogError> {
        if let Some(cache) = &self.cache {
            if let Some(logo) = cache.artwork(id, kind) {
                debug!(id, kind = kind.token(), "artwork cache hit");
                return Ok(logo);
            }
        }
        let text = self.get_text(&self.config.images_url(id, kind)).await?;
        let raw: RawImages = serde_json::from_str(&text)?;
        let logo = pick_logo(&raw);
        if let Some(cache) = &self.cache {
            cache.store_artwork(id, kind, logo.clone());
        }
        Ok(logo)
    }

    /// Fetches top-billed cast for an item. Not cached.
    pub async fn fetch_credits(
        &self,
        id: u64,
        kind: MediaKind,
    ) -> Result<Vec<CastMember>, CatalogError> {
        let text = self.get_text(&self.config.credits_url(id, kind)).await?;
        let raw: RawCredits = serde_json::from_str(&text)?;
        Ok(raw
            .cast
            .into_iter()
            .take(CAST_LIMIT)
            .map(|c| CastMember {
                name: c.name,
                character: c.character.filter(|s| !s.is_empty()),
            })
            .collect())
    }

    /// Fetches recommendations for an item, keeping only entries with a
    /// short non-empty overview. Not cached.
    pub async fn fetch_recommendations(
        &self,
        id: u64,
        kind: MediaKind,
    ) -> Result<Vec<CatalogItem>, CatalogError> {
        let text = self
            .get_text(&self.config.recommendations_url(id, kind))
            .await?;
        let parsed = parse_page(&text)?;
        Ok(filter_recommendations(parsed))
    }

    /// Absolute URL for a card-size artwork path.
    pub fn poster_url(&self, path: &str) -> String {
        self.config.card_image_url(path)
    }

    /// Absolute URL for an original-resolution backdrop path.
    pub fn backdrop_url(&self, path: &str) -> String {
        self.config.original_image_url(path)
    }

    /// Fetches PAGES_TO_FETCH pages of a listing in parallel, flattening and
    /// deduplicating by item id while preserving order.
    async fn fetch_pages(&self, base_url: &str) -> Result<Vec<CatalogItem>, CatalogError> {
        let mut requests = Vec::new();
        for page in 1..=PAGES_TO_FETCH {
            let url = ApiConfig::with_page(base_url, page);
            requests.push(async move { self.get_text(&url).await });
        }
        let pages: Vec<Result<String, CatalogError>> =
            futures::future::join_all(requests).await;

        let mut items = Vec::new();
        for page in pages {
            items.extend(parse_page(&page?)?);
        }
        Ok(dedup_by_id(items))
    }

    async fn get_text(&self, url: &str) -> Result<String, CatalogError> {
        let mut request = self.client.get(url).header("accept", "application/json");
        if let Some(token) = &self.config.auth_token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        Ok(response.text().await?)
    }
}

/// Parses one page of listing/search/recommendation results.
fn parse_page(text: &str) -> Result<Vec<CatalogItem>, CatalogError> {
    let parsed: RawPage = serde_json::from_str(text)?;
    Ok(parsed
        .results
        .into_iter()
        .filter_map(RawItem::into_item)
        .collect())
}

/// Removes duplicate items (the same id can appear on adjacent pages),
/// keeping the first occurrence.
fn dedup_by_id(items: Vec<CatalogItem>) -> Vec<CatalogItem> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.id))
        .collect()
}

/// Recommendation filter: non-empty overview of bounded length, first
/// RECOMMENDATION_LIMIT entries.
fn filter_recommendations(items: Vec<CatalogItem>) -> Vec<CatalogItem> {
    items
        .into_iter()
        .filter(|item| {
            !item.overview.is_empty() && item.overview.len() <= RECOMMENDATION_OVERVIEW_LIMIT
        })
        .take(RECOMMENDATION_LIMIT)
        .collect()
}

/// First English/untagged logo in the images payload.
fn pick_logo(images: &RawImages) -> Option<String> {
    images.logos.first().and_then(|logo| logo.file_path.clone())
}

/// Parses a catalog date, treating empty strings as absent.
fn parse_date(raw: Option<String>) -> Option<NaiveDate> {
    let raw = raw?;
    if raw.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").ok()
}

/// One page of listing/search results
#[derive(Debug, Deserialize)]
struct RawPage {
    #[serde(default)]
    results: Vec<RawItem>,
}

/// A raw listing item; movies carry `title`/`release_date`, shows carry
/// `name`/`first_air_date`
#[derive(Debug, Deserialize)]
struct RawItem {
    id: u64,
    title: Option<String>,
    name: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    vote_average: Option<f64>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    #[serde(default)]
    genre_ids: Vec<u32>,
}

impl RawItem {
    /// Unifies the movie/show field split; items with no usable title are
    /// dropped.
    fn into_item(self) -> Option<CatalogItem> {
        let title = self.title.or(self.name)?;
        Some(CatalogItem {
            id: self.id,
            title,
            overview: self.overview.unwrap_or_default(),
            poster_path: self.poster_path,
            backdrop_path: self.backdrop_path,
            vote_average: self.vote_average.unwrap_or(0.0),
            release_date: parse_date(self.release_date.or(self.first_air_date)),
            genre_ids: self.genre_ids,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawGenreList {
    #[serde(default)]
    genres: Vec<Genre>,
}

/// Full detail payload with the appended certification data
#[derive(Debug, Deserialize)]
struct RawDetail {
    id: u64,
    title: Option<String>,
    name: Option<String>,
    overview: Option<String>,
    tagline: Option<String>,
    #[serde(default)]
    genres: Vec<Genre>,
    runtime: Option<u32>,
    number_of_seasons: Option<u32>,
    vote_average: Option<f64>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    release_dates: Option<RawReleaseDates>,
    content_ratings: Option<RawContentRatings>,
}

impl RawDetail {
    fn into_detail(self, kind: MediaKind) -> ItemDetail {
        let certification = extract_certification(&self, kind);
        ItemDetail {
            id: self.id,
            title: self.title.or(self.name).unwrap_or_default(),
            overview: self.overview.unwrap_or_default(),
            tagline: self.tagline.filter(|t| !t.is_empty()),
            genres: self.genres,
            runtime_minutes: self.runtime,
            season_count: self.number_of_seasons,
            certification: Some(certification),
            vote_average: self.vote_average.unwrap_or(0.0),
            release_date: parse_date(self.release_date.or(self.first_air_date)),
            poster_path: self.poster_path,
            backdrop_path: self.backdrop_path,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawReleaseDates {
    #[serde(default)]
    results: Vec<RawReleaseDatesEntry>,
}

#[derive(Debug, Deserialize)]
struct RawReleaseDatesEntry {
    iso_3166_1: String,
    #[serde(default)]
    release_dates: Vec<RawReleaseStamp>,
}

#[derive(Debug, Deserialize)]
struct RawReleaseStamp {
    #[serde(default)]
    certification: String,
}

#[derive(Debug, Deserialize)]
struct RawContentRatings {
    #[serde(default)]
    results: Vec<RawContentRatingEntry>,
}

#[derive(Debug, Deserialize)]
struct RawContentRatingEntry {
    iso_3166_1: String,
    rating: Option<String>,
}

/// US certification with "NR"/"TV-NR" fallback when nothing usable exists.
fn extract_certification(detail: &RawDetail, kind: MediaKind) -> String {
    match kind {
        MediaKind::Tv => detail
            .content_ratings
            .as_ref()
            .and_then(|ratings| {
                ratings
                    .results
                    .iter()
                    .find(|entry| entry.iso_3166_1 == "US")
                    .and_then(|entry| entry.rating.clone())
            })
            .filter(|rating| !rating.is_empty())
            .unwrap_or_else(|| "TV-NR".to_string()),
        MediaKind::Movie => detail
            .release_dates
            .as_ref()
            .and_then(|dates| {
                let us = dates.results.iter().find(|entry| entry.iso_3166_1 == "US")?;
                us.release_dates
                    .iter()
                    .find(|stamp| !stamp.certification.is_empty())
                    .or_else(|| us.release_dates.first())
                    .map(|stamp| stamp.certification.clone())
            })
            .filter(|cert| !cert.is_empty())
            .unwrap_or_else(|| "NR".to_string()),
    }
}

#[derive(Debug, Deserialize)]
struct RawImages {
    #[serde(default)]
    logos: Vec<RawImage>,
}

#[derive(Debug, Deserialize)]
struct RawImage {
    file_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCredits {
    #[serde(default)]
    cast: Vec<RawCast>,
}

#[derive(Debug, Deserialize)]
struct RawCast {
    name: String,
    character: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sample listing page mixing movie- and show-shaped items
    const LISTING_PAGE: &str = r#"{
        "page": 1,
        "results": [
            {
                "id": 550,
                "title": "Fight Club",
                "overview": "An insomniac office worker crosses paths with a soap maker.",
                "poster_path": "/fc.jpg",
                "backdrop_path": "/fc_bd.jpg",
                "vote_average": 8.4,
                "release_date": "1999-10-15",
                "genre_ids": [18]
            },
            {
                "id": 1399,
                "name": "Game of Thrones",
                "overview": "Seven noble families fight for control.",
                "poster_path": "/got.jpg",
                "vote_average": 8.5,
                "first_air_date": "2011-04-17",
                "genre_ids": [10765, 18]
            },
            {
                "id": 77,
                "overview": "No title at all",
                "vote_average": 1.0
            }
        ],
        "total_pages": 500
    }"#;

    #[test]
    fn test_parse_listing_page() {
        let items = parse_page(LISTING_PAGE).expect("Failed to parse listing page");

        assert_eq!(items.len(), 2, "item without title or name is dropped");
        assert_eq!(items[0].id, 550);
        assert_eq!(items[0].title, "Fight Club");
        assert_eq!(items[0].year(), Some(1999));
        assert_eq!(items[1].title, "Game of Thrones");
        assert_eq!(items[1].year(), Some(2011));
        assert_eq!(items[1].genre_ids, vec![10765, 18]);
    }

    #[test]
    fn test_parse_page_with_empty_release_date() {
        let page = r#"{"results":[{"id":1,"title":"X","release_date":""}]}"#;
        let items = parse_page(page).expect("Failed to parse");
        assert_eq!(items[0].release_date, None);
    }

    #[test]
    fn test_parse_malformed_page_errors() {
        assert!(parse_page("{ not json").is_err());
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let items = parse_page(LISTING_PAGE).unwrap();
        let mut doubled = items.clone();
        doubled.extend(items.clone());

        let deduped = dedup_by_id(doubled);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].id, 550);
        assert_eq!(deduped[1].id, 1399);
    }

    #[test]
    fn test_recommendation_filter() {
        let mut items = parse_page(LISTING_PAGE).unwrap();
        // One with an empty overview and one over the length limit
        items.push(CatalogItem {
            overview: String::new(),
            ..items[0].clone()
        });
        items.push(CatalogItem {
            overview: "x".repeat(RECOMMENDATION_OVERVIEW_LIMIT + 1),
            ..items[0].clone()
        });

        let filtered = filter_recommendations(items);
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_recommendation_limit() {
        let base = parse_page(LISTING_PAGE).unwrap();
        let many: Vec<CatalogItem> = (0..10)
            .map(|i| CatalogItem {
                id: i,
                ..base[0].clone()
            })
            .collect();

        assert_eq!(filter_recommendations(many).len(), RECOMMENDATION_LIMIT);
    }

    const MOVIE_DETAIL: &str = r#"{
        "id": 550,
        "title": "Fight Club",
        "overview": "An insomniac office worker crosses paths with a soap maker.",
        "tagline": "Mischief. Mayhem. Soap.",
        "genres": [{"id": 18, "name": "Drama"}],
        "runtime": 139,
        "vote_average": 8.4,
        "release_date": "1999-10-15",
        "poster_path": "/fc.jpg",
        "backdrop_path": "/fc_bd.jpg",
        "release_dates": {
            "results": [
                {"iso_3166_1": "DE", "release_dates": [{"certification": "16"}]},
                {"iso_3166_1": "US", "release_dates": [{"certification": ""}, {"certification": "R"}]}
            ]
        }
    }"#;

    #[test]
    fn test_movie_detail_extracts_us_certification() {
        let raw: RawDetail = serde_json::from_str(MOVIE_DETAIL).expect("Failed to parse detail");
        let detail = raw.into_detail(MediaKind::Movie);

        assert_eq!(detail.title, "Fight Club");
        assert_eq!(detail.certification.as_deref(), Some("R"));
        assert_eq!(detail.runtime_minutes, Some(139));
        assert_eq!(detail.season_count, None);
        assert_eq!(detail.tagline.as_deref(), Some("Mischief. Mayhem. Soap."));
        assert_eq!(detail.genres[0].name, "Drama");
    }

    #[test]
    fn test_movie_detail_without_us_entry_falls_back_to_nr() {
        let raw: RawDetail = serde_json::from_str(
            r#"{"id": 1, "title": "X", "release_dates": {"results": [
                {"iso_3166_1": "FR", "release_dates": [{"certification": "12"}]}
            ]}}"#,
        )
        .unwrap();
        let detail = raw.into_detail(MediaKind::Movie);
        assert_eq!(detail.certification.as_deref(), Some("NR"));
    }

    const TV_DETAIL: &str = r#"{
        "id": 1399,
        "name": "Game of Thrones",
        "overview": "Seven noble families fight for control.",
        "tagline": "",
        "genres": [{"id": 10765, "name": "Sci-Fi & Fantasy"}],
        "number_of_seasons": 8,
        "vote_average": 8.5,
        "first_air_date": "2011-04-17",
        "content_ratings": {
            "results": [
                {"iso_3166_1": "GB", "rating": "18"},
                {"iso_3166_1": "US", "rating": "TV-MA"}
            ]
        }
    }"#;

    #[test]
    fn test_tv_detail_extracts_content_rating() {
        let raw: RawDetail = serde_json::from_str(TV_DETAIL).expect("Failed to parse detail");
        let detail = raw.into_detail(MediaKind::Tv);

        assert_eq!(detail.title, "Game of Thrones");
        assert_eq!(detail.certification.as_deref(), Some("TV-MA"));
        assert_eq!(detail.season_count, Some(8));
        assert_eq!(detail.runtime_minutes, None);
        assert_eq!(detail.tagline, None, "empty tagline is dropped");
    }

    #[test]
    fn test_tv_detail_without_ratings_falls_back() {
        let raw: RawDetail =
            serde_json::from_str(r#"{"id": 1, "name": "X"}"#).expect("Failed to parse");
        let detail = raw.into_detail(MediaKind::Tv);
        assert_eq!(detail.certification.as_deref(), Some("TV-NR"));
    }

    #[test]
    fn test_pick_logo_takes_first() {
        let images: RawImages = serde_json::from_str(
            r#"{"logos": [{"file_path": "/logo_en.png"}, {"file_path": "/logo_alt.png"}]}"#,
        )
        .unwrap();
        assert_eq!(pick_logo(&images).as_deref(), Some("/logo_en.png"));
    }

    #[test]
    fn test_pick_logo_handles_empty_list() {
        let images: RawImages = serde_json::from_str(r#"{"logos": []}"#).unwrap();
        assert_eq!(pick_logo(&images), None);

        let images: RawImages = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(pick_logo(&images), None);
    }

    #[test]
    fn test_parse_credits_caps_cast() {
        let mut cast_entries = Vec::new();
        for i in 0..15 {
            cast_entries.push(format!(
                r#"{{"name": "Actor {}", "character": "Role {}"}}"#,
                i, i
            ));
        }
        let json = format!(r#"{{"cast": [{}]}}"#, cast_entries.join(","));
        let raw: RawCredits = serde_json::from_str(&json).unwrap();

        let cast: Vec<CastMember> = raw
            .cast
            .into_iter()
            .take(CAST_LIMIT)
            .map(|c| CastMember {
                name: c.name,
                character: c.character,
            })
            .collect();
        assert_eq!(cast.len(), CAST_LIMIT);
        assert_eq!(cast[0].name, "Actor 0");
    }

    #[tokio::test]
    async fn test_cached_listing_skips_network() {
        use crate::cache::{CacheConfig, MediaCache, MemoryStore};
        use std::sync::Arc;

        let cache = MediaCache::open(Arc::new(MemoryStore::new()), CacheConfig::default());
        let items = parse_page(LISTING_PAGE).unwrap();
        cache.store_catalog(MediaKind::Movie, Category::Popular, items.clone());

        // Unroutable base URL: any network attempt would error
        let config = ApiConfig::with_base_url("http://127.0.0.1:1/api");
        let client = CatalogClient::new(config, Some(cache));

        let fetched = client
            .fetch_catalog(MediaKind::Movie, Category::Popular)
            .await
            .expect("cached listing should be served without network");
        assert_eq!(fetched, items);
    }
}
