//! Per-profile favorites
//!
//! Favorites live under `/users/{uid}/profiles/{profile}/favorites` in the
//! document store. Each favorite stores a display snapshot of the item so the
//! favorites view renders without touching the catalog API. A profile holds
//! at most 100 favorites.

use std::collections::HashSet;

use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::auth::Session;
use super::{AccountError, ServiceConfig, MAX_FAVORITES};
use crate::catalog::{CatalogItem, MediaKind};

/// A favorited item's stored snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteItem {
    pub item_id: u64,
    pub kind: MediaKind,
    pub title: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub vote_average: f64,
    pub release_date: Option<NaiveDate>,
}

impl FavoriteItem {
    /// Builds the stored snapshot from a catalog item.
    pub fn from_catalog(item: &CatalogItem, kind: MediaKind) -> Self {
        Self {
            item_id: item.id,
            kind,
            title: item.title.clone(),
            poster_path: item.poster_path.clone(),
            backdrop_path: item.backdrop_path.clone(),
            vote_average: item.vote_average,
            release_date: item.release_date,
        }
    }

    fn key(&self) -> String {
        favorite_key(self.item_id, self.kind)
    }
}

/// Document id and membership key for a favorite
fn favorite_key(item_id: u64, kind: MediaKind) -> String {
    format!("{}-{}", item_id, kind.token())
}

/// O(1) membership lookup over a profile's favorites
#[derive(Debug, Clone, Default)]
pub struct FavoriteSet {
    keys: HashSet<String>,
}

impl FavoriteSet {
    pub fn from_items(items: &[FavoriteItem]) -> Self {
        Self {
            keys: items.iter().map(FavoriteItem::key).collect(),
        }
    }

    pub fn contains(&self, item_id: u64, kind: MediaKind) -> bool {
        self.keys.contains(&favorite_key(item_id, kind))
    }

    pub fn insert(&mut self, item_id: u64, kind: MediaKind) {
        self.keys.insert(favorite_key(item_id, kind));
    }

    pub fn remove(&mut self, item_id: u64, kind: MediaKind) {
        self.keys.remove(&favorite_key(item_id, kind));
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Client for the favorites documents
#[derive(Debug, Clone)]
pub struct FavoritesClient {
    client: Client,
    config: ServiceConfig,
}

impl FavoritesClient {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Lists a profile's favorites.
    pub async fn list(
        &self,
        session: &Session,
        profile_id: &str,
    ) -> Result<Vec<FavoriteItem>, AccountError> {
        let url = self.favorites_url(session, profile_id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&session.token)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AccountError::Status(status.as_u16()));
        }
        Ok(serde_json::from_str(&response.text().await?)?)
    }

    /// Adds a favorite, refusing once the profile holds the maximum. The
    /// caller passes the current count so no extra round trip is needed.
    pub async fn add(
        &self,
        session: &Session,
        profile_id: &str,
        current_count: usize,
        favorite: &FavoriteItem,
    ) -> Result<(), AccountError> {
        ensure_can_add(current_count)?;
        let url = format!(
            "{}/{}",
            self.favorites_url(session, profile_id),
            favorite.key()
        );
        let response = self
            .client
            .put(&url)
            .bearer_auth(&session.token)
            .json(favorite)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AccountError::Status(status.as_u16()));
        }
        debug!(item_id = favorite.item_id, "favorite added");
        Ok(())
    }

    /// Removes a favorite.
    pub async fn remove(
        &self,
        session: &Session,
        profile_id: &str,
        item_id: u64,
        kind: MediaKind,
    ) -> Result<(), AccountError> {
        let url = format!(
            "{}/{}",
            self.favorites_url(session, profile_id),
            favorite_key(item_id, kind)
        );
        let response = self
            .client
            .delete(&url)
            .bearer_auth(&session.token)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AccountError::Status(status.as_u16()));
        }
        debug!(item_id, "favorite removed");
        Ok(())
    }

    fn favorites_url(&self, session: &Session, profile_id: &str) -> String {
        format!(
            "{}/users/{}/profiles/{}/favorites",
            self.config.store_base_url, session.uid, profile_id
        )
    }
}

fn ensure_can_add(current: usize) -> Result<(), AccountError> {
    if current >= MAX_FAVORITES {
        return Err(AccountError::FavoritesFull);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn favorite(id: u64, kind: MediaKind) -> FavoriteItem {
        FavoriteItem {
            item_id: id,
            kind,
            title: format!("Item {}", id),
            poster_path: None,
            backdrop_path: None,
            vote_average: 7.0,
            release_date: None,
        }
    }

    #[test]
    fn test_favorite_key_includes_kind() {
        assert_eq!(favorite_key(42, MediaKind::Movie), "42-movie");
        assert_eq!(favorite_key(42, MediaKind::Tv), "42-tv");
    }

    #[test]
    fn test_favorite_set_membership() {
        let items = vec![favorite(1, MediaKind::Movie), favorite(2, MediaKind::Tv)];
        let mut set = FavoriteSet::from_items(&items);

        assert!(set.contains(1, MediaKind::Movie));
        assert!(!set.contains(1, MediaKind::Tv), "kind is part of the key");
        assert!(set.contains(2, MediaKind::Tv));
        assert_eq!(set.len(), 2);

        set.remove(1, MediaKind::Movie);
        assert!(!set.contains(1, MediaKind::Movie));

        set.insert(3, MediaKind::Movie);
        assert!(set.contains(3, MediaKind::Movie));
    }

    #[test]
    fn test_favorites_cap() {
        assert!(ensure_can_add(MAX_FAVORITES - 1).is_ok());
        assert!(matches!(
            ensure_can_add(MAX_FAVORITES),
            Err(AccountError::FavoritesFull)
        ));
    }

    #[test]
    fn test_snapshot_from_catalog_item() {
        let item = CatalogItem {
            id: 550,
            title: "Fight Club".to_string(),
            overview: "overview".to_string(),
            poster_path: Some("/fc.jpg".to_string()),
            backdrop_path: Some("/fc_bd.jpg".to_string()),
            vote_average: 8.4,
            release_date: NaiveDate::from_ymd_opt(1999, 10, 15),
            genre_ids: vec![18],
        };

        let favorite = FavoriteItem::from_catalog(&item, MediaKind::Movie);
        assert_eq!(favorite.item_id, 550);
        assert_eq!(favorite.title, "Fight Club");
        assert_eq!(favorite.kind, MediaKind::Movie);
        assert_eq!(favorite.poster_path.as_deref(), Some("/fc.jpg"));
    }

    #[test]
    fn test_favorite_serialization_roundtrip() {
        let favorite = favorite(9, MediaKind::Tv);
        let json = serde_json::to_string(&favorite).expect("Failed to serialize");
        let parsed: FavoriteItem = serde_json::from_str(&json).expect("Failed to deserialize");
        assert_eq!(parsed, favorite);
    }
}
