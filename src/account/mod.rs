//! Account services: identity, viewing profiles, and favorites
//!
//! These are thin REST clients over the identity service and the
//! document-store service. Business rules that the original backend leaves to
//! the client (profile cap, last-profile protection, favorites cap, sort
//! order) are enforced here before a request goes out.

pub mod auth;
pub mod favorites;
pub mod profiles;

pub use auth::{AuthClient, Session};
pub use favorites::{FavoriteItem, FavoriteSet, FavoritesClient};
pub use profiles::{NewProfile, Profile, ProfilesClient};

use thiserror::Error;

/// Most profiles an account may hold
pub const MAX_PROFILES: usize = 5;

/// Most favorites a profile may hold
pub const MAX_FAVORITES: usize = 100;

/// Errors from the account services
#[derive(Debug, Error)]
pub enum AccountError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// The identity service rejected the credentials
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Account already holds the maximum number of profiles
    #[error("Maximum {MAX_PROFILES} profiles allowed")]
    ProfileLimit,

    /// The last remaining profile cannot be deleted
    #[error("Cannot delete the last profile")]
    LastProfile,

    /// Profile already holds the maximum number of favorites
    #[error("Favorites list is full ({MAX_FAVORITES} items)")]
    FavoritesFull,

    /// The service answered with an unexpected status
    #[error("Service error: HTTP {0}")]
    Status(u16),
}

/// Configuration for the account-side services
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Identity service base URL
    pub auth_base_url: String,
    /// Identity service API key, appended as a query parameter
    pub auth_api_key: String,
    /// Document-store service base URL
    pub store_base_url: String,
}

impl ServiceConfig {
    /// Reads endpoints and credentials from `REELDECK_AUTH_BASE`,
    /// `REELDECK_AUTH_KEY`, and `REELDECK_ACCOUNT_BASE`.
    pub fn from_env() -> Self {
        Self {
            auth_base_url: std::env::var("REELDECK_AUTH_BASE")
                .unwrap_or_else(|_| "https://identitytoolkit.googleapis.com".to_string()),
            auth_api_key: std::env::var("REELDECK_AUTH_KEY").unwrap_or_default(),
            store_base_url: std::env::var("REELDECK_ACCOUNT_BASE").unwrap_or_default(),
        }
    }
}
