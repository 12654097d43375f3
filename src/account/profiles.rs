//! Viewing-profile documents
//!
//! Profiles live under `/users/{uid}/profiles` in the document store. An
//! account holds at most five; the last one cannot be deleted; kids profiles
//! sort after regular ones.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::auth::Session;
use super::{AccountError, ServiceConfig, MAX_PROFILES};

/// Default avatar for the owner profile created at signup
const DEFAULT_AVATAR: &str = "avatar2.png";
/// Avatar for the default kids profile created at signup
const KIDS_AVATAR: &str = "avatar5.png";

/// A viewing profile document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub avatar: String,
    #[serde(default)]
    pub is_kids: bool,
}

/// Fields for creating or updating a profile
#[derive(Debug, Clone, Serialize)]
pub struct NewProfile {
    pub name: String,
    pub avatar: String,
    pub is_kids: bool,
}

/// Client for the profile documents
#[derive(Debug, Clone)]
pub struct ProfilesClient {
    client: Client,
    config: ServiceConfig,
}

impl ProfilesClient {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Lists the account's profiles, regular profiles first.
    pub async fn list(&self, session: &Session) -> Result<Vec<Profile>, AccountError> {
        let url = self.profiles_url(session);
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
        let mut profiles: Vec<Profile> = serde_json::from_str(&response.text().await?)?;
        sort_profiles(&mut profiles);
        Ok(profiles)
    }

    /// Creates a profile, refusing once the account holds the maximum.
    #[allow(dead_code)]
    pub async fn add(
        &self,
        session: &Session,
        profile: NewProfile,
    ) -> Result<Profile, AccountError> {
        let existing = self.list(session).await?;
        ensure_can_add(existing.len())?;
        self.post_profile(session, &profile).await
    }

    /// Updates a profile's fields.
    #[allow(dead_code)]
    pub async fn update(
        &self,
        session: &Session,
        profile_id: &str,
        profile: NewProfile,
    ) -> Result<(), AccountError> {
        let url = format!("{}/{}", self.profiles_url(session), profile_id);
        let response = self
            .client
            .patch(&url)
            .bearer_auth(&session.token)
            .json(&profile)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AccountError::Status(status.as_u16()));
        }
        Ok(())
    }

    /// Deletes a profile, refusing to delete the last one.
    #[allow(dead_code)]
    pub async fn delete(&self, session: &Session, profile_id: &str) -> Result<(), AccountError> {
        let existing = self.list(session).await?;
        ensure_can_delete(existing.len())?;
        let url = format!("{}/{}", self.profiles_url(session), profile_id);
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
        debug!(profile_id, "profile deleted");
        Ok(())
    }

    /// Creates the user document and the two default profiles for a fresh
    /// account: an owner profile named after the user, and a kids profile.
    #[allow(dead_code)]
    pub async fn bootstrap(
        &self,
        session: &Session,
        name: &str,
    ) -> Result<Vec<Profile>, AccountError> {
        let user_url = format!("{}/users/{}", self.config.store_base_url, session.uid);
        let response = self
            .client
            .put(&user_url)
            .bearer_auth(&session.token)
            .json(&serde_json::json!({
                "uid": session.uid,
                "name": name,
                "email": session.email,
                "auth_provider": "local",
            }))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AccountError::Status(status.as_u16()));
        }

        let owner = self
            .post_profile(session, &default_owner_profile(name))
            .await?;
        let kids = self.post_profile(session, &default_kids_profile()).await?;
        Ok(vec![owner, kids])
    }

    async fn post_profile(
        &self,
        session: &Session,
        profile: &NewProfile,
    ) -> Result<Profile, AccountError> {
        let response = self
            .client
            .post(&self.profiles_url(session))
            .bearer_auth(&session.token)
            .json(profile)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AccountError::Status(status.as_u16()));
        }
        Ok(serde_json::from_str(&response.text().await?)?)
    }

    fn profiles_url(&self, session: &Session) -> String {
        format!(
            "{}/users/{}/profiles",
            self.config.store_base_url, session.uid
        )
    }
}

/// Regular profiles before kids profiles, otherwise stable.
pub fn sort_profiles(profiles: &mut [Profile]) {
    profiles.sort_by_key(|p| p.is_kids);
}

fn ensure_can_add(existing: usize) -> Result<(), AccountError> {
    if existing >= MAX_PROFILES {
        return Err(AccountError::ProfileLimit);
    }
    Ok(())
}

fn ensure_can_delete(existing: usize) -> Result<(), AccountError> {
    if existing <= 1 {
        return Err(AccountError::LastProfile);
    }
    Ok(())
}

fn default_owner_profile(name: &str) -> NewProfile {
    NewProfile {
        name: name.to_string(),
        avatar: DEFAULT_AVATAR.to_string(),
        is_kids: false,
    }
}

fn default_kids_profile() -> NewProfile {
    NewProfile {
        name: "Kids".to_string(),
        avatar: KIDS_AVATAR.to_string(),
        is_kids: true,
    }
}
