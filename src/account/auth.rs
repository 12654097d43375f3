//! Identity service client
//!
//! Signs users in and up against the REST identity endpoints and returns a
//! session (user id + bearer token) the document-store clients attach to
//! their requests.

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{AccountError, ServiceConfig};

/// An authenticated session
#[derive(Debug, Clone)]
pub struct Session {
    /// Stable user id the document store keys accounts by
    pub uid: String,
    /// Bearer token for document-store requests
    pub token: String,
    pub email: String,
}

/// Client for the identity service
#[derive(Debug, Clone)]
pub struct AuthClient {
    client: Client,
    config: ServiceConfig,
}

impl AuthClient {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Exchanges credentials for a session.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AccountError> {
        self.credential_request("accounts:signInWithPassword", email, password)
            .await
    }

    /// Creates a new account and returns its session. The caller is expected
    /// to follow up with `ProfilesClient::bootstrap` to create the user
    /// document and default profiles.
    #[allow(dead_code)]
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AccountError> {
        self.credential_request("accounts:signUp", email, password)
            .await
    }

    async fn credential_request(
        &self,
        endpoint: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, AccountError> {
        let url = format!(
            "{}/v1/{}?key={}",
            self.config.auth_base_url, endpoint, self.config.auth_api_key
        );
        let response = self
            .client
            .post(&url)
            .json(&json!({
                "email": email,
                "password": password,
                "returnSecureToken": true,
            }))
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(AccountError::Auth(parse_auth_error(&text)));
        }

        let raw: RawAuthResponse = serde_json::from_str(&text)?;
        debug!(uid = %raw.local_id, "authenticated");
        Ok(Session {
            uid: raw.local_id,
            token: raw.id_token,
            email: raw.email.unwrap_or_else(|| email.to_string()),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAuthResponse {
    local_id: String,
    id_token: String,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawAuthErrorBody {
    error: RawAuthErrorDetail,
}

#[derive(Debug, Deserialize)]
struct RawAuthErrorDetail {
    message: String,
}

/// Turns the service's SCREAMING_SNAKE error codes into readable text, e.g.
/// "EMAIL_NOT_FOUND" -> "email not found".
fn parse_auth_error(body: &str) -> String {
    match serde_json::from_str::<RawAuthErrorBody>(body) {
        Ok(parsed) => parsed
            .error
            .message
            .split('_')
            .map(|word| word.to_lowercase())
            .collect::<Vec<_>>()
            .join(" "),
        Err(_) => "authentication failed".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_auth_response() {
        let raw: RawAuthResponse = serde_json::from_str(
            r#"{"localId": "u1", "idToken": "tok", "email": "a@b.test", "expiresIn": "3600"}"#,
        )
        .expect("Failed to parse auth response");

        assert_eq!(raw.local_id, "u1");
        assert_eq!(raw.id_token, "tok");
        assert_eq!(raw.email.as_deref(), Some("a@b.test"));
    }

    #[test]
    fn test_parse_auth_error_humanizes_code() {
        let body = r#"{"error": {"code": 400, "message": "EMAIL_NOT_FOUND"}}"#;
        assert_eq!(parse_auth_error(body), "email not found");
    }

    #[test]
    fn test_parse_auth_error_falls_back_on_garbage() {
        assert_eq!(parse_auth_error("oops"), "authentication failed");
    }
}
