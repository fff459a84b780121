//! API key authentication.
//!
//! The API key is exchanged for a short-lived bearer token via
//! `GET auth/token`. The token is cached and shared by every request of a
//! client; when the server rejects it, the first caller to notice fetches a
//! new one and everyone else reuses it.

use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use url::Url;

use crate::error::{CybsiError, Result};

const TOKEN_PATH: &str = "auth/token";

/// Token returned by `GET auth/token`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenView {
    pub access_token: String,
    pub token_type: String,
    /// Token lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl TokenView {
    /// Value of the `Authorization` header.
    pub fn authorization(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

/// Authenticates requests with a Cybsi API key.
pub struct ApiKeyAuth {
    api_key: String,
    token_url: Url,
    token: Mutex<Option<String>>,
}

impl std::fmt::Debug for ApiKeyAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyAuth")
            .field("token_url", &self.token_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiKeyAuth {
    /// Create an authenticator for the API rooted at `api_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the token URL cannot be derived from `api_url`.
    pub fn new(api_url: &Url, api_key: &str) -> Result<Self> {
        Ok(Self {
            api_key: api_key.to_string(),
            token_url: api_url.join(TOKEN_PATH)?,
            token: Mutex::new(None),
        })
    }

    /// Current `Authorization` header value, fetching a token on first use.
    pub(crate) async fn authorization(&self, http: &Client) -> Result<String> {
        let mut token = self.token.lock().await;
        if let Some(current) = token.as_ref() {
            return Ok(current.clone());
        }

        let fresh = self.fetch(http).await?;
        *token = Some(fresh.clone());
        Ok(fresh)
    }

    /// Replace a token the server rejected.
    ///
    /// `rejected` is the value the caller sent. If another request already
    /// replaced it, the newer token is returned without another round trip.
    pub(crate) async fn refresh(&self, http: &Client, rejected: &str) -> Result<String> {
        let mut token = self.token.lock().await;
        if let Some(current) = token.as_ref() {
            if current != rejected {
                return Ok(current.clone());
            }
        }

        let fresh = self.fetch(http).await?;
        *token = Some(fresh.clone());
        Ok(fresh)
    }

    #[tracing::instrument(skip(self, http), fields(url = %self.token_url))]
    async fn fetch(&self, http: &Client) -> Result<String> {
        let response = http
            .get(self.token_url.clone())
            .query(&[("apiKey", self.api_key.as_str())])
            .send()
            .await
            .map_err(CybsiError::HttpError)?;

        let status = response.status();
        let body = response.bytes().await.map_err(CybsiError::HttpError)?;
        if !status.is_success() {
            return Err(CybsiError::from_status(status.as_u16(), &body));
        }

        let token: TokenView = serde_json::from_slice(&body)
            .map_err(|e| CybsiError::InvalidData(format!("unexpected token response: {e}")))?;
        tracing::debug!(expires_in = ?token.expires_in, "obtained access token");
        Ok(token.authorization())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_authorization_header() {
        let token: TokenView = serde_json::from_value(serde_json::json!({
            "accessToken": "abc",
            "tokenType": "Bearer",
            "expiresIn": 3600
        }))
        .unwrap();
        assert_eq!(token.authorization(), "Bearer abc");
        assert_eq!(token.expires_in, Some(3600));
    }

    #[test]
    fn test_token_url_is_under_api_prefix() {
        let api_url = Url::parse("https://cybsi.local/api/").unwrap();
        let auth = ApiKeyAuth::new(&api_url, "secret-key").unwrap();
        assert_eq!(auth.token_url.as_str(), "https://cybsi.local/api/auth/token");
        assert!(!format!("{auth:?}").contains("secret-key"));
    }
}
