//! Rain or Shine Auth API client for Rust
//!
//! This crate provides the authentication slice of the Rain or Shine
//! backend: session checks, the Strava authorization hand-off, sign out,
//! and account revocation. Token exchange happens entirely server-side;
//! this client only ever sees the resulting session cookie.

use chrono::{DateTime, Utc};
use log::warn;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 結果型
pub type Result<T> = std::result::Result<T, AuthError>;

/// エラー型
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// ユーザー情報
///
/// The backend serializes users in camelCase. `id` is the Strava athlete
/// identifier and is required; a payload without it fails to deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub weather_enabled: bool,
    pub member_since: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

/// セッション確認のレスポンス
#[derive(Debug, Deserialize)]
struct SessionCheckResponse {
    authenticated: bool,
    #[serde(default)]
    user: Option<User>,
}

/// 認可URLのレスポンス
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthorizeUrlResponse {
    redirect_url: String,
}

/// バックエンドのエラーペイロード
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Auth クライアント
pub struct AuthClient {
    url: String,
    http_client: Client,
}

impl AuthClient {
    /// 新しい Auth クライアントを作成
    pub fn new(url: &str, http_client: Client) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            http_client,
        }
    }

    /// 現在のセッションを確認
    ///
    /// Calls `GET /api/auth/session`. A `401` or an explicit
    /// `authenticated: false` both mean "no session" and return `Ok(None)`;
    /// only transport problems and malformed responses are errors.
    pub async fn session(&self) -> Result<Option<User>> {
        let url = format!("{}/api/auth/session", self.url);

        let response = self.http_client.get(&url).send().await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let check: SessionCheckResponse = response.json().await?;

        if !check.authenticated {
            return Ok(None);
        }

        match check.user {
            Some(user) => Ok(Some(user)),
            None => Err(AuthError::ApiError(
                "session response missing user".to_string(),
            )),
        }
    }

    /// Strava 認可URLを取得
    ///
    /// Calls `POST /api/auth/strava` and returns the provider consent URL
    /// the caller should navigate to. The optional `redirect_uri` tells the
    /// backend where to send the browser once the OAuth round trip is done.
    pub async fn authorize_url(&self, redirect_uri: Option<&str>) -> Result<String> {
        let mut url = format!("{}/api/auth/strava", self.url);

        if let Some(redirect) = redirect_uri {
            url.push_str(&format!(
                "?redirect_uri={}",
                urlencoding::encode(redirect)
            ));
        }

        let response = self.http_client.post(&url).send().await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let payload: AuthorizeUrlResponse = response.json().await?;

        Ok(payload.redirect_url)
    }

    /// サインアウト
    pub async fn sign_out(&self) -> Result<()> {
        let url = format!("{}/api/auth/logout", self.url);

        let response = self.http_client.post(&url).send().await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        Ok(())
    }

    /// アカウント連携の取り消し
    ///
    /// Calls `POST /api/auth/revoke`, which revokes the Strava grant and
    /// deletes all stored user data server-side. The endpoint is idempotent
    /// on the backend; the client must still not re-issue a call it knows
    /// was dispatched.
    pub async fn revoke(&self) -> Result<()> {
        let url = format!("{}/api/auth/revoke", self.url);

        let response = self.http_client.post(&url).send().await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        Ok(())
    }
}

/// 失敗レスポンスからエラーを組み立てる
///
/// The backend sends display-ready messages as `{"error": "..."}`; anything
/// else is reduced to a status line so backend internals stay out of the UI.
async fn api_error(response: reqwest::Response) -> AuthError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(payload) => AuthError::ApiError(payload.error),
        Err(_) => {
            warn!("auth API returned {}: {}", status, body);
            AuthError::ApiError(format!("request failed with status {}", status))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_deserializes_camel_case() {
        let user: User = serde_json::from_value(json!({
            "id": "12345",
            "displayName": "Jane Doe",
            "firstName": "Jane",
            "profileImageUrl": "https://example.com/avatar.jpg",
            "location": "San Francisco, CA",
            "weatherEnabled": true,
            "memberSince": "2024-03-01T10:00:00Z",
            "lastUpdated": "2025-06-15T08:30:00Z"
        }))
        .unwrap();

        assert_eq!(user.id, "12345");
        assert_eq!(user.display_name, Some("Jane Doe".to_string()));
        assert!(user.weather_enabled);
        assert_eq!(user.member_since.to_rfc3339(), "2024-03-01T10:00:00+00:00");
    }

    #[test]
    fn test_user_requires_id() {
        let result = serde_json::from_value::<User>(json!({
            "displayName": "Nobody",
            "weatherEnabled": false,
            "memberSince": "2024-03-01T10:00:00Z",
            "lastUpdated": "2025-06-15T08:30:00Z"
        }));

        assert!(result.is_err());
    }

    #[test]
    fn test_user_optional_fields_default() {
        let user: User = serde_json::from_value(json!({
            "id": "6789",
            "weatherEnabled": false,
            "memberSince": "2024-03-01T10:00:00Z",
            "lastUpdated": "2025-06-15T08:30:00Z"
        }))
        .unwrap();

        assert!(user.display_name.is_none());
        assert!(user.location.is_none());
    }
}
