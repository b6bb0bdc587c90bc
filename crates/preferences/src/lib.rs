//! Rain or Shine Preferences API client for Rust
//!
//! This crate provides the durable half of preference updates: a write is
//! only considered applied once the backend has acknowledged it. Merging the
//! confirmed value into the local user snapshot is the caller's job.

use log::warn;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;

/// 結果型
pub type Result<T> = std::result::Result<T, PreferencesError>;

/// エラー型
#[derive(Error, Debug)]
pub enum PreferencesError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// 設定更新のリクエスト
///
/// Only the fields that are set are serialized, so a single-field update
/// patches exactly that field on the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather_enabled: Option<bool>,
}

impl PreferenceUpdate {
    /// 天気記録の有効・無効を切り替える更新を作成
    pub fn weather_enabled(value: bool) -> Self {
        Self {
            weather_enabled: Some(value),
        }
    }
}

/// バックエンドのエラーペイロード
#[derive(Debug, serde::Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Preferences クライアント
pub struct PreferencesClient {
    url: String,
    http_client: Client,
}

impl PreferencesClient {
    /// 新しい Preferences クライアントを作成
    pub fn new(url: &str, http_client: Client) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            http_client,
        }
    }

    /// ユーザー設定を更新
    ///
    /// Calls `PATCH /api/user/preferences`. The backend answers `204`, or
    /// `200` with the updated snapshot; either way `Ok(())` means the write
    /// is durable.
    pub async fn update(&self, update: &PreferenceUpdate) -> Result<()> {
        let url = format!("{}/api/user/preferences", self.url);

        let response = self.http_client.patch(&url).json(update).send().await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        Ok(())
    }
}

/// 失敗レスポンスからエラーを組み立てる
async fn api_error(response: reqwest::Response) -> PreferencesError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(payload) => PreferencesError::ApiError(payload.error),
        Err(_) => {
            warn!("preferences API returned {}: {}", status, body);
            PreferencesError::ApiError(format!("request failed with status {}", status))
        }
    }
}
