use crate::config::ZohoConfig;
use crate::domain::model::AccessToken;
use crate::domain::ports::{Clock, TokenSource};
use crate::utils::error::{ContactError, Result};
use async_trait::async_trait;
use chrono::Duration;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Tokens are refreshed this long before Zoho says they expire.
pub const EXPIRY_MARGIN_SECS: i64 = 60;
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
    error: Option<String>,
}

/// Exchanges the long-lived refresh token for access tokens and caches the
/// current one for the life of the process.
pub struct ZohoTokenProvider {
    client: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    clock: Arc<dyn Clock>,
    cache: Mutex<Option<AccessToken>>,
}

impl ZohoTokenProvider {
    pub fn new(config: &ZohoConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let client = Client::builder().timeout(config.http_timeout()).build()?;

        Ok(Self {
            client,
            token_url: config.token_url(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            refresh_token: config.refresh_token.clone(),
            clock,
            cache: Mutex::new(None),
        })
    }

    pub async fn cached_token(&self) -> Option<AccessToken> {
        self.cache.lock().await.clone()
    }

    pub async fn set_cached_token(&self, token: AccessToken) {
        *self.cache.lock().await = Some(token);
    }

    fn is_fresh(&self, token: &AccessToken) -> bool {
        self.clock.now() < token.expires_at - Duration::seconds(EXPIRY_MARGIN_SECS)
    }

    async fn exchange(&self) -> Result<AccessToken> {
        tracing::debug!("Requesting Zoho access token from {}", self.token_url);

        let params = [
            ("grant_type", "refresh_token"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", self.refresh_token.as_str()),
        ];

        let response = self
            .client
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| ContactError::AuthError {
                message: format!("token request failed: {}", e.without_url()),
            })?;

        let status = response.status();
        // 只保留狀態碼與 error 欄位，避免把 body 內容寫進錯誤訊息
        let body: Option<TokenResponse> = response.json().await.ok();

        if !status.is_success() {
            let provider_error = body
                .and_then(|b| b.error)
                .unwrap_or_else(|| "no error code".to_string());
            return Err(ContactError::AuthError {
                message: format!(
                    "token endpoint returned HTTP {} ({})",
                    status.as_u16(),
                    provider_error
                ),
            });
        }

        let Some(body) = body else {
            return Err(ContactError::AuthError {
                message: "token endpoint returned an unreadable body".to_string(),
            });
        };

        match body.access_token.filter(|t| !t.is_empty()) {
            Some(value) => {
                let now = self.clock.now();
                // 非正數或超出範圍的 expires_in 一律視為預設一小時
                let expires_at = body
                    .expires_in
                    .filter(|secs| *secs > 0)
                    .and_then(Duration::try_seconds)
                    .and_then(|lifetime| now.checked_add_signed(lifetime))
                    .unwrap_or_else(|| now + Duration::seconds(DEFAULT_EXPIRES_IN_SECS));
                Ok(AccessToken { value, expires_at })
            }
            None => Err(ContactError::AuthError {
                message: format!(
                    "token endpoint returned no access_token ({})",
                    body.error.as_deref().unwrap_or("no error code")
                ),
            }),
        }
    }
}

#[async_trait]
impl TokenSource for ZohoTokenProvider {
    async fn access_token(&self) -> Result<String> {
        // 持鎖期間完成交換，同時到達的請求只會觸發一次
        let mut cache = self.cache.lock().await;

        if let Some(token) = cache.as_ref() {
            if self.is_fresh(token) {
                return Ok(token.value.clone());
            }
        }

        let token = self.exchange().await?;
        tracing::info!(
            "🔑 Obtained Zoho access token (expires at {})",
            token.expires_at
        );
        let value = token.value.clone();
        *cache = Some(token);
        Ok(value)
    }

    async fn invalidate(&self) {
        *self.cache.lock().await = None;
    }
}
