use crate::config::ZohoConfig;
use crate::domain::model::{EmailMessage, SendReceipt};
use crate::domain::ports::{MailSender, TokenSource};
use crate::utils::error::{ContactError, Result};
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::Serialize;
use serde_json::Value;

const MAX_DIAGNOSTIC_CHARS: usize = 500;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendMailRequest<'a> {
    from_address: String,
    to_address: &'a str,
    subject: &'a str,
    content: &'a str,
    mail_format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    alt_text: Option<&'a str>,
}

impl<'a> From<&'a EmailMessage> for SendMailRequest<'a> {
    fn from(message: &'a EmailMessage) -> Self {
        Self {
            from_address: format!("{} <{}>", message.from_name, message.from_address),
            to_address: &message.to_address,
            subject: &message.subject,
            content: &message.html_body,
            mail_format: "html",
            alt_text: message.text_body.as_deref(),
        }
    }
}

/// Sends mail through the Zoho Mail REST API. One attempt per call; retrying
/// is up to the caller.
pub struct ZohoMailClient<T: TokenSource> {
    client: Client,
    tokens: T,
    api_url: String,
    account_id: Option<String>,
}

impl<T: TokenSource> ZohoMailClient<T> {
    pub fn new(config: &ZohoConfig, tokens: T) -> Result<Self> {
        let client = Client::builder().timeout(config.http_timeout()).build()?;

        Ok(Self {
            client,
            tokens,
            api_url: config.mail_api_url.trim_end_matches('/').to_string(),
            account_id: config.account_id.clone().filter(|id| !id.trim().is_empty()),
        })
    }

    pub fn tokens(&self) -> &T {
        &self.tokens
    }

    fn send_url(&self, account_id: &str) -> String {
        format!("{}/api/accounts/{}/messages", self.api_url, account_id)
    }
}

fn truncate(text: &str) -> String {
    text.chars().take(MAX_DIAGNOSTIC_CHARS).collect()
}

fn message_id(body: &Value) -> Option<String> {
    match body.pointer("/data/messageId")? {
        Value::String(id) if !id.trim().is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

fn error_code(body: &Value) -> Option<&str> {
    body.pointer("/data/errorCode").and_then(Value::as_str)
}

fn diagnostic(body: &Value, raw: &str) -> String {
    body.pointer("/data/moreInfo")
        .or_else(|| body.pointer("/status/description"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| truncate(raw))
}

#[async_trait]
impl<T: TokenSource> MailSender for ZohoMailClient<T> {
    async fn send(&self, message: &EmailMessage) -> Result<SendReceipt> {
        let Some(account_id) = self.account_id.as_deref() else {
            return Err(ContactError::ConfigError {
                message: "ZOHO_ACCOUNT_ID is not configured".to_string(),
            });
        };

        let token = self.tokens.access_token().await?;

        tracing::debug!("Sending \"{}\" to {}", message.subject, message.to_address);
        let response = self
            .client
            .post(self.send_url(account_id))
            .header(header::AUTHORIZATION, format!("Zoho-oauthtoken {}", token))
            .json(&SendMailRequest::from(message))
            .send()
            .await?;

        let status = response.status();
        let raw = response.text().await?;
        let body: Value = serde_json::from_str(&raw).unwrap_or(Value::Null);

        if status == StatusCode::OK {
            if let Some(message_id) = message_id(&body) {
                return Ok(SendReceipt { message_id });
            }
        }

        match error_code(&body) {
            Some("INVALID_OAUTHTOKEN") => {
                self.tokens.invalidate().await;
                Err(ContactError::AuthError {
                    message: "Zoho rejected the access token (INVALID_OAUTHTOKEN)".to_string(),
                })
            }
            Some("INVALID_ACCOUNT") => Err(ContactError::ConfigError {
                message: format!("Zoho rejected account id {} (INVALID_ACCOUNT)", account_id),
            }),
            Some("QUOTA_EXCEEDED") => Err(ContactError::QuotaError {
                message: diagnostic(&body, &raw),
            }),
            Some(code) => Err(ContactError::MailProviderError {
                code: Some(code.to_string()),
                message: diagnostic(&body, &raw),
            }),
            None if status.is_success() => Err(ContactError::UnexpectedResponse {
                status: status.as_u16(),
                detail: truncate(&raw),
            }),
            None => Err(ContactError::MailProviderError {
                code: None,
                message: format!("HTTP {}: {}", status.as_u16(), diagnostic(&body, &raw)),
            }),
        }
    }
}
