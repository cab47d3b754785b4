use crate::domain::model::{EmailMessage, SendReceipt};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Delivers a single message. Implementations never retry.
#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<SendReceipt>;
}

/// Hands out a currently valid provider access token.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String>;

    /// Drops any cached token after the provider rejected it.
    async fn invalidate(&self) {}
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
