use crate::domain::model::{EmailMessage, SendReceipt};
use crate::domain::ports::MailSender;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};

/// Logs messages instead of delivering them.
#[derive(Debug, Default)]
pub struct DryRunMailer {
    sent: AtomicU64,
}

impl DryRunMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent_count(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl MailSender for DryRunMailer {
    async fn send(&self, message: &EmailMessage) -> Result<SendReceipt> {
        let n = self.sent.fetch_add(1, Ordering::Relaxed) + 1;

        tracing::info!(
            "📭 [dry-run] {} <{}> -> {}: {}",
            message.from_name,
            message.from_address,
            message.to_address,
            message.subject
        );
        if let Some(text) = &message.text_body {
            tracing::debug!("[dry-run] text body:\n{}", text);
        }

        Ok(SendReceipt {
            message_id: format!("dry-run-{}", n),
        })
    }
}
