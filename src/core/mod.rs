pub mod handler;
pub mod rate_limiter;
pub mod templates;
pub mod validator;

pub use crate::domain::model::{EmailMessage, SendReceipt, SubmissionPayload};
pub use crate::domain::ports::{Clock, MailSender, TokenSource};
pub use crate::utils::error::Result;
