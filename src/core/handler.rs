use crate::config::ContactConfig;
use crate::core::rate_limiter::RateLimiter;
use crate::core::{templates, validator};
use crate::domain::model::{EmailMessage, SubmissionPayload};
use crate::domain::ports::{Clock, MailSender};
use crate::utils::error::{ContactError, Result};
use http::header::{self, HeaderMap, HeaderValue};
use http::{Method, Request, Response, StatusCode};
use serde_json::json;
use std::sync::Arc;

pub const NOTIFICATION_FROM_NAME: &str = "AgriNova Website";
pub const AUTO_REPLY_FROM_NAME: &str = "AgriNova";
pub const AUTO_REPLY_SUBJECT: &str = "Thank you for contacting AgriNova";

const UNKNOWN_CLIENT: &str = "unknown";

#[derive(Debug, Clone)]
pub struct HandlerSettings {
    pub allowed_origin: String,
    pub from_address: String,
    pub inbox_address: String,
}

impl From<&ContactConfig> for HandlerSettings {
    fn from(config: &ContactConfig) -> Self {
        Self {
            allowed_origin: config.allowed_origin().to_string(),
            from_address: config.mail.from_address.clone(),
            inbox_address: config.mail.inbox_address().to_string(),
        }
    }
}

/// First `X-Forwarded-For` hop, or `unknown` when the header is missing.
pub fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}

pub fn inquiry_subject(payload: &SubmissionPayload) -> String {
    let interest = payload.interest.trim();
    if interest.is_empty() {
        format!("AgriNova Inquiry — from {}", payload.full_name())
    } else {
        format!("AgriNova Inquiry: {} — from {}", interest, payload.full_name())
    }
}

/// The contact form endpoint. Holds the per-process state (rate limiter and,
/// through the mailer, the token cache) so one instance should serve every
/// request the process receives.
pub struct ContactHandler<M: MailSender> {
    mailer: M,
    rate_limiter: RateLimiter,
    settings: HandlerSettings,
}

impl<M: MailSender> ContactHandler<M> {
    pub fn new(mailer: M, rate_limiter: RateLimiter, settings: HandlerSettings) -> Self {
        Self {
            mailer,
            rate_limiter,
            settings,
        }
    }

    pub fn from_config(config: &ContactConfig, mailer: M, clock: Arc<dyn Clock>) -> Self {
        let rate_limiter = RateLimiter::new(config.rate_limit.policy(), clock);
        Self::new(mailer, rate_limiter, HandlerSettings::from(config))
    }

    pub fn mailer(&self) -> &M {
        &self.mailer
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    pub async fn handle<B: AsRef<[u8]>>(&self, request: Request<B>) -> Response<String> {
        if request.method() == Method::OPTIONS {
            return self.respond(StatusCode::NO_CONTENT, String::new());
        }

        match self.process(&request).await {
            Ok(first_name) => self.json(
                StatusCode::OK,
                json!({
                    "success": true,
                    "message": format!(
                        "Thank you, {}! Your message has been received. We'll be in touch within 1-2 business days.",
                        first_name
                    ),
                }),
            ),
            Err(error) => {
                self.log_failure(&error);
                self.error_response(&error)
            }
        }
    }

    async fn process<B: AsRef<[u8]>>(&self, request: &Request<B>) -> Result<String> {
        if request.method() != Method::POST {
            return Err(ContactError::MethodNotAllowed);
        }

        let client_ip = client_ip(request.headers());
        if self.rate_limiter.is_rate_limited(&client_ip) {
            return Err(ContactError::RateLimitError { client_ip });
        }

        let payload: SubmissionPayload = serde_json::from_slice(request.body().as_ref())
            .map_err(|e| ContactError::ParseError {
                message: e.to_string(),
            })?;

        let errors = validator::validate(&payload.first_name, &payload.email, &payload.message);
        if !errors.is_empty() {
            return Err(ContactError::ValidationError { errors });
        }

        tracing::info!("📨 Accepted contact form submission from {}", client_ip);

        let notification = self.compose_notification(&payload);
        let auto_reply = self.compose_auto_reply(&payload);

        // 先寄內部通知，成功後才寄自動回覆
        let receipt = self.mailer.send(&notification).await?;
        tracing::info!("✅ Notification sent (message id {})", receipt.message_id);

        let receipt = self.mailer.send(&auto_reply).await?;
        tracing::info!("✅ Auto-reply sent (message id {})", receipt.message_id);

        Ok(payload.first_name.trim().to_string())
    }

    fn compose_notification(&self, payload: &SubmissionPayload) -> EmailMessage {
        EmailMessage {
            from_name: NOTIFICATION_FROM_NAME.to_string(),
            from_address: self.settings.from_address.clone(),
            to_address: self.settings.inbox_address.clone(),
            subject: inquiry_subject(payload),
            html_body: templates::notification_html(payload),
            text_body: Some(templates::notification_text(payload)),
        }
    }

    fn compose_auto_reply(&self, payload: &SubmissionPayload) -> EmailMessage {
        EmailMessage {
            from_name: AUTO_REPLY_FROM_NAME.to_string(),
            from_address: self.settings.from_address.clone(),
            to_address: payload.email.trim().to_string(),
            subject: AUTO_REPLY_SUBJECT.to_string(),
            html_body: templates::auto_reply_html(payload),
            text_body: Some(templates::auto_reply_text(payload)),
        }
    }

    fn log_failure(&self, error: &ContactError) {
        match error {
            ContactError::RateLimitError { client_ip } => {
                tracing::warn!("🚦 Rate limit exceeded for {}", client_ip);
            }
            e if e.is_client_error() => {
                tracing::info!("Rejected contact form request: {}", e);
            }
            e => {
                tracing::error!(
                    "❌ Contact form delivery failed: {} (Category: {:?}, Severity: {:?})",
                    e,
                    e.category(),
                    e.severity()
                );
                tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            }
        }
    }

    fn error_response(&self, error: &ContactError) -> Response<String> {
        let body = match error {
            ContactError::ValidationError { errors } => json!({
                "success": false,
                "errors": errors,
            }),
            e => json!({
                "success": false,
                "error": e.user_friendly_message(&self.settings.inbox_address),
            }),
        };
        self.json(error.status_code(), body)
    }

    fn json(&self, status: StatusCode, body: serde_json::Value) -> Response<String> {
        let mut response = self.respond(status, body.to_string());
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        response
    }

    fn respond(&self, status: StatusCode, body: String) -> Response<String> {
        let mut response = Response::new(body);
        *response.status_mut() = status;

        let origin = HeaderValue::from_str(&self.settings.allowed_origin)
            .unwrap_or_else(|_| HeaderValue::from_static("*"));
        let headers = response.headers_mut();
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("POST, OPTIONS"),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        );
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rate_limiter::RateLimitPolicy;
    use crate::domain::model::SendReceipt;
    use crate::utils::clock::ManualClock;
    use crate::utils::error::GENERIC_FAILURE_MESSAGE;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every message; fails the send whose 1-based position matches `fail_on`.
    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<EmailMessage>>,
        fail_on: Option<usize>,
    }

    impl RecordingMailer {
        fn failing_on(n: usize) -> Self {
            Self {
                fail_on: Some(n),
                ..Default::default()
            }
        }

        fn sent(&self) -> Vec<EmailMessage> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MailSender for RecordingMailer {
        async fn send(&self, message: &EmailMessage) -> Result<SendReceipt> {
            let mut sent = self.sent.lock().unwrap();
            sent.push(message.clone());
            if self.fail_on == Some(sent.len()) {
                return Err(ContactError::AuthError {
                    message: "Zoho rejected the access token (INVALID_OAUTHTOKEN)".into(),
                });
            }
            Ok(SendReceipt {
                message_id: format!("msg-{}", sent.len()),
            })
        }
    }

    fn settings() -> HandlerSettings {
        HandlerSettings {
            allowed_origin: "https://agrinova.com".into(),
            from_address: "noreply@agrinova.com".into(),
            inbox_address: "hello@agrinova.com".into(),
        }
    }

    fn handler(mailer: RecordingMailer) -> ContactHandler<RecordingMailer> {
        let limiter = RateLimiter::new(RateLimitPolicy::default(), Arc::new(ManualClock::default()));
        ContactHandler::new(mailer, limiter, settings())
    }

    fn post(body: &str) -> Request<String> {
        Request::builder()
            .method(Method::POST)
            .uri("/contact")
            .header("content-type", "application/json")
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(body.to_string())
            .unwrap()
    }

    fn body_json(response: &Response<String>) -> serde_json::Value {
        serde_json::from_str(response.body()).unwrap()
    }

    const VALID_BODY: &str = r#"{"firstName":"Jane","lastName":"Doe","email":" jane@example.com ","interest":"Precision irrigation","message":"Hello, I am interested in your platform."}"#;

    #[test]
    fn test_client_ip_uses_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers), "unknown");

        headers.insert("x-forwarded-for", HeaderValue::from_static(" 203.0.113.7 , 10.0.0.1"));
        assert_eq!(client_ip(&headers), "203.0.113.7");
    }

    #[test]
    fn test_inquiry_subject() {
        let mut payload = SubmissionPayload {
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            interest: "Drones".into(),
            ..Default::default()
        };
        assert_eq!(inquiry_subject(&payload), "AgriNova Inquiry: Drones — from Jane Doe");

        payload.interest = "  ".into();
        assert_eq!(inquiry_subject(&payload), "AgriNova Inquiry — from Jane Doe");
    }

    #[tokio::test]
    async fn test_options_returns_preflight() {
        let handler = handler(RecordingMailer::default());
        let request = Request::builder()
            .method(Method::OPTIONS)
            .body(String::new())
            .unwrap();

        let response = handler.handle(request).await;

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.body().is_empty());
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "https://agrinova.com"
        );
        assert_eq!(response.headers()["access-control-allow-methods"], "POST, OPTIONS");
        assert_eq!(response.headers()["access-control-allow-headers"], "Content-Type");
    }

    #[tokio::test]
    async fn test_other_methods_are_rejected() {
        let handler = handler(RecordingMailer::default());
        let request = Request::builder()
            .method(Method::GET)
            .body(String::new())
            .unwrap();

        let response = handler.handle(request).await;

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            body_json(&response),
            json!({"success": false, "error": "Method Not Allowed"})
        );
        assert!(response.headers().contains_key("access-control-allow-origin"));
    }

    #[tokio::test]
    async fn test_invalid_json_is_rejected() {
        let handler = handler(RecordingMailer::default());

        let response = handler.handle(post("{not json")).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(&response),
            json!({"success": false, "error": "Invalid JSON body."})
        );
        assert!(handler.mailer().sent().is_empty());
    }

    #[tokio::test]
    async fn test_non_string_field_rejects_whole_body() {
        let handler = handler(RecordingMailer::default());

        for body in [
            r#"{"firstName":"Jane","email":"jane@example.com","message":"Hello there, AgriNova!","phone":123}"#,
            r#"{"firstName":null,"email":"jane@example.com","message":"Hello there, AgriNova!"}"#,
            r#"["Jane","jane@example.com"]"#,
        ] {
            let response = handler.handle(post(body)).await;

            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", body);
            assert_eq!(
                body_json(&response),
                json!({"success": false, "error": "Invalid JSON body."})
            );
        }
        assert!(handler.mailer().sent().is_empty());
    }

    #[tokio::test]
    async fn test_missing_fields_default_to_empty() {
        let handler = handler(RecordingMailer::default());

        let response = handler.handle(post("{}")).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(&response)["errors"],
            json!([
                "First name must be at least 2 characters.",
                "A valid email address is required.",
                "Message must be at least 10 characters."
            ])
        );
    }

    #[tokio::test]
    async fn test_successful_submission_sends_both_emails_in_order() {
        let handler = handler(RecordingMailer::default());

        let response = handler.handle(post(VALID_BODY)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "application/json");
        let body = body_json(&response);
        assert_eq!(body["success"], json!(true));
        assert!(body["message"].as_str().unwrap().contains("Thank you, Jane!"));

        let sent = handler.mailer().sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to_address, "hello@agrinova.com");
        assert_eq!(sent[0].from_name, NOTIFICATION_FROM_NAME);
        assert_eq!(
            sent[0].subject,
            "AgriNova Inquiry: Precision irrigation — from Jane Doe"
        );
        assert_eq!(sent[1].to_address, "jane@example.com");
        assert_eq!(sent[1].subject, AUTO_REPLY_SUBJECT);
    }

    #[tokio::test]
    async fn test_failed_notification_skips_auto_reply() {
        let handler = handler(RecordingMailer::failing_on(1));

        let response = handler.handle(post(VALID_BODY)).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let error = body_json(&response)["error"].as_str().unwrap().to_string();
        assert!(error.starts_with(GENERIC_FAILURE_MESSAGE));
        assert!(error.contains("hello@agrinova.com"));
        assert!(!error.contains("INVALID_OAUTHTOKEN"));
        assert_eq!(handler.mailer().sent().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_auto_reply_is_a_server_error() {
        let handler = handler(RecordingMailer::failing_on(2));

        let response = handler.handle(post(VALID_BODY)).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(handler.mailer().sent().len(), 2);
    }

    #[tokio::test]
    async fn test_rate_limit_applies_before_parsing() {
        let handler = handler(RecordingMailer::default());

        for _ in 0..10 {
            let response = handler.handle(post("{}")).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
        let response = handler.handle(post(VALID_BODY)).await;

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body_json(&response)["success"], json!(false));
        assert!(handler.mailer().sent().is_empty());
        assert_eq!(handler.rate_limiter().entry("203.0.113.7").unwrap().count, 10);
    }

    #[tokio::test]
    async fn test_submitted_html_is_escaped_in_notification() {
        let handler = handler(RecordingMailer::default());
        let body = r#"{"firstName":"<img src=x>","email":"jane@example.com","message":"<script>alert(1)</script>"}"#;

        let response = handler.handle(post(body)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let sent = handler.mailer().sent();
        assert!(!sent[0].html_body.contains("<script>"));
        assert!(sent[0].html_body.contains("&lt;script&gt;"));
        assert!(!sent[1].html_body.contains("<img"));
    }
}
