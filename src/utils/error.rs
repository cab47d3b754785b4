use thiserror::Error;

/// Shown to the form user whenever sending fails on our side.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Sorry, something went wrong while sending your message. Please email us directly at";

#[derive(Error, Debug)]
pub enum ContactError {
    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("Invalid JSON body: {message}")]
    ParseError { message: String },

    #[error("Validation failed: {}", .errors.join(" "))]
    ValidationError { errors: Vec<String> },

    #[error("Rate limit exceeded for {client_ip}")]
    RateLimitError { client_ip: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid configuration value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Authentication error: {message}")]
    AuthError { message: String },

    #[error("Mail provider quota exceeded: {message}")]
    QuotaError { message: String },

    #[error("Mail provider error ({}): {message}", .code.as_deref().unwrap_or("unknown"))]
    MailProviderError {
        code: Option<String>,
        message: String,
    },

    #[error("Unexpected response from mail provider (HTTP {status}): {detail}")]
    UnexpectedResponse { status: u16, detail: String },

    #[error("Transport error: {0}")]
    TransportError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Client,
    Configuration,
    Authentication,
    Provider,
    Network,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ContactError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ContactError::MethodNotAllowed
            | ContactError::ParseError { .. }
            | ContactError::ValidationError { .. }
            | ContactError::RateLimitError { .. } => ErrorCategory::Client,
            ContactError::ConfigError { .. }
            | ContactError::MissingConfigError { .. }
            | ContactError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            ContactError::AuthError { .. } => ErrorCategory::Authentication,
            ContactError::QuotaError { .. }
            | ContactError::MailProviderError { .. }
            | ContactError::UnexpectedResponse { .. } => ErrorCategory::Provider,
            ContactError::TransportError(_) => ErrorCategory::Network,
            ContactError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Client => ErrorSeverity::Low,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Provider | ErrorCategory::Authentication => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.category() == ErrorCategory::Client
    }

    pub fn status_code(&self) -> http::StatusCode {
        match self {
            ContactError::MethodNotAllowed => http::StatusCode::METHOD_NOT_ALLOWED,
            ContactError::ParseError { .. } | ContactError::ValidationError { .. } => {
                http::StatusCode::BAD_REQUEST
            }
            ContactError::RateLimitError { .. } => http::StatusCode::TOO_MANY_REQUESTS,
            _ => http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text safe to show the person who submitted the form. Provider and
    /// configuration details never appear here.
    pub fn user_friendly_message(&self, contact_address: &str) -> String {
        match self {
            ContactError::MethodNotAllowed => "Method Not Allowed".to_string(),
            ContactError::ParseError { .. } => "Invalid JSON body.".to_string(),
            ContactError::ValidationError { errors } => errors.join(" "),
            ContactError::RateLimitError { .. } => {
                "Too many requests. Please try again later.".to_string()
            }
            _ => format!("{} {}.", GENERIC_FAILURE_MESSAGE, contact_address),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ContactError::MethodNotAllowed => "Submit the form with POST",
            ContactError::ParseError { .. } => "Send a JSON object body",
            ContactError::ValidationError { .. } => "Correct the highlighted form fields",
            ContactError::RateLimitError { .. } => "Wait for the rate limit window to reset",
            ContactError::ConfigError { .. }
            | ContactError::MissingConfigError { .. }
            | ContactError::InvalidConfigValueError { .. } => {
                "Check the ZOHO_* and CONTACT_* environment variables of the deployment"
            }
            ContactError::AuthError { .. } => {
                "Regenerate the Zoho refresh token or verify the client id/secret"
            }
            ContactError::QuotaError { .. } => {
                "The Zoho Mail sending quota is exhausted; wait for it to reset or raise the plan limit"
            }
            ContactError::MailProviderError { .. } | ContactError::UnexpectedResponse { .. } => {
                "Inspect the provider diagnostic in the logs and the Zoho Mail API status"
            }
            ContactError::TransportError(_) => "Check outbound network access to Zoho endpoints",
            ContactError::IoError(_) => "Inspect the input file or payload",
        }
    }
}

pub type Result<T> = std::result::Result<T, ContactError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ContactError::MethodNotAllowed.status_code().as_u16(), 405);
        assert_eq!(
            ContactError::ParseError {
                message: "eof".into()
            }
            .status_code()
            .as_u16(),
            400
        );
        assert_eq!(
            ContactError::RateLimitError {
                client_ip: "1.2.3.4".into()
            }
            .status_code()
            .as_u16(),
            429
        );
        assert_eq!(
            ContactError::QuotaError {
                message: "limit".into()
            }
            .status_code()
            .as_u16(),
            500
        );
    }

    #[test]
    fn test_server_errors_hide_provider_details() {
        let err = ContactError::MailProviderError {
            code: Some("INVALID_DATA".into()),
            message: "toAddress is malformed".into(),
        };
        let message = err.user_friendly_message("hello@agrinova.com");

        assert!(message.starts_with(GENERIC_FAILURE_MESSAGE));
        assert!(message.contains("hello@agrinova.com"));
        assert!(!message.contains("INVALID_DATA"));
        assert!(!message.contains("malformed"));
    }

    #[test]
    fn test_client_errors_are_low_severity() {
        let err = ContactError::ValidationError {
            errors: vec!["A valid email address is required.".into()],
        };
        assert!(err.is_client_error());
        assert_eq!(err.severity(), ErrorSeverity::Low);

        let err = ContactError::MissingConfigError {
            field: "zoho.account_id".into(),
        };
        assert!(!err.is_client_error());
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }
}
