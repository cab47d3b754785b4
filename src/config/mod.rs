#[cfg(feature = "cli")]
pub mod cli;

use crate::core::rate_limiter::RateLimitPolicy;
use crate::utils::error::{ContactError, Result};
use crate::utils::validation::Validate;
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.zoho.com";
pub const DEFAULT_MAIL_API_URL: &str = "https://mail.zoho.com";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactConfig {
    /// CORS origin echoed on every response; `*` when unset.
    #[serde(default)]
    pub allowed_origin: Option<String>,
    #[serde(default)]
    pub zoho: ZohoConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ZohoConfig {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub accounts_url: String,
    pub token_url: Option<String>,
    pub mail_api_url: String,
    pub account_id: Option<String>,
    pub http_timeout_secs: u64,
}

impl Default for ZohoConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            refresh_token: String::new(),
            accounts_url: DEFAULT_ACCOUNTS_URL.to_string(),
            token_url: None,
            mail_api_url: DEFAULT_MAIL_API_URL.to_string(),
            account_id: None,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl std::fmt::Debug for ZohoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZohoConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("accounts_url", &self.accounts_url)
            .field("token_url", &self.token_url)
            .field("mail_api_url", &self.mail_api_url)
            .field("account_id", &self.account_id)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .finish()
    }
}

impl ZohoConfig {
    /// Explicit override wins; otherwise derived from the accounts base URL.
    pub fn token_url(&self) -> String {
        match &self.token_url {
            Some(url) => url.clone(),
            None => format!("{}/oauth/v2/token", self.accounts_url.trim_end_matches('/')),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// Verified Zoho sender address.
    pub from_address: String,
    /// Where internal notifications go; falls back to the sender address.
    pub inbox_address: Option<String>,
}

impl MailConfig {
    pub fn inbox_address(&self) -> &str {
        self.inbox_address.as_deref().unwrap_or(&self.from_address)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_secs: u64,
    pub max_entries: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        let policy = RateLimitPolicy::default();
        Self {
            max_requests: policy.max_requests,
            window_secs: policy.window.num_seconds() as u64,
            max_entries: policy.max_entries,
        }
    }
}

impl RateLimitConfig {
    /// A window too large to represent falls back to the default window.
    pub fn policy(&self) -> RateLimitPolicy {
        let window = i64::try_from(self.window_secs)
            .ok()
            .and_then(chrono::TimeDelta::try_seconds)
            .unwrap_or_else(|| RateLimitPolicy::default().window);
        RateLimitPolicy {
            max_requests: self.max_requests,
            window,
            max_entries: self.max_entries,
        }
    }
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.to_string())
}

impl ContactConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = RateLimitConfig::default();

        Ok(Self {
            allowed_origin: env_opt("ALLOWED_ORIGIN"),
            zoho: ZohoConfig {
                client_id: env_or("ZOHO_CLIENT_ID", ""),
                client_secret: env_or("ZOHO_CLIENT_SECRET", ""),
                refresh_token: env_or("ZOHO_REFRESH_TOKEN", ""),
                accounts_url: env_or("ZOHO_ACCOUNTS_URL", DEFAULT_ACCOUNTS_URL),
                token_url: env_opt("ZOHO_TOKEN_URL"),
                mail_api_url: env_or("ZOHO_MAIL_API_URL", DEFAULT_MAIL_API_URL),
                account_id: env_opt("ZOHO_ACCOUNT_ID"),
                http_timeout_secs: env_or("HTTP_TIMEOUT_SECS", "10")
                    .parse()
                    .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
            },
            mail: MailConfig {
                from_address: env_or("ZOHO_FROM_ADDRESS", ""),
                inbox_address: env_opt("CONTACT_INBOX_ADDRESS"),
            },
            rate_limit: RateLimitConfig {
                max_requests: env_or("RATE_LIMIT_MAX_REQUESTS", "10")
                    .parse()
                    .unwrap_or(defaults.max_requests),
                window_secs: env_or("RATE_LIMIT_WINDOW_SECS", "900")
                    .parse()
                    .unwrap_or(defaults.window_secs),
                max_entries: env_or("RATE_LIMIT_MAX_ENTRIES", "10000")
                    .parse()
                    .unwrap_or(defaults.max_entries),
            },
        })
    }

    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ContactError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| ContactError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${ZOHO_CLIENT_SECRET})
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        use std::sync::OnceLock;

        static ENV_VAR_RE: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR_RE
            .get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern compiles"));

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }

    pub fn allowed_origin(&self) -> &str {
        self.allowed_origin.as_deref().unwrap_or("*")
    }
}

impl Validate for ContactConfig {
    fn validate(&self) -> Result<()> {
        use crate::utils::validation::*;

        // 驗證 Zoho 端點
        validate_url("zoho.accounts_url", &self.zoho.accounts_url)?;
        validate_url("zoho.token_url", &self.zoho.token_url())?;
        validate_url("zoho.mail_api_url", &self.zoho.mail_api_url)?;

        // 驗證憑證（只檢查是否存在）
        validate_secret("zoho.client_id", &self.zoho.client_id)?;
        validate_secret("zoho.client_secret", &self.zoho.client_secret)?;
        validate_secret("zoho.refresh_token", &self.zoho.refresh_token)?;
        let account_id = validate_required_field("zoho.account_id", &self.zoho.account_id)?;
        validate_non_empty_string("zoho.account_id", account_id)?;
        validate_range("zoho.http_timeout_secs", self.zoho.http_timeout_secs, 1, 60)?;

        // 驗證寄件與收件地址
        validate_email_address("mail.from_address", &self.mail.from_address)?;
        validate_email_address("mail.inbox_address", self.mail.inbox_address())?;

        // 驗證速率限制
        validate_range("rate_limit.max_requests", self.rate_limit.max_requests, 1, 10_000)?;
        validate_range("rate_limit.window_secs", self.rate_limit.window_secs, 1, 86_400)?;
        validate_positive_number("rate_limit.max_entries", self.rate_limit.max_entries, 1)?;

        tracing::info!("✅ Contact configuration validation passed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> ContactConfig {
        ContactConfig {
            allowed_origin: Some("https://agrinova.com".into()),
            zoho: ZohoConfig {
                client_id: "1000.CLIENT".into(),
                client_secret: "secret".into(),
                refresh_token: "1000.refresh".into(),
                account_id: Some("123456789".into()),
                ..ZohoConfig::default()
            },
            mail: MailConfig {
                from_address: "noreply@agrinova.com".into(),
                inbox_address: Some("hello@agrinova.com".into()),
            },
            rate_limit: RateLimitConfig::default(),
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_missing_account_id_is_reported() {
        let mut config = valid_config();
        config.zoho.account_id = None;

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ContactError::MissingConfigError { ref field } if field == "zoho.account_id"));
    }

    #[test]
    fn test_token_url_defaults_to_accounts_url() {
        let mut config = valid_config();
        config.zoho.accounts_url = "https://accounts.zoho.eu/".into();
        assert_eq!(config.zoho.token_url(), "https://accounts.zoho.eu/oauth/v2/token");

        config.zoho.token_url = Some("http://127.0.0.1:9000/token".into());
        assert_eq!(config.zoho.token_url(), "http://127.0.0.1:9000/token");
    }

    #[test]
    fn test_defaults() {
        let config = ContactConfig::default();
        assert_eq!(config.allowed_origin(), "*");
        assert_eq!(config.zoho.http_timeout(), Duration::from_secs(10));
        assert_eq!(config.rate_limit.policy(), RateLimitPolicy::default());
    }

    #[test]
    fn test_out_of_range_window_falls_back_to_default() {
        let mut config = valid_config();
        config.rate_limit.window_secs = u64::MAX;
        assert_eq!(config.rate_limit.policy().window, RateLimitPolicy::default().window);

        config.rate_limit.window_secs = 10_000_000_000_000_000;
        assert_eq!(config.rate_limit.policy().window, RateLimitPolicy::default().window);
        assert!(config.validate().is_err());

        config.rate_limit.window_secs = 600;
        assert_eq!(config.rate_limit.policy().window, chrono::Duration::minutes(10));
    }

    #[test]
    fn test_inbox_falls_back_to_sender() {
        let mut config = valid_config();
        config.mail.inbox_address = None;
        assert_eq!(config.mail.inbox_address(), "noreply@agrinova.com");
    }

    #[test]
    fn test_debug_output_redacts_secrets() {
        let rendered = format!("{:?}", valid_config());
        assert!(!rendered.contains("1000.refresh"));
        assert!(!rendered.contains("\"secret\""));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_from_toml_str() {
        let config = ContactConfig::from_toml_str(
            r#"
allowed_origin = "https://agrinova.com"

[zoho]
client_id = "1000.CLIENT"
client_secret = "secret"
refresh_token = "1000.refresh"
account_id = "42"

[mail]
from_address = "noreply@agrinova.com"

[rate_limit]
max_requests = 3
"#,
        )
        .unwrap();

        assert_eq!(config.zoho.account_id.as_deref(), Some("42"));
        assert_eq!(config.zoho.mail_api_url, DEFAULT_MAIL_API_URL);
        assert_eq!(config.rate_limit.max_requests, 3);
        assert_eq!(config.rate_limit.window_secs, 900);
        assert!(config.validate().is_ok());
    }
}
