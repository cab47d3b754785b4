pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliArgs;

pub use adapters::{dry_run::DryRunMailer, zoho::ZohoMailClient, zoho::ZohoTokenProvider};
pub use config::ContactConfig;
pub use core::{handler::ContactHandler, rate_limiter::RateLimiter};
pub use utils::error::{ContactError, Result};
