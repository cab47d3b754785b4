use agrinova_contact::domain::ports::Clock;
use agrinova_contact::utils::error::ErrorSeverity;
use agrinova_contact::utils::{clock::SystemClock, logger, validation::Validate};
use agrinova_contact::{
    CliArgs, ContactConfig, ContactHandler, DryRunMailer, ZohoMailClient, ZohoTokenProvider,
};
use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tokio::io::AsyncReadExt;

async fn read_payload(source: &str) -> anyhow::Result<String> {
    if source == "-" {
        let mut payload = String::new();
        tokio::io::stdin()
            .read_to_string(&mut payload)
            .await
            .context("failed to read payload from stdin")?;
        Ok(payload)
    } else {
        tokio::fs::read_to_string(source)
            .await
            .with_context(|| format!("failed to read payload file '{}'", source))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    tracing::info!("🚀 Starting agrinova-contact CLI");

    let config = match &args.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            ContactConfig::from_file(path)
                .with_context(|| format!("failed to load config file '{}'", path))?
        }
        None => ContactConfig::from_env()?,
    };
    if args.verbose {
        tracing::debug!("Config: {:?}", config);
    }

    // 驗證配置 (dry-run 不需要 Zoho 憑證)
    if !args.dry_run {
        if let Err(e) = config.validate() {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e);

            let exit_code = match e.severity() {
                ErrorSeverity::Low | ErrorSeverity::High => 1,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::Critical => 3,
            };
            std::process::exit(exit_code);
        }
    }

    let payload = read_payload(&args.payload).await?;

    let mut builder = http::Request::builder()
        .method(args.method.as_str())
        .uri("/contact")
        .header("content-type", "application/json");
    if let Some(ip) = &args.client_ip {
        builder = builder.header("x-forwarded-for", ip.as_str());
    }
    let request = builder.body(payload).context("failed to build request")?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let response = if args.dry_run {
        tracing::info!("🔍 Dry run: emails will be logged, not sent");
        ContactHandler::from_config(&config, DryRunMailer::new(), clock)
            .handle(request)
            .await
    } else {
        let tokens = ZohoTokenProvider::new(&config.zoho, clock.clone())?;
        let mailer = ZohoMailClient::new(&config.zoho, tokens)?;
        ContactHandler::from_config(&config, mailer, clock)
            .handle(request)
            .await
    };

    println!("{}", response.status());
    println!("{}", response.body());

    if !response.status().is_success() {
        std::process::exit(1);
    }

    Ok(())
}
