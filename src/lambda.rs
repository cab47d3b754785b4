#[cfg(feature = "lambda")]
use agrinova_contact::domain::ports::Clock;
#[cfg(feature = "lambda")]
use agrinova_contact::utils::{clock::SystemClock, logger, validation::Validate};
#[cfg(feature = "lambda")]
use agrinova_contact::{ContactConfig, ContactHandler, ZohoMailClient, ZohoTokenProvider};
#[cfg(feature = "lambda")]
use lambda_http::{run, service_fn, Body, Error, Request, Response};
#[cfg(feature = "lambda")]
use std::sync::Arc;

#[cfg(feature = "lambda")]
type ZohoContactHandler = ContactHandler<ZohoMailClient<ZohoTokenProvider>>;

#[cfg(feature = "lambda")]
async fn function_handler(
    handler: &ZohoContactHandler,
    event: Request,
) -> Result<Response<Body>, Error> {
    let response = handler.handle(event).await;
    Ok(response.map(Body::from))
}

#[cfg(feature = "lambda")]
#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_lambda_logger();

    let config = ContactConfig::from_env()
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)?;

    // 配置有誤時仍然啟動：OPTIONS 與驗證錯誤照常回應，寄信時才回 500
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
    }

    // 同一個 handler 在整個 Lambda 執行環境中重複使用，token 快取與速率限制才會延續
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let tokens = ZohoTokenProvider::new(&config.zoho, clock.clone())?;
    let mailer = ZohoMailClient::new(&config.zoho, tokens)?;
    let handler = ZohoContactHandler::from_config(&config, mailer, clock);

    tracing::info!("Contact form Lambda ready");
    run(service_fn(|event: Request| function_handler(&handler, event))).await
}
