use pr_export::config::AppConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize tracing (logging)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pr_export=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            tracing::warn!("Failed to load .env file: {}", e);
        }
    }

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}. Exiting.", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = pr_export::run(&config).await {
        tracing::error!("Export failed: {:#}", e);
        std::process::exit(1);
    }
}
