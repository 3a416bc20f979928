use clap::Parser;
use sentiment_aura::utils::error::ErrorSeverity;
use sentiment_aura::utils::logger;
use sentiment_aura::config::load_dotenv;
use sentiment_aura::{start_server, AppConfig, CliArgs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv(None);
    let args = CliArgs::parse();

    if args.json_logs {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_server_logger(args.verbose);
    }

    tracing::info!("Sentiment Aura API v{}", env!("CARGO_PKG_VERSION"));

    let config = match AppConfig::load(&args.overrides()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());

            let exit_code = match e.severity() {
                ErrorSeverity::Critical => 3,
                _ => 1,
            };
            std::process::exit(exit_code);
        }
    };

    if args.verbose {
        tracing::debug!("Loaded config: {:?}", config);
    }

    start_server(config).await
}
