use crate::adapters::OpenAiClient;
use crate::app::routes::build_router;
use crate::config::AppConfig;
use crate::core::pipeline::SentimentPipeline;
use anyhow::Context;
use std::net::SocketAddr;
use tokio::signal;

/// Wire the OpenAI client into the pipeline and serve until a shutdown
/// signal arrives.
pub async fn start_server(config: AppConfig) -> anyhow::Result<()> {
    let client = OpenAiClient::new(
        &config.openai_api_key,
        config.openai_base_url.clone(),
        config.openai_model.clone(),
        config.upstream_timeout(),
    )
    .context("failed to build the completion client")?;

    tracing::info!(
        "Using model {} at {} (timeout {}s)",
        client.model(),
        config.openai_base_url,
        config.upstream_timeout_secs
    );
    if !config.speech_configured() {
        tracing::warn!("DEEPGRAM_API_KEY is not set; speech features are unavailable");
    }

    let pipeline = SentimentPipeline::new(client, &config);
    let router = build_router(pipeline, &config)?;

    let addr = SocketAddr::from((
        config
            .host
            .parse::<std::net::IpAddr>()
            .with_context(|| format!("invalid host address: {}", config.host))?,
        config.port,
    ));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C signal, shutting down...");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal, shutting down...");
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
