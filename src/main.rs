use std::sync::Arc;

use anyhow::Context;

use email_optimizer::config::{ModelConfig, ServerConfig};
use email_optimizer::llm::create_provider;
use email_optimizer::optimizer::Optimizer;
use email_optimizer::web;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let server_config = ServerConfig::from_env()?;
    let model_config = ModelConfig::from_env()?;

    eprintln!("✉️  Email Optimizer v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", model_config.model);
    eprintln!("   API: {}", model_config.base_url);
    eprintln!("   UI: http://{}/", server_config.socket_addr());
    eprintln!("   The API key is entered per request in the page.\n");

    let llm = create_provider(&model_config)?;
    let optimizer = Arc::new(Optimizer::new(llm));
    let app = web::routes(optimizer);

    let addr = server_config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "Email optimizer server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
