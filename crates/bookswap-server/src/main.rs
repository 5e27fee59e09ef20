use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use bookswap_config::BookswapConfig;
use bookswap_server::{cli, App};

#[tokio::main]
async fn main() {
    let args = cli::parse();

    // Initialize logging
    let log_directive = args
        .log_level
        .as_deref()
        .unwrap_or("bookswap_server=info,bookswap_chat=info");
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                log_directive
                    .parse()
                    .unwrap_or_else(|_| "bookswap_server=info".parse().unwrap()),
            ),
        )
        .init();

    tracing::info!("bookswap-server v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Some(path) = &args.config {
        tracing::info!("Using config override: {}", path.display());
    }
    let mut config = bookswap_config::load_config(args.config.as_deref()).unwrap_or_else(|e| {
        tracing::warn!("Config load failed, using defaults: {e}");
        let mut config = BookswapConfig::default();
        bookswap_config::env::apply_overrides(&mut config);
        config
    });
    args.apply(&mut config);
    tracing::debug!("Effective config: {}", bookswap_config::config_to_json(&config));

    if let Err(e) = run(&config).await {
        tracing::error!(error = %e, "bookswap-server failed");
        std::process::exit(1);
    }
    tracing::info!("Shutdown complete");
}

/// Bind, then serve until Ctrl-C.
async fn run(config: &BookswapConfig) -> bookswap_common::Result<()> {
    let App { router, chat } = App::build(config);
    let chat = chat.map(|server| server.handle());

    let addr = config.server.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("bookswap-server listening on {}", addr);

    let shutdown = async move {
        shutdown_signal().await;
        // Upgraded sockets outlive graceful shutdown unless the hub closes them.
        if let Some(chat) = chat {
            if let Err(e) = chat.shutdown().await {
                tracing::warn!("Chat shutdown failed: {e}");
            }
        }
    };
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookswap_common::BookswapError;

    #[tokio::test]
    async fn run_reports_port_in_use() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut config = BookswapConfig::default();
        config.server.host = "127.0.0.1".into();
        config.server.port = taken.local_addr().unwrap().port();
        config.chat.enabled = false;

        let err = run(&config).await.unwrap_err();
        assert!(matches!(err, BookswapError::Io(_)), "{err}");
    }
}
