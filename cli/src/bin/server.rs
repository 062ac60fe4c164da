//! Tool server exposing the crypto news search over stdio.
//!
//! Launched by `newsdesk` as a child process. stdout carries the protocol, so
//! every log line goes to stderr.

use newsdesk_core::news::{FetchCryptoNewsTool, JobPoller, MasaClient, SearchCryptoNewsTool};
use newsdesk_core::mcp::McpServer;
use newsdesk_core::{Config, ToolRegistry};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SERVER_NAME: &str = "CryptoNewsScraper";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "newsdesk_core=info,newsdesk_server=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load()?;
    let api = Arc::new(MasaClient::new(&config.news)?);
    info!("Using search service at {}", config.news.base_url);

    let poller = Arc::new(JobPoller::new(api, &config.news));
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(SearchCryptoNewsTool::new(
        poller.clone(),
        config.news.default_max_results,
    )));
    registry.register(Arc::new(FetchCryptoNewsTool::new(
        poller,
        config.news.default_max_results,
    )));

    McpServer::new(SERVER_NAME, registry).serve_stdio().await?;
    Ok(())
}
