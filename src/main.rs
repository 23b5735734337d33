mod backend;
mod config;
mod error;
mod game;
mod identity;
mod notify;
mod price;
mod server;
mod session;
mod state;
mod types;
mod web;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use crate::notify::{FeedNotifier, NoopNotifier, Notifier};

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.parse().unwrap_or_default()),
        )
        .with_target(false)
        .init();

    let port = config.http_port;

    tracing::info!(
        backend = %config.supabase_url,
        price_api = %config.btc_price_api,
        identity_file = %config.identity_file.display(),
        port,
        "btc-guess starting"
    );

    let http_client = reqwest::Client::builder()
        .timeout(config.http_timeout())
        .build()
        .context("failed to build HTTP client")?;

    let backend = backend::SupabaseBackend::new(http_client.clone(), &config)?;
    let prices = price::HttpPriceSource::new(http_client, config.btc_price_api.clone());
    let identity = identity::FileIdentityStore::new(config.identity_file.clone());

    let feed = config.notifications.then(|| Arc::new(FeedNotifier::new()));
    let notifier: Arc<dyn Notifier> = match &feed {
        Some(feed) => feed.clone() as Arc<dyn Notifier>,
        None => Arc::new(NoopNotifier) as Arc<dyn Notifier>,
    };

    let deps = session::SessionDeps {
        backend: Arc::new(backend),
        prices: Arc::new(prices),
        identity: Arc::new(identity),
        notifier,
    };
    let timing = session::SessionTiming {
        price_poll: config.price_poll_interval(),
        guess_window: config.guess_window(),
    };

    let events = state::EventLog::new();
    let cancel = CancellationToken::new();
    let (handle, session_task) = session::spawn(deps, timing, events.clone(), cancel.clone());

    let app_state = state::AppState::new(config, handle, events, feed);
    let router = server::build_router(app_state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    tracing::info!("HTTP server listening on 0.0.0.0:{port}");
    tracing::info!("open http://localhost:{port} in your browser");

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received Ctrl-C, shutting down");
        }
        shutdown.cancel();
    });

    axum::serve(listener, router)
        .with_graceful_shutdown(cancel.clone().cancelled_owned())
        .await?;

    cancel.cancel();
    if let Err(e) = session_task.await {
        tracing::warn!(error = %e, "game session task panicked");
    }

    Ok(())
}
