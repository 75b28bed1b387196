use std::sync::Arc;

use axum::Router;
use conductor::client::ConductorClient;
use conductor::lifecycle::shutdown_signal;
use musician::api::{self, MusicianState};
use musician::config::Config;
use musician::registration::{register_until_accepted, unregister};
use musician::LogSink;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "musician=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    info!(
        id = %config.id,
        listen = %config.listen_addr,
        advertise = %config.advertise_addr,
        conductor = %config.conductor_addr,
        "musician starting"
    );

    let state = Arc::new(MusicianState::new(config.id, Arc::new(LogSink::new())));
    let app: Router = api::router()
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!("listening on {}", listener.local_addr()?);

    let shutdown = CancellationToken::new();
    let client = ConductorClient::new(&config.conductor_addr, reqwest::Client::new())?;

    let registration = {
        let client = client.clone();
        let state = Arc::clone(&state);
        let cancel = shutdown.clone();
        let config = config.clone();
        tokio::spawn(async move {
            let accepted = register_until_accepted(
                &client,
                config.id,
                &config.advertise_addr,
                config.register_retry,
                &cancel,
            )
            .await;
            state.set_registered(accepted);
        })
    };

    let serve_shutdown = shutdown.clone();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("shutdown signal received");
            serve_shutdown.cancel();
        })
        .await;

    shutdown.cancel();
    let _ = registration.await;
    if state.is_registered() {
        unregister(&client, config.id).await;
    }
    info!("musician stopped");
    served?;
    Ok(())
}
