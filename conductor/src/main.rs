use std::sync::Arc;

use axum::Router;
use conductor::baton::{PlaybackSession, WorkerRegistry};
use conductor::client::HttpWorkerClient;
use conductor::config::Config;
use conductor::library::ScoreLibrary;
use conductor::lifecycle::{shutdown_signal, RunFiles};
use conductor::score::SmfScoreSource;
use conductor::{api, AppState, ConductorNode};
use tokio_util::sync::CancellationToken;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "conductor=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    info!(
        listen = %config.listen_addr,
        data_dir = %config.data_dir.display(),
        scores_dir = %config.scores_dir.display(),
        "conductor starting"
    );

    tokio::fs::create_dir_all(&config.data_dir).await?;
    tokio::fs::create_dir_all(&config.scores_dir).await?;
    let run_files = RunFiles::new(&config.data_dir);
    run_files.write_pid().await?;

    // Cancelled on shutdown; every playback session hangs off it.
    let shutdown = CancellationToken::new();

    let registry = WorkerRegistry::new();
    let http = reqwest::Client::builder()
        .pool_max_idle_per_host(8)
        .build()?;
    let session = PlaybackSession::new(
        Arc::clone(&registry),
        Arc::new(HttpWorkerClient::new(http)),
        Arc::new(SmfScoreSource),
        config.session(),
        shutdown.clone(),
    );
    let node = Arc::new(ConductorNode::new(
        registry,
        session,
        ScoreLibrary::new(config.scores_dir.clone()),
    ));
    let state = Arc::new(AppState::from_node(Arc::clone(&node)));

    let app: Router = api::router()
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    let bound = listener.local_addr()?;
    run_files.write_http(bound).await?;
    info!("listening on {bound}");

    let serve_shutdown = shutdown.clone();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("shutdown signal received");
            serve_shutdown.cancel();
        })
        .await;

    shutdown.cancel();
    node.session().wait_idle().await;
    run_files.remove().await;
    info!("conductor stopped");
    served?;
    Ok(())
}
