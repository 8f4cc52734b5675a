use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use tokio::net::TcpListener;

use marksync_core::Settings;
use marksync_github::{GithubClient, RepositoryHost};
use marksync_sync::WebhookPipeline;

use crate::error::{io_err, DaemonError};
use crate::server::build_router;

/// Start the server runtime and block the current thread until it exits.
pub fn start_blocking(settings: Settings) -> Result<(), DaemonError> {
    init_tracing();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(settings))
}

/// Validate settings, build the GitHub-backed pipeline and serve until
/// ctrl-c. Missing secret or token aborts before binding.
pub async fn run(settings: Settings) -> Result<(), DaemonError> {
    settings.validate()?;
    let client = GithubClient::from_settings(&settings)?;
    let pipeline = Arc::new(WebhookPipeline::from_settings(client, &settings)?);

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, settings.port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| DaemonError::Bind { addr, source })?;
    serve(listener, pipeline).await
}

/// Serve `pipeline` on an already-bound listener.
pub async fn serve<H>(
    listener: TcpListener,
    pipeline: Arc<WebhookPipeline<H>>,
) -> Result<(), DaemonError>
where
    H: RepositoryHost + 'static,
{
    let local = listener
        .local_addr()
        .map_err(|e| io_err("listener", e))?;
    let options = pipeline.options();
    tracing::info!(
        addr = %local,
        document = %options.document_path,
        strategy = %options.strategy,
        "listening for webhooks",
    );

    axum::serve(listener, build_router(pipeline))
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("received ctrl-c, shutting down");
            }
        })
        .await
        .map_err(|e| DaemonError::Serve(e.to_string()))
}

/// Install the global subscriber with an `info` default.
pub fn init_tracing() {
    init_tracing_with_default("info");
}

/// Install the global subscriber. `RUST_LOG` overrides `default_level`;
/// records from `log`-based crates are bridged. Output goes to stderr.
pub fn init_tracing_with_default(default_level: &str) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
