//! Server assembly: config, shared state, HTTP listener, shutdown

mod config;
mod state;

pub use config::ServerConfig;
pub use state::AppState;

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub struct Server {
    config: ServerConfig,
    state: AppState,
}

impl Server {
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let app = crate::api::router().with_state(self.state);
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.http_port));

        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!(%addr, "listening");

        let shutdown = CancellationToken::new();
        let signal_token = shutdown.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            signal_token.cancel();
        });

        // In-flight requests get shutdown_timeout_ms to drain, then the
        // remaining connections are dropped.
        let drain_deadline = {
            let token = shutdown.clone();
            let timeout = Duration::from_millis(self.config.shutdown_timeout_ms);
            async move {
                token.cancelled().await;
                tokio::time::sleep(timeout).await;
            }
        };

        let serve = axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await });
        tokio::select! {
            result = serve => result?,
            _ = drain_deadline => {
                warn!(
                    timeout_ms = self.config.shutdown_timeout_ms,
                    "graceful drain timed out, dropping remaining connections"
                );
            }
        }

        info!("server shutdown complete");
        Ok(())
    }
}

/// Stdout logging plus a daily rolling file under `<data_dir>/logs`.
/// The guard must stay alive for the lifetime of the process.
pub fn init_logging(data_dir: impl AsRef<Path>) -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(data_dir.as_ref().join("logs"), "dine.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .init();
    guard
}

/// Listens for SIGTERM and Ctrl+C
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("received SIGTERM, shutting down");
        },
    }
}
