use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::handlers::{self, AppState};
use crate::{Config, ServerError};

/// The filepile HTTP server.
///
/// Owns the assembly and range-serving state over one data directory
/// and runs the axum router until cancelled.
pub struct Server {
    config: Config,
    state: AppState,
    cancel: CancellationToken,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl Server {
    pub fn new(config: Config) -> Arc<Self> {
        let state = AppState::new(&PathBuf::from(&config.data_dir));
        Arc::new(Self {
            config,
            state,
            cancel: CancellationToken::new(),
            local_addr: Mutex::new(None),
        })
    }

    /// Returns the local address the server is listening on.
    ///
    /// Only available after [`run`](Self::run) binds the socket.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().await
    }

    /// Returns the listening port (0 if not yet bound).
    pub async fn port(&self) -> u16 {
        self.local_addr.lock().await.map(|a| a.port()).unwrap_or(0)
    }

    /// Gracefully shuts down the server.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Runs the server until cancellation.
    pub async fn run(self: &Arc<Self>) -> Result<(), ServerError> {
        let addr: SocketAddr = ([0, 0, 0, 0], self.config.port).into();
        let listener = TcpListener::bind(addr).await?;

        let local_addr = listener.local_addr()?;
        *self.local_addr.lock().await = Some(local_addr);
        tracing::info!(data_dir = %self.config.data_dir, "listening on {local_addr}");

        let app = handlers::router(self.state.clone());
        let cancel = self.cancel.clone();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { cancel.cancelled().await })
            .await?;

        tracing::info!("server shut down");
        Ok(())
    }
}
