use crate::Result;
use crate::config::ServerConfig;
use crate::routes::create_router;
use crate::state::AppState;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

/// The HTTP API bound to its store and capture pipeline
pub struct ApiServer {
    port: u16,
    state: Arc<AppState>,
}

impl ApiServer {
    /// Open the store and resolve the capture binary.
    ///
    /// Fails if the store URL is unusable or the capture binary is missing.
    pub async fn build(config: &ServerConfig) -> Result<Self> {
        let pipeline = config.build_pipeline().await?;

        Ok(Self {
            port: config.port,
            state: Arc::new(AppState::new(pipeline)),
        })
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Serve until `shutdown` resolves, then cancel open jobs and close the store
    pub async fn start(self, shutdown: impl Future<Output = ()> + Send + 'static) -> Result<()> {
        let addr: SocketAddr = ([0, 0, 0, 0], self.port).into();
        let listener = tokio::net::TcpListener::bind(addr).await?;

        tracing::info!(
            "fastHAR API listening on http://{} (store {})",
            listener.local_addr()?,
            self.state.store.describe()
        );

        axum::serve(listener, create_router(Arc::clone(&self.state)))
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Shutting down...");
        self.state.jobs.cancel_all().await;
        self.state.store.close().await?;
        tracing::info!("Server stopped");

        Ok(())
    }
}
