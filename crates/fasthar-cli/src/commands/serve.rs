use anyhow::Result;
use fasthar_server::{ApiServer, ServerConfig};
use tokio::signal;

pub fn execute(config: ServerConfig) -> Result<()> {
    tracing::info!("Starting fastHAR API on port {}", config.port);

    let runtime = super::runtime()?;
    runtime.block_on(async {
        let server = ApiServer::build(&config).await?;

        println!("🚀 fastHAR API listening on port {}", config.port);
        println!("📁 Store: {}", server.state().store.describe());
        println!();
        println!("Press Ctrl+C to stop");

        server.start(shutdown_signal()).await?;

        println!("✅ Server stopped");
        Ok(())
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}
