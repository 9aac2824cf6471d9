use crate::Result;
use crate::pipeline::CapturePipeline;
use fasthar_capture::{CaptureBinaryFinder, DEFAULT_BINARY, ProcessCapture};
use fasthar_enrich::{EntryEnricher, HttpFetcher};
pub use fasthar_capture::DEFAULT_SCRIPT;
pub use fasthar_enrich::DEFAULT_MAX_CONCURRENCY;
use std::path::PathBuf;
use std::sync::Arc;

pub const DEFAULT_PORT: u16 = 5000;

/// Everything needed to assemble a running server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Store connection URL (`memory://` or `file:///path`)
    pub store_url: String,
    pub port: u16,
    /// Explicit capture binary; looked up on `PATH` when unset
    pub capture_binary: Option<PathBuf>,
    pub capture_script: PathBuf,
    pub max_concurrency: usize,
}

impl ServerConfig {
    pub fn new(store_url: impl Into<String>) -> Self {
        Self {
            store_url: store_url.into(),
            port: DEFAULT_PORT,
            capture_binary: None,
            capture_script: PathBuf::from(DEFAULT_SCRIPT),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// Resolve the capture binary and build the process runner
    pub fn process_capture(&self) -> fasthar_capture::Result<ProcessCapture> {
        let binary = CaptureBinaryFinder::new(DEFAULT_BINARY, self.capture_binary.clone()).find()?;
        tracing::debug!("Using capture binary {}", binary.display());
        Ok(ProcessCapture::new(binary, self.capture_script.clone()))
    }

    /// Open the store and assemble the capture pipeline around it
    pub async fn build_pipeline(&self) -> Result<CapturePipeline> {
        let capture = self.process_capture()?;
        let store = fasthar_store::open(&self.store_url).await?;
        let enricher = EntryEnricher::new(Arc::new(HttpFetcher::new()), self.max_concurrency);
        Ok(CapturePipeline::new(capture, enricher, store))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(fasthar_store::default_store_url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::new("memory://");

        assert_eq!(config.port, 5000);
        assert_eq!(config.capture_script, PathBuf::from("phantomhar.js"));
        assert_eq!(config.max_concurrency, 16);
        assert!(config.capture_binary.is_none());
    }

    #[test]
    fn test_missing_capture_binary_is_not_found() {
        let mut config = ServerConfig::new("memory://");
        config.capture_binary = Some(PathBuf::from("/definitely/not/here/phantomjs"));

        let result = config.process_capture();

        assert!(matches!(result, Err(fasthar_capture::Error::NotFound(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_explicit_capture_binary_is_used() {
        let mut config = ServerConfig::new("memory://");
        config.capture_binary = Some(PathBuf::from("/bin/sh"));

        assert!(config.process_capture().is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_build_pipeline_rejects_unknown_store_scheme() {
        let mut config = ServerConfig::new("redis://127.0.0.1:6379");
        config.capture_binary = Some(PathBuf::from("/bin/sh"));

        let result = config.build_pipeline().await;

        assert!(matches!(result, Err(crate::Error::Store(_))));
    }
}
