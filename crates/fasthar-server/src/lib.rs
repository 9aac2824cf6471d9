// Capture jobs and the HTTP API over stored snapshots

pub mod config;
pub mod error;
pub mod jobs;
pub mod pipeline;
pub mod routes;
pub mod server;
pub mod state;

pub use config::{DEFAULT_MAX_CONCURRENCY, DEFAULT_PORT, DEFAULT_SCRIPT, ServerConfig};
pub use error::{ApiError, Error, Result};
pub use jobs::{CaptureJob, JobRegistry, JobStatus};
pub use pipeline::{CapturePipeline, CaptureRequest, PipelineOutcome, Stage, StageListener};
pub use routes::create_router;
pub use server::ApiServer;
pub use state::AppState;
