use crate::jobs::JobRegistry;
use crate::pipeline::CapturePipeline;
use fasthar_store::SnapshotStore;
use std::sync::Arc;

pub struct AppState {
    pub store: Arc<dyn SnapshotStore>,
    pub jobs: JobRegistry,
}

impl AppState {
    /// Build the state around a pipeline; reads go to the pipeline's store
    pub fn new(pipeline: CapturePipeline) -> Self {
        Self {
            store: Arc::clone(pipeline.store()),
            jobs: JobRegistry::new(pipeline),
        }
    }
}
