use crate::Result;
use async_trait::async_trait;
use fasthar_capture::ProcessCapture;
use fasthar_core::har::HarReader;
use fasthar_core::{Snapshot, SnapshotTag};
use fasthar_enrich::EntryEnricher;
use fasthar_store::{SnapshotStore, StoreKey};
use std::sync::Arc;

/// One capture to run: which page, how long the browser waits, how to tag it
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    pub url: String,
    pub delay_ms: Option<u64>,
    pub tag: SnapshotTag,
}

/// Pipeline stage about to start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Capturing,
    Enriching,
    Storing,
}

/// Receives stage transitions while a pipeline runs
#[async_trait]
pub trait StageListener: Send + Sync {
    async fn stage(&self, stage: Stage);
}

#[async_trait]
impl StageListener for () {
    async fn stage(&self, _stage: Stage) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOutcome {
    pub entries: usize,
    pub failed_entries: usize,
}

/// capture -> parse -> tag -> enrich -> append, for one URL.
///
/// A capture, parse or store failure ends the run with an error. Entries that
/// fail to re-fetch only mark the stored document partial.
#[derive(Clone)]
pub struct CapturePipeline {
    capture: ProcessCapture,
    enricher: EntryEnricher,
    store: Arc<dyn SnapshotStore>,
}

impl CapturePipeline {
    pub fn new(
        capture: ProcessCapture,
        enricher: EntryEnricher,
        store: Arc<dyn SnapshotStore>,
    ) -> Self {
        Self {
            capture,
            enricher,
            store,
        }
    }

    pub fn store(&self) -> &Arc<dyn SnapshotStore> {
        &self.store
    }

    /// Capture and enrich without storing anything
    pub async fn capture_only(
        &self,
        request: &CaptureRequest,
        listener: &dyn StageListener,
    ) -> Result<(Snapshot, PipelineOutcome)> {
        listener.stage(Stage::Capturing).await;
        let raw = self.capture.capture(&request.url, request.delay_ms).await?;

        let mut har = HarReader::from_str(&raw)?;
        HarReader::validate(&har)?;
        request.tag.apply(&mut har);

        listener.stage(Stage::Enriching).await;
        let enriched = self.enricher.enrich(har).await;

        let outcome = PipelineOutcome {
            entries: enriched.har.log.entries.len(),
            failed_entries: enriched.report.failed,
        };
        Ok((Snapshot::new(enriched.har), outcome))
    }

    /// Capture, enrich and append; returns what was stored
    pub async fn run(
        &self,
        request: &CaptureRequest,
        listener: &dyn StageListener,
    ) -> Result<(Snapshot, PipelineOutcome)> {
        let (snapshot, outcome) = self.capture_only(request, listener).await?;

        listener.stage(Stage::Storing).await;
        let key = StoreKey::for_url(&request.url);
        self.store.append(&key, &snapshot).await?;

        tracing::info!(
            "Stored snapshot {} of {} ({} entries, {} failed)",
            request.tag.snapshot_ref,
            request.url,
            outcome.entries,
            outcome.failed_entries
        );
        Ok((snapshot, outcome))
    }
}
