//! Capture job tracking.
//!
//! Every capture request becomes a job that runs the pipeline on its own
//! tokio task. The registry keeps the job's observable status and the task's
//! abort handle so a running capture can be cancelled. Only the most recently
//! finished jobs are remembered.

use crate::pipeline::{CapturePipeline, CaptureRequest, Stage, StageListener};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::AbortHandle;
use uuid::Uuid;

/// Finished jobs kept for polling unless configured otherwise
pub const DEFAULT_FINISHED_JOBS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum JobStatus {
    Queued,
    Capturing,
    Enriching,
    Storing,
    #[serde(rename_all = "camelCase")]
    Completed {
        entries: usize,
        failed_entries: usize,
    },
    Failed {
        error: String,
    },
    Cancelled,
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed { .. } | JobStatus::Failed { .. } | JobStatus::Cancelled
        )
    }
}

impl From<Stage> for JobStatus {
    fn from(stage: Stage) -> Self {
        match stage {
            Stage::Capturing => JobStatus::Capturing,
            Stage::Enriching => JobStatus::Enriching,
            Stage::Storing => JobStatus::Storing,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureJob {
    pub id: Uuid,
    pub url: String,
    #[serde(rename = "ref")]
    pub snapshot_ref: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

struct JobSlot {
    job: CaptureJob,
    handle: Option<AbortHandle>,
}

/// Owns every submitted capture job
#[derive(Clone)]
pub struct JobRegistry {
    pipeline: Arc<CapturePipeline>,
    jobs: Arc<RwLock<HashMap<Uuid, JobSlot>>>,
    keep_finished: usize,
}

impl JobRegistry {
    pub fn new(pipeline: CapturePipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            jobs: Arc::new(RwLock::new(HashMap::new())),
            keep_finished: DEFAULT_FINISHED_JOBS,
        }
    }

    /// Remember at most `keep` finished jobs; older ones are forgotten
    pub fn with_finished_limit(mut self, keep: usize) -> Self {
        self.keep_finished = keep;
        self
    }

    pub fn pipeline(&self) -> &CapturePipeline {
        &self.pipeline
    }

    /// Queue a capture and return immediately with the queued job
    pub async fn submit(&self, request: CaptureRequest) -> CaptureJob {
        let now = Utc::now();
        let job = CaptureJob {
            id: Uuid::new_v4(),
            url: request.url.clone(),
            snapshot_ref: request.tag.snapshot_ref.clone(),
            status: JobStatus::Queued,
            created_at: now,
            updated_at: now,
        };
        let id = job.id;

        tracing::info!("Queued capture job {} for {} (ref {})", id, job.url, job.snapshot_ref);

        // Hold the write lock across spawn so the task cannot finish before
        // its handle is recorded
        let mut jobs = self.jobs.write().await;
        jobs.insert(
            id,
            JobSlot {
                job: job.clone(),
                handle: None,
            },
        );

        let registry = self.clone();
        let task = tokio::spawn(async move { registry.execute(id, request).await });
        if let Some(slot) = jobs.get_mut(&id) {
            slot.handle = Some(task.abort_handle());
        }

        job
    }

    pub async fn get(&self, id: Uuid) -> Option<CaptureJob> {
        self.jobs.read().await.get(&id).map(|slot| slot.job.clone())
    }

    /// All known jobs, oldest first
    pub async fn list(&self) -> Vec<CaptureJob> {
        let mut jobs: Vec<CaptureJob> = self
            .jobs
            .read()
            .await
            .values()
            .map(|slot| slot.job.clone())
            .collect();
        jobs.sort_by_key(|job| job.created_at);
        jobs
    }

    /// Abort a job's task and mark it cancelled.
    ///
    /// Finished jobs, and jobs already storing their snapshot, are returned
    /// unchanged: a stored snapshot cannot be taken back. `None` if the id is
    /// unknown.
    pub async fn cancel(&self, id: Uuid) -> Option<CaptureJob> {
        let mut jobs = self.jobs.write().await;
        let slot = jobs.get_mut(&id)?;

        if slot.job.status == JobStatus::Storing {
            tracing::info!("Capture job {} is storing, not cancelled", id);
        } else if !slot.job.status.is_finished() {
            if let Some(handle) = slot.handle.take() {
                handle.abort();
            }
            slot.job.status = JobStatus::Cancelled;
            slot.job.updated_at = Utc::now();
            tracing::info!("Cancelled capture job {}", id);
        }

        let job = slot.job.clone();
        self.prune(&mut jobs);
        Some(job)
    }

    /// Abort every unfinished job, used on shutdown
    pub async fn cancel_all(&self) {
        let ids: Vec<Uuid> = self
            .jobs
            .read()
            .await
            .iter()
            .filter(|(_, slot)| !slot.job.status.is_finished())
            .map(|(id, _)| *id)
            .collect();

        for id in ids {
            self.cancel(id).await;
        }
    }

    async fn execute(&self, id: Uuid, request: CaptureRequest) {
        let listener = JobListener { registry: self, id };

        let status = match self.pipeline.run(&request, &listener).await {
            Ok((_, outcome)) => JobStatus::Completed {
                entries: outcome.entries,
                failed_entries: outcome.failed_entries,
            },
            Err(e) => {
                tracing::error!("Capture job {} for {} failed: {}", id, request.url, e);
                JobStatus::Failed {
                    error: e.to_string(),
                }
            }
        };

        self.update(id, status).await;
    }

    async fn update(&self, id: Uuid, status: JobStatus) {
        let mut jobs = self.jobs.write().await;
        let Some(slot) = jobs.get_mut(&id) else {
            return;
        };
        if slot.job.status.is_finished() {
            return;
        }

        tracing::info!("Capture job {}: {:?}", id, status);
        slot.job.status = status;
        slot.job.updated_at = Utc::now();
        if slot.job.status.is_finished() {
            slot.handle = None;
            self.prune(&mut jobs);
        }
    }

    /// Forget the oldest finished jobs beyond the configured limit
    fn prune(&self, jobs: &mut HashMap<Uuid, JobSlot>) {
        let mut finished: Vec<(DateTime<Utc>, Uuid)> = jobs
            .iter()
            .filter(|(_, slot)| slot.job.status.is_finished())
            .map(|(id, slot)| (slot.job.updated_at, *id))
            .collect();
        if finished.len() <= self.keep_finished {
            return;
        }

        finished.sort();
        let excess = finished.len() - self.keep_finished;
        for (_, id) in finished.into_iter().take(excess) {
            jobs.remove(&id);
        }
        tracing::debug!("Forgot {} finished capture jobs", excess);
    }
}

struct JobListener<'a> {
    registry: &'a JobRegistry,
    id: Uuid,
}

#[async_trait]
impl StageListener for JobListener<'_> {
    async fn stage(&self, stage: Stage) {
        self.registry.update(self.id, stage.into()).await;
    }
}
