use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Lifecycle of one upload: pending until the poll resolves, then terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    #[serde(rename_all = "camelCase")]
    Ready {
        session_id: Uuid,
    },
    Failed {
        message: String,
    },
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Pending)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadJob {
    pub id: Uuid,
    pub locator: String,
    #[serde(flatten)]
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    cancel: CancellationToken,
}

impl UploadJob {
    pub fn new(locator: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            locator,
            status: JobStatus::Pending,
            created_at: Utc::now(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// In-memory upload jobs, keyed by job id.
#[derive(Clone, Default)]
pub struct JobStore {
    jobs: Arc<RwLock<HashMap<Uuid, UploadJob>>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, job: UploadJob) {
        self.jobs.write().await.insert(job.id, job);
    }

    pub async fn get(&self, id: Uuid) -> Option<UploadJob> {
        self.jobs.read().await.get(&id).cloned()
    }

    /// Moves a pending job to `status`. Terminal jobs are left as they are, so a poll
    /// that finishes after cancellation cannot overwrite `Cancelled`.
    pub async fn finish(&self, id: Uuid, status: JobStatus) -> bool {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(&id) {
            Some(job) if !job.status.is_terminal() => {
                job.status = status;
                true
            }
            _ => false,
        }
    }

    /// Cancels a pending job and its poll. Returns the job as it stands afterwards.
    pub async fn cancel(&self, id: Uuid) -> Option<UploadJob> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(&id)?;
        if !job.status.is_terminal() {
            job.cancel.cancel();
            job.status = JobStatus::Cancelled;
        }
        Some(job.clone())
    }

    /// Drops finished jobs created before `cutoff`. Pending jobs are kept.
    pub async fn evict_finished(&self, cutoff: DateTime<Utc>) -> usize {
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, job| !job.status.is_terminal() || job.created_at >= cutoff);
        before - jobs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_finish_only_moves_pending_jobs() {
        let store = JobStore::new();
        let job = UploadJob::new("uploads/a.pdf".into());
        let id = job.id;
        store.insert(job).await;

        let session_id = Uuid::new_v4();
        assert!(store.finish(id, JobStatus::Ready { session_id }).await);
        assert!(!store.finish(id, JobStatus::Failed { message: "late".into() }).await);
        assert_eq!(store.get(id).await.unwrap().status, JobStatus::Ready { session_id });
    }

    #[tokio::test]
    async fn test_cancel_fires_token_and_sticks() {
        let store = JobStore::new();
        let job = UploadJob::new("uploads/a.pdf".into());
        let id = job.id;
        let token = job.cancel_token();
        store.insert(job).await;

        let cancelled = store.cancel(id).await.unwrap();
        assert_eq!(cancelled.status, JobStatus::Cancelled);
        assert!(token.is_cancelled());
        assert!(!store.finish(id, JobStatus::Ready { session_id: Uuid::new_v4() }).await);
        assert!(store.cancel(Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn test_eviction_keeps_pending_and_recent_jobs() {
        let store = JobStore::new();
        let cutoff = Utc::now();

        let mut old_done = UploadJob::new("uploads/old.pdf".into());
        old_done.created_at = cutoff - chrono::Duration::hours(2);
        old_done.status = JobStatus::Cancelled;
        let mut old_pending = UploadJob::new("uploads/slow.pdf".into());
        old_pending.created_at = cutoff - chrono::Duration::hours(2);
        let mut recent_done = UploadJob::new("uploads/new.pdf".into());
        recent_done.status = JobStatus::Failed { message: "x".into() };

        let (old_done_id, old_pending_id, recent_id) = (old_done.id, old_pending.id, recent_done.id);
        for job in [old_done, old_pending, recent_done] {
            store.insert(job).await;
        }

        assert_eq!(store.evict_finished(cutoff).await, 1);
        assert!(store.get(old_done_id).await.is_none());
        assert!(store.get(old_pending_id).await.is_some());
        assert!(store.get(recent_id).await.is_some());
    }

    #[test]
    fn test_job_wire_shape() {
        let mut job = UploadJob::new("uploads/a.pdf".into());
        job.status = JobStatus::Failed {
            message: "gave up".into(),
        };
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["status"], "failed");
        assert_eq!(value["message"], "gave up");
        assert_eq!(value["locator"], json!("uploads/a.pdf"));
        assert!(value.get("cancel").is_none());
    }
}
