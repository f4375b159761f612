//! Bounded lifetimes for the in-memory stores.
//!
//! Idle sessions and finished upload jobs are dropped by a periodic sweep.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::session::SessionStore;
use crate::upload::JobStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retention {
    /// A session untouched for this long is dropped.
    pub session_ttl: chrono::Duration,
    /// A finished job older than this is dropped.
    pub job_ttl: chrono::Duration,
    pub sweep_interval: Duration,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub sessions: usize,
    pub jobs: usize,
}

/// One sweep as of `now`.
pub async fn sweep_once(
    sessions: &SessionStore,
    jobs: &JobStore,
    retention: Retention,
    now: DateTime<Utc>,
) -> SweepReport {
    SweepReport {
        sessions: sessions.evict_idle(now - retention.session_ttl).await,
        jobs: jobs.evict_finished(now - retention.job_ttl).await,
    }
}

/// Sweeps every `sweep_interval` until the task is dropped.
pub async fn run_sweeper(sessions: SessionStore, jobs: JobStore, retention: Retention) {
    let mut interval = tokio::time::interval(retention.sweep_interval.max(Duration::from_secs(1)));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        let report = sweep_once(&sessions, &jobs, retention, Utc::now()).await;
        if report == SweepReport::default() {
            debug!("Retention sweep: nothing to evict");
        } else {
            info!(
                "Retention sweep evicted {} sessions and {} upload jobs",
                report.sessions, report.jobs
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::EditingSession;
    use crate::upload::{JobStatus, UploadJob};
    use serde_json::json;

    fn retention() -> Retention {
        Retention {
            session_ttl: chrono::Duration::hours(24),
            job_ttl: chrono::Duration::hours(1),
            sweep_interval: Duration::from_secs(300),
        }
    }

    #[tokio::test]
    async fn test_sweep_applies_each_ttl() {
        let sessions = SessionStore::new();
        let jobs = JobStore::new();
        let now = Utc::now();

        let kept = sessions.insert(EditingSession::from_raw(&json!({ "name": "A" }))).await;
        let mut stale = EditingSession::from_raw(&json!({ "name": "B" }));
        stale.updated_at = now - chrono::Duration::hours(25);
        let stale = sessions.insert(stale).await;

        let mut done = UploadJob::new("uploads/a.pdf".into());
        done.status = JobStatus::Cancelled;
        done.created_at = now - chrono::Duration::hours(2);
        let done_id = done.id;
        jobs.insert(done).await;

        let report = sweep_once(&sessions, &jobs, retention(), now).await;
        assert_eq!(report, SweepReport { sessions: 1, jobs: 1 });
        assert!(sessions.get(kept).await.is_some());
        assert!(sessions.get(stale).await.is_none());
        assert!(jobs.get(done_id).await.is_none());

        assert_eq!(sweep_once(&sessions, &jobs, retention(), now).await, SweepReport::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_runs_on_interval() {
        let sessions = SessionStore::new();
        let jobs = JobStore::new();
        let mut stale = EditingSession::from_raw(&json!({ "name": "B" }));
        stale.updated_at = Utc::now() - chrono::Duration::hours(25);
        let stale = sessions.insert(stale).await;

        let task = tokio::spawn(run_sweeper(sessions.clone(), jobs, retention()));
        // the first tick fires immediately
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(sessions.get(stale).await.is_none());
        task.abort();
    }
}
