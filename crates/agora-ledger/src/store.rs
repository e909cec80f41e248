//! Append-only job store
//!
//! Jobs live in an index-stable sequence: ids are assigned densely from 0,
//! never reused and never deleted, so `JobId` doubles as the index. Each job
//! sits behind its own async mutex, which gives every operation exclusive
//! access to exactly one job; operations on different jobs never contend,
//! and reads only need a snapshot clone.

use std::sync::Arc;

use agora_types::{AgoraError, Job, JobId, Result};
use tokio::sync::{Mutex, RwLock};

/// Shared, append-only collection of jobs
#[derive(Clone, Default)]
pub struct JobStore {
    jobs: Arc<RwLock<Vec<Arc<Mutex<Job>>>>>,
}

impl JobStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of jobs ever posted
    pub async fn len(&self) -> u64 {
        self.jobs.read().await.len() as u64
    }

    /// Check whether the store is empty
    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    /// The handle for a job, or `JobNotFound`
    pub async fn get(&self, job_id: JobId) -> Result<Arc<Mutex<Job>>> {
        let jobs = self.jobs.read().await;
        jobs.get(job_id.index())
            .cloned()
            .ok_or(AgoraError::JobNotFound { job_id: job_id.0 })
    }

    /// A snapshot clone of a job's current state
    pub async fn snapshot(&self, job_id: JobId) -> Result<Job> {
        let handle = self.get(job_id).await?;
        let job = handle.lock().await;
        Ok(job.clone())
    }

    /// Append a job built from the id it will receive
    ///
    /// The write lock is held while `build` runs (including across its await),
    /// so the reserved id is committed or dropped atomically: if `build` fails
    /// nothing is appended and the id goes to the next posting.
    pub async fn append_with<F, Fut>(&self, build: F) -> Result<JobId>
    where
        F: FnOnce(JobId) -> Fut,
        Fut: std::future::Future<Output = Result<Job>>,
    {
        let mut jobs = self.jobs.write().await;
        let job_id = JobId(jobs.len() as u64);
        let job = build(job_id).await?;
        jobs.push(Arc::new(Mutex::new(job)));
        Ok(job_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_types::{AgentId, Amount, JobStatus};
    use chrono::Utc;

    fn job(id: JobId) -> Job {
        Job {
            id,
            requester: AgentId::new(),
            description: "test".to_string(),
            min_price: Amount::new(1),
            max_price: Amount::new(2),
            auction_start: Utc::now(),
            auction_duration_secs: 60,
            work_deadline_secs: 60,
            claimed_at: None,
            worker: None,
            worker_registry_id: None,
            submission_uri: None,
            locked_amount: Amount::zero(),
            rating: None,
            status: JobStatus::Open,
        }
    }

    #[tokio::test]
    async fn test_ids_are_dense_and_stable() {
        let store = JobStore::new();
        assert!(store.is_empty().await);

        let a = store.append_with(|id| async move { Ok(job(id)) }).await.unwrap();
        let b = store.append_with(|id| async move { Ok(job(id)) }).await.unwrap();

        assert_eq!(a, JobId(0));
        assert_eq!(b, JobId(1));
        assert_eq!(store.len().await, 2);
        assert_eq!(store.snapshot(a).await.unwrap().id, a);
    }

    #[tokio::test]
    async fn test_failed_build_does_not_burn_id() {
        let store = JobStore::new();

        let result = store
            .append_with(|_| async move {
                Err(AgoraError::invalid_input("description", "must not be empty"))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(store.len().await, 0);

        // The next posting still gets id 0
        let id = store.append_with(|id| async move { Ok(job(id)) }).await.unwrap();
        assert_eq!(id, JobId(0));
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let store = JobStore::new();
        assert!(matches!(
            store.snapshot(JobId(9)).await,
            Err(AgoraError::JobNotFound { job_id: 9 })
        ));
    }
}
