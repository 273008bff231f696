// Job record storage

use crate::models::Job;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Storage seam for job records; the registry never touches a global map
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn insert(&self, job: Job);

    /// Consistent snapshot of a job
    async fn get(&self, id: Uuid) -> Option<Job>;

    /// Apply a mutation to the stored job; returns false when the job is
    /// unknown (evicted or never inserted)
    async fn update(&self, id: Uuid, update: Box<dyn for<'a> FnOnce(&'a mut Job) + Send + 'static>) -> bool;
}

/// Process-local job store with TTL eviction of terminal jobs.
///
/// Each job sits behind its own lock so the pipeline task mutating one job
/// never contends with readers of another.
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<Uuid, Arc<RwLock<Job>>>>,
    /// Terminal jobs older than this are swept on insert; 0 disables eviction
    ttl_seconds: u64,
}

impl InMemoryJobStore {
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            ttl_seconds,
        }
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    async fn evict_expired(&self) {
        if self.ttl_seconds == 0 {
            return;
        }
        let cutoff = Utc::now() - Duration::seconds(self.ttl_seconds as i64);

        let mut expired = Vec::new();
        {
            let jobs = self.jobs.read().await;
            for (id, slot) in jobs.iter() {
                let job = slot.read().await;
                if job.status.is_terminal()
                    && job.completed_at.map(|t| t < cutoff).unwrap_or(false)
                {
                    expired.push(*id);
                }
            }
        }

        if !expired.is_empty() {
            let mut jobs = self.jobs.write().await;
            for id in &expired {
                jobs.remove(id);
            }
            debug!(evicted = expired.len(), "Evicted expired jobs");
        }
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn insert(&self, job: Job) {
        self.evict_expired().await;
        self.jobs
            .write()
            .await
            .insert(job.id, Arc::new(RwLock::new(job)));
    }

    async fn get(&self, id: Uuid) -> Option<Job> {
        let slot = self.jobs.read().await.get(&id).cloned()?;
        let job = slot.read().await;
        Some(job.clone())
    }

    async fn update(&self, id: Uuid, update: Box<dyn for<'a> FnOnce(&'a mut Job) + Send + 'static>) -> bool {
        let slot = match self.jobs.read().await.get(&id).cloned() {
            Some(slot) => slot,
            None => return false,
        };
        let mut job = slot.write().await;
        update(&mut job);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExecutionMode, JobRequest, JobStatus};
    use std::collections::HashMap as StdHashMap;

    fn make_job() -> Job {
        Job::new(
            Uuid::new_v4(),
            JobRequest {
                script: "out := input;".to_string(),
                mode: ExecutionMode::InMemory,
                target: None,
                inputs: StdHashMap::new(),
                outputs: StdHashMap::new(),
            },
        )
    }

    #[tokio::test]
    async fn test_insert_get_update() {
        let store = InMemoryJobStore::new(0);
        let job = make_job();
        let id = job.id;

        store.insert(job).await;
        assert_eq!(store.get(id).await.unwrap().status, JobStatus::Running);

        let updated = store
            .update(id, Box::new(|job| job.status = JobStatus::Done))
            .await;
        assert!(updated);
        assert_eq!(store.get(id).await.unwrap().status, JobStatus::Done);
    }

    #[tokio::test]
    async fn test_unknown_id() {
        let store = InMemoryJobStore::new(0);
        assert!(store.get(Uuid::new_v4()).await.is_none());
        assert!(!store.update(Uuid::new_v4(), Box::new(|_| {})).await);
    }

    #[tokio::test]
    async fn test_ttl_evicts_old_terminal_jobs() {
        let store = InMemoryJobStore::new(60);

        let mut old = make_job();
        old.status = JobStatus::Done;
        old.completed_at = Some(Utc::now() - Duration::seconds(3600));
        let old_id = old.id;
        store.insert(old).await;

        // Running jobs are never evicted, regardless of age
        let mut running = make_job();
        running.created_at = Utc::now() - Duration::seconds(3600);
        let running_id = running.id;
        store.insert(running).await;

        // Sweep happens on the next insert
        store.insert(make_job()).await;

        assert!(store.get(old_id).await.is_none());
        assert!(store.get(running_id).await.is_some());
    }

    #[tokio::test]
    async fn test_ttl_zero_disables_eviction() {
        let store = InMemoryJobStore::new(0);

        let mut old = make_job();
        old.status = JobStatus::Done;
        old.completed_at = Some(Utc::now() - Duration::seconds(86_400));
        let old_id = old.id;
        store.insert(old).await;
        store.insert(make_job()).await;

        assert!(store.get(old_id).await.is_some());
    }
}
