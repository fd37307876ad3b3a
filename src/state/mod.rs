//! Job store and lifecycle tracker
//!
//! Process-wide mapping from job id to record. In-memory only; records
//! live until the process exits.

use crate::error::OrchestrationError;
use crate::models::{ExecutionResult, JobRecord, JobStatus, WorkflowKind, WorkflowRequest};
use crate::Result;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

/// Trait for job state storage
///
/// A terminal record is final: a second `complete`/`fail` on the same job
/// is rejected with `InvalidTransition` and leaves the record untouched.
#[async_trait::async_trait]
pub trait JobStore: Send + Sync {
    async fn create(&self, kind: WorkflowKind, request: &WorkflowRequest) -> Result<String>;
    async fn get(&self, job_id: &str) -> Result<JobRecord>;
    async fn complete(&self, job_id: &str, result: ExecutionResult) -> Result<JobRecord>;
    async fn fail(&self, job_id: &str, error: &str) -> Result<JobRecord>;
    async fn list(&self) -> Result<Vec<JobRecord>>;
}

/// In-memory job store guarded by a single lock
pub struct InMemoryJobStore {
    jobs: Arc<RwLock<HashMap<String, JobRecord>>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Apply a terminal transition under the write lock
    async fn finish<F>(&self, job_id: &str, apply: F) -> Result<JobRecord>
    where
        F: FnOnce(&mut JobRecord) + Send,
    {
        let mut jobs = self.jobs.write().await;

        let record = jobs
            .get_mut(job_id)
            .ok_or_else(|| OrchestrationError::NotFound(job_id.to_string()))?;

        if record.status.is_terminal() {
            warn!(job_id, status = %record.status, "Rejecting second terminal transition");
            return Err(OrchestrationError::InvalidTransition(format!(
                "job {} is already {}",
                job_id, record.status
            )));
        }

        let now = Utc::now();
        apply(record);
        record.completed_at = Some(now);
        record.execution_time =
            Some((now - record.created_at).num_milliseconds() as f64 / 1000.0);

        Ok(record.clone())
    }
}

impl Default for InMemoryJobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl JobStore for InMemoryJobStore {

    async fn create(&self, kind: WorkflowKind, request: &WorkflowRequest) -> Result<String> {
        let job_id = Uuid::new_v4().to_string();

        // PENDING is never stored: dispatch follows immediately
        let record = JobRecord {
            job_id: job_id.clone(),
            workflow_type: kind,
            status: JobStatus::Running,
            results: None,
            recommendations: None,
            error_message: None,
            user_id: request.user_id.clone(),
            organization_id: request.organization_id.clone(),
            priority: request.priority,
            created_at: Utc::now(),
            completed_at: None,
            execution_time: None,
        };

        self.jobs.write().await.insert(job_id.clone(), record);
        debug!(job_id = %job_id, workflow_type = %kind, "Job created");

        Ok(job_id)
    }

    async fn get(&self, job_id: &str) -> Result<JobRecord> {
        let jobs = self.jobs.read().await;
        jobs.get(job_id)
            .cloned()
            .ok_or_else(|| OrchestrationError::NotFound(job_id.to_string()))
    }

    async fn complete(&self, job_id: &str, result: ExecutionResult) -> Result<JobRecord> {
        self.finish(job_id, move |record| {
            record.status = JobStatus::Success;
            record.results = Some(result.results);
            record.recommendations = Some(result.recommendations);
        })
        .await
    }

    async fn fail(&self, job_id: &str, error: &str) -> Result<JobRecord> {
        let message = if error.trim().is_empty() {
            "workflow failed without an error message".to_string()
        } else {
            error.to_string()
        };

        self.finish(job_id, move |record| {
            record.status = JobStatus::Failed;
            record.error_message = Some(message);
        })
        .await
    }

    async fn list(&self) -> Result<Vec<JobRecord>> {
        let jobs = self.jobs.read().await;

        let mut records: Vec<JobRecord> = jobs.values().cloned().collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(records)
    }
}
