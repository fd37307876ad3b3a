//! Workflow orchestrator
//!
//! SUBMIT → VALIDATE → COMPOSE → CREATE JOB (RUNNING) → SPAWN → EXECUTE → COMPLETE | FAIL
//!
//! Validation and composition run on the caller's path, so a bad request is
//! rejected before any job exists. Execution runs in its own tokio task and
//! only ever reports back through the job store.

use crate::audit::{compute_request_hash, AuditEntry, AuditLog};
use crate::config::Settings;
use crate::error::OrchestrationError;
use crate::execution::ExecutionEngine;
use crate::models::{
    JobAccepted, JobRecord, JobResults, JobStatus, StageTrace, WorkflowKind, WorkflowRequest,
};
use crate::pipeline::{Pipeline, PipelineComposer};
use crate::reasoning::{GroqClient, MockReasoningService, ReasoningService};
use crate::registry::CapabilityRegistry;
use crate::state::{InMemoryJobStore, JobStore};
use crate::Result;
use chrono::Utc;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

/// A job that has been accepted and dispatched
pub struct DispatchedJob {
    pub accepted: JobAccepted,
    pub handle: JoinHandle<()>,
}

/// Main orchestrator that coordinates composition, dispatch and tracking
pub struct Orchestrator {
    composer: PipelineComposer,
    execution_engine: Arc<ExecutionEngine>,
    job_store: Arc<dyn JobStore>,
    audit_log: Option<Arc<AuditLog>>,
}

impl Orchestrator {
    pub fn new(
        composer: PipelineComposer,
        execution_engine: ExecutionEngine,
        job_store: Arc<dyn JobStore>,
        audit_log: Option<AuditLog>,
    ) -> Self {
        Self {
            composer,
            execution_engine: Arc::new(execution_engine),
            job_store,
            audit_log: audit_log.map(Arc::new),
        }
    }

    /// Wire the standard registry, an in-memory store and the configured
    /// reasoning service. Without an API key the offline mock is used.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let reasoning: Arc<dyn ReasoningService> = match &settings.llm.api_key {
            Some(key) => {
                info!(model = %settings.llm.model, "Using Groq reasoning service");
                Arc::new(GroqClient::new(key.clone(), &settings.llm)?)
            }
            None => {
                warn!("GROQ_API_KEY not set, falling back to mock reasoning service");
                Arc::new(MockReasoningService)
            }
        };

        let engine = ExecutionEngine::new(reasoning).with_stage_timeout(settings.stage_timeout);
        let audit_log = settings.enable_audit_log.then(AuditLog::new);

        Ok(Self::new(
            PipelineComposer::new(Arc::new(CapabilityRegistry::standard())),
            engine,
            Arc::new(InMemoryJobStore::new()),
            audit_log,
        ))
    }

    /// Accept a request and return as soon as the job is RUNNING
    pub async fn submit(&self, kind: WorkflowKind, request: WorkflowRequest) -> Result<JobAccepted> {
        Ok(self.dispatch(kind, request).await?.accepted)
    }

    /// Accept a request and keep the handle of the spawned job
    pub async fn dispatch(&self, kind: WorkflowKind, request: WorkflowRequest) -> Result<DispatchedJob> {
        request.validate_for(kind)?;
        let pipeline = self.composer.compose(kind, &request)?;
        let request_hash = match self.audit_log {
            Some(_) => Some(compute_request_hash(&request)?),
            None => None,
        };

        let job_id = self.job_store.create(kind, &request).await?;

        info!(
            job_id = %job_id,
            workflow_type = %kind,
            user_id = %request.user_id,
            organization_id = %request.organization_id,
            priority = request.priority,
            stages = pipeline.len(),
            "Job accepted"
        );

        let job = JobRun {
            job_id: job_id.clone(),
            kind,
            request_hash,
            engine: Arc::clone(&self.execution_engine),
            store: Arc::clone(&self.job_store),
            audit_log: self.audit_log.clone(),
        };

        let handle = tokio::spawn(job.run(pipeline));

        Ok(DispatchedJob {
            accepted: JobAccepted {
                job_id,
                status: JobStatus::Running,
                workflow_type: kind,
            },
            handle,
        })
    }

    /// Submit and wait for the terminal record
    pub async fn run_to_completion(
        &self,
        kind: WorkflowKind,
        request: WorkflowRequest,
    ) -> Result<JobRecord> {
        let job = self.dispatch(kind, request).await?;

        job.handle
            .await
            .map_err(|e| OrchestrationError::Internal(format!("job supervisor failed: {}", e)))?;

        self.job_store.get(&job.accepted.job_id).await
    }

    pub async fn get_job(&self, job_id: &str) -> Result<JobRecord> {
        self.job_store.get(job_id).await
    }

    pub async fn list_jobs(&self) -> Result<Vec<JobRecord>> {
        self.job_store.list().await
    }

    /// Results exist only once the job has succeeded
    pub async fn get_results(&self, job_id: &str) -> Result<JobResults> {
        let record = self.job_store.get(job_id).await?;

        match (record.status, record.results, record.recommendations) {
            (JobStatus::Success, Some(results), Some(recommendations)) => Ok(JobResults {
                job_id: record.job_id,
                results,
                recommendations,
            }),
            (status, _, _) => Err(OrchestrationError::ResultsUnavailable(format!(
                "job {} is {}, not completed successfully",
                job_id, status
            ))),
        }
    }

    pub async fn get_audit(&self, job_id: &str) -> Result<AuditEntry> {
        let audit_log = self.audit_log.as_ref().ok_or_else(|| {
            OrchestrationError::AuditError("audit log is disabled".to_string())
        })?;

        audit_log
            .get(job_id)
            .await?
            .ok_or_else(|| OrchestrationError::NotFound(format!("audit entry for {}", job_id)))
    }
}

/// Everything a spawned job needs, owned so the task is `'static`
struct JobRun {
    job_id: String,
    kind: WorkflowKind,
    request_hash: Option<String>,
    engine: Arc<ExecutionEngine>,
    store: Arc<dyn JobStore>,
    audit_log: Option<Arc<AuditLog>>,
}

impl JobRun {
    /// Outermost boundary of a job: every outcome, panics included,
    /// ends as a terminal record.
    async fn run(self, pipeline: Pipeline) {
        let engine = Arc::clone(&self.engine);
        let worker = tokio::spawn(async move { engine.execute(&pipeline).await });

        let outcome = match worker.await {
            Ok(outcome) => outcome,
            Err(e) => Err(OrchestrationError::Internal(format!(
                "pipeline task aborted: {}",
                e
            ))),
        };

        match outcome {
            Ok(result) => {
                let stages = result.stages.clone();
                match self.store.complete(&self.job_id, result).await {
                    Ok(record) => {
                        info!(
                            job_id = %self.job_id,
                            workflow_type = %self.kind,
                            execution_time = ?record.execution_time,
                            "Job completed"
                        );
                        self.audit(JobStatus::Success, stages, None).await;
                    }
                    Err(e) => error!(job_id = %self.job_id, error = %e, "Failed to store job result"),
                }
            }
            Err(e) => {
                let message = e.to_string();
                warn!(
                    job_id = %self.job_id,
                    workflow_type = %self.kind,
                    error = %message,
                    "Job failed"
                );
                match self.store.fail(&self.job_id, &message).await {
                    Ok(_) => self.audit(JobStatus::Failed, Vec::new(), Some(message)).await,
                    Err(e) => error!(job_id = %self.job_id, error = %e, "Failed to store job failure"),
                }
            }
        }
    }

    async fn audit(&self, outcome: JobStatus, stages: Vec<StageTrace>, error: Option<String>) {
        let (Some(audit_log), Some(request_hash)) = (&self.audit_log, &self.request_hash) else {
            return;
        };

        let entry = AuditEntry {
            audit_id: Uuid::new_v4(),
            job_id: self.job_id.clone(),
            workflow_type: self.kind,
            request_hash: request_hash.clone(),
            outcome,
            stages,
            error,
            recorded_at: Utc::now(),
        };

        if let Err(e) = audit_log.record(entry).await {
            warn!(job_id = %self.job_id, error = %e, "Failed to record audit entry");
        }
    }
}
