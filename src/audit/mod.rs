//! Audit trail for finished jobs
//!
//! One entry per terminal job, keyed by job id.

use crate::models::{JobStatus, StageTrace, WorkflowKind, WorkflowRequest};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEntry {
    pub audit_id: Uuid,
    pub job_id: String,
    pub workflow_type: WorkflowKind,
    /// SHA-256 of the submitted request
    pub request_hash: String,
    pub outcome: JobStatus,
    pub stages: Vec<StageTrace>,
    pub error: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Audit trail storage
pub struct AuditLog {
    entries: Arc<RwLock<HashMap<String, AuditEntry>>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Store an entry, replacing any earlier one for the same job
    pub async fn record(&self, entry: AuditEntry) -> Result<Uuid> {
        let audit_id = entry.audit_id;
        let mut entries = self.entries.write().await;
        entries.insert(entry.job_id.clone(), entry);
        Ok(audit_id)
    }

    pub async fn get(&self, job_id: &str) -> Result<Option<AuditEntry>> {
        let entries = self.entries.read().await;
        Ok(entries.get(job_id).cloned())
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute SHA256 hash of a request
/// Streams the JSON straight into the hasher
pub fn compute_request_hash(request: &WorkflowRequest) -> Result<String> {
    let mut hasher = Sha256::new();
    serde_json::to_writer(&mut HashWriter(&mut hasher), request)?;

    Ok(hex::encode(hasher.finalize()))
}

/// Adapter to allow writing into Sha256 via std::io::Write
struct HashWriter<'a, H: Digest>(&'a mut H);

impl<'a, H: Digest> Write for HashWriter<'a, H> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
