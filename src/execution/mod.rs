//! Execution engine for composed pipelines
//!
//! Stages run strictly in order, one reasoning call each. Any failure
//! aborts the whole pipeline; nothing is retried here.

use crate::error::OrchestrationError;
use crate::models::{extract_recommendations, ExecutionResult, StageTrace};
use crate::pipeline::Pipeline;
use crate::reasoning::ReasoningService;
use crate::Result;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Runs pipelines against the reasoning service
pub struct ExecutionEngine {
    reasoning: Arc<dyn ReasoningService>,
    stage_timeout: Option<Duration>,
}

impl ExecutionEngine {
    pub fn new(reasoning: Arc<dyn ReasoningService>) -> Self {
        Self {
            reasoning,
            stage_timeout: None,
        }
    }

    /// Bound each reasoning call; an elapsed call fails the pipeline
    pub fn with_stage_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.stage_timeout = timeout;
        self
    }

    async fn call(&self, prompt: &str) -> Result<String> {
        match self.stage_timeout {
            Some(limit) => tokio::time::timeout(limit, self.reasoning.complete(prompt))
                .await
                .map_err(|_| {
                    OrchestrationError::ServiceError(format!(
                        "reasoning call timed out after {}s",
                        limit.as_secs()
                    ))
                })?,
            None => self.reasoning.complete(prompt).await,
        }
    }

    /// Execute every stage in order; the last stage's output is the result
    pub async fn execute(&self, pipeline: &Pipeline) -> Result<ExecutionResult> {
        if pipeline.is_empty() {
            return Err(OrchestrationError::InvalidRequest(format!(
                "{} pipeline has no stages",
                pipeline.kind
            )));
        }

        let mut traces = Vec::with_capacity(pipeline.len());
        let mut last_output = String::new();

        debug!(workflow_type = %pipeline.kind, stages = pipeline.len(), "Starting pipeline execution");

        for (index, stage) in pipeline.stages.iter().enumerate() {
            let order = index + 1;
            debug!(
                stage = order,
                role = %stage.agent.role,
                task = %stage.task.template,
                "Running stage"
            );

            let start = Instant::now();
            let output = self.call(&stage.prompt()).await.map_err(|e| {
                warn!(
                    stage = order,
                    role = %stage.agent.role,
                    error = %e,
                    "Halting pipeline due to stage failure"
                );
                match e {
                    OrchestrationError::ServiceError(msg) => OrchestrationError::ServiceError(
                        format!("stage {} ({}) failed: {}", order, stage.task.template, msg),
                    ),
                    other => other,
                }
            })?;

            traces.push(StageTrace {
                order,
                role: stage.agent.role.clone(),
                task: stage.task.template.name().to_string(),
                duration_ms: start.elapsed().as_millis() as u64,
                output_chars: output.len(),
            });

            last_output = output;
        }

        debug!(workflow_type = %pipeline.kind, "Pipeline execution completed");

        Ok(ExecutionResult {
            recommendations: extract_recommendations(pipeline.kind, &last_output),
            results: last_output,
            stages: traces,
        })
    }
}
