//! REST API server for the finance workflow orchestrator
//!
//! Submissions return 202 as soon as the job is RUNNING; clients poll the
//! status and results endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::error::OrchestrationError;
use crate::models::{JobAccepted, JobRecord, JobResults, WorkflowKind, WorkflowRequest};
use crate::orchestrator::Orchestrator;
use crate::audit::AuditEntry;

const SERVICE_NAME: &str = "finance-workflow-orchestrator";

/// =============================
/// Request / Response Models
/// =============================

/// Generic submission: the workflow kind travels in the body
#[derive(Debug, Deserialize)]
pub struct SubmitJobRequest {
    pub workflow_type: String,
    #[serde(flatten)]
    pub request: WorkflowRequest,
}

/// =============================
/// Error Mapping
/// =============================

impl OrchestrationError {
    fn status_code(&self) -> StatusCode {
        match self {
            OrchestrationError::NotFound(_) => StatusCode::NOT_FOUND,
            OrchestrationError::UnsupportedWorkflowKind(_)
            | OrchestrationError::InvalidRequest(_)
            | OrchestrationError::ResultsUnavailable(_) => StatusCode::BAD_REQUEST,
            OrchestrationError::InvalidTransition(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for OrchestrationError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            warn!(error = %self, "Request failed");
        }

        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// Malformed bodies (bad JSON, wrong field types, out-of-range numbers)
/// are client errors like any other invalid request
impl From<JsonRejection> for OrchestrationError {
    fn from(rejection: JsonRejection) -> Self {
        OrchestrationError::InvalidRequest(rejection.body_text())
    }
}

type ApiResult<T> = std::result::Result<T, OrchestrationError>;

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Arc<Orchestrator>,
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Submission Endpoints
/// =============================

async fn accept(
    state: &ApiState,
    kind: WorkflowKind,
    request: WorkflowRequest,
) -> ApiResult<(StatusCode, Json<JobAccepted>)> {
    info!(workflow_type = %kind, user_id = %request.user_id, "Received workflow submission");

    let accepted = state.orchestrator.submit(kind, request).await?;
    Ok((StatusCode::ACCEPTED, Json(accepted)))
}

async fn submit_job(
    State(state): State<ApiState>,
    payload: std::result::Result<Json<SubmitJobRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<JobAccepted>)> {
    let Json(req) = payload?;
    let kind: WorkflowKind = req.workflow_type.parse()?;
    accept(&state, kind, req.request).await
}

async fn submit_workflow(
    State(state): State<ApiState>,
    Path(slug): Path<String>,
    payload: std::result::Result<Json<WorkflowRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<JobAccepted>)> {
    let kind = WorkflowKind::from_slug(&slug)?;
    let Json(request) = payload?;
    accept(&state, kind, request).await
}

/// =============================
/// Job Query Endpoints
/// =============================

async fn list_jobs(State(state): State<ApiState>) -> ApiResult<Json<Vec<JobRecord>>> {
    Ok(Json(state.orchestrator.list_jobs().await?))
}

async fn job_status(
    State(state): State<ApiState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobRecord>> {
    Ok(Json(state.orchestrator.get_job(&job_id).await?))
}

async fn job_results(
    State(state): State<ApiState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobResults>> {
    Ok(Json(state.orchestrator.get_results(&job_id).await?))
}

async fn job_audit(
    State(state): State<ApiState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<AuditEntry>> {
    // unknown job is a 404 even when no audit entry could exist
    state.orchestrator.get_job(&job_id).await?;
    Ok(Json(state.orchestrator.get_audit(&job_id).await?))
}

/// =============================
/// Router
/// =============================

pub fn create_router(orchestrator: Arc<Orchestrator>) -> Router {
    let state = ApiState { orchestrator };

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/jobs", post(submit_job).get(list_jobs))
        .route("/api/v1/jobs/:job_id/status", get(job_status))
        .route("/api/v1/jobs/:job_id/results", get(job_results))
        .route("/api/v1/jobs/:job_id/audit", get(job_audit))
        .route("/api/v1/workflows/:slug", post(submit_workflow))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(orchestrator: Arc<Orchestrator>, port: u16) -> crate::Result<()> {
    let router = create_router(orchestrator);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditLog;
    use crate::execution::ExecutionEngine;
    use crate::pipeline::PipelineComposer;
    use crate::reasoning::{MockReasoningService, ReasoningService};
    use crate::registry::CapabilityRegistry;
    use crate::state::InMemoryJobStore;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;

    fn orchestrator_with(reasoning: Arc<dyn ReasoningService>) -> Arc<Orchestrator> {
        Arc::new(Orchestrator::new(
            PipelineComposer::new(Arc::new(CapabilityRegistry::standard())),
            ExecutionEngine::new(reasoning),
            Arc::new(InMemoryJobStore::new()),
            Some(AuditLog::new()),
        ))
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn wait_for_terminal(router: &Router, job_id: &str) -> Value {
        for _ in 0..200 {
            let (_, body) = send(router.clone(), get(&format!("/api/v1/jobs/{}/status", job_id))).await;
            if body["status"] == "SUCCESS" || body["status"] == "FAILED" {
                return body;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("job {} never finished", job_id);
    }

    #[tokio::test]
    async fn test_health() {
        let router = create_router(orchestrator_with(Arc::new(MockReasoningService)));

        let (status, body) = send(router, get("/api/v1/health")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], SERVICE_NAME);
    }

    #[tokio::test]
    async fn test_submit_poll_and_fetch_results() {
        let router = create_router(orchestrator_with(Arc::new(MockReasoningService)));

        let (status, accepted) = send(
            router.clone(),
            post_json(
                "/api/v1/jobs",
                json!({
                    "workflow_type": "FINANCIAL_ANALYSIS",
                    "financial_data": {"company": "Sample Corp", "revenue": 1000000},
                    "user_id": "demo_user",
                    "organization_id": "demo_org"
                }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(accepted["status"], "RUNNING");
        assert_eq!(accepted["workflow_type"], "FINANCIAL_ANALYSIS");
        let job_id = accepted["job_id"].as_str().unwrap().to_string();

        let finished = wait_for_terminal(&router, &job_id).await;
        assert_eq!(finished["status"], "SUCCESS");
        assert!(finished["completed_at"].is_string());

        let (status, results) =
            send(router.clone(), get(&format!("/api/v1/jobs/{}/results", job_id))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(results["results"]
            .as_str()
            .unwrap()
            .starts_with("[Risk Management Specialist]"));
        assert_eq!(results["recommendations"]["financial_insights"].as_array().unwrap().len(), 1);
        assert_eq!(results["recommendations"]["budget_optimization"], json!([]));

        let (status, audit) = send(router, get(&format!("/api/v1/jobs/{}/audit", job_id))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(audit["outcome"], "SUCCESS");
    }

    #[tokio::test]
    async fn test_submit_by_slug() {
        let router = create_router(orchestrator_with(Arc::new(MockReasoningService)));

        let (status, accepted) = send(
            router,
            post_json(
                "/api/v1/workflows/budget-management",
                json!({
                    "budget_data": {"marketing": 50000},
                    "user_id": "demo_user",
                    "organization_id": "demo_org",
                    "priority": 2
                }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(accepted["workflow_type"], "BUDGET_MANAGEMENT");
    }

    #[tokio::test]
    async fn test_unknown_workflow_type_creates_no_job() {
        let orchestrator = orchestrator_with(Arc::new(MockReasoningService));
        let router = create_router(orchestrator.clone());

        let (status, body) = send(
            router.clone(),
            post_json(
                "/api/v1/jobs",
                json!({
                    "workflow_type": "TAX_PLANNING",
                    "financial_data": {"revenue": 1},
                    "user_id": "u",
                    "organization_id": "o"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("TAX_PLANNING"));

        let (status, _) = send(
            router,
            post_json("/api/v1/workflows/tax-planning", json!({"user_id": "u", "organization_id": "o"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        assert!(orchestrator.list_jobs().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_domain_data_is_bad_request() {
        let router = create_router(orchestrator_with(Arc::new(MockReasoningService)));

        let (status, body) = send(
            router,
            post_json(
                "/api/v1/workflows/investment-advisory",
                json!({"user_id": "u", "organization_id": "o"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("investment_data"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request_with_error() {
        let orchestrator = orchestrator_with(Arc::new(MockReasoningService));
        let router = create_router(orchestrator.clone());

        for priority in [json!(300), json!(-1), json!("high"), json!(2.5)] {
            let (status, body) = send(
                router.clone(),
                post_json(
                    "/api/v1/jobs",
                    json!({
                        "workflow_type": "FINANCIAL_ANALYSIS",
                        "financial_data": {"revenue": 1},
                        "user_id": "u",
                        "organization_id": "o",
                        "priority": priority
                    }),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "priority {}", priority);
            assert!(body["error"].is_string());

            let (status, body) = send(
                router.clone(),
                post_json(
                    "/api/v1/workflows/financial-analysis",
                    json!({
                        "financial_data": {"revenue": 1},
                        "user_id": "u",
                        "organization_id": "o",
                        "priority": priority
                    }),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "priority {}", priority);
            assert!(body["error"].is_string());
        }

        // in range for the wire type, out of range for the workflow
        let (status, body) = send(
            router.clone(),
            post_json(
                "/api/v1/workflows/financial-analysis",
                json!({
                    "financial_data": {"revenue": 1},
                    "user_id": "u",
                    "organization_id": "o",
                    "priority": 9
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("priority"));

        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/jobs")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        assert!(orchestrator.list_jobs().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_start_server_reports_bind_failure() {
        let taken = tokio::net::TcpListener::bind("0.0.0.0:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let result = start_server(orchestrator_with(Arc::new(MockReasoningService)), port).await;

        assert!(matches!(result, Err(OrchestrationError::IoError(_))));
    }

    #[tokio::test]
    async fn test_unknown_job_is_not_found() {
        let router = create_router(orchestrator_with(Arc::new(MockReasoningService)));

        for uri in [
            "/api/v1/jobs/nope/status",
            "/api/v1/jobs/nope/results",
            "/api/v1/jobs/nope/audit",
        ] {
            let (status, _) = send(router.clone(), get(uri)).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        }
    }

    /// Never answers, so jobs stay RUNNING
    struct StalledReasoning;

    #[async_trait::async_trait]
    impl ReasoningService for StalledReasoning {
        async fn complete(&self, _prompt: &str) -> crate::Result<String> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_results_before_completion_is_bad_request() {
        let router = create_router(orchestrator_with(Arc::new(StalledReasoning)));

        let (_, accepted) = send(
            router.clone(),
            post_json(
                "/api/v1/jobs",
                json!({
                    "workflow_type": "investment_advisory",
                    "investment_data": ["AAPL", "MSFT"],
                    "user_id": "u",
                    "organization_id": "o"
                }),
            ),
        )
        .await;
        let job_id = accepted["job_id"].as_str().unwrap();

        let (status, body) =
            send(router.clone(), get(&format!("/api/v1/jobs/{}/status", job_id))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "RUNNING");
        assert!(body["results"].is_null());

        let (status, _) = send(router.clone(), get(&format!("/api/v1/jobs/{}/results", job_id))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, jobs) = send(router, get("/api/v1/jobs")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(jobs.as_array().unwrap().len(), 1);
    }
}
