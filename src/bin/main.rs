use finance_workflow_orchestrator::{
    config::Settings, JobStatus, Orchestrator, WorkflowKind, WorkflowRequest,
};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let settings = Settings::from_env()?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&settings.log_filter))
        .init();

    info!("Finance Workflow Orchestrator starting");

    let orchestrator = Orchestrator::from_settings(&settings)?;

    // Sample request
    let mut request = WorkflowRequest::new("demo_user", "demo_org");
    request.financial_data = Some(json!({
        "company": "Sample Corp",
        "revenue": 1000000,
        "expenses": 800000,
        "assets": 2000000,
        "liabilities": 500000
    }));

    info!(workflow_type = %WorkflowKind::FinancialAnalysis, "Running sample workflow");

    let record = orchestrator
        .run_to_completion(WorkflowKind::FinancialAnalysis, request)
        .await?;

    match record.status {
        JobStatus::Success => {
            info!("Workflow successful");
            println!("\n=== WORKFLOW RESULT ===");
            println!("Job ID: {}", record.job_id);
            if let Some(seconds) = record.execution_time {
                println!("Execution time: {:.2}s", seconds);
            }
            println!("\n{}", record.results.unwrap_or_default());
            Ok(())
        }
        status => {
            let message = record.error_message.unwrap_or_default();
            eprintln!("Workflow {}: {}", status, message);
            Err(message.into())
        }
    }
}
