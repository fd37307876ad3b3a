//! Core data models for workflow requests and job records

use crate::error::OrchestrationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

//
// ================= Enums =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowKind {
    FinancialAnalysis,
    BudgetManagement,
    InvestmentAdvisory,
    Comprehensive,
    InvoiceProcessing,
}

impl WorkflowKind {
    pub const ALL: [WorkflowKind; 5] = [
        WorkflowKind::FinancialAnalysis,
        WorkflowKind::BudgetManagement,
        WorkflowKind::InvestmentAdvisory,
        WorkflowKind::Comprehensive,
        WorkflowKind::InvoiceProcessing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowKind::FinancialAnalysis => "FINANCIAL_ANALYSIS",
            WorkflowKind::BudgetManagement => "BUDGET_MANAGEMENT",
            WorkflowKind::InvestmentAdvisory => "INVESTMENT_ADVISORY",
            WorkflowKind::Comprehensive => "COMPREHENSIVE",
            WorkflowKind::InvoiceProcessing => "INVOICE_PROCESSING",
        }
    }

    /// URL slug used by `POST /api/v1/workflows/{slug}`
    pub fn slug(&self) -> &'static str {
        match self {
            WorkflowKind::FinancialAnalysis => "financial-analysis",
            WorkflowKind::BudgetManagement => "budget-management",
            WorkflowKind::InvestmentAdvisory => "investment-advisory",
            WorkflowKind::Comprehensive => "comprehensive",
            WorkflowKind::InvoiceProcessing => "invoice",
        }
    }

    pub fn from_slug(slug: &str) -> Result<Self, OrchestrationError> {
        WorkflowKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.slug() == slug)
            .ok_or_else(|| OrchestrationError::UnsupportedWorkflowKind(slug.to_string()))
    }
}

impl FromStr for WorkflowKind {
    type Err = OrchestrationError;

    /// Accepts the wire name (`FINANCIAL_ANALYSIS`) case-insensitively,
    /// as well as the URL slug.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace('-', "_");
        WorkflowKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == normalized || kind.slug() == s.trim())
            .ok_or_else(|| OrchestrationError::UnsupportedWorkflowKind(s.to_string()))
    }
}

impl fmt::Display for WorkflowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    Pending,
    Running,
    Success,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Running => "RUNNING",
            JobStatus::Success => "SUCCESS",
            JobStatus::Failed => "FAILED",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationCategory {
    FinancialInsights,
    RiskMitigation,
    BudgetOptimization,
    InvestmentOpportunities,
    ComplianceActions,
}

impl RecommendationCategory {
    pub const ALL: [RecommendationCategory; 5] = [
        RecommendationCategory::FinancialInsights,
        RecommendationCategory::RiskMitigation,
        RecommendationCategory::BudgetOptimization,
        RecommendationCategory::InvestmentOpportunities,
        RecommendationCategory::ComplianceActions,
    ];

    /// The single bucket a workflow's final output is filed under
    pub fn for_kind(kind: WorkflowKind) -> Self {
        match kind {
            WorkflowKind::FinancialAnalysis | WorkflowKind::Comprehensive => {
                RecommendationCategory::FinancialInsights
            }
            WorkflowKind::BudgetManagement => RecommendationCategory::BudgetOptimization,
            WorkflowKind::InvestmentAdvisory => RecommendationCategory::InvestmentOpportunities,
            WorkflowKind::InvoiceProcessing => RecommendationCategory::ComplianceActions,
        }
    }
}

pub type Recommendations = BTreeMap<RecommendationCategory, Vec<String>>;

/// Bucket the raw output into the category for `kind`.
/// Every category is present; all but one stay empty.
pub fn extract_recommendations(kind: WorkflowKind, output: &str) -> Recommendations {
    let target = RecommendationCategory::for_kind(kind);

    RecommendationCategory::ALL
        .iter()
        .map(|category| {
            let items = if *category == target {
                vec![output.to_string()]
            } else {
                Vec::new()
            };
            (*category, items)
        })
        .collect()
}

//
// ================= Request =================
//

fn default_priority() -> u8 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowRequest {
    #[serde(default)]
    pub financial_data: Option<serde_json::Value>,
    #[serde(default)]
    pub budget_data: Option<serde_json::Value>,
    #[serde(default)]
    pub investment_data: Option<serde_json::Value>,
    #[serde(default)]
    pub invoice_data: Option<serde_json::Value>,
    pub user_id: String,
    pub organization_id: String,
    #[serde(default = "default_priority")]
    pub priority: u8,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl WorkflowRequest {
    pub fn new(user_id: impl Into<String>, organization_id: impl Into<String>) -> Self {
        Self {
            financial_data: None,
            budget_data: None,
            investment_data: None,
            invoice_data: None,
            user_id: user_id.into(),
            organization_id: organization_id.into(),
            priority: default_priority(),
            metadata: None,
        }
    }

    /// Check the request carries the domain data `kind` needs
    pub fn validate_for(&self, kind: WorkflowKind) -> Result<(), OrchestrationError> {
        if !(1..=5).contains(&self.priority) {
            return Err(OrchestrationError::InvalidRequest(format!(
                "priority must be between 1 and 5, got {}",
                self.priority
            )));
        }

        let present = |field: &Option<serde_json::Value>| {
            field.as_ref().map_or(false, |value| !value.is_null())
        };

        let (ok, expected) = match kind {
            WorkflowKind::FinancialAnalysis => (present(&self.financial_data), "financial_data"),
            WorkflowKind::BudgetManagement => (present(&self.budget_data), "budget_data"),
            WorkflowKind::InvestmentAdvisory => (present(&self.investment_data), "investment_data"),
            WorkflowKind::InvoiceProcessing => (present(&self.invoice_data), "invoice_data"),
            WorkflowKind::Comprehensive => (
                present(&self.financial_data)
                    || present(&self.budget_data)
                    || present(&self.investment_data),
                "financial_data, budget_data or investment_data",
            ),
        };

        if ok {
            Ok(())
        } else {
            Err(OrchestrationError::InvalidRequest(format!(
                "{} workflow requires {}",
                kind, expected
            )))
        }
    }
}

//
// ================= Job =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobRecord {
    pub job_id: String,
    pub workflow_type: WorkflowKind,
    pub status: JobStatus,
    pub results: Option<String>,
    pub recommendations: Option<Recommendations>,
    pub error_message: Option<String>,
    pub user_id: String,
    pub organization_id: String,
    pub priority: u8,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Seconds between creation and the terminal transition
    pub execution_time: Option<f64>,
}

/// Immediate reply to a submission
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobAccepted {
    pub job_id: String,
    pub status: JobStatus,
    pub workflow_type: WorkflowKind,
}

/// Body of the results endpoint, only built for SUCCESS jobs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobResults {
    pub job_id: String,
    pub results: String,
    pub recommendations: Recommendations,
}

//
// ================= Execution =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StageTrace {
    pub order: usize,
    pub role: String,
    pub task: String,
    pub duration_ms: u64,
    pub output_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionResult {
    pub results: String,
    pub recommendations: Recommendations,
    pub stages: Vec<StageTrace>,
}

//
// ================= Tool I/O =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInput {
    pub tool_name: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    pub success: bool,
    pub data: serde_json::Value,
    pub error: Option<String>,
}
