//! Task templates
//!
//! Each template renders a fixed instruction around the input data and
//! declares the output it expects. Rendering never validates the data.

use crate::registry::AgentDescriptor;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskTemplate {
    FinancialAnalysis,
    RiskAssessment,
    BudgetMonitoring,
    InvestmentAnalysis,
    ComplianceCheck,
    InvoiceExtraction,
    InvoiceValidation,
    ApprovalRouting,
    PaymentExecution,
}

/// A rendered task bound to the agent that performs it
#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub template: TaskTemplate,
    pub description: String,
    pub expected_output: &'static str,
    pub agent: Arc<AgentDescriptor>,
}

/// Strings are inserted verbatim, everything else as compact JSON
pub fn stringify_input(data: &Value) -> String {
    match data {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl TaskTemplate {
    pub fn name(&self) -> &'static str {
        match self {
            TaskTemplate::FinancialAnalysis => "financial_analysis",
            TaskTemplate::RiskAssessment => "risk_assessment",
            TaskTemplate::BudgetMonitoring => "budget_monitoring",
            TaskTemplate::InvestmentAnalysis => "investment_analysis",
            TaskTemplate::ComplianceCheck => "compliance_check",
            TaskTemplate::InvoiceExtraction => "invoice_extraction",
            TaskTemplate::InvoiceValidation => "invoice_validation",
            TaskTemplate::ApprovalRouting => "approval_routing",
            TaskTemplate::PaymentExecution => "payment_execution",
        }
    }

    pub fn expected_output(&self) -> &'static str {
        match self {
            TaskTemplate::FinancialAnalysis => {
                "Comprehensive financial analysis report with insights and recommendations"
            }
            TaskTemplate::RiskAssessment => {
                "Detailed risk assessment report with mitigation strategies"
            }
            TaskTemplate::BudgetMonitoring => {
                "Budget monitoring report with variance analysis and recommendations"
            }
            TaskTemplate::InvestmentAnalysis => {
                "Investment analysis report with recommendations and risk metrics"
            }
            TaskTemplate::ComplianceCheck => {
                "Compliance review report with gap analysis and remediation plan"
            }
            TaskTemplate::InvoiceExtraction => {
                "Structured invoice record with number, date, vendor, amount and line items"
            }
            TaskTemplate::InvoiceValidation => {
                "Validation report covering vendor, purchase order, amounts, duplicates and budget"
            }
            TaskTemplate::ApprovalRouting => {
                "Approval chain with routing decisions and current approval status"
            }
            TaskTemplate::PaymentExecution => {
                "Payment confirmation with transaction details and updated payment status"
            }
        }
    }

    fn instruction(&self, data: &str) -> String {
        match self {
            TaskTemplate::FinancialAnalysis => format!(
                "Analyze financial data: {data}\n\n\
                 Include:\n\
                 1. Revenue trends and growth patterns\n\
                 2. Profitability analysis\n\
                 3. Liquidity ratios and cash flow\n\
                 4. Key performance indicators\n\
                 5. Industry benchmarks comparison\n\
                 6. Actionable recommendations"
            ),
            TaskTemplate::RiskAssessment => format!(
                "Conduct risk assessment on: {data}\n\n\
                 Cover:\n\
                 1. Market risk analysis\n\
                 2. Credit risk evaluation\n\
                 3. Operational risk identification\n\
                 4. Liquidity risk assessment\n\
                 5. Regulatory compliance risks\n\
                 6. Risk mitigation strategies"
            ),
            TaskTemplate::BudgetMonitoring => format!(
                "Monitor budget performance: {data}\n\n\
                 Include:\n\
                 1. Budget vs actual variance analysis\n\
                 2. Expense category breakdown\n\
                 3. Budget overrun identification\n\
                 4. Forecast accuracy assessment\n\
                 5. Cost optimization opportunities\n\
                 6. Budget reallocation recommendations"
            ),
            TaskTemplate::InvestmentAnalysis => format!(
                "Analyze investment opportunities: {data}\n\n\
                 Include:\n\
                 1. Investment performance evaluation\n\
                 2. Risk-return analysis\n\
                 3. Portfolio diversification assessment\n\
                 4. Market timing considerations\n\
                 5. Asset allocation recommendations\n\
                 6. Expected returns and risk metrics"
            ),
            TaskTemplate::ComplianceCheck => format!(
                "Review processes for compliance: {data}\n\n\
                 Cover:\n\
                 1. Regulatory compliance verification\n\
                 2. Internal policy adherence\n\
                 3. Audit trail completeness\n\
                 4. Documentation requirements\n\
                 5. Approval workflow validation\n\
                 6. Risk control effectiveness"
            ),
            TaskTemplate::InvoiceExtraction => format!(
                "Extract and structure data from the invoice document:\n\
                 1. Use OCR to process the document\n\
                 2. Extract key fields (invoice number, date, amount, vendor, line items)\n\
                 3. Validate extracted data format\n\
                 4. Return structured data\n\n\
                 Invoice data: {data}"
            ),
            TaskTemplate::InvoiceValidation => format!(
                "Validate the extracted invoice data:\n\
                 1. Check vendor details in ERP\n\
                 2. Verify purchase order match\n\
                 3. Validate line items and amounts\n\
                 4. Check for duplicates\n\
                 5. Verify budget availability\n\n\
                 Invoice data: {data}"
            ),
            TaskTemplate::ApprovalRouting => format!(
                "Route invoice for appropriate approvals:\n\
                 1. Determine approval chain based on amount and department\n\
                 2. Send notifications to approvers\n\
                 3. Track approval status\n\
                 4. Handle approval/rejection actions\n\n\
                 Invoice data: {data}"
            ),
            TaskTemplate::PaymentExecution => format!(
                "Execute payment for approved invoice:\n\
                 1. Prepare payment data\n\
                 2. Submit to payment gateway\n\
                 3. Record transaction details\n\
                 4. Update payment status\n\n\
                 Invoice data: {data}"
            ),
        }
    }

    /// Render the instruction for `input` and bind it to `agent`
    pub fn render(&self, input: &Value, agent: &Arc<AgentDescriptor>) -> TaskSpec {
        TaskSpec {
            template: *self,
            description: self.instruction(&stringify_input(input)),
            expected_output: self.expected_output(),
            agent: Arc::clone(agent),
        }
    }
}

impl fmt::Display for TaskTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
