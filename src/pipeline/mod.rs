//! Pipeline composer
//!
//! Builds the fixed stage sequence for each workflow kind. Composition is
//! synchronous and allocation-only.

use crate::models::{WorkflowKind, WorkflowRequest};
use crate::registry::{AgentDescriptor, AgentRole, CapabilityRegistry, ToolFamily};
use crate::tasks::{stringify_input, TaskSpec, TaskTemplate};
use crate::tools::ToolHandle;
use crate::Result;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// One (agent, task) unit executed against the reasoning service
#[derive(Debug, Clone)]
pub struct PipelineStage {
    pub agent: Arc<AgentDescriptor>,
    pub task: TaskSpec,
}

impl PipelineStage {
    /// Full prompt sent to the reasoning service for this stage
    pub fn prompt(&self) -> String {
        let tools = self.agent.tool_names();
        let tool_line = if tools.is_empty() {
            "none".to_string()
        } else {
            tools.join(", ")
        };

        format!(
            "You are a {role}.\n\
             Goal: {goal}\n\
             Background: {backstory}\n\
             Available tools: {tools}\n\n\
             Task:\n{description}\n\n\
             Expected output: {expected}",
            role = self.agent.role,
            goal = self.agent.goal,
            backstory = self.agent.backstory,
            tools = tool_line,
            description = self.task.description,
            expected = self.task.expected_output,
        )
    }
}

/// Ordered stages plus the tool set every stage's agent carries
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub kind: WorkflowKind,
    pub stages: Vec<PipelineStage>,
    pub tools: Vec<ToolHandle>,
}

impl Pipeline {
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

/// Stage layout for a kind: (role, template, input data)
type StagePlan = Vec<(AgentRole, TaskTemplate, Value)>;

fn data(field: &Option<Value>) -> Value {
    field.clone().unwrap_or(Value::Null)
}

/// Composes pipelines from the capability registry
pub struct PipelineComposer {
    registry: Arc<CapabilityRegistry>,
}

impl PipelineComposer {
    pub fn new(registry: Arc<CapabilityRegistry>) -> Self {
        Self { registry }
    }

    fn tool_families(kind: WorkflowKind) -> &'static [ToolFamily] {
        match kind {
            WorkflowKind::InvoiceProcessing => &[ToolFamily::Invoice],
            _ => &[ToolFamily::Finance],
        }
    }

    fn stage_plan(kind: WorkflowKind, request: &WorkflowRequest) -> StagePlan {
        use AgentRole::*;

        match kind {
            WorkflowKind::FinancialAnalysis => {
                let fin = data(&request.financial_data);
                vec![
                    (FinancialAnalyst, TaskTemplate::FinancialAnalysis, fin.clone()),
                    (RiskManager, TaskTemplate::RiskAssessment, fin),
                ]
            }
            WorkflowKind::BudgetManagement => {
                let budget = data(&request.budget_data);
                vec![
                    (BudgetController, TaskTemplate::BudgetMonitoring, budget.clone()),
                    (ComplianceOfficer, TaskTemplate::ComplianceCheck, budget),
                ]
            }
            WorkflowKind::InvestmentAdvisory => {
                let invest = data(&request.investment_data);
                vec![
                    (InvestmentAdvisor, TaskTemplate::InvestmentAnalysis, invest.clone()),
                    (RiskManager, TaskTemplate::RiskAssessment, invest.clone()),
                    (ComplianceOfficer, TaskTemplate::ComplianceCheck, invest),
                ]
            }
            WorkflowKind::Comprehensive => {
                let fin = data(&request.financial_data);
                let budget = data(&request.budget_data);
                let invest = data(&request.investment_data);
                let combined = Value::String(format!(
                    "{}, {}, {}",
                    stringify_input(&fin),
                    stringify_input(&budget),
                    stringify_input(&invest)
                ));
                vec![
                    (FinancialAnalyst, TaskTemplate::FinancialAnalysis, fin.clone()),
                    (RiskManager, TaskTemplate::RiskAssessment, fin),
                    (BudgetController, TaskTemplate::BudgetMonitoring, budget),
                    (InvestmentAdvisor, TaskTemplate::InvestmentAnalysis, invest),
                    (ComplianceOfficer, TaskTemplate::ComplianceCheck, combined),
                ]
            }
            WorkflowKind::InvoiceProcessing => {
                let invoice = data(&request.invoice_data);
                vec![
                    (InvoiceIngestion, TaskTemplate::InvoiceExtraction, invoice.clone()),
                    (InvoiceValidator, TaskTemplate::InvoiceValidation, invoice.clone()),
                    (ApprovalRouter, TaskTemplate::ApprovalRouting, invoice.clone()),
                    (PaymentProcessor, TaskTemplate::PaymentExecution, invoice.clone()),
                    (InvoiceComplianceOfficer, TaskTemplate::ComplianceCheck, invoice),
                ]
            }
        }
    }

    /// Build the stage sequence for `kind` from the request's input data
    pub fn compose(&self, kind: WorkflowKind, request: &WorkflowRequest) -> Result<Pipeline> {
        let tools = self.registry.get_tools(Self::tool_families(kind))?;

        let stages = Self::stage_plan(kind, request)
            .into_iter()
            .map(|(role, template, input)| {
                let agent = Arc::new(self.registry.get_agent(role)?.with_tools(tools.clone()));
                let task = template.render(&input, &agent);
                Ok(PipelineStage { agent, task })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            workflow_type = %kind,
            stage_count = stages.len(),
            tool_count = tools.len(),
            "Pipeline composed"
        );

        Ok(Pipeline { kind, stages, tools })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OrchestrationError;
    use serde_json::json;

    fn full_request() -> WorkflowRequest {
        let mut request = WorkflowRequest::new("demo_user", "demo_org");
        request.financial_data = Some(json!({"company": "Sample Corp", "revenue": 1000000}));
        request.budget_data = Some(json!({"actual": [120], "budgeted": [100]}));
        request.investment_data = Some(json!({"symbol": "AAPL", "quantity": 10}));
        request.invoice_data = Some(json!({"invoice_id": "INV-001", "amount": 1000}));
        request
    }

    fn composer() -> PipelineComposer {
        PipelineComposer::new(Arc::new(CapabilityRegistry::standard()))
    }

    fn templates(pipeline: &Pipeline) -> Vec<TaskTemplate> {
        pipeline.stages.iter().map(|s| s.task.template).collect()
    }

    #[test]
    fn test_every_kind_composes() {
        let composer = composer();
        let request = full_request();

        for kind in WorkflowKind::ALL {
            let pipeline = composer.compose(kind, &request).unwrap();
            assert!(!pipeline.is_empty());
            assert_eq!(pipeline.kind, kind);
        }
    }

    #[test]
    fn test_financial_analysis_layout() {
        let pipeline = composer()
            .compose(WorkflowKind::FinancialAnalysis, &full_request())
            .unwrap();

        assert_eq!(
            templates(&pipeline),
            vec![TaskTemplate::FinancialAnalysis, TaskTemplate::RiskAssessment]
        );
        assert_eq!(pipeline.stages[0].agent.role, "Senior Financial Analyst");
        assert_eq!(pipeline.stages[1].agent.role, "Risk Management Specialist");
        assert!(pipeline.stages[1].task.description.contains("Sample Corp"));
    }

    #[test]
    fn test_invoice_layout_and_tools() {
        let pipeline = composer()
            .compose(WorkflowKind::InvoiceProcessing, &full_request())
            .unwrap();

        assert_eq!(
            templates(&pipeline),
            vec![
                TaskTemplate::InvoiceExtraction,
                TaskTemplate::InvoiceValidation,
                TaskTemplate::ApprovalRouting,
                TaskTemplate::PaymentExecution,
                TaskTemplate::ComplianceCheck,
            ]
        );

        for stage in &pipeline.stages {
            assert_eq!(
                stage.agent.tool_names(),
                vec!["invoice_ocr", "erp_validation", "payment_gateway", "audit_logger"]
            );
        }
    }

    #[test]
    fn test_shared_tools_injected_into_every_agent() {
        let pipeline = composer()
            .compose(WorkflowKind::InvestmentAdvisory, &full_request())
            .unwrap();

        assert_eq!(pipeline.len(), 3);
        for stage in &pipeline.stages {
            assert_eq!(stage.agent.tools.len(), pipeline.tools.len());
            assert!(Arc::ptr_eq(&stage.agent, &stage.task.agent));
            assert!(stage.prompt().contains("risk_calculator"));
        }
    }

    #[test]
    fn test_comprehensive_compliance_sees_all_inputs() {
        let pipeline = composer()
            .compose(WorkflowKind::Comprehensive, &full_request())
            .unwrap();

        let last = pipeline.stages.last().unwrap();
        assert_eq!(last.task.template, TaskTemplate::ComplianceCheck);
        assert!(last.task.description.contains("Sample Corp"));
        assert!(last.task.description.contains("budgeted"));
        assert!(last.task.description.contains("AAPL"));
    }

    #[test]
    fn test_missing_capability_fails_composition() {
        let mut registry = CapabilityRegistry::empty();
        registry.register_tools(ToolFamily::Finance, crate::tools::finance_tools);
        let composer = PipelineComposer::new(Arc::new(registry));

        let err = composer
            .compose(WorkflowKind::FinancialAnalysis, &full_request())
            .unwrap_err();
        assert!(matches!(err, OrchestrationError::UnknownCapability(_)));
    }
}
