//! Capability registry
//!
//! Static lookup from agent role to a descriptor factory, and from tool
//! family to a tool provider. Populated once at start-up and read-only
//! afterwards.

use crate::error::OrchestrationError;
use crate::tools::{finance_tools, invoice_tools, ToolHandle};
use crate::Result;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

//
// ================= Agents =================
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentRole {
    FinancialAnalyst,
    RiskManager,
    BudgetController,
    InvestmentAdvisor,
    ComplianceOfficer,
    InvoiceIngestion,
    InvoiceValidator,
    ApprovalRouter,
    PaymentProcessor,
    InvoiceComplianceOfficer,
}

impl AgentRole {
    pub const ALL: [AgentRole; 10] = [
        AgentRole::FinancialAnalyst,
        AgentRole::RiskManager,
        AgentRole::BudgetController,
        AgentRole::InvestmentAdvisor,
        AgentRole::ComplianceOfficer,
        AgentRole::InvoiceIngestion,
        AgentRole::InvoiceValidator,
        AgentRole::ApprovalRouter,
        AgentRole::PaymentProcessor,
        AgentRole::InvoiceComplianceOfficer,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            AgentRole::FinancialAnalyst => "financial-analyst",
            AgentRole::RiskManager => "risk-manager",
            AgentRole::BudgetController => "budget-controller",
            AgentRole::InvestmentAdvisor => "investment-advisor",
            AgentRole::ComplianceOfficer => "compliance-officer",
            AgentRole::InvoiceIngestion => "invoice-ingestion",
            AgentRole::InvoiceValidator => "invoice-validator",
            AgentRole::ApprovalRouter => "approval-router",
            AgentRole::PaymentProcessor => "payment-processor",
            AgentRole::InvoiceComplianceOfficer => "invoice-compliance-officer",
        }
    }
}

impl FromStr for AgentRole {
    type Err = OrchestrationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        AgentRole::ALL
            .iter()
            .copied()
            .find(|role| role.key() == s)
            .ok_or_else(|| OrchestrationError::UnknownCapability(format!("agent role '{}'", s)))
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Role-specialised reasoning agent
#[derive(Clone)]
pub struct AgentDescriptor {
    pub role: String,
    pub goal: String,
    pub backstory: String,
    pub allow_delegation: bool,
    pub tools: Vec<ToolHandle>,
}

impl AgentDescriptor {
    fn new(role: &str, goal: &str, backstory: &str) -> Self {
        Self {
            role: role.to_string(),
            goal: goal.to_string(),
            backstory: backstory.to_string(),
            allow_delegation: false,
            tools: Vec::new(),
        }
    }

    fn delegating(mut self) -> Self {
        self.allow_delegation = true;
        self
    }

    /// Attach the pipeline's shared tool set
    pub fn with_tools(mut self, tools: Vec<ToolHandle>) -> Self {
        self.tools = tools;
        self
    }

    pub fn tool_names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name()).collect()
    }
}

impl fmt::Debug for AgentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentDescriptor")
            .field("role", &self.role)
            .field("goal", &self.goal)
            .field("allow_delegation", &self.allow_delegation)
            .field("tools", &self.tool_names())
            .finish()
    }
}

fn financial_analyst() -> AgentDescriptor {
    AgentDescriptor::new(
        "Senior Financial Analyst",
        "Analyze financial data and provide insights for decision making",
        "Senior financial analyst with 15+ years experience in corporate finance and financial modeling.",
    )
}

fn risk_manager() -> AgentDescriptor {
    AgentDescriptor::new(
        "Risk Management Specialist",
        "Identify, assess, and mitigate financial risks across the organization",
        "Expert risk manager with deep knowledge of financial markets and regulatory compliance.",
    )
}

fn budget_controller() -> AgentDescriptor {
    AgentDescriptor::new(
        "Budget Controller",
        "Monitor budget performance, explain variances and find cost optimization opportunities",
        "Budget controller experienced in departmental planning, forecasting and cost control.",
    )
}

fn investment_advisor() -> AgentDescriptor {
    AgentDescriptor::new(
        "Investment Advisor",
        "Evaluate investment opportunities and recommend asset allocation",
        "Investment advisor with a background in portfolio management and risk-adjusted returns.",
    )
}

fn compliance_officer() -> AgentDescriptor {
    AgentDescriptor::new(
        "Compliance Officer",
        "Ensure financial processes comply with internal policy and regulation",
        "Compliance officer who maintains audit trails and oversees SOX controls.",
    )
}

fn invoice_ingestion() -> AgentDescriptor {
    AgentDescriptor::new(
        "Invoice Ingestion Specialist",
        "Extract and structure data from invoice documents accurately",
        "Expert in document processing and data extraction for financial documents, \
         with extensive experience in OCR technologies and data validation.",
    )
}

fn invoice_validator() -> AgentDescriptor {
    AgentDescriptor::new(
        "Invoice Validation Specialist",
        "Validate invoice data against ERP records and company policies",
        "Meticulous validation specialist with deep knowledge of accounting principles and \
         ERP systems, matching invoices to purchase orders and vendor records.",
    )
}

fn approval_router() -> AgentDescriptor {
    AgentDescriptor::new(
        "Approval Workflow Manager",
        "Route invoices to appropriate approvers and track approval status",
        "Manages the approval workflow, routing invoices to the correct approvers based on \
         amount, department and company policies.",
    )
    .delegating()
}

fn payment_processor() -> AgentDescriptor {
    AgentDescriptor::new(
        "Payment Processing Specialist",
        "Execute approved payments and maintain payment records",
        "Handles payment execution accurately and on time while keeping financial records \
         and audit trails.",
    )
}

fn invoice_compliance_officer() -> AgentDescriptor {
    AgentDescriptor::new(
        "Compliance Officer",
        "Ensure all invoice processing complies with policies and regulations",
        "Oversees regulatory compliance and policy adherence throughout invoice processing, \
         maintaining audit trails and ensuring SOX compliance.",
    )
}

//
// ================= Tool Families =================
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolFamily {
    Finance,
    Invoice,
}

impl ToolFamily {
    pub fn key(&self) -> &'static str {
        match self {
            ToolFamily::Finance => "finance",
            ToolFamily::Invoice => "invoice",
        }
    }
}

impl FromStr for ToolFamily {
    type Err = OrchestrationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "finance" => Ok(ToolFamily::Finance),
            "invoice" => Ok(ToolFamily::Invoice),
            other => Err(OrchestrationError::UnknownCapability(format!(
                "tool family '{}'",
                other
            ))),
        }
    }
}

//
// ================= Registry =================
//

type AgentFactory = fn() -> AgentDescriptor;
type ToolProvider = fn() -> Vec<ToolHandle>;

/// Registry of agent factories and tool providers
pub struct CapabilityRegistry {
    agents: HashMap<AgentRole, AgentFactory>,
    tools: HashMap<ToolFamily, ToolProvider>,
}

impl CapabilityRegistry {
    pub fn empty() -> Self {
        Self {
            agents: HashMap::new(),
            tools: HashMap::new(),
        }
    }

    /// Registry with every built-in role and tool family
    pub fn standard() -> Self {
        let mut registry = Self::empty();

        registry.register_agent(AgentRole::FinancialAnalyst, financial_analyst);
        registry.register_agent(AgentRole::RiskManager, risk_manager);
        registry.register_agent(AgentRole::BudgetController, budget_controller);
        registry.register_agent(AgentRole::InvestmentAdvisor, investment_advisor);
        registry.register_agent(AgentRole::ComplianceOfficer, compliance_officer);
        registry.register_agent(AgentRole::InvoiceIngestion, invoice_ingestion);
        registry.register_agent(AgentRole::InvoiceValidator, invoice_validator);
        registry.register_agent(AgentRole::ApprovalRouter, approval_router);
        registry.register_agent(AgentRole::PaymentProcessor, payment_processor);
        registry.register_agent(AgentRole::InvoiceComplianceOfficer, invoice_compliance_officer);

        registry.register_tools(ToolFamily::Finance, finance_tools);
        registry.register_tools(ToolFamily::Invoice, invoice_tools);

        registry
    }

    pub fn register_agent(&mut self, role: AgentRole, factory: AgentFactory) {
        self.agents.insert(role, factory);
    }

    pub fn register_tools(&mut self, family: ToolFamily, provider: ToolProvider) {
        self.tools.insert(family, provider);
    }

    pub fn get_agent(&self, role: AgentRole) -> Result<AgentDescriptor> {
        self.agents
            .get(&role)
            .map(|factory| factory())
            .ok_or_else(|| {
                OrchestrationError::UnknownCapability(format!("agent role '{}'", role))
            })
    }

    /// Concatenate each family's tools, in the order the families are given
    pub fn get_tools(&self, families: &[ToolFamily]) -> Result<Vec<ToolHandle>> {
        let mut tools = Vec::new();

        for family in families {
            let provider = self.tools.get(family).ok_or_else(|| {
                OrchestrationError::UnknownCapability(format!("tool family '{}'", family.key()))
            })?;
            tools.extend(provider());
        }

        Ok(tools)
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_role_is_registered() {
        let registry = CapabilityRegistry::standard();

        for role in AgentRole::ALL {
            let agent = registry.get_agent(role).unwrap();
            assert!(!agent.role.is_empty());
            assert!(!agent.goal.is_empty());
            assert!(agent.tools.is_empty());
        }

        assert!(registry.get_agent(AgentRole::ApprovalRouter).unwrap().allow_delegation);
    }

    #[test]
    fn test_unknown_role_key() {
        let err = "chief-vibes-officer".parse::<AgentRole>().unwrap_err();
        assert!(matches!(err, OrchestrationError::UnknownCapability(_)));
        assert_eq!("risk-manager".parse::<AgentRole>().unwrap(), AgentRole::RiskManager);
    }

    #[test]
    fn test_unregistered_capabilities() {
        let registry = CapabilityRegistry::empty();

        assert!(matches!(
            registry.get_agent(AgentRole::FinancialAnalyst),
            Err(OrchestrationError::UnknownCapability(_))
        ));
        assert!(matches!(
            registry.get_tools(&[ToolFamily::Finance]),
            Err(OrchestrationError::UnknownCapability(_))
        ));
        assert!("crypto".parse::<ToolFamily>().is_err());
    }

    #[test]
    fn test_get_tools_concatenates_in_order() {
        let registry = CapabilityRegistry::standard();
        let tools = registry
            .get_tools(&[ToolFamily::Invoice, ToolFamily::Finance])
            .unwrap();

        assert_eq!(tools.len(), 8);
        assert_eq!(tools[0].name(), "invoice_ocr");
        assert_eq!(tools[4].name(), "financial_data");
    }
}
