//! Tool trait and the domain tool families
//!
//! Tools are stateless request/response functions attached to agents.
//! The orchestrator never inspects them; it only hands them out by family.

use crate::error::OrchestrationError;
use crate::models::{ToolInput, ToolOutput};
use crate::Result;
use chrono::Utc;
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Trait for a single tool
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput>;
}

impl fmt::Debug for dyn Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Tool").field(&self.name()).finish()
    }
}

/// Shared reference to a tool, attached to agents
pub type ToolHandle = Arc<dyn Tool>;

fn ensure_object_parameters(input: &ToolInput) -> Result<()> {
    if input.parameters.is_object() {
        Ok(())
    } else {
        Err(OrchestrationError::InvalidToolInput(
            "tool_input must be a JSON object".to_string(),
        ))
    }
}

fn number_list(params: &Value, key: &str) -> Result<Vec<f64>> {
    let values = params
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| {
            OrchestrationError::InvalidToolInput(format!("Expected '{}' as an array", key))
        })?;

    values
        .iter()
        .map(|v| {
            v.as_f64().ok_or_else(|| {
                OrchestrationError::InvalidToolInput(format!("'{}' must contain numbers", key))
            })
        })
        .collect()
}

fn success(data: Value) -> ToolOutput {
    ToolOutput {
        success: true,
        data,
        error: None,
    }
}

//
// ================= Finance Tools =================
//

/// Placeholder quote lookup; no market data backend is wired in.
pub struct FinancialDataTool;

#[async_trait::async_trait]
impl Tool for FinancialDataTool {
    fn name(&self) -> &'static str {
        "financial_data"
    }

    fn description(&self) -> &'static str {
        "Retrieve stock prices, company financials and market data for a symbol"
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        ensure_object_parameters(input)?;

        let symbol = input
            .parameters
            .get("symbol")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                OrchestrationError::InvalidToolInput("Expected 'symbol'".to_string())
            })?;
        let period = input
            .parameters
            .get("period")
            .and_then(Value::as_str)
            .unwrap_or("1y");

        Ok(success(json!({
            "symbol": symbol,
            "period": period,
            "current_price": 150.50,
            "price_change": 2.5,
            "volume": 1000000,
            "market_cap": "N/A",
            "pe_ratio": "N/A",
        })))
    }
}

/// Risk metrics over a daily return series
pub struct RiskCalculatorTool;

const TRADING_DAYS: f64 = 252.0;

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Linear-interpolated percentile, `pct` in [0, 100]
fn percentile(values: &[f64], pct: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = (pct / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;

    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

fn max_drawdown(returns: &[f64]) -> f64 {
    let mut cumulative = 1.0;
    let mut running_max = f64::MIN;
    let mut worst: f64 = 0.0;

    for r in returns {
        cumulative *= 1.0 + r;
        running_max = running_max.max(cumulative);
        worst = worst.min((cumulative - running_max) / running_max);
    }

    worst
}

#[async_trait::async_trait]
impl Tool for RiskCalculatorTool {
    fn name(&self) -> &'static str {
        "risk_calculator"
    }

    fn description(&self) -> &'static str {
        "Calculate volatility, value at risk, Sharpe ratio and max drawdown"
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        ensure_object_parameters(input)?;

        let returns = number_list(&input.parameters, "returns_data")?;
        if returns.len() < 2 {
            return Err(OrchestrationError::InvalidToolInput(
                "returns_data needs at least two observations".to_string(),
            ));
        }

        let confidence = input
            .parameters
            .get("confidence_level")
            .and_then(Value::as_f64)
            .unwrap_or(0.95);
        if !(confidence > 0.0 && confidence < 1.0) {
            return Err(OrchestrationError::InvalidToolInput(format!(
                "confidence_level must be between 0 and 1, got {}",
                confidence
            )));
        }

        let sd = std_dev(&returns);
        let m = mean(&returns);
        let sharpe = if sd == 0.0 { 0.0 } else { m / sd * TRADING_DAYS.sqrt() };

        Ok(success(json!({
            "volatility": sd * TRADING_DAYS.sqrt(),
            "value_at_risk": percentile(&returns, (1.0 - confidence) * 100.0),
            "sharpe_ratio": sharpe,
            "max_drawdown": max_drawdown(&returns),
            "mean_return": m,
            "std_deviation": sd,
        })))
    }
}

/// Budget vs actual variance analysis
pub struct BudgetAnalyzerTool;

#[async_trait::async_trait]
impl Tool for BudgetAnalyzerTool {
    fn name(&self) -> &'static str {
        "budget_analyzer"
    }

    fn description(&self) -> &'static str {
        "Analyze budget data and calculate variances, trends and forecasts"
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        ensure_object_parameters(input)?;

        let actual = number_list(&input.parameters, "actual")?;
        let budgeted = number_list(&input.parameters, "budgeted")?;

        if actual.len() != budgeted.len() {
            return Err(OrchestrationError::InvalidToolInput(
                "Actual and budgeted data must have same length".to_string(),
            ));
        }

        let variance: Vec<f64> = actual.iter().zip(&budgeted).map(|(a, b)| a - b).collect();
        let variance_pct: Vec<f64> = actual
            .iter()
            .zip(&budgeted)
            .map(|(a, b)| if *b != 0.0 { (a - b) / b * 100.0 } else { 0.0 })
            .collect();

        let total_actual: f64 = actual.iter().sum();
        let total_budgeted: f64 = budgeted.iter().sum();
        let total_variance: f64 = variance.iter().sum();

        Ok(success(json!({
            "total_actual": total_actual,
            "total_budgeted": total_budgeted,
            "total_variance": total_variance,
            "variance_percentage": if total_budgeted != 0.0 {
                total_variance / total_budgeted * 100.0
            } else {
                0.0
            },
            "monthly_variances": variance,
            "monthly_variance_percentages": variance_pct,
            "over_budget_months": variance.iter().filter(|v| **v > 0.0).count(),
            "under_budget_months": variance.iter().filter(|v| **v < 0.0).count(),
        })))
    }
}

/// Rule-based transaction compliance scoring
pub struct ComplianceCheckerTool;

const REQUIRED_TRANSACTION_FIELDS: &[&str] = &["amount", "date", "description", "approver"];

#[async_trait::async_trait]
impl Tool for ComplianceCheckerTool {
    fn name(&self) -> &'static str {
        "compliance_checker"
    }

    fn description(&self) -> &'static str {
        "Check financial processes and transactions for regulatory compliance"
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        ensure_object_parameters(input)?;
        let tx = &input.parameters;

        let mut score: i32 = 100;
        let mut issues = Vec::new();
        let mut recommendations = Vec::new();

        for field in REQUIRED_TRANSACTION_FIELDS {
            if tx.get(*field).is_none() {
                score -= 20;
                issues.push(format!("Missing required field: {}", field));
            }
        }
        if issues.iter().any(|i| i.starts_with("Missing required field")) {
            recommendations
                .push("Ensure all required fields are completed before submission".to_string());
        }

        let amount = tx.get("amount").and_then(Value::as_f64).unwrap_or(0.0);

        if amount > 10_000.0 && tx.get("secondary_approver").is_none() {
            score -= 15;
            issues.push("Transactions over $10,000 require secondary approval".to_string());
            recommendations.push(
                "Obtain secondary approver signature for high-value transactions".to_string(),
            );
        }

        if amount > 5_000.0 && tx.get("supporting_documents").is_none() {
            score -= 10;
            issues.push("Transactions over $5,000 require supporting documentation".to_string());
            recommendations.push(
                "Attach relevant supporting documents (receipts, invoices, contracts)".to_string(),
            );
        }

        let score = score.max(0);

        Ok(success(json!({
            "compliance_score": score,
            "status": if score >= 80 { "COMPLIANT" } else { "NON_COMPLIANT" },
            "issues": issues,
            "recommendations": recommendations,
        })))
    }
}

//
// ================= Invoice Tools =================
//
// No OCR, ERP or payment backends are wired in; these return fixed
// acknowledgements so the invoice pipeline has a complete tool set.

pub struct InvoiceOcrTool;

#[async_trait::async_trait]
impl Tool for InvoiceOcrTool {
    fn name(&self) -> &'static str {
        "invoice_ocr"
    }

    fn description(&self) -> &'static str {
        "Extract data from invoice documents using OCR"
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        ensure_object_parameters(input)?;

        Ok(success(json!({
            "status": "success",
            "extracted_data": {
                "invoice_number": input.parameters.get("invoice_id").cloned().unwrap_or(json!("INV-001")),
                "vendor": "Sample Vendor",
                "amount": 1000.00,
                "currency": "USD",
                "line_items": [],
            }
        })))
    }
}

pub struct ErpValidationTool;

#[async_trait::async_trait]
impl Tool for ErpValidationTool {
    fn name(&self) -> &'static str {
        "erp_validation"
    }

    fn description(&self) -> &'static str {
        "Validate invoice data against ERP system"
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        ensure_object_parameters(input)?;

        Ok(success(json!({
            "status": "success",
            "validation_result": {
                "po_match": true,
                "vendor_valid": true,
                "budget_available": true,
                "duplicate_check": false,
            }
        })))
    }
}

pub struct PaymentGatewayTool;

#[async_trait::async_trait]
impl Tool for PaymentGatewayTool {
    fn name(&self) -> &'static str {
        "payment_gateway"
    }

    fn description(&self) -> &'static str {
        "Execute payments through payment gateway"
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        ensure_object_parameters(input)?;

        Ok(success(json!({
            "status": "success",
            "payment_result": {
                "transaction_id": format!("TX-{}", Uuid::new_v4().simple()),
                "status": "completed",
                "timestamp": Utc::now().to_rfc3339(),
            }
        })))
    }
}

pub struct AuditLoggerTool;

#[async_trait::async_trait]
impl Tool for AuditLoggerTool {
    fn name(&self) -> &'static str {
        "audit_logger"
    }

    fn description(&self) -> &'static str {
        "Log audit events for compliance tracking"
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        ensure_object_parameters(input)?;

        Ok(success(json!({
            "status": "success",
            "audit_log": {
                "event_id": format!("EVT-{}", Uuid::new_v4().simple()),
                "timestamp": Utc::now().to_rfc3339(),
                "type": input.parameters.get("type"),
                "details": input.parameters.get("details"),
            }
        })))
    }
}

/// Tools shared by every finance workflow
pub fn finance_tools() -> Vec<ToolHandle> {
    vec![
        Arc::new(FinancialDataTool),
        Arc::new(RiskCalculatorTool),
        Arc::new(BudgetAnalyzerTool),
        Arc::new(ComplianceCheckerTool),
    ]
}

/// Tools shared by every invoice-to-pay stage
pub fn invoice_tools() -> Vec<ToolHandle> {
    vec![
        Arc::new(InvoiceOcrTool),
        Arc::new(ErpValidationTool),
        Arc::new(PaymentGatewayTool),
        Arc::new(AuditLoggerTool),
    ]
}
