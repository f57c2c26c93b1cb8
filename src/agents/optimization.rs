use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use super::{Agent, AgentDescriptor, AgentProfile, Analysis, AnalysisRecord, RiskLevel};
use crate::error::AgentResult;

const DESCRIPTOR: AgentDescriptor = AgentDescriptor {
    name: "Tax Optimization Advisor Agent",
    description: "AI-powered tax optimization strategies and savings analysis",
    version: "1.0.0",
    running_label: "analyzing",
    failure_label: "Tax optimization analysis failed",
    phase: "ANALYZE",
    capabilities: &[
        "Tax optimization analysis",
        "Savings calculation",
        "Strategy recommendations",
        "Risk assessment",
        "Implementation planning",
    ],
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyCategory {
    Deduction,
    Credit,
    Timing,
    Structure,
    #[serde(untagged)]
    Other(String),
}

/// A strategy, either from the catalog sent with the prompt or as returned
/// in an analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptimizationStrategy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<StrategyCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub potential_savings: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity: Option<RiskLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,
    pub requirements: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepPriority {
    High,
    Medium,
    Low,
    #[serde(untagged)]
    Other(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImplementationStep {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<StepPriority>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptimizationAnalysis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_tax_liability: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub potential_savings: Option<Number>,
    pub opportunities: Vec<OptimizationStrategy>,
    pub recommendations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_assessment: Option<String>,
    pub implementation_plan: Vec<ImplementationStep>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AnalysisRecord for OptimizationAnalysis {
    fn extra_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.extra
    }
}

#[derive(Debug, Clone)]
pub struct OptimizationRequest {
    pub tax_data: Value,
    pub financial_profile: Value,
}

/// Optimization strategies embedded in every prompt.
pub struct StrategyCatalog {
    strategies: Vec<OptimizationStrategy>,
}

impl StrategyCatalog {
    pub fn new(strategies: Vec<OptimizationStrategy>) -> Self {
        Self { strategies }
    }

    pub fn strategies(&self) -> &[OptimizationStrategy] {
        &self.strategies
    }
}

impl Default for StrategyCatalog {
    fn default() -> Self {
        Self::new(default_strategies())
    }
}

#[allow(clippy::too_many_arguments)]
fn strategy(
    id: &str,
    name: &str,
    description: &str,
    category: StrategyCategory,
    potential_savings: u64,
    complexity: RiskLevel,
    risk_level: RiskLevel,
    requirements: &[&str],
) -> OptimizationStrategy {
    OptimizationStrategy {
        id: Some(id.to_string()),
        name: Some(name.to_string()),
        description: Some(description.to_string()),
        category: Some(category),
        potential_savings: Some(Number::from(potential_savings)),
        complexity: Some(complexity),
        risk_level: Some(risk_level),
        requirements: requirements.iter().map(|r| r.to_string()).collect(),
        extra: Map::new(),
    }
}

fn default_strategies() -> Vec<OptimizationStrategy> {
    vec![
        strategy(
            "home_office",
            "Home Office Deduction",
            "Deduct expenses for business use of home",
            StrategyCategory::Deduction,
            1500,
            RiskLevel::Medium,
            RiskLevel::Low,
            &["Regular and exclusive business use", "Principal place of business"],
        ),
        strategy(
            "retirement_contributions",
            "Retirement Account Contributions",
            "Maximize contributions to tax-advantaged accounts",
            StrategyCategory::Deduction,
            2000,
            RiskLevel::Low,
            RiskLevel::Low,
            &["Eligible income", "Contribution limits"],
        ),
        strategy(
            "business_expenses",
            "Business Expense Optimization",
            "Maximize legitimate business deductions",
            StrategyCategory::Deduction,
            3000,
            RiskLevel::High,
            RiskLevel::Medium,
            &["Proper documentation", "Business purpose"],
        ),
        strategy(
            "timing_strategies",
            "Income/Expense Timing",
            "Optimize timing of income and expenses",
            StrategyCategory::Timing,
            1000,
            RiskLevel::Medium,
            RiskLevel::Medium,
            &["Flexible income/expense timing", "Tax planning"],
        ),
    ]
}

impl AgentProfile for StrategyCatalog {
    type Request = OptimizationRequest;
    type Output = OptimizationAnalysis;

    fn descriptor(&self) -> &AgentDescriptor {
        &DESCRIPTOR
    }

    fn render_prompt(&self, request: &OptimizationRequest) -> anyhow::Result<String> {
        let tax_data =
            serde_json::to_string(&request.tax_data).context("Failed to serialize tax data")?;
        let profile = serde_json::to_string(&request.financial_profile)
            .context("Failed to serialize financial profile")?;
        let strategies = serde_json::to_string(&self.strategies)
            .context("Failed to serialize optimization strategies")?;

        Ok(format!(
            "Analyze tax optimization opportunities based on the following data:

Tax Data: {tax_data}
Financial Profile: {profile}

Available Strategies: {strategies}

Please provide:
1. Current tax liability estimate
2. Potential savings amount
3. Specific optimization opportunities
4. Detailed recommendations
5. Confidence score (0-100)
6. Risk assessment
7. Implementation plan with timeline

Respond in JSON format with the fields: currentTaxLiability, potentialSavings, \
opportunities, recommendations, confidence, riskAssessment, \
implementationPlan (step, timeline, priority)."
        ))
    }

    fn fallback(&self, _request: &OptimizationRequest) -> OptimizationAnalysis {
        OptimizationAnalysis {
            current_tax_liability: Some(Number::from(15000)),
            potential_savings: Some(Number::from(2500)),
            opportunities: Vec::new(),
            recommendations: vec![
                "Consult with tax professional for personalized advice".to_string()
            ],
            confidence: Some(Number::from(75)),
            risk_assessment: Some("Medium risk - professional review recommended".to_string()),
            implementation_plan: vec![ImplementationStep {
                step: Some("Schedule consultation with tax advisor".to_string()),
                timeline: Some("Within 30 days".to_string()),
                priority: Some(StepPriority::High),
                extra: Map::new(),
            }],
            extra: Map::new(),
        }
    }
}

pub type OptimizationAdvisor = Agent<StrategyCatalog>;

impl Agent<StrategyCatalog> {
    pub async fn optimize_tax_strategy(
        &self,
        tax_data: Value,
        financial_profile: Value,
    ) -> AgentResult<Analysis<OptimizationAnalysis>> {
        self.run(&OptimizationRequest {
            tax_data,
            financial_profile,
        })
        .await
    }
}
