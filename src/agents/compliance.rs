use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use super::{Agent, AgentDescriptor, AgentProfile, Analysis, AnalysisRecord, RiskLevel};
use crate::error::AgentResult;

const DESCRIPTOR: AgentDescriptor = AgentDescriptor {
    name: "Tax Compliance Monitor Agent",
    description: "Real-time tax compliance monitoring and deadline tracking",
    version: "1.0.0",
    running_label: "monitoring",
    failure_label: "Compliance monitoring failed",
    phase: "MEASURE",
    capabilities: &[
        "Real-time compliance monitoring",
        "Deadline tracking",
        "Risk assessment",
        "Violation detection",
        "Recommendation generation",
    ],
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplianceCategory {
    Filing,
    Payment,
    Deduction,
    Reporting,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceRule {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: ComplianceCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub penalty: Option<String>,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeadlineType {
    Filing,
    Payment,
    Reporting,
    #[serde(untagged)]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeadlineStatus {
    Pending,
    Overdue,
    Completed,
    #[serde(untagged)]
    Other(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Deadline {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<DeadlineType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DeadlineStatus>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComplianceStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_score: Option<Number>,
    pub violations: Vec<String>,
    pub warnings: Vec<String>,
    pub deadlines: Vec<Deadline>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,
    pub recommendations: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AnalysisRecord for ComplianceStatus {
    fn extra_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.extra
    }
}

#[derive(Debug, Clone)]
pub struct ComplianceRequest {
    pub tax_data: Value,
    pub current_date: DateTime<Utc>,
}

/// Compliance rules embedded in every prompt.
pub struct ComplianceRules {
    rules: Vec<ComplianceRule>,
}

impl ComplianceRules {
    pub fn new(rules: Vec<ComplianceRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[ComplianceRule] {
        &self.rules
    }
}

impl Default for ComplianceRules {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

fn default_rules() -> Vec<ComplianceRule> {
    vec![
        ComplianceRule {
            id: "filing_deadline".to_string(),
            name: "Individual Tax Return Filing".to_string(),
            description: "Individual tax returns must be filed by April 15th".to_string(),
            category: ComplianceCategory::Filing,
            deadline: Some("2024-04-15".to_string()),
            penalty: Some("$435 minimum penalty for late filing".to_string()),
            risk_level: RiskLevel::High,
        },
        ComplianceRule {
            id: "estimated_payments".to_string(),
            name: "Quarterly Estimated Tax Payments".to_string(),
            description: "Estimated tax payments due quarterly".to_string(),
            category: ComplianceCategory::Payment,
            deadline: Some("2024-06-15".to_string()),
            penalty: Some("Interest on underpayment".to_string()),
            risk_level: RiskLevel::Medium,
        },
        ComplianceRule {
            id: "business_expenses".to_string(),
            name: "Business Expense Documentation".to_string(),
            description: "All business expenses must be properly documented".to_string(),
            category: ComplianceCategory::Deduction,
            deadline: None,
            penalty: None,
            risk_level: RiskLevel::Medium,
        },
    ]
}

impl AgentProfile for ComplianceRules {
    type Request = ComplianceRequest;
    type Output = ComplianceStatus;

    fn descriptor(&self) -> &AgentDescriptor {
        &DESCRIPTOR
    }

    fn render_prompt(&self, request: &ComplianceRequest) -> anyhow::Result<String> {
        let tax_data =
            serde_json::to_string(&request.tax_data).context("Failed to serialize tax data")?;
        let rules =
            serde_json::to_string(&self.rules).context("Failed to serialize compliance rules")?;
        let current_date = request
            .current_date
            .to_rfc3339_opts(SecondsFormat::Millis, true);

        Ok(format!(
            "Analyze tax compliance based on the following data:

Tax Data: {tax_data}
Current Date: {current_date}

Available Rules: {rules}

Please provide:
1. Overall compliance score (0-100)
2. List of violations
3. List of warnings
4. Upcoming deadlines
5. Risk level assessment
6. Recommendations for improvement

Respond in JSON format with the fields: overallScore, violations, warnings, \
deadlines (date, description, type, status), riskLevel, recommendations."
        ))
    }

    fn fallback(&self, _request: &ComplianceRequest) -> ComplianceStatus {
        ComplianceStatus {
            overall_score: Some(Number::from(85)),
            violations: vec!["Unable to analyze compliance".to_string()],
            warnings: vec!["Manual review recommended".to_string()],
            deadlines: Vec::new(),
            risk_level: Some(RiskLevel::Medium),
            recommendations: vec!["Contact tax professional for review".to_string()],
            extra: Map::new(),
        }
    }
}

pub type ComplianceMonitor = Agent<ComplianceRules>;

impl Agent<ComplianceRules> {
    pub async fn monitor_compliance(
        &self,
        tax_data: Value,
        current_date: DateTime<Utc>,
    ) -> AgentResult<Analysis<ComplianceStatus>> {
        self.run(&ComplianceRequest {
            tax_data,
            current_date,
        })
        .await
    }
}
