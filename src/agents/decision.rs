use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use super::{Agent, AgentDescriptor, AgentProfile, Analysis, AnalysisRecord, RiskLevel};
use crate::error::AgentResult;

const DESCRIPTOR: AgentDescriptor = AgentDescriptor {
    name: "Tax Decision Support Agent",
    description: "AI-powered decision support for tax strategy and planning",
    version: "1.0.0",
    running_label: "analyzing",
    failure_label: "Decision analysis failed",
    phase: "DECIDE",
    capabilities: &[
        "Decision analysis",
        "Option evaluation",
        "Risk assessment",
        "Recommendation generation",
        "Action planning",
    ],
};

const RESPONSE_SHAPE: &str = r#"{
  "problem": "string",
  "context": "string",
  "options": [{"id": "string", "title": "string", "description": "string", "pros": ["string"], "cons": ["string"], "riskLevel": "low|medium|high", "confidence": number, "estimatedImpact": {"savings": number, "timeInvestment": number, "complexity": number}, "recommendedAction": "string"}],
  "recommendation": {"primary": {...}, "alternatives": [...], "reasoning": "string"},
  "nextSteps": [{"action": "string", "timeline": "string", "priority": "critical|high|medium|low", "responsible": "string"}],
  "riskMitigation": ["string"],
  "successMetrics": ["string"]
}"#;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EstimatedImpact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub savings: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_investment: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity: Option<Number>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DecisionOption {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_impact: Option<EstimatedImpact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_action: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Recommendation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<DecisionOption>,
    pub alternatives: Vec<DecisionOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Step priority. Priorities outside the known vocabulary are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
    #[serde(untagged)]
    Other(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NextStep {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responsible: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DecisionAnalysis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    pub options: Vec<DecisionOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<Recommendation>,
    pub next_steps: Vec<NextStep>,
    pub risk_mitigation: Vec<String>,
    pub success_metrics: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AnalysisRecord for DecisionAnalysis {
    fn extra_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.extra
    }
}

#[derive(Debug, Clone)]
pub struct DecisionRequest {
    pub problem: String,
    pub context: Value,
    pub available_data: Value,
}

#[derive(Debug, Default)]
pub struct DecisionProfile;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn consult_professional() -> DecisionOption {
    DecisionOption {
        id: Some("consult_professional".to_string()),
        title: Some("Consult Tax Professional".to_string()),
        description: Some("Seek professional tax advice for complex decisions".to_string()),
        pros: strings(&["Expert guidance", "Risk mitigation", "Compliance assurance"]),
        cons: strings(&["Cost", "Time investment", "Dependency"]),
        risk_level: Some(RiskLevel::Low),
        confidence: Some(Number::from(90)),
        estimated_impact: Some(EstimatedImpact {
            savings: Some(Number::from(0)),
            time_investment: Some(Number::from(2)),
            complexity: Some(Number::from(1)),
            extra: Map::new(),
        }),
        recommended_action: Some(
            "Schedule consultation with qualified tax professional".to_string(),
        ),
        extra: Map::new(),
    }
}

impl AgentProfile for DecisionProfile {
    type Request = DecisionRequest;
    type Output = DecisionAnalysis;

    fn descriptor(&self) -> &AgentDescriptor {
        &DESCRIPTOR
    }

    fn render_prompt(&self, request: &DecisionRequest) -> anyhow::Result<String> {
        let context =
            serde_json::to_string(&request.context).context("Failed to serialize context")?;
        let data = serde_json::to_string(&request.available_data)
            .context("Failed to serialize available data")?;

        Ok(format!(
            "Analyze the following tax decision problem and provide structured decision support:

Problem: {problem}
Context: {context}
Available Data: {data}

Please provide:
1. Clear problem statement
2. Context analysis
3. 3-5 decision options with pros/cons
4. Primary recommendation with reasoning
5. Alternative options
6. Specific next steps with timeline
7. Risk mitigation strategies
8. Success metrics

Respond in JSON format with the following structure:
{RESPONSE_SHAPE}",
            problem = request.problem,
        ))
    }

    fn fallback(&self, request: &DecisionRequest) -> DecisionAnalysis {
        DecisionAnalysis {
            problem: Some(request.problem.clone()),
            context: Some("Unable to analyze context".to_string()),
            options: vec![consult_professional()],
            recommendation: Some(Recommendation {
                primary: Some(consult_professional()),
                alternatives: Vec::new(),
                reasoning: Some(
                    "Professional consultation recommended for complex tax decisions".to_string(),
                ),
                extra: Map::new(),
            }),
            next_steps: vec![NextStep {
                action: Some("Contact tax professional".to_string()),
                timeline: Some("Within 7 days".to_string()),
                priority: Some(Priority::High),
                responsible: Some("Taxpayer".to_string()),
                extra: Map::new(),
            }],
            risk_mitigation: strings(&["Professional review", "Documentation", "Compliance checking"]),
            success_metrics: strings(&["Decision clarity", "Risk reduction", "Compliance assurance"]),
            extra: Map::new(),
        }
    }
}

pub type DecisionSupport = Agent<DecisionProfile>;

impl Agent<DecisionProfile> {
    pub async fn analyze_decision(
        &self,
        problem: impl Into<String>,
        context: Value,
        available_data: Value,
    ) -> AgentResult<Analysis<DecisionAnalysis>> {
        self.run(&DecisionRequest {
            problem: problem.into(),
            context,
            available_data,
        })
        .await
    }
}
