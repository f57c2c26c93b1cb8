use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agents::Analysis;
use crate::error::AgentError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Fallback,
    Failed,
}

/// Envelope describing one agent run, as printed by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentReport {
    pub agent: String,
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AgentReport {
    pub fn success(agent: String, output: Value) -> Self {
        Self::new(agent, RunStatus::Success, Some(output), None)
    }

    pub fn fallback(agent: String, output: Value) -> Self {
        Self::new(agent, RunStatus::Fallback, Some(output), None)
    }

    pub fn failed(agent: String, error: String) -> Self {
        Self::new(agent, RunStatus::Failed, None, Some(error))
    }

    /// Build a report from the result of an agent run.
    pub fn from_run<T: Serialize>(agent: &str, run: Result<Analysis<T>, AgentError>) -> Self {
        let agent = agent.to_string();
        match run {
            Ok(analysis) => {
                let fallback = analysis.is_fallback();
                match serde_json::to_value(analysis.into_inner()) {
                    Ok(output) if fallback => Self::fallback(agent, output),
                    Ok(output) => Self::success(agent, output),
                    Err(e) => Self::failed(agent, format!("Failed to serialize result: {}", e)),
                }
            }
            Err(e) => Self::failed(agent, e.to_string()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == RunStatus::Failed
    }

    fn new(
        agent: String,
        status: RunStatus,
        output: Option<Value>,
        error: Option<String>,
    ) -> Self {
        Self {
            agent,
            status,
            output,
            error,
            timestamp: Utc::now(),
        }
    }
}
