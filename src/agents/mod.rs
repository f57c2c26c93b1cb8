//! The analysis-agent engine.
//!
//! Every agent in this crate is the same machine: render a prompt from a
//! typed request, send it as one user message to a [`CompletionClient`],
//! and decode the reply into a typed result. Decoding is tolerant: any JSON
//! object is accepted and every key in it survives, whether or not it fits
//! the typed record. A reply that is not a JSON object yields the agent's
//! fixed fallback result; only a failed or empty completion call is reported
//! as an error.

pub mod compliance;
pub mod decision;
pub mod document;
pub mod optimization;

use anyhow::Context;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::client::{ChatMessage, CompletionClient};
use crate::error::{AgentError, AgentResult};

pub use compliance::{ComplianceMonitor, ComplianceRequest, ComplianceRules, ComplianceStatus};
pub use decision::{DecisionAnalysis, DecisionRequest, DecisionProfile, DecisionSupport};
pub use document::{
    DocumentAnalysis, DocumentProcessor, DocumentRequest, DocumentProfile, ProcessedDocument,
};
pub use optimization::{
    OptimizationAdvisor, OptimizationAnalysis, OptimizationRequest, StrategyCatalog,
};

/// Static description of an agent kind.
#[derive(Debug, Clone, Copy)]
pub struct AgentDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub version: &'static str,
    /// Status label reported while a call is in flight.
    pub running_label: &'static str,
    /// Prefix of the error raised when the completion call fails.
    pub failure_label: &'static str,
    /// Workflow phase the agent belongs to.
    pub phase: &'static str,
    pub capabilities: &'static [&'static str],
}

/// A decoded completion. Known fields are typed; every other key the model
/// returned is kept in an untyped map and serialized back out unchanged.
pub trait AnalysisRecord: DeserializeOwned + Serialize + Clone + Send {
    fn extra_mut(&mut self) -> &mut Map<String, Value>;
}

/// Prompt template, result schema and fallback for one agent kind.
pub trait AgentProfile: Send + Sync {
    type Request: Send + Sync;
    type Output: AnalysisRecord;

    fn descriptor(&self) -> &AgentDescriptor;

    /// Render the single user message sent to the completion service.
    fn render_prompt(&self, request: &Self::Request) -> anyhow::Result<String>;

    /// Result returned when the completion cannot be decoded.
    fn fallback(&self, request: &Self::Request) -> Self::Output;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Idle,
    Running,
    Error,
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentStatus::Idle => write!(f, "idle"),
            AgentStatus::Running => write!(f, "running"),
            AgentStatus::Error => write!(f, "error"),
        }
    }
}

/// Risk rating. Ratings outside the known vocabulary are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    #[serde(untagged)]
    Other(String),
}

/// Outcome of a successful completion call.
#[derive(Debug, Clone, PartialEq)]
pub enum Analysis<T> {
    /// The completion was a JSON object, returned with all of its fields.
    Parsed(T),
    /// The completion was not a JSON object; this is the agent's fixed fallback.
    Fallback(T),
}

impl<T> Analysis<T> {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Analysis::Fallback(_))
    }

    pub fn get(&self) -> &T {
        match self {
            Analysis::Parsed(value) | Analysis::Fallback(value) => value,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Analysis::Parsed(value) | Analysis::Fallback(value) => value,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Analysis<U> {
        match self {
            Analysis::Parsed(value) => Analysis::Parsed(f(value)),
            Analysis::Fallback(value) => Analysis::Fallback(f(value)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentInfo {
    pub name: String,
    pub description: String,
    pub version: String,
    pub status: String,
    pub capabilities: Vec<String>,
    pub phase: String,
}

pub struct Agent<S: AgentProfile> {
    profile: S,
    client: Arc<dyn CompletionClient>,
    status: RwLock<AgentStatus>,
    // Held for the whole of `run`, so overlapping calls on one instance queue up.
    in_flight: Mutex<()>,
}

impl<S: AgentProfile> Agent<S> {
    pub fn new(profile: S, client: Arc<dyn CompletionClient>) -> Self {
        Self {
            profile,
            client,
            status: RwLock::new(AgentStatus::Idle),
            in_flight: Mutex::new(()),
        }
    }

    pub fn profile(&self) -> &S {
        &self.profile
    }

    pub fn status(&self) -> AgentStatus {
        *self.status.read()
    }

    pub fn info(&self) -> AgentInfo {
        let descriptor = self.profile.descriptor();
        let status = match self.status() {
            AgentStatus::Running => descriptor.running_label.to_string(),
            other => other.to_string(),
        };
        AgentInfo {
            name: descriptor.name.to_string(),
            description: descriptor.description.to_string(),
            version: descriptor.version.to_string(),
            status,
            capabilities: descriptor
                .capabilities
                .iter()
                .map(|c| c.to_string())
                .collect(),
            phase: descriptor.phase.to_string(),
        }
    }

    /// Run one analysis.
    ///
    /// The status is `running` for the duration of the call, `idle` after any
    /// completed call (fallback included) and `error` after a failed one.
    pub async fn run(&self, request: &S::Request) -> AgentResult<Analysis<S::Output>> {
        let _guard = self.in_flight.lock().await;
        let descriptor = self.profile.descriptor();

        self.set_status(AgentStatus::Running);
        info!(agent = descriptor.name, "analysis started");

        let text = match self.request_completion(request).await {
            Ok(text) => text,
            Err(source) => {
                self.set_status(AgentStatus::Error);
                error!(agent = descriptor.name, "{}: {:#}", descriptor.failure_label, source);
                return Err(AgentError::analysis_failed(descriptor.failure_label, source));
            }
        };

        let analysis = match decode::<S::Output>(&text) {
            Ok(output) => Analysis::Parsed(output),
            Err(err) => {
                warn!(
                    agent = descriptor.name,
                    error = %format!("{:#}", err),
                    "completion is not a JSON object, using fallback result"
                );
                Analysis::Fallback(self.profile.fallback(request))
            }
        };

        self.set_status(AgentStatus::Idle);
        info!(
            agent = descriptor.name,
            fallback = analysis.is_fallback(),
            "analysis completed"
        );
        Ok(analysis)
    }

    async fn request_completion(&self, request: &S::Request) -> anyhow::Result<String> {
        let prompt = self.profile.render_prompt(request)?;
        debug!(
            agent = self.profile.descriptor().name,
            prompt_bytes = prompt.len(),
            "prompt rendered"
        );

        let content = self.client.complete(&[ChatMessage::user(prompt)]).await?;
        match content {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => anyhow::bail!("No response from AI"),
        }
    }

    fn set_status(&self, status: AgentStatus) {
        *self.status.write() = status;
    }
}

/// Decode a completion into `T`, tolerating a surrounding Markdown code fence.
///
/// Any JSON object decodes. A key whose value does not fit its typed field is
/// moved into the record's untyped map under the same key, so the serialized
/// record still carries the value the model sent.
fn decode<T: AnalysisRecord>(text: &str) -> anyhow::Result<T> {
    let value: Value =
        serde_json::from_str(extract_json(text)).context("completion is not valid JSON")?;
    let Value::Object(object) = value else {
        anyhow::bail!("completion is JSON but not an object");
    };

    if let Ok(record) = serde_json::from_value(Value::Object(object.clone())) {
        return Ok(record);
    }

    let (fitting, misfit): (Map<String, Value>, Map<String, Value>) =
        object.into_iter().partition(|(key, value)| fits::<T>(key, value));
    debug!(
        fields = ?misfit.keys().collect::<Vec<_>>(),
        "keeping mistyped fields untyped"
    );
    let mut record: T = serde_json::from_value(Value::Object(fitting))
        .context("completion fields do not decode")?;
    record.extra_mut().extend(misfit);
    Ok(record)
}

fn fits<T: AnalysisRecord>(key: &str, value: &Value) -> bool {
    let mut single = Map::new();
    single.insert(key.to_string(), value.clone());
    serde_json::from_value::<T>(Value::Object(single)).is_ok()
}

fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    // Skip the info string (e.g. `json`) on the opening fence line.
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim()
}
