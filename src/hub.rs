//! Client for the automation hub that aggregates the content agents
//! (WordPress pages and blog, podcast, social media).
//!
//! Both operations always return something displayable: a hub that cannot
//! be reached yields a fixed fallback roster or a `success: false` envelope.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration as ChronoDuration, SecondsFormat, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{info, warn};

use crate::config::HubConfig;

pub const DEFAULT_HUB_URL: &str = "http://localhost:4000";

const FALLBACK_MESSAGE: &str = "Hub connection failed, using fallback data";
const ACTION_FAILED_MESSAGE: &str = "Action failed - hub unavailable";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentMetrics {
    pub tasks_completed: u64,
    pub success_rate: f64,
    pub last_activity: String,
    pub current_task: String,
    pub queue_length: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubAgent {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    pub description: String,
    pub metrics: AgentMetrics,
    pub capabilities: Vec<String>,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubSnapshot {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub hub: Value,
    pub agents: Vec<HubAgent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionEnvelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A content agent known to the dashboard, with the defaults used when the
/// hub omits a field.
struct CatalogEntry {
    id: &'static str,
    name: &'static str,
    /// Section of the hub's status document describing this agent.
    hub_key: &'static str,
    description: &'static str,
    capabilities: &'static [&'static str],
    suggestions: &'static [&'static str],
    tasks_completed: u64,
    success_rate: f64,
    current_task: &'static str,
    queue_length: u64,
    fallback_status: &'static str,
    fallback_idle_minutes: i64,
}

const CATALOG: [CatalogEntry; 4] = [
    CatalogEntry {
        id: "wordpress-content",
        name: "WordPress Content Manager",
        hub_key: "wordpress",
        description: "Manages WordPress website content and SEO optimization",
        capabilities: &[
            "Page content creation and updates",
            "SEO optimization",
            "Image and media management",
            "Website structure optimization",
            "Content scheduling",
        ],
        suggestions: &[
            "Update homepage with new service offerings",
            "Optimize SEO for tax season keywords",
            "Add testimonials section to services page",
            "Create FAQ page for common tax questions",
        ],
        tasks_completed: 156,
        success_rate: 94.0,
        current_task: "Updating homepage content",
        queue_length: 3,
        fallback_status: "active",
        fallback_idle_minutes: 15,
    },
    CatalogEntry {
        id: "wordpress-blog",
        name: "WordPress Blog Manager",
        hub_key: "blog",
        description: "Manages blog posts and content marketing",
        capabilities: &[
            "Blog post creation and editing",
            "Content calendar management",
            "SEO optimization for blog posts",
            "Social media integration",
            "Analytics tracking",
        ],
        suggestions: &[
            "Create weekly tax tips blog series",
            "Optimize blog posts for search engines",
            "Add call-to-action buttons to blog posts",
            "Create content calendar for tax season",
        ],
        tasks_completed: 89,
        success_rate: 92.0,
        current_task: "Creating weekly tax tips blog",
        queue_length: 2,
        fallback_status: "processing",
        fallback_idle_minutes: 30,
    },
    CatalogEntry {
        id: "podcast-manager",
        name: "Podcast Manager",
        hub_key: "podcast",
        description: "Manages podcast content and distribution",
        capabilities: &[
            "Podcast episode planning",
            "Audio recording and editing",
            "Episode publishing and distribution",
            "Show notes creation",
            "Analytics tracking",
        ],
        suggestions: &[
            "Record Q4 tax planning episode",
            "Create show notes for recent episodes",
            "Optimize podcast SEO and descriptions",
            "Plan upcoming episode topics",
        ],
        tasks_completed: 45,
        success_rate: 88.0,
        current_task: "Recording Q4 tax planning podcast",
        queue_length: 1,
        fallback_status: "processing",
        fallback_idle_minutes: 45,
    },
    CatalogEntry {
        id: "social-media",
        name: "Social Media Manager",
        hub_key: "social",
        description: "Manages social media presence and engagement",
        capabilities: &[
            "Social media content creation",
            "Post scheduling and automation",
            "Engagement monitoring",
            "Analytics and reporting",
            "Cross-platform coordination",
        ],
        suggestions: &[
            "Schedule LinkedIn posts for tax season",
            "Create engaging social media content",
            "Monitor and respond to social media engagement",
            "Analyze social media performance metrics",
        ],
        tasks_completed: 234,
        success_rate: 96.0,
        current_task: "Scheduling LinkedIn posts",
        queue_length: 5,
        fallback_status: "active",
        fallback_idle_minutes: 10,
    },
];

fn iso(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl CatalogEntry {
    fn agent(&self, status: String, metrics: AgentMetrics) -> HubAgent {
        HubAgent {
            id: self.id.to_string(),
            name: self.name.to_string(),
            kind: self.id.to_string(),
            status,
            description: self.description.to_string(),
            metrics,
            capabilities: to_strings(self.capabilities),
            suggestions: to_strings(self.suggestions),
        }
    }

    /// Merge this agent's section of a live hub status document over the defaults.
    fn merge_live(&self, hub: &Value, now: DateTime<Utc>) -> HubAgent {
        let section = hub.get(self.hub_key);
        let str_field = |name: &str| section.and_then(|s| s.get(name)).and_then(Value::as_str);
        let u64_field = |name: &str| section.and_then(|s| s.get(name)).and_then(Value::as_u64);

        let metrics = AgentMetrics {
            tasks_completed: u64_field("tasksCompleted").unwrap_or(self.tasks_completed),
            success_rate: section
                .and_then(|s| s.get("successRate"))
                .and_then(Value::as_f64)
                .unwrap_or(self.success_rate),
            last_activity: str_field("lastActivity")
                .map(str::to_string)
                .unwrap_or_else(|| iso(now)),
            current_task: str_field("currentTask")
                .unwrap_or(self.current_task)
                .to_string(),
            queue_length: u64_field("queueLength").unwrap_or(self.queue_length),
        };
        let status = str_field("status").unwrap_or("active").to_string();
        self.agent(status, metrics)
    }

    fn fallback(&self, now: DateTime<Utc>) -> HubAgent {
        let metrics = AgentMetrics {
            tasks_completed: self.tasks_completed,
            success_rate: self.success_rate,
            last_activity: iso(now - ChronoDuration::minutes(self.fallback_idle_minutes)),
            current_task: self.current_task.to_string(),
            queue_length: self.queue_length,
        };
        self.agent(self.fallback_status.to_string(), metrics)
    }
}

impl HubSnapshot {
    pub fn live(hub: Value, now: DateTime<Utc>) -> Self {
        let agents = CATALOG.iter().map(|entry| entry.merge_live(&hub, now)).collect();
        Self {
            success: true,
            message: None,
            hub,
            agents,
        }
    }

    pub fn fallback(now: DateTime<Utc>) -> Self {
        let ids: Vec<&str> = CATALOG.iter().map(|entry| entry.id).collect();
        Self {
            success: false,
            message: Some(FALLBACK_MESSAGE.to_string()),
            hub: json!({
                "status": "fallback",
                "timestamp": iso(now),
                "agents": ids,
            }),
            agents: CATALOG.iter().map(|entry| entry.fallback(now)).collect(),
        }
    }
}

impl ActionEnvelope {
    fn ok(result: Value) -> Self {
        Self {
            success: true,
            result: Some(result),
            message: None,
            error: None,
        }
    }

    fn failed(error: &anyhow::Error) -> Self {
        Self {
            success: false,
            result: None,
            message: Some(ACTION_FAILED_MESSAGE.to_string()),
            error: Some(format!("{:#}", error)),
        }
    }
}

pub struct HubClient {
    client: Client,
    base_url: String,
    status_timeout: Duration,
    action_timeout: Duration,
}

impl HubClient {
    pub fn new(base_url: &str) -> Self {
        Self::from_config(&HubConfig {
            url: base_url.to_string(),
            ..HubConfig::default()
        })
    }

    pub fn from_config(config: &HubConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.url.trim_end_matches('/').to_string(),
            status_timeout: Duration::from_secs(config.status_timeout_seconds),
            action_timeout: Duration::from_secs(config.action_timeout_seconds),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Current roster of content agents, from the hub when reachable.
    pub async fn fetch_status(&self) -> HubSnapshot {
        match self.request_status().await {
            Ok(hub) => {
                info!("Hub status fetched from {}", self.base_url);
                HubSnapshot::live(hub, Utc::now())
            }
            Err(e) => {
                warn!("Hub status unavailable ({:#}), using fallback roster", e);
                HubSnapshot::fallback(Utc::now())
            }
        }
    }

    /// Forward an action (start, stop, restart, content operations) to one agent.
    pub async fn execute_action(&self, agent_id: &str, action: &str, data: &Value) -> ActionEnvelope {
        match self.request_action(agent_id, action, data).await {
            Ok(result) => {
                info!("Hub action {} on {} succeeded", action, agent_id);
                ActionEnvelope::ok(result)
            }
            Err(e) => {
                warn!("Hub action {} on {} failed: {:#}", action, agent_id, e);
                ActionEnvelope::failed(&e)
            }
        }
    }

    async fn request_status(&self) -> Result<Value> {
        let response = self
            .client
            .get(format!("{}/status", self.base_url))
            .timeout(self.status_timeout)
            .send()
            .await
            .context("Failed to reach hub")?;

        if !response.status().is_success() {
            anyhow::bail!("Hub responded with status: {}", response.status());
        }

        response.json().await.context("Failed to parse hub status")
    }

    async fn request_action(&self, agent_id: &str, action: &str, data: &Value) -> Result<Value> {
        let response = self
            .client
            .post(format!("{}/agents/{}/{}", self.base_url, agent_id, action))
            .timeout(self.action_timeout)
            .json(data)
            .send()
            .await
            .context("Failed to reach hub")?;

        if !response.status().is_success() {
            anyhow::bail!("Hub action failed: {}", response.status());
        }

        response.json().await.context("Failed to parse hub action result")
    }
}
