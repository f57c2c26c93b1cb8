//! Tax analysis agents backed by a chat-completion API, plus the thin
//! plumbing the Tax4US dashboard needs around them: a hub proxy client and
//! an upload store.

pub mod agents;
pub mod client;
pub mod config;
pub mod error;
pub mod hub;
pub mod report;
pub mod uploads;

#[cfg(test)]
pub(crate) mod test_support;

pub use agents::{Agent, AgentInfo, AgentProfile, AgentStatus, Analysis, AnalysisRecord};
pub use client::{ChatMessage, CompletionClient, OpenAiClient};
pub use config::Config;
pub use error::{AgentError, AgentResult};
