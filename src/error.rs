use thiserror::Error;

/// Errors surfaced by an agent run.
///
/// Only transport-level problems end up here. A completion that arrives but
/// cannot be decoded is absorbed into the agent's fallback result instead.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The completion call failed or returned no content.
    #[error("{label}: {source:#}")]
    AnalysisFailed {
        label: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl AgentError {
    pub fn analysis_failed(label: &'static str, source: anyhow::Error) -> Self {
        AgentError::AnalysisFailed { label, source }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgentError::AnalysisFailed { label, .. } => *label,
        }
    }
}

pub type AgentResult<T> = Result<T, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_display_includes_label_and_cause() {
        let err = AgentError::analysis_failed(
            "Compliance monitoring failed",
            anyhow::anyhow!("connection refused"),
        );
        assert_eq!(
            err.to_string(),
            "Compliance monitoring failed: connection refused"
        );
        assert_eq!(err.label(), "Compliance monitoring failed");
    }

    #[test]
    fn test_source_is_preserved() {
        let err = AgentError::analysis_failed(
            "Decision analysis failed",
            anyhow::anyhow!("timeout"),
        );
        let source = err.source().expect("source attached");
        assert_eq!(source.to_string(), "timeout");
    }
}
