use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use uuid::Uuid;

use super::{Agent, AgentDescriptor, AgentProfile, Analysis, AnalysisRecord};
use crate::error::AgentResult;

const DESCRIPTOR: AgentDescriptor = AgentDescriptor {
    name: "Tax Document Processor Agent",
    description: "AI-powered tax document analysis and data extraction",
    version: "1.0.0",
    running_label: "processing",
    failure_label: "Document processing failed",
    phase: "BUILD",
    capabilities: &[
        "Document type identification",
        "Data extraction",
        "Risk assessment",
        "Compliance checking",
        "Recommendation generation",
    ],
};

/// Characters of the raw document kept in the fallback's `keyData`.
const FALLBACK_EXCERPT_CHARS: usize = 200;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentAnalysis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    pub key_data: Map<String, Value>,
    pub risk_factors: Vec<String>,
    pub recommendations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Number>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AnalysisRecord for DocumentAnalysis {
    fn extra_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.extra
    }
}

#[derive(Debug, Clone)]
pub struct DocumentRequest {
    pub content: String,
    pub file_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Processing,
    Completed,
    Error,
}

/// A document together with its analysis and bookkeeping fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedDocument {
    pub id: String,
    pub name: String,
    /// The analysed document type, absent when the analysis names none.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub status: DocumentStatus,
    pub analysis: Option<DocumentAnalysis>,
    pub uploaded_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
}

impl ProcessedDocument {
    fn completed(file_name: &str, analysis: DocumentAnalysis, now: DateTime<Utc>) -> Self {
        Self {
            id: document_id(now),
            name: file_name.to_string(),
            kind: analysis.document_type.clone(),
            status: DocumentStatus::Completed,
            analysis: Some(analysis),
            uploaded_at: now,
            processed_at: Some(now),
        }
    }
}

/// `doc_<unix millis>_<9 lowercase alphanumerics>`
fn document_id(now: DateTime<Utc>) -> String {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(9).collect();
    format!("doc_{}_{}", now.timestamp_millis(), suffix)
}

#[derive(Debug, Default)]
pub struct DocumentProfile;

impl AgentProfile for DocumentProfile {
    type Request = DocumentRequest;
    type Output = DocumentAnalysis;

    fn descriptor(&self) -> &AgentDescriptor {
        &DESCRIPTOR
    }

    fn render_prompt(&self, request: &DocumentRequest) -> anyhow::Result<String> {
        Ok(format!(
            "Analyze this tax document and extract key information:

Document content:
{content}

Please provide:
1. Document type (W-2, 1099, Schedule C, etc.)
2. Key data points (income, deductions, etc.)
3. Risk factors
4. Recommendations
5. Confidence score (0-100)

Respond in JSON format with the fields: documentType, keyData, riskFactors, \
recommendations, confidence.",
            content = request.content,
        ))
    }

    fn fallback(&self, request: &DocumentRequest) -> DocumentAnalysis {
        let excerpt: String = request.content.chars().take(FALLBACK_EXCERPT_CHARS).collect();
        let mut key_data = Map::new();
        key_data.insert("content".to_string(), Value::String(excerpt));

        DocumentAnalysis {
            document_type: Some("Unknown".to_string()),
            key_data,
            risk_factors: vec!["Unable to parse document".to_string()],
            recommendations: vec!["Manual review required".to_string()],
            confidence: Some(Number::from(0)),
            extra: Map::new(),
        }
    }
}

pub type DocumentProcessor = Agent<DocumentProfile>;

impl Agent<DocumentProfile> {
    pub async fn process_document(
        &self,
        content: impl Into<String>,
        file_name: impl Into<String>,
    ) -> AgentResult<Analysis<ProcessedDocument>> {
        let request = DocumentRequest {
            content: content.into(),
            file_name: file_name.into(),
        };
        let analysis = self.run(&request).await?;
        let now = Utc::now();
        Ok(analysis.map(|analysis| ProcessedDocument::completed(&request.file_name, analysis, now)))
    }
}
