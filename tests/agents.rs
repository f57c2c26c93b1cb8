use anyhow::Result;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::{json, Number, Value};
use std::sync::Arc;

use tax4us_agents::agents::{
    ComplianceMonitor, ComplianceRules, DecisionProfile, DecisionSupport, DocumentProcessor,
    DocumentProfile, OptimizationAdvisor, StrategyCatalog,
};
use tax4us_agents::{AgentProfile, AgentStatus, Analysis, ChatMessage, CompletionClient};

/// Deterministic stand-in for the completion service.
enum Stub {
    Reply(&'static str),
    Empty,
    NetworkError,
}

#[async_trait]
impl CompletionClient for Stub {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Option<String>> {
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");
        match self {
            Stub::Reply(text) => Ok(Some(text.to_string())),
            Stub::Empty => Ok(None),
            Stub::NetworkError => Err(anyhow::anyhow!("connection refused")),
        }
    }
}

const PROSE: &str = "I'm sorry, I can't provide that in JSON.";

#[tokio::test]
async fn document_processor_extracts_w2() {
    let agent = DocumentProcessor::new(
        DocumentProfile,
        Arc::new(Stub::Reply(
            r#"{"documentType":"W-2","keyData":{"wages":50000},"riskFactors":[],"recommendations":[],"confidence":92}"#,
        )),
    );

    let doc = agent
        .process_document("<W-2 text>", "w2.pdf")
        .await
        .unwrap()
        .into_inner();

    assert_eq!(doc.kind.as_deref(), Some("W-2"));
    assert!(doc.id.starts_with("doc_"));
    assert!(doc.processed_at.unwrap() >= doc.uploaded_at);
    let analysis = doc.analysis.unwrap();
    assert_eq!(analysis.document_type.as_deref(), Some("W-2"));
    assert_eq!(analysis.confidence, Some(Number::from(92)));
    assert_eq!(agent.status(), AgentStatus::Idle);

    let again = agent
        .process_document("<W-2 text>", "w2.pdf")
        .await
        .unwrap()
        .into_inner();
    let value = serde_json::to_value(&again).unwrap();
    assert_eq!(value["type"], "W-2");
    assert_eq!(value["analysis"]["keyData"]["wages"], 50000);
    assert!(value.get("uploadedAt").is_some());
}

#[tokio::test]
async fn document_processor_falls_back_on_prose() {
    let agent = DocumentProcessor::new(
        DocumentProfile,
        Arc::new(Stub::Reply("I could not process this.")),
    );

    let result = agent.process_document("<W-2 text>", "w2.pdf").await.unwrap();
    assert!(result.is_fallback());

    let analysis = result.into_inner().analysis.unwrap();
    assert_eq!(
        serde_json::to_value(&analysis).unwrap(),
        json!({
            "documentType": "Unknown",
            "keyData": {"content": "<W-2 text>"},
            "riskFactors": ["Unable to parse document"],
            "recommendations": ["Manual review required"],
            "confidence": 0
        })
    );
    assert_eq!(agent.status(), AgentStatus::Idle);
}

#[tokio::test]
async fn compliance_monitor_network_error() {
    let agent = ComplianceMonitor::new(ComplianceRules::default(), Arc::new(Stub::NetworkError));

    let err = agent
        .monitor_compliance(json!({"income": 75000}), Utc::now())
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Compliance monitoring failed: connection refused"
    );
    assert_eq!(agent.status(), AgentStatus::Error);
    assert_eq!(agent.info().status, "error");
}

#[tokio::test]
async fn every_agent_falls_back_on_undecodable_reply() {
    let date = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();

    let compliance = ComplianceMonitor::new(ComplianceRules::default(), Arc::new(Stub::Reply(PROSE)));
    let result = compliance.monitor_compliance(json!({}), date).await.unwrap();
    assert!(result.is_fallback());
    assert_eq!(result.get().overall_score, Some(Number::from(85)));

    let decision = DecisionSupport::new(DecisionProfile, Arc::new(Stub::Reply("{\"problem\":")));
    let result = decision
        .analyze_decision("Itemize or standard deduction?", json!({}), json!({}))
        .await
        .unwrap();
    assert!(result.is_fallback());
    assert_eq!(result.get().options[0].id.as_deref(), Some("consult_professional"));
    assert_eq!(result.get().problem.as_deref(), Some("Itemize or standard deduction?"));

    let optimization =
        OptimizationAdvisor::new(StrategyCatalog::default(), Arc::new(Stub::Reply(PROSE)));
    let result = optimization
        .optimize_tax_strategy(json!({}), json!({}))
        .await
        .unwrap();
    assert!(result.is_fallback());
    assert_eq!(result.get().confidence, Some(Number::from(75)));

    for status in [compliance.status(), decision.status(), optimization.status()] {
        assert_eq!(status, AgentStatus::Idle);
    }
}

#[tokio::test]
async fn every_agent_fails_on_missing_content() {
    let compliance = ComplianceMonitor::new(ComplianceRules::default(), Arc::new(Stub::Empty));
    let err = compliance
        .monitor_compliance(json!({}), Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err.label(), "Compliance monitoring failed");

    let decision = DecisionSupport::new(DecisionProfile, Arc::new(Stub::Empty));
    let err = decision
        .analyze_decision("?", Value::Null, Value::Null)
        .await
        .unwrap_err();
    assert_eq!(err.label(), "Decision analysis failed");

    let document = DocumentProcessor::new(DocumentProfile, Arc::new(Stub::Empty));
    let err = document.process_document("", "blank.txt").await.unwrap_err();
    assert_eq!(err.label(), "Document processing failed");

    let optimization = OptimizationAdvisor::new(StrategyCatalog::default(), Arc::new(Stub::Empty));
    let err = optimization
        .optimize_tax_strategy(json!({}), json!({}))
        .await
        .unwrap_err();
    assert_eq!(err.label(), "Tax optimization analysis failed");

    assert_eq!(compliance.status(), AgentStatus::Error);
    assert_eq!(decision.status(), AgentStatus::Error);
    assert_eq!(document.status(), AgentStatus::Error);
    assert_eq!(optimization.status(), AgentStatus::Error);
}

#[tokio::test]
async fn repeated_requests_give_identical_results() {
    let reply = r#"{
        "currentTaxLiability": 9000,
        "potentialSavings": 1200,
        "opportunities": [],
        "recommendations": ["Open an HSA"],
        "confidence": 81,
        "riskAssessment": "Low",
        "implementationPlan": []
    }"#;
    let agent = OptimizationAdvisor::new(StrategyCatalog::default(), Arc::new(Stub::Reply(reply)));

    let first = agent
        .optimize_tax_strategy(json!({"income": 60000}), json!({"age": 30}))
        .await
        .unwrap();
    let second = agent
        .optimize_tax_strategy(json!({"income": 60000}), json!({"age": 30}))
        .await
        .unwrap();

    assert!(matches!(first, Analysis::Parsed(_)));
    assert_eq!(first, second);
}

#[tokio::test]
async fn every_agent_returns_unexpected_objects_as_parsed() {
    let reply = r#"{"foo": 1, "riskLevel": "Medium"}"#;
    let date = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();

    let compliance = ComplianceMonitor::new(ComplianceRules::default(), Arc::new(Stub::Reply(reply)));
    let result = compliance.monitor_compliance(json!({}), date).await.unwrap();
    assert!(matches!(result, Analysis::Parsed(_)));
    let value = serde_json::to_value(result.get()).unwrap();
    assert_eq!(value["foo"], 1);
    assert_eq!(value["riskLevel"], "Medium");
    assert!(value.get("overallScore").is_none());

    let decision = DecisionSupport::new(DecisionProfile, Arc::new(Stub::Reply(reply)));
    let result = decision
        .analyze_decision("Roth or traditional IRA?", json!({}), json!({}))
        .await
        .unwrap();
    assert!(!result.is_fallback());
    assert_eq!(result.get().extra["foo"], 1);
    assert!(result.get().options.is_empty());

    let document = DocumentProcessor::new(DocumentProfile, Arc::new(Stub::Reply(reply)));
    let doc = document.process_document("x", "x.txt").await.unwrap();
    assert!(!doc.is_fallback());
    let analysis = doc.into_inner().analysis.unwrap();
    assert_eq!(analysis.document_type, None);
    assert_eq!(analysis.extra["riskLevel"], "Medium");

    let optimization =
        OptimizationAdvisor::new(StrategyCatalog::default(), Arc::new(Stub::Reply(reply)));
    let result = optimization
        .optimize_tax_strategy(json!({}), json!({}))
        .await
        .unwrap();
    assert!(!result.is_fallback());
    assert_eq!(result.get().extra["foo"], 1);

    for status in [
        compliance.status(),
        decision.status(),
        document.status(),
        optimization.status(),
    ] {
        assert_eq!(status, AgentStatus::Idle);
    }
}

#[test]
fn json_that_is_not_an_object_falls_back() {
    let profile = DocumentProfile;
    let fallback = profile.fallback(&tax4us_agents::agents::DocumentRequest {
        content: "x".to_string(),
        file_name: "x.txt".to_string(),
    });
    assert_eq!(fallback.document_type.as_deref(), Some("Unknown"));

    let agent = DocumentProcessor::new(DocumentProfile, Arc::new(Stub::Reply(r#"["W-2"]"#)));
    let result = tokio_test::block_on(agent.process_document("x", "x.txt")).unwrap();
    assert!(result.is_fallback());
    assert_eq!(result.into_inner().analysis.unwrap(), fallback);
}

#[test]
fn agent_infos_describe_each_kind() {
    let client: Arc<dyn CompletionClient> = Arc::new(Stub::Empty);
    let infos = [
        ComplianceMonitor::new(ComplianceRules::default(), client.clone()).info(),
        DecisionSupport::new(DecisionProfile, client.clone()).info(),
        DocumentProcessor::new(DocumentProfile, client.clone()).info(),
        OptimizationAdvisor::new(StrategyCatalog::default(), client).info(),
    ];

    let phases: Vec<&str> = infos.iter().map(|i| i.phase.as_str()).collect();
    assert_eq!(phases, vec!["MEASURE", "DECIDE", "BUILD", "ANALYZE"]);
    assert!(infos.iter().all(|i| i.status == "idle" && i.version == "1.0.0"));
}
