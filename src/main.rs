use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;

use tax4us_agents::agents::{
    ComplianceMonitor, ComplianceRules, DecisionProfile, DecisionSupport, DocumentProcessor,
    DocumentProfile, OptimizationAdvisor, StrategyCatalog,
};
use tax4us_agents::client::{CompletionClient, OpenAiClient};
use tax4us_agents::config::Config;
use tax4us_agents::hub::HubClient;
use tax4us_agents::report::AgentReport;
use tax4us_agents::uploads::UploadStore;

#[derive(Debug, Parser)]
#[command(name = "tax4us", version, about = "Tax4US analysis agents and hub tools")]
struct Cli {
    /// YAML configuration file; defaults apply when it does not exist.
    #[arg(long, global = true, default_value = "config/tax4us.yml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(flatten)]
    Analysis(AnalysisCommand),
    /// Talk to the content-automation hub.
    Hub {
        #[command(subcommand)]
        command: HubCommand,
    },
}

#[derive(Debug, Subcommand)]
enum AnalysisCommand {
    /// Describe the analysis agents.
    Agents,
    /// Check tax data against the compliance rules.
    Compliance {
        /// JSON file with the tax data.
        #[arg(long)]
        tax_data: PathBuf,
        /// Evaluation date (RFC 3339), defaults to now.
        #[arg(long)]
        date: Option<DateTime<Utc>>,
    },
    /// Get structured decision support for a tax question.
    Decide {
        #[arg(long)]
        problem: String,
        /// JSON file with context.
        #[arg(long)]
        context: Option<PathBuf>,
        /// JSON file with available data.
        #[arg(long)]
        data: Option<PathBuf>,
    },
    /// Store and analyze a tax document.
    Document { file: PathBuf },
    /// Look for tax optimization opportunities.
    Optimize {
        #[arg(long)]
        tax_data: PathBuf,
        #[arg(long)]
        profile: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
enum HubCommand {
    /// Show the content agents, falling back to built-in data when the hub is down.
    Status,
    /// Forward an action such as start, stop or restart to one agent.
    Action {
        agent: String,
        action: String,
        /// JSON file sent as the request body.
        #[arg(long)]
        data: Option<PathBuf>,
    },
}

/// The four analysis agents sharing one completion client.
struct TaxAgents {
    compliance: ComplianceMonitor,
    decision: DecisionSupport,
    document: DocumentProcessor,
    optimization: OptimizationAdvisor,
}

impl TaxAgents {
    fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            compliance: ComplianceMonitor::new(ComplianceRules::default(), client.clone()),
            decision: DecisionSupport::new(DecisionProfile, client.clone()),
            document: DocumentProcessor::new(DocumentProfile, client.clone()),
            optimization: OptimizationAdvisor::new(StrategyCatalog::default(), client),
        }
    }
}

async fn read_json(path: &Path) -> Result<Value> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

async fn read_optional_json(path: Option<&Path>) -> Result<Value> {
    match path {
        Some(path) => read_json(path).await,
        None => Ok(Value::Object(serde_json::Map::new())),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

fn finish(report: AgentReport) -> Result<ExitCode> {
    print_json(&report)?;
    Ok(if report.is_failed() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = Config::load_or_default(&cli.config)?;
    config.apply_env(|name| std::env::var(name).ok());

    match cli.command {
        Command::Hub { command } => {
            let hub = HubClient::from_config(&config.hub);
            match command {
                HubCommand::Status => print_json(&hub.fetch_status().await)?,
                HubCommand::Action {
                    agent,
                    action,
                    data,
                } => {
                    let data = read_optional_json(data.as_deref()).await?;
                    let envelope = hub.execute_action(&agent, &action, &data).await;
                    print_json(&envelope)?;
                    if !envelope.success {
                        return Ok(ExitCode::FAILURE);
                    }
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Analysis(command) => {
            let client: Arc<dyn CompletionClient> =
                Arc::new(OpenAiClient::from_config(&config.completion)?);
            let agents = TaxAgents::new(client);
            run_agent_command(&agents, &config, command).await
        }
    }
}

async fn run_agent_command(
    agents: &TaxAgents,
    config: &Config,
    command: AnalysisCommand,
) -> Result<ExitCode> {
    match command {
        AnalysisCommand::Agents => {
            let infos = vec![
                agents.compliance.info(),
                agents.decision.info(),
                agents.document.info(),
                agents.optimization.info(),
            ];
            print_json(&infos)?;
            Ok(ExitCode::SUCCESS)
        }
        AnalysisCommand::Compliance { tax_data, date } => {
            let tax_data = read_json(&tax_data).await?;
            let outcome = agents
                .compliance
                .monitor_compliance(tax_data, date.unwrap_or_else(Utc::now))
                .await;
            finish(AgentReport::from_run("compliance", outcome))
        }
        AnalysisCommand::Decide {
            problem,
            context,
            data,
        } => {
            let context = read_optional_json(context.as_deref()).await?;
            let data = read_optional_json(data.as_deref()).await?;
            let outcome = agents.decision.analyze_decision(problem, context, data).await;
            finish(AgentReport::from_run("decision", outcome))
        }
        AnalysisCommand::Document { file } => {
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let file_name = file
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .context("Document path has no file name")?;

            let store = UploadStore::new(&config.uploads.directory);
            let stored = store.save(&file_name, &bytes).await?;
            info!("Processing {}", stored.path.display());

            let content = String::from_utf8_lossy(&bytes);
            let outcome = agents.document.process_document(content, file_name).await;
            finish(AgentReport::from_run("document", outcome))
        }
        AnalysisCommand::Optimize { tax_data, profile } => {
            let tax_data = read_json(&tax_data).await?;
            let profile = read_json(&profile).await?;
            let outcome = agents
                .optimization
                .optimize_tax_strategy(tax_data, profile)
                .await;
            finish(AgentReport::from_run("optimization", outcome))
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenv::dotenv().ok();

    // Logs go to stderr so stdout stays machine-readable.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("tax4us_agents=info,tax4us=info")
            }),
        )
        .init();

    run(Cli::parse()).await
}
