use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing_subscriber::EnvFilter;

use templar_builder::{BuildOutcome, WorkflowBuilder};
use templar_definition::WorkflowDefinition;
use templar_generator::GeminiClient;
use templar_store::{SqliteStore, WorkflowStore};

/// Templar - workflow template builder
#[derive(Parser)]
#[command(name = "templar")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.templar)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Build a workflow template from a definition file
  Create {
    /// Path to the definition file (JSON)
    #[arg(long)]
    file: PathBuf,
  },

  /// Print a workflow graph as JSON
  Show {
    /// The workflow ID to show
    workflow_id: String,
  },

  /// List workflow templates for an organization
  List {
    /// Organization ID
    #[arg(long)]
    org: String,
  },

  /// Generate a definition from a prompt via Gemini, then build it
  Generate {
    /// Free-text description of the desired workflow
    #[arg(long)]
    prompt: String,

    /// Organization ID stamped onto the generated definition
    #[arg(long)]
    org: String,

    /// Department ID stamped onto the generated definition
    #[arg(long)]
    department: Option<String>,

    /// Gemini model to use instead of the default
    #[arg(long)]
    model: Option<String>,
  },
}

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let cli = Cli::parse();

  let data_dir = cli.data_dir.unwrap_or_else(|| {
    dirs::home_dir()
      .expect("could not determine home directory")
      .join(".templar")
  });

  match cli.command {
    Some(Commands::Create { file }) => create_from_file(file, &data_dir).await?,
    Some(Commands::Show { workflow_id }) => show_workflow(&workflow_id, &data_dir).await?,
    Some(Commands::List { org }) => list_workflows(&org, &data_dir).await?,
    Some(Commands::Generate {
      prompt,
      org,
      department,
      model,
    }) => generate_workflow(&prompt, &org, department.as_deref(), model, &data_dir).await?,
    None => {
      println!("templar - use --help to see available commands");
    }
  }

  Ok(())
}

async fn open_store(data_dir: &Path) -> Result<SqliteStore> {
  tokio::fs::create_dir_all(data_dir)
    .await
    .with_context(|| format!("failed to create data directory: {}", data_dir.display()))?;

  let db_path = data_dir.join("templar.db");
  let options = SqliteConnectOptions::new()
    .filename(&db_path)
    .create_if_missing(true);
  let pool = SqlitePoolOptions::new()
    .connect_with(options)
    .await
    .with_context(|| format!("failed to open database: {}", db_path.display()))?;

  let store = SqliteStore::new(pool);
  store.migrate().await.context("failed to run migrations")?;
  Ok(store)
}

async fn create_from_file(file: PathBuf, data_dir: &Path) -> Result<()> {
  let content = tokio::fs::read_to_string(&file)
    .await
    .with_context(|| format!("failed to read definition file: {}", file.display()))?;

  let definition: WorkflowDefinition = serde_json::from_str(&content)
    .with_context(|| format!("failed to parse definition file: {}", file.display()))?;

  let builder = WorkflowBuilder::new(open_store(data_dir).await?);
  let outcome = builder.create_structured_workflow(&definition).await?;
  print_outcome(&outcome);

  Ok(())
}

async fn show_workflow(workflow_id: &str, data_dir: &Path) -> Result<()> {
  let store = open_store(data_dir).await?;
  let graph = store
    .find_workflow_graph(workflow_id)
    .await?
    .with_context(|| format!("workflow not found: {workflow_id}"))?;

  println!("{}", serde_json::to_string_pretty(&graph)?);
  Ok(())
}

async fn list_workflows(org: &str, data_dir: &Path) -> Result<()> {
  let store = open_store(data_dir).await?;
  let workflows = store.list_workflows(org).await?;

  if workflows.is_empty() {
    println!("no workflows for organization {org}");
    return Ok(());
  }

  for workflow in workflows {
    println!(
      "{}  {}  [{}]",
      workflow.workflow_id,
      workflow.name,
      if workflow.is_active {
        "active"
      } else {
        "inactive"
      },
    );
  }
  Ok(())
}

async fn generate_workflow(
  prompt: &str,
  org: &str,
  department: Option<&str>,
  model: Option<String>,
  data_dir: &Path,
) -> Result<()> {
  let api_key =
    std::env::var("GEMINI_API_KEY").context("GEMINI_API_KEY environment variable is not set")?;

  let mut client = GeminiClient::new(api_key);
  if let Ok(base_url) = std::env::var("GEMINI_BASE_URL") {
    client = client.with_base_url(base_url);
  }
  if let Some(model) = model {
    client = client.with_model(model);
  }
  let builder = WorkflowBuilder::new(open_store(data_dir).await?);

  let outcome =
    templar_generator::generate_and_create_workflow(&client, &builder, prompt, org, department)
      .await?;
  print_outcome(&outcome);

  Ok(())
}

fn print_outcome(outcome: &BuildOutcome) {
  let workflow = &outcome.workflow.workflow;
  println!("created workflow: {}", workflow.workflow_id);
  println!("  name:        {}", workflow.name);
  println!("  steps:       {}", outcome.workflow.steps.len());
  println!("  transitions: {}", outcome.workflow.transitions.len());

  for skipped in &outcome.skipped {
    eprintln!("warning: skipped transition: {skipped}");
  }
}
