//! Templar Generator
//!
//! Produces candidate [`WorkflowDefinition`](templar_definition::WorkflowDefinition)s
//! from free-text prompts via the Gemini API.
//!
//! The model's output is treated as untrusted input: it is extracted from
//! the response text, deserialized, stamped with the caller's organization
//! and department (never the model's), and then handed to the builder,
//! which validates it like any other definition. Nothing here assumes the
//! model produced a structurally valid document.

mod error;
mod extract;
mod gemini;

pub use error::GeneratorError;
pub use extract::extract_json;
pub use gemini::GeminiClient;

use templar_builder::{BuildOutcome, WorkflowBuilder};
use templar_store::WorkflowStore;
use tracing::info;

/// Generate a definition from a prompt and build it in one call.
///
/// The returned graph went through the same validation and construction
/// path as a hand-written definition.
pub async fn generate_and_create_workflow<S: WorkflowStore>(
  client: &GeminiClient,
  builder: &WorkflowBuilder<S>,
  prompt: &str,
  organization_id: &str,
  department_id: Option<&str>,
) -> Result<BuildOutcome, GeneratorError> {
  let definition = client
    .generate_definition(prompt, organization_id, department_id)
    .await?;

  info!(
    workflow = %definition.workflow_name,
    steps = definition.steps.len(),
    "generated candidate definition",
  );

  let outcome = builder.create_structured_workflow(&definition).await?;
  Ok(outcome)
}
