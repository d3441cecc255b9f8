use thiserror::Error;

use crate::validate::ValidationError;

/// Errors that can occur while building a workflow template.
///
/// Every variant names the workflow being built; callers get either a fully
/// hydrated graph or one of these, never a partial result.
#[derive(Debug, Error)]
pub enum BuildError {
  /// The input document is structurally invalid. Raised before any
  /// persistence; correct the input and retry.
  #[error("invalid definition for workflow '{workflow}': {source}")]
  Validation {
    workflow: String,
    source: ValidationError,
  },

  /// The declared initial step resolved to nothing after materialization.
  /// Validation catches this up front; this is the authoritative re-check
  /// once real identities exist.
  #[error("workflow '{workflow}': initial step '{step_name}' not found")]
  InitialStepNotFound { workflow: String, step_name: String },

  /// A persistence operation failed; the transaction was rolled back.
  #[error("failed to persist workflow '{workflow}': {source}")]
  Store {
    workflow: String,
    source: templar_store::Error,
  },

  /// The workflow vanished between commit and the final re-fetch. Internal
  /// error, not a normal outcome.
  #[error("workflow '{workflow}' ({workflow_id}) missing after build")]
  NotFoundAfterBuild {
    workflow: String,
    workflow_id: String,
  },
}
