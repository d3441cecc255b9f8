use std::collections::HashSet;
use std::fmt;

use templar_definition::WorkflowDefinition;
use thiserror::Error;

/// A structurally invalid definition, carrying every violation found —
/// callers fix the whole document in one round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
  pub issues: Vec<ValidationIssue>,
}

impl std::error::Error for ValidationError {}

impl fmt::Display for ValidationError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, issue) in self.issues.iter().enumerate() {
      if i > 0 {
        write!(f, "; ")?;
      }
      write!(f, "{issue}")?;
    }
    Ok(())
  }
}

/// One structural violation in a workflow definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationIssue {
  #[error("workflow name is empty")]
  EmptyWorkflowName,

  #[error("organization id is empty")]
  EmptyOrganizationId,

  #[error("workflow has no steps")]
  NoSteps,

  #[error("step at index {index} has an empty name")]
  EmptyStepName { index: usize },

  #[error("duplicate step name '{name}'")]
  DuplicateStepName { name: String },

  #[error("step '{step}': action at index {index} has an empty name")]
  EmptyActionName { step: String, index: usize },

  #[error("step '{step}': duplicate action name '{name}'")]
  DuplicateActionName { step: String, name: String },

  #[error("step '{step}': form field at index {index} has an empty name")]
  EmptyFieldName { step: String, index: usize },

  #[error("step '{step}': duplicate form field name '{name}'")]
  DuplicateFieldName { step: String, name: String },

  #[error("initial step '{name}' does not match any declared step")]
  UnknownInitialStep { name: String },
}

/// Validate a workflow definition before construction begins.
///
/// Pure check, no side effects. Enum values and missing required fields are
/// already rejected at deserialization; this enforces the value-level rules:
/// non-empty names, document-unique step names, per-step-unique action and
/// field names, and an `initial_step_name` that matches a declared step.
pub fn validate(def: &WorkflowDefinition) -> Result<(), ValidationError> {
  let mut issues = Vec::new();

  if def.workflow_name.trim().is_empty() {
    issues.push(ValidationIssue::EmptyWorkflowName);
  }
  if def.organization_id.trim().is_empty() {
    issues.push(ValidationIssue::EmptyOrganizationId);
  }
  if def.steps.is_empty() {
    issues.push(ValidationIssue::NoSteps);
  }

  let mut step_names = HashSet::new();
  for (index, step) in def.steps.iter().enumerate() {
    if step.step_name.trim().is_empty() {
      issues.push(ValidationIssue::EmptyStepName { index });
    } else if !step_names.insert(step.step_name.as_str()) {
      issues.push(ValidationIssue::DuplicateStepName {
        name: step.step_name.clone(),
      });
    }

    let mut action_names = HashSet::new();
    for (index, action) in step.actions.iter().enumerate() {
      if action.name.trim().is_empty() {
        issues.push(ValidationIssue::EmptyActionName {
          step: step.step_name.clone(),
          index,
        });
      } else if !action_names.insert(action.name.as_str()) {
        issues.push(ValidationIssue::DuplicateActionName {
          step: step.step_name.clone(),
          name: action.name.clone(),
        });
      }
    }

    let mut field_names = HashSet::new();
    for (index, field) in step.form_fields.iter().enumerate() {
      if field.field_name.trim().is_empty() {
        issues.push(ValidationIssue::EmptyFieldName {
          step: step.step_name.clone(),
          index,
        });
      } else if !field_names.insert(field.field_name.as_str()) {
        issues.push(ValidationIssue::DuplicateFieldName {
          step: step.step_name.clone(),
          name: field.field_name.clone(),
        });
      }
    }
  }

  // Dangling transition targets are tolerated (the linker skips them), but
  // a dangling initial step is not: the workflow would have no entry.
  if !def.steps.is_empty() && !step_names.contains(def.initial_step_name.as_str()) {
    issues.push(ValidationIssue::UnknownInitialStep {
      name: def.initial_step_name.clone(),
    });
  }

  if issues.is_empty() {
    Ok(())
  } else {
    Err(ValidationError { issues })
  }
}
