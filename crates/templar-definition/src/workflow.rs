use serde::{Deserialize, Serialize};

use crate::enums::TriggerType;
use crate::step::StepDefinition;

/// The declarative workflow template document.
///
/// `initial_step_name` must match the `step_name` of exactly one entry in
/// `steps`; step names are unique within the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
  pub workflow_name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  pub organization_id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub department_id: Option<String>,
  #[serde(default)]
  pub trigger_type: TriggerType,
  pub initial_step_name: String,
  pub steps: Vec<StepDefinition>,
}
