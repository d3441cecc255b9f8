use serde::{Deserialize, Serialize};

use crate::action::ActionDefinition;
use crate::enums::AssigneeType;
use crate::field::FormFieldDefinition;
use crate::transition::TransitionDefinition;

/// One named stage of a workflow.
///
/// `step_name` is document-scoped: transitions elsewhere in the same
/// document reference it, and the builder later resolves it to a persisted
/// step identity. Transitions declared here are *outgoing* edges from this
/// step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDefinition {
  pub step_name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  pub order: i64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub assignee_logic: Option<AssigneeRule>,
  #[serde(default)]
  pub form_fields: Vec<FormFieldDefinition>,
  #[serde(default)]
  pub actions: Vec<ActionDefinition>,
  #[serde(default)]
  pub transitions: Vec<TransitionDefinition>,
}

/// Declares who acts on a step, interpreted according to `assignee_type`:
/// `SPECIFIC_ROLE` reads `role_id`, `SPECIFIC_MEMBER` reads `member_id`,
/// the rest need neither.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssigneeRule {
  pub assignee_type: AssigneeType,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub role_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub member_id: Option<String>,
}
