use serde::{Deserialize, Serialize};

use crate::enums::ActionType;

/// An operation available at a step (e.g. "Submit", "Reject").
///
/// `name` is unique within its owning step and is only ever referenced by
/// transitions declared on that same step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDefinition {
  pub name: String,
  pub label: String,
  #[serde(default)]
  pub action_type: ActionType,
  pub order: i64,
}
