use serde::{Deserialize, Serialize};

use crate::condition::ConditionDefinition;

/// A directed edge out of the step it is declared on.
///
/// `to_step_name` may reference a step declared later in the document; the
/// builder materializes all steps before it links any transition, so
/// forward references are legal. `action_name`, if present, must name an
/// action of the *source* step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionDefinition {
  pub to_step_name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub action_name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default)]
  pub priority: i64,
  #[serde(default)]
  pub is_automatic: bool,
  #[serde(default)]
  pub conditions: Vec<ConditionDefinition>,
}
