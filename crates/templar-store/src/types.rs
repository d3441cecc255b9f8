use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use templar_definition::{
  ActionType, AssigneeType, ConditionOperator, ConditionSource, FieldOption, FieldType,
  TriggerType, ValueType,
};

/// A workflow template as stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct WorkflowRecord {
  pub workflow_id: String,
  pub name: String,
  pub description: Option<String>,
  pub organization_id: String,
  pub department_id: Option<String>,
  pub trigger_type: TriggerType,
  pub is_active: bool,
  /// Set once the initial step has been materialized.
  pub initial_step_id: Option<String>,
  pub created_at: DateTime<Utc>,
}

/// A step owned by a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct StepRecord {
  pub step_id: String,
  pub workflow_id: String,
  pub name: String,
  pub description: Option<String>,
  pub step_order: i64,
}

/// The assignee rule attached to a step, at most one per step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AssigneeRuleRecord {
  pub rule_id: String,
  pub step_id: String,
  pub assignee_type: AssigneeType,
  pub role_id: Option<String>,
  pub member_id: Option<String>,
}

/// A form field owned by a step.
///
/// `options` and `validation_rules` are nullable JSON columns; a field
/// declared without them stores NULL, not an empty placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FormFieldRecord {
  pub field_id: String,
  pub step_id: String,
  pub field_name: String,
  pub label: String,
  pub field_type: FieldType,
  pub required: bool,
  pub placeholder: Option<String>,
  pub default_value: Option<String>,
  pub options: Option<Json<Vec<FieldOption>>>,
  pub validation_rules: Option<Json<serde_json::Map<String, serde_json::Value>>>,
  pub field_order: i64,
}

/// An action owned by a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ActionRecord {
  pub action_id: String,
  pub step_id: String,
  pub name: String,
  pub label: String,
  pub action_type: ActionType,
  pub action_order: i64,
}

/// A directed edge between two steps of a workflow.
///
/// `position` is the creation sequence across the whole workflow; reading
/// transitions back ordered by it reproduces input document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TransitionRecord {
  pub transition_id: String,
  pub workflow_id: String,
  pub from_step_id: String,
  pub to_step_id: String,
  /// Action of the *source* step that triggers this transition, if any.
  pub action_id: Option<String>,
  pub description: Option<String>,
  pub priority: i64,
  pub is_automatic: bool,
  pub position: i64,
}

/// A condition owned by a transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ConditionRecord {
  pub condition_id: String,
  pub transition_id: String,
  pub source: ConditionSource,
  pub field_name: Option<String>,
  pub operator: ConditionOperator,
  /// Always a string; "true"/"false" for booleans. `value_type` says how
  /// to interpret it.
  pub value: String,
  pub value_type: ValueType,
  pub condition_order: i64,
}

/// A fully hydrated workflow graph as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowGraph {
  pub workflow: WorkflowRecord,
  /// Steps ordered by `step_order`.
  pub steps: Vec<StepGraph>,
  /// Transitions ordered by `position` (creation order).
  pub transitions: Vec<TransitionGraph>,
}

/// A step with everything it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepGraph {
  pub step: StepRecord,
  pub assignee_rule: Option<AssigneeRuleRecord>,
  /// Ordered by `field_order`.
  pub form_fields: Vec<FormFieldRecord>,
  /// Ordered by `action_order`.
  pub actions: Vec<ActionRecord>,
}

/// A transition with its ordered conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionGraph {
  pub transition: TransitionRecord,
  /// Ordered by `condition_order` (declared order).
  pub conditions: Vec<ConditionRecord>,
}

impl WorkflowGraph {
  /// Find a step by its persisted identity.
  pub fn step(&self, step_id: &str) -> Option<&StepGraph> {
    self.steps.iter().find(|s| s.step.step_id == step_id)
  }

  /// Find a step by name.
  pub fn step_by_name(&self, name: &str) -> Option<&StepGraph> {
    self.steps.iter().find(|s| s.step.name == name)
  }

  /// Transitions leaving the given step, in creation order.
  pub fn transitions_from(&self, step_id: &str) -> Vec<&TransitionGraph> {
    self
      .transitions
      .iter()
      .filter(|t| t.transition.from_step_id == step_id)
      .collect()
  }
}
