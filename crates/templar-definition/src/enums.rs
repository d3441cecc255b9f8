use serde::{Deserialize, Serialize};

/// How a workflow instance gets started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerType {
  #[default]
  Manual,
  EventBased,
  Scheduled,
  ApiCall,
}

/// Who is responsible for acting on a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssigneeType {
  Submitter,
  SpecificRole,
  SpecificMember,
  Manager,
  DepartmentHead,
}

/// Input widget kind for a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldType {
  Text,
  Textarea,
  Number,
  Date,
  Select,
  MultiSelect,
  Checkbox,
  File,
}

/// Visual/semantic weight of a step action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
  #[default]
  Primary,
  Secondary,
  Danger,
}

/// Where a condition reads its left-hand value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionSource {
  FormFieldValue,
  ContextValue,
}

/// Comparison applied between the source value and the condition value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionOperator {
  Equals,
  NotEquals,
  GreaterThan,
  LessThan,
  GreaterThanOrEqual,
  LessThanOrEqual,
  Contains,
  IsEmpty,
  IsNotEmpty,
}

/// Declared type of a condition's comparison value.
///
/// The value itself is always carried as a string ("true"/"false" for
/// booleans); downstream evaluation interprets it according to this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueType {
  String,
  Number,
  Boolean,
  Date,
}
