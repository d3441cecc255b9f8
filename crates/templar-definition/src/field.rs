use serde::{Deserialize, Serialize};

use crate::enums::FieldType;

/// A form field collected at a step.
///
/// `field_name` is camelCase and unique within its step. `options` is only
/// meaningful for choice-type fields (`SELECT`, `MULTI_SELECT`); absent
/// options and validation rules stay absent rather than defaulting to
/// placeholder values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormFieldDefinition {
  pub field_name: String,
  pub label: String,
  pub field_type: FieldType,
  #[serde(default)]
  pub required: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub placeholder: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub default_value: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub options: Option<Vec<FieldOption>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub validation_rules: Option<serde_json::Map<String, serde_json::Value>>,
  pub order: i64,
}

/// A single choice for a choice-type field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
  pub value: String,
  pub label: String,
}
