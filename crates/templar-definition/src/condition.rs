use serde::{Deserialize, Serialize};

use crate::enums::{ConditionOperator, ConditionSource, ValueType};

/// A single predicate gating a transition.
///
/// `value` is always a string ("true"/"false" for booleans); `value_type`
/// tells the downstream evaluator how to interpret it. Conditions are
/// evaluated in declared order; this crate only carries that order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionDefinition {
  pub source: ConditionSource,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub field_name: Option<String>,
  pub operator: ConditionOperator,
  pub value: String,
  pub value_type: ValueType,
}
