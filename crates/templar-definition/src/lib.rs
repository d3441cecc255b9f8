//! Templar Definition
//!
//! This crate contains the serializable workflow template definition types.
//! A [`WorkflowDefinition`] is the declarative document a caller (or the
//! Gemini generator) hands to the builder: named steps with form fields,
//! actions, an assignee rule, and outgoing transitions that reference other
//! steps *by name*.
//!
//! Definitions can be loaded from:
//! - JSON files (via CLI with `templar create --file workflow.json`)
//! - API callers submitting the same JSON shape
//! - The LLM-backed generator (whose output is untrusted and re-validated)
//!
//! Names in a definition (step names, action names, field names) are scoped
//! to the document. The builder resolves them to persisted identities; they
//! are not database keys.

mod action;
mod condition;
mod enums;
mod field;
mod step;
mod transition;
mod workflow;

pub use action::ActionDefinition;
pub use condition::ConditionDefinition;
pub use enums::{
  ActionType, AssigneeType, ConditionOperator, ConditionSource, FieldType, TriggerType, ValueType,
};
pub use field::{FieldOption, FormFieldDefinition};
pub use step::{AssigneeRule, StepDefinition};
pub use transition::TransitionDefinition;
pub use workflow::WorkflowDefinition;
