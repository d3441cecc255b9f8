use std::collections::HashMap;
use std::fmt;

use chrono::Utc;
use serde::Serialize;
use templar_definition::WorkflowDefinition;
use templar_store::{
  ActionRecord, AssigneeRuleRecord, ConditionRecord, FormFieldRecord, Json, StepRecord,
  TransitionRecord, WorkflowGraph, WorkflowRecord, WorkflowStore, WorkflowTxn,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::BuildError;
use crate::validate::validate;

/// The result of a successful build: the fully hydrated graph plus every
/// transition that was dropped because its target step or triggering action
/// could not be resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildOutcome {
  pub workflow: WorkflowGraph,
  pub skipped: Vec<SkippedTransition>,
}

/// A transition from the input document that was not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedTransition {
  /// Name of the step the transition was declared on.
  pub from_step_name: String,
  /// Index of the transition within that step's transition list.
  pub index: usize,
  pub reason: SkipReason,
}

/// Why a declared transition was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SkipReason {
  /// `to_step_name` matched no step in the document.
  UnknownTargetStep { to_step_name: String },
  /// `action_name` matched no action of the *source* step. An action of
  /// another step never counts, even if the name matches.
  UnknownAction { action_name: String },
}

impl fmt::Display for SkippedTransition {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.reason {
      SkipReason::UnknownTargetStep { to_step_name } => write!(
        f,
        "step '{}', transition {}: target step '{}' does not exist",
        self.from_step_name, self.index, to_step_name
      ),
      SkipReason::UnknownAction { action_name } => write!(
        f,
        "step '{}', transition {}: action '{}' does not exist on that step",
        self.from_step_name, self.index, action_name
      ),
    }
  }
}

/// A materialized step: its persisted identity plus the identities of its
/// actions, keyed by document-scoped name.
struct StepHandle {
  step_id: String,
  actions: HashMap<String, String>,
}

/// Builds persisted workflow templates from declarative definitions.
///
/// Generic over the storage backend, like every collaborator seam in this
/// workspace. The build is sequential: each record is created in input
/// order inside a single transaction, which is what makes the name maps
/// complete before the transition pass reads them.
pub struct WorkflowBuilder<S: WorkflowStore> {
  store: S,
}

impl<S: WorkflowStore> WorkflowBuilder<S> {
  /// Create a builder over the given store.
  pub fn new(store: S) -> Self {
    Self { store }
  }

  /// Access the underlying store.
  pub fn store(&self) -> &S {
    &self.store
  }

  /// Build and persist a workflow template from a definition.
  ///
  /// Validates the document, creates the workflow shell, materializes every
  /// step (assignee rule, form fields, actions), resolves the initial step,
  /// links transitions, commits, and returns the re-fetched graph.
  ///
  /// Not idempotent: calling this twice with the same definition creates
  /// two distinct workflows.
  #[instrument(skip_all, fields(workflow = %def.workflow_name))]
  pub async fn create_structured_workflow(
    &self,
    def: &WorkflowDefinition,
  ) -> Result<BuildOutcome, BuildError> {
    validate(def).map_err(|source| BuildError::Validation {
      workflow: def.workflow_name.clone(),
      source,
    })?;

    let store_err = |source: templar_store::Error| BuildError::Store {
      workflow: def.workflow_name.clone(),
      source,
    };

    let mut txn = self.store.begin().await.map_err(store_err)?;

    let workflow_id = Uuid::new_v4().to_string();
    let workflow = WorkflowRecord {
      workflow_id: workflow_id.clone(),
      name: def.workflow_name.clone(),
      description: def.description.clone(),
      organization_id: def.organization_id.clone(),
      department_id: def.department_id.clone(),
      trigger_type: def.trigger_type,
      is_active: true,
      initial_step_id: None,
      created_at: Utc::now(),
    };
    txn.create_workflow(&workflow).await.map_err(store_err)?;

    let handles = materialize_steps(&mut txn, def, &workflow_id)
      .await
      .map_err(store_err)?;

    // Authoritative initial-step check: validation already guaranteed the
    // name exists, but only now do real identities back it.
    let initial = handles
      .get(def.initial_step_name.as_str())
      .ok_or_else(|| BuildError::InitialStepNotFound {
        workflow: def.workflow_name.clone(),
        step_name: def.initial_step_name.clone(),
      })?;
    txn
      .set_initial_step(&workflow_id, &initial.step_id)
      .await
      .map_err(store_err)?;

    let skipped = link_transitions(&mut txn, def, &workflow_id, &handles)
      .await
      .map_err(store_err)?;

    txn.commit().await.map_err(store_err)?;

    let graph = self
      .store
      .find_workflow_graph(&workflow_id)
      .await
      .map_err(store_err)?
      .ok_or_else(|| BuildError::NotFoundAfterBuild {
        workflow: def.workflow_name.clone(),
        workflow_id: workflow_id.clone(),
      })?;

    info!(
      workflow_id,
      steps = graph.steps.len(),
      transitions = graph.transitions.len(),
      skipped = skipped.len(),
      "workflow template created",
    );

    Ok(BuildOutcome {
      workflow: graph,
      skipped,
    })
  }
}

/// First pass: persist every step with everything it owns, in input order,
/// building the name → identity maps the transition pass resolves against.
async fn materialize_steps<T: WorkflowTxn>(
  txn: &mut T,
  def: &WorkflowDefinition,
  workflow_id: &str,
) -> Result<HashMap<String, StepHandle>, templar_store::Error> {
  let mut handles = HashMap::with_capacity(def.steps.len());

  for step_def in &def.steps {
    let step_id = Uuid::new_v4().to_string();
    let step = StepRecord {
      step_id: step_id.clone(),
      workflow_id: workflow_id.to_string(),
      name: step_def.step_name.clone(),
      description: step_def.description.clone(),
      step_order: step_def.order,
    };
    txn.create_step(&step).await?;

    if let Some(rule) = &step_def.assignee_logic {
      let record = AssigneeRuleRecord {
        rule_id: Uuid::new_v4().to_string(),
        step_id: step_id.clone(),
        assignee_type: rule.assignee_type,
        role_id: rule.role_id.clone(),
        member_id: rule.member_id.clone(),
      };
      txn.create_assignee_rule(&record).await?;
    }

    for field in &step_def.form_fields {
      let record = FormFieldRecord {
        field_id: Uuid::new_v4().to_string(),
        step_id: step_id.clone(),
        field_name: field.field_name.clone(),
        label: field.label.clone(),
        field_type: field.field_type,
        required: field.required,
        placeholder: field.placeholder.clone(),
        default_value: field.default_value.clone(),
        options: field.options.clone().map(Json),
        validation_rules: field.validation_rules.clone().map(Json),
        field_order: field.order,
      };
      txn.create_form_field(&record).await?;
    }

    let mut actions = HashMap::with_capacity(step_def.actions.len());
    for action in &step_def.actions {
      let action_id = Uuid::new_v4().to_string();
      let record = ActionRecord {
        action_id: action_id.clone(),
        step_id: step_id.clone(),
        name: action.name.clone(),
        label: action.label.clone(),
        action_type: action.action_type,
        action_order: action.order,
      };
      txn.create_action(&record).await?;
      actions.insert(action.name.clone(), action_id);
    }

    handles.insert(step_def.step_name.clone(), StepHandle { step_id, actions });
  }

  Ok(handles)
}

/// Second pass: persist transitions in document order, resolving target
/// steps and triggering actions against the materialized handles.
/// Unresolvable references drop the transition and report it.
async fn link_transitions<T: WorkflowTxn>(
  txn: &mut T,
  def: &WorkflowDefinition,
  workflow_id: &str,
  handles: &HashMap<String, StepHandle>,
) -> Result<Vec<SkippedTransition>, templar_store::Error> {
  let mut skipped = Vec::new();
  let mut position: i64 = 0;

  for step_def in &def.steps {
    // Materialization inserted every step, so the source handle exists.
    let Some(source) = handles.get(step_def.step_name.as_str()) else {
      continue;
    };

    for (index, transition) in step_def.transitions.iter().enumerate() {
      let Some(target) = handles.get(transition.to_step_name.as_str()) else {
        warn!(
          from_step = %step_def.step_name,
          to_step = %transition.to_step_name,
          "skipping transition: unknown target step",
        );
        skipped.push(SkippedTransition {
          from_step_name: step_def.step_name.clone(),
          index,
          reason: SkipReason::UnknownTargetStep {
            to_step_name: transition.to_step_name.clone(),
          },
        });
        continue;
      };

      // Actions are scoped to the source step; a matching name on another
      // step must not resolve.
      let action_id = match &transition.action_name {
        Some(name) => match source.actions.get(name.as_str()) {
          Some(id) => Some(id.clone()),
          None => {
            warn!(
              from_step = %step_def.step_name,
              action = %name,
              "skipping transition: action not declared on source step",
            );
            skipped.push(SkippedTransition {
              from_step_name: step_def.step_name.clone(),
              index,
              reason: SkipReason::UnknownAction {
                action_name: name.clone(),
              },
            });
            continue;
          }
        },
        None => None,
      };

      let transition_id = Uuid::new_v4().to_string();
      let record = TransitionRecord {
        transition_id: transition_id.clone(),
        workflow_id: workflow_id.to_string(),
        from_step_id: source.step_id.clone(),
        to_step_id: target.step_id.clone(),
        action_id,
        description: transition.description.clone(),
        priority: transition.priority,
        is_automatic: transition.is_automatic,
        position,
      };
      txn.create_transition(&record).await?;
      position += 1;

      for (order, condition) in transition.conditions.iter().enumerate() {
        let record = ConditionRecord {
          condition_id: Uuid::new_v4().to_string(),
          transition_id: transition_id.clone(),
          source: condition.source,
          field_name: condition.field_name.clone(),
          operator: condition.operator,
          value: condition.value.clone(),
          value_type: condition.value_type,
          condition_order: order as i64,
        };
        txn.create_condition(&record).await?;
      }
    }
  }

  Ok(skipped)
}

#[cfg(test)]
mod tests {
  use super::*;
  use templar_definition::{
    ActionDefinition, ActionType, AssigneeRule, AssigneeType, ConditionDefinition,
    ConditionOperator, ConditionSource, FieldType, FormFieldDefinition, StepDefinition,
    TransitionDefinition, TriggerType, ValueType,
  };
  use templar_store::MemoryStore;

  fn make_step(name: &str, order: i64) -> StepDefinition {
    StepDefinition {
      step_name: name.to_string(),
      description: None,
      order,
      assignee_logic: None,
      form_fields: vec![],
      actions: vec![],
      transitions: vec![],
    }
  }

  fn make_action(name: &str, order: i64) -> ActionDefinition {
    ActionDefinition {
      name: name.to_string(),
      label: name.to_string(),
      action_type: ActionType::Primary,
      order,
    }
  }

  fn make_transition(to: &str, action: Option<&str>) -> TransitionDefinition {
    TransitionDefinition {
      to_step_name: to.to_string(),
      action_name: action.map(str::to_string),
      description: None,
      priority: 0,
      is_automatic: false,
      conditions: vec![],
    }
  }

  fn make_def(steps: Vec<StepDefinition>, initial: &str) -> WorkflowDefinition {
    WorkflowDefinition {
      workflow_name: "Doc Approval".to_string(),
      description: None,
      organization_id: "org-1".to_string(),
      department_id: None,
      trigger_type: TriggerType::Manual,
      initial_step_name: initial.to_string(),
      steps,
    }
  }

  fn make_condition(field: &str, value: &str) -> ConditionDefinition {
    ConditionDefinition {
      source: ConditionSource::FormFieldValue,
      field_name: Some(field.to_string()),
      operator: ConditionOperator::Equals,
      value: value.to_string(),
      value_type: ValueType::String,
    }
  }

  #[tokio::test]
  async fn builds_the_doc_approval_scenario() {
    let mut upload = make_step("upload", 1);
    upload.actions.push(make_action("submit", 1));
    upload
      .transitions
      .push(make_transition("review", Some("submit")));
    let review = make_step("review", 2);

    let builder = WorkflowBuilder::new(MemoryStore::new());
    let outcome = builder
      .create_structured_workflow(&make_def(vec![upload, review], "upload"))
      .await
      .unwrap();

    let graph = &outcome.workflow;
    assert!(outcome.skipped.is_empty());
    assert_eq!(graph.steps.len(), 2);
    assert_eq!(graph.transitions.len(), 1);
    assert!(graph.workflow.is_active);

    let upload = graph.step_by_name("upload").unwrap();
    let review = graph.step_by_name("review").unwrap();
    assert_eq!(
      graph.workflow.initial_step_id.as_deref(),
      Some(upload.step.step_id.as_str())
    );

    let edge = &graph.transitions[0].transition;
    assert_eq!(edge.from_step_id, upload.step.step_id);
    assert_eq!(edge.to_step_id, review.step.step_id);
    assert_eq!(
      edge.action_id.as_deref(),
      Some(upload.actions[0].action_id.as_str())
    );
  }

  #[tokio::test]
  async fn forward_reference_to_a_later_step_resolves() {
    let mut first = make_step("first", 1);
    // "last" is declared after "first"; materialization completes before
    // linking, so this must resolve.
    first.transitions.push(make_transition("last", None));
    let last = make_step("last", 2);

    let builder = WorkflowBuilder::new(MemoryStore::new());
    let outcome = builder
      .create_structured_workflow(&make_def(vec![first, last], "first"))
      .await
      .unwrap();

    assert!(outcome.skipped.is_empty());
    let graph = &outcome.workflow;
    let last = graph.step_by_name("last").unwrap();
    assert_eq!(graph.transitions[0].transition.to_step_id, last.step.step_id);
  }

  #[tokio::test]
  async fn dangling_target_step_is_skipped_not_fatal() {
    let mut a = make_step("a", 1);
    a.transitions.push(make_transition("no-such-step", None));
    a.transitions.push(make_transition("b", None));
    let b = make_step("b", 2);

    let builder = WorkflowBuilder::new(MemoryStore::new());
    let outcome = builder
      .create_structured_workflow(&make_def(vec![a, b], "a"))
      .await
      .unwrap();

    // The dangling transition is dropped; the valid one is unaffected.
    assert_eq!(outcome.workflow.transitions.len(), 1);
    assert_eq!(
      outcome.skipped,
      vec![SkippedTransition {
        from_step_name: "a".to_string(),
        index: 0,
        reason: SkipReason::UnknownTargetStep {
          to_step_name: "no-such-step".to_string()
        },
      }]
    );
  }

  #[tokio::test]
  async fn action_of_another_step_does_not_resolve() {
    let mut a = make_step("a", 1);
    a.transitions.push(make_transition("b", Some("approve")));
    let mut b = make_step("b", 2);
    // "approve" exists, but on the wrong step.
    b.actions.push(make_action("approve", 1));

    let builder = WorkflowBuilder::new(MemoryStore::new());
    let outcome = builder
      .create_structured_workflow(&make_def(vec![a, b], "a"))
      .await
      .unwrap();

    assert!(outcome.workflow.transitions.is_empty());
    assert_eq!(
      outcome.skipped,
      vec![SkippedTransition {
        from_step_name: "a".to_string(),
        index: 0,
        reason: SkipReason::UnknownAction {
          action_name: "approve".to_string()
        },
      }]
    );
  }

  #[tokio::test]
  async fn unknown_initial_step_fails_before_any_persistence() {
    let store = MemoryStore::new();
    let builder = WorkflowBuilder::new(store);
    let def = make_def(vec![make_step("a", 1)], "missing");

    let err = builder.create_structured_workflow(&def).await.unwrap_err();
    assert!(matches!(err, BuildError::Validation { .. }));
    assert!(builder.store().is_empty());
  }

  #[tokio::test]
  async fn identical_definitions_build_distinct_workflows() {
    let def = make_def(vec![make_step("a", 1)], "a");
    let builder = WorkflowBuilder::new(MemoryStore::new());

    let first = builder.create_structured_workflow(&def).await.unwrap();
    let second = builder.create_structured_workflow(&def).await.unwrap();

    assert_ne!(
      first.workflow.workflow.workflow_id,
      second.workflow.workflow.workflow_id
    );
    assert_eq!(builder.store().workflow_count(), 2);
    assert_eq!(first.workflow.steps[0].step.name, "a");
    assert_eq!(second.workflow.steps[0].step.name, "a");
  }

  #[tokio::test]
  async fn condition_order_is_preserved() {
    let mut a = make_step("a", 1);
    let mut transition = make_transition("b", None);
    transition.conditions = vec![
      make_condition("status", "draft"),
      make_condition("amount", "100"),
      make_condition("approved", "true"),
    ];
    a.transitions.push(transition);
    let b = make_step("b", 2);

    let builder = WorkflowBuilder::new(MemoryStore::new());
    let outcome = builder
      .create_structured_workflow(&make_def(vec![a, b], "a"))
      .await
      .unwrap();

    let conditions = &outcome.workflow.transitions[0].conditions;
    let fields: Vec<_> = conditions
      .iter()
      .map(|c| c.field_name.as_deref().unwrap())
      .collect();
    assert_eq!(fields, vec!["status", "amount", "approved"]);
  }

  #[tokio::test]
  async fn transitions_keep_document_order() {
    let mut a = make_step("a", 1);
    a.transitions.push(make_transition("b", None));
    a.transitions.push(make_transition("c", None));
    let mut b = make_step("b", 2);
    b.transitions.push(make_transition("c", None));
    let c = make_step("c", 3);

    let builder = WorkflowBuilder::new(MemoryStore::new());
    let outcome = builder
      .create_structured_workflow(&make_def(vec![a, b, c], "a"))
      .await
      .unwrap();

    let graph = &outcome.workflow;
    let targets: Vec<_> = graph
      .transitions
      .iter()
      .map(|t| {
        graph
          .step(&t.transition.to_step_id)
          .unwrap()
          .step
          .name
          .as_str()
      })
      .collect();
    assert_eq!(targets, vec!["b", "c", "c"]);
  }

  #[tokio::test]
  async fn step_contents_are_materialized() {
    let mut intake = make_step("intake", 1);
    intake.assignee_logic = Some(AssigneeRule {
      assignee_type: AssigneeType::SpecificRole,
      role_id: Some("role-7".to_string()),
      member_id: None,
    });
    intake.form_fields.push(FormFieldDefinition {
      field_name: "amount".to_string(),
      label: "Amount".to_string(),
      field_type: FieldType::Number,
      required: true,
      placeholder: None,
      default_value: None,
      options: None,
      validation_rules: None,
      order: 1,
    });
    intake.actions.push(make_action("submit", 1));

    let builder = WorkflowBuilder::new(MemoryStore::new());
    let outcome = builder
      .create_structured_workflow(&make_def(vec![intake], "intake"))
      .await
      .unwrap();

    let step = outcome.workflow.step_by_name("intake").unwrap();
    let rule = step.assignee_rule.as_ref().unwrap();
    assert_eq!(rule.assignee_type, AssigneeType::SpecificRole);
    assert_eq!(rule.role_id.as_deref(), Some("role-7"));

    let field = &step.form_fields[0];
    assert!(field.required);
    // Absent options stay absent, not defaulted to an empty list.
    assert!(field.options.is_none());
    assert!(field.validation_rules.is_none());

    assert_eq!(step.actions[0].name, "submit");
  }

  #[tokio::test]
  async fn mid_build_failure_leaves_nothing_behind() {
    let mut a = make_step("a", 1);
    a.actions.push(make_action("submit", 1));
    a.transitions.push(make_transition("b", Some("submit")));
    let b = make_step("b", 2);
    let def = make_def(vec![a, b], "a");

    // Enough budget for the workflow shell and first step, then fail.
    let builder = WorkflowBuilder::new(MemoryStore::failing_after(3));
    let err = builder.create_structured_workflow(&def).await.unwrap_err();

    assert!(matches!(err, BuildError::Store { .. }));
    assert!(builder.store().is_empty());
  }
}

