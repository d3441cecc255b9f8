use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::types::{
  ActionRecord, AssigneeRuleRecord, ConditionRecord, FormFieldRecord, StepGraph, StepRecord,
  TransitionGraph, TransitionRecord, WorkflowGraph, WorkflowRecord,
};
use crate::{Error, WorkflowStore, WorkflowTxn};

#[derive(Debug, Default, Clone)]
struct State {
  workflows: Vec<WorkflowRecord>,
  steps: Vec<StepRecord>,
  assignee_rules: Vec<AssigneeRuleRecord>,
  form_fields: Vec<FormFieldRecord>,
  actions: Vec<ActionRecord>,
  transitions: Vec<TransitionRecord>,
  conditions: Vec<ConditionRecord>,
}

/// In-memory store implementation.
///
/// Transactions buffer their writes and apply them on commit, so readers
/// never observe a half-built workflow. Mainly used by builder tests;
/// [`MemoryStore::failing_after`] injects a persistence failure mid-build
/// to exercise rollback behavior.
#[derive(Default)]
pub struct MemoryStore {
  state: Arc<Mutex<State>>,
  write_budget: Option<Arc<AtomicUsize>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// A store whose transactions fail with [`Error::Injected`] once `writes`
  /// writes have succeeded across all transactions.
  pub fn failing_after(writes: usize) -> Self {
    Self {
      state: Arc::default(),
      write_budget: Some(Arc::new(AtomicUsize::new(writes))),
    }
  }

  /// Number of committed workflows.
  pub fn workflow_count(&self) -> usize {
    self.state.lock().unwrap().workflows.len()
  }

  /// True if nothing has been committed at all.
  pub fn is_empty(&self) -> bool {
    let state = self.state.lock().unwrap();
    state.workflows.is_empty()
      && state.steps.is_empty()
      && state.assignee_rules.is_empty()
      && state.form_fields.is_empty()
      && state.actions.is_empty()
      && state.transitions.is_empty()
      && state.conditions.is_empty()
  }
}

/// A buffered write transaction against a [`MemoryStore`].
pub struct MemoryTxn {
  state: Arc<Mutex<State>>,
  buffer: State,
  initial_step_updates: Vec<(String, String)>,
  write_budget: Option<Arc<AtomicUsize>>,
  writes_done: usize,
}

impl MemoryTxn {
  fn charge_write(&mut self) -> Result<(), Error> {
    if let Some(budget) = &self.write_budget {
      let remaining = budget.load(Ordering::SeqCst);
      if remaining == 0 {
        return Err(Error::Injected(self.writes_done));
      }
      budget.store(remaining - 1, Ordering::SeqCst);
    }
    self.writes_done += 1;
    Ok(())
  }
}

#[async_trait]
impl WorkflowStore for MemoryStore {
  type Txn = MemoryTxn;

  async fn begin(&self) -> Result<MemoryTxn, Error> {
    Ok(MemoryTxn {
      state: Arc::clone(&self.state),
      buffer: State::default(),
      initial_step_updates: Vec::new(),
      write_budget: self.write_budget.clone(),
      writes_done: 0,
    })
  }

  async fn find_workflow_graph(&self, workflow_id: &str) -> Result<Option<WorkflowGraph>, Error> {
    let state = self.state.lock().unwrap();

    let Some(workflow) = state
      .workflows
      .iter()
      .find(|w| w.workflow_id == workflow_id)
      .cloned()
    else {
      return Ok(None);
    };

    let mut step_records: Vec<StepRecord> = state
      .steps
      .iter()
      .filter(|s| s.workflow_id == workflow_id)
      .cloned()
      .collect();
    step_records.sort_by_key(|s| s.step_order);

    let steps = step_records
      .into_iter()
      .map(|step| {
        let assignee_rule = state
          .assignee_rules
          .iter()
          .find(|r| r.step_id == step.step_id)
          .cloned();

        let mut form_fields: Vec<FormFieldRecord> = state
          .form_fields
          .iter()
          .filter(|f| f.step_id == step.step_id)
          .cloned()
          .collect();
        form_fields.sort_by_key(|f| f.field_order);

        let mut actions: Vec<ActionRecord> = state
          .actions
          .iter()
          .filter(|a| a.step_id == step.step_id)
          .cloned()
          .collect();
        actions.sort_by_key(|a| a.action_order);

        StepGraph {
          step,
          assignee_rule,
          form_fields,
          actions,
        }
      })
      .collect();

    let mut transition_records: Vec<TransitionRecord> = state
      .transitions
      .iter()
      .filter(|t| t.workflow_id == workflow_id)
      .cloned()
      .collect();
    transition_records.sort_by_key(|t| t.position);

    let transitions = transition_records
      .into_iter()
      .map(|transition| {
        let mut conditions: Vec<ConditionRecord> = state
          .conditions
          .iter()
          .filter(|c| c.transition_id == transition.transition_id)
          .cloned()
          .collect();
        conditions.sort_by_key(|c| c.condition_order);

        TransitionGraph {
          transition,
          conditions,
        }
      })
      .collect();

    Ok(Some(WorkflowGraph {
      workflow,
      steps,
      transitions,
    }))
  }

  async fn list_workflows(&self, organization_id: &str) -> Result<Vec<WorkflowRecord>, Error> {
    let state = self.state.lock().unwrap();
    let mut workflows: Vec<WorkflowRecord> = state
      .workflows
      .iter()
      .filter(|w| w.organization_id == organization_id)
      .cloned()
      .collect();
    workflows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(workflows)
  }
}

#[async_trait]
impl WorkflowTxn for MemoryTxn {
  async fn create_workflow(&mut self, workflow: &WorkflowRecord) -> Result<(), Error> {
    self.charge_write()?;
    self.buffer.workflows.push(workflow.clone());
    Ok(())
  }

  async fn create_step(&mut self, step: &StepRecord) -> Result<(), Error> {
    self.charge_write()?;
    self.buffer.steps.push(step.clone());
    Ok(())
  }

  async fn create_assignee_rule(&mut self, rule: &AssigneeRuleRecord) -> Result<(), Error> {
    self.charge_write()?;
    self.buffer.assignee_rules.push(rule.clone());
    Ok(())
  }

  async fn create_form_field(&mut self, field: &FormFieldRecord) -> Result<(), Error> {
    self.charge_write()?;
    self.buffer.form_fields.push(field.clone());
    Ok(())
  }

  async fn create_action(&mut self, action: &ActionRecord) -> Result<(), Error> {
    self.charge_write()?;
    self.buffer.actions.push(action.clone());
    Ok(())
  }

  async fn set_initial_step(&mut self, workflow_id: &str, step_id: &str) -> Result<(), Error> {
    self.charge_write()?;

    let known_in_buffer = self
      .buffer
      .workflows
      .iter()
      .any(|w| w.workflow_id == workflow_id);
    let known_committed = self
      .state
      .lock()
      .unwrap()
      .workflows
      .iter()
      .any(|w| w.workflow_id == workflow_id);
    if !known_in_buffer && !known_committed {
      return Err(Error::NotFound(format!("workflow {workflow_id}")));
    }

    self
      .initial_step_updates
      .push((workflow_id.to_string(), step_id.to_string()));
    Ok(())
  }

  async fn create_transition(&mut self, transition: &TransitionRecord) -> Result<(), Error> {
    self.charge_write()?;
    self.buffer.transitions.push(transition.clone());
    Ok(())
  }

  async fn create_condition(&mut self, condition: &ConditionRecord) -> Result<(), Error> {
    self.charge_write()?;
    self.buffer.conditions.push(condition.clone());
    Ok(())
  }

  async fn commit(mut self) -> Result<(), Error> {
    for (workflow_id, step_id) in &self.initial_step_updates {
      if let Some(workflow) = self
        .buffer
        .workflows
        .iter_mut()
        .find(|w| &w.workflow_id == workflow_id)
      {
        workflow.initial_step_id = Some(step_id.clone());
      }
    }

    let mut state = self.state.lock().unwrap();
    state.workflows.append(&mut self.buffer.workflows);
    state.steps.append(&mut self.buffer.steps);
    state.assignee_rules.append(&mut self.buffer.assignee_rules);
    state.form_fields.append(&mut self.buffer.form_fields);
    state.actions.append(&mut self.buffer.actions);
    state.transitions.append(&mut self.buffer.transitions);
    state.conditions.append(&mut self.buffer.conditions);

    // Updates targeting workflows committed by earlier transactions.
    for (workflow_id, step_id) in self.initial_step_updates {
      if let Some(workflow) = state
        .workflows
        .iter_mut()
        .find(|w| w.workflow_id == workflow_id)
      {
        workflow.initial_step_id = Some(step_id);
      }
    }

    Ok(())
  }
}
