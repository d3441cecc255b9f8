//! Templar Store
//!
//! This crate provides the storage traits and implementations for persisted
//! workflow templates. A workflow graph (workflow, steps, assignee rules,
//! form fields, actions, transitions, conditions) is written once by the
//! builder and read back fully hydrated.
//!
//! Two implementations are provided:
//! - [`SqliteStore`] — SQLite via sqlx, schema managed by embedded migrations
//! - [`MemoryStore`] — in-memory, used by builder tests and as a scratch
//!   backend
//!
//! All writes go through a [`WorkflowTxn`]: every record created between
//! [`WorkflowStore::begin`] and [`WorkflowTxn::commit`] becomes visible
//! atomically. Dropping an uncommitted transaction discards its writes, so
//! a failed build never leaves a partial workflow addressable by readers.

mod memory;
mod sqlite;
mod types;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
/// JSON column wrapper, re-exported so record producers don't need a direct
/// sqlx dependency.
pub use sqlx::types::Json;
pub use types::{
  ActionRecord, AssigneeRuleRecord, ConditionRecord, FormFieldRecord, StepGraph, StepRecord,
  TransitionGraph, TransitionRecord, WorkflowGraph, WorkflowRecord,
};

use async_trait::async_trait;

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// The requested record was not found.
  #[error("not found: {0}")]
  NotFound(String),

  /// A database error occurred.
  #[error("database error: {0}")]
  Database(#[from] sqlx::Error),

  /// Failure injected by a test store.
  #[error("injected failure after {0} writes")]
  Injected(usize),
}

/// Storage backend for workflow templates.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
  /// The write-transaction type for this backend.
  type Txn: WorkflowTxn;

  /// Start a write transaction.
  async fn begin(&self) -> Result<Self::Txn, Error>;

  /// Load a workflow with all steps, assignee rules, form fields, actions,
  /// transitions and conditions. Returns `None` if the workflow does not
  /// exist.
  async fn find_workflow_graph(&self, workflow_id: &str) -> Result<Option<WorkflowGraph>, Error>;

  /// List workflow records for an organization, most recent first.
  async fn list_workflows(&self, organization_id: &str) -> Result<Vec<WorkflowRecord>, Error>;
}

/// A write transaction over a [`WorkflowStore`].
///
/// Writes are not visible to readers until [`commit`](Self::commit);
/// dropping the transaction rolls everything back.
#[async_trait]
pub trait WorkflowTxn: Send {
  /// Insert the workflow shell. `initial_step_id` is normally `None` here
  /// and set later via [`set_initial_step`](Self::set_initial_step).
  async fn create_workflow(&mut self, workflow: &WorkflowRecord) -> Result<(), Error>;

  /// Insert a step owned by a workflow.
  async fn create_step(&mut self, step: &StepRecord) -> Result<(), Error>;

  /// Insert a step's assignee rule.
  async fn create_assignee_rule(&mut self, rule: &AssigneeRuleRecord) -> Result<(), Error>;

  /// Insert a form field owned by a step.
  async fn create_form_field(&mut self, field: &FormFieldRecord) -> Result<(), Error>;

  /// Insert an action owned by a step.
  async fn create_action(&mut self, action: &ActionRecord) -> Result<(), Error>;

  /// Point the workflow at its initial step.
  async fn set_initial_step(&mut self, workflow_id: &str, step_id: &str) -> Result<(), Error>;

  /// Insert a transition between two steps of a workflow.
  async fn create_transition(&mut self, transition: &TransitionRecord) -> Result<(), Error>;

  /// Insert a condition owned by a transition.
  async fn create_condition(&mut self, condition: &ConditionRecord) -> Result<(), Error>;

  /// Commit every write made through this transaction.
  async fn commit(self) -> Result<(), Error>;
}
