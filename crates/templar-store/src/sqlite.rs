use async_trait::async_trait;
use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::types::{
  ActionRecord, AssigneeRuleRecord, ConditionRecord, FormFieldRecord, StepGraph, StepRecord,
  TransitionGraph, TransitionRecord, WorkflowGraph, WorkflowRecord,
};
use crate::{Error, WorkflowStore, WorkflowTxn};

/// SQLite-based store implementation.
pub struct SqliteStore {
  pool: SqlitePool,
}

impl SqliteStore {
  /// Create a new SQLite store with the given connection pool.
  pub fn new(pool: SqlitePool) -> Self {
    Self { pool }
  }

  /// Run database migrations.
  pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(&self.pool).await
  }
}

/// A SQLite write transaction. Rolls back on drop if not committed.
pub struct SqliteTxn {
  tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl WorkflowStore for SqliteStore {
  type Txn = SqliteTxn;

  async fn begin(&self) -> Result<SqliteTxn, Error> {
    let tx = self.pool.begin().await?;
    Ok(SqliteTxn { tx })
  }

  async fn find_workflow_graph(&self, workflow_id: &str) -> Result<Option<WorkflowGraph>, Error> {
    let workflow: Option<WorkflowRecord> = sqlx::query_as(
      r#"
            SELECT workflow_id, name, description, organization_id, department_id,
                   trigger_type, is_active, initial_step_id, created_at
            FROM workflows
            WHERE workflow_id = ?
            "#,
    )
    .bind(workflow_id)
    .fetch_optional(&self.pool)
    .await?;

    let Some(workflow) = workflow else {
      return Ok(None);
    };

    let step_records: Vec<StepRecord> = sqlx::query_as(
      r#"
            SELECT step_id, workflow_id, name, description, step_order
            FROM workflow_steps
            WHERE workflow_id = ?
            ORDER BY step_order
            "#,
    )
    .bind(workflow_id)
    .fetch_all(&self.pool)
    .await?;

    let mut steps = Vec::with_capacity(step_records.len());
    for step in step_records {
      let assignee_rule: Option<AssigneeRuleRecord> = sqlx::query_as(
        r#"
                SELECT rule_id, step_id, assignee_type, role_id, member_id
                FROM step_assignee_rules
                WHERE step_id = ?
                "#,
      )
      .bind(&step.step_id)
      .fetch_optional(&self.pool)
      .await?;

      let form_fields: Vec<FormFieldRecord> = sqlx::query_as(
        r#"
                SELECT field_id, step_id, field_name, label, field_type, required,
                       placeholder, default_value, options, validation_rules, field_order
                FROM step_form_fields
                WHERE step_id = ?
                ORDER BY field_order
                "#,
      )
      .bind(&step.step_id)
      .fetch_all(&self.pool)
      .await?;

      let actions: Vec<ActionRecord> = sqlx::query_as(
        r#"
                SELECT action_id, step_id, name, label, action_type, action_order
                FROM step_actions
                WHERE step_id = ?
                ORDER BY action_order
                "#,
      )
      .bind(&step.step_id)
      .fetch_all(&self.pool)
      .await?;

      steps.push(StepGraph {
        step,
        assignee_rule,
        form_fields,
        actions,
      });
    }

    let transition_records: Vec<TransitionRecord> = sqlx::query_as(
      r#"
            SELECT transition_id, workflow_id, from_step_id, to_step_id, action_id,
                   description, priority, is_automatic, position
            FROM workflow_transitions
            WHERE workflow_id = ?
            ORDER BY position
            "#,
    )
    .bind(workflow_id)
    .fetch_all(&self.pool)
    .await?;

    let mut transitions = Vec::with_capacity(transition_records.len());
    for transition in transition_records {
      let conditions: Vec<ConditionRecord> = sqlx::query_as(
        r#"
                SELECT condition_id, transition_id, source, field_name, operator,
                       value, value_type, condition_order
                FROM transition_conditions
                WHERE transition_id = ?
                ORDER BY condition_order
                "#,
      )
      .bind(&transition.transition_id)
      .fetch_all(&self.pool)
      .await?;

      transitions.push(TransitionGraph {
        transition,
        conditions,
      });
    }

    Ok(Some(WorkflowGraph {
      workflow,
      steps,
      transitions,
    }))
  }

  async fn list_workflows(&self, organization_id: &str) -> Result<Vec<WorkflowRecord>, Error> {
    let workflows = sqlx::query_as(
      r#"
            SELECT workflow_id, name, description, organization_id, department_id,
                   trigger_type, is_active, initial_step_id, created_at
            FROM workflows
            WHERE organization_id = ?
            ORDER BY created_at DESC
            "#,
    )
    .bind(organization_id)
    .fetch_all(&self.pool)
    .await?;

    Ok(workflows)
  }
}

#[async_trait]
impl WorkflowTxn for SqliteTxn {
  async fn create_workflow(&mut self, workflow: &WorkflowRecord) -> Result<(), Error> {
    sqlx::query(
            r#"
            INSERT INTO workflows (workflow_id, name, description, organization_id, department_id,
                                   trigger_type, is_active, initial_step_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&workflow.workflow_id)
        .bind(&workflow.name)
        .bind(&workflow.description)
        .bind(&workflow.organization_id)
        .bind(&workflow.department_id)
        .bind(workflow.trigger_type)
        .bind(workflow.is_active)
        .bind(&workflow.initial_step_id)
        .bind(workflow.created_at)
        .execute(&mut *self.tx)
        .await?;

    Ok(())
  }

  async fn create_step(&mut self, step: &StepRecord) -> Result<(), Error> {
    sqlx::query(
      r#"
            INSERT INTO workflow_steps (step_id, workflow_id, name, description, step_order)
            VALUES (?, ?, ?, ?, ?)
            "#,
    )
    .bind(&step.step_id)
    .bind(&step.workflow_id)
    .bind(&step.name)
    .bind(&step.description)
    .bind(step.step_order)
    .execute(&mut *self.tx)
    .await?;

    Ok(())
  }

  async fn create_assignee_rule(&mut self, rule: &AssigneeRuleRecord) -> Result<(), Error> {
    sqlx::query(
      r#"
            INSERT INTO step_assignee_rules (rule_id, step_id, assignee_type, role_id, member_id)
            VALUES (?, ?, ?, ?, ?)
            "#,
    )
    .bind(&rule.rule_id)
    .bind(&rule.step_id)
    .bind(rule.assignee_type)
    .bind(&rule.role_id)
    .bind(&rule.member_id)
    .execute(&mut *self.tx)
    .await?;

    Ok(())
  }

  async fn create_form_field(&mut self, field: &FormFieldRecord) -> Result<(), Error> {
    sqlx::query(
            r#"
            INSERT INTO step_form_fields (field_id, step_id, field_name, label, field_type, required,
                                          placeholder, default_value, options, validation_rules, field_order)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&field.field_id)
        .bind(&field.step_id)
        .bind(&field.field_name)
        .bind(&field.label)
        .bind(field.field_type)
        .bind(field.required)
        .bind(&field.placeholder)
        .bind(&field.default_value)
        .bind(&field.options)
        .bind(&field.validation_rules)
        .bind(field.field_order)
        .execute(&mut *self.tx)
        .await?;

    Ok(())
  }

  async fn create_action(&mut self, action: &ActionRecord) -> Result<(), Error> {
    sqlx::query(
      r#"
            INSERT INTO step_actions (action_id, step_id, name, label, action_type, action_order)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
    )
    .bind(&action.action_id)
    .bind(&action.step_id)
    .bind(&action.name)
    .bind(&action.label)
    .bind(action.action_type)
    .bind(action.action_order)
    .execute(&mut *self.tx)
    .await?;

    Ok(())
  }

  async fn set_initial_step(&mut self, workflow_id: &str, step_id: &str) -> Result<(), Error> {
    let result = sqlx::query(
      r#"
            UPDATE workflows
            SET initial_step_id = ?
            WHERE workflow_id = ?
            "#,
    )
    .bind(step_id)
    .bind(workflow_id)
    .execute(&mut *self.tx)
    .await?;

    if result.rows_affected() == 0 {
      return Err(Error::NotFound(format!("workflow {workflow_id}")));
    }

    Ok(())
  }

  async fn create_transition(&mut self, transition: &TransitionRecord) -> Result<(), Error> {
    sqlx::query(
            r#"
            INSERT INTO workflow_transitions (transition_id, workflow_id, from_step_id, to_step_id,
                                              action_id, description, priority, is_automatic, position)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&transition.transition_id)
        .bind(&transition.workflow_id)
        .bind(&transition.from_step_id)
        .bind(&transition.to_step_id)
        .bind(&transition.action_id)
        .bind(&transition.description)
        .bind(transition.priority)
        .bind(transition.is_automatic)
        .bind(transition.position)
        .execute(&mut *self.tx)
        .await?;

    Ok(())
  }

  async fn create_condition(&mut self, condition: &ConditionRecord) -> Result<(), Error> {
    sqlx::query(
      r#"
            INSERT INTO transition_conditions (condition_id, transition_id, source, field_name,
                                               operator, value, value_type, condition_order)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
    )
    .bind(&condition.condition_id)
    .bind(&condition.transition_id)
    .bind(condition.source)
    .bind(&condition.field_name)
    .bind(condition.operator)
    .bind(&condition.value)
    .bind(condition.value_type)
    .bind(condition.condition_order)
    .execute(&mut *self.tx)
    .await?;

    Ok(())
  }

  async fn commit(self) -> Result<(), Error> {
    self.tx.commit().await?;
    Ok(())
  }
}
