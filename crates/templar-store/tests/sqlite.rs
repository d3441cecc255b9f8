//! Integration tests for the SQLite store against an in-memory database.

use chrono::Utc;
use sqlx::sqlite::SqlitePoolOptions;
use templar_definition::{
  ActionType, AssigneeType, ConditionOperator, ConditionSource, FieldOption, FieldType,
  TriggerType, ValueType,
};
use templar_store::{
  ActionRecord, AssigneeRuleRecord, ConditionRecord, FormFieldRecord, Json, SqliteStore,
  StepRecord, TransitionRecord, WorkflowRecord, WorkflowStore, WorkflowTxn,
};
use uuid::Uuid;

async fn open_store() -> SqliteStore {
  // A pool with more than one connection would see a different empty
  // database per connection.
  let pool = SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("failed to open in-memory database");

  let store = SqliteStore::new(pool);
  store.migrate().await.expect("failed to run migrations");
  store
}

fn id() -> String {
  Uuid::new_v4().to_string()
}

fn workflow(org: &str) -> WorkflowRecord {
  WorkflowRecord {
    workflow_id: id(),
    name: "Expense Approval".to_string(),
    description: Some("Approve employee expenses".to_string()),
    organization_id: org.to_string(),
    department_id: None,
    trigger_type: TriggerType::Manual,
    is_active: true,
    initial_step_id: None,
    created_at: Utc::now(),
  }
}

fn step(workflow_id: &str, name: &str, order: i64) -> StepRecord {
  StepRecord {
    step_id: id(),
    workflow_id: workflow_id.to_string(),
    name: name.to_string(),
    description: None,
    step_order: order,
  }
}

#[tokio::test]
async fn full_graph_round_trip() {
  let store = open_store().await;
  let mut txn = store.begin().await.unwrap();

  let workflow = workflow("org-1");
  txn.create_workflow(&workflow).await.unwrap();

  let submit = step(&workflow.workflow_id, "submit", 1);
  let review = step(&workflow.workflow_id, "review", 2);
  txn.create_step(&submit).await.unwrap();
  txn.create_step(&review).await.unwrap();

  txn
    .create_assignee_rule(&AssigneeRuleRecord {
      rule_id: id(),
      step_id: review.step_id.clone(),
      assignee_type: AssigneeType::SpecificRole,
      role_id: Some("role-finance".to_string()),
      member_id: None,
    })
    .await
    .unwrap();

  // Inserted out of order; read-back must sort by field_order.
  for (name, order, options) in [
    ("category", 2, Some(vec![FieldOption {
      value: "travel".to_string(),
      label: "Travel".to_string(),
    }])),
    ("amount", 1, None),
  ] {
    txn
      .create_form_field(&FormFieldRecord {
        field_id: id(),
        step_id: submit.step_id.clone(),
        field_name: name.to_string(),
        label: name.to_string(),
        field_type: if options.is_some() {
          FieldType::Select
        } else {
          FieldType::Number
        },
        required: true,
        placeholder: None,
        default_value: None,
        options: options.map(Json),
        validation_rules: None,
        field_order: order,
      })
      .await
      .unwrap();
  }

  let approve = ActionRecord {
    action_id: id(),
    step_id: submit.step_id.clone(),
    name: "approve".to_string(),
    label: "Approve".to_string(),
    action_type: ActionType::Primary,
    action_order: 1,
  };
  txn.create_action(&approve).await.unwrap();

  txn
    .set_initial_step(&workflow.workflow_id, &submit.step_id)
    .await
    .unwrap();

  let transition = TransitionRecord {
    transition_id: id(),
    workflow_id: workflow.workflow_id.clone(),
    from_step_id: submit.step_id.clone(),
    to_step_id: review.step_id.clone(),
    action_id: Some(approve.action_id.clone()),
    description: None,
    priority: 0,
    is_automatic: false,
    position: 0,
  };
  txn.create_transition(&transition).await.unwrap();

  for (order, field) in ["amount", "category", "urgent"].iter().enumerate() {
    txn
      .create_condition(&ConditionRecord {
        condition_id: id(),
        transition_id: transition.transition_id.clone(),
        source: ConditionSource::FormFieldValue,
        field_name: Some(field.to_string()),
        operator: ConditionOperator::NotEquals,
        value: "".to_string(),
        value_type: ValueType::String,
        condition_order: order as i64,
      })
      .await
      .unwrap();
  }

  txn.commit().await.unwrap();

  let graph = store
    .find_workflow_graph(&workflow.workflow_id)
    .await
    .unwrap()
    .expect("workflow should exist after commit");

  assert_eq!(
    graph.workflow.initial_step_id.as_deref(),
    Some(submit.step_id.as_str())
  );
  assert_eq!(graph.workflow.trigger_type, TriggerType::Manual);

  assert_eq!(graph.steps.len(), 2);
  let submit_graph = graph.step_by_name("submit").unwrap();
  let review_graph = graph.step_by_name("review").unwrap();

  let field_names: Vec<_> = submit_graph
    .form_fields
    .iter()
    .map(|f| f.field_name.as_str())
    .collect();
  assert_eq!(field_names, vec!["amount", "category"]);
  let category = &submit_graph.form_fields[1];
  assert_eq!(category.options.as_ref().unwrap().0[0].value, "travel");

  let rule = review_graph.assignee_rule.as_ref().unwrap();
  assert_eq!(rule.assignee_type, AssigneeType::SpecificRole);

  assert_eq!(graph.transitions.len(), 1);
  let edge = &graph.transitions[0];
  assert_eq!(
    edge.transition.action_id.as_deref(),
    Some(approve.action_id.as_str())
  );
  let condition_fields: Vec<_> = edge
    .conditions
    .iter()
    .map(|c| c.field_name.as_deref().unwrap())
    .collect();
  assert_eq!(condition_fields, vec!["amount", "category", "urgent"]);

  assert_eq!(
    graph.transitions_from(&submit.step_id).len(),
    1,
  );
}

#[tokio::test]
async fn dropped_transaction_rolls_back() {
  let store = open_store().await;

  let workflow = workflow("org-1");
  {
    let mut txn = store.begin().await.unwrap();
    txn.create_workflow(&workflow).await.unwrap();
    txn
      .create_step(&step(&workflow.workflow_id, "only", 1))
      .await
      .unwrap();
    // Dropped without commit.
  }

  let graph = store
    .find_workflow_graph(&workflow.workflow_id)
    .await
    .unwrap();
  assert!(graph.is_none());
}

#[tokio::test]
async fn set_initial_step_requires_the_workflow() {
  let store = open_store().await;
  let mut txn = store.begin().await.unwrap();

  let err = txn
    .set_initial_step("no-such-workflow", "no-such-step")
    .await
    .unwrap_err();
  assert!(matches!(err, templar_store::Error::NotFound(_)));
}

#[tokio::test]
async fn list_workflows_scopes_to_organization() {
  let store = open_store().await;

  let mut txn = store.begin().await.unwrap();
  let mine = workflow("org-1");
  let other = workflow("org-2");
  txn.create_workflow(&mine).await.unwrap();
  txn.create_workflow(&other).await.unwrap();
  txn.commit().await.unwrap();

  let listed = store.list_workflows("org-1").await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].workflow_id, mine.workflow_id);
}
