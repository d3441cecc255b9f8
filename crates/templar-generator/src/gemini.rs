use serde::Deserialize;
use serde_json::json;
use templar_definition::WorkflowDefinition;
use tracing::debug;

use crate::error::GeneratorError;
use crate::extract::extract_json;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// HTTP client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
  client: reqwest::Client,
  base_url: String,
  model: String,
  api_key: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
  #[serde(default)]
  candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
  content: Content,
}

#[derive(Debug, Deserialize)]
struct Content {
  #[serde(default)]
  parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
  #[serde(default)]
  text: String,
}

impl GeminiClient {
  /// Create a client for the public Gemini API with the default model.
  pub fn new(api_key: String) -> Self {
    Self {
      client: reqwest::Client::new(),
      base_url: DEFAULT_BASE_URL.to_string(),
      model: DEFAULT_MODEL.to_string(),
      api_key,
    }
  }

  /// Override the API base URL, for a proxy or a self-hosted gateway.
  pub fn with_base_url(mut self, base_url: String) -> Self {
    self.base_url = base_url;
    self
  }

  /// Override the model name.
  pub fn with_model(mut self, model: String) -> Self {
    self.model = model;
    self
  }

  fn request_url(&self) -> String {
    format!(
      "{}/models/{}:generateContent?key={}",
      self.base_url, self.model, self.api_key
    )
  }

  /// Ask the model for a workflow definition matching the free-text prompt.
  ///
  /// `organization_id` and `department_id` are stamped onto the result from
  /// the caller's values; whatever the model put there is discarded.
  pub async fn generate_definition(
    &self,
    prompt: &str,
    organization_id: &str,
    department_id: Option<&str>,
  ) -> Result<WorkflowDefinition, GeneratorError> {
    let body = json!({
      "contents": [{
        "parts": [{ "text": build_prompt(prompt) }]
      }],
      "generationConfig": { "responseMimeType": "application/json" }
    });

    let response = self
      .client
      .post(self.request_url())
      .json(&body)
      .send()
      .await?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(GeneratorError::Api {
        status: status.as_u16(),
        body,
      });
    }

    let response: GenerateResponse = response.json().await?;
    let text = response
      .candidates
      .into_iter()
      .next()
      .map(|c| {
        c.content
          .parts
          .into_iter()
          .map(|p| p.text)
          .collect::<String>()
      })
      .filter(|t| !t.trim().is_empty())
      .ok_or(GeneratorError::EmptyResponse)?;

    debug!(chars = text.len(), "received model output");

    let payload = extract_json(&text).ok_or(GeneratorError::NoJsonFound)?;
    let mut definition: WorkflowDefinition = serde_json::from_str(payload)?;

    // Never trust the model for tenancy fields.
    definition.organization_id = organization_id.to_string();
    definition.department_id = department_id.map(str::to_string);

    Ok(definition)
  }
}

/// Wrap the user's request with the document contract the model must emit.
fn build_prompt(request: &str) -> String {
  format!(
    "Design a workflow template for the following request and reply with a \
     single JSON object, no prose.\n\
     \n\
     Request: {request}\n\
     \n\
     The JSON object must have: workflow_name (string), description \
     (string, optional), trigger_type (MANUAL | EVENT_BASED | SCHEDULED | \
     API_CALL), initial_step_name (string, must equal the step_name of one \
     step), steps (array). Each step: step_name (unique string), \
     description, order (integer), assignee_logic (optional: assignee_type \
     SUBMITTER | SPECIFIC_ROLE | SPECIFIC_MEMBER | MANAGER | \
     DEPARTMENT_HEAD, role_id, member_id), form_fields (array: field_name \
     camelCase unique in step, label, field_type TEXT | TEXTAREA | NUMBER | \
     DATE | SELECT | MULTI_SELECT | CHECKBOX | FILE, required, placeholder, \
     default_value, options [{{value,label}}] for choice fields, \
     validation_rules object, order), actions (array: name unique in step, \
     label, action_type PRIMARY | SECONDARY | DANGER, order), transitions \
     (array: to_step_name naming another step, action_name naming an action \
     of this step, description, priority integer, is_automatic boolean, \
     conditions array of {{source FORM_FIELD_VALUE | CONTEXT_VALUE, \
     field_name, operator EQUALS | NOT_EQUALS | GREATER_THAN | LESS_THAN | \
     GREATER_THAN_OR_EQUAL | LESS_THAN_OR_EQUAL | CONTAINS | IS_EMPTY | \
     IS_NOT_EMPTY, value as a string, value_type STRING | NUMBER | BOOLEAN \
     | DATE}})."
  )
}
