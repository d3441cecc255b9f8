use thiserror::Error;

/// Errors from the generation pipeline.
#[derive(Debug, Error)]
pub enum GeneratorError {
  /// The HTTP request itself failed (network, DNS, TLS, etc.).
  #[error("HTTP request failed: {0}")]
  Request(#[from] reqwest::Error),

  /// Gemini returned a non-2xx status code.
  #[error("Gemini API error ({status}): {body}")]
  Api { status: u16, body: String },

  /// The response contained no candidate text to extract from.
  #[error("Gemini response contained no candidate text")]
  EmptyResponse,

  /// No JSON document could be located in the model's text.
  #[error("no JSON document found in model output")]
  NoJsonFound,

  /// The extracted text was not a valid workflow definition document.
  #[error("model output is not a valid workflow definition: {0}")]
  InvalidDefinition(#[from] serde_json::Error),

  /// The definition parsed but failed validation or persistence.
  #[error(transparent)]
  Build(#[from] templar_builder::BuildError),
}
