//! Templar Builder
//!
//! Turns a declarative [`WorkflowDefinition`](templar_definition::WorkflowDefinition)
//! into a persisted workflow graph. Construction is two-pass:
//!
//! 1. **Materialize** every step with its assignee rule, form fields and
//!    actions, recording a document-name → persisted-identity map (with a
//!    per-step action map nested inside).
//! 2. **Link** transitions by looking names up in those maps.
//!
//! Because all steps exist before any transition is linked, a transition may
//! reference a step declared later in the document. A transition whose
//! target step or triggering action cannot be resolved is not an error: it
//! is dropped, and every drop is reported back to the caller in
//! [`BuildOutcome::skipped`].
//!
//! The whole build runs inside a single store transaction; a failure at any
//! point leaves nothing behind.

mod builder;
mod error;
mod validate;

pub use builder::{BuildOutcome, SkipReason, SkippedTransition, WorkflowBuilder};
pub use error::BuildError;
pub use validate::{ValidationError, ValidationIssue, validate};
