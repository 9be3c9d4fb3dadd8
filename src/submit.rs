//! Submission orchestration: validate, dispatch, reconcile.
//!
//! The external submit collaborator is abstracted as [`SubmitService`]: it
//! receives a fully-populated document and eventually settles exactly once
//! with the accepted payload or a failure message. [`SubmissionController`]
//! drives one attempt through its states — validate the document, dispatch a
//! snapshot to the collaborator, and fold the result back into form state —
//! with a re-entrancy guard so at most one submission is ever in flight.

use crate::document::Registration;
use crate::schema::Validator;
use crate::state::FormState;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Failure reported by the submit collaborator.
///
/// Carries the human-readable message shown as the form-level error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct SubmitError {
	message: String,
}

impl SubmitError {
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
		}
	}

	pub fn message(&self) -> &str {
		&self.message
	}
}

/// The external submit collaborator.
///
/// Contract: settles exactly once per call, with the accepted payload on
/// success or a [`SubmitError`] on failure. No latency guarantee beyond
/// eventual settlement; the engine never assumes ordering between the call
/// and other events beyond the causal edit-then-submit ordering.
#[async_trait]
pub trait SubmitService: Send + Sync {
	async fn submit(&self, document: Registration) -> Result<Registration, SubmitError>;
}

/// Collaborator that accepts every document and echoes it back.
///
/// Stands in for a real transport in examples and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoService;

#[async_trait]
impl SubmitService for EchoService {
	async fn submit(&self, document: Registration) -> Result<Registration, SubmitError> {
		Ok(document)
	}
}

/// Result of one submit trigger, as observed by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
	/// Ignored: a submission was already in flight.
	InFlight,
	/// Validation failed; the collaborator was not invoked.
	Invalid,
	/// The collaborator accepted the document.
	Accepted,
	/// The collaborator rejected the document; its message is in the
	/// root error slot.
	Rejected,
}

/// Drives submission attempts: validate, dispatch, reconcile.
///
/// Each attempt starts from scratch — `begin_submit` clears the previous
/// attempt's errors before this attempt's own validation or result is
/// known. The document is snapshotted at dispatch time, so edits made while
/// the collaborator is pending never mutate the in-flight payload. No
/// automatic retries: a failed attempt settles back to idle and waits for
/// the next trigger.
pub struct SubmissionController {
	validator: Box<dyn Validator>,
	service: Arc<dyn SubmitService>,
}

impl SubmissionController {
	pub fn new(validator: Box<dyn Validator>, service: Arc<dyn SubmitService>) -> Self {
		Self { validator, service }
	}

	/// Run the configured validation strategy without starting an attempt.
	pub fn validate(&self, document: &serde_json::Value) -> crate::ErrorMap {
		self.validator.validate(document)
	}

	/// Run one submission attempt against `state`.
	///
	/// Returns the observable outcome; all error reporting happens through
	/// the state's error map. A trigger while a submission is in flight is
	/// an idempotent no-op (`SubmitOutcome::InFlight`) with no collaborator
	/// invocation and no state transition.
	pub async fn submit(&self, state: &mut FormState) -> Result<SubmitOutcome, crate::EngineError> {
		if !state.begin_submit() {
			debug!("submit trigger ignored: submission already in flight");
			return Ok(SubmitOutcome::InFlight);
		}

		let errors = self.validator.validate(state.values());
		if !errors.is_empty() {
			debug!(errors = errors.len(), "validation failed, not dispatching");
			state.set_errors(errors);
			state.abort_submit();
			return Ok(SubmitOutcome::Invalid);
		}

		// Snapshot before dispatch: in-flight edits apply to the live state
		// only, never to the payload already handed to the collaborator.
		let snapshot = match Registration::from_value(state.values()) {
			Ok(snapshot) => snapshot,
			Err(error) => {
				state.abort_submit();
				return Err(error);
			}
		};

		info!("dispatching submission");
		match self.service.submit(snapshot).await {
			Ok(_accepted) => {
				info!("submission accepted");
				state.end_submit(Ok(()));
				Ok(SubmitOutcome::Accepted)
			}
			Err(error) => {
				warn!(message = error.message(), "submission rejected");
				state.end_submit(Err(error.message().to_string()));
				Ok(SubmitOutcome::Rejected)
			}
		}
	}
}
