//! Mutable form state: values, errors, and the submitting flag.
//!
//! [`FormState`] is owned by exactly one form session and mutated only
//! through its defined transitions. Field edits do not re-run validation;
//! validation is pull-based and its result is written back explicitly.

use crate::error::{EngineError, ErrorMap};
use crate::path::FieldPath;
use serde_json::Value;

/// The mutable document of one form session.
///
/// # Examples
///
/// ```
/// use formwork::{FieldPath, FormState};
/// use serde_json::json;
///
/// let mut state = FormState::new(json!({"firstName": ""}));
/// state.set_field(&FieldPath::field("firstName"), json!("Ada")).unwrap();
///
/// assert_eq!(state.values()["firstName"], json!("Ada"));
/// assert!(state.errors().is_empty());
/// assert!(!state.is_submitting());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
	values: Value,
	errors: ErrorMap,
	submitting: bool,
}

impl FormState {
	/// Create state over a document's initial values, with no errors.
	pub fn new(values: Value) -> Self {
		Self {
			values,
			errors: ErrorMap::new(),
			submitting: false,
		}
	}

	pub fn values(&self) -> &Value {
		&self.values
	}

	pub fn errors(&self) -> &ErrorMap {
		&self.errors
	}

	pub fn is_submitting(&self) -> bool {
		self.submitting
	}

	/// Replace the value at `path`.
	///
	/// Does not touch the error map: stale errors stay visible until the
	/// next validation pass, and edits are legal while a submission is in
	/// flight (they apply to the live document, not the dispatched
	/// snapshot).
	pub fn set_field(&mut self, path: &FieldPath, value: Value) -> Result<(), EngineError> {
		self.values = path.with_value(&self.values, value)?;
		Ok(())
	}

	/// Overwrite the error map with a validation pass's result.
	pub fn set_errors(&mut self, errors: ErrorMap) {
		self.errors = errors;
	}

	/// Take the error map, leaving an empty one. Used for reindexing.
	pub fn take_errors(&mut self) -> ErrorMap {
		std::mem::take(&mut self.errors)
	}

	/// Start a submission attempt.
	///
	/// Returns `false` without any state change when a submission is already
	/// in flight. Otherwise clears the error map, so no stale errors from a
	/// previous attempt leak into this one, and raises the submitting flag.
	pub fn begin_submit(&mut self) -> bool {
		if self.submitting {
			return false;
		}
		self.errors.clear();
		self.submitting = true;
		true
	}

	/// Settle the current submission attempt with the collaborator outcome.
	///
	/// `Ok` leaves the error map empty; `Err` records the failure message in
	/// the root slot. The submitting flag drops either way. Field values are
	/// never touched.
	pub fn end_submit(&mut self, outcome: Result<(), String>) {
		match outcome {
			Ok(()) => self.errors.clear(),
			Err(message) => self.errors.set_root(message),
		}
		self.submitting = false;
	}

	/// Abandon the current attempt before the collaborator was invoked
	/// (validation failure short-circuit). Drops the submitting flag and
	/// leaves the error map as-is.
	pub fn abort_submit(&mut self) {
		self.submitting = false;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::{ErrorCategory, FieldError};
	use rstest::rstest;
	use serde_json::json;

	fn state() -> FormState {
		FormState::new(json!({
			"firstName": "",
			"address": {"city": "", "state": ""},
			"hobbies": [{"name": ""}],
		}))
	}

	#[rstest]
	fn test_set_field_keeps_errors_untouched() {
		// Arrange
		let mut state = state();
		let mut errors = ErrorMap::new();
		errors.record(
			FieldPath::field("firstName"),
			FieldError::new(ErrorCategory::Required, "First name is required!"),
		);
		state.set_errors(errors);

		// Act: editing the field does not clear its error
		state
			.set_field(&FieldPath::field("firstName"), json!("Ada"))
			.unwrap();

		// Assert
		assert_eq!(state.values()["firstName"], json!("Ada"));
		assert!(state.errors().contains(&FieldPath::field("firstName")));
	}

	#[rstest]
	fn test_set_field_rejects_unknown_paths() {
		let mut state = state();

		let result = state.set_field(&FieldPath::field("nonexistent"), json!(1));

		assert!(matches!(result, Err(EngineError::PathNotFound(_))));
	}

	#[rstest]
	fn test_begin_submit_clears_errors_and_raises_flag() {
		// Arrange
		let mut state = state();
		let mut errors = ErrorMap::new();
		errors.set_root("Server error occured. Please try again!");
		state.set_errors(errors);

		// Act
		let started = state.begin_submit();

		// Assert
		assert!(started);
		assert!(state.is_submitting());
		assert!(state.errors().is_empty());
	}

	#[rstest]
	fn test_begin_submit_is_a_noop_while_in_flight() {
		let mut state = state();
		assert!(state.begin_submit());

		let before = state.clone();
		assert!(!state.begin_submit());

		assert_eq!(state, before);
	}

	#[rstest]
	fn test_end_submit_failure_sets_root_error_only() {
		// Arrange
		let mut state = state();
		state.begin_submit();

		// Act
		state.end_submit(Err("Server error occured. Please try again!".to_string()));

		// Assert
		assert!(!state.is_submitting());
		assert_eq!(state.errors().len(), 1);
		assert_eq!(
			state.errors().root_message(),
			Some("Server error occured. Please try again!")
		);
		// Field values survive a rejected submission.
		assert_eq!(state.values()["hobbies"][0]["name"], json!(""));
	}

	#[rstest]
	fn test_end_submit_success_clears_everything() {
		let mut state = state();
		state.begin_submit();

		state.end_submit(Ok(()));

		assert!(!state.is_submitting());
		assert!(state.errors().is_empty());
	}

	#[rstest]
	fn test_abort_submit_keeps_validation_errors() {
		// Arrange
		let mut state = state();
		state.begin_submit();
		let mut errors = ErrorMap::new();
		errors.record(
			FieldPath::field("firstName"),
			FieldError::new(ErrorCategory::Required, "First name is required!"),
		);
		state.set_errors(errors);

		// Act
		state.abort_submit();

		// Assert
		assert!(!state.is_submitting());
		assert_eq!(state.errors().len(), 1);
	}
}
