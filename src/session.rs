//! The session facade: the surface a UI layer binds to.
//!
//! [`FormSession`] owns one [`FormState`], one validation strategy, and one
//! submit collaborator handle. It exposes `values` / `errors` /
//! `is_submitting` as read state and `set_field` / `append` / `remove` /
//! `submit` as the only mutators — a binding layer needs no knowledge of
//! which validation strategy is in use behind it.

use crate::document::{Registration, today};
use crate::error::{EngineError, ErrorMap};
use crate::list::ListFieldController;
use crate::path::FieldPath;
use crate::schema::Validator;
use crate::state::FormState;
use crate::submit::{SubmissionController, SubmitOutcome, SubmitService};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;

type FieldCleanFn = Box<dyn Fn(Value) -> Value + Send + Sync>;

/// One editing session over one form document.
///
/// # Examples
///
/// ```
/// use formwork::{EchoService, FieldPath, FormSession};
/// use serde_json::json;
/// use std::sync::Arc;
///
/// let mut session = FormSession::registration(Arc::new(EchoService)).unwrap();
///
/// session.set_field(&FieldPath::field("firstName"), json!("Ada")).unwrap();
/// assert_eq!(session.values()["firstName"], json!("Ada"));
/// assert!(!session.is_submitting());
/// ```
pub struct FormSession {
	state: FormState,
	controller: SubmissionController,
	lists: Vec<ListFieldController>,
	cleaners: HashMap<FieldPath, FieldCleanFn>,
}

impl FormSession {
	/// Create a session over arbitrary initial values with the given
	/// validation strategy and submit collaborator.
	pub fn new(
		values: Value,
		validator: Box<dyn Validator>,
		service: Arc<dyn SubmitService>,
	) -> Self {
		Self {
			state: FormState::new(values),
			controller: SubmissionController::new(validator, service),
			lists: Vec::new(),
			cleaners: HashMap::new(),
		}
	}

	/// Create a session for the registration document: default values, the
	/// canonical declarative schema, a managed hobbies list, and the
	/// cleared-start-date-falls-back-to-today rule.
	pub fn registration(service: Arc<dyn SubmitService>) -> Result<Self, EngineError> {
		let values = Registration::default().to_value()?;
		let mut session = Self::new(values, Box::new(Registration::schema()), service);
		session.manage_list(FieldPath::field("hobbies"));
		session.add_field_clean(FieldPath::field("startDate"), |value| {
			if value.is_null() {
				json!(today().to_string())
			} else {
				value
			}
		});
		Ok(session)
	}

	pub fn values(&self) -> &Value {
		self.state.values()
	}

	pub fn errors(&self) -> &ErrorMap {
		self.state.errors()
	}

	pub fn is_submitting(&self) -> bool {
		self.state.is_submitting()
	}

	/// Rebuild the typed registration document from the current values.
	pub fn document(&self) -> Result<Registration, EngineError> {
		Registration::from_value(self.state.values())
	}

	/// Register a per-field clean function applied to every value written
	/// through [`set_field`](Self::set_field) at `path`.
	pub fn add_field_clean<F>(&mut self, path: FieldPath, clean: F)
	where
		F: Fn(Value) -> Value + Send + Sync + 'static,
	{
		self.cleaners.insert(path, Box::new(clean));
	}

	/// Put a list field under controller management, seeding row keys from
	/// the rows currently in the document.
	pub fn manage_list(&mut self, path: FieldPath) {
		if self.list_position(&path).is_none() {
			self.lists
				.push(ListFieldController::for_state(path, &self.state));
		}
	}

	/// Stable row keys for a managed list, in display order.
	pub fn row_keys(&self, path: &FieldPath) -> Option<&[u64]> {
		self.list_position(path)
			.map(|position| self.lists[position].keys())
	}

	/// Replace the value at `path`, routing it through the field's clean
	/// function if one is registered. Does not re-run validation.
	///
	/// Writing a whole new list over a managed list path reseeds that
	/// list's row keys; per-row identity is only preserved across
	/// `append`/`remove`, not wholesale replacement.
	pub fn set_field(&mut self, path: &FieldPath, value: Value) -> Result<(), EngineError> {
		let value = match self.cleaners.get(path) {
			Some(clean) => clean(value),
			None => value,
		};
		self.state.set_field(path, value)?;
		if let Some(position) = self.list_position(path) {
			self.lists[position] = ListFieldController::for_state(path.clone(), &self.state);
		}
		Ok(())
	}

	/// Append `entry` to the managed list at `path`.
	pub fn append(&mut self, path: &FieldPath, entry: Value) -> Result<usize, EngineError> {
		let position = self.ensure_list(path);
		self.lists[position].append(&mut self.state, entry)
	}

	/// Remove the row at `index` from the managed list at `path`.
	pub fn remove(&mut self, path: &FieldPath, index: usize) -> Result<(), EngineError> {
		let position = self.ensure_list(path);
		self.lists[position].remove(&mut self.state, index)
	}

	/// Run an explicit validation pass and write its result into the error
	/// map. Returns `true` when the document is valid.
	pub fn validate(&mut self) -> bool {
		let errors = self.controller.validate(self.state.values());
		let valid = errors.is_empty();
		self.state.set_errors(errors);
		valid
	}

	/// Run one submission attempt: validate, dispatch, reconcile.
	pub async fn submit(&mut self) -> Result<SubmitOutcome, EngineError> {
		self.controller.submit(&mut self.state).await
	}

	fn list_position(&self, path: &FieldPath) -> Option<usize> {
		self.lists.iter().position(|list| list.path() == path)
	}

	fn ensure_list(&mut self, path: &FieldPath) -> usize {
		match self.list_position(path) {
			Some(position) => position,
			None => {
				self.lists
					.push(ListFieldController::for_state(path.clone(), &self.state));
				self.lists.len() - 1
			}
		}
	}
}
