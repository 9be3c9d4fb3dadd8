//! Error taxonomy for the form engine.
//!
//! Validation failures are data, not faults: they live in an [`ErrorMap`]
//! keyed by [`FieldPath`] and never abort the session. [`EngineError`] covers
//! the structural failures a caller can actually mishandle: malformed paths,
//! paths that do not exist in the document, and list operations that would
//! violate the minimum-length invariant.

use crate::path::FieldPath;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Structural failures raised by engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
	#[error("Path '{0}' is not a valid field path")]
	InvalidPath(String),
	#[error("Path '{0}' does not exist in the document")]
	PathNotFound(String),
	#[error("Cannot remove entry {index}: the list must keep at least {min} entries")]
	MinimumLengthViolation { index: usize, min: usize },
	#[error(transparent)]
	Serialization(#[from] serde_json::Error),
}

/// Classification of a validation failure.
///
/// Two validation strategies built from the same schema must agree on the
/// category of every error they produce, even when the message wording
/// differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
	/// A required value is missing or blank.
	Required,
	/// A value does not match its expected pattern.
	Format,
	/// A numeric value is outside its allowed range.
	Range,
	/// A list is shorter than its minimum length.
	Length,
	/// A value is required only because of a sibling field's current value.
	Conditional,
	/// The external submit collaborator rejected the document.
	Submission,
}

/// A single field-level validation failure.
///
/// # Examples
///
/// ```
/// use formwork::{ErrorCategory, FieldError};
///
/// let error = FieldError::new(ErrorCategory::Required, "First name is required!");
/// assert_eq!(error.category(), ErrorCategory::Required);
/// assert_eq!(error.to_string(), "First name is required!");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
	category: ErrorCategory,
	message: String,
}

impl FieldError {
	pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
		Self {
			category,
			message: message.into(),
		}
	}

	pub fn category(&self) -> ErrorCategory {
		self.category
	}

	pub fn message(&self) -> &str {
		&self.message
	}
}

impl fmt::Display for FieldError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.message)
	}
}

/// Mapping from [`FieldPath`] to the field's current error.
///
/// Absence of an entry means the field is currently valid; an empty map is
/// the sole success signal of a validation pass. Form-level errors (such as
/// a rejected submission) live under [`FieldPath::root()`].
///
/// # Examples
///
/// ```
/// use formwork::{ErrorCategory, ErrorMap, FieldError, FieldPath};
///
/// let mut errors = ErrorMap::new();
/// assert!(errors.is_empty());
///
/// let path = FieldPath::field("email");
/// errors.record(path.clone(), FieldError::new(ErrorCategory::Format, "Invalid email address!"));
/// assert_eq!(errors.message(&path), Some("Invalid email address!"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorMap(BTreeMap<FieldPath, FieldError>);

impl ErrorMap {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn contains(&self, path: &FieldPath) -> bool {
		self.0.contains_key(path)
	}

	pub fn get(&self, path: &FieldPath) -> Option<&FieldError> {
		self.0.get(path)
	}

	/// The message at `path`, if the field is currently invalid.
	pub fn message(&self, path: &FieldPath) -> Option<&str> {
		self.0.get(path).map(FieldError::message)
	}

	/// Record an error for `path`, keeping an earlier entry if one exists.
	///
	/// Validation runs every rule on every pass, so several rules can fail
	/// for the same path; the first failure in rule order wins.
	pub fn record(&mut self, path: FieldPath, error: FieldError) {
		self.0.entry(path).or_insert(error);
	}

	/// Insert an error for `path`, replacing any existing entry.
	pub fn insert(&mut self, path: FieldPath, error: FieldError) {
		self.0.insert(path, error);
	}

	pub fn remove(&mut self, path: &FieldPath) -> Option<FieldError> {
		self.0.remove(path)
	}

	pub fn clear(&mut self) {
		self.0.clear();
	}

	/// Set the form-level error slot used for submission failures.
	pub fn set_root(&mut self, message: impl Into<String>) {
		self.insert(
			FieldPath::root(),
			FieldError::new(ErrorCategory::Submission, message),
		);
	}

	/// The form-level error message, if any.
	pub fn root_message(&self) -> Option<&str> {
		self.message(&FieldPath::root())
	}

	pub fn iter(&self) -> impl Iterator<Item = (&FieldPath, &FieldError)> {
		self.0.iter()
	}

	/// The paths currently in error, in path order.
	pub fn paths(&self) -> impl Iterator<Item = &FieldPath> {
		self.0.keys()
	}
}

impl IntoIterator for ErrorMap {
	type Item = (FieldPath, FieldError);
	type IntoIter = std::collections::btree_map::IntoIter<FieldPath, FieldError>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}
