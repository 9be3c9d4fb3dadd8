//! Controller for repeatable list fields.
//!
//! [`ListFieldController`] owns the bookkeeping a repeatable field needs
//! beyond plain value storage: stable per-row keys for UI keying (a row's
//! identity survives removals of *other* rows), a minimum-length guard, and
//! reindexing of error-map entries when a removal shifts the rows after it.

use crate::error::{EngineError, ErrorMap};
use crate::path::{FieldPath, PathSegment};
use crate::state::FormState;
use serde_json::Value;

/// Manages insertion, removal, and reindexing for one list field.
///
/// The controller does not own the list's values; it operates on the
/// [`FormState`] that does. Indices stay dense (`0..n-1`) across any
/// sequence of operations.
///
/// # Examples
///
/// ```
/// use formwork::{FieldPath, FormState, ListFieldController};
/// use serde_json::json;
///
/// let mut state = FormState::new(json!({"hobbies": [{"name": "chess"}]}));
/// let mut hobbies = ListFieldController::for_state(FieldPath::field("hobbies"), &state);
///
/// let index = hobbies.append(&mut state, json!({"name": "rowing"})).unwrap();
/// assert_eq!(index, 1);
/// assert_eq!(hobbies.len(), 2);
///
/// // Removing the last remaining row is rejected.
/// hobbies.remove(&mut state, 1).unwrap();
/// assert!(hobbies.remove(&mut state, 0).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct ListFieldController {
	path: FieldPath,
	min_items: usize,
	keys: Vec<u64>,
	next_key: u64,
}

impl ListFieldController {
	/// Create a controller for the list at `path` with the default
	/// minimum length of one entry.
	pub fn new(path: FieldPath) -> Self {
		Self {
			path,
			min_items: 1,
			keys: Vec::new(),
			next_key: 0,
		}
	}

	/// Create a controller seeded with one key per row already present in
	/// `state`.
	pub fn for_state(path: FieldPath, state: &FormState) -> Self {
		let rows = path
			.resolve(state.values())
			.and_then(Value::as_array)
			.map_or(0, Vec::len);
		let mut controller = Self::new(path);
		controller.keys = (0..rows as u64).collect();
		controller.next_key = rows as u64;
		controller
	}

	pub fn with_min_items(mut self, min_items: usize) -> Self {
		self.min_items = min_items;
		self
	}

	pub fn path(&self) -> &FieldPath {
		&self.path
	}

	/// Stable identity of each row, in display order.
	///
	/// A key is assigned once at append time and never reused, so UI layers
	/// can key rows by it instead of by index.
	pub fn keys(&self) -> &[u64] {
		&self.keys
	}

	pub fn len(&self) -> usize {
		self.keys.len()
	}

	pub fn is_empty(&self) -> bool {
		self.keys.is_empty()
	}

	/// Add `entry` at the end of the list. Returns the new row's index.
	pub fn append(&mut self, state: &mut FormState, entry: Value) -> Result<usize, EngineError> {
		let mut items = self.items(state)?.clone();
		items.push(entry);
		let index = items.len() - 1;
		state.set_field(&self.path, Value::Array(items))?;

		self.keys.push(self.next_key);
		self.next_key += 1;
		Ok(index)
	}

	/// Remove the row at `index`, shifting the rows after it down by one.
	///
	/// Rejected with [`EngineError::MinimumLengthViolation`] when the
	/// removal would shrink the list below its minimum length; the state is
	/// untouched in that case. Error-map entries for the removed row are
	/// dropped and entries for the rows after it are re-attached to their
	/// new paths.
	pub fn remove(&mut self, state: &mut FormState, index: usize) -> Result<(), EngineError> {
		let mut items = self.items(state)?.clone();
		if index >= items.len() {
			return Err(EngineError::PathNotFound(
				self.path.clone().index(index).to_string(),
			));
		}
		if items.len() <= self.min_items {
			return Err(EngineError::MinimumLengthViolation {
				index,
				min: self.min_items,
			});
		}

		items.remove(index);
		state.set_field(&self.path, Value::Array(items))?;
		self.keys.remove(index);
		self.reindex_errors(state, index);
		Ok(())
	}

	fn items<'a>(&self, state: &'a FormState) -> Result<&'a Vec<Value>, EngineError> {
		self.path
			.resolve(state.values())
			.and_then(Value::as_array)
			.ok_or_else(|| EngineError::PathNotFound(self.path.to_string()))
	}

	fn reindex_errors(&self, state: &mut FormState, removed: usize) {
		let mut rebuilt = ErrorMap::new();
		for (path, error) in state.take_errors() {
			match split_row(&path, &self.path) {
				Some((row, _)) if row == removed => {}
				Some((row, rest)) if row > removed => {
					rebuilt.insert(self.path.clone().index(row - 1).join(&rest), error);
				}
				_ => rebuilt.insert(path, error),
			}
		}
		state.set_errors(rebuilt);
	}
}

/// Split `path` into its row index under `list` and the remainder, when it
/// addresses one of the list's rows.
fn split_row(path: &FieldPath, list: &FieldPath) -> Option<(usize, FieldPath)> {
	if !path.starts_with(list) {
		return None;
	}
	let rest = &path.segments()[list.segments().len()..];
	match rest.split_first()? {
		(PathSegment::Index(row), tail) => Some((*row, FieldPath::from_segments(tail.to_vec()))),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::{ErrorCategory, FieldError};
	use rstest::rstest;
	use serde_json::json;

	fn state_with_rows(names: &[&str]) -> FormState {
		let rows: Vec<Value> = names.iter().map(|name| json!({"name": name})).collect();
		FormState::new(json!({"hobbies": rows, "firstName": ""}))
	}

	fn controller(state: &FormState) -> ListFieldController {
		ListFieldController::for_state(FieldPath::field("hobbies"), state)
	}

	#[rstest]
	fn test_append_keeps_order_and_returns_index() {
		// Arrange
		let mut state = state_with_rows(&["chess"]);
		let mut hobbies = controller(&state);

		// Act
		let index = hobbies.append(&mut state, json!({"name": "rowing"})).unwrap();

		// Assert
		assert_eq!(index, 1);
		assert_eq!(state.values()["hobbies"][0]["name"], json!("chess"));
		assert_eq!(state.values()["hobbies"][1]["name"], json!("rowing"));
	}

	#[rstest]
	fn test_remove_rejects_last_remaining_row() {
		// Arrange
		let mut state = state_with_rows(&["chess"]);
		let mut hobbies = controller(&state);
		let before = state.clone();

		// Act
		let result = hobbies.remove(&mut state, 0);

		// Assert: guard violation reported as data, state untouched
		assert!(matches!(
			result,
			Err(EngineError::MinimumLengthViolation { index: 0, min: 1 })
		));
		assert_eq!(state, before);
		assert_eq!(hobbies.len(), 1);
	}

	#[rstest]
	fn test_remove_out_of_range_is_rejected() {
		let mut state = state_with_rows(&["chess", "rowing"]);
		let mut hobbies = controller(&state);

		let result = hobbies.remove(&mut state, 5);

		assert!(matches!(result, Err(EngineError::PathNotFound(_))));
	}

	#[rstest]
	fn test_remove_shifts_following_rows_down() {
		// Arrange
		let mut state = state_with_rows(&["chess", "rowing", "piano"]);
		let mut hobbies = controller(&state);

		// Act
		hobbies.remove(&mut state, 1).unwrap();

		// Assert: dense indices, order preserved
		let rows = state.values()["hobbies"].as_array().unwrap();
		assert_eq!(rows.len(), 2);
		assert_eq!(rows[0]["name"], json!("chess"));
		assert_eq!(rows[1]["name"], json!("piano"));
	}

	#[rstest]
	fn test_row_keys_survive_removal_of_other_rows() {
		// Arrange
		let mut state = state_with_rows(&["chess", "rowing", "piano"]);
		let mut hobbies = controller(&state);
		let piano_key = hobbies.keys()[2];

		// Act
		hobbies.remove(&mut state, 0).unwrap();

		// Assert: "piano" kept its key even though its index changed
		assert_eq!(hobbies.keys()[1], piano_key);
	}

	#[rstest]
	fn test_appended_rows_never_reuse_keys() {
		let mut state = state_with_rows(&["chess", "rowing"]);
		let mut hobbies = controller(&state);
		let removed_key = hobbies.keys()[1];

		hobbies.remove(&mut state, 1).unwrap();
		hobbies.append(&mut state, json!({"name": "piano"})).unwrap();

		assert_ne!(hobbies.keys()[1], removed_key);
	}

	#[rstest]
	fn test_remove_reindexes_error_entries() {
		// Arrange: errors on rows 0 and 2, plus an unrelated field error
		let mut state = state_with_rows(&["", "chess", ""]);
		let mut hobbies = controller(&state);
		let mut errors = ErrorMap::new();
		for row in [0, 2] {
			errors.record(
				FieldPath::field("hobbies").index(row).key("name"),
				FieldError::new(ErrorCategory::Required, "Hobby name is required!"),
			);
		}
		errors.record(
			FieldPath::field("firstName"),
			FieldError::new(ErrorCategory::Required, "First name is required!"),
		);
		state.set_errors(errors);

		// Act: removing row 0 drops its error and shifts row 2's error down
		hobbies.remove(&mut state, 0).unwrap();

		// Assert
		let errors = state.errors();
		assert_eq!(errors.len(), 2);
		assert!(errors.contains(&"hobbies[1].name".parse().unwrap()));
		assert!(!errors.contains(&"hobbies[0].name".parse().unwrap()));
		assert!(!errors.contains(&"hobbies[2].name".parse().unwrap()));
		assert!(errors.contains(&FieldPath::field("firstName")));
	}

	#[rstest]
	fn test_remove_keeps_error_on_surviving_earlier_row() {
		// Arrange: error on row 0, remove row 1
		let mut state = state_with_rows(&["", "chess"]);
		let mut hobbies = controller(&state);
		let mut errors = ErrorMap::new();
		errors.record(
			"hobbies[0].name".parse().unwrap(),
			FieldError::new(ErrorCategory::Required, "Hobby name is required!"),
		);
		state.set_errors(errors);

		// Act
		hobbies.remove(&mut state, 1).unwrap();

		// Assert: untouched row keeps its error at its unchanged path
		assert!(state.errors().contains(&"hobbies[0].name".parse().unwrap()));
	}
}
