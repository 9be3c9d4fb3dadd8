//! Declarative validation schemas.
//!
//! A [`Schema`] is the single place the rule catalogue for a document is
//! written down: per-field constraint descriptors plus nested-object and
//! list-element sub-schemas. It is plain serializable data, so the same
//! catalogue can be evaluated here, shipped to a client, or compiled into an
//! imperative [`RuleSet`](crate::rules::RuleSet) — every strategy interprets
//! the same descriptors and therefore agrees on the outcome.

use crate::error::{ErrorCategory, ErrorMap, FieldError};
use crate::path::FieldPath;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{LazyLock, Mutex, PoisonError};
use tracing::warn;

/// A validation strategy: evaluates a document to an error map.
///
/// Implementations must be pure and idempotent; given the same document they
/// return the same map. An empty map is the sole success signal.
pub trait Validator: Send + Sync {
	fn validate(&self, document: &Value) -> ErrorMap;
}

/// One constraint descriptor attached to a field.
///
/// Each variant carries the message reported on failure. Constraints are
/// checked in declaration order and the first failure per field wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Constraint {
	/// The value must be present and non-blank.
	Required { message: String },
	/// A string value must have at least `min` characters.
	MinLength { min: usize, message: String },
	/// A numeric value must be at least `min`. Numeric strings are coerced.
	Min { min: f64, message: String },
	/// A string value must match the regex `pattern`.
	Pattern { pattern: String, message: String },
	/// A string value must be one of `values`.
	OneOf { values: Vec<String>, message: String },
	/// A list value must contain at least `min` entries.
	MinItems { min: usize, message: String },
	/// The value is required only while the sibling `field` equals `equals`.
	RequiredIf {
		field: String,
		equals: Value,
		message: String,
	},
}

impl Constraint {
	/// Category reported when this constraint fails.
	pub fn category(&self) -> ErrorCategory {
		match self {
			Constraint::Required { .. } | Constraint::OneOf { .. } => ErrorCategory::Required,
			Constraint::MinLength { .. } | Constraint::Pattern { .. } => ErrorCategory::Format,
			Constraint::Min { .. } => ErrorCategory::Range,
			Constraint::MinItems { .. } => ErrorCategory::Length,
			Constraint::RequiredIf { .. } => ErrorCategory::Conditional,
		}
	}

	/// Check `value` against this constraint.
	///
	/// `scope` is the object the field lives in; conditional constraints use
	/// it to read sibling values, re-evaluated on every pass and never
	/// cached. Returns the failure to report, or `None` when the constraint
	/// holds.
	pub(crate) fn check(&self, value: Option<&Value>, scope: Option<&Value>) -> Option<FieldError> {
		let failed = match self {
			Constraint::Required { .. } => is_blank(value),
			Constraint::MinLength { min, .. } => {
				!matches!(text(value), Some(s) if s.chars().count() >= *min)
			}
			Constraint::Min { min, .. } => !matches!(number(value), Some(n) if n >= *min),
			Constraint::Pattern { pattern, .. } => {
				!matches!(text(value), Some(s) if pattern_matches(pattern, s))
			}
			Constraint::OneOf { values, .. } => {
				!matches!(text(value), Some(s) if values.iter().any(|v| v == s))
			}
			Constraint::MinItems { min, .. } => {
				!matches!(value.and_then(Value::as_array), Some(items) if items.len() >= *min)
			}
			Constraint::RequiredIf { field, equals, .. } => {
				let peer = scope.and_then(|s| s.get(field));
				peer == Some(equals) && is_blank(value)
			}
		};
		failed.then(|| FieldError::new(self.category(), self.message()))
	}

	fn message(&self) -> &str {
		match self {
			Constraint::Required { message }
			| Constraint::MinLength { message, .. }
			| Constraint::Min { message, .. }
			| Constraint::Pattern { message, .. }
			| Constraint::OneOf { message, .. }
			| Constraint::MinItems { message, .. }
			| Constraint::RequiredIf { message, .. } => message,
		}
	}
}

/// Missing, null, and blank strings all count as absent input.
fn is_blank(value: Option<&Value>) -> bool {
	match value {
		None | Some(Value::Null) => true,
		Some(Value::String(s)) => s.trim().is_empty(),
		Some(_) => false,
	}
}

fn text(value: Option<&Value>) -> Option<&str> {
	value?.as_str()
}

/// Numeric coercion: accepts JSON numbers and numeric strings.
fn number(value: Option<&Value>) -> Option<f64> {
	match value? {
		Value::Number(n) => n.as_f64(),
		Value::String(s) => s.trim().parse().ok(),
		_ => None,
	}
}

// Descriptors keep patterns as plain strings so schemas stay serializable;
// each distinct pattern is compiled once and cached. A pattern that fails to
// compile is logged and never matches.
static PATTERN_CACHE: LazyLock<Mutex<HashMap<String, Option<Regex>>>> =
	LazyLock::new(|| Mutex::new(HashMap::new()));

fn pattern_matches(pattern: &str, value: &str) -> bool {
	let mut cache = PATTERN_CACHE
		.lock()
		.unwrap_or_else(PoisonError::into_inner);
	let compiled = cache
		.entry(pattern.to_string())
		.or_insert_with(|| match Regex::new(pattern) {
			Ok(regex) => Some(regex),
			Err(error) => {
				warn!(pattern, %error, "pattern failed to compile, it will never match");
				None
			}
		});
	compiled.as_ref().is_some_and(|regex| regex.is_match(value))
}

/// Constraints and sub-schemas for a single field.
///
/// Built with the `with`-style methods; each takes the message reported when
/// the constraint fails.
///
/// # Examples
///
/// ```
/// use formwork::{FieldSchema, Schema};
/// use serde_json::json;
///
/// let schema = Schema::new()
///     .field("email", FieldSchema::new().pattern(r"^\S+@\S+$", "Invalid email address!"))
///     .field("age", FieldSchema::new().min(18.0, "You must be at least 18 years old!"));
///
/// let errors = schema.validate(&json!({"email": "nope", "age": 21}));
/// assert_eq!(errors.len(), 1);
/// assert!(errors.contains(&"email".parse().unwrap()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	constraints: Vec<Constraint>,
	/// Schema applied to each entry of a list value.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	element: Option<Box<Schema>>,
	/// Schema applied to the leaves of a nested object value.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	fields: Option<Box<Schema>>,
}

impl FieldSchema {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn required(mut self, message: impl Into<String>) -> Self {
		self.constraints.push(Constraint::Required {
			message: message.into(),
		});
		self
	}

	pub fn min_length(mut self, min: usize, message: impl Into<String>) -> Self {
		self.constraints.push(Constraint::MinLength {
			min,
			message: message.into(),
		});
		self
	}

	pub fn min(mut self, min: f64, message: impl Into<String>) -> Self {
		self.constraints.push(Constraint::Min {
			min,
			message: message.into(),
		});
		self
	}

	pub fn pattern(mut self, pattern: impl Into<String>, message: impl Into<String>) -> Self {
		self.constraints.push(Constraint::Pattern {
			pattern: pattern.into(),
			message: message.into(),
		});
		self
	}

	pub fn one_of<I, S>(mut self, values: I, message: impl Into<String>) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.constraints.push(Constraint::OneOf {
			values: values.into_iter().map(Into::into).collect(),
			message: message.into(),
		});
		self
	}

	pub fn min_items(mut self, min: usize, message: impl Into<String>) -> Self {
		self.constraints.push(Constraint::MinItems {
			min,
			message: message.into(),
		});
		self
	}

	/// Require this field only while the sibling `field` equals `equals`.
	pub fn required_if(
		mut self,
		field: impl Into<String>,
		equals: Value,
		message: impl Into<String>,
	) -> Self {
		self.constraints.push(Constraint::RequiredIf {
			field: field.into(),
			equals,
			message: message.into(),
		});
		self
	}

	/// Validate each entry of a list value against `schema`.
	pub fn element(mut self, schema: Schema) -> Self {
		self.element = Some(Box::new(schema));
		self
	}

	/// Validate the leaves of a nested object value against `schema`.
	pub fn nested(mut self, schema: Schema) -> Self {
		self.fields = Some(Box::new(schema));
		self
	}

	pub fn constraints(&self) -> &[Constraint] {
		&self.constraints
	}

	pub(crate) fn element_schema(&self) -> Option<&Schema> {
		self.element.as_deref()
	}

	pub(crate) fn nested_schema(&self) -> Option<&Schema> {
		self.fields.as_deref()
	}
}

/// Declarative rule catalogue for a document shape.
///
/// Evaluated as a single pass over the document: every field's constraints
/// run on every pass (no short-circuit across unrelated fields), so one pass
/// can surface multiple independent errors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
	fields: BTreeMap<String, FieldSchema>,
}

impl Schema {
	pub fn new() -> Self {
		Self::default()
	}

	/// Attach (or replace) the schema for a named field.
	pub fn field(mut self, name: impl Into<String>, field: FieldSchema) -> Self {
		self.fields.insert(name.into(), field);
		self
	}

	pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSchema)> {
		self.fields.iter().map(|(name, field)| (name.as_str(), field))
	}

	/// Evaluate the whole catalogue against `document`.
	///
	/// # Examples
	///
	/// ```
	/// use formwork::{FieldSchema, Schema};
	/// use serde_json::json;
	///
	/// let schema = Schema::new()
	///     .field("firstName", FieldSchema::new().required("First name is required!"));
	///
	/// assert!(schema.validate(&json!({"firstName": "Ada"})).is_empty());
	/// let errors = schema.validate(&json!({"firstName": ""}));
	/// assert_eq!(errors.message(&"firstName".parse().unwrap()), Some("First name is required!"));
	/// ```
	pub fn validate(&self, document: &Value) -> ErrorMap {
		let mut errors = ErrorMap::new();
		self.apply(&FieldPath::root(), document, &mut errors);
		errors
	}

	pub(crate) fn apply(&self, base: &FieldPath, scope: &Value, errors: &mut ErrorMap) {
		for (name, field) in &self.fields {
			let path = base.clone().key(name);
			let value = scope.get(name);

			for constraint in &field.constraints {
				if let Some(error) = constraint.check(value, Some(scope)) {
					errors.record(path.clone(), error);
					break;
				}
			}

			if let Some(nested) = field.nested_schema()
				&& let Some(child) = value
				&& child.is_object()
			{
				nested.apply(&path, child, errors);
			}

			if let Some(element) = field.element_schema()
				&& let Some(items) = value.and_then(Value::as_array)
			{
				for (index, item) in items.iter().enumerate() {
					element.apply(&path.clone().index(index), item, errors);
				}
			}
		}
	}
}

impl Validator for Schema {
	fn validate(&self, document: &Value) -> ErrorMap {
		Schema::validate(self, document)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	fn sample() -> Schema {
		Schema::new()
			.field("firstName", FieldSchema::new().required("First name is required!"))
			.field(
				"email",
				FieldSchema::new().pattern(r"^\S+@\S+$", "Invalid email address!"),
			)
			.field(
				"age",
				FieldSchema::new().min(18.0, "You must be at least 18 years old!"),
			)
			.field(
				"gender",
				FieldSchema::new().one_of(["male", "female", "other"], "Gender is required!"),
			)
			.field(
				"address",
				FieldSchema::new().nested(
					Schema::new()
						.field("city", FieldSchema::new().required("City is required!"))
						.field("state", FieldSchema::new().required("State is required!")),
				),
			)
			.field(
				"hobbies",
				FieldSchema::new()
					.min_items(1, "At least one hobby is required!")
					.element(
						Schema::new()
							.field("name", FieldSchema::new().required("Hobby name is required!")),
					),
			)
			.field(
				"referral",
				FieldSchema::new().required_if(
					"subscribe",
					json!(true),
					"Referral source is required if you're subscribing to our newsletter",
				),
			)
	}

	fn valid_document() -> Value {
		json!({
			"firstName": "Ada",
			"email": "ada@example.com",
			"age": 36,
			"gender": "female",
			"address": {"city": "London", "state": "LDN"},
			"hobbies": [{"name": "mathematics"}],
			"subscribe": false,
			"referral": "",
		})
	}

	#[rstest]
	fn test_valid_document_produces_empty_map() {
		// Arrange
		let schema = sample();

		// Act
		let errors = schema.validate(&valid_document());

		// Assert
		assert!(errors.is_empty());
	}

	#[rstest]
	fn test_single_pass_surfaces_independent_errors() {
		// Arrange
		let schema = sample();
		let mut doc = valid_document();
		doc["firstName"] = json!("");
		doc["age"] = json!(16);

		// Act
		let errors = schema.validate(&doc);

		// Assert: both unrelated fields fail in the same pass
		assert_eq!(errors.len(), 2);
		assert_eq!(
			errors.get(&"firstName".parse().unwrap()).unwrap().category(),
			ErrorCategory::Required
		);
		assert_eq!(
			errors.get(&"age".parse().unwrap()).unwrap().category(),
			ErrorCategory::Range
		);
	}

	#[rstest]
	#[case(json!("not-an-email"))]
	#[case(json!("missing at sign"))]
	#[case(json!(""))]
	fn test_pattern_failures(#[case] email: Value) {
		let schema = sample();
		let mut doc = valid_document();
		doc["email"] = email;

		let errors = schema.validate(&doc);

		assert_eq!(
			errors.message(&"email".parse().unwrap()),
			Some("Invalid email address!")
		);
	}

	#[rstest]
	fn test_unparseable_pattern_never_matches() {
		// Arrange
		let schema = Schema::new().field(
			"code",
			FieldSchema::new().pattern("([unclosed", "Invalid code!"),
		);

		// Act: checked twice, the cached compile failure is stable
		let first = schema.validate(&json!({"code": "anything"}));
		let second = schema.validate(&json!({"code": "anything"}));

		// Assert
		assert_eq!(first.message(&"code".parse().unwrap()), Some("Invalid code!"));
		assert_eq!(first, second);
	}

	#[rstest]
	fn test_min_coerces_numeric_strings() {
		let schema = sample();
		let mut doc = valid_document();

		doc["age"] = json!("25");
		assert!(schema.validate(&doc).is_empty());

		doc["age"] = json!("17");
		assert!(schema.validate(&doc).contains(&"age".parse().unwrap()));

		doc["age"] = json!("not a number");
		assert!(schema.validate(&doc).contains(&"age".parse().unwrap()));
	}

	#[rstest]
	fn test_nested_leaves_are_independent() {
		let schema = sample();
		let mut doc = valid_document();
		doc["address"]["city"] = json!("");

		let errors = schema.validate(&doc);

		assert_eq!(
			errors.message(&"address.city".parse().unwrap()),
			Some("City is required!")
		);
		assert!(!errors.contains(&"address.state".parse().unwrap()));
	}

	#[rstest]
	fn test_list_errors_carry_row_indices() {
		let schema = sample();
		let mut doc = valid_document();
		doc["hobbies"] = json!([{"name": "chess"}, {"name": ""}, {"name": "rowing"}]);

		let errors = schema.validate(&doc);

		assert_eq!(errors.len(), 1);
		assert_eq!(
			errors.message(&"hobbies[1].name".parse().unwrap()),
			Some("Hobby name is required!")
		);
	}

	#[rstest]
	fn test_empty_list_reports_length_violation() {
		let schema = sample();
		let mut doc = valid_document();
		doc["hobbies"] = json!([]);

		let errors = schema.validate(&doc);

		let error = errors.get(&"hobbies".parse().unwrap()).unwrap();
		assert_eq!(error.category(), ErrorCategory::Length);
		assert_eq!(error.message(), "At least one hobby is required!");
	}

	#[rstest]
	#[case(json!(true), json!(""), true)]
	#[case(json!(true), json!("a friend"), false)]
	#[case(json!(false), json!(""), false)]
	fn test_conditional_requirement_follows_sibling(
		#[case] subscribe: Value,
		#[case] referral: Value,
		#[case] expect_error: bool,
	) {
		// Arrange
		let schema = sample();
		let mut doc = valid_document();
		doc["subscribe"] = subscribe;
		doc["referral"] = referral;

		// Act
		let errors = schema.validate(&doc);

		// Assert
		assert_eq!(errors.contains(&"referral".parse().unwrap()), expect_error);
	}

	#[rstest]
	fn test_first_failing_constraint_wins() {
		// Arrange: required runs before pattern for the same field
		let schema = Schema::new().field(
			"email",
			FieldSchema::new()
				.required("Email is required!")
				.pattern(r"^\S+@\S+$", "Invalid email address!"),
		);

		// Act
		let errors = schema.validate(&json!({"email": ""}));

		// Assert
		let path: FieldPath = "email".parse().unwrap();
		assert_eq!(errors.message(&path), Some("Email is required!"));
		assert_eq!(errors.get(&path).unwrap().category(), ErrorCategory::Required);
	}

	#[rstest]
	fn test_validation_is_idempotent() {
		let schema = sample();
		let mut doc = valid_document();
		doc["firstName"] = json!("");
		doc["subscribe"] = json!(true);

		let first = schema.validate(&doc);
		let second = schema.validate(&doc);

		assert_eq!(first, second);
	}

	#[rstest]
	fn test_schema_round_trips_through_serde() {
		let schema = sample();

		let json = serde_json::to_string(&schema).unwrap();
		let back: Schema = serde_json::from_str(&json).unwrap();

		assert_eq!(back, schema);
		assert_eq!(back.validate(&valid_document()), schema.validate(&valid_document()));
	}
}
