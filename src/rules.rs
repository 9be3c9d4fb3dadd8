//! Imperative validation as an interpreter over a declarative schema.
//!
//! A [`RuleSet`] is the flat, ordered list of independent predicate checks
//! that older hand-written validators spell out one `if` at a time. Instead
//! of duplicating the catalogue, it is compiled from a [`Schema`], so the two
//! strategies can never drift apart: same paths, same categories, same
//! messages. Every rule runs on every pass; there is no short-circuit across
//! unrelated fields.

use crate::error::ErrorMap;
use crate::path::FieldPath;
use crate::schema::{Constraint, Schema, Validator};
use serde_json::Value;

/// Where a rule's constraint is evaluated.
#[derive(Debug, Clone, PartialEq)]
enum RuleTarget {
	/// A fixed path in the document.
	Field(FieldPath),
	/// A path inside every entry of a list, expanded against the document's
	/// actual indices at validation time.
	ListElements { list: FieldPath, field: FieldPath },
}

/// One independent predicate check.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
	target: RuleTarget,
	constraint: Constraint,
}

impl Rule {
	fn apply(&self, document: &Value, errors: &mut ErrorMap) {
		match &self.target {
			RuleTarget::Field(path) => {
				let Some(scope) = scope_of(document, path) else {
					return;
				};
				if let Some(error) = self.constraint.check(path.resolve(document), Some(scope)) {
					errors.record(path.clone(), error);
				}
			}
			RuleTarget::ListElements { list, field } => {
				let Some(items) = list.resolve(document).and_then(Value::as_array) else {
					return;
				};
				for (index, item) in items.iter().enumerate() {
					let Some(scope) = scope_of(item, field) else {
						continue;
					};
					if let Some(error) = self.constraint.check(field.resolve(item), Some(scope)) {
						errors.record(list.clone().index(index).join(field), error);
					}
				}
			}
		}
	}
}

/// The object a field lives in, used for sibling lookups.
///
/// Mirrors the catalogue's descent rule: a rule under a nested parent only
/// runs while that parent value is present and is an object. Returns `None`
/// when it is not, and the rule is skipped.
fn scope_of<'a>(document: &'a Value, path: &FieldPath) -> Option<&'a Value> {
	match path.parent() {
		Some(parent) if !parent.is_root() => parent
			.resolve(document)
			.filter(|scope| scope.is_object()),
		_ => Some(document),
	}
}

/// Ordered list of predicate checks compiled from a [`Schema`].
///
/// # Examples
///
/// ```
/// use formwork::{FieldSchema, RuleSet, Schema, Validator};
/// use serde_json::json;
///
/// let schema = Schema::new()
///     .field("firstName", FieldSchema::new().required("First name is required!"));
/// let rules = RuleSet::compile(&schema);
///
/// let errors = rules.validate(&json!({"firstName": ""}));
/// assert_eq!(errors.message(&"firstName".parse().unwrap()), Some("First name is required!"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
	rules: Vec<Rule>,
}

impl RuleSet {
	/// Flatten a schema into its rule list.
	///
	/// Nested object schemas become rules at their absolute paths, skipped at
	/// validation time while their parent value is missing or not an object;
	/// list element schemas become per-element rules expanded at validation
	/// time. Lists nested inside list entries are outside the supported
	/// document shape and are not flattened.
	pub fn compile(schema: &Schema) -> Self {
		let mut rules = Vec::new();
		flatten(schema, &FieldPath::root(), &mut rules);
		Self { rules }
	}

	pub fn len(&self) -> usize {
		self.rules.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rules.is_empty()
	}
}

fn flatten(schema: &Schema, base: &FieldPath, rules: &mut Vec<Rule>) {
	for (name, field) in schema.fields() {
		let path = base.clone().key(name);
		for constraint in field.constraints() {
			rules.push(Rule {
				target: RuleTarget::Field(path.clone()),
				constraint: constraint.clone(),
			});
		}
		if let Some(nested) = field.nested_schema() {
			flatten(nested, &path, rules);
		}
		if let Some(element) = field.element_schema() {
			flatten_elements(element, &path, &FieldPath::root(), rules);
		}
	}
}

fn flatten_elements(schema: &Schema, list: &FieldPath, base: &FieldPath, rules: &mut Vec<Rule>) {
	for (name, field) in schema.fields() {
		let relative = base.clone().key(name);
		for constraint in field.constraints() {
			rules.push(Rule {
				target: RuleTarget::ListElements {
					list: list.clone(),
					field: relative.clone(),
				},
				constraint: constraint.clone(),
			});
		}
		if let Some(nested) = field.nested_schema() {
			flatten_elements(nested, list, &relative, rules);
		}
	}
}

impl Validator for RuleSet {
	fn validate(&self, document: &Value) -> ErrorMap {
		let mut errors = ErrorMap::new();
		for rule in &self.rules {
			rule.apply(document, &mut errors);
		}
		errors
	}
}
