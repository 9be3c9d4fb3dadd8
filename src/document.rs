//! The registration document and its canonical rule catalogue.
//!
//! [`Registration`] is the concrete document shape this engine is exercised
//! against: scalar fields, one nested address record, a repeatable hobbies
//! list, and a boolean-gated conditional referral field. The struct is the
//! typed view; form state holds its JSON projection so fields can be
//! addressed generically by [`FieldPath`](crate::FieldPath).

use crate::error::EngineError;
use crate::schema::{FieldSchema, Schema};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Pattern accepted for the `email` field: something, an `@`, something.
pub const EMAIL_PATTERN: &str = r"^\S+@\S+$";

/// Self-declared gender. An unanswered field is `None` and serializes as the
/// empty string, matching the select widget's placeholder value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
	Male,
	Female,
	Other,
}

impl Gender {
	pub fn as_str(&self) -> &'static str {
		match self {
			Gender::Male => "male",
			Gender::Female => "female",
			Gender::Other => "other",
		}
	}
}

/// Nested address record; each leaf is independently required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
	pub city: String,
	pub state: String,
}

/// One entry of the repeatable hobbies list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hobby {
	pub name: String,
}

impl Hobby {
	pub fn new(name: impl Into<String>) -> Self {
		Self { name: name.into() }
	}
}

/// The document being edited by a form session.
///
/// # Examples
///
/// ```
/// use formwork::Registration;
///
/// let document = Registration::default();
/// assert_eq!(document.age, 18.0);
/// assert_eq!(document.hobbies.len(), 1);
/// assert!(!document.subscribe);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
	pub first_name: String,
	pub last_name: String,
	pub email: String,
	/// Any number while unvalidated; must be at least 18 to pass validation.
	pub age: f64,
	#[serde(with = "gender_or_empty", default)]
	pub gender: Option<Gender>,
	pub address: Address,
	/// Ordered and order-preserving; validation requires at least one entry.
	pub hobbies: Vec<Hobby>,
	/// Always populated; cleared input falls back to today.
	pub start_date: NaiveDate,
	pub subscribe: bool,
	/// Required only while `subscribe` is true.
	pub referral: String,
}

impl Default for Registration {
	fn default() -> Self {
		Self {
			first_name: String::new(),
			last_name: String::new(),
			email: String::new(),
			age: 18.0,
			gender: None,
			address: Address::default(),
			hobbies: vec![Hobby::default()],
			start_date: today(),
			subscribe: false,
			referral: String::new(),
		}
	}
}

impl Registration {
	/// The canonical rule catalogue for this document.
	///
	/// Written down once, declaratively; the imperative strategy is compiled
	/// from this same schema via [`RuleSet::compile`](crate::RuleSet::compile).
	///
	/// # Examples
	///
	/// ```
	/// use formwork::Registration;
	///
	/// let errors = Registration::schema().validate(&Registration::default().to_value().unwrap());
	/// // The default document is blank, so most required fields fail.
	/// assert!(!errors.is_empty());
	/// ```
	pub fn schema() -> Schema {
		Schema::new()
			.field(
				"firstName",
				FieldSchema::new().required("First name is required!"),
			)
			.field(
				"lastName",
				FieldSchema::new().required("Last name is required!"),
			)
			.field(
				"email",
				FieldSchema::new().pattern(EMAIL_PATTERN, "Invalid email address!"),
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

	/// JSON projection used by form state for path-addressed mutation.
	pub fn to_value(&self) -> Result<Value, EngineError> {
		Ok(serde_json::to_value(self)?)
	}

	/// Rebuild the typed document from its JSON projection.
	///
	/// Applies the same input coercions the schema applies: a numeric string
	/// in `age` is accepted, matching number-input widgets that report text.
	pub fn from_value(value: &Value) -> Result<Self, EngineError> {
		let mut value = value.clone();
		if let Some(raw) = value.get("age").and_then(Value::as_str)
			&& let Ok(age) = raw.trim().parse::<f64>()
		{
			value["age"] = json!(age);
		}
		Ok(serde_json::from_value(value)?)
	}
}

/// Today in the local timezone, the fallback for a cleared start date.
pub fn today() -> NaiveDate {
	chrono::Local::now().date_naive()
}

/// Serializes `None` as `""` and reads `""`/null back as `None`, so the JSON
/// projection mirrors an unanswered select widget.
mod gender_or_empty {
	use super::Gender;
	use serde::de::Error as _;
	use serde::{Deserialize, Deserializer, Serializer};

	pub fn serialize<S: Serializer>(value: &Option<Gender>, serializer: S) -> Result<S::Ok, S::Error> {
		match value {
			Some(gender) => serializer.serialize_str(gender.as_str()),
			None => serializer.serialize_str(""),
		}
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Gender>, D::Error> {
		let raw = Option::<String>::deserialize(deserializer)?;
		match raw.as_deref() {
			None | Some("") => Ok(None),
			Some("male") => Ok(Some(Gender::Male)),
			Some("female") => Ok(Some(Gender::Female)),
			Some("other") => Ok(Some(Gender::Other)),
			Some(other) => Err(D::Error::custom(format!("unknown gender '{other}'"))),
		}
	}
}
