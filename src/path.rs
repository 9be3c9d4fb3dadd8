//! Structural field addressing for form documents.
//!
//! A [`FieldPath`] references a single field inside a document: a top-level
//! scalar (`firstName`), a leaf of a nested record (`address.city`), or a
//! field of a list entry (`hobbies[2].name`). Paths are sequences of
//! [`PathSegment`]s and compare structurally, so they are safe to use as
//! error-map keys even while list indices shift.

use crate::error::EngineError;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// One step of a [`FieldPath`]: an object key or a list index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
	Key(String),
	Index(usize),
}

/// Structural reference to a field inside a form document.
///
/// The empty path is the document root; it is used as the slot for
/// form-level errors such as submission failures.
///
/// # Examples
///
/// ```
/// use formwork::FieldPath;
///
/// let city: FieldPath = "address.city".parse().unwrap();
/// assert_eq!(city, FieldPath::field("address").key("city"));
/// assert_eq!(city.to_string(), "address.city");
///
/// let hobby: FieldPath = "hobbies[2].name".parse().unwrap();
/// assert_eq!(hobby, FieldPath::field("hobbies").index(2).key("name"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
	/// The document root. Holds form-level (non-field) errors.
	pub fn root() -> Self {
		Self(Vec::new())
	}

	/// Create a single-segment path for a top-level field.
	///
	/// # Examples
	///
	/// ```
	/// use formwork::FieldPath;
	///
	/// let path = FieldPath::field("email");
	/// assert_eq!(path.to_string(), "email");
	/// ```
	pub fn field(name: impl Into<String>) -> Self {
		Self(vec![PathSegment::Key(name.into())])
	}

	/// Build a path from raw segments.
	pub fn from_segments(segments: Vec<PathSegment>) -> Self {
		Self(segments)
	}

	/// Append an object key segment.
	pub fn key(mut self, name: impl Into<String>) -> Self {
		self.0.push(PathSegment::Key(name.into()));
		self
	}

	/// Append a list index segment.
	pub fn index(mut self, index: usize) -> Self {
		self.0.push(PathSegment::Index(index));
		self
	}

	/// Concatenate two paths.
	///
	/// # Examples
	///
	/// ```
	/// use formwork::FieldPath;
	///
	/// let row = FieldPath::field("hobbies").index(0);
	/// let name: FieldPath = "name".parse().unwrap();
	/// assert_eq!(row.join(&name).to_string(), "hobbies[0].name");
	/// ```
	pub fn join(&self, other: &FieldPath) -> Self {
		let mut segments = self.0.clone();
		segments.extend(other.0.iter().cloned());
		Self(segments)
	}

	pub fn segments(&self) -> &[PathSegment] {
		&self.0
	}

	pub fn is_root(&self) -> bool {
		self.0.is_empty()
	}

	/// The path without its last segment, or `None` for the root.
	pub fn parent(&self) -> Option<Self> {
		if self.0.is_empty() {
			return None;
		}
		Some(Self(self.0[..self.0.len() - 1].to_vec()))
	}

	/// Whether `prefix` is a leading subsequence of this path.
	///
	/// # Examples
	///
	/// ```
	/// use formwork::FieldPath;
	///
	/// let name: FieldPath = "hobbies[1].name".parse().unwrap();
	/// assert!(name.starts_with(&FieldPath::field("hobbies")));
	/// assert!(!name.starts_with(&FieldPath::field("address")));
	/// ```
	pub fn starts_with(&self, prefix: &FieldPath) -> bool {
		self.0.len() >= prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
	}

	/// Look up the value this path references inside `document`.
	///
	/// Returns `None` when any segment is missing or addresses the wrong
	/// container kind. The root path resolves to the document itself.
	///
	/// # Examples
	///
	/// ```
	/// use formwork::FieldPath;
	/// use serde_json::json;
	///
	/// let doc = json!({"address": {"city": "Oslo"}});
	/// let city: FieldPath = "address.city".parse().unwrap();
	/// assert_eq!(city.resolve(&doc), Some(&json!("Oslo")));
	/// assert_eq!(FieldPath::field("missing").resolve(&doc), None);
	/// ```
	pub fn resolve<'a>(&self, document: &'a Value) -> Option<&'a Value> {
		let mut current = document;
		for segment in &self.0 {
			current = match segment {
				PathSegment::Key(key) => current.as_object()?.get(key)?,
				PathSegment::Index(index) => current.as_array()?.get(*index)?,
			};
		}
		Some(current)
	}

	/// Return a copy of `document` with only the value at this path replaced.
	///
	/// The operation is copy-on-write: sibling paths are never mutated and
	/// list entries keep their identity. Missing intermediate objects or
	/// array slots are an error; they are never created implicitly.
	///
	/// # Examples
	///
	/// ```
	/// use formwork::FieldPath;
	/// use serde_json::json;
	///
	/// let doc = json!({"hobbies": [{"name": "chess"}, {"name": ""}]});
	/// let path: FieldPath = "hobbies[1].name".parse().unwrap();
	///
	/// let updated = path.with_value(&doc, json!("piano")).unwrap();
	/// assert_eq!(updated["hobbies"][1]["name"], json!("piano"));
	/// // The original document and the sibling row are untouched.
	/// assert_eq!(doc["hobbies"][1]["name"], json!(""));
	/// assert_eq!(updated["hobbies"][0], doc["hobbies"][0]);
	/// ```
	pub fn with_value(&self, document: &Value, value: Value) -> Result<Value, EngineError> {
		set_at(document, &self.0, value).ok_or_else(|| EngineError::PathNotFound(self.to_string()))
	}
}

fn set_at(current: &Value, segments: &[PathSegment], value: Value) -> Option<Value> {
	let Some((head, tail)) = segments.split_first() else {
		return Some(value);
	};
	match (current, head) {
		(Value::Object(map), PathSegment::Key(key)) => {
			let replaced = set_at(map.get(key)?, tail, value)?;
			let mut map = map.clone();
			map.insert(key.clone(), replaced);
			Some(Value::Object(map))
		}
		(Value::Array(items), PathSegment::Index(index)) => {
			let replaced = set_at(items.get(*index)?, tail, value)?;
			let mut items = items.clone();
			items[*index] = replaced;
			Some(Value::Array(items))
		}
		_ => None,
	}
}

impl fmt::Display for FieldPath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (position, segment) in self.0.iter().enumerate() {
			match segment {
				PathSegment::Key(key) => {
					if position > 0 {
						f.write_str(".")?;
					}
					f.write_str(key)?;
				}
				PathSegment::Index(index) => write!(f, "[{index}]")?,
			}
		}
		Ok(())
	}
}

impl FromStr for FieldPath {
	type Err = EngineError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s.is_empty() {
			return Ok(Self::root());
		}
		let invalid = || EngineError::InvalidPath(s.to_string());

		let mut segments = Vec::new();
		for part in s.split('.') {
			let mut rest = part;
			if let Some(bracket) = rest.find('[') {
				let name = &rest[..bracket];
				if name.is_empty() {
					return Err(invalid());
				}
				segments.push(PathSegment::Key(name.to_string()));
				rest = &rest[bracket..];
				while let Some(open) = rest.strip_prefix('[') {
					let close = open.find(']').ok_or_else(invalid)?;
					let index = open[..close].parse::<usize>().map_err(|_| invalid())?;
					segments.push(PathSegment::Index(index));
					rest = &open[close + 1..];
				}
				if !rest.is_empty() {
					return Err(invalid());
				}
			} else {
				if rest.is_empty() {
					return Err(invalid());
				}
				segments.push(PathSegment::Key(rest.to_string()));
			}
		}
		Ok(Self(segments))
	}
}

// Paths serialize through their string form so error maps stay readable
// as plain JSON objects.
impl Serialize for FieldPath {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

impl<'de> Deserialize<'de> for FieldPath {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let raw = String::deserialize(deserializer)?;
		raw.parse().map_err(D::Error::custom)
	}
}
