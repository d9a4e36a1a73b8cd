//! Field-level validation errors and strict wire parsing.
//!
//! Records are validated as a whole: every failing field contributes a message under its
//! dotted path (for example `suppliers.0.contactPoint.email`) so a caller sees all problems of a
//! request at once, not just the first one.
//!
//! Deserialisation failures are folded into the same collection. The wire structs use
//! `#[serde(deny_unknown_fields)]`, and `serde_path_to_error` reports where parsing stopped;
//! [`from_document`] rewrites the common serde messages into the wording API clients expect
//! ("This field is required.", "Rogue field", "Value must be one of [...]").

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use std::fmt;

pub const REQUIRED: &str = "This field is required.";
pub const ROGUE_FIELD: &str = "Rogue field";
pub const TOO_SHORT: &str = "String value is too short.";
pub const TOO_LONG: &str = "String value is too long.";

/// Dotted location of a field inside a record tree.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Returns the path of the named child field.
    pub fn field(&self, name: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.to_owned());
        Self(segments)
    }

    /// Returns the path of the list element at `index`.
    pub fn index(&self, index: usize) -> Self {
        self.field(&index.to_string())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    fn from_serde_path(path: &serde_path_to_error::Path) -> Self {
        use serde_path_to_error::Segment;

        let segments = path
            .iter()
            .filter_map(|segment| match segment {
                Segment::Seq { index } => Some(index.to_string()),
                Segment::Map { key } => Some(key.clone()),
                Segment::Enum { variant } => Some(variant.clone()),
                Segment::Unknown => None,
            })
            .collect();
        Self(segments)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        f.write_str(&self.0.join("."))
    }
}

/// One entry of the error list returned to API clients.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ErrorEntry {
    pub location: String,
    pub name: String,
    pub description: JsonValue,
}

/// Collection of validation messages keyed by field path.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValidationErrors {
    errors: BTreeMap<FieldPath, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a collection holding a single message.
    pub fn single(path: &FieldPath, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(path, message);
        errors
    }

    pub fn add(&mut self, path: &FieldPath, message: impl Into<String>) {
        let message = message.into();
        let messages = self.errors.entry(path.clone()).or_default();
        if !messages.contains(&message) {
            messages.push(message);
        }
    }

    /// Records "This field is required." when `value` is `None`.
    ///
    /// Returns `true` when the value is present.
    pub fn require<T>(&mut self, path: &FieldPath, value: Option<&T>) -> bool {
        if value.is_none() {
            self.add(path, REQUIRED);
            return false;
        }
        true
    }

    /// Records the list-size messages for a list constrained to `min..=max` entries.
    pub fn list_size(&mut self, path: &FieldPath, len: usize, min: usize, max: Option<usize>) {
        if len < min {
            let noun = if min == 1 { "item" } else { "items" };
            self.add(path, format!("Please provide at least {min} {noun}."));
        }
        if let Some(max) = max {
            if len > max {
                let noun = if max == 1 { "item" } else { "items" };
                self.add(path, format!("Please provide no more than {max} {noun}."));
            }
        }
    }

    /// Records "String value is too short." for an empty string.
    pub fn min_length(&mut self, path: &FieldPath, value: &str, min: usize) {
        if value.chars().count() < min {
            self.add(path, TOO_SHORT);
        }
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (path, messages) in other.errors {
            for message in messages {
                self.add(&path, message);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns the messages recorded at a dotted path such as `items.0.id`.
    pub fn messages(&self, dotted: &str) -> Option<&[String]> {
        self.errors
            .iter()
            .find(|(path, _)| path.to_string() == dotted)
            .map(|(_, messages)| messages.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldPath, &[String])> {
        self.errors
            .iter()
            .map(|(path, messages)| (path, messages.as_slice()))
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Renders the errors grouped by top-level field.
    ///
    /// Messages on a top-level field become a list; messages deeper in the tree become a
    /// nested object keyed by the remaining path segments, e.g.
    /// `{"name": "items", "description": {"0": {"id": ["..."]}}}`.
    pub fn to_error_list(&self) -> Vec<ErrorEntry> {
        let mut direct: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut nested: BTreeMap<String, Map<String, JsonValue>> = BTreeMap::new();

        for (path, messages) in &self.errors {
            let (name, rest) = match path.segments().split_first() {
                Some((head, rest)) => (head.clone(), rest),
                None => ("data".to_owned(), &[][..]),
            };
            if rest.is_empty() {
                direct.entry(name).or_default().extend(messages.iter().cloned());
            } else {
                insert_nested(nested.entry(name).or_default(), rest, messages);
            }
        }

        let mut entries: Vec<ErrorEntry> = direct
            .into_iter()
            .map(|(name, messages)| ErrorEntry {
                location: "body".into(),
                name,
                description: JsonValue::from(messages),
            })
            .collect();
        entries.extend(nested.into_iter().map(|(name, tree)| ErrorEntry {
            location: "body".into(),
            name,
            description: JsonValue::Object(tree),
        }));
        entries
    }
}

fn insert_nested(tree: &mut Map<String, JsonValue>, segments: &[String], messages: &[String]) {
    let Some((head, rest)) = segments.split_first() else {
        return;
    };
    if rest.is_empty() {
        let slot = tree
            .entry(head.clone())
            .or_insert_with(|| JsonValue::Array(Vec::new()));
        if let JsonValue::Array(list) = slot {
            list.extend(messages.iter().cloned().map(JsonValue::String));
        }
        return;
    }
    let slot = tree
        .entry(head.clone())
        .or_insert_with(|| JsonValue::Object(Map::new()));
    if !slot.is_object() {
        *slot = JsonValue::Object(Map::new());
    }
    if let JsonValue::Object(child) = slot {
        insert_nested(child, rest, messages);
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .errors
            .iter()
            .map(|(path, messages)| format!("{path}: {}", messages.join(" ")))
            .collect();
        f.write_str(&rendered.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Field-level validation of a record after it has been parsed.
///
/// Implementations add every failing rule to `errors` under paths derived from `path`.
pub trait Validate {
    fn validate_at(&self, path: &FieldPath, errors: &mut ValidationErrors);

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.validate_at(&FieldPath::root(), &mut errors);
        errors.into_result()
    }
}

impl<T: Validate> Validate for Option<T> {
    fn validate_at(&self, path: &FieldPath, errors: &mut ValidationErrors) {
        if let Some(inner) = self {
            inner.validate_at(path, errors);
        }
    }
}

impl<T: Validate> Validate for Vec<T> {
    fn validate_at(&self, path: &FieldPath, errors: &mut ValidationErrors) {
        for (idx, item) in self.iter().enumerate() {
            item.validate_at(&path.index(idx), errors);
        }
    }
}

/// Parses a JSON document into a strict wire struct.
///
/// # Errors
///
/// Returns [`ValidationErrors`] holding one message at the failing field's path when the
/// document does not match the schema.
pub fn from_document<T: DeserializeOwned>(document: JsonValue) -> Result<T, ValidationErrors> {
    match serde_path_to_error::deserialize::<_, T>(document) {
        Ok(parsed) => Ok(parsed),
        Err(err) => {
            let path = FieldPath::from_serde_path(err.path());
            let source = err.into_inner().to_string();
            let (path, message) = describe_wire_error(path, &source);
            Err(ValidationErrors::single(&path, message))
        }
    }
}

/// Maps a serde error message to the client-facing wording and the field it concerns.
fn describe_wire_error(path: FieldPath, message: &str) -> (FieldPath, String) {
    let quoted = backticked(message);

    if message.starts_with("missing field") {
        if let Some(field) = quoted.first() {
            return (path.field(field), REQUIRED.to_owned());
        }
    }

    if message.starts_with("unknown field") {
        if let Some(field) = quoted.first() {
            let path = if path.last() == Some(*field) {
                path
            } else {
                path.field(field)
            };
            return (path, ROGUE_FIELD.to_owned());
        }
    }

    if message.starts_with("unknown variant") && quoted.len() > 1 {
        let choices: Vec<String> = quoted[1..].iter().map(|c| format!("'{c}'")).collect();
        return (path, format!("Value must be one of [{}].", choices.join(", ")));
    }

    (path, message.to_owned())
}

fn backticked(message: &str) -> Vec<&str> {
    message.split('`').skip(1).step_by(2).collect()
}
