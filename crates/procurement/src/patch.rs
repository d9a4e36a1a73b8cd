//! Data-patch merging and revision diffs.
//!
//! Clients update resources by sending a partial document. [`apply_data_patch`] merges it onto
//! the stored form:
//! - objects merge key by key (keys absent from the patch are kept)
//! - lists merge element by element and are cut to the patch's length
//! - anything else is replaced
//!
//! Every accepted change is audited with a [`Revision`] whose `changes` are JSON-patch
//! operations (RFC 6902 `add`/`remove`/`replace`) that turn the *new* state back into the
//! previous one, so history can be replayed backwards from the current record.

use crate::{ProcurementError, ProcurementResult};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// One JSON-patch operation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase", deny_unknown_fields)]
pub enum PatchOp {
    Add { path: String, value: JsonValue },
    Remove { path: String },
    Replace { path: String, value: JsonValue },
}

impl PatchOp {
    pub fn path(&self) -> &str {
        match self {
            PatchOp::Add { path, .. } | PatchOp::Remove { path } | PatchOp::Replace { path, .. } => {
                path
            }
        }
    }
}

/// Audit record of one accepted change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Revision {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub date: DateTime<FixedOffset>,
    #[serde(default)]
    pub changes: Vec<PatchOp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
}

impl Revision {
    /// Builds the revision for a transition from `previous` to `current`.
    ///
    /// Returns `None` when the two documents are equal.
    pub fn between(
        previous: &JsonValue,
        current: &JsonValue,
        author: Option<String>,
        date: DateTime<FixedOffset>,
    ) -> Option<Self> {
        let changes = make_patch(current, previous);
        if changes.is_empty() {
            return None;
        }
        Some(Self {
            author,
            date,
            changes,
            rev: None,
        })
    }
}

/// Merges `patch` onto `original`.
///
/// Returns `None` when the patch does not change anything.
pub fn apply_data_patch(original: &JsonValue, patch: &JsonValue) -> Option<JsonValue> {
    let merged = merge(original, patch);
    (merged != *original).then_some(merged)
}

fn merge(original: &JsonValue, patch: &JsonValue) -> JsonValue {
    match (original, patch) {
        (JsonValue::Object(orig), JsonValue::Object(changes)) => {
            let mut merged = orig.clone();
            for (key, value) in changes {
                let next = match orig.get(key) {
                    Some(existing) => merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), next);
            }
            JsonValue::Object(merged)
        }
        (JsonValue::Array(orig), JsonValue::Array(changes)) => JsonValue::Array(
            changes
                .iter()
                .enumerate()
                .map(|(idx, value)| match orig.get(idx) {
                    Some(existing) => merge(existing, value),
                    None => value.clone(),
                })
                .collect(),
        ),
        _ => patch.clone(),
    }
}

/// Computes the operations that turn `source` into `target`.
pub fn make_patch(source: &JsonValue, target: &JsonValue) -> Vec<PatchOp> {
    let mut ops = Vec::new();
    diff(source, target, "", &mut ops);
    ops
}

fn diff(source: &JsonValue, target: &JsonValue, path: &str, ops: &mut Vec<PatchOp>) {
    match (source, target) {
        (JsonValue::Object(src), JsonValue::Object(dst)) => {
            for (key, src_value) in src {
                let child = pointer(path, key);
                match dst.get(key) {
                    Some(dst_value) => diff(src_value, dst_value, &child, ops),
                    None => ops.push(PatchOp::Remove { path: child }),
                }
            }
            for (key, dst_value) in dst {
                if !src.contains_key(key) {
                    ops.push(PatchOp::Add {
                        path: pointer(path, key),
                        value: dst_value.clone(),
                    });
                }
            }
        }
        (JsonValue::Array(src), JsonValue::Array(dst)) => {
            let common = src.len().min(dst.len());
            for idx in 0..common {
                diff(&src[idx], &dst[idx], &pointer(path, &idx.to_string()), ops);
            }
            // Remove from the tail so earlier indexes stay valid while replaying.
            for idx in (dst.len()..src.len()).rev() {
                ops.push(PatchOp::Remove {
                    path: pointer(path, &idx.to_string()),
                });
            }
            for (idx, value) in dst.iter().enumerate().skip(src.len()) {
                ops.push(PatchOp::Add {
                    path: pointer(path, &idx.to_string()),
                    value: value.clone(),
                });
            }
        }
        _ if source == target => {}
        _ => ops.push(PatchOp::Replace {
            path: path.to_owned(),
            value: target.clone(),
        }),
    }
}

fn pointer(base: &str, token: &str) -> String {
    format!("{base}/{}", token.replace('~', "~0").replace('/', "~1"))
}

fn unescape(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

/// Applies JSON-patch operations to a document.
///
/// # Errors
///
/// Returns [`ProcurementError::InvalidPatch`] when an operation addresses a location that does
/// not exist.
pub fn apply_patch_ops(document: &JsonValue, ops: &[PatchOp]) -> ProcurementResult<JsonValue> {
    let mut result = document.clone();
    for op in ops {
        apply_op(&mut result, op)?;
    }
    Ok(result)
}

fn apply_op(document: &mut JsonValue, op: &PatchOp) -> ProcurementResult<()> {
    let path = op.path();
    if path.is_empty() {
        match op {
            PatchOp::Add { value, .. } | PatchOp::Replace { value, .. } => {
                *document = value.clone();
                return Ok(());
            }
            PatchOp::Remove { .. } => {
                return Err(ProcurementError::InvalidPatch(
                    "cannot remove the document root".into(),
                ))
            }
        }
    }

    let (parent_path, last) = path
        .rsplit_once('/')
        .ok_or_else(|| ProcurementError::InvalidPatch(format!("malformed pointer: {path}")))?;
    let last = unescape(last);
    let parent = document
        .pointer_mut(parent_path)
        .ok_or_else(|| ProcurementError::InvalidPatch(format!("missing location: {path}")))?;

    match parent {
        JsonValue::Object(fields) => apply_to_object(fields, &last, op, path),
        JsonValue::Array(items) => {
            let idx: usize = last
                .parse()
                .map_err(|_| ProcurementError::InvalidPatch(format!("bad index: {path}")))?;
            match op {
                PatchOp::Add { value, .. } if idx <= items.len() => {
                    items.insert(idx, value.clone());
                    Ok(())
                }
                PatchOp::Remove { .. } if idx < items.len() => {
                    items.remove(idx);
                    Ok(())
                }
                PatchOp::Replace { value, .. } if idx < items.len() => {
                    items[idx] = value.clone();
                    Ok(())
                }
                _ => Err(ProcurementError::InvalidPatch(format!(
                    "index out of range: {path}"
                ))),
            }
        }
        _ => Err(ProcurementError::InvalidPatch(format!(
            "parent is not a container: {path}"
        ))),
    }
}

fn apply_to_object(
    fields: &mut Map<String, JsonValue>,
    key: &str,
    op: &PatchOp,
    path: &str,
) -> ProcurementResult<()> {
    match op {
        PatchOp::Add { value, .. } => {
            fields.insert(key.to_owned(), value.clone());
            Ok(())
        }
        PatchOp::Replace { value, .. } if fields.contains_key(key) => {
            fields.insert(key.to_owned(), value.clone());
            Ok(())
        }
        PatchOp::Remove { .. } if fields.contains_key(key) => {
            fields.remove(key);
            Ok(())
        }
        _ => Err(ProcurementError::InvalidPatch(format!(
            "missing location: {path}"
        ))),
    }
}
