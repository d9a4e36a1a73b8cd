//! Role tables and role-based projection.
//!
//! A role is a named field-visibility profile. Each model owns a [`ModelSchema`] that maps the
//! roles it understands to a whitelist or blacklist of its serialised field names, plus the
//! schemas of its nested record fields.
//!
//! Projection walks a serialised record:
//! - the top-level schema must define the requested role, otherwise the request is forbidden
//! - nested records use their own entry for the same role, falling back to their `default`
//!   entry, and are left unfiltered when neither exists
//! - list fields are projected element by element

use crate::{ProcurementError, ProcurementResult};
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use std::str::FromStr;

/// Role names understood by procurement resources.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// Stored form without audit bookkeeping; used to diff revisions.
    Plain,
    Create,
    Edit,
    EditActive,
    EditTerminated,
    View,
    Administrator,
    /// Full stored form, including access tokens.
    Default,
    Embedded,
    Revisions,
}

impl Role {
    pub const ALL: [Role; 10] = [
        Role::Plain,
        Role::Create,
        Role::Edit,
        Role::EditActive,
        Role::EditTerminated,
        Role::View,
        Role::Administrator,
        Role::Default,
        Role::Embedded,
        Role::Revisions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Plain => "plain",
            Role::Create => "create",
            Role::Edit => "edit",
            Role::EditActive => "edit_active",
            Role::EditTerminated => "edit_terminated",
            Role::View => "view",
            Role::Administrator => "Administrator",
            Role::Default => "default",
            Role::Embedded => "embedded",
            Role::Revisions => "revisions",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ProcurementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| ProcurementError::InvalidRole(s.to_owned()))
    }
}

/// Field selection of one role.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldFilter {
    /// Only the listed fields pass.
    Whitelist(&'static [&'static str]),
    /// Every field but the listed ones passes.
    Blacklist(&'static [&'static str]),
}

impl FieldFilter {
    /// Lets every field through.
    pub const ALL: FieldFilter = FieldFilter::Blacklist(&[]);
    /// Lets nothing through.
    pub const NONE: FieldFilter = FieldFilter::Whitelist(&[]);

    pub fn allows(&self, field: &str) -> bool {
        match self {
            FieldFilter::Whitelist(fields) => fields.contains(&field),
            FieldFilter::Blacklist(fields) => !fields.contains(&field),
        }
    }
}

/// Role table of one model.
#[derive(Debug)]
pub struct ModelSchema {
    pub name: &'static str,
    pub roles: &'static [(Role, FieldFilter)],
    /// Nested record fields and their schemas.
    pub children: &'static [(&'static str, &'static ModelSchema)],
}

impl ModelSchema {
    pub fn filter(&self, role: Role) -> Option<&FieldFilter> {
        self.roles
            .iter()
            .find(|(candidate, _)| *candidate == role)
            .map(|(_, filter)| filter)
    }

    pub fn defines(&self, role: Role) -> bool {
        self.filter(role).is_some()
    }

    fn child(&self, field: &str) -> Option<&'static ModelSchema> {
        self.children
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, schema)| *schema)
    }

    /// Projects a serialised record through `role`.
    ///
    /// # Errors
    ///
    /// Returns [`ProcurementError::RoleNotDefined`] when this model has no entry for `role`.
    pub fn project(&self, document: &JsonValue, role: Role) -> ProcurementResult<JsonValue> {
        let filter = self.filter(role).ok_or(ProcurementError::RoleNotDefined {
            model: self.name,
            role,
        })?;
        Ok(self.project_with(document, role, Some(filter)))
    }

    fn project_nested(&self, document: &JsonValue, role: Role) -> JsonValue {
        let filter = self.filter(role).or_else(|| self.filter(Role::Default));
        self.project_with(document, role, filter)
    }

    fn project_with(
        &self,
        document: &JsonValue,
        role: Role,
        filter: Option<&FieldFilter>,
    ) -> JsonValue {
        let JsonValue::Object(fields) = document else {
            return document.clone();
        };

        let mut projected = Map::new();
        for (key, value) in fields {
            if filter.is_some_and(|f| !f.allows(key)) {
                continue;
            }
            let value = match self.child(key) {
                Some(schema) => match value {
                    JsonValue::Array(items) => JsonValue::Array(
                        items
                            .iter()
                            .map(|item| schema.project_nested(item, role))
                            .collect(),
                    ),
                    other => schema.project_nested(other, role),
                },
                None => value.clone(),
            };
            projected.insert(key.clone(), value);
        }
        JsonValue::Object(projected)
    }
}
