//! The contract record.
//!
//! A contract is stored and exchanged as a JSON document. [`Contract::from_document`] parses it
//! strictly (unknown keys are rejected with their path), [`Contract::validate_at`] runs the
//! record-level rules over the whole tree and [`Contract::project`] serialises it through one of
//! the roles in [`crate::roles::CONTRACT`].

use crate::error::{ContractingError, ContractingResult};
use crate::models::{
    validate_items_uniq, Change, ChangeStatus, ContractScope, Document, Item, Organization,
    ProcuringEntity,
};
use crate::roles;
use chrono::{DateTime, FixedOffset};
use contracting_uuid::HexId;
use procurement::{FieldPath, Period, Revision, Role, Validate, ValidationErrors, Value};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

fn generated_token() -> String {
    HexId::new().to_string()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractStatus {
    #[default]
    Active,
    Terminated,
}

impl ContractStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractStatus::Active => "active",
            ContractStatus::Terminated => "terminated",
        }
    }

    /// The edit role owners get while the contract is in this status.
    pub fn edit_role(&self) -> Role {
        match self {
            ContractStatus::Active => Role::EditActive,
            ContractStatus::Terminated => Role::EditTerminated,
        }
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Marks sandbox records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Test,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Contract {
    #[serde(default)]
    pub id: HexId,

    #[serde(rename = "awardID", default, skip_serializing_if = "Option::is_none")]
    pub award_id: Option<String>,

    #[serde(rename = "contractID", default, skip_serializing_if = "Option::is_none")]
    pub contract_id: Option<String>,

    #[serde(rename = "contractNumber", default, skip_serializing_if = "Option::is_none")]
    pub contract_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_en: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_ru: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_en: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_ru: Option<String>,

    #[serde(default)]
    pub status: ContractStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    #[serde(rename = "dateSigned", default, skip_serializing_if = "Option::is_none")]
    pub date_signed: Option<DateTime<FixedOffset>>,

    #[serde(rename = "dateModified", default, skip_serializing_if = "Option::is_none")]
    pub date_modified: Option<DateTime<FixedOffset>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<Item>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppliers: Option<Vec<Organization>>,

    #[serde(rename = "procuringEntity")]
    pub procuring_entity: ProcuringEntity,

    #[serde(default)]
    pub changes: Vec<Change>,

    #[serde(default)]
    pub documents: Vec<Document>,

    /// Amount actually paid. Currency and VAT flag are exported from `value`.
    #[serde(rename = "amountPaid", default, skip_serializing_if = "Option::is_none")]
    pub amount_paid: Option<Value>,

    #[serde(rename = "terminationDetails", default, skip_serializing_if = "Option::is_none")]
    pub termination_details: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    #[serde(default = "generated_token")]
    pub owner_token: String,

    pub tender_token: String,

    pub tender_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,

    #[serde(default)]
    pub revisions: Vec<Revision>,
}

impl Contract {
    /// Parses a contract document.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationErrors`] naming the first field that does not match the schema.
    pub fn from_document(document: JsonValue) -> Result<Self, ValidationErrors> {
        procurement::from_document(document)
    }

    /// Serialises the full stored form.
    pub fn to_document(&self) -> ContractingResult<JsonValue> {
        let mut document = serde_json::to_value(self).map_err(ContractingError::Serialization)?;
        if let Some(paid) = self.exported_amount_paid() {
            let paid = serde_json::to_value(paid).map_err(ContractingError::Serialization)?;
            if let Some(fields) = document.as_object_mut() {
                fields.insert("amountPaid".into(), paid);
            }
        }
        Ok(document)
    }

    /// Serialises the contract through `role`.
    ///
    /// # Errors
    ///
    /// Returns [`ContractingError::RoleForbidden`] when the contract has no such role.
    pub fn project(&self, role: Role) -> ContractingResult<JsonValue> {
        let document = self.to_document()?;
        Ok(roles::CONTRACT.project(&document, role)?)
    }

    fn exported_amount_paid(&self) -> Option<Value> {
        let paid = self.amount_paid.as_ref()?;
        let Some(value) = self.value.as_ref() else {
            return Some(paid.clone());
        };
        Some(Value {
            amount: paid.amount,
            currency: value.currency.clone(),
            value_added_tax_included: value.value_added_tax_included,
        })
    }

    /// Runs every record-level rule of the contract tree as of `now`.
    ///
    /// # Errors
    ///
    /// Returns all failing rules keyed by field path.
    pub fn validate_at(&self, now: DateTime<FixedOffset>) -> Result<(), ValidationErrors> {
        let root = FieldPath::root();
        let mut errors = ValidationErrors::new();

        if let Some(items) = &self.items {
            let path = root.field("items");
            errors.list_size(&path, items.len(), 1, None);
            items.validate_at(&path, &mut errors);
            validate_items_uniq(items, &path, &mut errors);
        }

        if let Some(suppliers) = &self.suppliers {
            let path = root.field("suppliers");
            errors.list_size(&path, suppliers.len(), 1, Some(1));
            suppliers.validate_at(&path, &mut errors);
        }

        self.procuring_entity
            .validate_at(&root.field("procuringEntity"), &mut errors);
        self.period.validate_at(&root.field("period"), &mut errors);
        self.value.validate_at(&root.field("value"), &mut errors);
        self.amount_paid
            .validate_at(&root.field("amountPaid"), &mut errors);

        for (idx, change) in self.changes.iter().enumerate() {
            change.validate_at(now, &root.field("changes").index(idx), &mut errors);
        }

        let item_ids = self.item_ids();
        let change_ids = self.change_ids();
        let scope = ContractScope::new(now, &item_ids, &change_ids);
        for (idx, document) in self.documents.iter().enumerate() {
            document.validate_in(&scope, &root.field("documents").index(idx), &mut errors);
        }

        errors.into_result()
    }

    pub fn is_active(&self) -> bool {
        self.status == ContractStatus::Active
    }

    pub fn item_ids(&self) -> Vec<String> {
        self.items
            .iter()
            .flatten()
            .map(|item| item.id.clone())
            .collect()
    }

    pub fn change_ids(&self) -> Vec<HexId> {
        self.changes.iter().map(|change| change.id).collect()
    }

    pub fn change(&self, id: &HexId) -> Option<&Change> {
        self.changes.iter().find(|change| change.id == *id)
    }

    pub fn change_position(&self, id: &HexId) -> Option<usize> {
        self.changes.iter().position(|change| change.id == *id)
    }

    pub fn has_pending_change(&self) -> bool {
        self.changes.iter().any(Change::is_pending)
    }

    /// Latest active change other than `except`.
    pub fn last_active_change(&self, except: Option<&HexId>) -> Option<&Change> {
        self.changes
            .iter()
            .rev()
            .filter(|change| Some(&change.id) != except)
            .find(|change| change.status == ChangeStatus::Active)
    }

    /// Position of the latest version of a document.
    pub fn document_position(&self, id: &HexId) -> Option<usize> {
        self.documents.iter().rposition(|document| document.id == *id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{self, contract_json, fixed_now, ITEM_ID, OWNER_TOKEN};
    use serde_json::json;

    fn contract(document: JsonValue) -> Contract {
        Contract::from_document(document).expect("parse contract")
    }

    #[test]
    fn fixture_contract_is_valid() {
        let parsed = contract(contract_json());
        assert!(parsed.validate_at(fixed_now()).is_ok());
        assert_eq!(parsed.status, ContractStatus::Active);
        assert!(parsed.changes.is_empty());
        assert!(parsed.documents.is_empty());
        assert_eq!(parsed.owner_token, OWNER_TOKEN);
    }

    #[test]
    fn missing_tokens_and_procuring_entity_are_required() {
        for field in ["tender_token", "tender_id", "procuringEntity"] {
            let mut doc = contract_json();
            doc.as_object_mut().unwrap().remove(field);
            let err = Contract::from_document(doc).expect_err("required field");
            assert_eq!(
                err.messages(field),
                Some(&["This field is required.".to_owned()][..]),
                "{field}"
            );
        }
    }

    #[test]
    fn owner_token_defaults_to_generated_hex() {
        let mut doc = contract_json();
        doc.as_object_mut().unwrap().remove("owner_token");
        let parsed = contract(doc);
        assert!(HexId::is_canonical(&parsed.owner_token));
        assert_ne!(parsed.owner_token, OWNER_TOKEN);
    }

    #[test]
    fn rogue_field_is_rejected() {
        let mut doc = contract_json();
        doc["surprise"] = json!(true);
        let err = Contract::from_document(doc).expect_err("rogue");
        assert_eq!(err.messages("surprise"), Some(&["Rogue field".to_owned()][..]));
    }

    #[test]
    fn items_must_be_non_empty_and_unique() {
        let mut doc = contract_json();
        doc["items"] = json!([]);
        let errors = contract(doc).validate_at(fixed_now()).expect_err("empty items");
        assert_eq!(
            errors.messages("items"),
            Some(&["Please provide at least 1 item.".to_owned()][..])
        );

        let mut doc = contract_json();
        doc["items"] = json!([test_support::item_json(), test_support::item_json()]);
        let errors = contract(doc).validate_at(fixed_now()).expect_err("duplicate items");
        assert_eq!(
            errors.messages("items"),
            Some(&["Item id should be uniq for all items".to_owned()][..])
        );
    }

    #[test]
    fn exactly_one_supplier() {
        let mut doc = contract_json();
        doc["suppliers"] = json!([
            test_support::organization_json(),
            test_support::organization_json()
        ]);
        let errors = contract(doc).validate_at(fixed_now()).expect_err("two suppliers");
        assert_eq!(
            errors.messages("suppliers"),
            Some(&["Please provide no more than 1 item.".to_owned()][..])
        );
    }

    #[test]
    fn nested_errors_carry_full_paths() {
        let mut doc = contract_json();
        doc["suppliers"][0]["contactPoint"] = json!({"name": "nobody"});
        doc["value"]["currency"] = json!("HRYVNIA");
        let errors = contract(doc).validate_at(fixed_now()).expect_err("nested errors");
        assert!(errors.messages("suppliers.0.contactPoint.email").is_some());
        assert_eq!(
            errors.messages("value.currency"),
            Some(&["String value is too long.".to_owned()][..])
        );
    }

    #[test]
    fn documents_resolve_related_items_in_the_same_contract() {
        let mut doc = contract_json();
        let mut attached = test_support::document_json();
        attached["documentOf"] = json!("item");
        attached["relatedItem"] = json!(ITEM_ID);
        doc["documents"] = json!([attached]);
        assert!(contract(doc.clone()).validate_at(fixed_now()).is_ok());

        doc["documents"][0]["documentOf"] = json!("change");
        let errors = contract(doc).validate_at(fixed_now()).expect_err("no such change");
        assert_eq!(
            errors.messages("documents.0.relatedItem"),
            Some(&["relatedItem should be one of changes".to_owned()][..])
        );
    }

    #[test]
    fn amount_paid_is_exported_with_value_currency_and_tax_flag() {
        let mut doc = contract_json();
        doc["value"] = json!({"amount": 238, "currency": "USD", "valueAddedTaxIncluded": false});
        doc["amountPaid"] = json!({"amount": 100500});
        let exported = contract(doc).to_document().unwrap();
        assert_eq!(
            exported["amountPaid"],
            json!({"amount": 100500.0, "currency": "USD", "valueAddedTaxIncluded": false})
        );
    }

    #[test]
    fn amount_paid_is_omitted_until_set() {
        let exported = contract(contract_json()).to_document().unwrap();
        assert!(exported.get("amountPaid").is_none());
    }

    #[test]
    fn view_hides_access_tokens() {
        let view = contract(contract_json()).project(Role::View).unwrap();
        assert!(view.get("owner_token").is_none());
        assert!(view.get("tender_token").is_none());
        assert_eq!(view["tender_id"], test_support::TENDER_ID);
        assert_eq!(view["items"][0]["quantity"], 5);
    }

    #[test]
    fn plain_drops_audit_fields_but_keeps_tokens() {
        let mut parsed = contract(contract_json());
        parsed.date_modified = Some(fixed_now());
        let plain = parsed.project(Role::Plain).unwrap();
        assert!(plain.get("revisions").is_none());
        assert!(plain.get("dateModified").is_none());
        assert_eq!(plain["owner_token"], OWNER_TOKEN);
    }

    #[test]
    fn edit_roles_follow_status() {
        let parsed = contract(contract_json());
        assert_eq!(parsed.status.edit_role(), Role::EditActive);
        let edit = parsed.project(Role::EditActive).unwrap();
        assert!(edit.get("suppliers").is_none());
        assert!(edit["items"][0].get("classification").is_none());
        assert_eq!(edit["items"][0]["id"], ITEM_ID);

        assert_eq!(parsed.project(Role::EditTerminated).unwrap(), json!({}));
    }

    #[test]
    fn administrator_projection_is_limited() {
        let admin = contract(contract_json()).project(Role::Administrator).unwrap();
        let mut keys: Vec<&str> = admin.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["procuringEntity", "status", "suppliers"]);
        assert_eq!(admin["procuringEntity"]["kind"], "general");
    }

    #[test]
    fn undefined_role_is_forbidden() {
        let err = contract(contract_json())
            .project(Role::Revisions)
            .expect_err("no revisions role");
        assert!(matches!(err, ContractingError::RoleForbidden { .. }));
        assert_eq!(err.to_string(), "Forbidden");
    }

    #[test]
    fn last_active_change_skips_pending_and_excluded() {
        let mut parsed = contract(contract_json());
        let mut first: Change = procurement::from_document(test_support::change_json()).unwrap();
        first.status = ChangeStatus::Active;
        let second: Change = procurement::from_document(test_support::change_json()).unwrap();
        parsed.changes = vec![first.clone(), second.clone()];

        assert!(parsed.has_pending_change());
        assert_eq!(parsed.last_active_change(None).map(|c| c.id), Some(first.id));
        assert!(parsed.last_active_change(Some(&first.id)).is_none());
        assert_eq!(parsed.change_position(&second.id), Some(1));
    }
}
