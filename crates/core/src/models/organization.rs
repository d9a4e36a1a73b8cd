//! Parties to a contract: suppliers, the procuring entity and their contact points.

use contracting_types::EmailAddress;
use procurement::{Address, FieldPath, Identifier, Validate, ValidationErrors};
use serde::{Deserialize, Serialize};

/// Person or office to contact at an organization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContactPoint {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_en: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_ru: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<EmailAddress>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telephone: Option<String>,

    #[serde(rename = "faxNumber", default, skip_serializing_if = "Option::is_none")]
    pub fax_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(rename = "availableLanguage", default, skip_serializing_if = "Option::is_none")]
    pub available_language: Option<String>,
}

impl Validate for ContactPoint {
    fn validate_at(&self, path: &FieldPath, errors: &mut ValidationErrors) {
        let has_phone = self
            .telephone
            .as_deref()
            .is_some_and(|phone| !phone.is_empty());
        if self.email.is_none() && !has_phone {
            errors.add(&path.field("email"), "telephone or email should be present");
        }
    }
}

/// A supplier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Organization {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_en: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_ru: Option<String>,

    pub identifier: Identifier,

    #[serde(rename = "additionalIdentifiers", default, skip_serializing_if = "Vec::is_empty")]
    pub additional_identifiers: Vec<Identifier>,

    pub address: Address,

    #[serde(rename = "contactPoint")]
    pub contact_point: ContactPoint,

    #[serde(
        rename = "additionalContactPoints",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub additional_contact_points: Vec<ContactPoint>,
}

impl Validate for Organization {
    fn validate_at(&self, path: &FieldPath, errors: &mut ValidationErrors) {
        validate_party(
            Party {
                identifier: &self.identifier,
                additional_identifiers: &self.additional_identifiers,
                address: &self.address,
                contact_point: &self.contact_point,
                additional_contact_points: &self.additional_contact_points,
            },
            path,
            errors,
        );
    }
}

/// Category of a procuring entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcuringEntityKind {
    General,
    Special,
    Defense,
    Other,
}

/// The organization managing the procurement, which may differ from the buyer paying for or
/// using the procured items.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProcuringEntity {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_en: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_ru: Option<String>,

    pub identifier: Identifier,

    #[serde(rename = "additionalIdentifiers", default, skip_serializing_if = "Vec::is_empty")]
    pub additional_identifiers: Vec<Identifier>,

    pub address: Address,

    #[serde(rename = "contactPoint")]
    pub contact_point: ContactPoint,

    #[serde(
        rename = "additionalContactPoints",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub additional_contact_points: Vec<ContactPoint>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ProcuringEntityKind>,
}

impl Validate for ProcuringEntity {
    fn validate_at(&self, path: &FieldPath, errors: &mut ValidationErrors) {
        validate_party(
            Party {
                identifier: &self.identifier,
                additional_identifiers: &self.additional_identifiers,
                address: &self.address,
                contact_point: &self.contact_point,
                additional_contact_points: &self.additional_contact_points,
            },
            path,
            errors,
        );
    }
}

struct Party<'a> {
    identifier: &'a Identifier,
    additional_identifiers: &'a [Identifier],
    address: &'a Address,
    contact_point: &'a ContactPoint,
    additional_contact_points: &'a [ContactPoint],
}

fn validate_party(party: Party<'_>, path: &FieldPath, errors: &mut ValidationErrors) {
    party.identifier.validate_at(&path.field("identifier"), errors);
    for (idx, identifier) in party.additional_identifiers.iter().enumerate() {
        identifier.validate_at(&path.field("additionalIdentifiers").index(idx), errors);
    }
    party.address.validate_at(&path.field("address"), errors);
    party.contact_point.validate_at(&path.field("contactPoint"), errors);
    for (idx, contact) in party.additional_contact_points.iter().enumerate() {
        contact.validate_at(&path.field("additionalContactPoints").index(idx), errors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use procurement::from_document;
    use serde_json::json;

    fn supplier_json() -> serde_json::Value {
        json!({
            "name": "ДКП «Книга»",
            "identifier": {"scheme": "UA-EDR", "id": "38580144", "legalName": "ДКП «Книга»"},
            "address": {"countryName": "Україна", "locality": "м. Львів"},
            "contactPoint": {"name": "Іван Іваненко", "email": "aa@aa.com"}
        })
    }

    #[test]
    fn supplier_parses_and_validates() {
        let supplier: Organization = from_document(supplier_json()).expect("parse");
        assert!(supplier.validate().is_ok());
        assert!(supplier.additional_contact_points.is_empty());
    }

    #[test]
    fn contact_point_needs_email_or_telephone() {
        let mut doc = supplier_json();
        doc["contactPoint"] = json!({"name": "Іван"});
        let supplier: Organization = from_document(doc).expect("parse");
        let errors = supplier.validate().expect_err("no contact channel");
        assert_eq!(
            errors.messages("contactPoint.email"),
            Some(&["telephone or email should be present".to_owned()][..])
        );
    }

    #[test]
    fn telephone_alone_is_enough() {
        let mut doc = supplier_json();
        doc["contactPoint"] = json!({"name": "Іван", "telephone": "+380 (322) 91-69-30"});
        let supplier: Organization = from_document(doc).expect("parse");
        assert!(supplier.validate().is_ok());
    }

    #[test]
    fn blank_telephone_still_counts_as_present() {
        let mut doc = supplier_json();
        doc["contactPoint"] = json!({"name": "Іван", "telephone": " "});
        let supplier: Organization = from_document(doc).expect("parse");
        assert!(supplier.validate().is_ok());

        let mut doc = supplier_json();
        doc["contactPoint"] = json!({"name": "Іван", "telephone": ""});
        let supplier: Organization = from_document(doc).expect("parse");
        assert!(supplier.validate().is_err());
    }

    #[test]
    fn additional_contact_points_are_validated() {
        let mut doc = supplier_json();
        doc["additionalContactPoints"] = json!([{"name": "Second", "availableLanguage": "en"}]);
        let supplier: Organization = from_document(doc).expect("parse");
        let errors = supplier.validate().expect_err("second contact has no channel");
        assert!(errors.messages("additionalContactPoints.0.email").is_some());
    }

    #[test]
    fn malformed_email_is_rejected_while_parsing() {
        let mut doc = supplier_json();
        doc["contactPoint"]["email"] = json!("not-an-email");
        let err = from_document::<Organization>(doc).expect_err("bad email");
        assert_eq!(
            err.messages("contactPoint.email"),
            Some(&["Not a well formed email address.".to_owned()][..])
        );
    }

    #[test]
    fn supplier_rejects_kind_but_procuring_entity_accepts_it() {
        let mut doc = supplier_json();
        doc["kind"] = json!("general");
        assert!(from_document::<Organization>(doc.clone()).is_err());

        let entity: ProcuringEntity = from_document(doc).expect("procuring entity");
        assert_eq!(entity.kind, Some(ProcuringEntityKind::General));
    }
}
