//! Procured items.

use contracting_uuid::HexId;
use procurement::{
    Address, Classification, FieldPath, Location, Period, Unit, Validate, ValidationErrors,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Classification schemes accepted for an item's main classification.
pub const ITEM_CLASSIFICATION_SCHEMES: [&str; 2] = ["CPV", "ДК021"];

fn generated_item_id() -> String {
    HexId::new().to_string()
}

/// A good, service or work covered by the contract.
///
/// Classification code tables are not checked here: contracts inherit items from a tender
/// whose codes were already validated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Item {
    #[serde(default = "generated_item_id")]
    pub id: String,

    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_en: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_ru: Option<String>,

    pub classification: Classification,

    #[serde(
        rename = "additionalClassifications",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub additional_classifications: Vec<Classification>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<Unit>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u64>,

    #[serde(rename = "deliveryDate", default, skip_serializing_if = "Option::is_none")]
    pub delivery_date: Option<Period>,

    #[serde(rename = "deliveryAddress", default, skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<Address>,

    #[serde(rename = "deliveryLocation", default, skip_serializing_if = "Option::is_none")]
    pub delivery_location: Option<Location>,

    #[serde(rename = "relatedLot", default, skip_serializing_if = "Option::is_none")]
    pub related_lot: Option<HexId>,
}

impl Validate for Item {
    fn validate_at(&self, path: &FieldPath, errors: &mut ValidationErrors) {
        errors.min_length(&path.field("id"), &self.id, 1);

        let classification = path.field("classification");
        self.classification.validate_at(&classification, errors);
        if !ITEM_CLASSIFICATION_SCHEMES.contains(&self.classification.scheme.as_str()) {
            errors.add(
                &classification.field("scheme"),
                "Value must be one of ['CPV', 'ДК021'].",
            );
        }

        self.additional_classifications
            .validate_at(&path.field("additionalClassifications"), errors);
        self.unit.validate_at(&path.field("unit"), errors);
        self.delivery_date.validate_at(&path.field("deliveryDate"), errors);
        self.delivery_address
            .validate_at(&path.field("deliveryAddress"), errors);
    }
}

/// Records an error on `path` when two items share an id.
pub fn validate_items_uniq(items: &[Item], path: &FieldPath, errors: &mut ValidationErrors) {
    let mut seen = HashSet::new();
    if items.iter().any(|item| !seen.insert(item.id.as_str())) {
        errors.add(path, "Item id should be uniq for all items");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use procurement::from_document;
    use serde_json::json;

    fn item_json(id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "description": "Комп’ютерне обладнання",
            "classification": {"scheme": "CPV", "id": "44617100-9", "description": "Cartons"},
            "additionalClassifications": [
                {"scheme": "ДКПП", "id": "17.21.1", "description": "папір і картон гофровані"}
            ],
            "unit": {"name": "item", "code": "44617100-9"},
            "quantity": 5,
            "deliveryAddress": {"countryName": "Україна", "postalCode": "79000"}
        })
    }

    #[test]
    fn item_parses_and_validates() {
        let item: Item = from_document(item_json("c6c6e8ed4b1542e4bf13d3f98ec5ab59")).expect("parse");
        assert!(item.validate().is_ok());
        assert_eq!(item.quantity, Some(5));
    }

    #[test]
    fn item_id_defaults_to_generated_hex() {
        let mut doc = item_json("x");
        doc.as_object_mut().unwrap().remove("id");
        let item: Item = from_document(doc).expect("parse");
        assert!(HexId::is_canonical(&item.id));
    }

    #[test]
    fn empty_item_id_is_too_short() {
        let item: Item = from_document(item_json("")).expect("parse");
        let errors = item.validate().expect_err("empty id");
        assert_eq!(
            errors.messages("id"),
            Some(&["String value is too short.".to_owned()][..])
        );
    }

    #[test]
    fn additional_classification_codes_are_not_checked() {
        let mut doc = item_json("1");
        doc["additionalClassifications"][0]["id"] = json!("not-in-any-table");
        let item: Item = from_document(doc).expect("parse");
        assert!(item.validate().is_ok());
    }

    #[test]
    fn classification_scheme_must_be_cpv_family() {
        let mut doc = item_json("1");
        doc["classification"]["scheme"] = json!("ДКПП");
        let item: Item = from_document(doc).expect("parse");
        let errors = item.validate().expect_err("bad scheme");
        assert!(errors.messages("classification.scheme").is_some());
    }

    #[test]
    fn negative_quantity_is_rejected_while_parsing() {
        let mut doc = item_json("1");
        doc["quantity"] = json!(-1);
        let err = from_document::<Item>(doc).expect_err("negative quantity");
        assert!(err.messages("quantity").is_some());
    }

    #[test]
    fn duplicate_item_ids_are_reported_on_the_list() {
        let items: Vec<Item> = vec![
            from_document(item_json("1")).unwrap(),
            from_document(item_json("1")).unwrap(),
        ];
        let mut errors = ValidationErrors::new();
        validate_items_uniq(&items, &FieldPath::root().field("items"), &mut errors);
        assert_eq!(
            errors.messages("items"),
            Some(&["Item id should be uniq for all items".to_owned()][..])
        );
    }
}
