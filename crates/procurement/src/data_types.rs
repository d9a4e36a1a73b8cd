//! Common procurement value types.
//!
//! These are the small records shared by every procurement resource: money amounts, periods,
//! postal addresses, legal identifiers, classifications and units. Wire names follow the
//! procurement API (camelCase with `_en`/`_ru` translation suffixes).

use crate::validation::{FieldPath, Validate, ValidationErrors};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Currency used when a value omits one.
pub const DEFAULT_CURRENCY: &str = "UAH";

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_owned()
}

fn default_true() -> bool {
    true
}

/// Monetary value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Value {
    pub amount: f64,

    /// ISO 4217 code, exactly three characters.
    #[serde(default = "default_currency")]
    pub currency: String,

    #[serde(rename = "valueAddedTaxIncluded", default = "default_true")]
    pub value_added_tax_included: bool,
}

impl Value {
    pub fn new(amount: f64) -> Self {
        Self {
            amount,
            currency: default_currency(),
            value_added_tax_included: true,
        }
    }
}

impl Validate for Value {
    fn validate_at(&self, path: &FieldPath, errors: &mut ValidationErrors) {
        if !self.amount.is_finite() || self.amount < 0.0 {
            errors.add(
                &path.field("amount"),
                "Float value should be greater than 0.",
            );
        }

        let len = self.currency.chars().count();
        if len < 3 {
            errors.add(&path.field("currency"), crate::validation::TOO_SHORT);
        } else if len > 3 {
            errors.add(&path.field("currency"), crate::validation::TOO_LONG);
        }
    }
}

/// Time span with optional bounds.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Period {
    #[serde(rename = "startDate", default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<FixedOffset>>,

    #[serde(rename = "endDate", default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<FixedOffset>>,
}

impl Validate for Period {
    fn validate_at(&self, path: &FieldPath, errors: &mut ValidationErrors) {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                errors.add(&path.field("startDate"), "period should begin before its end");
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Address {
    #[serde(rename = "streetAddress", default, skip_serializing_if = "Option::is_none")]
    pub street_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(rename = "postalCode", default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,

    #[serde(rename = "countryName")]
    pub country_name: String,

    #[serde(rename = "countryName_en", default, skip_serializing_if = "Option::is_none")]
    pub country_name_en: Option<String>,

    #[serde(rename = "countryName_ru", default, skip_serializing_if = "Option::is_none")]
    pub country_name_ru: Option<String>,
}

impl Validate for Address {
    fn validate_at(&self, path: &FieldPath, errors: &mut ValidationErrors) {
        errors.min_length(&path.field("countryName"), &self.country_name, 1);
    }
}

/// Legal identifier of an organization within a registration scheme.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Identifier {
    pub scheme: String,

    pub id: String,

    #[serde(rename = "legalName", default, skip_serializing_if = "Option::is_none")]
    pub legal_name: Option<String>,

    #[serde(rename = "legalName_en", default, skip_serializing_if = "Option::is_none")]
    pub legal_name_en: Option<String>,

    #[serde(rename = "legalName_ru", default, skip_serializing_if = "Option::is_none")]
    pub legal_name_ru: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

impl Validate for Identifier {
    fn validate_at(&self, path: &FieldPath, errors: &mut ValidationErrors) {
        errors.min_length(&path.field("scheme"), &self.scheme, 1);
        errors.min_length(&path.field("id"), &self.id, 1);
    }
}

/// Code from a classification scheme (CPV, ДК021, ...).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Classification {
    pub scheme: String,

    pub id: String,

    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

impl Validate for Classification {
    fn validate_at(&self, path: &FieldPath, errors: &mut ValidationErrors) {
        errors.min_length(&path.field("scheme"), &self.scheme, 1);
        errors.min_length(&path.field("id"), &self.id, 1);
    }
}

/// Unit of measure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Unit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_en: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_ru: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    pub code: String,
}

impl Validate for Unit {
    fn validate_at(&self, path: &FieldPath, errors: &mut ValidationErrors) {
        errors.min_length(&path.field("code"), &self.code, 1);
        self.value.validate_at(&path.field("value"), errors);
    }
}

/// Geographic coordinate; clients send either numbers or numeric strings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Coordinate {
    Number(f64),
    Text(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Location {
    pub latitude: Coordinate,

    pub longitude: Coordinate,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation: Option<Coordinate>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::from_document;
    use serde_json::json;

    #[test]
    fn value_defaults_currency_and_tax_flag() {
        let value: Value = from_document(json!({"amount": 238})).expect("parse");
        assert_eq!(value.currency, "UAH");
        assert!(value.value_added_tax_included);
        assert!(value.validate().is_ok());
    }

    #[test]
    fn value_rejects_negative_amount_and_bad_currency() {
        let value = Value {
            amount: -1.0,
            currency: "UA".into(),
            value_added_tax_included: false,
        };
        let errors = value.validate().expect_err("invalid value");
        assert!(errors.messages("amount").is_some());
        assert_eq!(
            errors.messages("currency"),
            Some(&["String value is too short.".to_owned()][..])
        );
    }

    #[test]
    fn period_must_begin_before_its_end() {
        let period: Period = from_document(json!({
            "startDate": "2016-03-20T18:47:47+02:00",
            "endDate": "2016-03-18T18:47:47+02:00"
        }))
        .expect("parse");
        let errors = period.validate().expect_err("inverted period");
        assert_eq!(
            errors.messages("startDate"),
            Some(&["period should begin before its end".to_owned()][..])
        );
    }

    #[test]
    fn period_compares_across_offsets() {
        let period: Period = from_document(json!({
            "startDate": "2016-03-18T12:00:00+02:00",
            "endDate": "2016-03-18T10:30:00Z"
        }))
        .expect("parse");
        assert!(period.validate().is_ok());
    }

    #[test]
    fn location_accepts_numbers_and_strings() {
        let location: Location =
            from_document(json!({"latitude": 49.8, "longitude": "24.01"})).expect("parse");
        assert_eq!(location.latitude, Coordinate::Number(49.8));
        assert_eq!(location.longitude, Coordinate::Text("24.01".into()));
    }

    #[test]
    fn identifier_requires_non_empty_id() {
        let identifier: Identifier =
            from_document(json!({"scheme": "UA-EDR", "id": ""})).expect("parse");
        let errors = identifier.validate().expect_err("empty id");
        assert!(errors.messages("id").is_some());
    }

    #[test]
    fn address_requires_country() {
        let err = from_document::<Address>(json!({"locality": "Kyiv"})).expect_err("no country");
        assert_eq!(
            err.messages("countryName"),
            Some(&["This field is required.".to_owned()][..])
        );
    }
}
