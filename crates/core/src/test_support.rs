//! Fixtures shared by the unit tests of this crate.

use chrono::{DateTime, FixedOffset};
use serde_json::{json, Value as JsonValue};

pub const OWNER: &str = "broker";
pub const OWNER_TOKEN: &str = "3f0ee3f4a0a84c1e9f0b2f8c6a0d5e11";
pub const TENDER_TOKEN: &str = "9d5a2ab6c4b94a3f8e7b1c0d2e3f4a5b";
pub const TENDER_ID: &str = "5e1c6b4e1c9d4c64b48b0f4bd6f7d10a";
pub const ITEM_ID: &str = "c6c6e8ed4b1542e4bf13d3f98ec5ab59";

pub fn fixed_now() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2016-03-20T10:00:00+02:00").expect("valid timestamp")
}

pub fn organization_json() -> JsonValue {
    json!({
        "name": "ДКП «Школяр»",
        "identifier": {"scheme": "UA-EDR", "id": "00037256", "uri": "http://www.dus.gov.ua/"},
        "address": {
            "countryName": "Україна",
            "postalCode": "01220",
            "region": "м. Київ",
            "locality": "м. Київ",
            "streetAddress": "вул. Банкова, 11, корпус 1"
        },
        "contactPoint": {"name": "Державне управління справами", "telephone": "0440000000"}
    })
}

pub fn procuring_entity_json() -> JsonValue {
    let mut entity = organization_json();
    entity["name"] = json!("Державне управління справами");
    entity["kind"] = json!("general");
    entity
}

pub fn item_json() -> JsonValue {
    json!({
        "id": ITEM_ID,
        "description": "футляри до державних нагород",
        "classification": {"scheme": "CPV", "id": "44617100-9", "description": "Cartons"},
        "additionalClassifications": [
            {"scheme": "ДКПП", "id": "17.21.1", "description": "папір і картон гофровані"}
        ],
        "unit": {"name": "item", "code": "44617100-9"},
        "quantity": 5
    })
}

/// Stored form of an active contract with one item and one supplier.
pub fn contract_json() -> JsonValue {
    json!({
        "id": "d2a9c2ca61f44d4e9c3f0f4f1c6a7b01",
        "awardID": "7f0b7b44d1b34c4a8b4ac2c5d8a1f0e2",
        "contractID": "UA-2016-03-18-000001-1",
        "contractNumber": "contract #13111",
        "title": "Контракт на поставку футлярів",
        "status": "active",
        "period": {
            "startDate": "2016-03-18T18:47:47+02:00",
            "endDate": "2017-03-18T18:47:47+02:00"
        },
        "value": {"amount": 238, "currency": "UAH", "valueAddedTaxIncluded": true},
        "dateSigned": "2016-03-18T18:47:47+02:00",
        "items": [item_json()],
        "suppliers": [organization_json()],
        "procuringEntity": procuring_entity_json(),
        "owner": OWNER,
        "owner_token": OWNER_TOKEN,
        "tender_token": TENDER_TOKEN,
        "tender_id": TENDER_ID
    })
}

pub fn change_json() -> JsonValue {
    json!({
        "rationale": "причина зміни укр",
        "rationale_en": "change cause en",
        "rationaleTypes": ["priceReduction"]
    })
}

pub fn document_json() -> JsonValue {
    json!({
        "title": "contract.pdf",
        "format": "application/pdf",
        "url": "http://docs-sandbox.example/get/52364ae8"
    })
}
