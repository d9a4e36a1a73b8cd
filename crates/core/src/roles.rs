//! Role tables of the contract record tree.
//!
//! Field names are wire names. Nested records without an entry for a role fall back to their
//! `default` entry, and are left unfiltered when they have neither.

use procurement::{FieldFilter, ModelSchema, Role};

const CONTRACT_CREATE: &[&str] = &[
    "id",
    "awardID",
    "contractID",
    "contractNumber",
    "title",
    "title_en",
    "title_ru",
    "description",
    "description_en",
    "description_ru",
    "status",
    "period",
    "value",
    "dateSigned",
    "items",
    "suppliers",
    "procuringEntity",
    "owner",
    "tender_token",
    "tender_id",
    "mode",
];

const CONTRACT_EDIT: &[&str] = &[
    "title",
    "title_en",
    "title_ru",
    "description",
    "description_en",
    "description_ru",
    "status",
    "period",
    "value",
    "items",
    "amountPaid",
    "terminationDetails",
];

const CONTRACT_VIEW: &[&str] = &[
    "id",
    "awardID",
    "contractID",
    "dateModified",
    "contractNumber",
    "title",
    "title_en",
    "title_ru",
    "description",
    "description_en",
    "description_ru",
    "status",
    "period",
    "value",
    "dateSigned",
    "documents",
    "items",
    "suppliers",
    "procuringEntity",
    "owner",
    "mode",
    "tender_id",
    "changes",
    "amountPaid",
    "terminationDetails",
];

const CONTRACT_ADMINISTRATOR: &[&str] = &["status", "mode", "procuringEntity", "suppliers"];

const ITEM_EDIT: &[&str] = &[
    "description",
    "description_en",
    "description_ru",
    "unit",
    "deliveryDate",
    "deliveryAddress",
    "deliveryLocation",
    "quantity",
    "id",
];

const CHANGE_CREATE: &[&str] = &[
    "rationale",
    "rationale_ru",
    "rationale_en",
    "rationaleTypes",
    "contractNumber",
    "dateSigned",
];

const CHANGE_EDIT: &[&str] = &[
    "rationale",
    "rationale_ru",
    "rationale_en",
    "rationaleTypes",
    "contractNumber",
    "status",
    "dateSigned",
];

pub static ITEM: ModelSchema = ModelSchema {
    name: "Item",
    roles: &[
        (Role::EditActive, FieldFilter::Whitelist(ITEM_EDIT)),
        (Role::View, FieldFilter::ALL),
        (Role::Embedded, FieldFilter::ALL),
    ],
    children: &[],
};

pub static ORGANIZATION: ModelSchema = ModelSchema {
    name: "Organization",
    roles: &[
        (Role::Embedded, FieldFilter::ALL),
        (Role::View, FieldFilter::ALL),
    ],
    children: &[],
};

pub static PROCURING_ENTITY: ModelSchema = ModelSchema {
    name: "ProcuringEntity",
    roles: &[
        (Role::Embedded, FieldFilter::ALL),
        (Role::View, FieldFilter::ALL),
        (Role::EditActive, FieldFilter::Blacklist(&["kind"])),
    ],
    children: &[],
};

pub static CHANGE: ModelSchema = ModelSchema {
    name: "Change",
    roles: &[
        (Role::Create, FieldFilter::Whitelist(CHANGE_CREATE)),
        (Role::Edit, FieldFilter::Whitelist(CHANGE_EDIT)),
        (Role::View, FieldFilter::ALL),
        (Role::Embedded, FieldFilter::ALL),
    ],
    children: &[],
};

pub static DOCUMENT: ModelSchema = ModelSchema {
    name: "Document",
    roles: &[
        (
            Role::Create,
            FieldFilter::Blacklist(&["id", "datePublished", "dateModified"]),
        ),
        (
            Role::Edit,
            FieldFilter::Blacklist(&["id", "url", "datePublished", "dateModified"]),
        ),
        (Role::Embedded, FieldFilter::ALL),
        (Role::View, FieldFilter::ALL),
        (
            Role::Revisions,
            FieldFilter::Whitelist(&["url", "dateModified"]),
        ),
    ],
    children: &[],
};

pub static CONTRACT: ModelSchema = ModelSchema {
    name: "Contract",
    roles: &[
        (
            Role::Plain,
            FieldFilter::Blacklist(&["revisions", "dateModified"]),
        ),
        (Role::Create, FieldFilter::Whitelist(CONTRACT_CREATE)),
        (Role::EditActive, FieldFilter::Whitelist(CONTRACT_EDIT)),
        (Role::EditTerminated, FieldFilter::NONE),
        (Role::View, FieldFilter::Whitelist(CONTRACT_VIEW)),
        (
            Role::Administrator,
            FieldFilter::Whitelist(CONTRACT_ADMINISTRATOR),
        ),
        (Role::Default, FieldFilter::ALL),
    ],
    children: &[
        ("items", &ITEM),
        ("suppliers", &ORGANIZATION),
        ("procuringEntity", &PROCURING_ENTITY),
        ("changes", &CHANGE),
        ("documents", &DOCUMENT),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn change_create_role_drops_status_and_id() {
        let change = json!({
            "id": "0ae9a1d9a7c24d14b9d0e1d8b8a3c6f1",
            "status": "active",
            "rationale": "r",
            "rationaleTypes": ["taxRate"]
        });
        let created = CHANGE.project(&change, Role::Create).unwrap();
        assert_eq!(created, json!({"rationale": "r", "rationaleTypes": ["taxRate"]}));

        let edited = CHANGE.project(&change, Role::Edit).unwrap();
        assert_eq!(edited["status"], "active");
        assert!(edited.get("id").is_none());
    }

    #[test]
    fn document_edit_role_protects_url() {
        let document = json!({
            "id": "0ae9a1d9a7c24d14b9d0e1d8b8a3c6f1",
            "title": "t",
            "url": "http://x",
            "format": "text/plain",
            "dateModified": "2016-03-18T18:47:47+02:00"
        });
        let edited = DOCUMENT.project(&document, Role::Edit).unwrap();
        assert_eq!(edited, json!({"title": "t", "format": "text/plain"}));

        let revisions = DOCUMENT.project(&document, Role::Revisions).unwrap();
        assert_eq!(
            revisions,
            json!({"url": "http://x", "dateModified": "2016-03-18T18:47:47+02:00"})
        );
    }

    #[test]
    fn procuring_entity_kind_is_not_editable() {
        let contract = json!({
            "procuringEntity": {"name": "n", "kind": "general"},
            "title": "t"
        });
        let admin = CONTRACT.project(&contract, Role::Administrator).unwrap();
        assert_eq!(admin["procuringEntity"]["kind"], "general");

        let entity = PROCURING_ENTITY
            .project(&contract["procuringEntity"], Role::EditActive)
            .unwrap();
        assert_eq!(entity, json!({"name": "n"}));
    }

    #[test]
    fn contract_view_never_exposes_tokens() {
        for field in ["owner_token", "tender_token"] {
            assert!(!CONTRACT.filter(Role::View).unwrap().allows(field));
        }
        assert!(CONTRACT.filter(Role::Default).unwrap().allows("owner_token"));
    }

    #[test]
    fn contract_defines_expected_roles_only() {
        for role in [Role::Create, Role::EditTerminated, Role::Administrator] {
            assert!(CONTRACT.defines(role));
        }
        assert!(!CONTRACT.defines(Role::Edit));
        assert!(!CONTRACT.defines(Role::Embedded));
    }
}
