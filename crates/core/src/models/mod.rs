//! Contract record tree.

pub mod change;
pub mod contract;
pub mod document;
pub mod item;
pub mod organization;

pub use change::{Change, ChangeStatus, RationaleType};
pub use contract::{Contract, ContractStatus, Mode};
pub use document::{Document, DocumentOf, DocumentType, Language};
pub use item::{validate_items_uniq, Item, ITEM_CLASSIFICATION_SCHEMES};
pub use organization::{ContactPoint, Organization, ProcuringEntity, ProcuringEntityKind};

use chrono::{DateTime, FixedOffset};
use contracting_uuid::HexId;

/// What nested records may look up in their parent contract while validating.
#[derive(Clone, Copy, Debug)]
pub struct ContractScope<'a> {
    now: DateTime<FixedOffset>,
    item_ids: &'a [String],
    change_ids: &'a [HexId],
}

impl<'a> ContractScope<'a> {
    pub fn new(
        now: DateTime<FixedOffset>,
        item_ids: &'a [String],
        change_ids: &'a [HexId],
    ) -> Self {
        Self {
            now,
            item_ids,
            change_ids,
        }
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        self.now
    }

    pub fn has_item(&self, id: &str) -> bool {
        self.item_ids.iter().any(|item| item.eq_ignore_ascii_case(id))
    }

    pub fn has_change(&self, id: &HexId) -> bool {
        self.change_ids.contains(id)
    }
}
