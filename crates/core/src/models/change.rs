//! Contract amendments.

use chrono::{DateTime, FixedOffset};
use contracting_types::NonEmptyText;
use contracting_uuid::HexId;
use procurement::{FieldPath, ValidationErrors};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a change: drafted as `pending`, then signed into `active`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeStatus {
    #[default]
    Pending,
    Active,
}

impl ChangeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeStatus::Pending => "pending",
            ChangeStatus::Active => "active",
        }
    }
}

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Legal ground for amending a signed contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RationaleType {
    VolumeCuts,
    ItemPriceVariation,
    QualityImprovement,
    ThirdParty,
    DurationExtension,
    PriceReduction,
    TaxRate,
    FiscalYearExtension,
}

/// An amendment event attached to a contract.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Change {
    #[serde(default)]
    pub id: HexId,

    #[serde(default)]
    pub status: ChangeStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<FixedOffset>>,

    pub rationale: NonEmptyText,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale_en: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale_ru: Option<String>,

    #[serde(rename = "rationaleTypes")]
    pub rationale_types: Vec<RationaleType>,

    #[serde(rename = "contractNumber", default, skip_serializing_if = "Option::is_none")]
    pub contract_number: Option<String>,

    #[serde(rename = "dateSigned", default, skip_serializing_if = "Option::is_none")]
    pub date_signed: Option<DateTime<FixedOffset>>,
}

impl Change {
    pub fn is_pending(&self) -> bool {
        self.status == ChangeStatus::Pending
    }

    /// Validates the change as of `now`.
    pub fn validate_at(
        &self,
        now: DateTime<FixedOffset>,
        path: &FieldPath,
        errors: &mut ValidationErrors,
    ) {
        errors.list_size(&path.field("rationaleTypes"), self.rationale_types.len(), 1, None);

        if self.date_signed.is_some_and(|signed| signed > now) {
            errors.add(
                &path.field("dateSigned"),
                "Contract signature date can't be in the future",
            );
        }
    }
}
