//! Documents attached to a contract.
//!
//! Document bodies live in external attachment storage; the record here only references them
//! by `url`. A document can be attached to the contract as a whole or to one of its parts via
//! `documentOf` + `relatedItem`.

use crate::models::ContractScope;
use chrono::{DateTime, FixedOffset};
use contracting_uuid::HexId;
use procurement::{FieldPath, ValidationErrors};
use serde::{Deserialize, Serialize};

/// What a document is attached to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentOf {
    Tender,
    Item,
    Lot,
    #[default]
    Contract,
    Change,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Uk,
    En,
    Ru,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentType {
    TenderNotice,
    AwardNotice,
    ContractNotice,
    Notice,
    BiddingDocuments,
    TechnicalSpecifications,
    EvaluationCriteria,
    Clarifications,
    ShortlistedFirms,
    RiskProvisions,
    BillOfQuantity,
    Bidders,
    ConflictOfInterest,
    Debarments,
    EvaluationReports,
    WinningBid,
    Complaints,
    ContractSigned,
    ContractArrangements,
    ContractSchedule,
    ContractAnnexe,
    ContractGuarantees,
    SubContract,
    EligibilityCriteria,
    ContractProforma,
    CommercialProposal,
    QualificationDocuments,
    EligibilityDocuments,
    Tenderers,
    RegisterExtract,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Document {
    #[serde(default)]
    pub id: HexId,

    #[serde(rename = "documentType", default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<DocumentType>,

    pub title: String,

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

    /// MIME type, e.g. `application/pdf`.
    pub format: String,

    pub url: String,

    #[serde(rename = "datePublished", default, skip_serializing_if = "Option::is_none")]
    pub date_published: Option<DateTime<FixedOffset>>,

    #[serde(rename = "dateModified", default, skip_serializing_if = "Option::is_none")]
    pub date_modified: Option<DateTime<FixedOffset>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,

    #[serde(rename = "documentOf", default)]
    pub document_of: DocumentOf,

    #[serde(rename = "relatedItem", default, skip_serializing_if = "Option::is_none")]
    pub related_item: Option<HexId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl Document {
    /// Validates the document against the contract it belongs to.
    pub fn validate_in(
        &self,
        scope: &ContractScope<'_>,
        path: &FieldPath,
        errors: &mut ValidationErrors,
    ) {
        if !is_mime_type(&self.format) {
            errors.add(
                &path.field("format"),
                "String value did not match validation regex.",
            );
        }
        if self.url.trim().is_empty() {
            errors.add(&path.field("url"), procurement::validation::TOO_SHORT);
        }
        self.validate_related_item(scope, &path.field("relatedItem"), errors);
    }

    fn validate_related_item(
        &self,
        scope: &ContractScope<'_>,
        path: &FieldPath,
        errors: &mut ValidationErrors,
    ) {
        let needs_target = matches!(self.document_of, DocumentOf::Item | DocumentOf::Change);
        let Some(related) = self.related_item else {
            if needs_target {
                errors.add(path, procurement::validation::REQUIRED);
            }
            return;
        };

        match self.document_of {
            DocumentOf::Change if !scope.has_change(&related) => {
                errors.add(path, "relatedItem should be one of changes");
            }
            DocumentOf::Item if !scope.has_item(&related.to_string()) => {
                errors.add(path, "relatedItem should be one of items");
            }
            _ => {}
        }
    }
}

/// Checks the `type/subtype` shape of a MIME type: word characters and `-` in the type, plus
/// `.` and `+` in the subtype.
fn is_mime_type(format: &str) -> bool {
    let Some((kind, subtype)) = format.split_once('/') else {
        return false;
    };
    let word = |c: char| c.is_alphanumeric() || c == '_' || c == '-';
    !kind.is_empty()
        && !subtype.is_empty()
        && kind.chars().all(word)
        && subtype.chars().all(|c| word(c) || c == '.' || c == '+')
}
