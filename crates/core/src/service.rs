//! Contract lifecycle operations.
//!
//! [`ContractService`] runs every operation in memory against a [`Contract`] value; loading and
//! storing the record is the caller's concern. Each operation:
//! - checks the requester's permission against the contract and root ACLs
//! - checks the lifecycle state of the contract (and of the change or document involved)
//! - parses the input strictly and validates it
//! - filters it through the role the requester may write with
//! - merges the result onto the stored form, so only real changes land
//!
//! Every accepted mutation is validated as a whole, stamps `dateModified` and appends a
//! [`Revision`] holding the reverse patch of the `plain` projection. A mutation that changes
//! nothing leaves the contract untouched.

use crate::access::{authenticated_role, edit_role, permits, Permission, Requester};
use crate::config::CoreConfig;
use crate::error::{ContractingError, ContractingResult};
use crate::models::{
    Change, ChangeStatus, Contract, ContractScope, ContractStatus, Document, DocumentOf,
};
use crate::roles;
use chrono::{DateTime, FixedOffset};
use contracting_uuid::HexId;
use procurement::{
    apply_data_patch, from_document, FieldPath, Revision, Role, ValidationErrors,
};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;

/// Access token handed to the owner of a contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AccessGrant {
    pub token: String,
}

/// Response of [`ContractService::generate_credentials`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Credentials {
    pub data: JsonValue,
    pub access: AccessGrant,
}

/// Contract lifecycle operations.
#[derive(Clone, Debug)]
pub struct ContractService {
    cfg: Arc<CoreConfig>,
}

impl ContractService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }

    /// Creates a contract from a client document.
    ///
    /// The whole input is parsed and validated, then only the fields of the `create` role are
    /// kept; everything else (the owner token among them) gets its default. Documents sent with
    /// the input are attached as given.
    ///
    /// # Errors
    ///
    /// - [`ContractingError::PermissionDenied`] without `create_contract`
    /// - [`ContractingError::Forbidden`] when the requester lacks the configured accreditation
    /// - [`ContractingError::Validation`] when the input is malformed or breaks a rule
    pub fn create_contract(
        &self,
        input: JsonValue,
        requester: &Requester,
    ) -> ContractingResult<Contract> {
        require(None, requester, Permission::CreateContract)?;
        if !requester.has_accreditation(self.cfg.create_accreditation()) {
            return Err(rejected(
                "Broker Accreditation level does not permit contract creation".into(),
            ));
        }
        ensure_object(&input)?;

        let now = self.cfg.now();
        let parsed = Contract::from_document(input)?;
        parsed.validate_at(now)?;

        let mut contract = Contract::from_document(parsed.project(Role::Create)?)?;
        contract.documents = parsed.documents;

        let previous = JsonValue::Object(Map::new());
        self.save(&mut contract, &previous, requester, now)?;

        tracing::info!(
            contract_id = %contract.id,
            tender_id = %contract.tender_id,
            "contract created"
        );
        Ok(contract)
    }

    /// Public view of a contract.
    pub fn view_contract(&self, contract: &Contract) -> ContractingResult<JsonValue> {
        contract.project(Role::View)
    }

    /// Applies a partial update to the contract.
    ///
    /// Returns `true` when the contract changed.
    ///
    /// # Errors
    ///
    /// - [`ContractingError::PermissionDenied`] without `edit_contract`
    /// - [`ContractingError::Forbidden`] when a non-administrator edits a terminated contract,
    ///   or when the contract would be terminated without `amountPaid`
    /// - [`ContractingError::Validation`] when the merged record is invalid
    pub fn patch_contract(
        &self,
        contract: &mut Contract,
        requester: &Requester,
        patch: &JsonValue,
    ) -> ContractingResult<bool> {
        require(Some(contract), requester, Permission::EditContract)?;
        let role = edit_role(contract, requester);
        if role != Role::Administrator && !contract.is_active() {
            return Err(rejected(format!(
                "Can't update contract in current ({}) status",
                contract.status
            )));
        }
        ensure_object(patch)?;

        let now = self.cfg.now();
        let stored = contract.to_document()?;
        let Some(merged) = apply_data_patch(&stored, patch) else {
            return Ok(false);
        };
        let candidate = Contract::from_document(merged)?;
        candidate.validate_at(now)?;

        let Some(accepted) = apply_data_patch(&stored, &candidate.project(role)?) else {
            return Ok(false);
        };
        let mut updated = Contract::from_document(accepted)?;
        if updated.status == ContractStatus::Terminated && updated.amount_paid.is_none() {
            return Err(rejected(
                "Can't terminate contract while 'amountPaid' is not set".into(),
            ));
        }

        let previous = contract.project(Role::Plain)?;
        if !self.save(&mut updated, &previous, requester, now)? {
            return Ok(false);
        }
        *contract = updated;

        tracing::info!(contract_id = %contract.id, role = %role, "contract updated");
        Ok(true)
    }

    /// Rotates the owner token of the contract.
    ///
    /// # Errors
    ///
    /// - [`ContractingError::PermissionDenied`] without `generate_credentials`
    /// - [`ContractingError::Forbidden`] when the contract is not active
    pub fn generate_credentials(
        &self,
        contract: &mut Contract,
        requester: &Requester,
    ) -> ContractingResult<Credentials> {
        require(Some(contract), requester, Permission::GenerateCredentials)?;
        if !contract.is_active() {
            return Err(rejected(format!(
                "Can't generate credentials in current ({}) contract status",
                contract.status
            )));
        }

        let now = self.cfg.now();
        let previous = contract.project(Role::Plain)?;
        let mut updated = contract.clone();
        updated.owner_token = HexId::new().to_string();
        self.save(&mut updated, &previous, requester, now)?;
        *contract = updated;

        tracing::info!(contract_id = %contract.id, "contract credentials generated");
        Ok(Credentials {
            data: contract.project(Role::View)?,
            access: AccessGrant {
                token: contract.owner_token.clone(),
            },
        })
    }

    /// Adds a pending change to the contract.
    ///
    /// # Errors
    ///
    /// - [`ContractingError::PermissionDenied`] without `edit_contract`
    /// - [`ContractingError::Forbidden`] when the contract is not active, a pending change
    ///   already exists or `dateSigned` precedes the previous signature
    /// - [`ContractingError::Validation`] when the change is invalid
    pub fn add_change(
        &self,
        contract: &mut Contract,
        requester: &Requester,
        input: JsonValue,
    ) -> ContractingResult<Change> {
        require(Some(contract), requester, Permission::EditContract)?;
        if !contract.is_active() {
            return Err(rejected(format!(
                "Can't add contract change in current ({}) contract status",
                contract.status
            )));
        }
        if contract.has_pending_change() {
            return Err(rejected(
                "Can't create new contract change while any (pending) change exists".into(),
            ));
        }
        ensure_object(&input)?;

        let now = self.cfg.now();
        let parsed: Change = from_document(input)?;
        validate_change(&parsed, now)?;

        let created = roles::CHANGE.project(&to_document(&parsed)?, Role::Create)?;
        let mut change: Change = from_document(created)?;
        change.date = Some(now);
        check_change_date_signed(contract, &change)?;

        let previous = contract.project(Role::Plain)?;
        let mut updated = contract.clone();
        updated.changes.push(change.clone());
        self.save(&mut updated, &previous, requester, now)?;
        *contract = updated;

        tracing::info!(contract_id = %contract.id, change_id = %change.id, "contract change added");
        Ok(change)
    }

    /// Applies a partial update to a pending change.
    ///
    /// # Errors
    ///
    /// - [`ContractingError::NotFound`] when the contract has no such change
    /// - [`ContractingError::Forbidden`] when the contract is not active, the change is not
    ///   pending, or an activated change lacks a valid `dateSigned`
    /// - [`ContractingError::Validation`] when the merged change is invalid
    pub fn patch_change(
        &self,
        contract: &mut Contract,
        requester: &Requester,
        change_id: &str,
        patch: &JsonValue,
    ) -> ContractingResult<Change> {
        require(Some(contract), requester, Permission::EditContract)?;
        let id = parse_id("change", change_id)?;
        let position = contract
            .change_position(&id)
            .ok_or_else(|| not_found("change", change_id))?;
        if !contract.is_active() {
            return Err(rejected(format!(
                "Can't update contract change in current ({}) contract status",
                contract.status
            )));
        }
        let current = &contract.changes[position];
        if !current.is_pending() {
            return Err(rejected(format!(
                "Can't update contract change in current ({}) status",
                current.status
            )));
        }
        ensure_object(patch)?;

        let now = self.cfg.now();
        let stored = to_document(current)?;
        let Some(merged) = apply_data_patch(&stored, patch) else {
            return Ok(current.clone());
        };
        let candidate: Change = from_document(merged)?;
        validate_change(&candidate, now)?;

        let allowed = roles::CHANGE.project(&to_document(&candidate)?, Role::Edit)?;
        let Some(accepted) = apply_data_patch(&stored, &allowed) else {
            return Ok(current.clone());
        };
        let change: Change = from_document(accepted)?;
        if change.status == ChangeStatus::Active && change.date_signed.is_none() {
            return Err(rejected(
                "Can't update contract change status. 'dateSigned' is required.".into(),
            ));
        }
        check_change_date_signed(contract, &change)?;

        let previous = contract.project(Role::Plain)?;
        let mut updated = contract.clone();
        updated.changes[position] = change.clone();
        self.save(&mut updated, &previous, requester, now)?;
        *contract = updated;

        tracing::info!(
            contract_id = %contract.id,
            change_id = %change.id,
            status = %change.status,
            "contract change updated"
        );
        Ok(change)
    }

    /// Attaches a document to the contract.
    ///
    /// # Errors
    ///
    /// - [`ContractingError::PermissionDenied`] without `upload_contract_documents`
    /// - [`ContractingError::Forbidden`] when the contract is not active or the document targets
    ///   an active change
    /// - [`ContractingError::Validation`] when the document is invalid
    pub fn add_document(
        &self,
        contract: &mut Contract,
        requester: &Requester,
        input: JsonValue,
    ) -> ContractingResult<Document> {
        require(Some(contract), requester, Permission::UploadContractDocuments)?;
        if !contract.is_active() {
            return Err(rejected(format!(
                "Can't add document in current ({}) contract status",
                contract.status
            )));
        }
        ensure_object(&input)?;

        let now = self.cfg.now();
        let parsed: Document = from_document(input)?;
        let created = roles::DOCUMENT.project(&to_document(&parsed)?, Role::Create)?;
        let mut document: Document = from_document(created)?;
        document.date_published = Some(now);
        document.date_modified = Some(now);
        document.author = Some(authenticated_role(Some(contract), requester).to_string());

        validate_document(contract, &document, now)?;
        check_document_change(contract, &document, "add")?;

        let previous = contract.project(Role::Plain)?;
        let mut updated = contract.clone();
        updated.documents.push(document.clone());
        self.save(&mut updated, &previous, requester, now)?;
        *contract = updated;

        tracing::info!(
            contract_id = %contract.id,
            document_id = %document.id,
            "contract document added"
        );
        Ok(document)
    }

    /// Applies a partial update to the latest version of a document.
    ///
    /// # Errors
    ///
    /// - [`ContractingError::NotFound`] when the contract has no such document
    /// - [`ContractingError::Forbidden`] when the contract is not active or the document targets
    ///   an active change
    /// - [`ContractingError::Validation`] when the merged document is invalid
    pub fn patch_document(
        &self,
        contract: &mut Contract,
        requester: &Requester,
        document_id: &str,
        patch: &JsonValue,
    ) -> ContractingResult<Document> {
        require(Some(contract), requester, Permission::UploadContractDocuments)?;
        let id = parse_id("document", document_id)?;
        let position = contract
            .document_position(&id)
            .ok_or_else(|| not_found("document", document_id))?;
        if !contract.is_active() {
            return Err(rejected(format!(
                "Can't update document in current ({}) contract status",
                contract.status
            )));
        }
        ensure_object(patch)?;

        let now = self.cfg.now();
        let current = &contract.documents[position];
        let stored = to_document(current)?;
        let Some(merged) = apply_data_patch(&stored, patch) else {
            return Ok(current.clone());
        };
        let candidate: Document = from_document(merged)?;
        let allowed = roles::DOCUMENT.project(&to_document(&candidate)?, Role::Edit)?;
        let Some(accepted) = apply_data_patch(&stored, &allowed) else {
            return Ok(current.clone());
        };
        let mut document: Document = from_document(accepted)?;
        document.date_modified = Some(now);

        validate_document(contract, &document, now)?;
        check_document_change(contract, &document, "update")?;

        let previous = contract.project(Role::Plain)?;
        let mut updated = contract.clone();
        updated.documents[position] = document.clone();
        self.save(&mut updated, &previous, requester, now)?;
        *contract = updated;

        tracing::info!(
            contract_id = %contract.id,
            document_id = %document.id,
            "contract document updated"
        );
        Ok(document)
    }

    /// Validates the contract and records the revision from `previous`.
    ///
    /// Returns `false` when the `plain` projection did not change.
    fn save(
        &self,
        contract: &mut Contract,
        previous: &JsonValue,
        requester: &Requester,
        now: DateTime<FixedOffset>,
    ) -> ContractingResult<bool> {
        contract.validate_at(now)?;
        let current = contract.project(Role::Plain)?;
        let author = requester.userid().map(str::to_owned);
        let Some(revision) = Revision::between(previous, &current, author, now) else {
            return Ok(false);
        };
        contract.revisions.push(revision);
        contract.date_modified = Some(now);
        Ok(true)
    }
}

fn require(
    contract: Option<&Contract>,
    requester: &Requester,
    permission: Permission,
) -> ContractingResult<()> {
    if permits(contract, requester, permission) {
        return Ok(());
    }
    tracing::warn!(
        permission = %permission,
        userid = requester.userid().unwrap_or("anonymous"),
        "permission denied"
    );
    Err(ContractingError::PermissionDenied(permission))
}

fn rejected(message: String) -> ContractingError {
    tracing::warn!("{message}");
    ContractingError::Forbidden(message)
}

fn not_found(kind: &'static str, id: &str) -> ContractingError {
    ContractingError::NotFound {
        kind,
        id: id.to_owned(),
    }
}

fn parse_id(kind: &'static str, raw: &str) -> ContractingResult<HexId> {
    HexId::parse(raw).map_err(|_| not_found(kind, raw))
}

fn ensure_object(data: &JsonValue) -> ContractingResult<()> {
    if data.is_object() {
        Ok(())
    } else {
        Err(ContractingError::InvalidInput("Data not available".into()))
    }
}

fn to_document<T: Serialize>(record: &T) -> ContractingResult<JsonValue> {
    serde_json::to_value(record).map_err(ContractingError::Serialization)
}

fn validate_change(change: &Change, now: DateTime<FixedOffset>) -> ContractingResult<()> {
    let mut errors = ValidationErrors::new();
    change.validate_at(now, &FieldPath::root(), &mut errors);
    Ok(errors.into_result()?)
}

fn validate_document(
    contract: &Contract,
    document: &Document,
    now: DateTime<FixedOffset>,
) -> ContractingResult<()> {
    let item_ids = contract.item_ids();
    let change_ids = contract.change_ids();
    let scope = ContractScope::new(now, &item_ids, &change_ids);
    let mut errors = ValidationErrors::new();
    document.validate_in(&scope, &FieldPath::root(), &mut errors);
    Ok(errors.into_result()?)
}

/// A change may only be signed after the contract and after the last active change.
fn check_change_date_signed(contract: &Contract, change: &Change) -> ContractingResult<()> {
    let Some(signed) = change.date_signed else {
        return Ok(());
    };
    let (label, reference) = match contract.last_active_change(Some(&change.id)) {
        Some(last) => ("last active change", last.date_signed),
        None => ("contract", contract.date_signed),
    };
    match reference {
        Some(reference) if signed < reference => Err(rejected(format!(
            "Change dateSigned ({}) can't be earlier than {label} dateSigned ({})",
            signed.to_rfc3339(),
            reference.to_rfc3339()
        ))),
        _ => Ok(()),
    }
}

/// Documents may only be attached to pending changes.
fn check_document_change(
    contract: &Contract,
    document: &Document,
    verb: &str,
) -> ContractingResult<()> {
    if document.document_of != DocumentOf::Change {
        return Ok(());
    }
    let target = document
        .related_item
        .and_then(|related| contract.change(&related));
    match target {
        Some(change) if !change.is_pending() => Err(rejected(format!(
            "Can't {verb} document to '{}' change",
            change.status
        ))),
        _ => Ok(()),
    }
}
