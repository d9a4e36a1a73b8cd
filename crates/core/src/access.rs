//! Requesters, local roles and ACLs.
//!
//! Authorisation works on principals. A requester carries `system.Everyone`, plus
//! `system.Authenticated` and its user id once logged in, one `g:<group>` principal per group
//! and `<userid>_<token>` when it presented an access token.
//!
//! A contract grants its owner two local roles through such token principals:
//! `<owner>_<owner_token>` is the `contract_owner` and `<owner>_<tender_token>` is the
//! `tender_owner`. Permissions are granted by the contract ACL first and the root ACL second;
//! every entry is an allow entry, so a permission is held when any entry matches.

use crate::constants::{AUTHENTICATED, EVERYONE, GROUP_PREFIX};
use crate::models::Contract;
use procurement::Role;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ViewContract,
    CreateContract,
    EditContract,
    UploadContractDocuments,
    GenerateCredentials,
}

impl Permission {
    pub const ALL: [Permission; 5] = [
        Permission::ViewContract,
        Permission::CreateContract,
        Permission::EditContract,
        Permission::UploadContractDocuments,
        Permission::GenerateCredentials,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ViewContract => "view_contract",
            Permission::CreateContract => "create_contract",
            Permission::EditContract => "edit_contract",
            Permission::UploadContractDocuments => "upload_contract_documents",
            Permission::GenerateCredentials => "generate_credentials",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role a requester holds on one particular contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalRole {
    ContractOwner,
    TenderOwner,
}

impl LocalRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocalRole::ContractOwner => "contract_owner",
            LocalRole::TenderOwner => "tender_owner",
        }
    }
}

/// Who the requester acts as: a local role on the contract, else its last group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthenticatedRole {
    Local(LocalRole),
    Group(String),
    Anonymous,
}

impl AuthenticatedRole {
    pub fn as_str(&self) -> &str {
        match self {
            AuthenticatedRole::Local(role) => role.as_str(),
            AuthenticatedRole::Group(group) => group,
            AuthenticatedRole::Anonymous => "anonymous",
        }
    }

    pub fn is_administrator(&self) -> bool {
        matches!(self, AuthenticatedRole::Group(group) if group == "Administrator")
    }
}

impl fmt::Display for AuthenticatedRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of the caller of an operation, as established by the hosting framework.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Requester {
    userid: Option<String>,
    token: Option<String>,
    groups: Vec<String>,
    accreditations: Vec<u8>,
}

impl Requester {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user(userid: impl Into<String>) -> Self {
        Self {
            userid: Some(userid.into()),
            ..Self::default()
        }
    }

    /// Access token sent with the request (`acc_token`).
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.groups.push(group.into());
        self
    }

    pub fn with_accreditations(mut self, levels: impl IntoIterator<Item = u8>) -> Self {
        self.accreditations.extend(levels);
        self
    }

    pub fn userid(&self) -> Option<&str> {
        self.userid.as_deref()
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn has_accreditation(&self, level: u8) -> bool {
        self.accreditations.contains(&level)
    }

    pub fn effective_principals(&self) -> Vec<String> {
        let mut principals = vec![EVERYONE.to_owned()];
        let Some(userid) = &self.userid else {
            return principals;
        };
        principals.push(AUTHENTICATED.to_owned());
        principals.push(userid.clone());
        principals.extend(self.groups.iter().map(|group| group_principal(group)));
        if let Some(token) = &self.token {
            principals.push(token_principal(userid, token));
        }
        principals
    }
}

fn token_principal(owner: &str, token: &str) -> String {
    format!("{owner}_{token}")
}

fn group_principal(group: &str) -> String {
    format!("{GROUP_PREFIX}{group}")
}

/// One allow entry of an ACL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AclEntry {
    pub principal: String,
    pub permission: Permission,
}

impl AclEntry {
    fn allow(principal: impl Into<String>, permission: Permission) -> Self {
        Self {
            principal: principal.into(),
            permission,
        }
    }
}

/// ACL of the contracts collection.
pub fn root_acl() -> Vec<AclEntry> {
    vec![
        AclEntry::allow(EVERYONE, Permission::ViewContract),
        AclEntry::allow(group_principal("contracting"), Permission::CreateContract),
        AclEntry::allow(group_principal("Administrator"), Permission::ViewContract),
        AclEntry::allow(group_principal("Administrator"), Permission::EditContract),
    ]
}

/// Principal to local role mapping of a contract.
///
/// Contracts without an owner grant no local roles.
pub fn local_roles(contract: &Contract) -> BTreeMap<String, LocalRole> {
    let mut roles = BTreeMap::new();
    if let Some(owner) = &contract.owner {
        roles.insert(
            token_principal(owner, &contract.owner_token),
            LocalRole::ContractOwner,
        );
        roles.insert(
            token_principal(owner, &contract.tender_token),
            LocalRole::TenderOwner,
        );
    }
    roles
}

/// ACL of one contract.
pub fn contract_acl(contract: &Contract) -> Vec<AclEntry> {
    let Some(owner) = &contract.owner else {
        return Vec::new();
    };
    let contract_owner = token_principal(owner, &contract.owner_token);
    vec![
        AclEntry::allow(contract_owner.clone(), Permission::EditContract),
        AclEntry::allow(contract_owner, Permission::UploadContractDocuments),
        AclEntry::allow(
            token_principal(owner, &contract.tender_token),
            Permission::GenerateCredentials,
        ),
    ]
}

/// Checks `permission` against the contract ACL (when there is a contract) and the root ACL.
pub fn permits(contract: Option<&Contract>, requester: &Requester, permission: Permission) -> bool {
    let principals = requester.effective_principals();
    let mut acl = contract.map(contract_acl).unwrap_or_default();
    acl.extend(root_acl());
    acl.iter()
        .any(|entry| entry.permission == permission && principals.contains(&entry.principal))
}

/// Resolves the role the requester acts in.
///
/// The most recently added principal that maps to a local role of the contract wins; without
/// one, the last group applies.
pub fn authenticated_role(contract: Option<&Contract>, requester: &Requester) -> AuthenticatedRole {
    let principals = requester.effective_principals();
    if let Some(contract) = contract {
        let roles = local_roles(contract);
        if let Some(role) = principals.iter().rev().find_map(|p| roles.get(p)) {
            return AuthenticatedRole::Local(*role);
        }
    }
    principals
        .iter()
        .rev()
        .find_map(|p| p.strip_prefix(GROUP_PREFIX))
        .map(|group| AuthenticatedRole::Group(group.to_owned()))
        .unwrap_or(AuthenticatedRole::Anonymous)
}

/// Role the requester edits the contract with: `Administrator` for administrators, otherwise
/// the edit role of the contract's status.
pub fn edit_role(contract: &Contract, requester: &Requester) -> Role {
    if authenticated_role(Some(contract), requester).is_administrator() {
        Role::Administrator
    } else {
        contract.status.edit_role()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContractStatus;
    use crate::test_support::{contract_json, OWNER, OWNER_TOKEN, TENDER_TOKEN};

    fn contract() -> Contract {
        Contract::from_document(contract_json()).expect("parse contract")
    }

    fn owner() -> Requester {
        Requester::user(OWNER).with_group("brokers").with_token(OWNER_TOKEN)
    }

    #[test]
    fn principals_of_anonymous_and_logged_in_requesters() {
        assert_eq!(Requester::anonymous().effective_principals(), vec![EVERYONE]);
        assert_eq!(
            owner().effective_principals(),
            vec![
                EVERYONE.to_owned(),
                AUTHENTICATED.to_owned(),
                OWNER.to_owned(),
                "g:brokers".to_owned(),
                format!("{OWNER}_{OWNER_TOKEN}"),
            ]
        );
    }

    #[test]
    fn local_roles_map_token_principals() {
        let roles = local_roles(&contract());
        assert_eq!(
            roles.get(&format!("{OWNER}_{OWNER_TOKEN}")),
            Some(&LocalRole::ContractOwner)
        );
        assert_eq!(
            roles.get(&format!("{OWNER}_{TENDER_TOKEN}")),
            Some(&LocalRole::TenderOwner)
        );
    }

    #[test]
    fn contract_without_owner_grants_nothing() {
        let mut unowned = contract();
        unowned.owner = None;
        assert!(local_roles(&unowned).is_empty());
        assert!(contract_acl(&unowned).is_empty());
        assert!(!permits(Some(&unowned), &owner(), Permission::EditContract));
    }

    #[test]
    fn contract_owner_may_edit_and_upload_but_not_generate_credentials() {
        let contract = contract();
        let requester = owner();
        assert!(permits(Some(&contract), &requester, Permission::EditContract));
        assert!(permits(Some(&contract), &requester, Permission::UploadContractDocuments));
        assert!(!permits(Some(&contract), &requester, Permission::GenerateCredentials));
        assert_eq!(
            authenticated_role(Some(&contract), &requester),
            AuthenticatedRole::Local(LocalRole::ContractOwner)
        );
    }

    #[test]
    fn tender_owner_may_only_generate_credentials() {
        let contract = contract();
        let requester = Requester::user(OWNER).with_token(TENDER_TOKEN);
        assert!(permits(Some(&contract), &requester, Permission::GenerateCredentials));
        assert!(!permits(Some(&contract), &requester, Permission::EditContract));
    }

    #[test]
    fn wrong_user_with_right_token_is_not_owner() {
        let requester = Requester::user("other").with_token(OWNER_TOKEN);
        assert!(!permits(Some(&contract()), &requester, Permission::EditContract));
    }

    #[test]
    fn root_acl_grants_view_create_and_admin_edit() {
        assert!(permits(None, &Requester::anonymous(), Permission::ViewContract));
        assert!(!permits(None, &Requester::anonymous(), Permission::CreateContract));

        let bridge = Requester::user("bridge").with_group("contracting");
        assert!(permits(None, &bridge, Permission::CreateContract));

        let admin = Requester::user("admin").with_group("Administrator");
        assert!(permits(Some(&contract()), &admin, Permission::EditContract));
        assert!(!permits(Some(&contract()), &admin, Permission::GenerateCredentials));
    }

    #[test]
    fn edit_role_depends_on_administrator_and_status() {
        let mut contract = contract();
        assert_eq!(edit_role(&contract, &owner()), Role::EditActive);

        contract.status = ContractStatus::Terminated;
        assert_eq!(edit_role(&contract, &owner()), Role::EditTerminated);

        let admin = Requester::user("admin").with_group("Administrator");
        assert_eq!(edit_role(&contract, &admin), Role::Administrator);
    }

    #[test]
    fn authenticated_role_falls_back_to_last_group() {
        let requester = Requester::user("u").with_group("brokers").with_group("contracting");
        assert_eq!(
            authenticated_role(None, &requester),
            AuthenticatedRole::Group("contracting".into())
        );
        assert_eq!(
            authenticated_role(None, &Requester::anonymous()).as_str(),
            "anonymous"
        );
    }
}
