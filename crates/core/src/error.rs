use crate::access::Permission;
use procurement::{ErrorEntry, ProcurementError, Role, ValidationErrors};
use serde_json::Value as JsonValue;

#[derive(Debug, thiserror::Error)]
pub enum ContractingError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    /// The operation is not allowed in the record's current state.
    #[error("{0}")]
    Forbidden(String),
    #[error("permission denied: {0}")]
    PermissionDenied(Permission),
    #[error("Forbidden")]
    RoleForbidden { model: &'static str, role: Role },
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("failed to serialize contract: {0}")]
    Serialization(serde_json::Error),
    #[error("procurement error: {0}")]
    Procurement(ProcurementError),
}

impl From<ValidationErrors> for ContractingError {
    fn from(errors: ValidationErrors) -> Self {
        ContractingError::Validation(errors)
    }
}

impl From<ProcurementError> for ContractingError {
    fn from(err: ProcurementError) -> Self {
        match err {
            ProcurementError::RoleNotDefined { model, role } => {
                ContractingError::RoleForbidden { model, role }
            }
            other => ContractingError::Procurement(other),
        }
    }
}

impl ContractingError {
    /// HTTP status a hosting framework should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            ContractingError::InvalidInput(_) => 400,
            ContractingError::Validation(_) => 422,
            ContractingError::Forbidden(_)
            | ContractingError::PermissionDenied(_)
            | ContractingError::RoleForbidden { .. } => 403,
            ContractingError::NotFound { .. } => 404,
            ContractingError::Serialization(_) | ContractingError::Procurement(_) => 500,
        }
    }

    /// Renders the error in the `[{location, name, description}]` shape API clients expect.
    pub fn to_error_list(&self) -> Vec<ErrorEntry> {
        let (location, name) = match self {
            ContractingError::Validation(errors) => return errors.to_error_list(),
            ContractingError::PermissionDenied(_) => ("url", "permission"),
            ContractingError::RoleForbidden { .. } => ("body", "role"),
            ContractingError::NotFound { kind, .. } => ("url", *kind),
            _ => ("body", "data"),
        };
        vec![ErrorEntry {
            location: location.into(),
            name: name.into(),
            description: JsonValue::String(self.to_string()),
        }]
    }
}

pub type ContractingResult<T> = std::result::Result<T, ContractingError>;
