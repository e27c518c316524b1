use auth_identity::IdentityError;
use error_common::TrackerError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum AllowanceError {
    #[error("Project not found: {0}")]
    ProjectNotFound(Uuid),

    #[error("Role not found: {0}")]
    RoleNotFound(Uuid),

    #[error("Membership not found: {0}")]
    MembershipNotFound(Uuid),

    #[error("Principal {principal_id} is already a member of project {project_id}")]
    DuplicateMembership { principal_id: Uuid, project_id: Uuid },

    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Repository error: {0}")]
    RepositoryError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<AllowanceError> for TrackerError {
    fn from(error: AllowanceError) -> Self {
        match error {
            AllowanceError::ProjectNotFound(_)
            | AllowanceError::RoleNotFound(_)
            | AllowanceError::MembershipNotFound(_) => TrackerError::NotFound(error.to_string()),
            AllowanceError::DuplicateMembership { .. } => TrackerError::RepositoryError(error.to_string()),
            AllowanceError::Identity(inner) => inner.into(),
            AllowanceError::RepositoryError(message) => TrackerError::RepositoryError(message),
            AllowanceError::InternalError(inner) => TrackerError::Other(inner),
        }
    }
}

pub type Result<T> = std::result::Result<T, AllowanceError>;
