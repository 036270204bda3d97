use crate::domain::validation::FieldErrors;

#[derive(thiserror::Error, Debug)]
pub enum ServiceError {
    #[error("validation failed: {0}")]
    Validation(FieldErrors),
    #[error("not found")]
    NotFound,
    #[error("record is referenced by {dependents} active record(s)")]
    InUse { dependents: i64 },
    #[error("forbidden: {0}")]
    Forbidden(&'static str),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<FieldErrors> for ServiceError {
    fn from(errors: FieldErrors) -> Self {
        ServiceError::Validation(errors)
    }
}
