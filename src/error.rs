use crate::domain::{DateRange, EmployeeId, PtoKey};

#[derive(Debug, thiserror::Error)]
pub enum PtoError {
    #[error("{0}")]
    Validation(String),

    #[error("There is a conflict between the new PTO ({requested}) and existing PTO {existing} of employee {employee_id}")]
    Conflict {
        employee_id: EmployeeId,
        requested: DateRange,
        existing: PtoKey,
    },

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Storage write failed: {0}")]
    StorageWrite(String),
}

impl PtoError {
    pub fn validation(message: impl Into<String>) -> Self {
        PtoError::Validation(message.into())
    }

    pub fn unavailable(error: impl std::fmt::Display) -> Self {
        PtoError::StorageUnavailable(error.to_string())
    }

    pub fn write(error: impl std::fmt::Display) -> Self {
        PtoError::StorageWrite(error.to_string())
    }
}

pub type PtoResult<T> = Result<T, PtoError>;
