use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    #[error("I/O failed: {0}")]
    IoFailed(String),

    #[error("No record for key '{0}'")]
    NotFound(String),

    #[error("Lock error: {0}")]
    LockError(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;


impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}
