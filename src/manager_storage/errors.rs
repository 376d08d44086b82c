use thiserror::Error;

/// Errors reported by the object store, with not-found kept apart from other failures
///
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("NotFound")]
    NotFound,
    #[error("AccessDenied: {0}")]
    AccessDenied(String),
    #[error("TransportError: {0}")]
    Transport(String),
    #[error("ServiceError: {0}")]
    Service(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("no data provided")]
    NoData,
    #[error("payload is not a JSON object, no timestamp can be added")]
    NotAnObject,
    #[error("SerializeError: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("StoreError: {0}")]
    Store(#[from] StoreError),
}
