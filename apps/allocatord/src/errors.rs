// [apps/allocatord/src/errors.rs]
//! Taxonomia de fallos de la fachada de envio/keepalive/destruccion
//! (spec §7). Cada variante traza a una categoria que el (fuera de
//! alcance) transporte HTTP mapearia a un codigo de estado distinto.

use spalloc_core_geometry::GeometryError;
use spalloc_infra_store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AllocatorError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("job {0} not found")]
    JobNotFound(i64),

    #[error("group quota exceeded")]
    QuotaExceeded,

    #[error("no placement satisfies the request yet")]
    NoFit,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<GeometryError> for AllocatorError {
    fn from(error: GeometryError) -> Self {
        match error {
            GeometryError::DoesNotFit => AllocatorError::BadRequest(error.to_string()),
            GeometryError::BoardNotFound => AllocatorError::BadRequest(error.to_string()),
            GeometryError::BoardUnavailable | GeometryError::NoFit => AllocatorError::NoFit,
        }
    }
}
