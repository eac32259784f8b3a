//! [libs/infra/store/src/lib.rs]
//!
//! APARATO: SPALLOC PERSISTENCE STORE
//! CLASIFICACION: INFRASTRUCTURE LAYER (ESTRATO L3)
//! RESPONSABILIDAD: esquema, transacciones serializables anidables y
//! repositorios de acceso a cada entidad del dominio.

mod client;
mod errors;
mod queries;
mod schema;

pub mod repositories;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use client::{StoreClient, Tx};
pub use errors::StoreError;
