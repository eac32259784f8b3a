// [libs/infra/store/src/errors.rs]
//! Catalogo semantico de fallos de persistencia, mapeable 1:1 contra la
//! taxonomia del spec (§4.A "Busy", "ConstraintViolation", "IOError").

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// El motor esta ocupado con otra escritura serializable; el caller debe
    /// reintentar el tick completo, nunca reintentar a mitad de transaccion.
    #[error("store is busy, retry the whole operation")]
    Busy,

    /// Una restriccion UNIQUE/FOREIGN KEY/CHECK fallo; indica un bug del
    /// caller o una carrera que el llamador debe resolver, no reintentar ciegamente.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// Fallo de E/S en el fichero de base de datos o el enlace remoto.
    #[error("database IO error: {0}")]
    IoError(String),

    /// El driver libsql devolvio un error que no encaja en las categorias
    /// anteriores.
    #[error("query rejected: {0}")]
    QueryError(#[from] libsql::Error),

    /// Fallo al convertir una fila en un tipo de dominio.
    #[error("row mapping failed: {0}")]
    MappingError(String),

    /// La entidad pedida no existe.
    #[error("not found")]
    NotFound,

    /// Configuracion de conexion invalida (URL vacia, falta el token remoto).
    #[error("configuration error: {0}")]
    ConfigurationError(String),
}

impl StoreError {
    /// Clasifica un error crudo de libsql en la taxonomia del store,
    /// siguiendo los codigos SQLITE_BUSY / SQLITE_CONSTRAINT que libsql
    /// expone solo como texto en su variante `Error::SqliteFailure`.
    pub fn classify(error: libsql::Error) -> Self {
        let message = error.to_string();
        if message.contains("database is locked") || message.contains("SQLITE_BUSY") {
            StoreError::Busy
        } else if message.contains("UNIQUE constraint") || message.contains("FOREIGN KEY constraint") || message.contains("CHECK constraint") {
            StoreError::ConstraintViolation(message)
        } else {
            StoreError::QueryError(error)
        }
    }
}
