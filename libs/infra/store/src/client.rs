// [libs/infra/store/src/client.rs]
//! Gestion de enlaces a libSQL y el tipo `Tx` que materializa las
//! transacciones serializables anidables del spec (§4.A "Ownership").
//!
//! Diseno de anidamiento: en vez de un contador de profundidad en runtime,
//! la anidacion se resuelve en tipos. Una funcion que necesita estar dentro
//! de una transaccion recibe `&Tx` como parametro en vez de abrir la suya;
//! "entrar a una transaccion estando ya dentro de una" es entonces, por
//! construccion, pasar la misma referencia hacia abajo, nunca una llamada
//! real a `BEGIN`. Solo el punto mas externo de una operacion (el tick del
//! Allocator, el manejador de una peticion de la API) llama a
//! `StoreClient::begin` y posee el `Tx` resultante.

use crate::errors::StoreError;
use crate::schema;
use libsql::{Builder, Connection, Database, Transaction};
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Clone)]
pub struct StoreClient {
    database: Arc<Database>,
    /// Mantiene viva una base `:memory:` mientras el `StoreClient` exista;
    /// sin esta ancla, sqlite libera el esquema en cuanto la ultima
    /// conexion de corta vida se cierra.
    _memory_anchor: Option<Arc<Connection>>,
}

impl StoreClient {
    #[instrument(skip(auth_token))]
    pub async fn connect(database_url: &str, auth_token: Option<String>) -> Result<Self, StoreError> {
        if database_url.is_empty() {
            return Err(StoreError::ConfigurationError("database url is empty".into()));
        }

        let is_remote = database_url.starts_with("libsql://") || database_url.starts_with("https://");
        let is_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");

        let database = if is_remote {
            let token = auth_token.ok_or_else(|| StoreError::ConfigurationError("remote store requires an auth token".into()))?;
            Builder::new_remote(database_url.to_string(), token).build().await
        } else {
            Builder::new_local(database_url).build().await
        }
        .map_err(|e| StoreError::ConfigurationError(format!("failed to open database: {e}")))?;

        let database = Arc::new(database);
        let mut anchor = None;

        if is_memory {
            let anchor_conn = database.connect().map_err(StoreError::classify)?;
            schema::apply_schema(&anchor_conn).await?;
            anchor = Some(Arc::new(anchor_conn));
            info!("in-memory store schema anchored");
        } else {
            let bootstrap_conn = database.connect().map_err(StoreError::classify)?;
            schema::apply_schema(&bootstrap_conn).await?;
        }

        Ok(Self { database, _memory_anchor: anchor })
    }

    pub fn connection(&self) -> Result<Connection, StoreError> {
        self.database.connect().map_err(StoreError::classify)
    }

    /// Abre una transaccion serializable nueva. El caller es responsable de
    /// `commit`/`rollback`; si `Tx` se dropea sin ninguno de los dos, libsql
    /// revierte al cerrar la conexion subyacente.
    pub async fn begin(&self) -> Result<Tx, StoreError> {
        let connection = self.connection()?;
        let transaction = connection
            .transaction_with_behavior(libsql::TransactionBehavior::Immediate)
            .await
            .map_err(StoreError::classify)?;
        Ok(Tx { inner: transaction, _connection: connection })
    }
}

/// Un marco transaccional. Los repositorios reciben `&Tx`, nunca `&Connection`
/// directamente, para que sea imposible escribir fuera de la transaccion
/// activa del caller por accidente.
pub struct Tx {
    inner: Transaction,
    // `libsql::Transaction` no preserva viva su conexion de origen en todas
    // las versiones del driver; la mantenemos explicita aqui.
    _connection: Connection,
}

impl Tx {
    pub async fn commit(self) -> Result<(), StoreError> {
        self.inner.commit().await.map_err(StoreError::classify)
    }

    pub async fn rollback(self) -> Result<(), StoreError> {
        self.inner.rollback().await.map_err(StoreError::classify)
    }

    pub(crate) fn raw(&self) -> &Transaction {
        &self.inner
    }
}
