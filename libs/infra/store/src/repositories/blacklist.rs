// [libs/infra/store/src/repositories/blacklist.rs]

use crate::client::Tx;
use crate::errors::StoreError;
use crate::queries;
use libsql::{params, Row};
use spalloc_domain_models::{BlacklistOp, BlacklistOpKind};

pub struct BlacklistRepository;

impl BlacklistRepository {
    pub async fn enqueue(tx: &Tx, board_id: i64, op: BlacklistOpKind) -> Result<i64, StoreError> {
        tx.raw().execute(queries::BLACKLIST_INSERT, params![board_id, op.ordinal()]).await.map_err(StoreError::classify)?;
        Ok(tx.raw().last_insert_rowid())
    }

    pub async fn list_pending(tx: &Tx) -> Result<Vec<BlacklistOp>, StoreError> {
        let mut rows = tx.raw().query(queries::BLACKLIST_LIST_PENDING, ()).await.map_err(StoreError::classify)?;
        let mut ops = Vec::new();
        while let Some(row) = rows.next().await.map_err(StoreError::classify)? {
            ops.push(map_row(&row)?);
        }
        Ok(ops)
    }

    pub async fn mark_complete(tx: &Tx, op_id: i64, data: Option<&[u8]>, failure: Option<&str>) -> Result<(), StoreError> {
        tx.raw().execute(queries::BLACKLIST_MARK_COMPLETE, params![op_id, data, failure]).await.map_err(StoreError::classify)?;
        Ok(())
    }
}

fn map_row(row: &Row) -> Result<BlacklistOp, StoreError> {
    let kind = BlacklistOpKind::from_ordinal(row.get::<i64>(2).map_err(StoreError::classify)?)
        .ok_or_else(|| StoreError::MappingError("invalid blacklist op ordinal".into()))?;
    Ok(BlacklistOp {
        op_id: row.get(0).map_err(StoreError::classify)?,
        board_id: row.get(1).map_err(StoreError::classify)?,
        op: kind,
        completed: row.get::<i64>(3).map_err(StoreError::classify)? != 0,
        data: row.get(4).map_err(StoreError::classify)?,
        failure: row.get(5).map_err(StoreError::classify)?,
    })
}
