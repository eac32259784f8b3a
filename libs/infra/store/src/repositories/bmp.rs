// [libs/infra/store/src/repositories/bmp.rs]

use crate::client::Tx;
use crate::errors::StoreError;
use crate::queries;
use libsql::{params, Row};
use spalloc_domain_models::Bmp;

pub struct BmpRepository;

impl BmpRepository {
    pub async fn get(tx: &Tx, bmp_id: i64) -> Result<Bmp, StoreError> {
        let mut rows = tx.raw().query(queries::BMP_GET, params![bmp_id]).await.map_err(StoreError::classify)?;
        let row = rows.next().await.map_err(StoreError::classify)?.ok_or(StoreError::NotFound)?;
        map_row(&row)
    }

    pub async fn list_for_machine(tx: &Tx, machine_id: i64) -> Result<Vec<Bmp>, StoreError> {
        let mut rows = tx.raw().query(queries::BMP_LIST_FOR_MACHINE, params![machine_id]).await.map_err(StoreError::classify)?;
        let mut bmps = Vec::new();
        while let Some(row) = rows.next().await.map_err(StoreError::classify)? {
            bmps.push(map_row(&row)?);
        }
        Ok(bmps)
    }
}

fn map_row(row: &Row) -> Result<Bmp, StoreError> {
    Ok(Bmp {
        bmp_id: row.get(0).map_err(StoreError::classify)?,
        machine_id: row.get(1).map_err(StoreError::classify)?,
        cabinet: row.get::<i64>(2).map_err(StoreError::classify)? as u32,
        frame: row.get::<i64>(3).map_err(StoreError::classify)? as u32,
        address: row.get(4).map_err(StoreError::classify)?,
    })
}
