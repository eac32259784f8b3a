// [libs/infra/store/src/repositories/machine.rs]

use crate::client::Tx;
use crate::errors::StoreError;
use crate::queries;
use libsql::{params, Row};
use spalloc_domain_models::Machine;

pub struct MachineRepository;

impl MachineRepository {
    pub async fn get(tx: &Tx, machine_id: i64) -> Result<Machine, StoreError> {
        let mut rows = tx.raw().query(queries::MACHINE_GET, params![machine_id]).await.map_err(StoreError::classify)?;
        let row = rows.next().await.map_err(StoreError::classify)?.ok_or(StoreError::NotFound)?;
        map_row(&row)
    }

    pub async fn get_by_name(tx: &Tx, name: &str) -> Result<Machine, StoreError> {
        let mut rows = tx.raw().query(queries::MACHINE_GET_BY_NAME, params![name]).await.map_err(StoreError::classify)?;
        let row = rows.next().await.map_err(StoreError::classify)?.ok_or(StoreError::NotFound)?;
        map_row(&row)
    }

    pub async fn list(tx: &Tx) -> Result<Vec<Machine>, StoreError> {
        let mut rows = tx.raw().query(queries::MACHINE_LIST, ()).await.map_err(StoreError::classify)?;
        collect(&mut rows).await
    }

    /// Incluye las maquinas con `in_service = 0` (spec §6:
    /// `listMachines(includeOutOfService)`).
    pub async fn list_all(tx: &Tx) -> Result<Vec<Machine>, StoreError> {
        let mut rows = tx.raw().query(queries::MACHINE_LIST_ALL, ()).await.map_err(StoreError::classify)?;
        collect(&mut rows).await
    }
}

async fn collect(rows: &mut libsql::Rows) -> Result<Vec<Machine>, StoreError> {
    let mut machines = Vec::new();
    while let Some(row) = rows.next().await.map_err(StoreError::classify)? {
        machines.push(map_row(&row)?);
    }
    Ok(machines)
}

fn map_row(row: &Row) -> Result<Machine, StoreError> {
    Ok(Machine {
        machine_id: row.get(0).map_err(StoreError::classify)?,
        name: row.get(1).map_err(StoreError::classify)?,
        width: row.get::<i64>(2).map_err(StoreError::classify)? as u32,
        height: row.get::<i64>(3).map_err(StoreError::classify)? as u32,
        depth: row.get::<i64>(4).map_err(StoreError::classify)? as u32,
        board_model: row.get(5).map_err(StoreError::classify)?,
        in_service: row.get::<i64>(6).map_err(StoreError::classify)? != 0,
        max_chip_x: row.get::<i64>(7).map_err(StoreError::classify)? as u32,
        max_chip_y: row.get::<i64>(8).map_err(StoreError::classify)? as u32,
    })
}
