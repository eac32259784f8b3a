// [libs/infra/store/src/repositories/board.rs]

use crate::client::Tx;
use crate::errors::StoreError;
use crate::queries;
use chrono::{DateTime, Utc};
use libsql::{params, Row};
use spalloc_domain_models::board::Functioning;
use spalloc_domain_models::Board;

pub struct BoardRepository;

impl BoardRepository {
    pub async fn get(tx: &Tx, board_id: i64) -> Result<Board, StoreError> {
        let mut rows = tx.raw().query(queries::BOARD_GET, params![board_id]).await.map_err(StoreError::classify)?;
        let row = rows.next().await.map_err(StoreError::classify)?.ok_or(StoreError::NotFound)?;
        map_row(&row)
    }

    pub async fn list_for_machine(tx: &Tx, machine_id: i64) -> Result<Vec<Board>, StoreError> {
        let mut rows = tx.raw().query(queries::BOARD_LIST_FOR_MACHINE, params![machine_id]).await.map_err(StoreError::classify)?;
        let mut boards = Vec::new();
        while let Some(row) = rows.next().await.map_err(StoreError::classify)? {
            boards.push(map_row(&row)?);
        }
        Ok(boards)
    }

    pub async fn find_by_triad(tx: &Tx, machine_id: i64, x: u32, y: u32, z: u32) -> Result<Board, StoreError> {
        let mut rows = tx
            .raw()
            .query(queries::BOARD_FIND_BY_TRIAD, params![machine_id, x, y, z])
            .await
            .map_err(StoreError::classify)?;
        let row = rows.next().await.map_err(StoreError::classify)?.ok_or(StoreError::NotFound)?;
        map_row(&row)
    }

    pub async fn find_by_physical(tx: &Tx, machine_id: i64, cabinet: u32, frame: u32, board_num: u32) -> Result<Board, StoreError> {
        let mut rows = tx
            .raw()
            .query(queries::BOARD_FIND_BY_PHYSICAL, params![machine_id, cabinet, frame, board_num])
            .await
            .map_err(StoreError::classify)?;
        let row = rows.next().await.map_err(StoreError::classify)?.ok_or(StoreError::NotFound)?;
        map_row(&row)
    }

    /// Las placas actualmente asignadas a un trabajo (spec §4.D: la ruta de
    /// destruccion necesita saber que placas apagar).
    pub async fn list_allocated_to(tx: &Tx, job_id: i64) -> Result<Vec<Board>, StoreError> {
        let mut rows = tx.raw().query(queries::BOARD_LIST_ALLOCATED_TO, params![job_id]).await.map_err(StoreError::classify)?;
        let mut boards = Vec::new();
        while let Some(row) = rows.next().await.map_err(StoreError::classify)? {
            boards.push(map_row(&row)?);
        }
        Ok(boards)
    }

    pub async fn set_allocated_job(tx: &Tx, board_id: i64, job_id: Option<i64>) -> Result<(), StoreError> {
        tx.raw()
            .execute(queries::BOARD_SET_ALLOCATED_JOB, params![board_id, job_id])
            .await
            .map_err(StoreError::classify)?;
        Ok(())
    }

    pub async fn set_power(tx: &Tx, board_id: i64, power: bool, at: DateTime<Utc>) -> Result<(), StoreError> {
        tx.raw()
            .execute(queries::BOARD_SET_POWER, params![board_id, power, at.to_rfc3339()])
            .await
            .map_err(StoreError::classify)?;
        Ok(())
    }

    pub async fn set_functioning(tx: &Tx, board_id: i64, functioning: Functioning) -> Result<(), StoreError> {
        tx.raw()
            .execute(queries::BOARD_SET_FUNCTIONING, params![board_id, functioning.to_db()])
            .await
            .map_err(StoreError::classify)?;
        Ok(())
    }
}

fn parse_timestamp(value: Option<String>) -> Result<Option<DateTime<Utc>>, StoreError> {
    value
        .map(|text| {
            DateTime::parse_from_rfc3339(&text)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| StoreError::MappingError(format!("bad timestamp: {e}")))
        })
        .transpose()
}

fn map_row(row: &Row) -> Result<Board, StoreError> {
    Ok(Board {
        board_id: row.get(0).map_err(StoreError::classify)?,
        machine_id: row.get(1).map_err(StoreError::classify)?,
        x: row.get::<i64>(2).map_err(StoreError::classify)? as u32,
        y: row.get::<i64>(3).map_err(StoreError::classify)? as u32,
        z: row.get::<i64>(4).map_err(StoreError::classify)? as u32,
        cabinet: row.get::<i64>(5).map_err(StoreError::classify)? as u32,
        frame: row.get::<i64>(6).map_err(StoreError::classify)? as u32,
        board_num: row.get::<i64>(7).map_err(StoreError::classify)? as u32,
        root_x: row.get::<i64>(8).map_err(StoreError::classify)? as u32,
        root_y: row.get::<i64>(9).map_err(StoreError::classify)? as u32,
        address: row.get(10).map_err(StoreError::classify)?,
        bmp_id: row.get(11).map_err(StoreError::classify)?,
        functioning: Functioning::from_db(row.get(12).map_err(StoreError::classify)?),
        allocated_job: row.get(13).map_err(StoreError::classify)?,
        board_power: row.get::<i64>(14).map_err(StoreError::classify)? != 0,
        power_on_timestamp: parse_timestamp(row.get(15).map_err(StoreError::classify)?)?,
        power_off_timestamp: parse_timestamp(row.get(16).map_err(StoreError::classify)?)?,
        blacklist_set_timestamp: parse_timestamp(row.get(17).map_err(StoreError::classify)?)?,
        blacklist_sync_timestamp: parse_timestamp(row.get(18).map_err(StoreError::classify)?)?,
    })
}
