// [libs/infra/store/src/repositories/pending_change.rs]

use crate::client::Tx;
use crate::errors::StoreError;
use crate::queries;
use chrono::Utc;
use libsql::{params, Row};
use spalloc_domain_models::direction::LinkBitmap;
use spalloc_domain_models::{JobState, PendingChange};

pub struct PendingChangeRepository;

impl PendingChangeRepository {
    pub async fn insert(tx: &Tx, change: &PendingChange) -> Result<i64, StoreError> {
        tx.raw()
            .execute(
                queries::PENDING_INSERT,
                params![
                    change.job_id,
                    change.board_id,
                    change.power,
                    change.from_state.ordinal(),
                    change.to_state.ordinal(),
                    change.links.n,
                    change.links.e,
                    change.links.se,
                    change.links.s,
                    change.links.w,
                    change.links.nw,
                    Utc::now().to_rfc3339(),
                ],
            )
            .await
            .map_err(StoreError::classify)?;
        Ok(tx.raw().last_insert_rowid())
    }

    /// Todos los cambios pendientes de una maquina, agrupados por BMP para
    /// que el PowerController despache un lote por controlador (spec §4.D).
    pub async fn list_for_machine_by_bmp(tx: &Tx, machine_id: i64) -> Result<Vec<(i64, PendingChange)>, StoreError> {
        let mut rows = tx.raw().query(queries::PENDING_LIST_FOR_MACHINE, params![machine_id]).await.map_err(StoreError::classify)?;
        let mut changes = Vec::new();
        while let Some(row) = rows.next().await.map_err(StoreError::classify)? {
            changes.push(map_row(&row)?);
        }
        Ok(changes)
    }

    pub async fn mark_in_progress(tx: &Tx, change_id: i64, in_progress: bool) -> Result<(), StoreError> {
        tx.raw().execute(queries::PENDING_MARK_IN_PROGRESS, params![change_id, in_progress]).await.map_err(StoreError::classify)?;
        Ok(())
    }

    /// Registra un fallo del driver BMP para esta fila: limpia `in_progress`
    /// (para que el siguiente tick la reintente) e incrementa `failure_count`,
    /// devolviendo el nuevo total (spec §4.D: reintento con backoff hasta un
    /// tope, tras el cual el llamador destruye el trabajo).
    pub async fn record_failure(tx: &Tx, change_id: i64) -> Result<i64, StoreError> {
        let mut rows = tx.raw().query(queries::PENDING_RECORD_FAILURE, params![change_id]).await.map_err(StoreError::classify)?;
        let row = rows.next().await.map_err(StoreError::classify)?.ok_or(StoreError::NotFound)?;
        row.get(0).map_err(StoreError::classify)
    }

    pub async fn delete(tx: &Tx, change_id: i64) -> Result<(), StoreError> {
        tx.raw().execute(queries::PENDING_DELETE, params![change_id]).await.map_err(StoreError::classify)?;
        Ok(())
    }

    pub async fn count_for_job(tx: &Tx, job_id: i64) -> Result<i64, StoreError> {
        let mut rows = tx.raw().query(queries::PENDING_COUNT_FOR_JOB, params![job_id]).await.map_err(StoreError::classify)?;
        let row = rows.next().await.map_err(StoreError::classify)?.ok_or(StoreError::NotFound)?;
        row.get(0).map_err(StoreError::classify)
    }

    /// Limpia cualquier `in_progress` dejado por un proceso anterior que
    /// murio a mitad de una llamada BMP (spec §8: "starting the process
    /// with non-empty pending_changes.in_progress = 1 must clear them all
    /// before any worker runs").
    pub async fn clear_all_in_progress(tx: &Tx) -> Result<(), StoreError> {
        tx.raw().execute(queries::PENDING_CLEAR_ALL_IN_PROGRESS, ()).await.map_err(StoreError::classify)?;
        Ok(())
    }
}

fn map_row(row: &Row) -> Result<(i64, PendingChange), StoreError> {
    let from_state = JobState::from_ordinal(row.get::<i64>(4).map_err(StoreError::classify)?)
        .ok_or_else(|| StoreError::MappingError("invalid from_state ordinal".into()))?;
    let to_state = JobState::from_ordinal(row.get::<i64>(5).map_err(StoreError::classify)?)
        .ok_or_else(|| StoreError::MappingError("invalid to_state ordinal".into()))?;

    let links = LinkBitmap {
        n: row.get::<i64>(6).map_err(StoreError::classify)? != 0,
        e: row.get::<i64>(7).map_err(StoreError::classify)? != 0,
        se: row.get::<i64>(8).map_err(StoreError::classify)? != 0,
        s: row.get::<i64>(9).map_err(StoreError::classify)? != 0,
        w: row.get::<i64>(10).map_err(StoreError::classify)? != 0,
        nw: row.get::<i64>(11).map_err(StoreError::classify)? != 0,
    };

    let failure_count: i64 = row.get(13).map_err(StoreError::classify)?;
    let bmp_id: i64 = row.get(14).map_err(StoreError::classify)?;

    let change = PendingChange {
        change_id: row.get(0).map_err(StoreError::classify)?,
        job_id: row.get(1).map_err(StoreError::classify)?,
        board_id: row.get(2).map_err(StoreError::classify)?,
        from_state,
        to_state,
        power: row.get::<i64>(3).map_err(StoreError::classify)? != 0,
        links,
        in_progress: row.get::<i64>(12).map_err(StoreError::classify)? != 0,
        failure_count,
    };
    Ok((bmp_id, change))
}
