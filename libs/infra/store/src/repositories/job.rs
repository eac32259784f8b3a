// [libs/infra/store/src/repositories/job.rs]

use crate::client::Tx;
use crate::errors::StoreError;
use crate::queries;
use chrono::{DateTime, Utc};
use libsql::{params, Row};
use spalloc_domain_models::{Job, JobState};

pub struct JobRepository;

impl JobRepository {
    /// Crea un trabajo en `Queued` (spec §4.A "Submission"). El keepalive
    /// inicial queda vacio hasta el primer latido explicito del cliente.
    #[allow(clippy::too_many_arguments)]
    pub async fn insert(
        tx: &Tx,
        machine_id: i64,
        owner: &str,
        group_id: i64,
        keepalive_interval_seconds: i64,
        keepalive_host: Option<&str>,
        create_timestamp: DateTime<Utc>,
        original_request: &[u8],
    ) -> Result<i64, StoreError> {
        tx.raw()
            .execute(
                queries::JOB_INSERT,
                params![
                    machine_id,
                    owner,
                    group_id,
                    keepalive_interval_seconds,
                    Option::<String>::None,
                    keepalive_host,
                    create_timestamp.to_rfc3339(),
                    original_request
                ],
            )
            .await
            .map_err(StoreError::classify)?;
        Ok(tx.raw().last_insert_rowid())
    }

    pub async fn get(tx: &Tx, job_id: i64) -> Result<Job, StoreError> {
        let mut rows = tx.raw().query(queries::JOB_GET, params![job_id]).await.map_err(StoreError::classify)?;
        let row = rows.next().await.map_err(StoreError::classify)?.ok_or(StoreError::NotFound)?;
        map_row(&row)
    }

    pub async fn list_live(tx: &Tx) -> Result<Vec<Job>, StoreError> {
        let mut rows = tx.raw().query(queries::JOB_LIST_LIVE, ()).await.map_err(StoreError::classify)?;
        collect(&mut rows).await
    }

    pub async fn list_for_owner(tx: &Tx, owner: &str) -> Result<Vec<Job>, StoreError> {
        let mut rows = tx.raw().query(queries::JOB_LIST_FOR_OWNER, params![owner]).await.map_err(StoreError::classify)?;
        collect(&mut rows).await
    }

    /// Trabajos vivos de un grupo (spec §4.F): su `Job::quota_used(now)` en
    /// curso es el "in-flight usage" que la admision en `Api::submit` resta
    /// de la cuota antes de la consolidacion.
    pub async fn list_live_for_group(tx: &Tx, group_id: i64) -> Result<Vec<Job>, StoreError> {
        let mut rows = tx.raw().query(queries::JOB_LIST_LIVE_FOR_GROUP, params![group_id]).await.map_err(StoreError::classify)?;
        collect(&mut rows).await
    }

    /// Candidatos a expiracion de keepalive (spec §4.E "ExpirySweep"): la
    /// comparacion real contra `now` se hace en memoria via
    /// `Job::keepalive_expired`, no en SQL, para mantener esa regla en un
    /// solo lugar.
    pub async fn list_expiry_candidates(tx: &Tx) -> Result<Vec<Job>, StoreError> {
        let mut rows = tx.raw().query(queries::JOB_LIST_EXPIRY_CANDIDATES, ()).await.map_err(StoreError::classify)?;
        collect(&mut rows).await
    }

    /// Trabajos ya destruidos, candidatos al barrido de tombstoning (spec
    /// §4.E). `list_live` los excluye deliberadamente, asi que esta es una
    /// consulta separada en vez de una reutilizacion con un filtro invertido.
    pub async fn list_destroyed(tx: &Tx) -> Result<Vec<Job>, StoreError> {
        let mut rows = tx.raw().query(queries::JOB_LIST_TOMBSTONE_CANDIDATES, ()).await.map_err(StoreError::classify)?;
        collect(&mut rows).await
    }

    pub async fn update_state(tx: &Tx, job_id: i64, state: JobState) -> Result<(), StoreError> {
        tx.raw().execute(queries::JOB_UPDATE_STATE, params![job_id, state.ordinal()]).await.map_err(StoreError::classify)?;
        Ok(())
    }

    pub async fn update_keepalive(tx: &Tx, job_id: i64, at: DateTime<Utc>, host: Option<&str>) -> Result<(), StoreError> {
        let affected = tx
            .raw()
            .execute(queries::JOB_UPDATE_KEEPALIVE, params![job_id, at.to_rfc3339(), host])
            .await
            .map_err(StoreError::classify)?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn set_allocation(
        tx: &Tx,
        job_id: i64,
        root_id: i64,
        width: u32,
        height: u32,
        depth: u32,
        allocation_size: u32,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        tx.raw()
            .execute(queries::JOB_SET_ALLOCATION, params![job_id, root_id, width, height, depth, allocation_size, at.to_rfc3339()])
            .await
            .map_err(StoreError::classify)?;
        Ok(())
    }

    pub async fn set_death(tx: &Tx, job_id: i64, reason: Option<&str>, at: DateTime<Utc>) -> Result<(), StoreError> {
        tx.raw()
            .execute(queries::JOB_SET_DEATH, params![job_id, at.to_rfc3339(), reason])
            .await
            .map_err(StoreError::classify)?;
        Ok(())
    }

    pub async fn mark_accounted_for(tx: &Tx, job_id: i64) -> Result<(), StoreError> {
        tx.raw().execute(queries::JOB_SET_ACCOUNTED_FOR, params![job_id]).await.map_err(StoreError::classify)?;
        Ok(())
    }

    pub async fn adjust_pending(tx: &Tx, job_id: i64, delta: i64) -> Result<(), StoreError> {
        tx.raw().execute(queries::JOB_ADJUST_PENDING, params![job_id, delta]).await.map_err(StoreError::classify)?;
        Ok(())
    }

    pub async fn delete(tx: &Tx, job_id: i64) -> Result<(), StoreError> {
        tx.raw().execute(queries::JOB_DELETE, params![job_id]).await.map_err(StoreError::classify)?;
        Ok(())
    }
}

async fn collect(rows: &mut libsql::Rows) -> Result<Vec<Job>, StoreError> {
    let mut jobs = Vec::new();
    while let Some(row) = rows.next().await.map_err(StoreError::classify)? {
        jobs.push(map_row(&row)?);
    }
    Ok(jobs)
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

fn map_row(row: &Row) -> Result<Job, StoreError> {
    let job_state = JobState::from_ordinal(row.get::<i64>(18).map_err(StoreError::classify)?)
        .ok_or_else(|| StoreError::MappingError("invalid job_state ordinal".into()))?;
    let create_timestamp = parse_timestamp(row.get(7).map_err(StoreError::classify)?)?
        .ok_or_else(|| StoreError::MappingError("create_timestamp is never null".into()))?;

    Ok(Job {
        job_id: row.get(0).map_err(StoreError::classify)?,
        machine_id: row.get(1).map_err(StoreError::classify)?,
        owner: row.get(2).map_err(StoreError::classify)?,
        group_id: row.get(3).map_err(StoreError::classify)?,
        keepalive_interval_seconds: row.get(4).map_err(StoreError::classify)?,
        keepalive_timestamp: parse_timestamp(row.get(5).map_err(StoreError::classify)?)?,
        keepalive_host: row.get(6).map_err(StoreError::classify)?,
        create_timestamp,
        allocation_timestamp: parse_timestamp(row.get(8).map_err(StoreError::classify)?)?,
        death_timestamp: parse_timestamp(row.get(9).map_err(StoreError::classify)?)?,
        death_reason: row.get(10).map_err(StoreError::classify)?,
        original_request: row.get(11).map_err(StoreError::classify)?,
        width: row.get::<Option<i64>>(12).map_err(StoreError::classify)?.map(|v| v as u32),
        height: row.get::<Option<i64>>(13).map_err(StoreError::classify)?.map(|v| v as u32),
        depth: row.get::<Option<i64>>(14).map_err(StoreError::classify)?.map(|v| v as u32),
        root_id: row.get(15).map_err(StoreError::classify)?,
        allocation_size: row.get::<Option<i64>>(16).map_err(StoreError::classify)?.map(|v| v as u32),
        num_pending: row.get::<i64>(17).map_err(StoreError::classify)? as u32,
        job_state,
        accounted_for: row.get::<i64>(19).map_err(StoreError::classify)? != 0,
    })
}
