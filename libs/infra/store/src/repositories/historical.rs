// [libs/infra/store/src/repositories/historical.rs]
//! Escrituras de tombstoning (spec §4.E). Siempre dentro de la misma
//! transaccion que borra el trabajo vivo, para que la migracion sea
//! atomica (spec §8 invariante 4: "Tombstoned job_ids never reappear").

use crate::client::Tx;
use crate::errors::StoreError;
use crate::queries;
use libsql::params;
use spalloc_domain_models::{HistoricalAllocation, HistoricalJob};

pub struct HistoricalRepository;

impl HistoricalRepository {
    pub async fn insert_job(tx: &Tx, job: &HistoricalJob) -> Result<(), StoreError> {
        tx.raw()
            .execute(
                queries::HISTORICAL_JOB_INSERT,
                params![
                    job.job_id,
                    job.machine_id,
                    job.owner.clone(),
                    job.group_id,
                    job.create_timestamp.to_rfc3339(),
                    job.allocation_timestamp.map(|t| t.to_rfc3339()),
                    job.death_timestamp.to_rfc3339(),
                    job.death_reason.clone(),
                    job.allocation_size,
                ],
            )
            .await
            .map_err(StoreError::classify)?;
        Ok(())
    }

    pub async fn insert_allocation(tx: &Tx, allocation: &HistoricalAllocation) -> Result<(), StoreError> {
        tx.raw()
            .execute(queries::HISTORICAL_ALLOCATION_INSERT, params![allocation.job_id, allocation.board_id])
            .await
            .map_err(StoreError::classify)?;
        Ok(())
    }
}
