// [libs/infra/store/src/repositories/quota.rs]

use crate::client::Tx;
use crate::errors::StoreError;
use crate::queries;
use libsql::{params, Row};
use spalloc_domain_models::{GroupQuota, JobUsage};

pub struct QuotaRepository;

impl QuotaRepository {
    pub async fn get_group(tx: &Tx, group_id: i64) -> Result<Option<GroupQuota>, StoreError> {
        let mut rows = tx.raw().query(queries::QUOTA_GET_GROUP, params![group_id]).await.map_err(StoreError::classify)?;
        match rows.next().await.map_err(StoreError::classify)? {
            Some(row) => Ok(Some(GroupQuota {
                group_id: row.get(0).map_err(StoreError::classify)?,
                quota: row.get(1).map_err(StoreError::classify)?,
            })),
            None => Ok(None),
        }
    }

    pub async fn upsert_group(tx: &Tx, group: &GroupQuota) -> Result<(), StoreError> {
        tx.raw().execute(queries::QUOTA_UPSERT_GROUP, params![group.group_id, group.quota]).await.map_err(StoreError::classify)?;
        Ok(())
    }

    /// Consolidacion periodica (spec §4.F): resta `amount` del remanente del
    /// grupo con piso en cero, sin efecto sobre grupos ilimitados (la
    /// clausula `quota IS NOT NULL` en SQL).
    pub async fn consume(tx: &Tx, group_id: i64, amount: i64) -> Result<(), StoreError> {
        tx.raw().execute(queries::QUOTA_CONSUME, params![group_id, amount]).await.map_err(StoreError::classify)?;
        Ok(())
    }

    pub async fn get_job_usage(tx: &Tx, job_id: i64) -> Result<Option<JobUsage>, StoreError> {
        let mut rows = tx.raw().query(queries::JOB_USAGE_GET, params![job_id]).await.map_err(StoreError::classify)?;
        match rows.next().await.map_err(StoreError::classify)? {
            Some(row) => Ok(Some(map_usage_row(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn upsert_job_usage(tx: &Tx, job_id: i64, group_id: i64, quota_used: i64) -> Result<(), StoreError> {
        tx.raw().execute(queries::JOB_USAGE_UPSERT, params![job_id, group_id, quota_used]).await.map_err(StoreError::classify)?;
        Ok(())
    }

    /// Los usos de trabajos ya destruidos que el QuotaManager todavia no
    /// descargo contra la cuota de su grupo (spec §4.F).
    pub async fn list_unaccounted_for_dead_jobs(tx: &Tx) -> Result<Vec<JobUsage>, StoreError> {
        let mut rows = tx.raw().query(queries::JOB_USAGE_LIST_UNACCOUNTED_FOR_DEAD_JOBS, ()).await.map_err(StoreError::classify)?;
        let mut usages = Vec::new();
        while let Some(row) = rows.next().await.map_err(StoreError::classify)? {
            usages.push(map_usage_row(&row)?);
        }
        Ok(usages)
    }

    pub async fn mark_job_usage_accounted(tx: &Tx, job_id: i64) -> Result<(), StoreError> {
        tx.raw().execute(queries::JOB_USAGE_MARK_ACCOUNTED, params![job_id]).await.map_err(StoreError::classify)?;
        Ok(())
    }

    /// Uso ya registrado contra trabajos muertos pero que el QuotaManager
    /// todavia no descargo de `group_quotas.quota` (spec §4.F: la admision
    /// debe verlo como ya comprometido, no como cupo libre).
    pub async fn sum_unaccounted_for_group(tx: &Tx, group_id: i64) -> Result<i64, StoreError> {
        let mut rows = tx.raw().query(queries::JOB_USAGE_SUM_UNACCOUNTED_FOR_GROUP, params![group_id]).await.map_err(StoreError::classify)?;
        let row = rows.next().await.map_err(StoreError::classify)?.ok_or(StoreError::NotFound)?;
        row.get(0).map_err(StoreError::classify)
    }
}

fn map_usage_row(row: &Row) -> Result<JobUsage, StoreError> {
    Ok(JobUsage {
        job_id: row.get(0).map_err(StoreError::classify)?,
        group_id: row.get(1).map_err(StoreError::classify)?,
        quota_used: row.get(2).map_err(StoreError::classify)?,
        accounted_for: row.get::<i64>(3).map_err(StoreError::classify)? != 0,
    })
}
