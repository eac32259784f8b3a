// [apps/allocatord/src/services/quota_manager.rs]
//! Presupuesto de placa-segundos por grupo (spec §4.F): la mitad de
//! lectura que la fachada de envio consulta antes de aceptar una
//! solicitud, y la consolidacion periodica que descarga el uso de los
//! trabajos ya muertos contra la cuota de su grupo.

use crate::state::AppState;
use spalloc_infra_store::repositories::QuotaRepository;
use spalloc_infra_store::{StoreError, Tx};
use tracing::{info, instrument};

pub struct QuotaManager;

impl QuotaManager {
    /// Remanente de un grupo, para la comprobacion de admision en el envio
    /// (SPEC_FULL §11: `QuotaManager::remaining(group_id)`). `None` significa
    /// sin limite.
    pub async fn remaining(tx: &Tx, group_id: i64) -> Result<Option<i64>, StoreError> {
        match QuotaRepository::get_group(tx, group_id).await? {
            Some(quota) => Ok(quota.quota),
            None => Ok(None),
        }
    }

    /// Consolida, uno a la vez y cada uno en su propia transaccion (spec
    /// §4.F: "One job at a time, each its own transaction, to avoid long
    /// locks"), el uso de los trabajos ya destruidos que todavia no se
    /// descargaron contra la cuota de su grupo.
    #[instrument(skip(state))]
    pub async fn tick(state: &AppState) -> Result<(), StoreError> {
        let tx = state.store.begin().await?;
        let unaccounted = QuotaRepository::list_unaccounted_for_dead_jobs(&tx).await?;
        tx.commit().await?;

        for usage in unaccounted {
            let tx = state.store.begin().await?;
            QuotaRepository::consume(&tx, usage.group_id, usage.quota_used).await?;
            QuotaRepository::mark_job_usage_accounted(&tx, usage.job_id).await?;
            tx.commit().await?;
            info!(job_id = usage.job_id, group_id = usage.group_id, quota_used = usage.quota_used, "quota consolidated");
        }

        Ok(())
    }
}
