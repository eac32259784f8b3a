// [apps/allocatord/src/services/epoch.rs]
//! Ciclo de vida de los trabajos mas alla de la colocacion (spec §4.E):
//! el barrido de expiracion de keepalive, y el tombstoning periodico que
//! traslada trabajos muertos al almacen historico.

use crate::state::AppState;
use spalloc_domain_models::{HistoricalJob, Job, JobState, PendingChange};
use spalloc_infra_store::repositories::{BoardRepository, HistoricalRepository, JobRepository, PendingChangeRepository, QuotaRepository, RequestRepository};
use spalloc_infra_store::{StoreError, Tx};
use std::collections::HashSet;
use tracing::{info, instrument, warn};

pub struct ExpirySweep;

impl ExpirySweep {
    /// Encuentra trabajos cuyo keepalive vencio y entra la ruta de
    /// destruccion: emite un apagado pendiente por placa asignada y deja el
    /// trabajo en `Power` hasta que el PowerController liquide esos cambios.
    #[instrument(skip(state))]
    pub async fn tick(state: &AppState) -> Result<(), StoreError> {
        let now = chrono::Utc::now();
        let tx = state.store.begin().await?;
        let candidates = JobRepository::list_expiry_candidates(&tx).await?;
        tx.commit().await?;

        let mut touched_machines = HashSet::new();
        for job in candidates {
            if !job.is_live() || !job.keepalive_expired(now) {
                continue;
            }
            warn!(job_id = job.job_id, "keepalive expired, destroying job");
            let machine_id = job.machine_id;
            let tx = state.store.begin().await?;
            RequestRepository::delete_for_job(&tx, job.job_id).await?;
            destroy_job(&tx, &job, "keepalive expired").await?;
            tx.commit().await?;
            touched_machines.insert(machine_id);
        }

        for machine_id in touched_machines {
            state.notify_power_change(machine_id);
        }
        Ok(())
    }
}

/// Emite un `PendingChange` de apagado por cada placa actualmente asignada
/// al trabajo y marca la razon de muerte; el trabajo se asienta en
/// `Destroyed` cuando el PowerController liquide esos cambios (spec §4.D:
/// "A destroy path emits POWER=OFF PendingChanges for every currently
/// allocated board").
/// Punto de entrada unico de la ruta de destruccion (spec §4.D): lo usan el
/// ExpirySweep y la fachada de envio/destruccion por igual, para que un
/// trabajo destruido explicitamente recorra exactamente el mismo camino que
/// uno que expiro por keepalive.
pub async fn destroy_job(tx: &Tx, job: &Job, reason: &str) -> Result<(), StoreError> {
    let boards = BoardRepository::list_allocated_to(tx, job.job_id).await?;
    let now = chrono::Utc::now();
    JobRepository::set_death(tx, job.job_id, Some(reason), now).await?;

    if boards.is_empty() {
        QuotaRepository::upsert_job_usage(tx, job.job_id, job.group_id, job.quota_used(now)).await?;
        JobRepository::update_state(tx, job.job_id, JobState::Destroyed).await?;
        return Ok(());
    }

    JobRepository::update_state(tx, job.job_id, JobState::Power).await?;
    for board in &boards {
        PendingChangeRepository::insert(tx, &PendingChange::power_off(job.job_id, board.board_id, job.job_state)).await?;
    }
    JobRepository::adjust_pending(tx, job.job_id, boards.len() as i64).await?;
    Ok(())
}

pub struct Tombstone;

impl Tombstone {
    /// Traslada al almacen historico los trabajos destruidos cuya ventana
    /// de gracia expiro, y borra su rastro de la tabla de trabajos vivos.
    /// Las asignaciones de placa ya quedaron copiadas al historico cuando
    /// el PowerController aplico el ultimo apagado (spec §4.D), asi que
    /// aqui solo falta el propio registro de trabajo.
    #[instrument(skip(state))]
    pub async fn tick(state: &AppState) -> Result<(), StoreError> {
        let now = chrono::Utc::now();
        let grace = state.config.historical_grace_period;

        let tx = state.store.begin().await?;
        let destroyed = JobRepository::list_destroyed(&tx).await?;
        tx.commit().await?;

        for job in destroyed {
            let Some(death_timestamp) = job.death_timestamp else { continue };
            let Ok(elapsed) = (now - death_timestamp).to_std() else { continue };
            if elapsed < grace {
                continue;
            }

            let tx = state.store.begin().await?;
            HistoricalRepository::insert_job(
                &tx,
                &HistoricalJob {
                    job_id: job.job_id,
                    machine_id: job.machine_id,
                    owner: job.owner.clone(),
                    group_id: job.group_id,
                    create_timestamp: job.create_timestamp,
                    allocation_timestamp: job.allocation_timestamp,
                    death_timestamp,
                    death_reason: job.death_reason.clone(),
                    allocation_size: job.allocation_size,
                },
            )
            .await?;

            RequestRepository::delete_for_job(&tx, job.job_id).await?;
            JobRepository::delete(&tx, job.job_id).await?;
            tx.commit().await?;
            info!(job_id = job.job_id, "job tombstoned");
        }

        Ok(())
    }
}
