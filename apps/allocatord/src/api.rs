// [apps/allocatord/src/api.rs]
//! La fachada de envio/keepalive/destruccion/consulta (spec §6 "To the
//! submit/HTTP surface", aunque el transporte en si queda fuera de
//! alcance). Cualquier cliente embebido del daemon pasa por aqui; cada
//! metodo abre su propia transaccion.

use crate::errors::AllocatorError;
use crate::state::AppState;
use chrono::Utc;
use spalloc_domain_models::{GroupQuota, Job, JobState, RequestShape};
use spalloc_infra_store::repositories::{JobRepository, MachineRepository, QuotaRepository, RequestRepository};

pub struct Api;

/// Parametros de una nueva solicitud de trabajo (spec §4.A "Submission").
pub struct SubmitRequest {
    pub machine_name: String,
    pub owner: String,
    pub group_id: i64,
    pub keepalive_interval_seconds: i64,
    pub keepalive_host: Option<String>,
    pub shape: RequestShape,
    pub max_dead_boards: u32,
    pub priority: i64,
    pub original_request: Vec<u8>,
}

impl Api {
    /// Acepta una solicitud nueva, rechazandola si la maquina no existe o si
    /// el grupo ya agoto su cuota (spec §7: `QuotaExceeded`/`NoSuchMachine`
    /// se devuelven al llamador, nunca se reintentan localmente).
    pub async fn submit(state: &AppState, request: SubmitRequest) -> Result<i64, AllocatorError> {
        let tx = state.store.begin().await?;

        let machine = MachineRepository::get_by_name(&tx, &request.machine_name)
            .await
            .map_err(|_| AllocatorError::BadRequest(format!("no such machine: {}", request.machine_name)))?;

        if QuotaRepository::get_group(&tx, request.group_id).await?.is_none() {
            let seed = if state.config.quota_default > 0 { Some(state.config.quota_default) } else { None };
            QuotaRepository::upsert_group(&tx, &GroupQuota { group_id: request.group_id, quota: seed }).await?;
        }

        let now = Utc::now();

        // Remaining quota minus what's already committed: jobs still live
        // (their usage not yet written, since that only happens at
        // destruction) and jobs already dead but not yet consolidated by
        // the QuotaManager (spec §4.F).
        if let Some(quota) = QuotaRepository::get_group(&tx, request.group_id).await?.and_then(|q| q.quota) {
            let in_flight: i64 = JobRepository::list_live_for_group(&tx, request.group_id)
                .await?
                .iter()
                .map(|job| job.quota_used(now))
                .sum();
            let unconsolidated = QuotaRepository::sum_unaccounted_for_group(&tx, request.group_id).await?;
            if quota - in_flight - unconsolidated <= 0 {
                return Err(AllocatorError::QuotaExceeded);
            }
        }

        let job_id = JobRepository::insert(
            &tx,
            machine.machine_id,
            &request.owner,
            request.group_id,
            request.keepalive_interval_seconds,
            request.keepalive_host.as_deref(),
            now,
            &request.original_request,
        )
        .await?;

        RequestRepository::insert(&tx, job_id, &request.shape, request.max_dead_boards, request.priority).await?;

        tx.commit().await?;
        Ok(job_id)
    }

    /// Refresca el latido de un trabajo vivo (spec §6: `keepalive(job_id,
    /// host) -> ok|JobGone`).
    pub async fn keepalive(state: &AppState, job_id: i64, host: Option<&str>) -> Result<(), AllocatorError> {
        let tx = state.store.begin().await?;
        let job = JobRepository::get(&tx, job_id).await.map_err(|_| AllocatorError::JobNotFound(job_id))?;
        if !job.is_live() {
            return Err(AllocatorError::JobNotFound(job_id));
        }
        JobRepository::update_keepalive(&tx, job_id, Utc::now(), host).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Destruye un trabajo explicitamente (spec §6: `destroy(job_id, reason)
    /// -> ok`), siguiendo la misma ruta de apagado que usan el ExpirySweep y
    /// el fallo de BMP: si tiene placas asignadas, se encolan apagados y el
    /// trabajo se asienta en `Destroyed` cuando el PowerController termine.
    pub async fn destroy(state: &AppState, job_id: i64, reason: &str) -> Result<(), AllocatorError> {
        let tx = state.store.begin().await?;
        let job = JobRepository::get(&tx, job_id).await.map_err(|_| AllocatorError::JobNotFound(job_id))?;
        if !job.is_live() {
            tx.commit().await?;
            return Ok(());
        }

        RequestRepository::delete_for_job(&tx, job_id).await?;
        crate::services::destroy_live_job(&tx, &job, reason).await?;
        tx.commit().await?;

        state.notify_power_change(job.machine_id);
        Ok(())
    }

    pub async fn get_job(state: &AppState, job_id: i64) -> Result<Job, AllocatorError> {
        let tx = state.store.begin().await?;
        let job = JobRepository::get(&tx, job_id).await.map_err(|_| AllocatorError::JobNotFound(job_id))?;
        tx.commit().await?;
        Ok(job)
    }

    pub async fn list_live_jobs(state: &AppState) -> Result<Vec<Job>, AllocatorError> {
        let tx = state.store.begin().await?;
        let jobs = JobRepository::list_live(&tx).await?;
        tx.commit().await?;
        Ok(jobs)
    }

    /// Supplemented operation (no listada en la tabla de interfaces
    /// externas, pero natural junto a `list_live_jobs`): los trabajos vivos
    /// de un unico propietario.
    pub async fn list_jobs_for_owner(state: &AppState, owner: &str) -> Result<Vec<Job>, AllocatorError> {
        let tx = state.store.begin().await?;
        let jobs = JobRepository::list_for_owner(&tx, owner).await?;
        tx.commit().await?;
        Ok(jobs)
    }

    /// spec §6: `listMachines(includeOutOfService)`.
    pub async fn list_machines(state: &AppState, include_out_of_service: bool) -> Result<Vec<spalloc_domain_models::Machine>, AllocatorError> {
        let tx = state.store.begin().await?;
        let machines = if include_out_of_service { MachineRepository::list_all(&tx).await? } else { MachineRepository::list(&tx).await? };
        tx.commit().await?;
        Ok(machines)
    }
}

/// Verdadero unicamente cuando un trabajo ya esta en `Destroyed`, usado por
/// los llamadores que necesitan decidir si todavia vale la pena tocarlo.
pub fn is_terminal(state: JobState) -> bool {
    state == JobState::Destroyed
}
