// [apps/allocatord/src/services/power_controller.rs]
//! El PowerController (spec §4.D): drena `pending_changes` por maquina,
//! agrupa por BMP, y despacha un trabajador acotado por grupo que habla
//! con el driver de energia. Corre tanto por temporizador propio como
//! despertado por el Allocator tras cada colocacion.

use crate::errors::AllocatorError;
use crate::state::AppState;
use chrono::Utc;
use spalloc_domain_models::{HistoricalAllocation, JobState, PendingChange};
use spalloc_infra_bmp::PowerCommand;
use spalloc_infra_store::repositories::{BmpRepository, BoardRepository, HistoricalRepository, JobRepository, PendingChangeRepository, QuotaRepository};
use std::collections::HashMap;
use tracing::{info, instrument, warn};

/// Tope de fallos consecutivos de un mismo cambio pendiente antes de darlo
/// por perdido y destruir el trabajo (spec §4.D: "after N failures, destroy
/// the job"). El spec no fija N; se elige un valor pequeno y conservador.
const MAX_BMP_FAILURES: i64 = 5;

pub struct PowerController;

impl PowerController {
    /// Un barrido completo para una maquina: agrupa los cambios pendientes
    /// no-en-curso por BMP y lanza un trabajador por grupo.
    #[instrument(skip(state))]
    pub async fn tick(state: &AppState, machine_id: i64) -> Result<(), AllocatorError> {
        let tx = state.store.begin().await?;
        let changes = PendingChangeRepository::list_for_machine_by_bmp(&tx, machine_id).await?;
        tx.commit().await?;

        let pending: Vec<(i64, PendingChange)> = changes.into_iter().filter(|(_, change)| !change.in_progress).collect();
        if pending.is_empty() {
            return Ok(());
        }

        let mut by_bmp: HashMap<i64, Vec<PendingChange>> = HashMap::new();
        for (bmp_id, change) in pending {
            by_bmp.entry(bmp_id).or_default().push(change);
        }

        let mut handles = Vec::new();
        for (bmp_id, group) in by_bmp {
            let state = state.clone();
            handles.push(tokio::spawn(async move {
                for change in group {
                    if let Err(error) = Self::apply_one(&state, bmp_id, change).await {
                        warn!(bmp_id, %error, "pending change processing failed");
                    }
                }
            }));
        }
        for handle in handles {
            let _ = handle.await;
        }

        Ok(())
    }

    /// Aplica un unico cambio pendiente: marca en curso, consulta al driver,
    /// y liquida la fila segun el resultado.
    async fn apply_one(state: &AppState, bmp_id: i64, change: PendingChange) -> Result<(), AllocatorError> {
        let tx = state.store.begin().await?;
        let bmp = BmpRepository::get(&tx, bmp_id).await?;
        let board = BoardRepository::get(&tx, change.board_id).await?;
        tx.commit().await?;

        let now = Utc::now();
        if !board.power_dwell_ok(now, change.power, state.config.bmp_min_off, state.config.bmp_min_on) {
            // Todavia no cumple la permanencia minima: se deja para el
            // proximo tick sin tocar `in_progress` ni el contador de fallos.
            return Ok(());
        }

        let tx = state.store.begin().await?;
        PendingChangeRepository::mark_in_progress(&tx, change.change_id, true).await?;
        tx.commit().await?;

        let command = PowerCommand { board_num: board.board_num, power: change.power, links: change.links };
        let address = board.address.as_deref().unwrap_or(&bmp.address);
        let result = state.bmp.apply_power(address, &command, state.config.bmp_deadline).await;

        match result {
            Ok(()) => Self::settle_success(state, &change, board.board_id).await,
            Err(error) => Self::settle_failure(state, &change, &error.to_string()).await,
        }
    }

    async fn settle_success(state: &AppState, change: &PendingChange, board_id: i64) -> Result<(), AllocatorError> {
        let now = Utc::now();
        let tx = state.store.begin().await?;

        BoardRepository::set_power(&tx, board_id, change.power, now).await?;
        if change.to_state == JobState::Destroyed {
            // El tombstoning (spec §4.E) copia este registro mas tarde;
            // capturarlo aqui evita depender de `boards.allocated_job`
            // despues de que quede en blanco.
            HistoricalRepository::insert_allocation(&tx, &HistoricalAllocation { job_id: change.job_id, board_id }).await?;
            BoardRepository::set_allocated_job(&tx, board_id, None).await?;
        }
        PendingChangeRepository::delete(&tx, change.change_id).await?;
        JobRepository::adjust_pending(&tx, change.job_id, -1).await?;

        let job = JobRepository::get(&tx, change.job_id).await?;
        if job.num_pending == 0 && job.job_state == JobState::Power {
            if change.to_state == JobState::Destroyed {
                // El consumo de cuota se congela en el momento de la
                // destruccion efectiva, no al morir logicamente (spec §4.F
                // consume board-segundos reales de energia encendida).
                QuotaRepository::upsert_job_usage(&tx, job.job_id, job.group_id, job.quota_used(now)).await?;
            }
            JobRepository::update_state(&tx, change.job_id, change.to_state).await?;
            info!(job_id = change.job_id, to_state = ?change.to_state, "job settled after last pending change");
        }

        tx.commit().await?;
        Ok(())
    }

    async fn settle_failure(state: &AppState, change: &PendingChange, reason: &str) -> Result<(), AllocatorError> {
        let tx = state.store.begin().await?;
        let failure_count = PendingChangeRepository::record_failure(&tx, change.change_id).await?;

        if failure_count >= MAX_BMP_FAILURES {
            warn!(job_id = change.job_id, change_id = change.change_id, failure_count, "bmp failure cap exceeded, destroying job");
            let now = Utc::now();
            let job = JobRepository::get(&tx, change.job_id).await?;
            QuotaRepository::upsert_job_usage(&tx, job.job_id, job.group_id, job.quota_used(now)).await?;
            PendingChangeRepository::delete(&tx, change.change_id).await?;
            JobRepository::set_death(&tx, change.job_id, Some("bmp failure"), now).await?;
            JobRepository::update_state(&tx, change.job_id, JobState::Destroyed).await?;
        } else {
            warn!(job_id = change.job_id, change_id = change.change_id, failure_count, reason, "bmp call failed, will retry");
        }

        tx.commit().await?;
        Ok(())
    }
}
