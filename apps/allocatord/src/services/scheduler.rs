// [apps/allocatord/src/services/scheduler.rs]
//! Supervisor de tareas periodicas (spec §4.G, §9): cada tarea nombrada
//! vive como un valor propio (nombre, periodo, manejador, bandera de
//! ejecucion), respeta la pausa global del `AppState`, y se protege de
//! reentrar sobre si misma cuando una pasada se alarga mas que su periodo.

use super::{Allocator, ExpirySweep, PowerController, QuotaManager, Tombstone};
use crate::state::AppState;
use spalloc_infra_store::repositories::MachineRepository;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, warn};

pub struct Scheduler;

impl Scheduler {
    /// Arranca todas las tareas de fondo del daemon y devuelve sus
    /// manejadores para que el llamador pueda esperar un apagado ordenado.
    pub async fn spawn_all(state: AppState) -> Result<Vec<JoinHandle<()>>, spalloc_infra_store::StoreError> {
        let mut handles = Vec::new();

        handles.push(spawn_periodic("allocator", state.clone(), state.config.allocator_period, |state| async move {
            Allocator::tick(&state).await.map_err(|e| e.to_string())
        }));

        handles.push(spawn_periodic("expiry_sweep", state.clone(), state.config.keepalive_expiry_period, |state| async move {
            ExpirySweep::tick(&state).await.map_err(|e| e.to_string())
        }));

        handles.push(spawn_periodic("tombstone", state.clone(), state.config.historical_period, |state| async move {
            Tombstone::tick(&state).await.map_err(|e| e.to_string())
        }));

        handles.push(spawn_periodic("quota_manager", state.clone(), state.config.quota_consolidation_period, |state| async move {
            QuotaManager::tick(&state).await.map_err(|e| e.to_string())
        }));

        let tx = state.store.begin().await?;
        let machines = MachineRepository::list(&tx).await?;
        tx.commit().await?;

        for machine in machines {
            handles.push(spawn_power_controller(state.clone(), machine.machine_id));
        }

        Ok(handles)
    }
}

/// Arranca una tarea periodica simple: temporizador propio, bandera de
/// pausa global, y una bandera de "en curso" por tarea para que un tick
/// que se demora no se solape con el siguiente (spec §4.G: "advisory lock
/// per task name prevents reentrant execution when a tick overruns").
fn spawn_periodic<F, Fut>(name: &'static str, state: AppState, period: Duration, handler: F) -> JoinHandle<()>
where
    F: Fn(AppState) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), String>> + Send + 'static,
{
    let running = Arc::new(AtomicBool::new(false));
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            if state.is_paused() {
                debug!(task = name, "scheduler paused, skipping tick");
                continue;
            }

            if running.swap(true, Ordering::AcqRel) {
                warn!(task = name, "previous tick still running, skipping this one");
                continue;
            }

            if let Err(error) = handler(state.clone()).await {
                error!(task = name, %error, "periodic task failed");
            }
            running.store(false, Ordering::Release);
        }
    })
}

/// El PowerController de una maquina corre tanto por su propio
/// temporizador como despertado por el Allocator (spec §4.D: "an
/// event-driven wake on allocator completion"), lo que antes llegue.
fn spawn_power_controller(state: AppState, machine_id: i64) -> JoinHandle<()> {
    let running = Arc::new(AtomicBool::new(false));
    tokio::spawn(async move {
        let mut ticker = interval(state.config.power_controller_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = state.wait_for_power_change(machine_id) => {}
            }

            if state.is_paused() {
                continue;
            }

            if running.swap(true, Ordering::AcqRel) {
                continue;
            }

            if let Err(error) = PowerController::tick(&state, machine_id).await {
                error!(task = "power_controller", machine_id, %error, "periodic task failed");
            }
            running.store(false, Ordering::Release);
        }
    })
}
