// [apps/allocatord/src/kernel.rs]
//! Raiz de composicion del daemon: conecta el Store y el driver BMP, arma
//! el `AppState`, y arranca/detiene ordenadamente las tareas periodicas
//! (spec §4.G, §5: "graceful shutdown signals all periodic tasks, waits a
//! bounded drain window, then forces close").

use crate::services::Scheduler;
use crate::state::AppState;
use spalloc_infra_bmp::HttpBmpDriver;
use spalloc_infra_store::repositories::PendingChangeRepository;
use spalloc_infra_store::StoreClient;
use spalloc_shared_config::Config;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Ventana de gracia antes de abortar tareas que no terminaron solas tras
/// la senal de apagado.
const SHUTDOWN_DRAIN: Duration = Duration::from_secs(5);

pub struct AllocatorKernel {
    state: AppState,
}

impl AllocatorKernel {
    /// Abre la conexion al Store (aplicando el esquema si hace falta),
    /// construye el driver BMP real, y ensambla el estado compartido.
    pub async fn ignite(database_url: &str, auth_token: Option<String>, config: Config) -> Result<Self, spalloc_infra_store::StoreError> {
        let store = StoreClient::connect(database_url, auth_token).await?;

        let tx = store.begin().await?;
        PendingChangeRepository::clear_all_in_progress(&tx).await?;
        tx.commit().await?;

        let bmp = Arc::new(HttpBmpDriver::new());
        let state = AppState::new(store, bmp, config);
        Ok(Self { state })
    }

    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Arranca todas las tareas de fondo y bloquea hasta recibir la senal
    /// de apagado del proceso, momento en el que se les da una ventana
    /// acotada para drenar antes de abandonarlas.
    pub async fn run(self) -> Result<(), spalloc_infra_store::StoreError> {
        let handles: Vec<JoinHandle<()>> = Scheduler::spawn_all(self.state.clone()).await?;
        info!(tasks = handles.len(), "scheduler online");

        wait_for_shutdown_signal().await;
        info!("shutdown signal received, pausing scheduler");
        self.state.set_paused(true);

        tokio::time::sleep(SHUTDOWN_DRAIN).await;
        warn!("drain window elapsed, aborting remaining tasks");

        for handle in handles {
            handle.abort();
        }
        Ok(())
    }
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = terminate.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
