// [apps/allocatord/src/state/mod.rs]
//! Estado compartido del daemon: la conexion al Store, el driver BMP, la
//! configuracion resuelta y la senalizacion evento-a-evento entre el
//! Allocator y el PowerController (spec §4.D: "an event-driven wake on
//! allocator completion").

use spalloc_infra_bmp::BmpDriver;
use spalloc_infra_store::StoreClient;
use spalloc_shared_config::Config;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tracing::debug;

/// Contenedor de estado compartido entre todas las tareas periodicas y la
/// fachada de envio/keepalive/destruccion. Barato de clonar: todo lo que
/// pesa vive detras de un `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub store: StoreClient,
    pub bmp: Arc<dyn BmpDriver>,
    pub config: Arc<Config>,
    /// Bandera global del Scheduler (spec §4.G): cuando esta activa, las
    /// tareas periodicas se cortocircuitan sin tocar el Store.
    paused: Arc<AtomicBool>,
    /// Un `Notify` por maquina, creado perezosamente: el Allocator lo
    /// dispara tras comprometer cambios de perimetro; el PowerController
    /// espera en el junto a su propio temporizador.
    power_notifiers: Arc<Mutex<HashMap<i64, Arc<Notify>>>>,
}

impl AppState {
    pub fn new(store: StoreClient, bmp: Arc<dyn BmpDriver>, config: Config) -> Self {
        let paused = config.paused;
        Self {
            store,
            bmp,
            config: Arc::new(config),
            paused: Arc::new(AtomicBool::new(paused)),
            power_notifiers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    pub fn set_paused(&self, paused: bool) {
        debug!(paused, "scheduler pause flag changed");
        self.paused.store(paused, Ordering::Relaxed);
    }

    /// El `Notify` asociado a una maquina, creandolo si es la primera vez
    /// que se referencia.
    fn notifier_for(&self, machine_id: i64) -> Arc<Notify> {
        let mut notifiers = self.power_notifiers.lock().expect("power notifier registry poisoned");
        notifiers.entry(machine_id).or_insert_with(|| Arc::new(Notify::new())).clone()
    }

    /// Despierta el PowerController de una maquina (spec §4.D, despertar
    /// guiado por eventos tras cada finalizacion del Allocator).
    pub fn notify_power_change(&self, machine_id: i64) {
        self.notifier_for(machine_id).notify_waiters();
    }

    /// Un future que se resuelve en la proxima `notify_power_change` de esa
    /// maquina; el llamador lo selecciona junto a su propio temporizador.
    pub async fn wait_for_power_change(&self, machine_id: i64) {
        self.notifier_for(machine_id).notified().await;
    }
}
