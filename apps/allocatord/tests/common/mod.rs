// [apps/allocatord/tests/common/mod.rs]
//! Arnes compartido entre las pruebas de integracion del daemon: una
//! maquina plana sembrada en un Store en memoria, un `MockBmpDriver` en vez
//! de un BMP real, y una `Config` con los tiempos de permanencia de energia
//! a cero para que las pruebas no tengan que esperar relojes reales.

use spalloc_allocatord::state::AppState;
use spalloc_infra_bmp::testing::MockBmpDriver;
use spalloc_infra_store::testing::{seed_flat_machine, SeededMachine};
use spalloc_infra_store::StoreClient;
use spalloc_shared_config::Config;
use std::sync::Arc;
use std::time::Duration;

pub struct Harness {
    pub state: AppState,
    pub bmp: Arc<MockBmpDriver>,
}

/// Siembra una maquina `width x height x 1` sin placas muertas salvo las
/// listadas en `dead`, y arma un `AppState` sobre ella.
pub async fn harness(width: u32, height: u32, dead: &[(u32, u32)]) -> (Harness, SeededMachine) {
    let store = StoreClient::connect(":memory:", None).await.expect("open in-memory store");

    let tx = store.begin().await.expect("begin seed transaction");
    let seeded = seed_flat_machine(&tx, "test-machine", width, height, dead).await.expect("seed flat machine");
    tx.commit().await.expect("commit seed transaction");

    let bmp = Arc::new(MockBmpDriver::new());
    let config = Config { bmp_min_off: Duration::from_secs(0), bmp_min_on: Duration::from_secs(0), ..Config::default() };
    let state = AppState::new(store, bmp.clone(), config);

    (Harness { state, bmp }, seeded)
}
