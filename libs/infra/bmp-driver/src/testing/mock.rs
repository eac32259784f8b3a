// [libs/infra/bmp-driver/src/testing/mock.rs]
//! Doble en memoria de un BMP. Registra cada comando recibido para que las
//! pruebas puedan afirmar sobre ellos, y puede inyectar fallos para un
//! subconjunto de direcciones (simula una placa o gabinete caido).

use crate::errors::BmpError;
use crate::{BmpDriver, PowerCommand};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

/// Un comando de energia tal como fue recibido por el doble, con su BMP de
/// origen (las pruebas comparan contra esto en vez de contra filas crudas
/// de `pending_changes`).
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedPowerCommand {
    pub address: String,
    pub command: PowerCommand,
}

#[derive(Default)]
struct MockState {
    power_calls: Vec<RecordedPowerCommand>,
    blacklists: std::collections::HashMap<(String, u32), Vec<u8>>,
    failing_addresses: HashSet<String>,
}

/// Doble de `BmpDriver` que mantiene el blacklist escrito en memoria y
/// permite marcar direcciones concretas como fallidas con
/// `fail_address`/`recover_address`, para ejercitar la ruta de reintento
/// con backoff del PowerController sin un BMP real.
pub struct MockBmpDriver {
    state: Mutex<MockState>,
}

impl MockBmpDriver {
    pub fn new() -> Self {
        Self { state: Mutex::new(MockState::default()) }
    }

    pub fn fail_address(&self, address: &str) {
        self.state.lock().unwrap().failing_addresses.insert(address.to_string());
    }

    pub fn recover_address(&self, address: &str) {
        self.state.lock().unwrap().failing_addresses.remove(address);
    }

    pub fn power_calls(&self) -> Vec<RecordedPowerCommand> {
        self.state.lock().unwrap().power_calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().power_calls.len()
    }
}

impl Default for MockBmpDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BmpDriver for MockBmpDriver {
    async fn apply_power(&self, address: &str, command: &PowerCommand, _deadline: Duration) -> Result<(), BmpError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_addresses.contains(address) {
            return Err(BmpError::Rejected(format!("simulated failure at {address}")));
        }
        state.power_calls.push(RecordedPowerCommand { address: address.to_string(), command: command.clone() });
        Ok(())
    }

    async fn read_blacklist(&self, address: &str, board_num: u32, _deadline: Duration) -> Result<Vec<u8>, BmpError> {
        let state = self.state.lock().unwrap();
        if state.failing_addresses.contains(address) {
            return Err(BmpError::Rejected(format!("simulated failure at {address}")));
        }
        Ok(state.blacklists.get(&(address.to_string(), board_num)).cloned().unwrap_or_default())
    }

    async fn write_blacklist(&self, address: &str, board_num: u32, data: &[u8], _deadline: Duration) -> Result<(), BmpError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_addresses.contains(address) {
            return Err(BmpError::Rejected(format!("simulated failure at {address}")));
        }
        state.blacklists.insert((address.to_string(), board_num), data.to_vec());
        Ok(())
    }

    async fn read_serial(&self, address: &str, board_num: u32, _deadline: Duration) -> Result<String, BmpError> {
        let state = self.state.lock().unwrap();
        if state.failing_addresses.contains(address) {
            return Err(BmpError::Rejected(format!("simulated failure at {address}")));
        }
        Ok(format!("mock-serial-{address}-{board_num}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spalloc_domain_models::direction::LinkBitmap;

    fn command() -> PowerCommand {
        PowerCommand { board_num: 3, power: true, links: LinkBitmap::none() }
    }

    #[tokio::test]
    async fn records_successful_power_calls() {
        let driver = MockBmpDriver::new();
        driver.apply_power("10.0.0.1", &command(), Duration::from_secs(1)).await.unwrap();
        assert_eq!(driver.call_count(), 1);
        assert_eq!(driver.power_calls()[0].address, "10.0.0.1");
    }

    #[tokio::test]
    async fn failing_address_rejects_and_does_not_record() {
        let driver = MockBmpDriver::new();
        driver.fail_address("10.0.0.2");
        let result = driver.apply_power("10.0.0.2", &command(), Duration::from_secs(1)).await;
        assert!(result.is_err());
        assert_eq!(driver.call_count(), 0);
    }

    #[tokio::test]
    async fn recover_address_allows_retry_to_succeed() {
        let driver = MockBmpDriver::new();
        driver.fail_address("10.0.0.3");
        assert!(driver.apply_power("10.0.0.3", &command(), Duration::from_secs(1)).await.is_err());
        driver.recover_address("10.0.0.3");
        assert!(driver.apply_power("10.0.0.3", &command(), Duration::from_secs(1)).await.is_ok());
    }

    #[tokio::test]
    async fn blacklist_round_trips_through_write_then_read() {
        let driver = MockBmpDriver::new();
        driver.write_blacklist("10.0.0.4", 2, &[1, 2, 3], Duration::from_secs(1)).await.unwrap();
        let data = driver.read_blacklist("10.0.0.4", 2, Duration::from_secs(1)).await.unwrap();
        assert_eq!(data, vec![1, 2, 3]);
    }
}
