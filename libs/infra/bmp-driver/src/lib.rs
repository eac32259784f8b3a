//! [libs/infra/bmp-driver/src/lib.rs]
//!
//! APARATO: SPALLOC BMP UPLINK
//! CLASIFICACION: INFRASTRUCTURE ADAPTER (ESTRATO L3)
//! RESPONSABILIDAD: canal fuera de banda hacia el Board Management
//! Processor de cada gabinete/marco: energia + enlaces FPGA, blacklist,
//! numero de serie. Expuesto como trait para que el PowerController sea
//! ajeno a si habla HTTP real o un doble de pruebas.

pub mod errors;
pub mod http;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use errors::BmpError;
pub use http::HttpBmpDriver;

use async_trait::async_trait;
use spalloc_domain_models::direction::LinkBitmap;
use std::time::Duration;

/// Comando de energia/enlaces para una sola placa dentro de un BMP.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerCommand {
    pub board_num: u32,
    pub power: bool,
    pub links: LinkBitmap,
}

/// Canal hacia un BMP identificado por su direccion de red (spec §6: "To the
/// BMP driver (abstract)"). Cada metodo honra el `deadline` pasado por el
/// llamador en vez de fijar su propio timeout, porque la politica de plazo
/// (`bmp_deadline`) vive en la configuracion del daemon, no en el driver.
#[async_trait]
pub trait BmpDriver: Send + Sync {
    /// Aplica energia y bitmap de enlaces FPGA a una placa.
    async fn apply_power(&self, address: &str, command: &PowerCommand, deadline: Duration) -> Result<(), BmpError>;

    /// Lee el contenido de blacklist actualmente programado en la placa.
    async fn read_blacklist(&self, address: &str, board_num: u32, deadline: Duration) -> Result<Vec<u8>, BmpError>;

    /// Escribe un nuevo contenido de blacklist en la placa.
    async fn write_blacklist(&self, address: &str, board_num: u32, data: &[u8], deadline: Duration) -> Result<(), BmpError>;

    /// Lee el numero de serie reportado por la placa.
    async fn read_serial(&self, address: &str, board_num: u32, deadline: Duration) -> Result<String, BmpError>;
}
