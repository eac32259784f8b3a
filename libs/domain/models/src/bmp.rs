//! [libs/domain/models/src/bmp.rs]
//! Board Management Processor: controlador fuera de banda que agrupa un
//! conjunto de placas dentro de un mismo gabinete/marco.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bmp {
    pub bmp_id: i64,
    pub machine_id: i64,
    pub cabinet: u32,
    pub frame: u32,
    pub address: String,
}
