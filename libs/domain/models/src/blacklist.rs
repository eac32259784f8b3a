//! [libs/domain/models/src/blacklist.rs]
//! Operaciones de blacklist encoladas como trabajo de borde hacia el driver
//! BMP. El propio workflow de lectura/escritura de hardware queda fuera de
//! alcance; aqui solo se modela la semantica de cola (spec §1, §6).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum BlacklistOpKind {
    Read = 0,
    Write = 1,
    GetSerial = 2,
}

impl BlacklistOpKind {
    pub fn from_ordinal(value: i64) -> Option<Self> {
        match value {
            0 => Some(BlacklistOpKind::Read),
            1 => Some(BlacklistOpKind::Write),
            2 => Some(BlacklistOpKind::GetSerial),
            _ => None,
        }
    }

    pub fn ordinal(self) -> i64 {
        self as i64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlacklistOp {
    pub op_id: i64,
    pub board_id: i64,
    pub op: BlacklistOpKind,
    pub completed: bool,
    pub data: Option<Vec<u8>>,
    pub failure: Option<String>,
}
