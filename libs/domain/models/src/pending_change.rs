//! [libs/domain/models/src/pending_change.rs]
//! Una fila de cambio de energia pendiente: la unidad de trabajo que el
//! PowerController drena y ejecuta contra un BMP.

use crate::direction::LinkBitmap;
use crate::job::JobState;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingChange {
    pub change_id: i64,
    pub job_id: i64,
    pub board_id: i64,
    pub from_state: JobState,
    pub to_state: JobState,
    pub power: bool,
    pub links: LinkBitmap,
    pub in_progress: bool,
    /// Cuenta de fallos consecutivos del driver BMP para esta fila (spec
    /// §4.D: "schedule retry with exponential backoff up to a cap; after N
    /// failures, destroy the job"). El PowerController la usa para decidir
    /// cuando escalar de reintento a destruccion del trabajo.
    pub failure_count: i64,
}

impl PendingChange {
    /// Construye la fila correspondiente a encender el perimetro de una
    /// asignacion recien colocada (spec §4.C paso 2).
    pub fn power_on(job_id: i64, board_id: i64, links: LinkBitmap) -> Self {
        Self {
            change_id: 0,
            job_id,
            board_id,
            from_state: JobState::Queued,
            to_state: JobState::Ready,
            power: true,
            links,
            in_progress: false,
            failure_count: 0,
        }
    }

    /// Construye la fila correspondiente al apagado emitido por la ruta de
    /// destruccion (spec §4.D: "A destroy path emits POWER=OFF
    /// PendingChanges for every currently-allocated board").
    pub fn power_off(job_id: i64, board_id: i64, from_state: JobState) -> Self {
        Self {
            change_id: 0,
            job_id,
            board_id,
            from_state,
            to_state: JobState::Destroyed,
            power: false,
            links: LinkBitmap::none(),
            in_progress: false,
            failure_count: 0,
        }
    }
}
