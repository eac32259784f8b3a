//! [libs/domain/models/src/board.rs]
//! Una placa fisica: 48 chips, controlada por una posicion en un BMP.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Estado de funcionamiento reportado por el censo de hardware.
/// `null` en la especificacion significa "desconocido" (nunca probado).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Functioning {
    Unknown,
    Broken,
    Working,
}

impl Functioning {
    pub fn from_db(value: Option<i64>) -> Self {
        match value {
            None => Functioning::Unknown,
            Some(0) => Functioning::Broken,
            Some(_) => Functioning::Working,
        }
    }

    pub fn to_db(self) -> Option<i64> {
        match self {
            Functioning::Unknown => None,
            Functioning::Broken => Some(0),
            Functioning::Working => Some(1),
        }
    }

    fn is_broken(self) -> bool {
        matches!(self, Functioning::Broken)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub board_id: i64,
    pub machine_id: i64,
    pub x: u32,
    pub y: u32,
    pub z: u32,
    pub cabinet: u32,
    pub frame: u32,
    pub board_num: u32,
    pub root_x: u32,
    pub root_y: u32,
    pub address: Option<String>,
    pub bmp_id: i64,
    pub functioning: Functioning,
    pub allocated_job: Option<i64>,
    pub board_power: bool,
    pub power_on_timestamp: Option<DateTime<Utc>>,
    pub power_off_timestamp: Option<DateTime<Utc>>,
    pub blacklist_set_timestamp: Option<DateTime<Utc>>,
    pub blacklist_sync_timestamp: Option<DateTime<Utc>>,
}

impl Board {
    /// Invariante del dominio (spec §3): libre para asignar cuando nadie la
    /// tiene y el censo de hardware no la marco como rota.
    pub fn may_be_allocated(&self) -> bool {
        self.allocated_job.is_none() && !self.functioning.is_broken()
    }

    /// Politica de permanencia minima (spec §4.D, "respects a per-board
    /// minimum off-duration and minimum on-duration before the opposite
    /// transition"). Decidida aqui como funcion pura sobre las marcas de
    /// tiempo de energia, en vez de quedar enterrada en un predicado SQL.
    ///
    /// `target_power = true` significa "se quiere encender"; se exige que
    /// haya pasado `min_off` desde el ultimo apagado. Lo simetrico aplica
    /// para apagar.
    pub fn power_dwell_ok(
        &self,
        now: DateTime<Utc>,
        target_power: bool,
        min_off: Duration,
        min_on: Duration,
    ) -> bool {
        if target_power {
            match self.power_off_timestamp {
                None => true,
                Some(off_at) => elapsed_at_least(now, off_at, min_off),
            }
        } else {
            match self.power_on_timestamp {
                None => true,
                Some(on_at) => elapsed_at_least(now, on_at, min_on),
            }
        }
    }
}

fn elapsed_at_least(now: DateTime<Utc>, since: DateTime<Utc>, minimum: Duration) -> bool {
    match (now - since).to_std() {
        Ok(elapsed) => elapsed >= minimum,
        Err(_) => true, // `since` is in the future (clock skew): don't block forever.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Board {
        Board {
            board_id: 1,
            machine_id: 1,
            x: 0,
            y: 0,
            z: 0,
            cabinet: 0,
            frame: 0,
            board_num: 0,
            root_x: 0,
            root_y: 0,
            address: Some("10.0.0.1".into()),
            bmp_id: 1,
            functioning: Functioning::Working,
            allocated_job: None,
            board_power: false,
            power_on_timestamp: None,
            power_off_timestamp: None,
            blacklist_set_timestamp: None,
            blacklist_sync_timestamp: None,
        }
    }

    #[test]
    fn may_be_allocated_requires_free_and_functioning() {
        let mut board = sample();
        assert!(board.may_be_allocated());
        board.allocated_job = Some(7);
        assert!(!board.may_be_allocated());
        board.allocated_job = None;
        board.functioning = Functioning::Broken;
        assert!(!board.may_be_allocated());
        board.functioning = Functioning::Unknown;
        assert!(board.may_be_allocated());
    }

    #[test]
    fn dwell_blocks_until_minimum_elapsed() {
        let mut board = sample();
        let off_at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        board.power_off_timestamp = Some(off_at);
        let too_soon = off_at + chrono::Duration::seconds(1);
        let late_enough = off_at + chrono::Duration::seconds(10);
        assert!(!board.power_dwell_ok(too_soon, true, Duration::from_secs(5), Duration::from_secs(5)));
        assert!(board.power_dwell_ok(late_enough, true, Duration::from_secs(5), Duration::from_secs(5)));
    }

    #[test]
    fn dwell_ok_when_never_transitioned() {
        let board = sample();
        assert!(board.power_dwell_ok(Utc::now(), true, Duration::from_secs(30), Duration::from_secs(30)));
        assert!(board.power_dwell_ok(Utc::now(), false, Duration::from_secs(30), Duration::from_secs(30)));
    }
}
