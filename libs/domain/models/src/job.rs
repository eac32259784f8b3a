//! [libs/domain/models/src/job.rs]
//! Un trabajo de usuario y el conjunto finito de estados por el que pasa.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Estados de un trabajo, en el orden ordinal fijado por la especificacion
/// (persistido tal cual en el Store y expuesto en el cable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum JobState {
    Unknown = 0,
    Queued = 1,
    Power = 2,
    Ready = 3,
    Destroyed = 4,
}

impl JobState {
    pub fn from_ordinal(value: i64) -> Option<Self> {
        match value {
            0 => Some(JobState::Unknown),
            1 => Some(JobState::Queued),
            2 => Some(JobState::Power),
            3 => Some(JobState::Ready),
            4 => Some(JobState::Destroyed),
            _ => None,
        }
    }

    pub fn ordinal(self) -> i64 {
        self as i64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub job_id: i64,
    pub machine_id: i64,
    pub owner: String,
    pub group_id: i64,
    pub keepalive_interval_seconds: i64,
    pub keepalive_timestamp: Option<DateTime<Utc>>,
    pub keepalive_host: Option<String>,
    pub create_timestamp: DateTime<Utc>,
    pub allocation_timestamp: Option<DateTime<Utc>>,
    pub death_timestamp: Option<DateTime<Utc>>,
    pub death_reason: Option<String>,
    pub original_request: Vec<u8>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub depth: Option<u32>,
    pub root_id: Option<i64>,
    pub allocation_size: Option<u32>,
    pub num_pending: u32,
    pub job_state: JobState,
    pub accounted_for: bool,
}

impl Job {
    /// Invariante del dominio (spec §3 #1): una placa solo puede estar
    /// asignada a un trabajo vivo.
    pub fn is_live(&self) -> bool {
        self.job_state != JobState::Destroyed
    }

    /// True cuando el keepalive ha expirado respecto a `now`.
    pub fn keepalive_expired(&self, now: DateTime<Utc>) -> bool {
        match self.keepalive_timestamp {
            None => false,
            Some(last) => last + chrono::Duration::seconds(self.keepalive_interval_seconds) < now,
        }
    }

    /// Duracion que el trabajo mantuvo placas encendidas, usada para el
    /// consumo de cuota (`allocation_size * on-duration`).
    pub fn on_duration(&self, now: DateTime<Utc>) -> chrono::Duration {
        match self.allocation_timestamp {
            None => chrono::Duration::zero(),
            Some(start) => {
                let end = self.death_timestamp.unwrap_or(now);
                (end - start).max(chrono::Duration::zero())
            }
        }
    }

    /// `quota_used = allocation_size x duracion_en_segundos` (spec §3).
    pub fn quota_used(&self, now: DateTime<Utc>) -> i64 {
        let size = i64::from(self.allocation_size.unwrap_or(0));
        size * self.on_duration(now).num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn base_job() -> Job {
        Job {
            job_id: 1,
            machine_id: 1,
            owner: "alice".into(),
            group_id: 1,
            keepalive_interval_seconds: 60,
            keepalive_timestamp: None,
            keepalive_host: None,
            create_timestamp: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            allocation_timestamp: None,
            death_timestamp: None,
            death_reason: None,
            original_request: vec![],
            width: None,
            height: None,
            depth: None,
            root_id: None,
            allocation_size: None,
            num_pending: 0,
            job_state: JobState::Queued,
            accounted_for: false,
        }
    }

    #[test]
    fn expiry_compares_against_interval() {
        let mut job = base_job();
        let created = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        job.keepalive_timestamp = Some(created);
        assert!(!job.keepalive_expired(created + chrono::Duration::seconds(59)));
        assert!(job.keepalive_expired(created + chrono::Duration::seconds(61)));
    }

    #[test]
    fn quota_used_multiplies_size_by_duration() {
        let mut job = base_job();
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        job.allocation_size = Some(2);
        job.allocation_timestamp = Some(start);
        job.death_timestamp = Some(start + chrono::Duration::seconds(10));
        assert_eq!(job.quota_used(start), 20);
    }

    #[test]
    fn ordinal_round_trips() {
        for state in [
            JobState::Unknown,
            JobState::Queued,
            JobState::Power,
            JobState::Ready,
            JobState::Destroyed,
        ] {
            assert_eq!(JobState::from_ordinal(state.ordinal()), Some(state));
        }
    }
}
