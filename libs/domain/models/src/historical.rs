//! [libs/domain/models/src/historical.rs]
//! Copias denormalizadas escritas en el almacen historico al momento del
//! tombstoning (spec §4.E, §8 invariante 4: "Tombstoned job_ids never
//! reappear in the live job table").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalJob {
    pub job_id: i64,
    pub machine_id: i64,
    pub owner: String,
    pub group_id: i64,
    pub create_timestamp: DateTime<Utc>,
    pub allocation_timestamp: Option<DateTime<Utc>>,
    pub death_timestamp: DateTime<Utc>,
    pub death_reason: Option<String>,
    pub allocation_size: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalAllocation {
    pub job_id: i64,
    pub board_id: i64,
}
