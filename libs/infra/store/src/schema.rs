// [libs/infra/store/src/schema.rs]
//! Definicion del esquema estructural. Sigue el mismo patron en tres
//! estratos que el resto del stack de persistencia: tablas base, mutaciones
//! evolutivas idempotentes (para entornos ya desplegados), e indices.

use crate::errors::StoreError;
use libsql::Connection;
use tracing::{debug, info, warn};

const BASE_TABLES: &[(&str, &str)] = &[
    ("TABLE_MACHINES", r#"
        CREATE TABLE IF NOT EXISTS machines (
            machine_id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            width INTEGER NOT NULL,
            height INTEGER NOT NULL,
            depth INTEGER NOT NULL,
            board_model TEXT NOT NULL DEFAULT 'spin5',
            in_service INTEGER NOT NULL DEFAULT 1,
            max_chip_x INTEGER NOT NULL,
            max_chip_y INTEGER NOT NULL
        );
    "#),
    ("TABLE_BOARDS", r#"
        CREATE TABLE IF NOT EXISTS boards (
            board_id INTEGER PRIMARY KEY,
            machine_id INTEGER NOT NULL REFERENCES machines(machine_id),
            x INTEGER NOT NULL,
            y INTEGER NOT NULL,
            z INTEGER NOT NULL,
            cabinet INTEGER NOT NULL,
            frame INTEGER NOT NULL,
            board_num INTEGER NOT NULL,
            root_x INTEGER NOT NULL,
            root_y INTEGER NOT NULL,
            address TEXT,
            bmp_id INTEGER NOT NULL REFERENCES bmps(bmp_id),
            functioning INTEGER,
            allocated_job INTEGER,
            board_power INTEGER NOT NULL DEFAULT 0,
            power_on_timestamp TEXT,
            power_off_timestamp TEXT,
            blacklist_set_timestamp TEXT,
            blacklist_sync_timestamp TEXT,
            UNIQUE(machine_id, x, y, z),
            UNIQUE(machine_id, cabinet, frame, board_num)
        );
    "#),
    ("TABLE_BMPS", r#"
        CREATE TABLE IF NOT EXISTS bmps (
            bmp_id INTEGER PRIMARY KEY,
            machine_id INTEGER NOT NULL REFERENCES machines(machine_id),
            cabinet INTEGER NOT NULL,
            frame INTEGER NOT NULL,
            address TEXT NOT NULL,
            UNIQUE(machine_id, cabinet, frame)
        );
    "#),
    ("TABLE_LINKS", r#"
        CREATE TABLE IF NOT EXISTS links (
            board_1 INTEGER NOT NULL REFERENCES boards(board_id),
            direction_1 INTEGER NOT NULL,
            board_2 INTEGER NOT NULL REFERENCES boards(board_id),
            direction_2 INTEGER NOT NULL,
            live INTEGER NOT NULL DEFAULT 1,
            PRIMARY KEY (board_1, direction_1)
        );
    "#),
    ("TABLE_JOBS", r#"
        CREATE TABLE IF NOT EXISTS jobs (
            job_id INTEGER PRIMARY KEY,
            machine_id INTEGER NOT NULL REFERENCES machines(machine_id),
            owner TEXT NOT NULL,
            group_id INTEGER NOT NULL,
            keepalive_interval_seconds INTEGER NOT NULL,
            keepalive_timestamp TEXT,
            keepalive_host TEXT,
            create_timestamp TEXT NOT NULL,
            allocation_timestamp TEXT,
            death_timestamp TEXT,
            death_reason TEXT,
            original_request BLOB NOT NULL,
            width INTEGER,
            height INTEGER,
            depth INTEGER,
            root_id INTEGER,
            allocation_size INTEGER,
            num_pending INTEGER NOT NULL DEFAULT 0,
            job_state INTEGER NOT NULL DEFAULT 0,
            accounted_for INTEGER NOT NULL DEFAULT 0
        );
    "#),
    ("TABLE_REQUESTS", r#"
        CREATE TABLE IF NOT EXISTS requests (
            req_id INTEGER PRIMARY KEY,
            job_id INTEGER NOT NULL REFERENCES jobs(job_id),
            shape_kind INTEGER NOT NULL,
            num_boards INTEGER,
            width INTEGER,
            height INTEGER,
            board_id INTEGER,
            max_dead_boards INTEGER NOT NULL DEFAULT 0,
            priority INTEGER NOT NULL DEFAULT 0,
            importance INTEGER NOT NULL DEFAULT 0
        );
    "#),
    ("TABLE_PENDING_CHANGES", r#"
        CREATE TABLE IF NOT EXISTS pending_changes (
            change_id INTEGER PRIMARY KEY,
            job_id INTEGER NOT NULL REFERENCES jobs(job_id),
            board_id INTEGER NOT NULL REFERENCES boards(board_id),
            power INTEGER NOT NULL,
            from_state INTEGER NOT NULL,
            to_state INTEGER NOT NULL,
            link_n INTEGER NOT NULL DEFAULT 0,
            link_e INTEGER NOT NULL DEFAULT 0,
            link_se INTEGER NOT NULL DEFAULT 0,
            link_s INTEGER NOT NULL DEFAULT 0,
            link_w INTEGER NOT NULL DEFAULT 0,
            link_nw INTEGER NOT NULL DEFAULT 0,
            in_progress INTEGER NOT NULL DEFAULT 0,
            enqueued_timestamp TEXT NOT NULL
        );
    "#),
    ("TABLE_BLACKLIST_OPS", r#"
        CREATE TABLE IF NOT EXISTS blacklist_ops (
            op_id INTEGER PRIMARY KEY,
            board_id INTEGER NOT NULL REFERENCES boards(board_id),
            op INTEGER NOT NULL,
            completed INTEGER NOT NULL DEFAULT 0,
            data BLOB,
            failure TEXT
        );
    "#),
    ("TABLE_GROUP_QUOTAS", r#"
        CREATE TABLE IF NOT EXISTS group_quotas (
            group_id INTEGER PRIMARY KEY,
            quota INTEGER
        );
    "#),
    ("TABLE_JOB_USAGE", r#"
        CREATE TABLE IF NOT EXISTS job_usage (
            job_id INTEGER PRIMARY KEY REFERENCES jobs(job_id),
            group_id INTEGER NOT NULL REFERENCES group_quotas(group_id),
            quota_used INTEGER NOT NULL DEFAULT 0,
            accounted_for INTEGER NOT NULL DEFAULT 0
        );
    "#),
    ("TABLE_HISTORICAL_JOBS", r#"
        CREATE TABLE IF NOT EXISTS historical_jobs (
            job_id INTEGER PRIMARY KEY,
            machine_id INTEGER NOT NULL,
            owner TEXT NOT NULL,
            group_id INTEGER NOT NULL,
            create_timestamp TEXT NOT NULL,
            allocation_timestamp TEXT,
            death_timestamp TEXT NOT NULL,
            death_reason TEXT,
            allocation_size INTEGER
        );
    "#),
    ("TABLE_HISTORICAL_ALLOCATIONS", r#"
        CREATE TABLE IF NOT EXISTS historical_allocations (
            job_id INTEGER NOT NULL,
            board_id INTEGER NOT NULL,
            PRIMARY KEY (job_id, board_id)
        );
    "#),
];

const EVOLUTIONARY_STRATA: &[(&str, &str)] = &[
    ("JOBS_ACCOUNTED_FOR", "ALTER TABLE jobs ADD COLUMN accounted_for INTEGER NOT NULL DEFAULT 0"),
    (
        "PENDING_CHANGES_FAILURE_COUNT",
        "ALTER TABLE pending_changes ADD COLUMN failure_count INTEGER NOT NULL DEFAULT 0",
    ),
];

const INDEXES: &[(&str, &str)] = &[
    ("IDX_BOARDS_MACHINE", "CREATE INDEX IF NOT EXISTS idx_boards_machine ON boards(machine_id);"),
    ("IDX_BOARDS_JOB", "CREATE INDEX IF NOT EXISTS idx_boards_job ON boards(allocated_job);"),
    ("IDX_REQUESTS_JOB", "CREATE INDEX IF NOT EXISTS idx_requests_job ON requests(job_id);"),
    ("IDX_PENDING_BOARD", "CREATE INDEX IF NOT EXISTS idx_pending_board ON pending_changes(board_id);"),
    ("IDX_PENDING_JOB", "CREATE INDEX IF NOT EXISTS idx_pending_job ON pending_changes(job_id);"),
    ("IDX_JOBS_STATE", "CREATE INDEX IF NOT EXISTS idx_jobs_state ON jobs(job_state);"),
    ("IDX_JOBS_KEEPALIVE", "CREATE INDEX IF NOT EXISTS idx_jobs_keepalive ON jobs(keepalive_timestamp);"),
    ("IDX_JOB_USAGE_GROUP", "CREATE INDEX IF NOT EXISTS idx_job_usage_group ON job_usage(group_id);"),
];

pub async fn apply_schema(connection: &Connection) -> Result<(), StoreError> {
    info!("applying store schema");
    for (identifier, sql) in BASE_TABLES {
        debug!("creating table: {identifier}");
        connection.execute(sql, ()).await.map_err(StoreError::classify)?;
    }
    for (identifier, sql) in EVOLUTIONARY_STRATA {
        match connection.execute(sql, ()).await {
            Ok(_) => debug!("applied migration: {identifier}"),
            Err(e) if e.to_string().contains("duplicate column name") => {
                debug!("migration already applied: {identifier}")
            }
            Err(e) => warn!("migration {identifier} did not apply cleanly: {e}"),
        }
    }
    for (identifier, sql) in INDEXES {
        debug!("creating index: {identifier}");
        connection.execute(sql, ()).await.map_err(StoreError::classify)?;
    }
    Ok(())
}
