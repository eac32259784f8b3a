// [libs/infra/store/src/queries.rs]
//! SQL centralizado. Respuesta de diseno a la nota del spec (§9) que pedia
//! no esparcir cadenas SQL por los repositorios: cada repositorio importa
//! sus sentencias desde aqui, y una revision de esquema solo toca un fichero.

// --- MACHINES ---
pub const MACHINE_GET: &str = "SELECT machine_id, name, width, height, depth, board_model, in_service, max_chip_x, max_chip_y FROM machines WHERE machine_id = ?1";
pub const MACHINE_GET_BY_NAME: &str = "SELECT machine_id, name, width, height, depth, board_model, in_service, max_chip_x, max_chip_y FROM machines WHERE name = ?1";
pub const MACHINE_LIST: &str = "SELECT machine_id, name, width, height, depth, board_model, in_service, max_chip_x, max_chip_y FROM machines WHERE in_service = 1";
pub const MACHINE_LIST_ALL: &str = "SELECT machine_id, name, width, height, depth, board_model, in_service, max_chip_x, max_chip_y FROM machines";

// --- BOARDS ---
// Columnas comunes a toda consulta de placas: board_id, machine_id, x, y, z,
// cabinet, frame, board_num, root_x, root_y, address, bmp_id, functioning,
// allocated_job, board_power, power_on_timestamp, power_off_timestamp,
// blacklist_set_timestamp, blacklist_sync_timestamp.
pub const BOARD_GET: &str = "SELECT board_id, machine_id, x, y, z, cabinet, frame, board_num, root_x, root_y, address, bmp_id, functioning, allocated_job, board_power, power_on_timestamp, power_off_timestamp, blacklist_set_timestamp, blacklist_sync_timestamp FROM boards WHERE board_id = ?1";
pub const BOARD_LIST_FOR_MACHINE: &str = "SELECT board_id, machine_id, x, y, z, cabinet, frame, board_num, root_x, root_y, address, bmp_id, functioning, allocated_job, board_power, power_on_timestamp, power_off_timestamp, blacklist_set_timestamp, blacklist_sync_timestamp FROM boards WHERE machine_id = ?1";
pub const BOARD_FIND_BY_TRIAD: &str = "SELECT board_id, machine_id, x, y, z, cabinet, frame, board_num, root_x, root_y, address, bmp_id, functioning, allocated_job, board_power, power_on_timestamp, power_off_timestamp, blacklist_set_timestamp, blacklist_sync_timestamp FROM boards WHERE machine_id = ?1 AND x = ?2 AND y = ?3 AND z = ?4";
pub const BOARD_FIND_BY_PHYSICAL: &str = "SELECT board_id, machine_id, x, y, z, cabinet, frame, board_num, root_x, root_y, address, bmp_id, functioning, allocated_job, board_power, power_on_timestamp, power_off_timestamp, blacklist_set_timestamp, blacklist_sync_timestamp FROM boards WHERE machine_id = ?1 AND cabinet = ?2 AND frame = ?3 AND board_num = ?4";
pub const BOARD_LIST_ALLOCATED_TO: &str = "SELECT board_id, machine_id, x, y, z, cabinet, frame, board_num, root_x, root_y, address, bmp_id, functioning, allocated_job, board_power, power_on_timestamp, power_off_timestamp, blacklist_set_timestamp, blacklist_sync_timestamp FROM boards WHERE allocated_job = ?1";
pub const BOARD_SET_ALLOCATED_JOB: &str = "UPDATE boards SET allocated_job = ?2 WHERE board_id = ?1";
pub const BOARD_SET_POWER: &str = "UPDATE boards SET board_power = ?2, power_on_timestamp = CASE WHEN ?2 = 1 THEN ?3 ELSE power_on_timestamp END, power_off_timestamp = CASE WHEN ?2 = 0 THEN ?3 ELSE power_off_timestamp END WHERE board_id = ?1";
pub const BOARD_SET_FUNCTIONING: &str = "UPDATE boards SET functioning = ?2 WHERE board_id = ?1";

// --- LINKS ---
pub const LINK_LIST_FOR_MACHINE: &str = r#"
    SELECT l.board_1, l.direction_1, l.board_2, l.direction_2, l.live
    FROM links l
    JOIN boards b ON b.board_id = l.board_1
    WHERE b.machine_id = ?1
"#;
pub const LINK_SET_LIVE: &str = "UPDATE links SET live = ?3 WHERE board_1 = ?1 AND direction_1 = ?2";

// --- BMPS ---
pub const BMP_LIST_FOR_MACHINE: &str = "SELECT bmp_id, machine_id, cabinet, frame, address FROM bmps WHERE machine_id = ?1";
pub const BMP_GET: &str = "SELECT bmp_id, machine_id, cabinet, frame, address FROM bmps WHERE bmp_id = ?1";

// --- JOBS ---
// Columnas comunes: job_id, machine_id, owner, group_id,
// keepalive_interval_seconds, keepalive_timestamp, keepalive_host,
// create_timestamp, allocation_timestamp, death_timestamp, death_reason,
// original_request, width, height, depth, root_id, allocation_size,
// num_pending, job_state, accounted_for.
pub const JOB_INSERT: &str = r#"
    INSERT INTO jobs (
        machine_id, owner, group_id, keepalive_interval_seconds, keepalive_timestamp,
        keepalive_host, create_timestamp, original_request, job_state
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1)
"#;
pub const JOB_GET: &str = "SELECT job_id, machine_id, owner, group_id, keepalive_interval_seconds, keepalive_timestamp, keepalive_host, create_timestamp, allocation_timestamp, death_timestamp, death_reason, original_request, width, height, depth, root_id, allocation_size, num_pending, job_state, accounted_for FROM jobs WHERE job_id = ?1";
pub const JOB_LIST_LIVE: &str = "SELECT job_id, machine_id, owner, group_id, keepalive_interval_seconds, keepalive_timestamp, keepalive_host, create_timestamp, allocation_timestamp, death_timestamp, death_reason, original_request, width, height, depth, root_id, allocation_size, num_pending, job_state, accounted_for FROM jobs WHERE job_state != 4";
pub const JOB_LIST_FOR_OWNER: &str = "SELECT job_id, machine_id, owner, group_id, keepalive_interval_seconds, keepalive_timestamp, keepalive_host, create_timestamp, allocation_timestamp, death_timestamp, death_reason, original_request, width, height, depth, root_id, allocation_size, num_pending, job_state, accounted_for FROM jobs WHERE owner = ?1 AND job_state != 4";
pub const JOB_LIST_LIVE_FOR_GROUP: &str = "SELECT job_id, machine_id, owner, group_id, keepalive_interval_seconds, keepalive_timestamp, keepalive_host, create_timestamp, allocation_timestamp, death_timestamp, death_reason, original_request, width, height, depth, root_id, allocation_size, num_pending, job_state, accounted_for FROM jobs WHERE group_id = ?1 AND job_state != 4";
pub const JOB_LIST_EXPIRY_CANDIDATES: &str = "SELECT job_id, machine_id, owner, group_id, keepalive_interval_seconds, keepalive_timestamp, keepalive_host, create_timestamp, allocation_timestamp, death_timestamp, death_reason, original_request, width, height, depth, root_id, allocation_size, num_pending, job_state, accounted_for FROM jobs WHERE job_state != 4 AND keepalive_timestamp IS NOT NULL";
pub const JOB_LIST_TOMBSTONE_CANDIDATES: &str = "SELECT job_id, machine_id, owner, group_id, keepalive_interval_seconds, keepalive_timestamp, keepalive_host, create_timestamp, allocation_timestamp, death_timestamp, death_reason, original_request, width, height, depth, root_id, allocation_size, num_pending, job_state, accounted_for FROM jobs WHERE job_state = 4";
pub const JOB_UPDATE_STATE: &str = "UPDATE jobs SET job_state = ?2 WHERE job_id = ?1";
pub const JOB_UPDATE_KEEPALIVE: &str = "UPDATE jobs SET keepalive_timestamp = ?2, keepalive_host = ?3 WHERE job_id = ?1 AND job_state != 4";
pub const JOB_SET_ALLOCATION: &str = "UPDATE jobs SET root_id = ?2, width = ?3, height = ?4, depth = ?5, allocation_size = ?6, allocation_timestamp = ?7, job_state = 2 WHERE job_id = ?1";
pub const JOB_SET_DEATH: &str = "UPDATE jobs SET death_timestamp = ?2, death_reason = ?3, job_state = 4 WHERE job_id = ?1";
pub const JOB_SET_ACCOUNTED_FOR: &str = "UPDATE jobs SET accounted_for = 1 WHERE job_id = ?1";
pub const JOB_ADJUST_PENDING: &str = "UPDATE jobs SET num_pending = num_pending + ?2 WHERE job_id = ?1";
pub const JOB_DELETE: &str = "DELETE FROM jobs WHERE job_id = ?1";

// --- REQUESTS ---
pub const REQUEST_INSERT: &str = r#"
    INSERT INTO requests (job_id, shape_kind, num_boards, width, height, board_id, max_dead_boards, priority, importance)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
"#;
pub const REQUEST_LIST_QUEUED: &str = r#"
    SELECT r.req_id, r.job_id, r.shape_kind, r.num_boards, r.width, r.height, r.board_id, r.max_dead_boards, r.priority, r.importance
    FROM requests r
    JOIN jobs j ON j.job_id = r.job_id
    WHERE j.job_state = 1
    ORDER BY r.importance DESC, r.req_id ASC
"#;
pub const REQUEST_GET_FOR_JOB: &str = "SELECT req_id, job_id, shape_kind, num_boards, width, height, board_id, max_dead_boards, priority, importance FROM requests WHERE job_id = ?1 ORDER BY req_id DESC LIMIT 1";
pub const REQUEST_AGE_IMPORTANCE: &str = "UPDATE requests SET importance = importance + ?2 WHERE req_id = ?1";
pub const REQUEST_DELETE: &str = "DELETE FROM requests WHERE req_id = ?1";
pub const REQUEST_DELETE_FOR_JOB: &str = "DELETE FROM requests WHERE job_id = ?1";

// --- PENDING CHANGES ---
pub const PENDING_INSERT: &str = r#"
    INSERT INTO pending_changes (
        job_id, board_id, power, from_state, to_state,
        link_n, link_e, link_se, link_s, link_w, link_nw, in_progress, enqueued_timestamp
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 0, ?12)
"#;
pub const PENDING_LIST_FOR_MACHINE: &str = r#"
    SELECT p.change_id, p.job_id, p.board_id, p.power, p.from_state, p.to_state,
           p.link_n, p.link_e, p.link_se, p.link_s, p.link_w, p.link_nw, p.in_progress,
           p.failure_count, b.bmp_id
    FROM pending_changes p
    JOIN boards b ON b.board_id = p.board_id
    WHERE b.machine_id = ?1
    ORDER BY p.change_id ASC
"#;
pub const PENDING_MARK_IN_PROGRESS: &str = "UPDATE pending_changes SET in_progress = ?2 WHERE change_id = ?1";
pub const PENDING_RECORD_FAILURE: &str =
    "UPDATE pending_changes SET in_progress = 0, failure_count = failure_count + 1 WHERE change_id = ?1 RETURNING failure_count";
pub const PENDING_DELETE: &str = "DELETE FROM pending_changes WHERE change_id = ?1";
pub const PENDING_COUNT_FOR_JOB: &str = "SELECT COUNT(*) FROM pending_changes WHERE job_id = ?1";
pub const PENDING_CLEAR_ALL_IN_PROGRESS: &str = "UPDATE pending_changes SET in_progress = 0 WHERE in_progress != 0";

// --- BLACKLIST OPS ---
pub const BLACKLIST_INSERT: &str = "INSERT INTO blacklist_ops (board_id, op, completed) VALUES (?1, ?2, 0)";
pub const BLACKLIST_LIST_PENDING: &str = "SELECT op_id, board_id, op, completed, data, failure FROM blacklist_ops WHERE completed = 0";
pub const BLACKLIST_MARK_COMPLETE: &str = "UPDATE blacklist_ops SET completed = 1, data = ?2, failure = ?3 WHERE op_id = ?1";

// --- QUOTAS ---
pub const QUOTA_GET_GROUP: &str = "SELECT group_id, quota FROM group_quotas WHERE group_id = ?1";
pub const QUOTA_UPSERT_GROUP: &str = "INSERT INTO group_quotas (group_id, quota) VALUES (?1, ?2) ON CONFLICT(group_id) DO UPDATE SET quota = excluded.quota";
pub const QUOTA_CONSUME: &str = "UPDATE group_quotas SET quota = MAX(0, quota - ?2) WHERE group_id = ?1 AND quota IS NOT NULL";
pub const JOB_USAGE_GET: &str = "SELECT job_id, group_id, quota_used, accounted_for FROM job_usage WHERE job_id = ?1";
pub const JOB_USAGE_UPSERT: &str = r#"
    INSERT INTO job_usage (job_id, group_id, quota_used, accounted_for) VALUES (?1, ?2, ?3, 0)
    ON CONFLICT(job_id) DO UPDATE SET quota_used = excluded.quota_used
"#;
pub const JOB_USAGE_LIST_UNACCOUNTED_FOR_DEAD_JOBS: &str = r#"
    SELECT u.job_id, u.group_id, u.quota_used, u.accounted_for
    FROM job_usage u
    JOIN jobs j ON j.job_id = u.job_id
    WHERE u.accounted_for = 0 AND j.job_state = 4
"#;
pub const JOB_USAGE_MARK_ACCOUNTED: &str = "UPDATE job_usage SET accounted_for = 1 WHERE job_id = ?1";
pub const JOB_USAGE_SUM_UNACCOUNTED_FOR_GROUP: &str = "SELECT COALESCE(SUM(quota_used), 0) FROM job_usage WHERE group_id = ?1 AND accounted_for = 0";

// --- HISTORICAL ---
pub const HISTORICAL_JOB_INSERT: &str = r#"
    INSERT OR IGNORE INTO historical_jobs (job_id, machine_id, owner, group_id, create_timestamp, allocation_timestamp, death_timestamp, death_reason, allocation_size)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
"#;
pub const HISTORICAL_ALLOCATION_INSERT: &str = "INSERT OR IGNORE INTO historical_allocations (job_id, board_id) VALUES (?1, ?2)";
