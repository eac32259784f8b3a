// [libs/infra/store/tests/store_integration.rs]
//! Invariantes del Store independientes del daemon: consistencia de
//! `num_pending`, el tombstoning no dejando rastro en las tablas vivas, y
//! la consolidacion de cuota (spec §8).

use chrono::Utc;
use spalloc_domain_models::direction::LinkBitmap;
use spalloc_domain_models::{GroupQuota, HistoricalJob, JobState, PendingChange};
use spalloc_infra_store::repositories::{BoardRepository, HistoricalRepository, JobRepository, PendingChangeRepository, QuotaRepository, RequestRepository};
use spalloc_infra_store::testing::seed_flat_machine;
use spalloc_infra_store::StoreClient;

async fn store() -> StoreClient {
    StoreClient::connect(":memory:", None).await.expect("open in-memory store")
}

#[tokio::test]
async fn adjust_pending_tracks_outstanding_changes_exactly() {
    let store = store().await;
    let tx = store.begin().await.unwrap();
    let seeded = seed_flat_machine(&tx, "m", 2, 2, &[]).await.unwrap();
    let job_id = JobRepository::insert(&tx, seeded.machine_id, "alice", 1, 3600, None, Utc::now(), &[]).await.unwrap();
    tx.commit().await.unwrap();

    let tx = store.begin().await.unwrap();
    JobRepository::adjust_pending(&tx, job_id, 3).await.unwrap();
    tx.commit().await.unwrap();
    let tx = store.begin().await.unwrap();
    let job = JobRepository::get(&tx, job_id).await.unwrap();
    tx.commit().await.unwrap();
    assert_eq!(job.num_pending, 3);

    let tx = store.begin().await.unwrap();
    JobRepository::adjust_pending(&tx, job_id, -2).await.unwrap();
    tx.commit().await.unwrap();
    let tx = store.begin().await.unwrap();
    let job = JobRepository::get(&tx, job_id).await.unwrap();
    tx.commit().await.unwrap();
    assert_eq!(job.num_pending, 1);
}

#[tokio::test]
async fn tombstoning_leaves_no_trace_in_live_tables() {
    let store = store().await;
    let tx = store.begin().await.unwrap();
    let seeded = seed_flat_machine(&tx, "m", 2, 2, &[]).await.unwrap();
    let job_id = JobRepository::insert(&tx, seeded.machine_id, "alice", 1, 3600, None, Utc::now(), &[]).await.unwrap();
    RequestRepository::insert(&tx, job_id, &spalloc_domain_models::RequestShape::NumBoards { count: 1 }, 0, 1).await.unwrap();
    let now = Utc::now();
    JobRepository::set_death(&tx, job_id, Some("test teardown"), now).await.unwrap();
    JobRepository::update_state(&tx, job_id, JobState::Destroyed).await.unwrap();
    tx.commit().await.unwrap();

    let tx = store.begin().await.unwrap();
    HistoricalRepository::insert_job(
        &tx,
        &HistoricalJob {
            job_id,
            machine_id: seeded.machine_id,
            owner: "alice".into(),
            group_id: 1,
            create_timestamp: now,
            allocation_timestamp: None,
            death_timestamp: now,
            death_reason: Some("test teardown".into()),
            allocation_size: None,
        },
    )
    .await
    .unwrap();
    RequestRepository::delete_for_job(&tx, job_id).await.unwrap();
    JobRepository::delete(&tx, job_id).await.unwrap();
    tx.commit().await.unwrap();

    let tx = store.begin().await.unwrap();
    assert!(JobRepository::get(&tx, job_id).await.is_err());
    assert!(RequestRepository::get_latest_for_job(&tx, job_id).await.is_err());
    let destroyed = JobRepository::list_destroyed(&tx).await.unwrap();
    tx.commit().await.unwrap();
    assert!(destroyed.iter().all(|j| j.job_id != job_id));
}

#[tokio::test]
async fn quota_consumption_floors_at_zero_and_spares_unlimited_groups() {
    let store = store().await;
    let tx = store.begin().await.unwrap();
    QuotaRepository::upsert_group(&tx, &GroupQuota { group_id: 1, quota: Some(50) }).await.unwrap();
    QuotaRepository::upsert_group(&tx, &GroupQuota { group_id: 2, quota: None }).await.unwrap();
    tx.commit().await.unwrap();

    let tx = store.begin().await.unwrap();
    QuotaRepository::consume(&tx, 1, 80).await.unwrap();
    QuotaRepository::consume(&tx, 2, 80).await.unwrap();
    tx.commit().await.unwrap();

    let tx = store.begin().await.unwrap();
    let limited = QuotaRepository::get_group(&tx, 1).await.unwrap().unwrap();
    let unlimited = QuotaRepository::get_group(&tx, 2).await.unwrap().unwrap();
    tx.commit().await.unwrap();
    assert_eq!(limited.quota, Some(0));
    assert_eq!(unlimited.quota, None);
}

#[tokio::test]
async fn clear_all_in_progress_only_touches_rows_that_were_set() {
    let store = store().await;
    let tx = store.begin().await.unwrap();
    let seeded = seed_flat_machine(&tx, "m", 2, 2, &[]).await.unwrap();
    let job_id = JobRepository::insert(&tx, seeded.machine_id, "alice", 1, 3600, None, Utc::now(), &[]).await.unwrap();
    let stuck = PendingChangeRepository::insert(&tx, &PendingChange::power_on(job_id, seeded.board_ids[0][0], LinkBitmap::none())).await.unwrap();
    let fresh = PendingChangeRepository::insert(&tx, &PendingChange::power_on(job_id, seeded.board_ids[1][0], LinkBitmap::none())).await.unwrap();
    PendingChangeRepository::mark_in_progress(&tx, stuck, true).await.unwrap();
    tx.commit().await.unwrap();

    let tx = store.begin().await.unwrap();
    PendingChangeRepository::clear_all_in_progress(&tx).await.unwrap();
    tx.commit().await.unwrap();

    let tx = store.begin().await.unwrap();
    let changes = PendingChangeRepository::list_for_machine_by_bmp(&tx, seeded.machine_id).await.unwrap();
    tx.commit().await.unwrap();
    let by_id: std::collections::HashMap<i64, bool> = changes.into_iter().map(|(_, c)| (c.change_id, c.in_progress)).collect();
    assert_eq!(by_id[&stuck], false);
    assert_eq!(by_id[&fresh], false);
}

#[tokio::test]
async fn seeded_boards_report_functioning_flag_and_links() {
    let store = store().await;
    let tx = store.begin().await.unwrap();
    let seeded = seed_flat_machine(&tx, "m", 3, 1, &[(1, 0)]).await.unwrap();
    let dead = BoardRepository::get(&tx, seeded.board_ids[1][0]).await.unwrap();
    let alive = BoardRepository::get(&tx, seeded.board_ids[0][0]).await.unwrap();
    tx.commit().await.unwrap();

    assert!(!dead.may_be_allocated());
    assert!(alive.may_be_allocated());
}
