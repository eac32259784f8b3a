// [apps/allocatord/tests/allocator_pipeline.rs]
//! Ejercita el pipeline completo (Allocator, PowerController, ExpirySweep,
//! QuotaManager) contra un Store en memoria y un `MockBmpDriver`, cubriendo
//! los escenarios concretos de spec §8.

mod common;

use chrono::Utc;
use common::harness;
use spalloc_allocatord::api::{Api, SubmitRequest};
use spalloc_allocatord::services::{Allocator, ExpirySweep, PowerController, QuotaManager};
use spalloc_domain_models::{GroupQuota, JobState, RequestShape};
use spalloc_infra_store::repositories::{BoardRepository, JobRepository, PendingChangeRepository, QuotaRepository};

fn submit_request(shape: RequestShape, max_dead_boards: u32, priority: i64, group_id: i64) -> SubmitRequest {
    SubmitRequest {
        machine_name: "test-machine".into(),
        owner: "alice".into(),
        group_id,
        keepalive_interval_seconds: 3600,
        keepalive_host: None,
        shape,
        max_dead_boards,
        priority,
        original_request: vec![],
    }
}

#[tokio::test]
async fn single_board_job_reaches_ready() {
    let (rig, seeded) = harness(4, 4, &[]).await;
    let job_id = Api::submit(&rig.state, submit_request(RequestShape::NumBoards { count: 1 }, 0, 1, 1)).await.unwrap();

    Allocator::tick(&rig.state).await.unwrap();
    let job = Api::get_job(&rig.state, job_id).await.unwrap();
    assert_eq!(job.job_state, JobState::Power);
    assert_eq!(job.allocation_size, Some(1));
    assert_eq!(job.num_pending, 1);
    assert_eq!(job.root_id, Some(seeded.board_ids[0][0]));

    PowerController::tick(&rig.state, seeded.machine_id).await.unwrap();
    let job = Api::get_job(&rig.state, job_id).await.unwrap();
    assert_eq!(job.job_state, JobState::Ready);
    assert_eq!(job.num_pending, 0);
    assert_eq!(rig.bmp.call_count(), 1);
    assert!(rig.bmp.power_calls()[0].command.power);
}

#[tokio::test]
async fn two_single_board_jobs_never_share_a_board() {
    let (rig, seeded) = harness(4, 4, &[]).await;
    let job_a = Api::submit(&rig.state, submit_request(RequestShape::NumBoards { count: 1 }, 0, 10, 1)).await.unwrap();
    let job_b = Api::submit(&rig.state, submit_request(RequestShape::NumBoards { count: 1 }, 0, 5, 1)).await.unwrap();

    Allocator::tick(&rig.state).await.unwrap();

    let a = Api::get_job(&rig.state, job_a).await.unwrap();
    let b = Api::get_job(&rig.state, job_b).await.unwrap();
    // Importance DESC dispatches `a` first: it claims the lowest origin,
    // `b` falls through to the next free candidate.
    assert_eq!(a.root_id, Some(seeded.board_ids[0][0]));
    assert_eq!(b.root_id, Some(seeded.board_ids[0][1]));
    assert_ne!(a.root_id, b.root_id);
}

#[tokio::test]
async fn dead_boards_beyond_tolerance_reject_instead_of_spinning() {
    let (rig, _seeded) = harness(4, 4, &[(0, 0), (1, 0), (2, 0)]).await;
    let job_id = Api::submit(&rig.state, submit_request(RequestShape::Dimensions { width: 4, height: 4 }, 2, 1, 1)).await.unwrap();

    Allocator::tick(&rig.state).await.unwrap();

    let job = Api::get_job(&rig.state, job_id).await.unwrap();
    assert_eq!(job.job_state, JobState::Destroyed);
    assert_eq!(job.death_reason.as_deref(), Some("requested shape exceeds the machine's dead-board tolerance"));

    // And the request row itself must be gone, not just aged.
    let tx = rig.state.store.begin().await.unwrap();
    let remaining = spalloc_infra_store::repositories::RequestRepository::list_queued(&tx).await.unwrap();
    tx.commit().await.unwrap();
    assert!(remaining.is_empty());
}

#[tokio::test]
async fn keepalive_expiry_destroys_a_ready_job() {
    let (rig, seeded) = harness(2, 2, &[]).await;
    let job_id = Api::submit(&rig.state, submit_request(RequestShape::NumBoards { count: 1 }, 0, 1, 1)).await.unwrap();

    Allocator::tick(&rig.state).await.unwrap();
    PowerController::tick(&rig.state, seeded.machine_id).await.unwrap();
    assert_eq!(Api::get_job(&rig.state, job_id).await.unwrap().job_state, JobState::Ready);

    let ancient = Utc::now() - chrono::Duration::seconds(10_000);
    {
        let tx = rig.state.store.begin().await.unwrap();
        JobRepository::update_keepalive(&tx, job_id, ancient, None).await.unwrap();
        tx.commit().await.unwrap();
    }

    ExpirySweep::tick(&rig.state).await.unwrap();
    let job = Api::get_job(&rig.state, job_id).await.unwrap();
    assert_eq!(job.job_state, JobState::Power);
    assert_eq!(job.num_pending, 1);

    PowerController::tick(&rig.state, seeded.machine_id).await.unwrap();
    let job = Api::get_job(&rig.state, job_id).await.unwrap();
    assert_eq!(job.job_state, JobState::Destroyed);
    assert_eq!(job.death_reason.as_deref(), Some("keepalive expired"));

    let tx = rig.state.store.begin().await.unwrap();
    let board = BoardRepository::get(&tx, seeded.board_ids[0][0]).await.unwrap();
    tx.commit().await.unwrap();
    assert_eq!(board.allocated_job, None);
    assert!(!board.board_power);
}

#[tokio::test]
async fn quota_consolidation_consumes_once_and_is_idempotent() {
    let (rig, _seeded) = harness(2, 2, &[]).await;
    let job_id = Api::submit(&rig.state, submit_request(RequestShape::NumBoards { count: 1 }, 0, 1, 42)).await.unwrap();

    {
        let tx = rig.state.store.begin().await.unwrap();
        QuotaRepository::upsert_group(&tx, &GroupQuota { group_id: 42, quota: Some(1_000) }).await.unwrap();
        JobRepository::update_state(&tx, job_id, JobState::Destroyed).await.unwrap();
        QuotaRepository::upsert_job_usage(&tx, job_id, 42, 150).await.unwrap();
        tx.commit().await.unwrap();
    }

    QuotaManager::tick(&rig.state).await.unwrap();

    let tx = rig.state.store.begin().await.unwrap();
    let quota = QuotaRepository::get_group(&tx, 42).await.unwrap().unwrap();
    let usage = QuotaRepository::get_job_usage(&tx, job_id).await.unwrap().unwrap();
    tx.commit().await.unwrap();
    assert_eq!(quota.quota, Some(850));
    assert!(usage.accounted_for);

    // A second pass must not consume the already-accounted usage again.
    QuotaManager::tick(&rig.state).await.unwrap();
    let tx = rig.state.store.begin().await.unwrap();
    let quota_again = QuotaRepository::get_group(&tx, 42).await.unwrap().unwrap();
    tx.commit().await.unwrap();
    assert_eq!(quota_again.quota, Some(850));
}

#[tokio::test]
async fn bmp_failures_past_the_cap_destroy_the_job() {
    let (rig, seeded) = harness(2, 2, &[]).await;
    let job_id = Api::submit(&rig.state, submit_request(RequestShape::NumBoards { count: 1 }, 0, 1, 1)).await.unwrap();
    Allocator::tick(&rig.state).await.unwrap();

    rig.bmp.fail_address("10.0.0.1");

    let mut destroyed = false;
    for _ in 0..5 {
        PowerController::tick(&rig.state, seeded.machine_id).await.unwrap();
        let job = Api::get_job(&rig.state, job_id).await.unwrap();
        if job.job_state == JobState::Destroyed {
            destroyed = true;
            break;
        }
    }

    assert!(destroyed, "job should be destroyed once failures cross the cap");
    let job = Api::get_job(&rig.state, job_id).await.unwrap();
    assert_eq!(job.death_reason.as_deref(), Some("bmp failure"));
    assert_eq!(rig.bmp.call_count(), 0, "every call to the failing address was rejected");

    let tx = rig.state.store.begin().await.unwrap();
    let pending = PendingChangeRepository::count_for_job(&tx, job_id).await.unwrap();
    tx.commit().await.unwrap();
    assert_eq!(pending, 0);
}

#[tokio::test]
async fn startup_recovery_clears_stale_in_progress_changes() {
    use spalloc_domain_models::{direction::LinkBitmap, PendingChange};

    let (rig, seeded) = harness(2, 2, &[]).await;
    let job_id = Api::submit(&rig.state, submit_request(RequestShape::NumBoards { count: 1 }, 0, 1, 1)).await.unwrap();

    let tx = rig.state.store.begin().await.unwrap();
    let change_id =
        PendingChangeRepository::insert(&tx, &PendingChange::power_on(job_id, seeded.board_ids[0][0], LinkBitmap::none())).await.unwrap();
    PendingChangeRepository::mark_in_progress(&tx, change_id, true).await.unwrap();
    tx.commit().await.unwrap();

    let tx = rig.state.store.begin().await.unwrap();
    PendingChangeRepository::clear_all_in_progress(&tx).await.unwrap();
    tx.commit().await.unwrap();

    let tx = rig.state.store.begin().await.unwrap();
    let changes = PendingChangeRepository::list_for_machine_by_bmp(&tx, seeded.machine_id).await.unwrap();
    tx.commit().await.unwrap();
    assert!(changes.iter().all(|(_, change)| !change.in_progress));
}
