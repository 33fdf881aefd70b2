mod common;

use chrono::Duration;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

use upkeep_api::clock::Clock;
use upkeep_api::entities::job::{self, JobStatus, JobType};
use upkeep_api::errors::{codes, ServiceError};
use upkeep_api::services::costing::NewCostEntry;
use upkeep_api::services::jobs::{CreateJobInput, JobAction, TransitionPayload};

fn breakdown_input(app: &common::TestApp, asset_id: Uuid, actor: Uuid) -> CreateJobInput {
    CreateJobInput {
        company_id: app.company_id,
        asset_id,
        failure_type_id: None,
        title: "Hydraulic hose burst".to_string(),
        job_type: JobType::Breakdown,
        priority: "high".to_string(),
        safety_photo_required: false,
        created_by: actor,
    }
}

fn assign_payload(technician_id: Uuid) -> TransitionPayload {
    TransitionPayload {
        assignee_id: Some(technician_id),
        safety_photo_url: None,
    }
}

#[tokio::test]
async fn breakdown_job_full_lifecycle() {
    let app = common::TestApp::new().await;
    let actor = Uuid::new_v4();
    let asset = app.seed_asset("EXC-01", dec!(1200), false, None).await;
    let tech = app.seed_technician(dec!(25)).await;

    let job = app
        .services
        .jobs
        .create_job(breakdown_input(&app, asset.id, actor))
        .await
        .unwrap();
    assert_eq!(job.status, JobStatus::Created);
    assert_eq!(job.total_cost, Decimal::ZERO);

    let out = app
        .services
        .jobs
        .transition(job.id, JobAction::Assign, actor, assign_payload(tech.id))
        .await
        .unwrap();
    assert_eq!(out.job.status, JobStatus::Assigned);
    assert_eq!(out.job.assigned_to, Some(tech.id));

    // Start at 08:00
    let out = app
        .services
        .jobs
        .transition(job.id, JobAction::Start, actor, TransitionPayload::default())
        .await
        .unwrap();
    assert_eq!(out.job.status, JobStatus::InProgress);
    assert_eq!(out.job.started_at, Some(app.clock.now()));

    // Pause 10:00-10:30
    app.clock.advance(Duration::hours(2));
    app.services
        .jobs
        .transition(job.id, JobAction::Pause, actor, TransitionPayload::default())
        .await
        .unwrap();
    app.clock.advance(Duration::minutes(30));
    let out = app
        .services
        .jobs
        .transition(job.id, JobAction::Resume, actor, TransitionPayload::default())
        .await
        .unwrap();
    assert_eq!(out.job.total_pause_seconds, 1800);
    assert_eq!(out.job.paused_at, None);

    // Manual material cost
    app.services
        .costing
        .add_cost(
            job.id,
            NewCostEntry {
                cost_type: upkeep_api::entities::job_cost_entry::CostType::Material,
                amount: Some(dec!(120.00)),
                quantity: None,
                unit_cost: None,
                reference_type: None,
                reference_id: None,
                created_by: actor,
            },
        )
        .await
        .unwrap();

    // Complete at 12:00: 4h elapsed minus 30min pause = 3.5h * 25 = 87.50
    app.clock.advance(Duration::minutes(90));
    let out = app
        .services
        .jobs
        .transition(
            job.id,
            JobAction::Complete,
            actor,
            TransitionPayload::default(),
        )
        .await
        .unwrap();
    assert_eq!(out.job.status, JobStatus::Completed);
    assert_eq!(out.job.labor_cost, dec!(87.50));
    assert_eq!(out.job.material_cost, dec!(120.00));
    assert_eq!(out.job.total_cost, dec!(207.50));

    // Ledger reduction matches the materialized totals
    let entries = app.services.costing.entries(job.id).await.unwrap();
    assert_eq!(entries.len(), 2);
    let sum: Decimal = entries.iter().map(|e| e.amount).sum();
    assert_eq!(sum, out.job.total_cost);
    assert_eq!(entries.last().unwrap().running_total, sum);
    let seqs: Vec<i64> = entries.iter().map(|e| e.seq_no).collect();
    assert_eq!(seqs, vec![1, 2]);

    // Close freezes a verifiable snapshot
    let snapshot = app.services.jobs.close_job(job.id, actor).await.unwrap();
    assert_eq!(snapshot.total_cost, dec!(207.50));
    assert_eq!(snapshot.labor_hours, dec!(3.5));
    assert_eq!(snapshot.hourly_rate, dec!(25));

    let report = app.services.snapshots.verify(snapshot.id).await.unwrap();
    assert!(report.verified);
    assert_eq!(report.job_id, job.id);

    let stored = app.services.snapshots.get_for_job(job.id).await.unwrap();
    assert_eq!(stored.id, snapshot.id);

    // A second close is rejected from the terminal state
    let err = app.services.jobs.close_job(job.id, actor).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidTransition { .. }));
}

#[tokio::test]
async fn illegal_transitions_leave_the_job_untouched() {
    let app = common::TestApp::new().await;
    let actor = Uuid::new_v4();
    let asset = app.seed_asset("EXC-02", dec!(0), false, None).await;

    let job = app
        .services
        .jobs
        .create_job(breakdown_input(&app, asset.id, actor))
        .await
        .unwrap();

    // Start straight from CREATED skips assignment
    let err = app
        .services
        .jobs
        .transition(job.id, JobAction::Start, actor, TransitionPayload::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidTransition { .. }));

    let unchanged = app.services.jobs.get_job(job.id).await.unwrap();
    assert_eq!(unchanged.status, JobStatus::Created);
    assert_eq!(unchanged.started_at, None);

    // Cancel is legal from CREATED and is terminal
    let out = app
        .services
        .jobs
        .transition(
            job.id,
            JobAction::Cancel,
            actor,
            TransitionPayload::default(),
        )
        .await
        .unwrap();
    assert_eq!(out.job.status, JobStatus::Cancelled);

    let err = app
        .services
        .jobs
        .transition(
            job.id,
            JobAction::Assign,
            actor,
            assign_payload(Uuid::new_v4()),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidTransition { .. }));
}

#[tokio::test]
async fn assign_requires_a_known_technician() {
    let app = common::TestApp::new().await;
    let actor = Uuid::new_v4();
    let asset = app.seed_asset("EXC-03", dec!(0), false, None).await;

    let job = app
        .services
        .jobs
        .create_job(breakdown_input(&app, asset.id, actor))
        .await
        .unwrap();

    let err = app
        .services
        .jobs
        .transition(
            job.id,
            JobAction::Assign,
            actor,
            TransitionPayload::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));

    let err = app
        .services
        .jobs
        .transition(
            job.id,
            JobAction::Assign,
            actor,
            assign_payload(Uuid::new_v4()),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn safety_photo_gate_blocks_completion() {
    let app = common::TestApp::new().await;
    let actor = Uuid::new_v4();
    // Safety-critical asset forces the photo even when the job itself is not flagged
    let asset = app.seed_asset("CRN-01", dec!(0), true, None).await;
    let tech = app.seed_technician(dec!(30)).await;

    let job = app
        .services
        .jobs
        .create_job(breakdown_input(&app, asset.id, actor))
        .await
        .unwrap();
    app.services
        .jobs
        .transition(job.id, JobAction::Assign, actor, assign_payload(tech.id))
        .await
        .unwrap();
    app.services
        .jobs
        .transition(job.id, JobAction::Start, actor, TransitionPayload::default())
        .await
        .unwrap();
    app.clock.advance(Duration::hours(1));

    let err = app
        .services
        .jobs
        .transition(
            job.id,
            JobAction::Complete,
            actor,
            TransitionPayload::default(),
        )
        .await
        .unwrap_err();
    match err {
        ServiceError::Precondition { code, .. } => {
            assert_eq!(code, codes::SAFETY_PHOTO_REQUIRED)
        }
        other => panic!("expected precondition failure, got {:?}", other),
    }

    // Guard failure rolled back everything including status
    let unchanged = app.services.jobs.get_job(job.id).await.unwrap();
    assert_eq!(unchanged.status, JobStatus::InProgress);
    assert_eq!(unchanged.completed_at, None);

    let out = app
        .services
        .jobs
        .transition(
            job.id,
            JobAction::Complete,
            actor,
            TransitionPayload {
                assignee_id: None,
                safety_photo_url: Some("https://photos.example/crn-01-guard.jpg".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(out.job.status, JobStatus::Completed);
    assert_eq!(
        out.job.safety_photo_url.as_deref(),
        Some("https://photos.example/crn-01-guard.jpg")
    );
}

#[tokio::test]
async fn unreturned_parts_block_completion() {
    let app = common::TestApp::new().await;
    let actor = Uuid::new_v4();
    let asset = app.seed_asset("EXC-04", dec!(0), false, None).await;
    let tech = app.seed_technician(dec!(0)).await;

    let job = app
        .services
        .jobs
        .create_job(breakdown_input(&app, asset.id, actor))
        .await
        .unwrap();
    let line = app.seed_request_line(job.id, dec!(5), dec!(10)).await;

    app.services
        .jobs
        .transition(job.id, JobAction::Assign, actor, assign_payload(tech.id))
        .await
        .unwrap();
    app.services
        .jobs
        .transition(job.id, JobAction::Start, actor, TransitionPayload::default())
        .await
        .unwrap();

    app.services
        .costing
        .issue_parts(job.id, line.id, dec!(5), actor)
        .await
        .unwrap();

    let err = app
        .services
        .jobs
        .transition(
            job.id,
            JobAction::Complete,
            actor,
            TransitionPayload::default(),
        )
        .await
        .unwrap_err();
    match err {
        ServiceError::Precondition { code, .. } => assert_eq!(code, codes::UNRETURNED_PARTS),
        other => panic!("expected precondition failure, got {:?}", other),
    }

    app.services
        .costing
        .return_parts(job.id, line.id, dec!(5), actor)
        .await
        .unwrap();

    let out = app
        .services
        .jobs
        .transition(
            job.id,
            JobAction::Complete,
            actor,
            TransitionPayload::default(),
        )
        .await
        .unwrap();
    assert_eq!(out.job.status, JobStatus::Completed);
    // Issue and full return net out to zero material cost
    assert_eq!(out.job.material_cost, Decimal::ZERO);
}

#[tokio::test]
async fn repeated_pauses_accumulate() {
    let app = common::TestApp::new().await;
    let actor = Uuid::new_v4();
    let asset = app.seed_asset("EXC-05", dec!(0), false, None).await;
    let tech = app.seed_technician(dec!(40)).await;

    let job = app
        .services
        .jobs
        .create_job(breakdown_input(&app, asset.id, actor))
        .await
        .unwrap();
    app.services
        .jobs
        .transition(job.id, JobAction::Assign, actor, assign_payload(tech.id))
        .await
        .unwrap();
    app.services
        .jobs
        .transition(job.id, JobAction::Start, actor, TransitionPayload::default())
        .await
        .unwrap();

    for pause_minutes in [10, 20] {
        app.clock.advance(Duration::minutes(30));
        app.services
            .jobs
            .transition(job.id, JobAction::Pause, actor, TransitionPayload::default())
            .await
            .unwrap();
        app.clock.advance(Duration::minutes(pause_minutes));
        app.services
            .jobs
            .transition(
                job.id,
                JobAction::Resume,
                actor,
                TransitionPayload::default(),
            )
            .await
            .unwrap();
    }

    let current = app.services.jobs.get_job(job.id).await.unwrap();
    assert_eq!(current.total_pause_seconds, 30 * 60);

    // 120min elapsed - 30min paused = 1.5h billable at 40/h
    app.clock.advance(Duration::minutes(30));
    let out = app
        .services
        .jobs
        .transition(
            job.id,
            JobAction::Complete,
            actor,
            TransitionPayload::default(),
        )
        .await
        .unwrap();
    assert_eq!(out.job.labor_cost, dec!(60.00));
}

#[tokio::test]
async fn resume_without_a_recorded_pause_accrues_nothing() {
    let app = common::TestApp::new().await;
    let actor = Uuid::new_v4();
    let asset = app.seed_asset("EXC-06", dec!(0), false, None).await;
    let tech = app.seed_technician(dec!(40)).await;

    let job = app
        .services
        .jobs
        .create_job(breakdown_input(&app, asset.id, actor))
        .await
        .unwrap();
    app.services
        .jobs
        .transition(job.id, JobAction::Assign, actor, assign_payload(tech.id))
        .await
        .unwrap();
    app.services
        .jobs
        .transition(job.id, JobAction::Start, actor, TransitionPayload::default())
        .await
        .unwrap();
    app.services
        .jobs
        .transition(job.id, JobAction::Pause, actor, TransitionPayload::default())
        .await
        .unwrap();

    // Pause marker lost, as a crashed writer would leave it
    let current = app.services.jobs.get_job(job.id).await.unwrap();
    let mut update: job::ActiveModel = current.into();
    update.paused_at = Set(None);
    update.update(app.db.as_ref()).await.unwrap();

    app.clock.advance(Duration::minutes(45));
    let out = app
        .services
        .jobs
        .transition(
            job.id,
            JobAction::Resume,
            actor,
            TransitionPayload::default(),
        )
        .await
        .unwrap();
    assert_eq!(out.job.status, JobStatus::InProgress);
    // Nothing accrues when there is no pause start to measure from
    assert_eq!(out.job.total_pause_seconds, 0);
}

#[tokio::test]
async fn repeated_resume_never_double_counts() {
    let app = common::TestApp::new().await;
    let actor = Uuid::new_v4();
    let asset = app.seed_asset("EXC-07", dec!(0), false, None).await;
    let tech = app.seed_technician(dec!(40)).await;

    let job = app
        .services
        .jobs
        .create_job(breakdown_input(&app, asset.id, actor))
        .await
        .unwrap();
    app.services
        .jobs
        .transition(job.id, JobAction::Assign, actor, assign_payload(tech.id))
        .await
        .unwrap();
    app.services
        .jobs
        .transition(job.id, JobAction::Start, actor, TransitionPayload::default())
        .await
        .unwrap();
    app.services
        .jobs
        .transition(job.id, JobAction::Pause, actor, TransitionPayload::default())
        .await
        .unwrap();

    app.clock.advance(Duration::minutes(10));
    let out = app
        .services
        .jobs
        .transition(
            job.id,
            JobAction::Resume,
            actor,
            TransitionPayload::default(),
        )
        .await
        .unwrap();
    assert_eq!(out.job.total_pause_seconds, 600);

    // A second resume is rejected from IN_PROGRESS and counts nothing twice
    app.clock.advance(Duration::minutes(10));
    let err = app
        .services
        .jobs
        .transition(
            job.id,
            JobAction::Resume,
            actor,
            TransitionPayload::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidTransition { .. }));

    let current = app.services.jobs.get_job(job.id).await.unwrap();
    assert_eq!(current.total_pause_seconds, 600);
    assert_eq!(current.paused_at, None);
}
