mod common;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use uuid::Uuid;

use upkeep_api::clock::Clock;
use upkeep_api::entities::alert::{self, AlertSeverity};
use upkeep_api::entities::job::{self, JobStatus, JobType};
use upkeep_api::entities::{asset, pm_schedule};
use upkeep_api::errors::ServiceError;
use upkeep_api::services::jobs::{JobAction, TransitionPayload};
use upkeep_api::services::pm::SupervisorOverride;

#[tokio::test]
async fn readings_below_due_point_generate_nothing() {
    let app = common::TestApp::new().await;
    let actor = Uuid::new_v4();
    let target = app.seed_asset("EXC-10", dec!(900), false, None).await;
    app.seed_schedule(target.id, dec!(100), dec!(1000), "PM service - {asset_code}")
        .await;

    let outcome = app
        .services
        .pm
        .record_meter_reading(target.id, dec!(950), actor, None)
        .await
        .unwrap();
    assert!(!outcome.rollback_detected);
    assert!(outcome.generated_job_ids.is_empty());

    let refreshed = asset::Entity::find_by_id(target.id)
        .one(app.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(refreshed.current_meter, dec!(950));
}

#[tokio::test]
async fn due_reading_generates_one_job_and_advances_the_schedule() {
    let app = common::TestApp::new().await;
    let actor = Uuid::new_v4();
    let target = app.seed_asset("EXC-11", dec!(900), false, None).await;
    let schedule = app
        .seed_schedule(target.id, dec!(100), dec!(1000), "PM service - {asset_code}")
        .await;

    let outcome = app
        .services
        .pm
        .record_meter_reading(target.id, dec!(1050), actor, None)
        .await
        .unwrap();
    assert_eq!(outcome.generated_job_ids.len(), 1);

    let generated = app
        .services
        .jobs
        .get_job(outcome.generated_job_ids[0])
        .await
        .unwrap();
    assert_eq!(generated.job_type, JobType::Preventive);
    assert_eq!(generated.status, JobStatus::Created);
    assert_eq!(generated.title, "PM service - EXC-11");
    assert_eq!(generated.pm_schedule_id, Some(schedule.id));
    // 1050 is past the 1010 grace point
    assert_eq!(generated.priority, "high");

    let advanced = pm_schedule::Entity::find_by_id(schedule.id)
        .one(app.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(advanced.last_service_meter, dec!(1050));
    assert_eq!(advanced.next_due_meter, dec!(1150));

    // Second sweep at the same meter: not due again
    let generated_again = app
        .services
        .pm
        .check_pm_due(app.company_id, Some(target.id), actor)
        .await
        .unwrap();
    assert!(generated_again.is_empty());
}

#[tokio::test]
async fn pending_job_suppresses_duplicates_until_finished() {
    let app = common::TestApp::new().await;
    let actor = Uuid::new_v4();
    let target = app.seed_asset("EXC-12", dec!(1000), false, None).await;
    let schedule = app
        .seed_schedule(target.id, dec!(100), dec!(1000), "PM - {asset_code}")
        .await;

    let outcome = app
        .services
        .pm
        .record_meter_reading(target.id, dec!(1005), actor, None)
        .await
        .unwrap();
    assert_eq!(outcome.generated_job_ids.len(), 1);
    let pending_id = outcome.generated_job_ids[0];
    // Within the grace window, schedule priority carries over
    let pending = app.services.jobs.get_job(pending_id).await.unwrap();
    assert_eq!(pending.priority, "medium");

    // Meter passes the next due point while the job is still open
    let outcome = app
        .services
        .pm
        .record_meter_reading(target.id, dec!(1160), actor, None)
        .await
        .unwrap();
    assert!(outcome.generated_job_ids.is_empty());
    let held = pm_schedule::Entity::find_by_id(schedule.id)
        .one(app.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    // Due point stays put while suppressed
    assert_eq!(held.next_due_meter, dec!(1105));

    // Cancelling the pending job releases the schedule
    app.services
        .jobs
        .transition(
            pending_id,
            JobAction::Cancel,
            actor,
            TransitionPayload::default(),
        )
        .await
        .unwrap();

    let generated = app
        .services
        .pm
        .check_pm_due(app.company_id, Some(target.id), actor)
        .await
        .unwrap();
    assert_eq!(generated.len(), 1);
    let released = pm_schedule::Entity::find_by_id(schedule.id)
        .one(app.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(released.next_due_meter, dec!(1260));
}

#[tokio::test]
async fn rollback_is_alerted_and_does_not_move_the_meter() {
    let app = common::TestApp::new().await;
    let actor = Uuid::new_v4();
    let target = app.seed_asset("EXC-13", dec!(1100), false, None).await;
    app.seed_schedule(target.id, dec!(100), dec!(1000), "PM - {asset_code}")
        .await;

    let outcome = app
        .services
        .pm
        .record_meter_reading(target.id, dec!(1000), actor, None)
        .await
        .unwrap();
    assert!(outcome.rollback_detected);
    assert!(outcome.generated_job_ids.is_empty());
    assert!(outcome.reading.rollback);
    assert_eq!(outcome.reading.previous_reading, Some(dec!(1100)));

    // Meter untouched, reading stored, alert raised
    let unchanged = asset::Entity::find_by_id(target.id)
        .one(app.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unchanged.current_meter, dec!(1100));

    let alerts = alert::Entity::find().all(app.db.as_ref()).await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].severity, AlertSeverity::High);
    assert_eq!(alerts[0].asset_id, Some(target.id));
}

#[tokio::test]
async fn supervisor_override_accepts_the_rollback() {
    let app = common::TestApp::new().await;
    let actor = Uuid::new_v4();
    let supervisor = Uuid::new_v4();
    let target = app.seed_asset("EXC-14", dec!(1100), false, None).await;

    let outcome = app
        .services
        .pm
        .record_meter_reading(
            target.id,
            dec!(200),
            actor,
            Some(SupervisorOverride {
                supervisor_id: supervisor,
                reason: "Replaced hour meter gauge".to_string(),
            }),
        )
        .await
        .unwrap();
    assert!(outcome.rollback_detected);

    let updated = asset::Entity::find_by_id(target.id)
        .one(app.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.current_meter, dec!(200));

    let alerts = alert::Entity::find().all(app.db.as_ref()).await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].severity, AlertSeverity::Warning);
    assert!(alerts[0].message.contains(&supervisor.to_string()));
}

#[tokio::test]
async fn negative_readings_and_unknown_assets_are_rejected() {
    let app = common::TestApp::new().await;
    let actor = Uuid::new_v4();

    let err = app
        .services
        .pm
        .record_meter_reading(Uuid::new_v4(), dec!(100), actor, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let target = app.seed_asset("EXC-15", dec!(100), false, None).await;
    let err = app
        .services
        .pm
        .record_meter_reading(target.id, dec!(-1), actor, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));

    let err = app
        .services
        .pm
        .check_pm_due(app.company_id, Some(Uuid::new_v4()), actor)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn database_rejects_a_second_pending_job_per_schedule() {
    let app = common::TestApp::new().await;
    let actor = Uuid::new_v4();
    let target = app.seed_asset("EXC-16", dec!(900), false, None).await;
    let schedule = app
        .seed_schedule(target.id, dec!(100), dec!(1000), "PM service - {asset_code}")
        .await;

    let outcome = app
        .services
        .pm
        .record_meter_reading(target.id, dec!(1005), actor, None)
        .await
        .unwrap();
    assert_eq!(outcome.generated_job_ids.len(), 1);

    // A writer that skips the pending-job check still hits the partial
    // unique index on jobs(pm_schedule_id).
    let now = app.clock.now();
    let duplicate = job::ActiveModel {
        id: Set(Uuid::new_v4()),
        company_id: Set(app.company_id),
        asset_id: Set(target.id),
        failure_type_id: Set(None),
        pm_schedule_id: Set(Some(schedule.id)),
        title: Set("PM service - EXC-16".to_string()),
        job_type: Set(JobType::Preventive),
        status: Set(JobStatus::Created),
        priority: Set("medium".to_string()),
        assigned_to: Set(None),
        safety_photo_required: Set(false),
        safety_photo_url: Set(None),
        total_pause_seconds: Set(0),
        material_cost: Set(Decimal::ZERO),
        labor_cost: Set(Decimal::ZERO),
        fuel_cost: Set(Decimal::ZERO),
        service_cost: Set(Decimal::ZERO),
        other_cost: Set(Decimal::ZERO),
        total_cost: Set(Decimal::ZERO),
        created_by: Set(actor),
        created_at: Set(now),
        started_at: Set(None),
        paused_at: Set(None),
        completed_at: Set(None),
        closed_at: Set(None),
        updated_at: Set(now),
    };
    assert!(duplicate.insert(app.db.as_ref()).await.is_err());
}
