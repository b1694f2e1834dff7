use chrono::{DateTime, Duration, TimeZone, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use uuid::Uuid;

use engine::{
    AddFillupCmd, ChainWarning, Engine, EngineError, ImportFillupRow, ImportFillupsCmd,
    MileageMode, UpdateFillupCmd,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO users (username, password) VALUES (?, ?)",
        vec!["alice".into(), "password".into()],
    ))
    .await
    .unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

fn day(offset: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 12, 1, 12, 0, 0).unwrap() + Duration::days(offset)
}

async fn odometer_vehicle(engine: &Engine, baseline: f64) -> String {
    engine
        .new_vehicle("Panda", "alice", MileageMode::Odometer, baseline)
        .await
        .unwrap()
}

#[tokio::test]
async fn first_fillup_anchors_on_baseline() {
    let (engine, _db) = engine_with_db().await;
    let vehicle_id = odometer_vehicle(&engine, 10_000.0).await;

    let saved = engine
        .add_fillup(
            AddFillupCmd::new(&vehicle_id, "alice", day(0), 50.0, 75.0).odometer(10_500.0),
        )
        .await
        .unwrap();

    assert_eq!(saved.fillup.distance_traveled, 500.0);
    assert_eq!(saved.fillup.fuel_consumption, Some(10.0));
    assert_eq!(saved.fillup.price_per_unit(), 1.5);
    assert!(saved.recalc.warnings.is_empty());
    assert_eq!(saved.recalc.attempted, 0);
}

#[tokio::test]
async fn out_of_order_insert_rewrites_later_fillup() {
    let (engine, _db) = engine_with_db().await;
    let vehicle_id = odometer_vehicle(&engine, 0.0).await;

    let a = engine
        .add_fillup(AddFillupCmd::new(&vehicle_id, "alice", day(10), 60.0, 90.0).odometer(1500.0))
        .await
        .unwrap();
    assert_eq!(a.fillup.distance_traveled, 1500.0);

    let b = engine
        .add_fillup(AddFillupCmd::new(&vehicle_id, "alice", day(7), 40.0, 60.0).odometer(950.0))
        .await
        .unwrap();
    assert_eq!(b.fillup.distance_traveled, 950.0);
    // A had to be rewritten: its predecessor is now B.
    assert_eq!(b.recalc.attempted, 1);
    assert_eq!(b.recalc.applied, 1);

    let fillups = engine.list_fillups(&vehicle_id, "alice").await.unwrap();
    assert_eq!(fillups.len(), 2);
    assert_eq!(fillups[0].distance_traveled, 950.0);
    assert_eq!(fillups[1].distance_traveled, 550.0);
    assert!((fillups[1].fuel_consumption.unwrap() - 60.0 / 550.0 * 100.0).abs() < 0.01);
}

#[tokio::test]
async fn date_edit_reorders_chain_and_warns() {
    let (engine, _db) = engine_with_db().await;
    let vehicle_id = odometer_vehicle(&engine, 0.0).await;

    for (offset, odometer, fuel) in [(0, 500.0, 30.0), (3, 950.0, 35.0), (9, 1500.0, 40.0)] {
        engine
            .add_fillup(
                AddFillupCmd::new(&vehicle_id, "alice", day(offset), fuel, fuel * 1.6)
                    .odometer(odometer),
            )
            .await
            .unwrap();
    }

    let fillups = engine.list_fillups(&vehicle_id, "alice").await.unwrap();
    let b_id = fillups[1].id;
    let c_id = fillups[2].id;

    // Move C between A and B, keeping its 1500 reading.
    let saved = engine
        .update_fillup(UpdateFillupCmd::new(&vehicle_id, c_id, "alice").date(day(1)))
        .await
        .unwrap();

    // C is rewritten (1500 - 500) and so is B, clamped to zero behind C.
    assert_eq!(saved.recalc.attempted, 2);
    assert_eq!(saved.recalc.applied, 2);
    assert_eq!(saved.fillup.distance_traveled, 1000.0);
    assert_eq!(
        saved.recalc.warnings,
        vec![ChainWarning::OdometerRegression {
            fillup_id: b_id,
            odometer: 950.0,
            reference: 1500.0,
        }]
    );

    let fillups = engine.list_fillups(&vehicle_id, "alice").await.unwrap();
    assert_eq!(fillups[2].id, b_id);
    assert_eq!(fillups[2].distance_traveled, 0.0);
    assert_eq!(fillups[2].fuel_consumption, None);
}

#[tokio::test]
async fn baseline_change_shifts_first_fillup() {
    let (engine, _db) = engine_with_db().await;
    let vehicle_id = odometer_vehicle(&engine, 10_000.0).await;

    engine
        .add_fillup(AddFillupCmd::new(&vehicle_id, "alice", day(0), 50.0, 75.0).odometer(10_500.0))
        .await
        .unwrap();

    let summary = engine
        .set_vehicle_baseline(&vehicle_id, "alice", 10_200.0)
        .await
        .unwrap();
    assert_eq!(summary.attempted, 1);
    assert_eq!(summary.applied, 1);

    let fillups = engine.list_fillups(&vehicle_id, "alice").await.unwrap();
    assert_eq!(fillups[0].distance_traveled, 300.0);
    assert!((fillups[0].fuel_consumption.unwrap() - 16.6667).abs() < 0.01);

    let vehicle = engine.vehicle(&vehicle_id, "alice").await.unwrap();
    assert_eq!(vehicle.baseline_odometer, 10_200.0);
}

#[tokio::test]
async fn update_reports_every_rewritten_row() {
    let (engine, _db) = engine_with_db().await;
    let vehicle_id = odometer_vehicle(&engine, 0.0).await;

    for (offset, odometer) in [(1, 100.0), (2, 200.0), (3, 300.0), (4, 400.0)] {
        engine
            .add_fillup(
                AddFillupCmd::new(&vehicle_id, "alice", day(offset), 10.0, 18.0).odometer(odometer),
            )
            .await
            .unwrap();
    }
    let fillups = engine.list_fillups(&vehicle_id, "alice").await.unwrap();
    let a_id = fillups[0].id;

    // Move the first record between the third and the fourth: B, A and D all
    // change, C keeps its delta.
    let saved = engine
        .update_fillup(
            UpdateFillupCmd::new(&vehicle_id, a_id, "alice").date(day(3) + Duration::hours(12)),
        )
        .await
        .unwrap();

    assert_eq!(saved.recalc.attempted, 3);
    assert_eq!(saved.recalc.applied, 3);
    assert_eq!(saved.fillup.distance_traveled, 0.0);
    assert!(saved
        .recalc
        .warnings
        .iter()
        .any(|w| w.fillup_id() == a_id));
}

#[tokio::test]
async fn update_without_chain_effect_rewrites_nothing() {
    let (engine, _db) = engine_with_db().await;
    let vehicle_id = odometer_vehicle(&engine, 0.0).await;

    let saved = engine
        .add_fillup(AddFillupCmd::new(&vehicle_id, "alice", day(0), 30.0, 48.0).odometer(600.0))
        .await
        .unwrap();

    let updated = engine
        .update_fillup(
            UpdateFillupCmd::new(&vehicle_id, saved.fillup.id, "alice").note("motorway trip"),
        )
        .await
        .unwrap();

    assert_eq!(updated.recalc.attempted, 0);
    assert_eq!(updated.recalc.applied, 0);
    assert_eq!(updated.fillup.note.as_deref(), Some("motorway trip"));
    assert_eq!(updated.fillup.distance_traveled, 600.0);
}

#[tokio::test]
async fn delete_reconnects_the_chain() {
    let (engine, _db) = engine_with_db().await;
    let vehicle_id = odometer_vehicle(&engine, 0.0).await;

    for (offset, odometer) in [(1, 100.0), (2, 250.0), (3, 400.0)] {
        engine
            .add_fillup(
                AddFillupCmd::new(&vehicle_id, "alice", day(offset), 12.0, 20.0).odometer(odometer),
            )
            .await
            .unwrap();
    }
    let fillups = engine.list_fillups(&vehicle_id, "alice").await.unwrap();
    let middle_id = fillups[1].id;

    let summary = engine
        .delete_fillup(&vehicle_id, middle_id, "alice")
        .await
        .unwrap();
    assert_eq!(summary.attempted, 1);
    assert_eq!(summary.applied, 1);

    let fillups = engine.list_fillups(&vehicle_id, "alice").await.unwrap();
    assert_eq!(fillups.len(), 2);
    assert_eq!(fillups[1].distance_traveled, 300.0);
}

#[tokio::test]
async fn import_reconciles_in_one_pass() {
    let (engine, _db) = engine_with_db().await;
    let vehicle_id = odometer_vehicle(&engine, 0.0).await;

    let rows = vec![
        ImportFillupRow {
            date: day(0),
            fuel_amount: 30.0,
            total_price: 48.0,
            odometer: Some(500.0),
            distance: None,
            note: None,
        },
        ImportFillupRow {
            date: day(4),
            fuel_amount: 35.0,
            total_price: 58.0,
            odometer: Some(950.0),
            distance: None,
            note: None,
        },
        ImportFillupRow {
            date: day(2),
            fuel_amount: 20.0,
            total_price: 33.0,
            odometer: Some(700.0),
            distance: None,
            note: Some("holiday".to_string()),
        },
    ];

    let outcome = engine
        .import_fillups(ImportFillupsCmd::new(&vehicle_id, "alice", rows))
        .await
        .unwrap();
    assert_eq!(outcome.inserted, 3);
    // Rows land with unset derived fields; the single pass fills all of them.
    assert_eq!(outcome.recalc.attempted, 3);
    assert_eq!(outcome.recalc.applied, 3);

    let fillups = engine.list_fillups(&vehicle_id, "alice").await.unwrap();
    let distances: Vec<f64> = fillups.iter().map(|f| f.distance_traveled).collect();
    assert_eq!(distances, vec![500.0, 200.0, 250.0]);
}

#[tokio::test]
async fn import_rejects_wrong_mode_rows_before_any_write() {
    let (engine, _db) = engine_with_db().await;
    let vehicle_id = odometer_vehicle(&engine, 0.0).await;

    let rows = vec![
        ImportFillupRow {
            date: day(0),
            fuel_amount: 30.0,
            total_price: 48.0,
            odometer: Some(500.0),
            distance: None,
            note: None,
        },
        ImportFillupRow {
            date: day(1),
            fuel_amount: 25.0,
            total_price: 40.0,
            odometer: None,
            distance: Some(300.0),
            note: None,
        },
    ];

    let err = engine
        .import_fillups(ImportFillupsCmd::new(&vehicle_id, "alice", rows))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let fillups = engine.list_fillups(&vehicle_id, "alice").await.unwrap();
    assert!(fillups.is_empty());
}

#[tokio::test]
async fn distance_mode_never_stores_odometers() {
    let (engine, _db) = engine_with_db().await;
    let vehicle_id = engine
        .new_vehicle("Vespa", "alice", MileageMode::Distance, 0.0)
        .await
        .unwrap();

    // Out of chronological order on purpose.
    engine
        .add_fillup(AddFillupCmd::new(&vehicle_id, "alice", day(5), 38.0, 60.0).distance(420.0))
        .await
        .unwrap();
    let early = engine
        .add_fillup(AddFillupCmd::new(&vehicle_id, "alice", day(0), 30.0, 50.0).distance(310.0))
        .await
        .unwrap();

    // No record depends on another: nothing to rewrite, no odometer appears.
    assert_eq!(early.recalc.attempted, 0);
    let fillups = engine.list_fillups(&vehicle_id, "alice").await.unwrap();
    assert!(fillups.iter().all(|f| f.odometer.is_none()));
    assert_eq!(fillups[0].distance_traveled, 310.0);
    assert_eq!(fillups[1].distance_traveled, 420.0);

    // Editing one distance touches only that record's consumption.
    let saved = engine
        .update_fillup(
            UpdateFillupCmd::new(&vehicle_id, early.fillup.id, "alice").distance(350.0),
        )
        .await
        .unwrap();
    assert_eq!(saved.recalc.attempted, 1);
    assert_eq!(saved.fillup.distance_traveled, 350.0);
    assert!((saved.fillup.fuel_consumption.unwrap() - 30.0 / 350.0 * 100.0).abs() < 0.01);
}

#[tokio::test]
async fn stagnant_reading_warns_but_saves() {
    let (engine, _db) = engine_with_db().await;
    let vehicle_id = odometer_vehicle(&engine, 0.0).await;

    engine
        .add_fillup(AddFillupCmd::new(&vehicle_id, "alice", day(0), 30.0, 48.0).odometer(800.0))
        .await
        .unwrap();
    let saved = engine
        .add_fillup(AddFillupCmd::new(&vehicle_id, "alice", day(1), 5.0, 9.0).odometer(800.0))
        .await
        .unwrap();

    assert_eq!(saved.fillup.distance_traveled, 0.0);
    assert_eq!(saved.fillup.fuel_consumption, None);
    assert_eq!(
        saved.recalc.warnings,
        vec![ChainWarning::OdometerStagnant {
            fillup_id: saved.fillup.id,
            odometer: 800.0,
        }]
    );
}

#[tokio::test]
async fn same_date_entries_keep_insertion_order() {
    let (engine, _db) = engine_with_db().await;
    let vehicle_id = odometer_vehicle(&engine, 0.0).await;

    let first = engine
        .add_fillup(AddFillupCmd::new(&vehicle_id, "alice", day(0), 10.0, 16.0).odometer(100.0))
        .await
        .unwrap();
    let second = engine
        .add_fillup(AddFillupCmd::new(&vehicle_id, "alice", day(0), 10.0, 16.0).odometer(200.0))
        .await
        .unwrap();

    assert!(second.recalc.warnings.is_empty());
    let fillups = engine.list_fillups(&vehicle_id, "alice").await.unwrap();
    assert_eq!(fillups[0].id, first.fillup.id);
    assert_eq!(fillups[1].id, second.fillup.id);
    assert_eq!(fillups[1].distance_traveled, 100.0);
}

#[tokio::test]
async fn mode_mismatch_and_bad_amounts_are_rejected() {
    let (engine, _db) = engine_with_db().await;
    let vehicle_id = odometer_vehicle(&engine, 0.0).await;

    let err = engine
        .add_fillup(AddFillupCmd::new(&vehicle_id, "alice", day(0), 30.0, 48.0).distance(300.0))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let err = engine
        .add_fillup(AddFillupCmd::new(&vehicle_id, "alice", day(0), 30.0, 48.0))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let err = engine
        .add_fillup(AddFillupCmd::new(&vehicle_id, "alice", day(0), 0.0, 48.0).odometer(100.0))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Validation("fuel_amount must be > 0".to_string())
    );

    let fillups = engine.list_fillups(&vehicle_id, "alice").await.unwrap();
    assert!(fillups.is_empty());
}

#[tokio::test]
async fn foreign_vehicles_stay_hidden() {
    let (engine, db) = engine_with_db().await;
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO users (username, password) VALUES (?, ?)",
        vec!["mallory".into(), "password".into()],
    ))
    .await
    .unwrap();

    let vehicle_id = odometer_vehicle(&engine, 0.0).await;

    let err = engine.vehicle(&vehicle_id, "mallory").await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("vehicle not exists".to_string()));

    let err = engine
        .add_fillup(
            AddFillupCmd::new(&vehicle_id, "mallory", day(0), 30.0, 48.0).odometer(100.0),
        )
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("vehicle not exists".to_string()));

    let err = engine
        .delete_fillup(&vehicle_id, Uuid::new_v4(), "alice")
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("fillup not exists".to_string()));
}

#[tokio::test]
async fn duplicate_vehicle_name_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    engine
        .new_vehicle("Panda", "alice", MileageMode::Odometer, 0.0)
        .await
        .unwrap();

    let err = engine
        .new_vehicle("  panda ", "alice", MileageMode::Distance, 0.0)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("panda".to_string()));
}

#[tokio::test]
async fn delete_vehicle_removes_its_fillups() {
    let (engine, _db) = engine_with_db().await;
    let vehicle_id = odometer_vehicle(&engine, 0.0).await;
    engine
        .add_fillup(AddFillupCmd::new(&vehicle_id, "alice", day(0), 30.0, 48.0).odometer(100.0))
        .await
        .unwrap();

    engine.delete_vehicle(&vehicle_id, "alice").await.unwrap();

    let err = engine.list_fillups(&vehicle_id, "alice").await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("vehicle not exists".to_string()));
    assert!(engine.vehicles("alice").await.unwrap().is_empty());
}
