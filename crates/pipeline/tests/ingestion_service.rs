//! Integration tests for ingestion, the logs table and report collection.

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use equiplog_core::alarm::AlarmKind;
use equiplog_core::batch::{LogBatch, LogReading};
use equiplog_core::error::CoreError;
use equiplog_core::pagination::Pagination;
use equiplog_core::report::{ReportFormat, ReportRequest};
use equiplog_core::situation::Situation;
use equiplog_core::types::DbId;
use equiplog_db::models::equipment::CreateEquipment;
use equiplog_db::models::metric_binding::{CreateMetric, CreateMetricBinding};
use equiplog_db::models::tenancy::{CreateClient, CreateUser};
use equiplog_db::repositories::{
    ClientRepo, EquipmentRepo, LogGroupRepo, MetricBindingRepo, MetricRepo, NotificationRepo,
    UserRepo,
};
use equiplog_events::{AlarmNotifier, AlarmRaised, EventBus};
use equiplog_pipeline::{
    IngestionConfig, IngestionService, LogTableService, PipelineError, ReportService,
};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Fixture
// ---------------------------------------------------------------------------

struct Fixture {
    equipment_id: DbId,
    metric_id: DbId,
    responsible_id: DbId,
}

/// One equipment with a temperature metric bound to 0..100, alarming at
/// <= 10 and >= 90.
async fn seed(pool: &PgPool) -> Fixture {
    let responsible = UserRepo::create(
        pool,
        &CreateUser {
            tenant_id: None,
            name: "Resp".into(),
            email: "resp@test.com".into(),
            role: "responsible".into(),
        },
    )
    .await
    .unwrap();
    let client = ClientRepo::create(
        pool,
        &CreateClient {
            tenant_id: None,
            name: "Acme".into(),
            responsible_user_id: Some(responsible.id),
            administrator_user_id: None,
        },
    )
    .await
    .unwrap();
    let equipment = EquipmentRepo::create(
        pool,
        &CreateEquipment {
            client_id: client.id,
            tenant_id: None,
            name: "Boiler 1".into(),
            api_key_hash: None,
        },
    )
    .await
    .unwrap();
    let metric = MetricRepo::create(
        pool,
        &CreateMetric {
            name: "Temperature".into(),
            unit: "C".into(),
        },
    )
    .await
    .unwrap();
    MetricBindingRepo::create(
        pool,
        &CreateMetricBinding {
            equipment_id: equipment.id,
            metric_id: metric.id,
            valor_minimo: 0.0,
            valor_maximo: 100.0,
            alarme_minimo: Some(10.0),
            alarme_maximo: Some(90.0),
        },
    )
    .await
    .unwrap();

    Fixture {
        equipment_id: equipment.id,
        metric_id: metric.id,
        responsible_id: responsible.id,
    }
}

fn batch(fixture: &Fixture, valor: f64) -> LogBatch {
    LogBatch {
        logs: vec![LogReading {
            id_metrica: fixture.metric_id,
            id_equipamento: Some(fixture.equipment_id),
            valor,
            valor_convertido: None,
            timestamp: None,
        }],
    }
}

fn service(pool: &PgPool, bus: Arc<EventBus>) -> IngestionService {
    IngestionService::new(pool.clone(), bus, IngestionConfig::default())
}

// ---------------------------------------------------------------------------
// Ingestion
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn full_scale_reading_converts_to_max_and_raises_alarm(pool: PgPool) {
    let fixture = seed(&pool).await;
    let bus = Arc::new(EventBus::default());
    let mut rx = bus.subscribe();

    let ingested = service(&pool, Arc::clone(&bus))
        .ingest(&batch(&fixture, 4095.0), None)
        .await
        .unwrap()
        .expect("batch with equipment id is ingested");

    let readings = ingested.group.readings().unwrap();
    assert_eq!(readings.len(), 1);
    assert_eq!(readings[0].valor_convertido, Some(100.0));
    assert!(readings[0].id_equipamento_metrica.is_some());

    let event = rx.recv().await.unwrap();
    let alarm = AlarmRaised::from_event(&event).unwrap().unwrap();
    assert_eq!(alarm.kind, AlarmKind::Max);
    assert_eq!(alarm.value, 100.0);

    let created = AlarmNotifier::new(pool.clone()).notify(&alarm).await.unwrap();
    assert_eq!(created, 1);
    let notes = NotificationRepo::list_for_user(&pool, fixture.responsible_id, false, 10, 0)
        .await
        .unwrap();
    assert!(notes[0].description.contains("Boiler 1"));
    assert!(notes[0].description.contains("Temperature"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn midscale_reading_converts_without_alarm(pool: PgPool) {
    let fixture = seed(&pool).await;
    let bus = Arc::new(EventBus::default());
    let mut rx = bus.subscribe();

    let ingested = service(&pool, Arc::clone(&bus))
        .ingest(&batch(&fixture, 2047.0), None)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(ingested.group.readings().unwrap()[0].valor_convertido, Some(49.99));
    assert!(ingested.alarms.is_empty());
    assert!(rx.try_recv().is_err());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn batch_without_equipment_is_a_no_op(pool: PgPool) {
    let fixture = seed(&pool).await;
    let mut orphan = batch(&fixture, 1.0);
    orphan.logs[0].id_equipamento = None;

    let result = service(&pool, Arc::new(EventBus::default()))
        .ingest(&orphan, None)
        .await
        .unwrap();
    assert!(result.is_none());

    let total = LogGroupRepo::count_for_equipment(&pool, fixture.equipment_id)
        .await
        .unwrap();
    assert_eq!(total, 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unknown_equipment_rolls_back_the_group(pool: PgPool) {
    let fixture = seed(&pool).await;
    let mut foreign = batch(&fixture, 1.0);
    foreign.logs[0].id_equipamento = Some(fixture.equipment_id + 1000);

    let result = service(&pool, Arc::new(EventBus::default()))
        .ingest(&foreign, None)
        .await;
    assert_matches!(result, Err(PipelineError::Database(_)));

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM equipment_log_groups")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows, 0);
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn repeated_identical_batches_are_reported_frozen(pool: PgPool) {
    let fixture = seed(&pool).await;
    let ingestion = service(&pool, Arc::new(EventBus::default()));

    for _ in 0..4 {
        ingestion.ingest(&batch(&fixture, 1000.0), None).await.unwrap();
    }
    let table = LogTableService::logs_table(&pool, fixture.equipment_id, Pagination::default(), None, None)
        .await
        .unwrap();
    assert_eq!(table.situation, Situation::Working);

    ingestion.ingest(&batch(&fixture, 1000.0), None).await.unwrap();
    let table = LogTableService::logs_table(&pool, fixture.equipment_id, Pagination::default(), None, None)
        .await
        .unwrap();
    assert_eq!(table.situation, Situation::Frozen);
    assert_eq!(table.rows.len(), 5);
    assert_eq!(table.columns.len(), 2);
    assert_eq!(table.pagination.as_ref().unwrap().total, 5);

    ingestion.ingest(&batch(&fixture, 1001.0), None).await.unwrap();
    let situation = LogTableService::situation(&pool, fixture.equipment_id).await.unwrap();
    assert_eq!(situation, Situation::Working);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn table_rows_carry_alarm_annotations(pool: PgPool) {
    let fixture = seed(&pool).await;
    service(&pool, Arc::new(EventBus::default()))
        .ingest(&batch(&fixture, 0.0), None)
        .await
        .unwrap();

    let table = LogTableService::logs_table(&pool, fixture.equipment_id, Pagination::default(), None, None)
        .await
        .unwrap();
    let field = format!("metrica_{}", fixture.metric_id);
    assert_eq!(table.rows[0][&field], 0.0);
    assert_eq!(table.rows[0][format!("{field}_alarm")], "min");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn date_bounded_table_is_unpaginated_and_limited_to_thirty_days(pool: PgPool) {
    let fixture = seed(&pool).await;
    service(&pool, Arc::new(EventBus::default()))
        .ingest(&batch(&fixture, 10.0), None)
        .await
        .unwrap();

    let now = Utc::now();
    let table = LogTableService::logs_table(
        &pool,
        fixture.equipment_id,
        Pagination::default(),
        Some(now - Duration::days(2)),
        Some(now + Duration::days(1)),
    )
    .await
    .unwrap();
    assert!(table.pagination.is_none());
    assert_eq!(table.rows.len(), 1);

    let too_wide = LogTableService::logs_table(
        &pool,
        fixture.equipment_id,
        Pagination::default(),
        Some(now - Duration::days(31)),
        Some(now),
    )
    .await;
    assert_matches!(too_wide, Err(PipelineError::Invalid(CoreError::Validation(_))));
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn report_summary_counts_the_range(pool: PgPool) {
    let fixture = seed(&pool).await;
    let ingestion = service(&pool, Arc::new(EventBus::default()));
    for valor in [100.0, 200.0] {
        ingestion.ingest(&batch(&fixture, valor), None).await.unwrap();
    }

    let now = Utc::now();
    let summary = ReportService::collect(
        &pool,
        &ReportRequest {
            id_equipamento: fixture.equipment_id,
            user_id: fixture.responsible_id,
            start_date: now - Duration::days(7),
            end_date: now + Duration::days(1),
            format: ReportFormat::Pdf,
            email: None,
        },
    )
    .await
    .unwrap();

    assert_eq!(summary.groups, 2);
    assert_eq!(summary.readings, 2);
    assert_eq!(summary.metrics, 1);
    assert_eq!(summary.range_days, 8);
}
