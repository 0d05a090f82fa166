#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use equiplog_api::auth::jwt::{generate_access_token, JwtConfig};
use equiplog_api::config::ServerConfig;
use equiplog_api::router::build_app_router;
use equiplog_api::state::AppState;
use equiplog_core::batch::LogBatch;
use equiplog_core::device_keys::{hash_device_key, DEVICE_KEY_HEADER};
use equiplog_core::report::ReportRequest;
use equiplog_core::types::DbId;
use equiplog_db::models::equipment::CreateEquipment;
use equiplog_db::models::metric_binding::{CreateMetric, CreateMetricBinding};
use equiplog_db::models::tenancy::{CreateClient, CreateUser};
use equiplog_db::repositories::{ClientRepo, EquipmentRepo, MetricBindingRepo, MetricRepo, UserRepo};
use equiplog_events::EventBus;
use equiplog_pipeline::{IngestionConfig, IngestionService};
use equiplog_queue::BatchQueue;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

pub const TEST_DEVICE_KEY: &str = "device-key-boiler-1";

// ---------------------------------------------------------------------------
// Fake broker
// ---------------------------------------------------------------------------

/// In-memory stand-in for the broker.
///
/// `connected` controls `is_connected`/`reconnect`; `accept` controls whether
/// publishes succeed. Accepted messages are recorded.
#[derive(Default)]
pub struct FakeQueue {
    pub connected: bool,
    pub accept: bool,
    pub batches: Mutex<Vec<LogBatch>>,
    pub reports: Mutex<Vec<ReportRequest>>,
}

impl FakeQueue {
    /// Broker down: nothing can be published.
    pub fn disconnected() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Broker up and accepting everything.
    pub fn accepting() -> Arc<Self> {
        Arc::new(Self {
            connected: true,
            accept: true,
            ..Self::default()
        })
    }

    /// Broker up but refusing publishes (nack / full).
    pub fn rejecting() -> Arc<Self> {
        Arc::new(Self {
            connected: true,
            accept: false,
            ..Self::default()
        })
    }
}

#[async_trait]
impl BatchQueue for FakeQueue {
    async fn is_connected(&self) -> bool {
        self.connected
    }

    async fn reconnect(&self) -> bool {
        self.connected
    }

    async fn publish_batch(&self, batch: &LogBatch) -> bool {
        if self.connected && self.accept {
            self.batches.lock().unwrap().push(batch.clone());
            return true;
        }
        false
    }

    async fn publish_report_request(&self, request: &ReportRequest) -> bool {
        if self.connected && self.accept {
            self.reports.lock().unwrap().push(request.clone());
            return true;
        }
        false
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// Full application router with a disconnected broker.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_queue(pool, FakeQueue::disconnected(), Arc::new(EventBus::default()))
}

/// Full application router over the given fake broker and event bus.
pub fn build_test_app_with_queue(
    pool: PgPool,
    queue: Arc<dyn BatchQueue>,
    event_bus: Arc<EventBus>,
) -> Router {
    let config = test_config();
    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(config.clone()),
        queue,
        ingestion: IngestionService::new(pool, event_bus, IngestionConfig::default()),
    };
    build_app_router(state, &config)
}

pub fn token_for(user_id: DbId, role: &str) -> String {
    generate_access_token(user_id, role, &test_config().jwt).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub struct Seeded {
    pub equipment_id: DbId,
    pub metric_id: DbId,
    pub responsible_id: DbId,
    pub outsider_id: DbId,
}

/// One client with a responsible user, one equipment keyed by
/// [`TEST_DEVICE_KEY`], and a metric bound to 0..100 alarming at 10 / 90.
/// Also an unrelated user with no access.
pub async fn seed(pool: &PgPool) -> Seeded {
    let responsible = UserRepo::create(
        pool,
        &CreateUser {
            tenant_id: None,
            name: "Responsible".into(),
            email: "resp@test.com".into(),
            role: "responsible".into(),
        },
    )
    .await
    .unwrap();
    let outsider = UserRepo::create(
        pool,
        &CreateUser {
            tenant_id: None,
            name: "Outsider".into(),
            email: "outsider@test.com".into(),
            role: "user".into(),
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
            api_key_hash: Some(hash_device_key(TEST_DEVICE_KEY)),
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

    Seeded {
        equipment_id: equipment.id,
        metric_id: metric.id,
        responsible_id: responsible.id,
        outsider_id: outsider.id,
    }
}

// ---------------------------------------------------------------------------
// HTTP helpers
// ---------------------------------------------------------------------------

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// POST a log batch as a device.
pub async fn post_device(app: Router, key: Option<&str>, body: serde_json::Value) -> Response<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/equipamento-logs/receive")
        .header("content-type", "application/json");
    if let Some(key) = key {
        builder = builder.header(DEVICE_KEY_HEADER, key);
    }
    send(app, builder.body(Body::from(body.to_string())).unwrap()).await
}
