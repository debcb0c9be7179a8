use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, Response},
    Router,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

use presale_api::{
    config::AppConfig,
    db,
    entities::{customer, distribution, order},
    events::{self, EventSender},
    handlers::AppServices,
    middleware_helpers::request_id::request_id_middleware,
    AppState,
};

/// Helper harness for spinning up an application backed by an in-memory
/// SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.auto_migrate = true;
        // A single connection keeps the in-memory database alive and shared.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");

        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(cfg.event_channel_capacity);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let services = AppServices::new(db_arc.clone(), Arc::new(event_sender.clone()));
        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
        };

        let router = Router::new()
            .nest("/api/v1", presale_api::api_v1_routes())
            .layer(axum::middleware::from_fn(request_id_middleware))
            .with_state(state.clone());

        Self {
            router,
            state,
            _event_task: event_task,
        }
    }

    /// Sends a request through the router without binding a socket.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.router
            .clone()
            .oneshot(builder.body(body).expect("failed to build request"))
            .await
            .expect("request should not fail at the transport level")
    }

    pub async fn seed_customer(&self, name: &str) -> customer::Model {
        customer::ActiveModel {
            name: Set(name.to_string()),
            is_served: Set(false),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
            deleted_at: Set(None),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed customer")
    }

    pub async fn seed_distribution(&self, name: &str) -> distribution::Model {
        distribution::ActiveModel {
            name: Set(name.to_string()),
            status: Set("open".to_string()),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
            deleted_at: Set(None),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed distribution")
    }

    pub async fn seed_deleted_distribution(&self, name: &str) -> distribution::Model {
        distribution::ActiveModel {
            name: Set(name.to_string()),
            status: Set("closed".to_string()),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
            deleted_at: Set(Some(Utc::now())),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed deleted distribution")
    }

    pub async fn seed_order(
        &self,
        customer_id: i64,
        distribution_id: i64,
        amount: i32,
    ) -> order::Model {
        order::ActiveModel {
            customer_id: Set(customer_id),
            distribution_id: Set(distribution_id),
            amount: Set(amount),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
            deleted_at: Set(None),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed order")
    }
}

/// Reads a response body as JSON.
pub async fn read_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    serde_json::from_slice(&bytes).expect("response body should be valid JSON")
}
