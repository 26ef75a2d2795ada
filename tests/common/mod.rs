#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

use axum::Router;
use opsboard_api::auth::{AuthService, AuthUser};
use opsboard_api::config::AppConfig;
use opsboard_api::db::{self, DbConfig, DbPool};
use opsboard_api::entities::user::UserRole;
use opsboard_api::entities::{customer, product, user};
use opsboard_api::errors::ServiceError;
use opsboard_api::events::{self, EventSender};
use opsboard_api::handlers::AppServices;
use opsboard_api::services::{AutomationService, BoardService, EmailTransport};

/// One message captured by [`RecordingTransport`].
#[derive(Debug, Clone)]
pub struct SentMail {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// Transport that records every send instead of delivering anything.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<SentMail>>,
}

impl RecordingTransport {
    pub async fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl EmailTransport for RecordingTransport {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), ServiceError> {
        self.sent.lock().await.push(SentMail {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

/// Transport that refuses every send, for delivery-failure paths.
#[derive(Debug, Default)]
pub struct FailingTransport;

#[async_trait]
impl EmailTransport for FailingTransport {
    async fn send(&self, _recipient: &str, _subject: &str, _body: &str) -> Result<(), ServiceError> {
        Err(ServiceError::TransportError(
            "connection refused".to_string(),
        ))
    }
}

/// Test harness over an in-memory SQLite database with migrations
/// applied and one user of each role seeded.
pub struct TestApp {
    pub db: Arc<DbPool>,
    pub event_sender: Arc<EventSender>,
    pub services: AppServices,
    pub transport: Arc<RecordingTransport>,
    pub admin: AuthUser,
    pub staff: AuthUser,
    pub member: AuthUser,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        // A shared in-memory database needs a single connection; two
        // pool connections would each see their own empty schema.
        let cfg = DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            acquire_timeout: Duration::from_secs(5),
        };
        let pool = db::establish_connection_with_config(&cfg)
            .await
            .expect("failed to open test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");
        let db = Arc::new(pool);

        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = Arc::new(EventSender::new(event_tx));
        let event_task = tokio::spawn(events::process_events(event_rx));

        let transport = Arc::new(RecordingTransport::default());
        let mail: Arc<dyn EmailTransport> = transport.clone();
        let services = AppServices::new(db.clone(), event_sender.clone(), mail);

        let admin = seed_user(&db, "Alice Admin", "alice@example.com", UserRole::Admin).await;
        let staff = seed_user(&db, "Sam Staff", "sam@example.com", UserRole::Staff).await;
        let member = seed_user(&db, "Uma User", "uma@example.com", UserRole::User).await;

        Self {
            db,
            event_sender,
            services,
            transport,
            admin,
            staff,
            member,
            _event_task: event_task,
        }
    }

    /// Builds a board service wired to a custom transport, leaving the
    /// shared services untouched.
    pub fn board_service_with_transport(&self, transport: Arc<dyn EmailTransport>) -> BoardService {
        let automation =
            AutomationService::new(self.db.clone(), self.event_sender.clone(), transport);
        BoardService::new(self.db.clone(), self.event_sender.clone(), automation)
    }

    /// Assembles the real application router over the harness database,
    /// mirroring the wiring in `main`.
    pub fn router(&self) -> (Router, Arc<AuthService>) {
        let auth_service = Arc::new(AuthService::new(
            self.db.clone(),
            TEST_JWT_SECRET.to_string(),
            3600,
        ));
        (self.router_with_auth(auth_service.clone()), auth_service)
    }

    /// Same as [`Self::router`] but with a caller-supplied auth service,
    /// for exercising its failure paths.
    pub fn router_with_auth(&self, auth_service: Arc<AuthService>) -> Router {
        let config = AppConfig::new(
            "sqlite::memory:".to_string(),
            TEST_JWT_SECRET.to_string(),
            3600,
            "127.0.0.1".to_string(),
            0,
            "test".to_string(),
        );
        let state = Arc::new(opsboard_api::AppState {
            db: self.db.clone(),
            config,
            event_sender: (*self.event_sender).clone(),
            auth_service: auth_service.clone(),
            services: self.services.clone(),
        });
        Router::new()
            .merge(opsboard_api::status_routes())
            .nest("/api/v1", opsboard_api::api_v1_routes())
            .layer(axum::Extension(auth_service))
            .with_state(state)
    }
}

pub const TEST_JWT_SECRET: &str = "integration-test-secret-0123456789abcdef";

pub async fn seed_user(db: &DbPool, name: &str, email: &str, role: UserRole) -> AuthUser {
    let model = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        email: Set(email.to_string()),
        password_hash: Set("unused-in-tests".to_string()),
        role: Set(role),
        is_active: Set(true),
        created_at: Set(Utc::now()),
        updated_at: Set(None),
    };
    let created = model.insert(db).await.expect("failed to seed user");
    AuthUser::from_user(&created)
}

pub async fn seed_product(app: &TestApp, name: &str, price: Decimal, stock: i32) -> product::Model {
    let model = product::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        description: Set(None),
        price: Set(price),
        stock: Set(stock),
        image_url: Set(None),
        category: Set(None),
        created_at: Set(Utc::now()),
        updated_at: Set(None),
    };
    model.insert(&*app.db).await.expect("failed to seed product")
}

pub async fn seed_customer(app: &TestApp, name: &str, email: &str) -> customer::Model {
    let model = customer::ActiveModel {
        id: Set(Uuid::new_v4()),
        document: Set(format!("DOC-{}", Uuid::new_v4())),
        name: Set(name.to_string()),
        email: Set(email.to_string()),
        phone: Set(None),
        city: Set(None),
        created_at: Set(Utc::now()),
        updated_at: Set(None),
    };
    model
        .insert(&*app.db)
        .await
        .expect("failed to seed customer")
}
