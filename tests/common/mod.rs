#![allow(dead_code)]

use std::str::FromStr;
use std::sync::{Arc, Mutex};

use axum::{
    body::{self, Body, Bytes},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, DatabaseBackend as DbBackend, Statement};
use serde_json::Value;
use stock_ledger::{
    app_router,
    config::AppConfig,
    db,
    entities::product,
    services::ProductInput,
    session::SessionContext,
    AppState,
};
use tower::ServiceExt;

/// Test configuration on a private in-memory SQLite database.
pub fn test_config() -> AppConfig {
    let mut cfg = AppConfig::new(
        "sqlite::memory:".to_string(),
        "127.0.0.1".to_string(),
        18_080,
        "test".to_string(),
    );
    // One connection keeps every query on the same in-memory database.
    cfg.db_max_connections = 1;
    cfg.db_min_connections = 1;
    cfg
}

/// Helper harness for spinning up an application state backed by an in-memory SQLite database.
///
/// Requests share one cookie jar, so consecutive calls act as one browser
/// session.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    cookie: Mutex<Option<String>>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("json response")
    }

    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    pub fn header(&self, name: header::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(cfg: AppConfig) -> Self {
        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg);
        let router = app_router(state.clone());

        Self {
            router,
            state,
            cookie: Mutex::new(None),
        }
    }

    /// Forget the session cookie, as a new browser would.
    pub fn reset_session(&self) {
        *self.cookie.lock().unwrap() = None;
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, Body::empty(), None).await
    }

    pub async fn post_form(&self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        self.send(
            Method::POST,
            uri,
            Body::from(form_body(fields)),
            Some("application/x-www-form-urlencoded"),
        )
        .await
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Body,
        content_type: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        if let Some(cookie) = self.cookie.lock().unwrap().clone() {
            builder = builder.header(header::COOKIE, cookie);
        }

        let request = builder.body(body).expect("failed to build request");
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request");

        if let Some(set_cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
        {
            let pair = set_cookie.split(';').next().unwrap_or_default().to_string();
            *self.cookie.lock().unwrap() = Some(pair);
        }

        let status = response.status();
        let headers = response.headers().clone();
        let body = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("response body bytes");

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn seed_product(&self, code: &str, quantity: Decimal) -> product::Model {
        self.state
            .services
            .catalog
            .create(product_input(code, quantity))
            .await
            .expect("seed product for tests")
    }

    pub async fn product_quantity(&self, code: &str) -> Decimal {
        self.state
            .services
            .catalog
            .find_by_code(code)
            .await
            .expect("product lookup")
            .expect("product exists")
            .quantity
    }

    /// Runs raw SQL against the test database.
    pub async fn execute(&self, sql: &str) {
        self.state
            .db
            .execute(Statement::from_string(DbBackend::Sqlite, sql.to_string()))
            .await
            .expect("raw statement");
    }
}

pub fn product_input(code: &str, quantity: Decimal) -> ProductInput {
    ProductInput {
        code: code.to_string(),
        name: format!("Product {}", code),
        unit: "pcs".to_string(),
        quantity,
        location: Some("Rack 1".to_string()),
        min_stock: Decimal::ZERO,
    }
}

pub fn new_context() -> SessionContext {
    SessionContext::default()
}

/// Reads a decimal that serde wrote as a JSON string.
pub fn decimal(value: &Value) -> Decimal {
    Decimal::from_str(value.as_str().expect("decimal string")).expect("valid decimal")
}

fn form_body(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(key, value)| format!("{}={}", encode(key), encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

fn encode(raw: &str) -> String {
    raw.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' => (b as char).to_string(),
            b' ' => "+".to_string(),
            other => format!("%{:02X}", other),
        })
        .collect()
}
