//! Stock Ledger
//!
//! Warehouse stock keeping over HTTP: a product catalog, consumption bills
//! that take stock out and reception sheets that bring it in.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod health;
pub mod logging;
pub mod middleware_helpers;
pub mod migrator;
pub mod models;
pub mod openapi;
pub mod services;
pub mod session;
pub mod tracing;

use axum::{middleware, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::middleware_helpers::{request_id::request_id_middleware, session::session_middleware};
use crate::session::SessionStore;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<config::AppConfig>,
    pub services: handlers::AppServices,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    /// Wires services and an empty session store over `db`.
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Self {
        let sessions = Arc::new(SessionStore::new(
            config.session_cookie_name.clone(),
            config.session_ttl(),
        ));

        Self {
            services: handlers::AppServices::new(db.clone()),
            config: Arc::new(config),
            db,
            sessions,
        }
    }
}

/// Page and document routes behind the session layer, plus `/health`.
///
/// Server-wide layers (tracing, compression, CORS, access log) are added by
/// the binary.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .merge(handlers::dashboard::routes())
        .merge(handlers::products::routes())
        .merge(handlers::documents::bill_routes())
        .merge(handlers::documents::reception_routes())
        .layer(middleware::from_fn_with_state(
            state.sessions.clone(),
            session_middleware,
        ))
        .nest(
            "/health",
            health::health_routes(state.db.clone(), state.sessions.clone()),
        )
        // Ensure every request carries a request id for traceability
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}
