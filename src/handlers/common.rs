use super::AppState;
use crate::errors::ServiceError;
use crate::session::{Flash, SessionContext, SessionId, SessionStore};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

/// JSON error body used by the line-item endpoints: `{"error": "..."}`.
pub fn item_error_response(err: ServiceError) -> Response {
    (
        err.status_code(),
        Json(serde_json::json!({ "error": err.response_message() })),
    )
        .into_response()
}

/// The caller's session context, checked out for the duration of a handler.
///
/// Changes are only kept once [`Session::save`] is called.
pub struct Session {
    id: SessionId,
    store: Arc<SessionStore>,
    pub ctx: SessionContext,
}

impl Session {
    pub fn save(self) {
        self.store.commit(&self.id, self.ctx);
    }

    /// Drains flashes and saves, for page views that display them.
    pub fn into_flashes(mut self) -> Vec<Flash> {
        let flashes = self.ctx.take_flashes();
        self.save();
        flashes
    }

    /// Saves the session and answers with `303 See Other` to `location`.
    pub fn redirect(self, location: &str) -> Response {
        self.save();
        Redirect::to(location).into_response()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let id = parts
            .extensions
            .get::<SessionId>()
            .cloned()
            .ok_or_else(|| ServiceError::InternalError("session layer missing".to_string()))?;

        Ok(Session {
            ctx: state.sessions.checkout(&id),
            store: state.sessions.clone(),
            id,
        })
    }
}

/// Treats a missing or blank form field as absent.
pub fn form_text(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}
