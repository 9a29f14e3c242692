use crate::session::{SessionId, SessionStore};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

/// Finds `name` in a `Cookie` header value.
fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then_some(value)
    })
}

fn session_from_request(request: &Request, store: &SessionStore) -> Option<SessionId> {
    request
        .headers()
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|raw| cookie_value(raw, store.cookie_name()))
        .and_then(SessionId::parse)
        .filter(|id| store.contains(id))
}

/// Attaches a [`SessionId`] to every request, issuing a new session cookie
/// when the client has none or its session expired.
pub async fn session_middleware(
    State(store): State<Arc<SessionStore>>,
    mut request: Request,
    next: Next,
) -> Response {
    let (session_id, is_new) = match session_from_request(&request, &store) {
        Some(id) => (id, false),
        None => (store.create(), true),
    };

    request.extensions_mut().insert(session_id.clone());
    let mut response = next.run(request).await;

    if is_new {
        let cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            store.cookie_name(),
            session_id,
            store.ttl().as_secs()
        );
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => warn!(error = %e, "Session cookie could not be encoded"),
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        extract::Extension,
        http::Request as HttpRequest,
        routing::get,
        Router,
    };
    use std::time::Duration;
    use tower::ServiceExt;

    async fn echo_session(Extension(id): Extension<SessionId>) -> String {
        id.to_string()
    }

    fn app(store: Arc<SessionStore>) -> Router {
        Router::new()
            .route("/", get(echo_session))
            .layer(axum::middleware::from_fn_with_state(store, session_middleware))
    }

    #[test]
    fn cookie_value_finds_named_pair() {
        let header = "theme=dark; sid=abc; other=1";
        assert_eq!(cookie_value(header, "sid"), Some("abc"));
        assert_eq!(cookie_value(header, "missing"), None);
    }

    #[tokio::test]
    async fn issues_cookie_for_new_client() {
        let store = Arc::new(SessionStore::new("sid", Duration::from_secs(600)));
        let response = app(store.clone())
            .oneshot(HttpRequest::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(cookie.starts_with("sid="));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn reuses_known_session() {
        let store = Arc::new(SessionStore::new("sid", Duration::from_secs(600)));
        let id = store.create();

        let response = app(store.clone())
            .oneshot(
                HttpRequest::builder()
                    .uri("/")
                    .header(header::COOKIE, format!("sid={}", id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.headers().get(header::SET_COOKIE).is_none());
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(std::str::from_utf8(&body).unwrap(), id.as_str());
    }
}
