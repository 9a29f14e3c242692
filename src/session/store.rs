use super::context::SessionContext;
use dashmap::DashMap;
use metrics::gauge;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::debug;
use uuid::Uuid;

/// Opaque identifier carried in the session cookie.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        SessionId(Uuid::new_v4().simple().to_string())
    }

    /// Accepts only ids this store could have issued.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        (raw.len() == 32 && raw.chars().all(|c| c.is_ascii_hexdigit()))
            .then(|| SessionId(raw.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

struct Entry {
    context: SessionContext,
    last_seen: Instant,
}

/// In-process session contexts keyed by session id.
///
/// Handlers check a context out, work on the copy and commit it back.
pub struct SessionStore {
    sessions: DashMap<SessionId, Entry>,
    cookie_name: String,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(cookie_name: impl Into<String>, ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            cookie_name: cookie_name.into(),
            ttl,
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Starts an empty session, dropping sessions idle past the TTL first.
    pub fn create(&self) -> SessionId {
        self.prune_expired();
        let id = SessionId::generate();
        self.sessions.insert(
            id.clone(),
            Entry {
                context: SessionContext::default(),
                last_seen: Instant::now(),
            },
        );
        gauge!("stock_ledger.sessions.active", self.sessions.len() as f64);
        debug!(session_id = %id, "Session created");
        id
    }

    /// True if `id` names a live session.
    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions
            .get(id)
            .map(|entry| entry.last_seen.elapsed() <= self.ttl)
            .unwrap_or(false)
    }

    /// Returns a copy of the session's context, or an empty one if the
    /// session is unknown.
    pub fn checkout(&self, id: &SessionId) -> SessionContext {
        match self.sessions.get_mut(id) {
            Some(mut entry) => {
                entry.last_seen = Instant::now();
                entry.context.clone()
            }
            None => SessionContext::default(),
        }
    }

    pub fn commit(&self, id: &SessionId, context: SessionContext) {
        self.sessions.insert(
            id.clone(),
            Entry {
                context,
                last_seen: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn prune_expired(&self) {
        let ttl = self.ttl;
        let before = self.sessions.len();
        self.sessions.retain(|_, entry| entry.last_seen.elapsed() <= ttl);
        let pruned = before.saturating_sub(self.sessions.len());
        if pruned > 0 {
            debug!(pruned, "Expired sessions removed");
        }
    }
}
