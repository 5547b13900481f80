use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::sync::RwLock;
use uuid::Uuid;

pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(8 * 60 * 60);

/// In-memory bearer-token sessions for the admin surface. Tokens expire after
/// the configured TTL; expired entries are purged lazily on verification.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Instant>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub async fn issue(&self) -> String {
        // 64 hex chars, same width the admin clients already expect from the
        // token endpoint.
        let token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        let expires_at = Instant::now() + self.ttl;
        self.sessions.write().await.insert(token.clone(), expires_at);
        log::info!("Issued a new admin session.");
        token
    }

    pub async fn verify(&self, token: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get(token) {
            Some(expires_at) if *expires_at > Instant::now() => true,
            Some(_) => {
                sessions.remove(token);
                log::debug!("Rejected an expired session token.");
                false
            }
            None => false,
        }
    }

    pub async fn revoke(&self, token: &str) {
        if self.sessions.write().await.remove(token).is_some() {
            log::info!("Admin session revoked.");
        }
    }
}
