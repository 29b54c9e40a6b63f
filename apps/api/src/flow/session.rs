//! Session persistence for `ApplicationState`.
//!
//! Sessions are cached as JSON with a TTL. A stored document that is not valid
//! JSON, or whose stage is not a known `Stage`, loads as a fresh WELCOME session
//! and logs a warning instead of failing the request.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use redis::AsyncCommands;
use serde_json::Value;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::flow::stage::Stage;
use crate::flow::state::ApplicationState;

/// Carried in `AppState` as `Arc<dyn SessionStore>`.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, id: Uuid) -> Result<Option<String>, AppError>;
    async fn save(&self, id: Uuid, json: String, ttl: Duration) -> Result<(), AppError>;
}

/// Redis-backed sessions under `session:{id}` with `SET EX`.
#[derive(Clone)]
pub struct RedisSessionStore {
    client: redis::Client,
}

impl RedisSessionStore {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    fn key(id: Uuid) -> String {
        format!("session:{id}")
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, id: Uuid) -> Result<Option<String>, AppError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let value: Option<String> = conn.get(Self::key(id)).await?;
        Ok(value)
    }

    async fn save(&self, id: Uuid, json: String, ttl: Duration) -> Result<(), AppError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.set_ex::<_, _, ()>(Self::key(id), json, ttl.as_secs().max(1))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
pub use memory::MemorySessionStore;


/// Decodes a stored session, falling back to a fresh state when the document is
/// corrupt or names an unknown stage.
pub fn decode_session(id: Uuid, raw: &str) -> ApplicationState {
    let value: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!(session_id = %id, "Session document is not valid JSON ({e}); resetting to WELCOME");
            return ApplicationState::new();
        }
    };

    let stage = value.get("stage").and_then(Value::as_str).unwrap_or_default();
    if Stage::parse(stage).is_none() {
        warn!(session_id = %id, stage, "Unrecognized stage in session; resetting to WELCOME");
        return ApplicationState::new();
    }

    match serde_json::from_value(value) {
        Ok(state) => state,
        Err(e) => {
            warn!(session_id = %id, "Session document failed to decode ({e}); resetting to WELCOME");
            ApplicationState::new()
        }
    }
}

pub async fn load_session(
    store: &dyn SessionStore,
    id: Uuid,
) -> Result<ApplicationState, AppError> {
    Ok(match store.load(id).await? {
        Some(raw) => decode_session(id, &raw),
        None => ApplicationState::new(),
    })
}

pub async fn save_session(
    store: &dyn SessionStore,
    id: Uuid,
    state: &ApplicationState,
    ttl: Duration,
) -> Result<(), AppError> {
    let json = serde_json::to_string(state).map_err(|e| AppError::Internal(e.into()))?;
    store.save(id, json, ttl).await
}

/// One async mutex per live session id, so a session has a single writer at a
/// time. Entries are dropped once no request holds or waits on them.
#[derive(Clone, Default)]
pub struct SessionLocks {
    locks: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
}

pub struct SessionGuard {
    id: Uuid,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, id: Uuid) -> SessionGuard {
        let mutex = self
            .locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = mutex.lock_owned().await;
        SessionGuard {
            id,
            guard: Some(guard),
            locks: self.locks.clone(),
        }
    }

    #[cfg(test)]
    pub fn active(&self) -> usize {
        self.locks.len()
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks
            .remove_if(&self.id, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
