//! Live editor sessions for all users.
//!
//! Each session sits behind its own [`tokio::sync::Mutex`] so one user's
//! long network step never blocks another user. Idle sessions are evicted
//! by [`run_reaper`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use storysplice_core::types::DbId;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::PipelineError;
use crate::session::EditorSession;

pub type SessionHandle = Arc<Mutex<EditorSession>>;

/// A busy session idle for this many TTLs is evicted anyway.
const STALE_BUSY_TTL_FACTOR: u32 = 4;

struct Entry {
    owner_id: DbId,
    handle: SessionHandle,
    last_seen: Instant,
}

pub struct SessionRegistry {
    entries: RwLock<HashMap<Uuid, Entry>>,
    idle_ttl: Duration,
}

impl SessionRegistry {
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            idle_ttl,
        }
    }

    pub fn idle_ttl(&self) -> Duration {
        self.idle_ttl
    }

    /// Open a fresh, empty session for `owner_id`.
    pub async fn create(&self, owner_id: DbId) -> (Uuid, SessionHandle) {
        let id = Uuid::now_v7();
        let handle = Arc::new(Mutex::new(EditorSession::new(id, owner_id)));
        self.entries.write().await.insert(
            id,
            Entry {
                owner_id,
                handle: Arc::clone(&handle),
                last_seen: Instant::now(),
            },
        );
        tracing::info!(session_id = %id, owner_id, "Editor session opened");
        (id, handle)
    }

    /// Look up a session owned by `owner_id` and mark it active.
    ///
    /// Sessions of other owners are reported as missing.
    pub async fn get(&self, id: Uuid, owner_id: DbId) -> Result<SessionHandle, PipelineError> {
        let mut entries = self.entries.write().await;
        match entries.get_mut(&id) {
            Some(entry) if entry.owner_id == owner_id => {
                entry.last_seen = Instant::now();
                Ok(Arc::clone(&entry.handle))
            }
            _ => Err(not_found()),
        }
    }

    /// End a session. Its storyboard and displayed video are dropped.
    pub async fn remove(&self, id: Uuid, owner_id: DbId) -> Result<(), PipelineError> {
        let mut entries = self.entries.write().await;
        match entries.get(&id) {
            Some(entry) if entry.owner_id == owner_id => {
                entries.remove(&id);
                tracing::info!(session_id = %id, owner_id, "Editor session closed");
                Ok(())
            }
            _ => Err(not_found()),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Evict sessions not seen since `now - idle_ttl`.
    ///
    /// Sessions that are locked or mid-operation are kept until they have
    /// been idle for [`STALE_BUSY_TTL_FACTOR`] TTLs. An in-flight operation
    /// of an evicted session still finishes on its own handle. Returns the
    /// number evicted.
    pub async fn reap_idle(&self, now: Instant) -> usize {
        let stale_after = self.idle_ttl.saturating_mul(STALE_BUSY_TTL_FACTOR);
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|id, entry| {
            let idle = now.saturating_duration_since(entry.last_seen);
            if idle < self.idle_ttl {
                return true;
            }
            let busy = match entry.handle.try_lock() {
                Ok(session) => session.phase().is_busy(),
                Err(_) => true,
            };
            if !busy {
                tracing::debug!(session_id = %id, idle_secs = idle.as_secs(), "Reaping idle editor session");
                return false;
            }
            if idle >= stale_after {
                tracing::warn!(session_id = %id, idle_secs = idle.as_secs(), "Reaping stale busy editor session");
                return false;
            }
            true
        });
        before - entries.len()
    }
}

fn not_found() -> PipelineError {
    PipelineError::NotFound("Editor session not found.".into())
}

/// Periodically evict idle sessions until `cancel` fires.
pub async fn run_reaper(
    registry: Arc<SessionRegistry>,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Editor session reaper stopped");
                return;
            }
            _ = ticker.tick() => {
                let reaped = registry.reap_idle(Instant::now()).await;
                if reaped > 0 {
                    tracing::info!(reaped, "Evicted idle editor sessions");
                }
            }
        }
    }
}
