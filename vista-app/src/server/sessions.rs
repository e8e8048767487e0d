//! In-memory session registry.
//!
//! Every page load opens a session. Sessions that go unused for longer than
//! the configured idle time are dropped by a background sweep, together with
//! any upload they hold.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use uuid::Uuid;
use vista::image::ImagePayload;
use vista::render::Theme;
use vista::session::{SessionEvent, SessionState, Submission};

/// Upper bound on the time between two sweeps.
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug)]
struct Entry {
    state: SessionState,
    last_seen: Instant,
}

/// Sessions keyed by id, shared across handlers.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, Entry>>>,
}

impl SessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session starting with `theme` selected.
    pub async fn create(&self, theme: Theme) -> Uuid {
        let id = Uuid::new_v4();
        let mut state = SessionState::new();
        state.apply(SessionEvent::ThemeChanged(theme));
        let entry = Entry {
            state,
            last_seen: Instant::now(),
        };
        self.inner.write().await.insert(id, entry);
        tracing::debug!(session = %id, "session created");
        id
    }

    /// Runs `f` on a session and marks it as used.
    async fn touch<T>(&self, id: Uuid, f: impl FnOnce(&mut SessionState) -> T) -> Option<T> {
        let mut sessions = self.inner.write().await;
        let entry = sessions.get_mut(&id)?;
        entry.last_seen = Instant::now();
        Some(f(&mut entry.state))
    }

    /// Apply an event. Returns `false` if the session does not exist.
    pub async fn apply(&self, id: Uuid, event: SessionEvent) -> bool {
        self.touch(id, |state| state.apply(event)).await.is_some()
    }

    /// Snapshot the session for one run.
    pub async fn trigger(&self, id: Uuid) -> Option<Submission> {
        self.touch(id, |state| state.trigger()).await
    }

    /// The session's uploaded image, if both exist.
    pub async fn image(&self, id: Uuid) -> Option<Option<ImagePayload>> {
        self.touch(id, |state| state.image().cloned()).await
    }

    /// The session's selected theme.
    pub async fn theme(&self, id: Uuid) -> Option<Theme> {
        self.touch(id, |state| state.theme()).await
    }

    /// Drop a session. Returns `false` if it did not exist.
    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.inner.write().await.remove(&id).is_some();
        if removed {
            tracing::debug!(session = %id, "session removed");
        }
        removed
    }

    /// Drop every session unused for at least `max_idle`. Returns how many
    /// were dropped.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.inner.write().await;
        let before = sessions.len();
        sessions.retain(|id, entry| {
            let keep = entry.last_seen.elapsed() < max_idle;
            if !keep {
                tracing::debug!(session = %id, "idle session evicted");
            }
            keep
        });
        before - sessions.len()
    }

    /// Sweep idle sessions in the background until the handle is aborted.
    #[must_use]
    pub fn spawn_sweeper(&self, max_idle: Duration) -> JoinHandle<()> {
        let store = self.clone();
        let period = max_idle.clamp(Duration::from_secs(1), MAX_SWEEP_INTERVAL);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                let evicted = store.evict_idle(max_idle).await;
                if evicted > 0 {
                    let open = store.len().await;
                    tracing::info!(evicted, open, "idle sessions dropped");
                }
            }
        })
    }

    /// Number of open sessions.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Returns `true` if no session is open.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}
