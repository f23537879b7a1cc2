use rand::Rng;
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use super::session::SessionState;
use crate::error::{GameError, GameResult};
use crate::text::{normalize_code, CODE_LENGTH};
use crate::types::SessionCode;

/// Unambiguous code alphabet (no 0/O, 1/I)
const CODE_CHARS: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const CODE_ATTEMPTS: usize = 24;

fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_CHARS[rng.random_range(0..CODE_CHARS.len())] as char)
        .collect()
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// One live session: the mutation lock plus the last published snapshot
pub struct SessionHandle {
    state: Arc<Mutex<SessionState>>,
    published: RwLock<Arc<SessionState>>,
    last_seen: AtomicI64,
    retired: AtomicBool,
}

impl SessionHandle {
    fn new(state: SessionState) -> Self {
        let published = Arc::new(state.clone());
        Self {
            state: Arc::new(Mutex::new(state)),
            published: RwLock::new(published),
            last_seen: AtomicI64::new(now_millis()),
            retired: AtomicBool::new(false),
        }
    }

    fn touch(&self) {
        self.last_seen.store(now_millis(), Ordering::Relaxed);
    }

    fn idle_for(&self) -> Duration {
        let idle_ms = now_millis() - self.last_seen.load(Ordering::Relaxed);
        Duration::from_millis(idle_ms.max(0) as u64)
    }

    fn is_retired(&self) -> bool {
        self.retired.load(Ordering::Acquire)
    }
}

/// Exclusive access to one session. Changes go to a draft that only becomes
/// visible on [`SessionGuard::commit`]; dropping the guard discards them.
pub struct SessionGuard {
    handle: Arc<SessionHandle>,
    guard: OwnedMutexGuard<SessionState>,
    draft: SessionState,
}

impl Deref for SessionGuard {
    type Target = SessionState;

    fn deref(&self) -> &SessionState {
        &self.draft
    }
}

impl DerefMut for SessionGuard {
    fn deref_mut(&mut self) -> &mut SessionState {
        &mut self.draft
    }
}

impl SessionGuard {
    /// Write the draft back, bump the version and publish it for readers
    pub async fn commit(self) -> Arc<SessionState> {
        let SessionGuard {
            handle,
            mut guard,
            mut draft,
        } = self;

        draft.version += 1;
        draft.updated_at = chrono::Utc::now().to_rfc3339();

        let snapshot = Arc::new(draft.clone());
        *guard = draft;
        *handle.published.write().await = snapshot.clone();
        handle.touch();
        snapshot
    }

    /// Release without changes; returns the current published state
    pub async fn release(self) -> Arc<SessionState> {
        let snapshot = self.handle.published.read().await.clone();
        self.handle.touch();
        snapshot
    }
}

/// Registry of live sessions keyed by code
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionCode, Arc<SessionHandle>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Register a new session under a fresh code
    pub async fn insert_new(
        &self,
        build: impl FnOnce(SessionCode) -> SessionState,
    ) -> GameResult<Arc<SessionState>> {
        let mut sessions = self.sessions.write().await;
        let code = (0..CODE_ATTEMPTS)
            .map(|_| generate_code())
            .find(|code| !sessions.contains_key(code))
            .ok_or_else(|| GameError::Capacity("Unable to allocate a session code".to_string()))?;

        let handle = SessionHandle::new(build(code.clone()));
        let snapshot = handle.published.read().await.clone();
        sessions.insert(code, Arc::new(handle));
        Ok(snapshot)
    }

    async fn handle(&self, code: &str) -> GameResult<Arc<SessionHandle>> {
        let code = normalize_code(code);
        self.sessions
            .read()
            .await
            .get(&code)
            .cloned()
            .ok_or_else(|| GameError::session_not_found(&code))
    }

    /// Last committed state, without waiting for the mutation lock
    pub async fn snapshot(&self, code: &str) -> GameResult<Arc<SessionState>> {
        let handle = self.handle(code).await?;
        handle.touch();
        let snapshot = handle.published.read().await.clone();
        Ok(snapshot)
    }

    /// Take the session's mutation lock
    pub async fn lock(&self, code: &str) -> GameResult<SessionGuard> {
        let handle = self.handle(code).await?;
        let guard = handle.state.clone().lock_owned().await;
        if handle.is_retired() {
            return Err(GameError::session_not_found(&guard.code));
        }
        let draft = guard.clone();
        Ok(SessionGuard {
            handle,
            guard,
            draft,
        })
    }

    /// Drop a session right away
    pub async fn remove(&self, code: &str) -> bool {
        let code = normalize_code(code);
        match self.sessions.write().await.remove(&code) {
            Some(handle) => {
                handle.retired.store(true, Ordering::Release);
                true
            }
            None => false,
        }
    }

    /// Remove sessions idle for at least `idle`. Sessions whose lock is held
    /// are skipped until the next sweep.
    pub async fn sweep_idle(&self, idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        sessions.retain(|code, handle| {
            if handle.idle_for() < idle {
                return true;
            }
            match handle.state.try_lock() {
                Ok(_guard) => {
                    handle.retired.store(true, Ordering::Release);
                    tracing::info!(code = %code, "Removing idle session");
                    false
                }
                Err(_) => true,
            }
        });

        before - sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::*;

    fn host() -> Player {
        Player {
            id: "host".to_string(),
            display_name: "Host".to_string(),
            seat: 1,
            score: 0,
            joined_at: String::new(),
        }
    }

    async fn store_with_session() -> (SessionStore, String) {
        let store = SessionStore::new();
        let snapshot = store
            .insert_new(|code| {
                let config = SessionConfig::for_game(GameKind::WhoSaidIt, None, None, None);
                SessionState::new(code, GameKind::WhoSaidIt, config, host())
            })
            .await
            .unwrap();
        let code = snapshot.code.clone();
        (store, code)
    }

    #[test]
    fn test_generated_codes_use_alphabet() {
        for _ in 0..50 {
            let code = generate_code();
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(code.bytes().all(|b| CODE_CHARS.contains(&b)));
        }
    }

    #[tokio::test]
    async fn test_lookup_normalizes_code() {
        let (store, code) = store_with_session().await;
        let messy = format!(" {}-", code.to_lowercase());
        assert_eq!(store.snapshot(&messy).await.unwrap().code, code);
        assert!(matches!(
            store.snapshot("ZZZZZZ").await,
            Err(GameError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_commit_publishes_and_bumps_version() {
        let (store, code) = store_with_session().await;
        let before = store.snapshot(&code).await.unwrap();

        let mut guard = store.lock(&code).await.unwrap();
        guard.round_number = 3;
        let after = guard.commit().await;

        assert_eq!(after.version, before.version + 1);
        assert_eq!(store.snapshot(&code).await.unwrap().round_number, 3);
    }

    #[tokio::test]
    async fn test_failed_mutation_is_discarded() {
        let (store, code) = store_with_session().await;

        {
            let mut guard = store.lock(&code).await.unwrap();
            guard.round_number = 9;
        }
        assert_eq!(store.snapshot(&code).await.unwrap().round_number, 0);

        let guard = store.lock(&code).await.unwrap();
        assert_eq!(guard.round_number, 0);
        let snapshot = guard.release().await;
        assert_eq!(snapshot.version, 1);
    }

    #[tokio::test]
    async fn test_snapshot_does_not_wait_for_lock() {
        let (store, code) = store_with_session().await;
        let guard = store.lock(&code).await.unwrap();
        let snapshot = tokio::time::timeout(Duration::from_secs(1), store.snapshot(&code))
            .await
            .expect("snapshot blocked on the mutation lock")
            .unwrap();
        assert_eq!(snapshot.code, code);
        drop(guard);
    }

    #[tokio::test]
    async fn test_sweep_skips_locked_and_retires_removed() {
        let (store, code) = store_with_session().await;

        let guard = store.lock(&code).await.unwrap();
        assert_eq!(store.sweep_idle(Duration::ZERO).await, 0);
        drop(guard);

        let stale = store.handle(&code).await.unwrap();
        assert_eq!(store.sweep_idle(Duration::ZERO).await, 1);
        assert!(stale.is_retired());
        assert!(matches!(store.lock(&code).await, Err(GameError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_sweep_keeps_recent_sessions() {
        let (store, _code) = store_with_session().await;
        assert_eq!(store.sweep_idle(Duration::from_secs(3600)).await, 0);
        assert_eq!(store.len().await, 1);
    }
}
