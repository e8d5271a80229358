//! TTL cache in front of any directory backend.

use crate::error::DirectoryResult;
use crate::model::DirectorySnapshot;
use crate::Directory;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::warn;

struct Cached {
    snapshot: Arc<DirectorySnapshot>,
    fetched_at: Instant,
}

/// Wraps a backend with a TTL. Reads hit the cached snapshot; one task at a
/// time refreshes (single flight), and a failed refresh serves the stale
/// snapshot rather than erroring.
pub struct CachedDirectory<D> {
    inner: D,
    ttl: Duration,
    state: RwLock<Option<Cached>>,
    refresh: Mutex<()>,
}

impl<D: Directory> CachedDirectory<D> {
    pub fn new(inner: D, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            state: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    async fn fresh_snapshot(&self) -> Option<Arc<DirectorySnapshot>> {
        let state = self.state.read().await;
        state
            .as_ref()
            .filter(|c| c.fetched_at.elapsed() < self.ttl)
            .map(|c| c.snapshot.clone())
    }

    async fn stale_snapshot(&self) -> Option<Arc<DirectorySnapshot>> {
        let state = self.state.read().await;
        state.as_ref().map(|c| c.snapshot.clone())
    }
}

#[async_trait]
impl<D: Directory> Directory for CachedDirectory<D> {
    async fn personnel(&self) -> DirectoryResult<DirectorySnapshot> {
        if let Some(snapshot) = self.fresh_snapshot().await {
            return Ok((*snapshot).clone());
        }

        let _guard = self.refresh.lock().await;
        // Another caller may have refreshed while this one waited.
        if let Some(snapshot) = self.fresh_snapshot().await {
            return Ok((*snapshot).clone());
        }

        match self.inner.personnel().await {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                *self.state.write().await = Some(Cached {
                    snapshot: snapshot.clone(),
                    fetched_at: Instant::now(),
                });
                Ok((*snapshot).clone())
            }
            Err(e) => {
                if let Some(stale) = self.stale_snapshot().await {
                    warn!(error = %e, "directory refresh failed, serving stale snapshot");
                    return Ok((*stale).clone());
                }
                Err(e)
            }
        }
    }

    async fn invalidate(&self) {
        *self.state.write().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DirectoryError;
    use crate::model::Person;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingBackend {
        calls: AtomicU32,
        fail: std::sync::atomic::AtomicBool,
    }

    impl CountingBackend {
        fn new() -> Self {
            Self {
                calls: AtomicU32::new(0),
                fail: std::sync::atomic::AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl Directory for CountingBackend {
        async fn personnel(&self) -> DirectoryResult<DirectorySnapshot> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail.load(Ordering::SeqCst) {
                return Err(DirectoryError::Unavailable("backend down".to_string()));
            }
            Ok(DirectorySnapshot {
                people: vec![Person {
                    handle: format!("Fetch{}", n),
                    email: None,
                    password_hash: None,
                    status: "active".to_string(),
                    on_site: false,
                    directory_id: n as i64,
                    positions: vec![],
                    teams: vec![],
                }],
                on_duty: Default::default(),
            })
        }
    }

    #[tokio::test]
    async fn ttl_serves_cached_snapshot() {
        let cache = CachedDirectory::new(CountingBackend::new(), Duration::from_secs(60));
        let first = cache.personnel().await.unwrap();
        let second = cache.personnel().await.unwrap();
        assert_eq!(first.people[0].handle, "Fetch1");
        assert_eq!(second.people[0].handle, "Fetch1");
        assert_eq!(cache.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let cache = CachedDirectory::new(CountingBackend::new(), Duration::from_secs(60));
        cache.personnel().await.unwrap();
        cache.invalidate().await;
        let after = cache.personnel().await.unwrap();
        assert_eq!(after.people[0].handle, "Fetch2");
    }

    #[tokio::test]
    async fn failed_refresh_serves_stale() {
        let cache = CachedDirectory::new(CountingBackend::new(), Duration::from_secs(60));
        cache.personnel().await.unwrap();
        cache.inner.fail.store(true, Ordering::SeqCst);
        cache.invalidate().await;
        let stale = cache.personnel().await;
        // No previous snapshot survives invalidate, so the error propagates.
        assert!(stale.is_err());

        // With a snapshot in place, an expired entry plus a failing backend
        // serves the old data.
        cache.inner.fail.store(false, Ordering::SeqCst);
        cache.personnel().await.unwrap();
        cache.inner.fail.store(true, Ordering::SeqCst);
        let short = CachedDirectory::new(CountingBackend::new(), Duration::from_millis(0));
        short.personnel().await.unwrap();
        short.inner.fail.store(true, Ordering::SeqCst);
        let served = short.personnel().await.unwrap();
        assert_eq!(served.people[0].handle, "Fetch1");
    }
}
