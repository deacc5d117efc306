use log::debug;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Process-local advisory locks keyed by the directory a script writes into.
///
/// Two invocations against the same key run one after the other. Scripts
/// started by anything other than this process are not covered.
#[derive(Debug, Clone)]
pub struct InvocationLocks {
    enabled: bool,
    locks: Arc<Mutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>>>,
}

impl InvocationLocks {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Waits for exclusive use of `key`. Returns `None` when locking is off.
    pub async fn acquire(&self, key: &Path) -> Option<OwnedMutexGuard<()>> {
        if !self.enabled {
            return None;
        }

        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Drop entries nobody holds or waits on
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks
                .entry(key.to_path_buf())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        if lock.try_lock().is_err() {
            debug!("Waiting for running invocation on {}", key.display());
        }

        Some(lock.lock_owned().await)
    }

    /// Number of keys currently tracked
    pub fn tracked(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for InvocationLocks {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_key_is_exclusive() {
        let locks = InvocationLocks::new(true);
        let guard = locks.acquire(Path::new("/data/backup/mysql")).await;
        assert!(guard.is_some());

        let contender = locks.clone();
        let waiting = tokio::spawn(async move {
            contender.acquire(Path::new("/data/backup/mysql")).await;
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiting.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(5), waiting)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn different_keys_do_not_block() {
        let locks = InvocationLocks::new(true);
        let _first = locks.acquire(Path::new("/a")).await;
        let second = tokio::time::timeout(Duration::from_secs(1), locks.acquire(Path::new("/b")))
            .await
            .unwrap();
        assert!(second.is_some());
    }

    #[tokio::test]
    async fn released_keys_are_pruned() {
        let locks = InvocationLocks::new(true);
        drop(locks.acquire(Path::new("/a")).await);
        let _held = locks.acquire(Path::new("/b")).await;
        assert_eq!(locks.tracked(), 1);
    }

    #[tokio::test]
    async fn disabled_locks_hand_out_nothing() {
        let locks = InvocationLocks::new(false);
        assert!(locks.acquire(Path::new("/a")).await.is_none());
        assert_eq!(locks.tracked(), 0);
    }
}
