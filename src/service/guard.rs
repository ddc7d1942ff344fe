//! Per-account single-flight lock for sends.
//!
//! The sequence number is read, incremented and consumed across several
//! awaits; two sends from one account must not interleave there.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

/// Shared between every workflow that may send from the same accounts.
#[derive(Debug, Clone, Default)]
pub struct SendGuard {
    locks: LockMap,
}

type LockMap = Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>;

/// Held from the account fetch until submission completes.
#[derive(Debug)]
pub struct SendPermit {
    account: String,
    guard: Option<OwnedMutexGuard<()>>,
    locks: LockMap,
}

impl SendPermit {
    pub fn account(&self) -> &str {
        &self.account
    }
}

impl Drop for SendPermit {
    fn drop(&mut self) {
        drop(self.guard.take());
        // waiters hold a clone of the lock; only the map's copy left means idle
        let mut locks = self.locks.lock();
        if locks.get(&self.account).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(&self.account);
        }
    }
}

impl SendGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other send from `account` is in flight.
    pub async fn acquire(&self, account: &str) -> SendPermit {
        let lock = {
            let mut locks = self.locks.lock();
            Arc::clone(locks.entry(account.to_string()).or_default())
        };
        if lock.try_lock().is_err() {
            debug!("Send from {} already in flight, waiting", account);
        }
        let guard = lock.lock_owned().await;
        SendPermit { account: account.to_string(), guard: Some(guard), locks: Arc::clone(&self.locks) }
    }

    /// True while a send from `account` holds the lock.
    pub fn is_busy(&self, account: &str) -> bool {
        self.locks
            .lock()
            .get(account)
            .map(|lock| lock.try_lock().is_err())
            .unwrap_or(false)
    }
}
