//! Per-professional advisory locks.
//!
//! Overlap-sensitive writes (create, reschedule) serialize on the
//! professional id so two requests cannot both pass the availability
//! check against a stale snapshot. Operations against different
//! professionals proceed fully in parallel; there is no global lock.

use std::collections::HashMap;
use std::sync::Mutex as StdMutex;

use tokio::sync::{Mutex, OwnedMutexGuard};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Default)]
pub struct ProfessionalLocks {
    inner: StdMutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl ProfessionalLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for one professional, waiting if another
    /// overlap-sensitive operation holds it. The guard must span the
    /// whole read-check-write sequence and is released on drop, after
    /// commit or definitive rollback.
    pub async fn acquire(&self, professional_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap();
            map.entry(professional_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_professional_serializes() {
        let locks = Arc::new(ProfessionalLocks::new());
        let professional_id = Uuid::new_v4();
        let concurrent = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let locks = locks.clone();
            let concurrent = concurrent.clone();
            let peak = peak.clone();
            tasks.push(tokio::spawn(async move {
                let _guard = locks.acquire(professional_id).await;
                let now = concurrent.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                concurrent.fetch_sub(1, Ordering::SeqCst);
            }));
        }

        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_different_professionals_do_not_block() {
        let locks = Arc::new(ProfessionalLocks::new());
        let first = locks.acquire(Uuid::new_v4()).await;

        // acquiring for another professional completes immediately
        let second = tokio::time::timeout(
            Duration::from_millis(100),
            locks.acquire(Uuid::new_v4()),
        )
        .await;
        assert!(second.is_ok());
        drop(first);
    }
}
