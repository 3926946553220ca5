//! Debounced update scheduler.
//!
//! Coalesces bursts of change notifications per dashboard path into a
//! single deferred regeneration. The pending table maps dashboard path to
//! an armed timer; arming a path that already has a timer aborts the old
//! one first (cancel-before-replace), so at most one timer is in flight per
//! path and a burst of N changes produces exactly one regeneration, fired
//! one debounce window after the last change.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace};

/// A scheduled-but-not-yet-executed regeneration.
struct PendingUpdate {
    /// Replacement token: a fired task only removes its own entry, never a
    /// successor that replaced it mid-flight.
    token: u64,
    handle: JoinHandle<()>,
    scheduled_at: Instant,
}

struct SchedulerInner {
    pending: Mutex<HashMap<String, PendingUpdate>>,
    next_token: AtomicU64,
}

/// Trailing-edge debounce keyed by dashboard path.
pub struct UpdateScheduler {
    debounce: Duration,
    inner: Arc<SchedulerInner>,
}

impl UpdateScheduler {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            inner: Arc::new(SchedulerInner {
                pending: Mutex::new(HashMap::new()),
                next_token: AtomicU64::new(0),
            }),
        }
    }

    /// Arm (or re-arm) the timer for `dashboard_path`. The `regenerate`
    /// future runs once the debounce window elapses without another call
    /// for the same path.
    pub fn schedule<F>(&self, dashboard_path: &str, regenerate: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = self.inner.next_token.fetch_add(1, Ordering::Relaxed);
        let key = dashboard_path.to_string();
        let debounce = self.debounce;
        let inner = Arc::clone(&self.inner);

        // The lock is held across spawn + insert so the spawned task cannot
        // observe the table before its own entry exists.
        let mut pending = self.inner.pending.lock();
        if let Some(superseded) = pending.remove(dashboard_path) {
            superseded.handle.abort();
            trace!(path = %dashboard_path, "Superseded pending regeneration");
        }

        let task_key = key.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            regenerate.await;
            let mut pending = inner.pending.lock();
            if pending.get(&task_key).is_some_and(|p| p.token == token) {
                pending.remove(&task_key);
            }
        });

        pending.insert(
            key,
            PendingUpdate {
                token,
                handle,
                scheduled_at: Instant::now(),
            },
        );
        debug!(path = %dashboard_path, debounce_ms = debounce.as_millis() as u64, "Regeneration scheduled");
    }

    /// Abort the pending regeneration for a path, if any.
    pub fn cancel(&self, dashboard_path: &str) -> bool {
        match self.inner.pending.lock().remove(dashboard_path) {
            Some(entry) => {
                entry.handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self, dashboard_path: &str) -> bool {
        self.inner.pending.lock().contains_key(dashboard_path)
    }

    pub fn pending_count(&self) -> usize {
        self.inner.pending.lock().len()
    }

    /// How long ago the pending entry for a path was armed.
    pub fn pending_age(&self, dashboard_path: &str) -> Option<Duration> {
        self.inner
            .pending
            .lock()
            .get(dashboard_path)
            .map(|p| p.scheduled_at.elapsed())
    }

    /// Abort every outstanding timer. Nothing scheduled before this call
    /// will write afterwards.
    pub fn shutdown(&self) {
        let mut pending = self.inner.pending.lock();
        let drained = pending.len();
        for (_, entry) in pending.drain() {
            entry.handle.abort();
        }
        if drained > 0 {
            debug!(cancelled = drained, "Scheduler shut down with pending timers");
        }
    }
}

impl Drop for UpdateScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::sleep;

    fn counter_future(counter: Arc<AtomicUsize>) -> impl Future<Output = ()> + Send {
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn burst_coalesces_to_one_execution() {
        let scheduler = UpdateScheduler::new(Duration::from_millis(500));
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..10 {
            scheduler.schedule("a/a.md", counter_future(Arc::clone(&counter)));
            sleep(Duration::from_millis(50)).await;
        }
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.pending_count(), 1);

        sleep(Duration::from_millis(600)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn fires_one_window_after_the_last_change() {
        let scheduler = UpdateScheduler::new(Duration::from_millis(500));
        let counter = Arc::new(AtomicUsize::new(0));

        scheduler.schedule("a/a.md", counter_future(Arc::clone(&counter)));
        sleep(Duration::from_millis(400)).await;
        scheduler.schedule("a/a.md", counter_future(Arc::clone(&counter)));

        // 400ms after the re-arm: the original window has long passed.
        sleep(Duration::from_millis(400)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        sleep(Duration::from_millis(200)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn distinct_paths_never_cancel_each_other() {
        let scheduler = UpdateScheduler::new(Duration::from_millis(100));
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        scheduler.schedule("a/a.md", counter_future(Arc::clone(&first)));
        scheduler.schedule("b/b.md", counter_future(Arc::clone(&second)));
        assert_eq!(scheduler.pending_count(), 2);

        sleep(Duration::from_millis(200)).await;
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_disarms_a_pending_timer() {
        let scheduler = UpdateScheduler::new(Duration::from_millis(100));
        let counter = Arc::new(AtomicUsize::new(0));

        scheduler.schedule("a/a.md", counter_future(Arc::clone(&counter)));
        sleep(Duration::from_millis(20)).await;
        assert!(scheduler.pending_age("a/a.md").unwrap() >= Duration::from_millis(20));
        assert!(scheduler.cancel("a/a.md"));
        assert!(!scheduler.cancel("a/a.md"));
        assert!(scheduler.pending_age("a/a.md").is_none());

        sleep(Duration::from_millis(200)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_aborts_everything() {
        let scheduler = UpdateScheduler::new(Duration::from_millis(100));
        let counter = Arc::new(AtomicUsize::new(0));

        scheduler.schedule("a/a.md", counter_future(Arc::clone(&counter)));
        scheduler.schedule("b/b.md", counter_future(Arc::clone(&counter)));
        scheduler.shutdown();
        assert_eq!(scheduler.pending_count(), 0);

        sleep(Duration::from_millis(200)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_task_never_removes_its_successor() {
        let scheduler = UpdateScheduler::new(Duration::from_millis(100));
        let slow_started = Arc::new(AtomicUsize::new(0));
        let slow_finished = Arc::new(AtomicUsize::new(0));
        let fast_finished = Arc::new(AtomicUsize::new(0));

        let (started, finished) = (Arc::clone(&slow_started), Arc::clone(&slow_finished));
        scheduler.schedule("a/a.md", async move {
            started.fetch_add(1, Ordering::SeqCst);
            sleep(Duration::from_millis(1000)).await;
            finished.fetch_add(1, Ordering::SeqCst);
        });

        // Let the slow regeneration fire and park inside its body.
        sleep(Duration::from_millis(150)).await;
        assert_eq!(slow_started.load(Ordering::SeqCst), 1);

        // Replacing mid-flight aborts the slow one; the replacement's entry
        // must survive until its own timer fires.
        scheduler.schedule("a/a.md", counter_future(Arc::clone(&fast_finished)));
        assert!(scheduler.is_pending("a/a.md"));

        sleep(Duration::from_millis(2000)).await;
        assert_eq!(fast_finished.load(Ordering::SeqCst), 1);
        assert_eq!(slow_finished.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.pending_count(), 0);
    }
}
