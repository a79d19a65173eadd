/// Periodic snapshot refresh
///
/// `RefreshLoop` owns the "current snapshot" slot and the timer task that
/// replaces it. The slot is a `watch` channel holding an `Arc`, so a refresh
/// is a single pointer swap: readers see the old snapshot or the new one,
/// never a mix.
///
/// Lifecycle:
/// - `activate` generates the first snapshot synchronously, then spawns the timer
/// - `deactivate` aborts the timer and fences off any refresh still in flight;
///   the last snapshot stays readable
/// - `clear` empties the slot
/// - dropping the loop deactivates it

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{self, JoinHandle};
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::feed::{FeedError, MetricsSource};
use super::snapshot::MetricsSnapshot;

pub type SharedSnapshot = Option<Arc<MetricsSnapshot>>;

pub struct RefreshLoop {
    period: Duration,
    slot: Arc<watch::Sender<SharedSnapshot>>,
    refreshes: Arc<AtomicU64>,
    /// Bumped on every deactivation; a timer task only publishes while its
    /// activation's epoch is current
    epoch: Arc<AtomicU64>,
    task: Option<JoinHandle<()>>,
}

impl RefreshLoop {
    pub fn new(period: Duration) -> Self {
        let (slot, _) = watch::channel(None);

        Self {
            // A zero period would make tokio's interval panic
            period: period.max(Duration::from_millis(1)),
            slot: Arc::new(slot),
            refreshes: Arc::new(AtomicU64::new(0)),
            epoch: Arc::new(AtomicU64::new(0)),
            task: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Start refreshing from `source`. Must be called inside a tokio runtime.
    ///
    /// The first snapshot is produced before this returns; if that fails the
    /// loop stays inactive and the error is returned. Activating an already
    /// active loop replaces its source. Later `generate()` calls run on the
    /// blocking pool, so sources may do file or network I/O.
    pub fn activate<S>(&mut self, mut source: S) -> Result<Arc<MetricsSnapshot>, FeedError>
    where
        S: MetricsSource + 'static,
    {
        self.deactivate();

        let first = Arc::new(source.generate()?);
        self.publish(&first);

        let slot = Arc::clone(&self.slot);
        let refreshes = Arc::clone(&self.refreshes);
        let epoch = Arc::clone(&self.epoch);
        let my_epoch = epoch.load(Ordering::SeqCst);
        let period = self.period;
        let feed = source.name().to_string();

        tracing::info!(feed = %feed, period = %humantime::format_duration(period), "refresh loop activated");

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;

                let (returned, result) = match task::spawn_blocking(move || {
                    let result = source.generate();
                    (source, result)
                })
                .await
                {
                    Ok(pair) => pair,
                    Err(e) => {
                        tracing::error!(feed = %feed, error = %e, "snapshot source panicked, refresh loop stopped");
                        break;
                    }
                };
                source = returned;

                match result {
                    Ok(snapshot) => {
                        let snapshot = Arc::new(snapshot);
                        // The check runs under the slot's write lock, which
                        // `deactivate` also takes to bump the epoch
                        let published = slot.send_if_modified(|current| {
                            if epoch.load(Ordering::SeqCst) != my_epoch {
                                return false;
                            }
                            *current = Some(snapshot);
                            true
                        });

                        if !published {
                            tracing::debug!(feed = %feed, "stale refresh discarded after deactivation");
                            break;
                        }

                        let count = refreshes.fetch_add(1, Ordering::Relaxed) + 1;
                        tracing::debug!(feed = %feed, refresh = count, "snapshot refreshed");
                    }
                    Err(e) => {
                        // Keep serving the previous snapshot
                        tracing::warn!(feed = %feed, error = %e, "snapshot refresh failed");
                    }
                }
            }
        });

        self.task = Some(handle);
        Ok(first)
    }

    /// Stop the timer. Safe to call repeatedly.
    ///
    /// Once this returns nothing from the stopped activation is published,
    /// even a `generate()` that was already running.
    pub fn deactivate(&mut self) {
        let epoch = &self.epoch;
        self.slot.send_if_modified(|_| {
            epoch.fetch_add(1, Ordering::SeqCst);
            false
        });

        if let Some(handle) = self.task.take() {
            handle.abort();
            tracing::info!(refreshes = self.refresh_count(), "refresh loop deactivated");
        }
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().map_or(false, |h| !h.is_finished())
    }

    /// Latest published snapshot, if any
    pub fn current(&self) -> SharedSnapshot {
        self.slot.borrow().clone()
    }

    /// Receiver that is notified on every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<SharedSnapshot> {
        self.slot.subscribe()
    }

    /// Empty the slot. After `deactivate` it stays empty until the next `activate`.
    pub fn clear(&self) {
        self.slot.send_replace(None);
    }

    /// Number of snapshots published by `activate` and the timer
    pub fn refresh_count(&self) -> u64 {
        self.refreshes.load(Ordering::Relaxed)
    }

    fn publish(&self, snapshot: &Arc<MetricsSnapshot>) {
        self.slot.send_replace(Some(Arc::clone(snapshot)));
        self.refreshes.fetch_add(1, Ordering::Relaxed);
    }
}

impl Drop for RefreshLoop {
    fn drop(&mut self) {
        self.deactivate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::feed::{reference_snapshot, ReferenceFeed};
    use std::sync::atomic::{AtomicBool, AtomicUsize};

    /// Counts generate() calls and fails on request
    struct CountingSource {
        calls: Arc<AtomicUsize>,
        fail_after: Option<usize>,
    }

    impl MetricsSource for CountingSource {
        fn name(&self) -> &str {
            "counting"
        }

        fn generate(&mut self) -> Result<MetricsSnapshot, FeedError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_after.map_or(false, |limit| n > limit) {
                return Err(FeedError::InvalidStatus("Broken".to_string()));
            }
            let mut snapshot = reference_snapshot();
            snapshot.air_quality_index = n as u32;
            Ok(snapshot)
        }
    }

    fn counting(fail_after: Option<usize>) -> (CountingSource, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = CountingSource {
            calls: Arc::clone(&calls),
            fail_after,
        };
        (source, calls)
    }

    #[tokio::test(start_paused = true)]
    async fn test_activate_publishes_first_snapshot() {
        let mut refresh = RefreshLoop::new(Duration::from_secs(5));
        assert!(refresh.current().is_none());

        let first = refresh.activate(ReferenceFeed::new()).unwrap();
        assert!(refresh.is_active());
        assert_eq!(refresh.current().unwrap().generated_at, first.generated_at);
        assert_eq!(refresh.refresh_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refreshes_on_period() {
        let (source, calls) = counting(None);
        let mut refresh = RefreshLoop::new(Duration::from_secs(5));
        refresh.activate(source).unwrap();

        tokio::time::sleep(Duration::from_millis(11_000)).await;
        tokio::task::yield_now().await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(refresh.current().unwrap().air_quality_index, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_generate_after_deactivate() {
        let (source, calls) = counting(None);
        let mut refresh = RefreshLoop::new(Duration::from_secs(5));
        refresh.activate(source).unwrap();

        tokio::time::sleep(Duration::from_millis(6_000)).await;
        refresh.deactivate();
        let seen = calls.load(Ordering::SeqCst);
        assert_eq!(seen, 2);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(calls.load(Ordering::SeqCst), seen);
        assert!(!refresh.is_active());

        // Last snapshot survives teardown until cleared
        assert_eq!(refresh.current().unwrap().air_quality_index, 2);
        refresh.clear();
        assert!(refresh.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_keeps_previous() {
        let (source, calls) = counting(Some(1));
        let mut refresh = RefreshLoop::new(Duration::from_secs(5));
        refresh.activate(source).unwrap();

        tokio::time::sleep(Duration::from_millis(16_000)).await;
        tokio::task::yield_now().await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(refresh.current().unwrap().air_quality_index, 1);
        assert_eq!(refresh.refresh_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_activation_stays_inactive() {
        let (source, _) = counting(Some(0));
        let mut refresh = RefreshLoop::new(Duration::from_secs(5));

        assert!(refresh.activate(source).is_err());
        assert!(!refresh.is_active());
        assert!(refresh.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_each_refresh() {
        let mut refresh = RefreshLoop::new(Duration::from_secs(5));
        let mut rx = refresh.subscribe();
        refresh.activate(ReferenceFeed::new()).unwrap();

        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_some());

        rx.changed().await.unwrap();
        assert_eq!(refresh.refresh_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_timer() {
        let (source, calls) = counting(None);
        {
            let mut refresh = RefreshLoop::new(Duration::from_secs(5));
            refresh.activate(source).unwrap();
        }

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    /// Sleeps inside its second generate() so a refresh is in flight on
    /// a blocking thread
    struct SlowSource {
        calls: usize,
        started: Arc<AtomicBool>,
        base: u32,
    }

    impl MetricsSource for SlowSource {
        fn name(&self) -> &str {
            "slow"
        }

        fn generate(&mut self) -> Result<MetricsSnapshot, FeedError> {
            self.calls += 1;
            if self.calls == 2 {
                self.started.store(true, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(300));
            }
            let mut snapshot = reference_snapshot();
            snapshot.air_quality_index = self.base + self.calls as u32;
            Ok(snapshot)
        }
    }

    struct MarkerSource(u32);

    impl MetricsSource for MarkerSource {
        fn name(&self) -> &str {
            "marker"
        }

        fn generate(&mut self) -> Result<MetricsSnapshot, FeedError> {
            let mut snapshot = reference_snapshot();
            snapshot.air_quality_index = self.0;
            Ok(snapshot)
        }
    }

    fn slow(base: u32) -> (SlowSource, Arc<AtomicBool>) {
        let started = Arc::new(AtomicBool::new(false));
        let source = SlowSource {
            calls: 0,
            started: Arc::clone(&started),
            base,
        };
        (source, started)
    }

    async fn wait_until_started(started: &AtomicBool) {
        let wait = async {
            while !started.load(Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        };
        tokio::time::timeout(Duration::from_secs(5), wait).await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_in_flight_refresh_dropped_after_deactivate_and_clear() {
        let (source, started) = slow(0);
        let mut refresh = RefreshLoop::new(Duration::from_millis(50));
        refresh.activate(source).unwrap();

        wait_until_started(&started).await;
        refresh.deactivate();
        refresh.clear();

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(refresh.current().is_none());
        assert_eq!(refresh.refresh_count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_reactivation_not_overwritten_by_previous_source() {
        let (source, started) = slow(100);
        let mut refresh = RefreshLoop::new(Duration::from_millis(50));
        refresh.activate(source).unwrap();

        wait_until_started(&started).await;
        let first = refresh.activate(MarkerSource(999)).unwrap();
        assert_eq!(first.air_quality_index, 999);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(refresh.current().unwrap().air_quality_index, 999);
        assert!(refresh.is_active());
    }
}
