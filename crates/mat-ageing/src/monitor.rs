//! Ageing monitor
//!
//! One dedicated sweep thread per monitor instance. The thread wakes on
//! an absolute deadline, asks every registered table for its idle
//! entries, diffs against the previous sweep, and pushes one
//! notification per table that gained newly-idle entries.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use bytes::BytesMut;
use parking_lot::{Condvar, Mutex, MutexGuard};
use serde::{Deserialize, Serialize};

use mat_common::{AgeingError, AgeingResult, ContextId, DeviceId, EntryHandle, TableId};

use crate::notify::AgeNotification;
use crate::sink::NotificationSink;
use crate::table::MonitoredTable;
use crate::DEFAULT_SWEEP_INTERVAL;

/// Ageing monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgeingConfig {
    /// Device the monitor reports for (copied into every notification)
    pub switch_id: DeviceId,
    /// Pipeline context the monitor reports for
    pub cxt_id: ContextId,
    /// Interval between sweeps; zero means sweep as fast as possible
    pub sweep_interval: Duration,
}

impl Default for AgeingConfig {
    fn default() -> Self {
        Self {
            switch_id: DeviceId(0),
            cxt_id: ContextId(0),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

/// Per-table tracking state.
///
/// Name and id are copied at registration time and never re-queried.
struct TableTracker {
    id: TableId,
    name: String,
    table: Arc<dyn MonitoredTable>,
    /// Handles observed idle during the immediately preceding sweep
    last_idle: HashSet<EntryHandle>,
}

/// Everything the sweep mutates, guarded by one mutex.
struct SweepState {
    /// Registration order is sweep order
    tables: Vec<TableTracker>,
    /// Incremented once per notification actually sent
    buffer_id: u64,
    /// Reusable encode buffer
    scratch: BytesMut,
}

/// State shared between the handle and the sweep worker.
struct Shared {
    state: Mutex<SweepState>,
    wakeup: Condvar,
    /// Sweep interval in milliseconds; read at each scheduling decision
    interval_ms: AtomicU64,
    stopping: AtomicBool,
    stats: AgeingStats,
}

/// Monitor statistics (atomic, lock-free)
#[derive(Default)]
struct AgeingStats {
    sweeps: AtomicU64,
    notifications: AtomicU64,
    entries_reported: AtomicU64,
}

/// Stats snapshot
#[derive(Debug, Clone)]
pub struct AgeingStatsSnapshot {
    /// Sweeps executed since construction
    pub sweeps: u64,
    /// Notifications handed to the sink since construction
    pub notifications: u64,
    /// Total entry handles reported since construction
    pub entries_reported: u64,
    /// Currently registered tables
    pub tables: usize,
}

/// Background ageing monitor for match-action tables.
///
/// Live from construction until drop: the sweep worker starts
/// immediately and is joined before `drop` returns, so no sink call can
/// happen after the monitor is gone. One instance per device/context;
/// pass it explicitly to whoever registers tables.
pub struct AgeingMonitor {
    shared: Arc<Shared>,
    worker: Option<thread::JoinHandle<()>>,
}

impl AgeingMonitor {
    /// Start a monitor and its sweep worker.
    pub fn spawn(
        config: AgeingConfig,
        sink: Arc<dyn NotificationSink>,
    ) -> AgeingResult<Self> {
        let shared = Arc::new(Shared {
            state: Mutex::new(SweepState {
                tables: Vec::new(),
                buffer_id: 0,
                scratch: BytesMut::new(),
            }),
            wakeup: Condvar::new(),
            interval_ms: AtomicU64::new(config.sweep_interval.as_millis() as u64),
            stopping: AtomicBool::new(false),
            stats: AgeingStats::default(),
        });

        let worker_shared = shared.clone();
        let switch_id = config.switch_id;
        let cxt_id = config.cxt_id;
        let handle = thread::Builder::new()
            .name(format!(
                "ageing-{}-{}",
                switch_id.as_u32(),
                cxt_id.as_u32()
            ))
            .spawn(move || sweep_loop(worker_shared, sink, switch_id, cxt_id))
            .map_err(|e| AgeingError::SpawnFailed(e.to_string()))?;

        tracing::info!(
            "ageing monitor started for {} {} (interval {:?})",
            switch_id,
            cxt_id,
            config.sweep_interval
        );

        Ok(Self {
            shared,
            worker: Some(handle),
        })
    }

    /// Register a table for idle sweeps.
    ///
    /// The table's id and name are copied now; only `idle_entries` is
    /// called later. Registering an id that is already tracked
    /// overwrites the existing tracking entry in place: its
    /// previous-idle set is discarded, so ageing restarts from a clean
    /// slate, and its position in sweep order is kept.
    pub fn register_table(&self, table: Arc<dyn MonitoredTable>) {
        let id = table.id();
        let name = table.name().to_string();

        let mut state = self.shared.state.lock();
        if let Some(existing) = state.tables.iter_mut().find(|t| t.id == id) {
            tracing::debug!("table {} re-registered, tracking state reset", id);
            existing.name = name;
            existing.table = table;
            existing.last_idle.clear();
        } else {
            tracing::info!("registered table {} ({})", id, name);
            state.tables.push(TableTracker {
                id,
                name,
                table,
                last_idle: HashSet::new(),
            });
        }
    }

    /// Change the sweep interval.
    ///
    /// Takes effect at the next scheduling decision; a wait already in
    /// progress finishes against the deadline it was started with.
    /// Granularity is one millisecond; zero means busy sweeping.
    pub fn set_sweep_interval(&self, interval: Duration) {
        // Store and notify under the sweep mutex: the worker only
        // blocks with that mutex held, so the wakeup cannot fall into
        // the gap between its deadline check and its wait.
        let _state = self.shared.state.lock();
        self.shared
            .interval_ms
            .store(interval.as_millis() as u64, Ordering::Release);
        self.shared.wakeup.notify_all();
    }

    /// Forget everything observed so far.
    ///
    /// Clears every table's previous-idle set, the encode buffer and
    /// the buffer-id counter. Tables stay registered. Meant for test
    /// isolation and simulation resets.
    pub fn reset_state(&self) {
        let mut state = self.shared.state.lock();
        state.buffer_id = 0;
        state.scratch.clear();
        for tracker in &mut state.tables {
            tracker.last_idle.clear();
        }
        tracing::info!("ageing state reset ({} tables kept)", state.tables.len());
    }

    /// Snapshot of monitor counters.
    pub fn stats(&self) -> AgeingStatsSnapshot {
        let tables = self.shared.state.lock().tables.len();
        AgeingStatsSnapshot {
            sweeps: self.shared.stats.sweeps.load(Ordering::Relaxed),
            notifications: self.shared.stats.notifications.load(Ordering::Relaxed),
            entries_reported: self.shared.stats.entries_reported.load(Ordering::Relaxed),
            tables,
        }
    }
}

impl Drop for AgeingMonitor {
    fn drop(&mut self) {
        // Flag first, without the lock: a busy-sweeping worker (zero
        // interval) re-checks the flag every iteration and exits on its
        // own. The notify below is taken under the sweep mutex so a
        // parked worker cannot miss it between its deadline check and
        // its wait. A sweep that is mid-flight holds the mutex and
        // finishes untouched; it is never cut off half-applied.
        self.shared.stopping.store(true, Ordering::Release);
        {
            let _state = self.shared.state.lock();
            self.shared.wakeup.notify_all();
        }
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
        tracing::info!("ageing monitor stopped");
    }
}

/// Sweep worker: sweep, then wait until the next absolute deadline.
fn sweep_loop(
    shared: Arc<Shared>,
    sink: Arc<dyn NotificationSink>,
    switch_id: DeviceId,
    cxt_id: ContextId,
) {
    let mut last_wake = Instant::now();

    loop {
        // The guard lives for one iteration only. When the deadline is
        // already past (zero interval, or a sweep that overran it) the
        // inner loop below never waits, so a guard held across
        // iterations would never be released and every administrative
        // caller would starve on the same mutex.
        let mut guard = shared.state.lock();
        if shared.stopping.load(Ordering::Acquire) {
            return;
        }

        sweep_once(&mut guard, &shared, sink.as_ref(), switch_id, cxt_id);

        // Next deadline is measured from this iteration's wake-up, not
        // from sweep completion, so execution time does not drift the
        // schedule. Under overload the deadline is already past and the
        // next sweep runs immediately; there is no catch-up storm
        // because at most one sweep runs per loop iteration.
        loop {
            if shared.stopping.load(Ordering::Acquire) {
                return;
            }
            let interval =
                Duration::from_millis(shared.interval_ms.load(Ordering::Acquire));
            let deadline = last_wake + interval;
            if Instant::now() >= deadline {
                break;
            }
            // The wait releases the state mutex, so registrations and
            // resets go through while the worker sleeps. Wakes early on
            // shutdown and on interval changes.
            if shared.wakeup.wait_until(&mut guard, deadline).timed_out() {
                break;
            }
        }
        drop(guard);
        last_wake = Instant::now();
    }
}

/// One full sweep over all registered tables, executed under the lock.
fn sweep_once(
    guard: &mut MutexGuard<'_, SweepState>,
    shared: &Shared,
    sink: &dyn NotificationSink,
    switch_id: DeviceId,
    cxt_id: ContextId,
) {
    let SweepState {
        tables,
        buffer_id,
        scratch,
    } = &mut **guard;

    for tracker in tables.iter_mut() {
        let idle_now = tracker.table.idle_entries();
        if idle_now.is_empty() {
            tracker.last_idle.clear();
            continue;
        }

        let newly_idle: Vec<EntryHandle> = idle_now
            .iter()
            .copied()
            .filter(|h| !tracker.last_idle.contains(h))
            .collect();

        // Full snapshot replace: occupancy can change arbitrarily
        // between sweeps, so the previous set is recomputed wholesale
        // rather than patched.
        tracker.last_idle = idle_now;

        if newly_idle.is_empty() {
            continue;
        }

        let notification = AgeNotification {
            switch_id,
            cxt_id,
            buffer_id: *buffer_id,
            table_id: tracker.id,
            entries: newly_idle,
        };
        *buffer_id += 1;

        tracing::trace!(
            "table {} ({}): {} newly idle, buffer_id {}",
            tracker.id,
            tracker.name,
            notification.entries.len(),
            notification.buffer_id
        );

        shared
            .stats
            .entries_reported
            .fetch_add(notification.entries.len() as u64, Ordering::Relaxed);
        shared.stats.notifications.fetch_add(1, Ordering::Relaxed);

        let (header, payload) = notification.encode(scratch);
        sink.send(&[header, payload]);
    }

    shared.stats.sweeps.fetch_add(1, Ordering::Relaxed);
}
