//! OpenMAT Ageing Monitor
//!
//! Background idle-entry sweep for match-action tables.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                     AGEING MONITOR                         │
//! │                                                            │
//! │   register_table / set_sweep_interval / reset_state        │
//! │                          │                                 │
//! │                          ▼                                 │
//! │                 ┌────────────────┐                         │
//! │                 │  sweep state   │◄──── sweep worker       │
//! │                 │  (one mutex)   │      (1 thread)         │
//! │                 └───────┬────────┘                         │
//! │                         │ idle_entries() per table         │
//! │                         ▼                                  │
//! │                 diff vs previous sweep                     │
//! │                         │ newly idle only                  │
//! │                         ▼                                  │
//! │                 NotificationSink::send                     │
//! │                 (32-byte header + handles)                 │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! The worker wakes on an absolute deadline (`deadline += interval`),
//! so sweep execution time does not drift the schedule. Each sweep asks
//! every registered table for its currently idle entries, diffs against
//! the previous sweep's snapshot, and emits one notification per table
//! that gained newly-idle entries. An entry is reported once per idle
//! episode: it must be observed non-idle again before it can be
//! reported a second time.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod monitor;
pub mod notify;
pub mod sink;
pub mod table;

pub use monitor::{AgeingConfig, AgeingMonitor, AgeingStatsSnapshot};
pub use notify::{AgeNotification, NOTIFY_HEADER_LEN, NOTIFY_TAG};
pub use sink::{ChannelSink, NotificationReceiver, NotificationSink, NullSink};
pub use table::MonitoredTable;

pub use mat_common::{AgeingError, AgeingResult, ContextId, DeviceId, EntryHandle, TableId};

use std::time::Duration;

/// Default interval between idle sweeps
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_millis(1000);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(DEFAULT_SWEEP_INTERVAL, Duration::from_millis(1000));
        assert_eq!(NOTIFY_HEADER_LEN, 32);
    }
}
