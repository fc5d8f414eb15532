//! Monitored table abstraction
//!
//! The monitor never depends on a concrete match-action table; anything
//! that can report its currently idle entries can be registered.

use std::collections::HashSet;

use mat_common::{EntryHandle, TableId};

/// A table whose entries can age out.
///
/// Implemented by the concrete match-action table; the monitor only
/// needs the idle view. The idle set is recomputed fresh on every call:
/// entries may appear, refresh, and disappear arbitrarily between
/// calls, and no monotonicity is assumed across calls.
pub trait MonitoredTable: Send + Sync {
    /// Stable table identifier, used as the tracking key.
    fn id(&self) -> TableId;

    /// Human-readable table name, used for diagnostics only.
    fn name(&self) -> &str;

    /// Handles of all entries currently idle beyond their configured
    /// timeout.
    ///
    /// Must not fail: ageing is a silent background service, and a
    /// skipped table would silently lose coverage. An implementation
    /// that genuinely cannot answer must panic instead of returning a
    /// partial set.
    fn idle_entries(&self) -> HashSet<EntryHandle>;
}
