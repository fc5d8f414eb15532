//! OpenMAT Common - Shared types for the match-action table runtime
//!
//! This crate provides the identifier newtypes shared between the table
//! runtime and its background services:
//! - Table and entry identifiers
//! - Device/context scoping identifiers
//! - Error handling

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;

pub use error::*;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a match-action table, stable for the life of a device.
///
/// Used as the map key wherever per-table state is tracked.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[repr(transparent)]
pub struct TableId(pub u32);

impl TableId {
    /// Raw numeric id.
    #[inline(always)]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tbl/{:#x}", self.0)
    }
}

/// Opaque handle of an entry (row) within a match-action table.
///
/// No internal structure is assumed beyond equality and hashing; handles
/// are only compared against handles of the same table. On the wire a
/// handle is 4 bytes wide.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[repr(transparent)]
pub struct EntryHandle(pub u32);

impl EntryHandle {
    /// Raw numeric handle, as it appears in notification payloads.
    #[inline(always)]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ent/{}", self.0)
    }
}

/// Identifier of a logical switch/device.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[repr(transparent)]
pub struct DeviceId(pub u32);

impl DeviceId {
    /// Raw numeric id.
    #[inline(always)]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dev/{}", self.0)
    }
}

/// Identifier of a pipeline context within a device.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[repr(transparent)]
pub struct ContextId(pub u32);

impl ContextId {
    /// Raw numeric id.
    #[inline(always)]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cxt/{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display() {
        assert_eq!(TableId(0x2a).to_string(), "tbl/0x2a");
        assert_eq!(EntryHandle(7).to_string(), "ent/7");
        assert_eq!(DeviceId(0).to_string(), "dev/0");
        assert_eq!(ContextId(3).to_string(), "cxt/3");
    }

    #[test]
    fn test_ids_are_wire_width() {
        assert_eq!(std::mem::size_of::<EntryHandle>(), 4);
        assert_eq!(std::mem::size_of::<TableId>(), 4);
    }

    #[test]
    fn test_serde_roundtrip() {
        let id: TableId = serde_json::from_str("7").unwrap();
        assert_eq!(id, TableId(7));
        assert_eq!(serde_json::to_string(&EntryHandle(9)).unwrap(), "9");
    }
}
