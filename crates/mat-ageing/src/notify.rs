//! Ageing notification wire format
//!
//! One notification reports the newly-idle entries of a single table.
//! The layout is a flat packed struct in host byte order, matching the
//! on-switch consumer:
//!
//! ```text
//! offset  size  field
//!      0     4  tag          ASCII "AGE|", no terminator
//!      4     4  switch_id
//!      8     4  cxt_id
//!     12     8  buffer_id    post-incremented per message sent
//!     20     4  table_id
//!     24     4  num_entries
//!     28     4  reserved     zero
//!     32   4*n  entry handles, diff iteration order
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

use mat_common::{ContextId, DeviceId, EntryHandle, TableId};

/// Leading tag of every ageing notification.
pub const NOTIFY_TAG: [u8; 4] = *b"AGE|";

/// Fixed header length in bytes.
pub const NOTIFY_HEADER_LEN: usize = 32;

/// A single ageing notification, one table's newly-idle entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgeNotification {
    /// Device identifier, as configured at monitor construction.
    pub switch_id: DeviceId,
    /// Context identifier, as configured at monitor construction.
    pub cxt_id: ContextId,
    /// Per-monitor message counter, starts at 0 after construction or reset.
    pub buffer_id: u64,
    /// Table the notification concerns.
    pub table_id: TableId,
    /// Newly-idle handles, in diff iteration order (unordered set semantics).
    pub entries: Vec<EntryHandle>,
}

impl AgeNotification {
    /// Encode into `scratch`, returning the header and payload as the
    /// two buffers of one logical message.
    ///
    /// `scratch` is cleared first and may be reused across calls; both
    /// returned buffers are detached from it.
    pub fn encode(&self, scratch: &mut BytesMut) -> (Bytes, Bytes) {
        scratch.clear();
        scratch.reserve(NOTIFY_HEADER_LEN + self.entries.len() * 4);

        scratch.put_slice(&NOTIFY_TAG);
        scratch.put_u32_ne(self.switch_id.as_u32());
        scratch.put_u32_ne(self.cxt_id.as_u32());
        scratch.put_u64_ne(self.buffer_id);
        scratch.put_u32_ne(self.table_id.as_u32());
        scratch.put_u32_ne(self.entries.len() as u32);
        scratch.put_u32_ne(0); // reserved
        let header = scratch.split().freeze();

        for handle in &self.entries {
            scratch.put_u32_ne(handle.as_u32());
        }
        let payload = scratch.split().freeze();

        (header, payload)
    }

    /// Decode a header/payload pair produced by [`encode`](Self::encode).
    ///
    /// Used by tests and by in-process consumers of a channel sink.
    pub fn decode(header: &[u8], payload: &[u8]) -> Result<Self, NotifyDecodeError> {
        if header.len() != NOTIFY_HEADER_LEN {
            return Err(NotifyDecodeError::HeaderLength(header.len()));
        }
        if header[..4] != NOTIFY_TAG {
            return Err(NotifyDecodeError::BadTag([
                header[0], header[1], header[2], header[3],
            ]));
        }

        let mut rest = &header[4..];
        let switch_id = DeviceId(rest.get_u32_ne());
        let cxt_id = ContextId(rest.get_u32_ne());
        let buffer_id = rest.get_u64_ne();
        let table_id = TableId(rest.get_u32_ne());
        let num_entries = rest.get_u32_ne() as usize;

        if payload.len() != num_entries * 4 {
            return Err(NotifyDecodeError::PayloadLength {
                expected: num_entries * 4,
                actual: payload.len(),
            });
        }

        let mut body = payload;
        let mut entries = Vec::with_capacity(num_entries);
        for _ in 0..num_entries {
            entries.push(EntryHandle(body.get_u32_ne()));
        }

        Ok(Self {
            switch_id,
            cxt_id,
            buffer_id,
            table_id,
            entries,
        })
    }
}

/// Malformed notification bytes.
#[derive(Debug, Error)]
pub enum NotifyDecodeError {
    /// Header was not exactly 32 bytes
    #[error("notification header must be 32 bytes, got {0}")]
    HeaderLength(usize),

    /// Leading tag was not "AGE|"
    #[error("bad notification tag: {0:?}")]
    BadTag([u8; 4]),

    /// Payload length disagrees with num_entries
    #[error("payload length mismatch: header implies {expected} bytes, got {actual}")]
    PayloadLength {
        /// Bytes implied by the header's num_entries field
        expected: usize,
        /// Bytes actually received
        actual: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AgeNotification {
        AgeNotification {
            switch_id: DeviceId(2),
            cxt_id: ContextId(0),
            buffer_id: 41,
            table_id: TableId(0x1000_0007),
            entries: vec![EntryHandle(3), EntryHandle(9), EntryHandle(12)],
        }
    }

    #[test]
    fn test_header_layout_is_bit_exact() {
        let mut scratch = BytesMut::new();
        let (header, payload) = sample().encode(&mut scratch);

        assert_eq!(header.len(), NOTIFY_HEADER_LEN);
        assert_eq!(&header[0..4], b"AGE|");
        assert_eq!(header[4..8], 2u32.to_ne_bytes());
        assert_eq!(header[8..12], 0u32.to_ne_bytes());
        assert_eq!(header[12..20], 41u64.to_ne_bytes());
        assert_eq!(header[20..24], 0x1000_0007u32.to_ne_bytes());
        assert_eq!(header[24..28], 3u32.to_ne_bytes());
        // Reserved tail is zero-filled
        assert_eq!(&header[28..32], &[0, 0, 0, 0]);

        assert_eq!(payload.len(), 12);
        assert_eq!(payload[0..4], 3u32.to_ne_bytes());
        assert_eq!(payload[4..8], 9u32.to_ne_bytes());
        assert_eq!(payload[8..12], 12u32.to_ne_bytes());
    }

    #[test]
    fn test_empty_payload_encodes_to_header_only() {
        let mut scratch = BytesMut::new();
        let notification = AgeNotification {
            entries: Vec::new(),
            ..sample()
        };
        let (header, payload) = notification.encode(&mut scratch);

        assert_eq!(header.len(), NOTIFY_HEADER_LEN);
        assert_eq!(header[24..28], 0u32.to_ne_bytes());
        assert!(payload.is_empty());
    }

    #[test]
    fn test_decode_matches_encode() {
        let mut scratch = BytesMut::new();
        let original = sample();
        let (header, payload) = original.encode(&mut scratch);

        let decoded = AgeNotification::decode(&header, &payload).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_decode_rejects_bad_tag() {
        let mut scratch = BytesMut::new();
        let (header, payload) = sample().encode(&mut scratch);

        let mut mangled = header.to_vec();
        mangled[0] = b'X';
        assert!(matches!(
            AgeNotification::decode(&mangled, &payload),
            Err(NotifyDecodeError::BadTag(_))
        ));
    }

    #[test]
    fn test_decode_rejects_truncated_payload() {
        let mut scratch = BytesMut::new();
        let (header, payload) = sample().encode(&mut scratch);

        assert!(matches!(
            AgeNotification::decode(&header, &payload[..payload.len() - 4]),
            Err(NotifyDecodeError::PayloadLength { .. })
        ));
    }

    #[test]
    fn test_scratch_reuse_is_clean() {
        let mut scratch = BytesMut::new();
        let first = sample();
        let _ = first.encode(&mut scratch);

        let second = AgeNotification {
            buffer_id: 42,
            entries: vec![EntryHandle(1)],
            ..sample()
        };
        let (header, payload) = second.encode(&mut scratch);

        let decoded = AgeNotification::decode(&header, &payload).unwrap();
        assert_eq!(decoded, second);
    }
}
