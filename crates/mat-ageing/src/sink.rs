//! Notification sink abstraction
//!
//! Transport for ageing notifications. The monitor hands the sink an
//! ordered sequence of byte buffers forming one logical message; what
//! happens after that (framing, retry, loss) is the sink's concern.

use std::time::Duration;

use bytes::Bytes;
use crossbeam::channel::{unbounded, Receiver, Sender, TryRecvError};

/// Consumer of ageing notification messages.
///
/// `send` is best-effort: the monitor never retries and never inspects
/// the outcome. A sink that can fail must absorb the failure itself.
pub trait NotificationSink: Send + Sync {
    /// Transmit `parts` as one atomic logical message.
    ///
    /// The monitor passes two parts per message: the fixed header and
    /// the handle payload. Sinks may concatenate them; the split only
    /// matters to transports with their own scatter/gather contract.
    fn send(&self, parts: &[Bytes]);
}

/// Sink that forwards each message into a crossbeam channel.
///
/// The in-process transport used by tests and by embedders that drain
/// notifications from their own thread.
pub struct ChannelSink {
    tx: Sender<Vec<Bytes>>,
}

/// Receiving side of a [`ChannelSink`].
pub struct NotificationReceiver {
    rx: Receiver<Vec<Bytes>>,
}

impl ChannelSink {
    /// Create a sink/receiver pair over an unbounded channel.
    pub fn new() -> (Self, NotificationReceiver) {
        let (tx, rx) = unbounded();
        (Self { tx }, NotificationReceiver { rx })
    }
}

impl NotificationSink for ChannelSink {
    fn send(&self, parts: &[Bytes]) {
        // Receiver gone means nobody wants notifications any more;
        // best-effort send just drops them.
        let _ = self.tx.send(parts.to_vec());
    }
}

impl NotificationReceiver {
    /// Pop the next pending message without blocking.
    pub fn try_recv(&self) -> Option<Vec<Bytes>> {
        match self.rx.try_recv() {
            Ok(message) => Some(message),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Block until the next message arrives or all sinks are dropped.
    pub fn recv(&self) -> Option<Vec<Bytes>> {
        self.rx.recv().ok()
    }

    /// Block until the next message arrives, the timeout elapses, or
    /// all sinks are dropped.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Vec<Bytes>> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Drain everything currently queued.
    pub fn drain(&self) -> Vec<Vec<Bytes>> {
        let mut messages = Vec::new();
        while let Some(message) = self.try_recv() {
            messages.push(message);
        }
        messages
    }

    /// Number of messages currently queued.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// True if no messages are queued.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// Sink that discards every message.
pub struct NullSink;

impl NotificationSink for NullSink {
    fn send(&self, _parts: &[Bytes]) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_sink_delivers_parts_in_order() {
        let (sink, rx) = ChannelSink::new();

        sink.send(&[Bytes::from_static(b"head"), Bytes::from_static(b"body")]);

        let message = rx.try_recv().expect("message queued");
        assert_eq!(message.len(), 2);
        assert_eq!(&message[0][..], b"head");
        assert_eq!(&message[1][..], b"body");
        assert!(rx.is_empty());
    }

    #[test]
    fn test_channel_sink_survives_dropped_receiver() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        // Must not panic
        sink.send(&[Bytes::from_static(b"orphaned")]);
    }

    #[test]
    fn test_drain_preserves_send_order() {
        let (sink, rx) = ChannelSink::new();
        for i in 0u8..3 {
            sink.send(&[Bytes::copy_from_slice(&[i])]);
        }

        let drained = rx.drain();
        assert_eq!(drained.len(), 3);
        assert_eq!(drained[0][0][0], 0);
        assert_eq!(drained[2][0][0], 2);
    }
}
