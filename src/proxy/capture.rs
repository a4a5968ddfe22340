//! Bounded hand-off between the bus receive callback and the poll loop.
//!
//! ```text
//! ┌──────────────┐  on_receive   ┌──────────────┐   pop   ┌──────────────┐
//! │ bus callback │──────────────▶│ CaptureQueue │────────▶│ poll loop    │
//! │ (producer)   │               │ (SPSC, no    │         │ (consumer)   │
//! └──────────────┘               │  locks)      │         └──────────────┘
//!                                └──────────────┘
//! ```
//!
//! The callback side never blocks and never logs: a full queue drops the
//! frame and bumps a counter the consumer reports later.

use core::sync::atomic::{AtomicU32, Ordering};

use heapless::spsc::{Consumer, Producer, Queue};

use crate::protocol::canned::READ_REPLY;
use crate::protocol::frame::{MAX_FRAME_LEN, RawFrame};

/// Storage for captured frames.  Holds `N - 1` frames.
pub struct CaptureQueue<const N: usize> {
    frames: Queue<RawFrame, N>,
    dropped: AtomicU32,
}

impl<const N: usize> CaptureQueue<N> {
    pub const fn new() -> Self {
        Self {
            frames: Queue::new(),
            dropped: AtomicU32::new(0),
        }
    }

    /// Split into the callback half and the poll-loop half.
    pub fn split(&mut self) -> (CaptureProducer<'_, N>, CaptureConsumer<'_, N>) {
        let dropped = &self.dropped;
        let (tx, rx) = self.frames.split();
        (
            CaptureProducer { tx, dropped },
            CaptureConsumer { rx, dropped },
        )
    }
}

impl<const N: usize> Default for CaptureQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Callback half.  Owned by the bus receive/request handlers.
pub struct CaptureProducer<'a, const N: usize> {
    tx: Producer<'a, RawFrame, N>,
    dropped: &'a AtomicU32,
}

impl<const N: usize> CaptureProducer<'_, N> {
    /// Bus write addressed to us.  Bytes past [`MAX_FRAME_LEN`] are cut off.
    /// Returns `false` if the frame was dropped.
    pub fn on_receive(&mut self, bytes: &[u8]) -> bool {
        let n = bytes.len().min(MAX_FRAME_LEN);
        let mut frame = RawFrame::new();
        // Cannot fail: n <= capacity.
        let _ = frame.extend_from_slice(&bytes[..n]);
        if self.tx.enqueue(frame).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        true
    }

    /// Controller reads from us.  The reply is fixed.
    pub fn on_request(&mut self) -> &'static [u8] {
        &READ_REPLY
    }
}

/// Poll-loop half.
pub struct CaptureConsumer<'a, const N: usize> {
    rx: Consumer<'a, RawFrame, N>,
    dropped: &'a AtomicU32,
}

impl<const N: usize> CaptureConsumer<'_, N> {
    /// Oldest captured frame, if any.
    pub fn pop(&mut self) -> Option<RawFrame> {
        self.rx.dequeue()
    }

    /// Frames dropped since the last call.
    pub fn take_dropped(&mut self) -> u32 {
        self.dropped.swap(0, Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        !self.rx.ready()
    }
}
