//! Single-slot frame hand-off from the landmark oracle to the game loop.
//!
//! The oracle produces frames faster than the game needs them. A bounded
//! channel of capacity one keeps at most a single unconsumed frame in
//! flight: publishing into a full slot drops the new frame instead of
//! queueing it, which is the natural backpressure for per-frame input.

use crate::hand::landmarks::HandFrame;
use crossbeam_channel::{bounded, Receiver, Sender};

/// The consuming half of the frame hand-off, owned by the game loop.
pub struct ClassificationFeed {
    sender: Sender<HandFrame>,
    receiver: Receiver<HandFrame>,
}

impl ClassificationFeed {
    /// Create a feed with a single-frame slot.
    pub fn new() -> Self {
        let (sender, receiver) = bounded(1);
        Self { sender, receiver }
    }

    /// Create a publisher handle for a producer thread.
    pub fn publisher(&self) -> FramePublisher {
        FramePublisher {
            sender: self.sender.clone(),
        }
    }

    /// Get the receiver for the game loop.
    pub fn receiver(&self) -> &Receiver<HandFrame> {
        &self.receiver
    }

    /// Discard any frame still sitting in the slot.
    pub fn drain(&self) {
        while self.receiver.try_recv().is_ok() {}
    }
}

impl Default for ClassificationFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// The producing half of the frame hand-off.
#[derive(Clone)]
pub struct FramePublisher {
    sender: Sender<HandFrame>,
}

impl FramePublisher {
    /// Offer a frame to the slot.
    ///
    /// Returns `true` when the slot accepted the frame, `false` when an
    /// unconsumed frame was already waiting and this one was dropped.
    pub fn publish(&self, frame: HandFrame) -> bool {
        self.sender.try_send(frame).is_ok()
    }
}
