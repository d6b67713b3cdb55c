//! Inter-stage channel
//!
//! FIFO, multi-producer multi-consumer. Unbounded by default: a slow consumer
//! makes the queue grow without limit. With a capacity the sender awaits while
//! the queue is full (backpressure); the sentinel goes through the same
//! awaited send, so its delivery is never skipped.

use async_channel::{bounded, unbounded, Receiver, Sender};

use crate::Envelope;

/// Sending half carrying records and the sentinel
pub type StageSender<T> = Sender<Envelope<T>>;

/// Receiving half carrying records and the sentinel
pub type StageReceiver<T> = Receiver<Envelope<T>>;

/// Create a stage channel
///
/// # Arguments
/// * `capacity` - `None` or `Some(0)` for unbounded, otherwise the queue bound
pub fn stage_channel<T>(capacity: Option<usize>) -> (StageSender<T>, StageReceiver<T>) {
    match capacity {
        Some(cap) if cap > 0 => bounded(cap),
        _ => unbounded(),
    }
}
