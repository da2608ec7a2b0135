//! Buffer pool slot state

use crate::capture_pipeline::capture::source::BufferHandle;

/// Lifecycle state of one pool slot.
///
/// Legal transitions: Free -> Queued -> Filled -> Processing -> Free, plus
/// Queued -> Free when a request comes back cancelled. All transitions
/// happen on the processing thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Not owned by the source, ready to queue
    Free,
    /// Handed to the source, awaiting capture
    Queued,
    /// Capture finished, holds an undecoded frame
    Filled,
    /// Being decoded and written
    Processing,
}

/// One entry of the capture pool. The mapping stays owned here for the
/// whole run and is released by drop, on every exit path.
pub struct BufferSlot<M> {
    pub handle: BufferHandle,
    pub state: SlotState,
    pub planes: usize,
    pub mapping: M,
}
