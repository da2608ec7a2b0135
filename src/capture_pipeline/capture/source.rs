use std::fmt;
use std::time::Duration;

use crate::capture_pipeline::common::error::Result;

/// Opaque identity of one pool buffer, assigned by the capture source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u32);

impl fmt::Display for BufferHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-request sensor controls, re-applied on every queue call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureControls {
    /// Exposure time
    pub exposure: Duration,
    /// Analogue gain
    pub analogue_gain: f32,
    /// Fixed frame duration, both limits
    pub frame_duration: Duration,
}

/// One buffer handed out of [`CaptureSource::acquire_pool`].
pub struct PoolBuffer<M> {
    pub handle: BufferHandle,
    /// Number of planes the buffer carries
    pub planes: usize,
    /// Mapped view of the buffer, released by drop
    pub mapping: M,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionStatus {
    /// The buffer holds a finished frame
    Complete,
    /// The request was cancelled, the buffer holds nothing useful
    Cancelled,
}

/// One finished capture request surfaced by the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub handle: BufferHandle,
    pub status: CompletionStatus,
}

/// Boundary to the device side of the capture stack.
///
/// Implementations own device acquisition, format negotiation, buffer
/// allocation and stream start; the pipeline only sees buffers through
/// their handles and mapped views.
pub trait CaptureSource {
    /// Mapped view of a pool buffer. Dropping it releases the mapping.
    type Mapping: AsRef<[u8]>;

    /// Negotiated frame width in pixels.
    fn width(&self) -> u32;

    /// Negotiated frame height in pixels.
    fn height(&self) -> u32;

    /// Allocates and maps the fixed buffer pool. Called once, before any
    /// buffer is queued.
    fn acquire_pool(&mut self, count: usize) -> Result<Vec<PoolBuffer<Self::Mapping>>>;

    /// Hands a buffer to the source for the next capture.
    fn queue(&mut self, handle: BufferHandle, controls: &CaptureControls) -> Result<()>;

    /// Waits up to `timeout` for a finished request. `Ok(None)` means the
    /// wait timed out with nothing to report.
    fn next_completion(&mut self, timeout: Duration) -> Result<Option<Completion>>;

    /// Stops streaming. Buffers still queued may surface afterwards as
    /// cancelled completions.
    fn stop(&mut self);
}
