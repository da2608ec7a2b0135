use std::collections::VecDeque;
use std::thread;
use std::time::{Duration, Instant};

use crate::capture_pipeline::capture::source::{
    BufferHandle, CaptureControls, CaptureSource, Completion, CompletionStatus, PoolBuffer,
};
use crate::capture_pipeline::common::error::{CaptureError, Result};
use crate::capture_pipeline::raw::pack_raw10;

/// Hardware-free capture source producing a deterministic packed gradient.
///
/// Pool buffers are plain heap allocations filled once at acquisition, each
/// with a slightly different pattern so saved frames can be told apart.
/// Completions surface in queue order, paced at the frame duration carried
/// by the most recent queue controls; exposure and gain are accepted and
/// ignored.
pub struct SyntheticSource {
    width: u32,
    height: u32,
    pool_size: usize,
    queued: VecDeque<BufferHandle>,
    frame_duration: Duration,
    next_due: Option<Instant>,
    stopped: bool,
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pool_size: 0,
            queued: VecDeque::new(),
            frame_duration: Duration::from_millis(16),
            next_due: None,
            stopped: false,
        }
    }

    fn pattern(&self, buffer: usize) -> Vec<u16> {
        let pixels = self.width as usize * self.height as usize;
        (0..pixels)
            .map(|i| ((i * 5 + buffer * 131) % 1024) as u16)
            .collect()
    }
}

impl CaptureSource for SyntheticSource {
    type Mapping = Vec<u8>;

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn acquire_pool(&mut self, count: usize) -> Result<Vec<PoolBuffer<Vec<u8>>>> {
        self.pool_size = count;
        let mut buffers = Vec::with_capacity(count);
        for index in 0..count {
            let samples = self.pattern(index);
            buffers.push(PoolBuffer {
                handle: BufferHandle(index as u32),
                planes: 1,
                mapping: pack_raw10(&samples, self.width, self.height),
            });
        }
        Ok(buffers)
    }

    fn queue(&mut self, handle: BufferHandle, controls: &CaptureControls) -> Result<()> {
        if self.stopped {
            return Err(CaptureError::SourceError(
                "queue on a stopped source".to_string(),
            ));
        }
        if handle.0 as usize >= self.pool_size {
            return Err(CaptureError::SourceError(format!("unknown buffer {handle}")));
        }
        self.frame_duration = controls.frame_duration;
        self.queued.push_back(handle);
        Ok(())
    }

    fn next_completion(&mut self, timeout: Duration) -> Result<Option<Completion>> {
        if self.stopped {
            // Drain whatever is still queued as cancelled, without pacing.
            return Ok(self.queued.pop_front().map(|handle| Completion {
                handle,
                status: CompletionStatus::Cancelled,
            }));
        }

        let Some(&handle) = self.queued.front() else {
            thread::sleep(timeout);
            return Ok(None);
        };

        let now = Instant::now();
        let due = *self.next_due.get_or_insert(now + self.frame_duration);
        if due > now + timeout {
            thread::sleep(timeout);
            return Ok(None);
        }
        if due > now {
            thread::sleep(due - now);
        }

        self.queued.pop_front();
        self.next_due = Some(due + self.frame_duration);
        Ok(Some(Completion {
            handle,
            status: CompletionStatus::Complete,
        }))
    }

    fn stop(&mut self) {
        self.stopped = true;
        self.next_due = None;
    }
}
