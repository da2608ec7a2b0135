use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};

use crate::capture_pipeline::capture::config::CaptureConfig;
use crate::capture_pipeline::capture::slots::{BufferSlot, SlotState};
use crate::capture_pipeline::capture::source::{BufferHandle, CaptureSource, CompletionStatus};
use crate::capture_pipeline::common::error::{CaptureError, Result};
use crate::capture_pipeline::dng::{DngMeta, FrameSink};
use crate::capture_pipeline::raw::{PackedFrame, unpack_raw10};

/// Bound on every completion wait, so the stop flag is re-read even when
/// the source goes quiet.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How long to wait for the source to surface its queued buffers after stop.
const DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

/// Summary of one capture run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureReport {
    /// Completions that carried a frame
    pub frames_completed: u64,
    /// Frames decoded and written out
    pub frames_saved: u64,
    /// Frames lost to per-frame decode or write failures
    pub frames_dropped: u64,
    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

/// Drives the capture loop: owns the buffer pool state, feeds buffers to
/// the source, decodes completed frames and hands them to the sink.
///
/// Everything runs on the calling thread; the only cross-thread surface is
/// the stop flag.
pub struct CaptureManager<S: CaptureSource, W: FrameSink> {
    source: S,
    sink: W,
    config: CaptureConfig,
    stop: Arc<AtomicBool>,
}

impl<S: CaptureSource, W: FrameSink> CaptureManager<S, W> {
    pub fn new(source: S, sink: W, config: CaptureConfig) -> Self {
        Self {
            source,
            sink,
            config,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag that stops a running capture; safe to set from another thread.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Runs the capture until the target frame count is saved or the stop
    /// flag is raised, then drains in-flight buffers and tears down.
    ///
    /// Pool bring-up failures are fatal; per-frame decode and write
    /// failures drop the frame and keep streaming.
    #[instrument(skip(self), fields(target = self.config.target_frames))]
    pub fn run(&mut self) -> Result<CaptureReport> {
        let started = Instant::now();
        let controls = self.config.controls();

        std::fs::create_dir_all(&self.config.output_dir)?;

        let width = self.source.width();
        let height = self.source.height();
        let buffers = self.source.acquire_pool(self.config.buffer_count)?;
        if buffers.is_empty() {
            return Err(CaptureError::SourceError(
                "capture source produced an empty buffer pool".to_string(),
            ));
        }

        let mut slots: Vec<BufferSlot<S::Mapping>> = buffers
            .into_iter()
            .map(|buffer| BufferSlot {
                handle: buffer.handle,
                state: SlotState::Free,
                planes: buffer.planes,
                mapping: buffer.mapping,
            })
            .collect();

        info!(width, height, buffers = slots.len(), "Starting capture");

        for slot in &mut slots {
            self.source.queue(slot.handle, &controls)?;
            slot.state = SlotState::Queued;
        }

        let meta = self.frame_meta(width, height);
        let mut report = CaptureReport::default();
        let mut drain_deadline: Option<Instant> = None;

        loop {
            let completion = self.source.next_completion(POLL_INTERVAL)?;
            let mut freed: Option<BufferHandle> = None;

            if let Some(completion) = completion {
                match Self::slot_mut(&mut slots, completion.handle) {
                    None => {
                        warn!(handle = %completion.handle, "Completion for unknown buffer")
                    }
                    Some(slot) => match completion.status {
                        CompletionStatus::Cancelled => {
                            debug!(handle = %slot.handle, "Capture request cancelled");
                            slot.state = SlotState::Free;
                            freed = Some(slot.handle);
                        }
                        CompletionStatus::Complete => {
                            report.frames_completed += 1;
                            slot.state = SlotState::Filled;
                            debug!(handle = %slot.handle, "Frame ready");

                            // Saved files are numbered contiguously; a dropped
                            // frame does not consume a number.
                            let seq = report.frames_saved;
                            slot.state = SlotState::Processing;
                            let result = self.process_frame(slot, &meta, seq);
                            slot.state = SlotState::Free;
                            freed = Some(slot.handle);

                            match result {
                                Ok(path) => {
                                    report.frames_saved += 1;
                                    debug!(seq, path = %path.display(), "Saved frame");
                                }
                                Err(err) => {
                                    report.frames_dropped += 1;
                                    warn!(handle = %slot.handle, error = %err, "Dropping frame");
                                }
                            }
                        }
                    },
                }
            }

            // Stop flag and target are re-checked after every completion
            // and every idle timeout.
            if drain_deadline.is_none() {
                let target = self.config.target_frames;
                let target_reached = target > 0 && report.frames_saved >= target;
                if target_reached || self.stop.load(Ordering::Acquire) {
                    info!(saved = report.frames_saved, "Stopping capture, draining buffers");
                    self.source.stop();
                    drain_deadline = Some(Instant::now() + DRAIN_TIMEOUT);
                }
            }

            match drain_deadline {
                None => {
                    if let Some(handle) = freed {
                        match self.source.queue(handle, &controls) {
                            Ok(()) => {
                                if let Some(slot) = Self::slot_mut(&mut slots, handle) {
                                    slot.state = SlotState::Queued;
                                }
                            }
                            Err(err) => {
                                warn!(handle = %handle, error = %err, "Failed to requeue buffer")
                            }
                        }
                    }
                }
                Some(deadline) => {
                    if !slots.iter().any(|slot| slot.state == SlotState::Queued) {
                        break;
                    }
                    if Instant::now() >= deadline {
                        warn!("Capture source did not drain all queued buffers");
                        break;
                    }
                }
            }
        }

        report.elapsed = started.elapsed();
        info!(
            saved = report.frames_saved,
            dropped = report.frames_dropped,
            dir = %self.config.output_dir.display(),
            "Capture finished"
        );
        Ok(report)
    }

    fn frame_meta(&self, width: u32, height: u32) -> DngMeta {
        DngMeta {
            width,
            height,
            bits_per_sample: 16,
            black_level: self.config.black_level,
            white_level: self.config.white_level,
            cfa: self.config.cfa,
            analogue_gain: self.config.analogue_gain,
            exposure: self.config.exposure,
            camera_model: self.config.camera_model.clone(),
            calibration_illuminant: self.config.calibration_illuminant,
            color_matrix: self.config.color_matrix,
        }
    }

    fn slot_mut(
        slots: &mut [BufferSlot<S::Mapping>],
        handle: BufferHandle,
    ) -> Option<&mut BufferSlot<S::Mapping>> {
        slots.iter_mut().find(|slot| slot.handle == handle)
    }

    fn process_frame(
        &self,
        slot: &BufferSlot<S::Mapping>,
        meta: &DngMeta,
        seq: u64,
    ) -> Result<PathBuf> {
        let frame = PackedFrame {
            data: slot.mapping.as_ref(),
            planes: slot.planes,
            width: meta.width,
            height: meta.height,
        };
        let decoded = {
            let _span = tracing::info_span!("unpack_frame", seq).entered();
            unpack_raw10(&frame)?
        };

        let path = self.config.output_dir.join(format!(
            "{}_{:06}.{}",
            self.config.file_prefix,
            seq,
            self.sink.extension()
        ));
        {
            let _span = tracing::info_span!("write_frame", seq).entered();
            let mut output = BufWriter::new(File::create(&path)?);
            self.sink.write_frame(&mut output, meta, &decoded.samples)?;
            output.flush()?;
        }
        Ok(path)
    }
}
