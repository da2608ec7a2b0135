//! Capture run configuration

use std::path::PathBuf;
use std::time::Duration;

use crate::capture_pipeline::capture::source::CaptureControls;
use crate::capture_pipeline::dng::types::{CfaPattern, OutputFormat};

/// Sources cannot run faster than this; shorter derived durations clamp up.
const MIN_FRAME_DURATION: Duration = Duration::from_millis(1);

/// Configuration for a capture run. Defaults match the IMX296 global
/// shutter sensor the pipeline was built around.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Bayer mosaic the sensor produces
    pub cfa: CfaPattern,
    /// Exposure time applied to every request
    pub exposure: Duration,
    /// Analogue gain applied to every request
    pub analogue_gain: f32,
    /// Target frame rate, used to derive the frame duration limits
    pub fps: f64,
    /// Number of frames to save before stopping; 0 captures until stopped
    pub target_frames: u64,
    /// Container format for saved frames
    pub output_format: OutputFormat,
    /// Directory saved frames go to
    pub output_dir: PathBuf,
    /// Size of the capture buffer pool
    pub buffer_count: usize,
    /// Sensor black level recorded in the container, never inferred
    pub black_level: u16,
    /// Saturation level for 10-bit data
    pub white_level: u16,
    /// Camera model string recorded in the container
    pub camera_model: String,
    /// Leading part of saved file names
    pub file_prefix: String,
    /// Calibration illuminant code (21 = D65)
    pub calibration_illuminant: u16,
    /// Sensor color matrix as rationals; identity when absent
    pub color_matrix: Option<[(u32, u32); 9]>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            cfa: CfaPattern::Rggb,
            exposure: Duration::from_millis(8),
            analogue_gain: 1.0,
            fps: 60.0,
            target_frames: 100,
            output_format: OutputFormat::Dng,
            output_dir: PathBuf::from("./out"),
            buffer_count: 8,
            black_level: 0,
            white_level: 1023,
            camera_model: "Raspberry Pi Global Shutter Camera IMX296".to_string(),
            file_prefix: "imx296".to_string(),
            calibration_illuminant: 21,
            color_matrix: None,
        }
    }
}

impl CaptureConfig {
    pub fn builder() -> CaptureConfigBuilder {
        CaptureConfigBuilder::default()
    }

    /// Controls applied to every capture request. The frame duration is
    /// derived from the target rate; rates below 1 fps pin at one second
    /// and durations under a millisecond clamp up.
    pub fn controls(&self) -> CaptureControls {
        let mut frame_duration = Duration::from_secs_f64(1.0 / self.fps.max(1.0));
        if frame_duration < MIN_FRAME_DURATION {
            frame_duration = MIN_FRAME_DURATION;
        }
        CaptureControls {
            exposure: self.exposure,
            analogue_gain: self.analogue_gain,
            frame_duration,
        }
    }
}

/// Builder for CaptureConfig
#[derive(Default)]
pub struct CaptureConfigBuilder {
    cfa: Option<CfaPattern>,
    exposure: Option<Duration>,
    analogue_gain: Option<f32>,
    fps: Option<f64>,
    target_frames: Option<u64>,
    output_format: Option<OutputFormat>,
    output_dir: Option<PathBuf>,
    buffer_count: Option<usize>,
    black_level: Option<u16>,
    white_level: Option<u16>,
    camera_model: Option<String>,
    file_prefix: Option<String>,
    calibration_illuminant: Option<u16>,
    color_matrix: Option<[(u32, u32); 9]>,
}

impl CaptureConfigBuilder {
    pub fn cfa(mut self, cfa: CfaPattern) -> Self {
        self.cfa = Some(cfa);
        self
    }

    pub fn exposure(mut self, exposure: Duration) -> Self {
        self.exposure = Some(exposure);
        self
    }

    pub fn analogue_gain(mut self, gain: f32) -> Self {
        self.analogue_gain = Some(gain);
        self
    }

    pub fn fps(mut self, fps: f64) -> Self {
        self.fps = Some(fps);
        self
    }

    pub fn target_frames(mut self, frames: u64) -> Self {
        self.target_frames = Some(frames);
        self
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn buffer_count(mut self, count: usize) -> Self {
        self.buffer_count = Some(count);
        self
    }

    pub fn black_level(mut self, level: u16) -> Self {
        self.black_level = Some(level);
        self
    }

    pub fn white_level(mut self, level: u16) -> Self {
        self.white_level = Some(level);
        self
    }

    pub fn camera_model(mut self, model: impl Into<String>) -> Self {
        self.camera_model = Some(model.into());
        self
    }

    pub fn file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = Some(prefix.into());
        self
    }

    pub fn calibration_illuminant(mut self, code: u16) -> Self {
        self.calibration_illuminant = Some(code);
        self
    }

    pub fn color_matrix(mut self, matrix: [(u32, u32); 9]) -> Self {
        self.color_matrix = Some(matrix);
        self
    }

    pub fn build(self) -> CaptureConfig {
        let default = CaptureConfig::default();
        CaptureConfig {
            cfa: self.cfa.unwrap_or(default.cfa),
            exposure: self.exposure.unwrap_or(default.exposure),
            analogue_gain: self.analogue_gain.unwrap_or(default.analogue_gain),
            fps: self.fps.unwrap_or(default.fps),
            target_frames: self.target_frames.unwrap_or(default.target_frames),
            output_format: self.output_format.unwrap_or(default.output_format),
            output_dir: self.output_dir.unwrap_or(default.output_dir),
            buffer_count: self.buffer_count.unwrap_or(default.buffer_count),
            black_level: self.black_level.unwrap_or(default.black_level),
            white_level: self.white_level.unwrap_or(default.white_level),
            camera_model: self.camera_model.unwrap_or(default.camera_model),
            file_prefix: self.file_prefix.unwrap_or(default.file_prefix),
            calibration_illuminant: self
                .calibration_illuminant
                .unwrap_or(default.calibration_illuminant),
            color_matrix: self.color_matrix.or(default.color_matrix),
        }
    }
}
