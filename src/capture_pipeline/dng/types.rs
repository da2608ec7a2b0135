//! DNG container configuration types

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::capture_pipeline::common::error::CaptureError;

/// 2x2 Bayer mosaic layouts, named by their top-left quartet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CfaPattern {
    #[default]
    Rggb,
    Bggr,
    Grbg,
    Gbrg,
}

impl CfaPattern {
    /// Plane colors of the 2x2 repeat block, row-major (0 = red, 1 = green,
    /// 2 = blue). This is the value of the CFAPattern directory entry.
    pub fn pattern_2x2(&self) -> [u8; 4] {
        match self {
            CfaPattern::Rggb => [0, 1, 1, 2],
            CfaPattern::Bggr => [2, 1, 1, 0],
            CfaPattern::Grbg => [1, 0, 2, 1],
            CfaPattern::Gbrg => [1, 2, 0, 1],
        }
    }
}

impl FromStr for CfaPattern {
    type Err = CaptureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "RGGB" => Ok(CfaPattern::Rggb),
            "BGGR" => Ok(CfaPattern::Bggr),
            "GRBG" => Ok(CfaPattern::Grbg),
            "GBRG" => Ok(CfaPattern::Gbrg),
            _ => Err(CaptureError::InvalidMosaic(s.to_string())),
        }
    }
}

impl fmt::Display for CfaPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CfaPattern::Rggb => "RGGB",
            CfaPattern::Bggr => "BGGR",
            CfaPattern::Grbg => "GRBG",
            CfaPattern::Gbrg => "GBRG",
        };
        f.write_str(name)
    }
}

/// Container format for saved frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Minimal single-strip DNG
    #[default]
    Dng,
    /// Bare little-endian sample words, no container
    Raw,
}

impl FromStr for OutputFormat {
    type Err = CaptureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dng" => Ok(OutputFormat::Dng),
            "raw" => Ok(OutputFormat::Raw),
            _ => Err(CaptureError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Dng => f.write_str("dng"),
            OutputFormat::Raw => f.write_str("raw"),
        }
    }
}

/// Metadata recorded alongside the pixel data of one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DngMeta {
    /// Width of the frame in pixels
    pub width: u32,
    /// Height of the frame in pixels
    pub height: u32,
    /// Container sample width; unpacked RAW10 is stored as 16-bit words
    pub bits_per_sample: u16,
    /// Sensor black level
    pub black_level: u16,
    /// Saturation level for 10-bit data
    pub white_level: u16,
    /// Bayer mosaic of the sensor
    pub cfa: CfaPattern,
    /// Analogue gain the frame was captured with
    pub analogue_gain: f32,
    /// Exposure time the frame was captured with
    pub exposure: Duration,
    /// Camera model string recorded in the container
    pub camera_model: String,
    /// Calibration illuminant code (21 = D65)
    pub calibration_illuminant: u16,
    /// Sensor color matrix as rationals; identity when absent
    pub color_matrix: Option<[(u32, u32); 9]>,
}

impl Default for DngMeta {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            bits_per_sample: 16,
            black_level: 0,
            white_level: 1023,
            cfa: CfaPattern::default(),
            analogue_gain: 1.0,
            exposure: Duration::from_millis(8),
            camera_model: "Raspberry Pi Global Shutter Camera IMX296".to_string(),
            calibration_illuminant: 21,
            color_matrix: None,
        }
    }
}
