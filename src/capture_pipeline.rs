//! Frame capture pipeline module
//!
//! This module provides a structured approach to RAW10 frame capture, with
//! separate modules for packed-frame unpacking, DNG writing, and capture
//! loop orchestration.

pub mod capture;
pub mod common;
pub mod dng;
pub mod raw;

pub use common::{
    CaptureError,
    Result,
};

pub use raw::{
    DecodedFrame,
    PackedFrame,
    pack_raw10,
    packed_row_stride,
    unpack_raw10,
};

pub use dng::{
    CfaPattern,
    DngMeta,
    DngWriter,
    FrameSink,
    OutputFormat,
    RawWriter,
    SeekableOutput,
};

pub use capture::{
    BufferHandle,
    CaptureConfig,
    CaptureConfigBuilder,
    CaptureControls,
    CaptureManager,
    CaptureReport,
    CaptureSource,
    Completion,
    CompletionStatus,
    PoolBuffer,
    SyntheticSource,
};
