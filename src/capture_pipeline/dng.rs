//! DNG writing module
//!
//! This module provides the frame sinks: a minimal single-strip DNG writer
//! and a bare raw dump, behind one trait.

mod dng_writer;
mod raw_writer;
pub mod types;
mod writer;

pub use dng_writer::DngWriter;
pub use raw_writer::RawWriter;
pub use types::{CfaPattern, DngMeta, OutputFormat};
pub use writer::{FrameSink, SeekableOutput};
