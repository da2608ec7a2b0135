use std::io::{Seek, Write};

use crate::capture_pipeline::common::error::Result;
use crate::capture_pipeline::dng::types::DngMeta;

/// Byte stream a frame sink serializes into. The two-pass container layout
/// seeks back over its reserved directory, so plain `Write` is not enough.
pub trait SeekableOutput: Write + Seek {}

impl<T: Write + Seek> SeekableOutput for T {}

pub trait FrameSink {
    /// File extension for frames produced by this sink, without the dot.
    fn extension(&self) -> &'static str;

    fn write_frame(
        &self,
        output: &mut dyn SeekableOutput,
        meta: &DngMeta,
        samples: &[u16],
    ) -> Result<()>;
}
