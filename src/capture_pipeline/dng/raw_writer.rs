use crate::capture_pipeline::common::error::{CaptureError, Result};
use crate::capture_pipeline::dng::types::DngMeta;
use crate::capture_pipeline::dng::writer::{FrameSink, SeekableOutput};

/// Dumps each frame as bare little-endian sample words, no container.
pub struct RawWriter;

impl FrameSink for RawWriter {
    fn extension(&self) -> &'static str {
        "raw"
    }

    fn write_frame(
        &self,
        output: &mut dyn SeekableOutput,
        meta: &DngMeta,
        samples: &[u16],
    ) -> Result<()> {
        let expected = meta.width as usize * meta.height as usize;
        if samples.len() != expected {
            return Err(CaptureError::SizeMismatch(expected, samples.len()));
        }

        let mut bytes = Vec::with_capacity(samples.len() * 2);
        for s in samples {
            bytes.extend_from_slice(&s.to_le_bytes());
        }
        output.write_all(&bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn writes_bare_little_endian_words() {
        let meta = DngMeta {
            width: 3,
            height: 1,
            ..DngMeta::default()
        };
        let mut out = Cursor::new(Vec::new());
        RawWriter
            .write_frame(&mut out, &meta, &[0x012, 0x345, 0x3FF])
            .unwrap();
        assert_eq!(out.into_inner(), vec![0x12, 0x00, 0x45, 0x03, 0xFF, 0x03]);
    }

    #[test]
    fn sample_count_mismatch_is_rejected() {
        let meta = DngMeta {
            width: 4,
            height: 4,
            ..DngMeta::default()
        };
        let mut out = Cursor::new(Vec::new());
        let err = RawWriter.write_frame(&mut out, &meta, &[0; 15]).unwrap_err();
        assert!(matches!(err, CaptureError::SizeMismatch(16, 15)));
    }
}
