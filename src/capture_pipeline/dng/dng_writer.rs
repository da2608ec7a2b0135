//! Minimal single-strip DNG writing
//!
//! The container is little-endian TIFF 6.0 with one image file directory:
//! an 8-byte header, a directory region reserved up front, every
//! out-of-line value block 2-byte aligned with the raw strip as the final
//! block, then a seek back to fill in the directory. Values that fit in
//! four bytes are stored inline in their entry, left-justified.

use std::io::SeekFrom;

use tracing::debug;

use crate::capture_pipeline::common::error::{CaptureError, Result};
use crate::capture_pipeline::dng::types::DngMeta;
use crate::capture_pipeline::dng::writer::{FrameSink, SeekableOutput};

const TYPE_BYTE: u16 = 1;
const TYPE_ASCII: u16 = 2;
const TYPE_SHORT: u16 = 3;
const TYPE_LONG: u16 = 4;
const TYPE_RATIONAL: u16 = 5;

const TAG_IMAGE_WIDTH: u16 = 256;
const TAG_IMAGE_LENGTH: u16 = 257;
const TAG_BITS_PER_SAMPLE: u16 = 258;
const TAG_COMPRESSION: u16 = 259;
const TAG_PHOTOMETRIC_INTERPRETATION: u16 = 262;
const TAG_STRIP_OFFSETS: u16 = 273;
const TAG_SAMPLES_PER_PIXEL: u16 = 277;
const TAG_ROWS_PER_STRIP: u16 = 278;
const TAG_STRIP_BYTE_COUNTS: u16 = 279;
const TAG_PLANAR_CONFIGURATION: u16 = 284;
const TAG_CFA_REPEAT_PATTERN_DIM: u16 = 33421;
const TAG_CFA_PATTERN: u16 = 33422;
const TAG_DNG_VERSION: u16 = 50706;
const TAG_UNIQUE_CAMERA_MODEL: u16 = 50708;
const TAG_CFA_PLANE_COLOR: u16 = 50710;
const TAG_BLACK_LEVEL: u16 = 50714;
const TAG_WHITE_LEVEL: u16 = 50717;
const TAG_COLOR_MATRIX1: u16 = 50721;
const TAG_DEFAULT_SCALE: u16 = 50733;
const TAG_CALIBRATION_ILLUMINANT1: u16 = 50778;

const COMPRESSION_NONE: u16 = 1;
const PHOTOMETRIC_CFA: u16 = 32803;

const IFD_OFFSET: u32 = 8;
const ENTRY_COUNT: usize = 20;

const IDENTITY_MATRIX: [(u32, u32); 9] = [
    (1, 1),
    (0, 1),
    (0, 1),
    (0, 1),
    (1, 1),
    (0, 1),
    (0, 1),
    (0, 1),
    (1, 1),
];

/// Writes each frame as a self-contained DNG.
pub struct DngWriter;

impl FrameSink for DngWriter {
    fn extension(&self) -> &'static str {
        "dng"
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
        debug!("Encoding DNG frame: {}x{}", meta.width, meta.height);

        let mut ifd = IfdBuilder::new(output, ENTRY_COUNT)?;
        ifd.push_long(TAG_IMAGE_WIDTH, &[meta.width])?;
        ifd.push_long(TAG_IMAGE_LENGTH, &[meta.height])?;
        ifd.push_short(TAG_BITS_PER_SAMPLE, &[meta.bits_per_sample])?;
        ifd.push_short(TAG_COMPRESSION, &[COMPRESSION_NONE])?;
        ifd.push_short(TAG_PHOTOMETRIC_INTERPRETATION, &[PHOTOMETRIC_CFA])?;
        ifd.push_short(TAG_SAMPLES_PER_PIXEL, &[1])?;
        ifd.push_long(TAG_ROWS_PER_STRIP, &[meta.height])?;
        ifd.push_short(TAG_PLANAR_CONFIGURATION, &[1])?;
        ifd.push_short(TAG_CFA_REPEAT_PATTERN_DIM, &[2, 2])?;
        ifd.push_byte(TAG_CFA_PATTERN, &meta.cfa.pattern_2x2())?;
        ifd.push_byte(TAG_DNG_VERSION, &[1, 4, 0, 0])?;
        ifd.push_ascii(TAG_UNIQUE_CAMERA_MODEL, &meta.camera_model)?;
        ifd.push_byte(TAG_CFA_PLANE_COLOR, &[0, 1, 2])?;
        ifd.push_short(TAG_BLACK_LEVEL, &[meta.black_level])?;
        ifd.push_short(TAG_WHITE_LEVEL, &[meta.white_level])?;
        ifd.push_rational(
            TAG_COLOR_MATRIX1,
            &meta.color_matrix.unwrap_or(IDENTITY_MATRIX),
        )?;
        ifd.push_rational(TAG_DEFAULT_SCALE, &[(1, 1), (1, 1)])?;
        ifd.push_short(TAG_CALIBRATION_ILLUMINANT1, &[meta.calibration_illuminant])?;

        let (strip_offset, strip_len) = ifd.write_strip(samples)?;
        ifd.push_long(TAG_STRIP_OFFSETS, &[strip_offset])?;
        ifd.push_long(TAG_STRIP_BYTE_COUNTS, &[strip_len])?;

        ifd.finish()?;
        debug!("DNG encode complete");
        Ok(())
    }
}

struct IfdEntry {
    tag: u16,
    kind: u16,
    count: u32,
    value: [u8; 4],
}

/// Two-pass directory builder: reserves the directory region behind the
/// header, streams value blocks while recording their offsets, then seeks
/// back once to emit the entries sorted by tag id.
struct IfdBuilder<'a> {
    out: &'a mut dyn SeekableOutput,
    entries: Vec<IfdEntry>,
    capacity: usize,
}

impl<'a> IfdBuilder<'a> {
    fn new(out: &'a mut dyn SeekableOutput, capacity: usize) -> Result<Self> {
        out.write_all(b"II")?;
        out.write_all(&42u16.to_le_bytes())?;
        out.write_all(&IFD_OFFSET.to_le_bytes())?;
        out.write_all(&vec![0u8; 2 + capacity * 12 + 4])?;
        Ok(Self {
            out,
            entries: Vec::with_capacity(capacity),
            capacity,
        })
    }

    /// Pads to a 2-byte boundary and returns the aligned stream position.
    fn align(&mut self) -> Result<u64> {
        let pos = self.out.stream_position()?;
        if pos % 2 == 1 {
            self.out.write_all(&[0])?;
            Ok(pos + 1)
        } else {
            Ok(pos)
        }
    }

    fn push(&mut self, tag: u16, kind: u16, count: u32, payload: &[u8]) -> Result<()> {
        let mut value = [0u8; 4];
        if payload.len() <= 4 {
            value[..payload.len()].copy_from_slice(payload);
        } else {
            let offset = self.align()?;
            self.out.write_all(payload)?;
            value = (offset as u32).to_le_bytes();
        }
        self.entries.push(IfdEntry {
            tag,
            kind,
            count,
            value,
        });
        Ok(())
    }

    fn push_byte(&mut self, tag: u16, values: &[u8]) -> Result<()> {
        self.push(tag, TYPE_BYTE, values.len() as u32, values)
    }

    fn push_ascii(&mut self, tag: u16, value: &str) -> Result<()> {
        let mut payload = Vec::with_capacity(value.len() + 1);
        payload.extend_from_slice(value.as_bytes());
        payload.push(0);
        self.push(tag, TYPE_ASCII, payload.len() as u32, &payload)
    }

    fn push_short(&mut self, tag: u16, values: &[u16]) -> Result<()> {
        let mut payload = Vec::with_capacity(values.len() * 2);
        for v in values {
            payload.extend_from_slice(&v.to_le_bytes());
        }
        self.push(tag, TYPE_SHORT, values.len() as u32, &payload)
    }

    fn push_long(&mut self, tag: u16, values: &[u32]) -> Result<()> {
        let mut payload = Vec::with_capacity(values.len() * 4);
        for v in values {
            payload.extend_from_slice(&v.to_le_bytes());
        }
        self.push(tag, TYPE_LONG, values.len() as u32, &payload)
    }

    fn push_rational(&mut self, tag: u16, values: &[(u32, u32)]) -> Result<()> {
        let mut payload = Vec::with_capacity(values.len() * 8);
        for (numerator, denominator) in values {
            payload.extend_from_slice(&numerator.to_le_bytes());
            payload.extend_from_slice(&denominator.to_le_bytes());
        }
        self.push(tag, TYPE_RATIONAL, values.len() as u32, &payload)
    }

    /// Writes the raw strip and returns its aligned offset and byte count.
    fn write_strip(&mut self, samples: &[u16]) -> Result<(u32, u32)> {
        let offset = self.align()?;
        let mut strip = Vec::with_capacity(samples.len() * 2);
        for s in samples {
            strip.extend_from_slice(&s.to_le_bytes());
        }
        self.out.write_all(&strip)?;
        Ok((offset as u32, strip.len() as u32))
    }

    fn finish(mut self) -> Result<()> {
        debug_assert_eq!(self.entries.len(), self.capacity);
        self.entries.sort_by_key(|e| e.tag);

        self.out.seek(SeekFrom::Start(IFD_OFFSET as u64))?;
        self.out.write_all(&(self.entries.len() as u16).to_le_bytes())?;
        for entry in &self.entries {
            self.out.write_all(&entry.tag.to_le_bytes())?;
            self.out.write_all(&entry.kind.to_le_bytes())?;
            self.out.write_all(&entry.count.to_le_bytes())?;
            self.out.write_all(&entry.value)?;
        }
        self.out.write_all(&0u32.to_le_bytes())?;
        self.out.seek(SeekFrom::End(0))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::capture_pipeline::dng::types::CfaPattern;

    fn meta_4x2() -> DngMeta {
        DngMeta {
            width: 4,
            height: 2,
            ..DngMeta::default()
        }
    }

    fn write(meta: &DngMeta, samples: &[u16]) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        DngWriter.write_frame(&mut out, meta, samples).unwrap();
        out.into_inner()
    }

    fn u16_at(bytes: &[u8], at: usize) -> u16 {
        u16::from_le_bytes([bytes[at], bytes[at + 1]])
    }

    fn u32_at(bytes: &[u8], at: usize) -> u32 {
        u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
    }

    fn entry(bytes: &[u8], tag: u16) -> (u16, u32, [u8; 4]) {
        let count = u16_at(bytes, 8) as usize;
        for i in 0..count {
            let at = 10 + i * 12;
            if u16_at(bytes, at) == tag {
                let value = [bytes[at + 8], bytes[at + 9], bytes[at + 10], bytes[at + 11]];
                return (u16_at(bytes, at + 2), u32_at(bytes, at + 4), value);
            }
        }
        panic!("tag {tag} not found");
    }

    #[test]
    fn header_and_directory_shape() {
        let bytes = write(&meta_4x2(), &[0; 8]);
        assert_eq!(&bytes[0..2], b"II");
        assert_eq!(u16_at(&bytes, 2), 42);
        assert_eq!(u32_at(&bytes, 4), 8);
        assert_eq!(u16_at(&bytes, 8), 20);
        // next-IFD pointer right behind the 20 entries
        assert_eq!(u32_at(&bytes, 10 + 20 * 12), 0);

        let mut previous = 0u16;
        for i in 0..20 {
            let tag = u16_at(&bytes, 10 + i * 12);
            assert!(tag > previous, "entries not sorted at index {i}");
            previous = tag;
        }
    }

    #[test]
    fn scalar_entries_are_inline() {
        let bytes = write(&meta_4x2(), &[0; 8]);

        let (kind, count, value) = entry(&bytes, TAG_IMAGE_WIDTH);
        assert_eq!((kind, count), (TYPE_LONG, 1));
        assert_eq!(u32::from_le_bytes(value), 4);

        let (kind, count, value) = entry(&bytes, TAG_IMAGE_LENGTH);
        assert_eq!((kind, count), (TYPE_LONG, 1));
        assert_eq!(u32::from_le_bytes(value), 2);

        let (kind, _, value) = entry(&bytes, TAG_BITS_PER_SAMPLE);
        assert_eq!(kind, TYPE_SHORT);
        assert_eq!(u16::from_le_bytes([value[0], value[1]]), 16);
        assert_eq!(&value[2..], &[0, 0]);

        let (_, _, value) = entry(&bytes, TAG_COMPRESSION);
        assert_eq!(u16::from_le_bytes([value[0], value[1]]), 1);

        let (_, _, value) = entry(&bytes, TAG_PHOTOMETRIC_INTERPRETATION);
        assert_eq!(u16::from_le_bytes([value[0], value[1]]), 32803);

        let (_, _, value) = entry(&bytes, TAG_ROWS_PER_STRIP);
        assert_eq!(u32::from_le_bytes(value), 2);

        let (_, _, value) = entry(&bytes, TAG_WHITE_LEVEL);
        assert_eq!(u16::from_le_bytes([value[0], value[1]]), 1023);

        let (_, _, value) = entry(&bytes, TAG_BLACK_LEVEL);
        assert_eq!(u16::from_le_bytes([value[0], value[1]]), 0);

        let (_, _, value) = entry(&bytes, TAG_CALIBRATION_ILLUMINANT1);
        assert_eq!(u16::from_le_bytes([value[0], value[1]]), 21);
    }

    #[test]
    fn strip_is_aligned_and_matches_samples() {
        let samples: Vec<u16> = (0..8).map(|i| i * 100 + 3).collect();
        let bytes = write(&meta_4x2(), &samples);

        let (_, _, value) = entry(&bytes, TAG_STRIP_OFFSETS);
        let offset = u32::from_le_bytes(value) as usize;
        assert_eq!(offset % 2, 0);

        let (_, _, value) = entry(&bytes, TAG_STRIP_BYTE_COUNTS);
        let len = u32::from_le_bytes(value) as usize;
        assert_eq!(len, 16);
        assert_eq!(bytes.len(), offset + len);

        let mut expected = Vec::new();
        for s in &samples {
            expected.extend_from_slice(&s.to_le_bytes());
        }
        assert_eq!(&bytes[offset..offset + len], expected.as_slice());
    }

    #[test]
    fn cfa_entries_follow_the_mosaic() {
        let meta = DngMeta {
            cfa: CfaPattern::Bggr,
            ..meta_4x2()
        };
        let bytes = write(&meta, &[0; 8]);

        let (kind, count, value) = entry(&bytes, TAG_CFA_PATTERN);
        assert_eq!((kind, count), (TYPE_BYTE, 4));
        assert_eq!(value, [2, 1, 1, 0]);

        let (kind, count, value) = entry(&bytes, TAG_CFA_REPEAT_PATTERN_DIM);
        assert_eq!((kind, count), (TYPE_SHORT, 2));
        assert_eq!(value, [2, 0, 2, 0]);

        let (kind, count, value) = entry(&bytes, TAG_CFA_PLANE_COLOR);
        assert_eq!((kind, count), (TYPE_BYTE, 3));
        assert_eq!(value, [0, 1, 2, 0]);

        let (_, _, value) = entry(&bytes, TAG_DNG_VERSION);
        assert_eq!(value, [1, 4, 0, 0]);
    }

    #[test]
    fn camera_model_is_nul_terminated_at_an_even_offset() {
        let meta = meta_4x2();
        let bytes = write(&meta, &[0; 8]);

        let (kind, count, value) = entry(&bytes, TAG_UNIQUE_CAMERA_MODEL);
        assert_eq!(kind, TYPE_ASCII);
        assert_eq!(count as usize, meta.camera_model.len() + 1);
        let offset = u32::from_le_bytes(value) as usize;
        assert_eq!(offset % 2, 0);
        assert_eq!(
            &bytes[offset..offset + count as usize - 1],
            meta.camera_model.as_bytes()
        );
        assert_eq!(bytes[offset + count as usize - 1], 0);
    }

    #[test]
    fn color_matrix_defaults_to_identity() {
        let bytes = write(&meta_4x2(), &[0; 8]);

        let (kind, count, value) = entry(&bytes, TAG_COLOR_MATRIX1);
        assert_eq!((kind, count), (TYPE_RATIONAL, 9));
        let offset = u32::from_le_bytes(value) as usize;
        assert_eq!(offset % 2, 0);
        for (i, expected) in IDENTITY_MATRIX.iter().enumerate() {
            let at = offset + i * 8;
            assert_eq!((u32_at(&bytes, at), u32_at(&bytes, at + 4)), *expected);
        }

        let (_, count, value) = entry(&bytes, TAG_DEFAULT_SCALE);
        assert_eq!(count, 2);
        let offset = u32::from_le_bytes(value) as usize;
        for i in 0..2 {
            assert_eq!(u32_at(&bytes, offset + i * 8), 1);
            assert_eq!(u32_at(&bytes, offset + i * 8 + 4), 1);
        }
    }

    #[test]
    fn supplied_color_matrix_is_written() {
        let matrix = [
            (512, 256),
            (1, 3),
            (7, 9),
            (2, 5),
            (600, 256),
            (4, 11),
            (13, 17),
            (19, 23),
            (700, 256),
        ];
        let meta = DngMeta {
            color_matrix: Some(matrix),
            ..meta_4x2()
        };
        let bytes = write(&meta, &[0; 8]);

        let (_, _, value) = entry(&bytes, TAG_COLOR_MATRIX1);
        let offset = u32::from_le_bytes(value) as usize;
        for (i, expected) in matrix.iter().enumerate() {
            let at = offset + i * 8;
            assert_eq!((u32_at(&bytes, at), u32_at(&bytes, at + 4)), *expected);
        }
    }

    #[test]
    fn odd_length_blocks_are_padded() {
        // "Test" plus the terminator is a 5-byte block, leaving the stream
        // at an odd position before the next block.
        let meta = DngMeta {
            camera_model: "Test".to_string(),
            ..meta_4x2()
        };
        let bytes = write(&meta, &[0; 8]);

        let (_, count, value) = entry(&bytes, TAG_UNIQUE_CAMERA_MODEL);
        assert_eq!(count, 5);
        let model_end = u32::from_le_bytes(value) as usize + 5;
        assert_eq!(model_end % 2, 1);

        let (_, _, value) = entry(&bytes, TAG_COLOR_MATRIX1);
        assert_eq!(u32::from_le_bytes(value) as usize, model_end + 1);
        let (_, _, value) = entry(&bytes, TAG_STRIP_OFFSETS);
        assert_eq!(u32::from_le_bytes(value) % 2, 0);
    }

    #[test]
    fn output_is_deterministic() {
        let samples: Vec<u16> = (0..8).map(|i| (i * 131) % 1024).collect();
        let first = write(&meta_4x2(), &samples);
        let second = write(&meta_4x2(), &samples);
        assert_eq!(first, second);
    }

    #[test]
    fn sample_count_mismatch_is_rejected() {
        let mut out = Cursor::new(Vec::new());
        let err = DngWriter
            .write_frame(&mut out, &meta_4x2(), &[0; 7])
            .unwrap_err();
        assert!(matches!(err, CaptureError::SizeMismatch(8, 7)));
    }
}
