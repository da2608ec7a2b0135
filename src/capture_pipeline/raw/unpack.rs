//! Packed RAW10 unpacking
//!
//! CSI-2 RAW10 packs four pixels into five bytes: the first four bytes carry
//! the eight most significant bits of each pixel, the fifth byte carries the
//! two least significant bits of each, in increasing pixel order from bit 0.
//! A row occupies `ceil(width * 10 / 8)` bytes and the next row starts on the
//! next byte, so groups never straddle a row boundary.

use crate::capture_pipeline::common::error::{CaptureError, Result};
use crate::capture_pipeline::raw::types::{DecodedFrame, PackedFrame};

/// Packed bytes per row: 10 bits per pixel, rounded up to whole bytes.
pub fn packed_row_stride(width: u32) -> usize {
    (width as usize * 10).div_ceil(8)
}

/// Unpacks a single-plane RAW10 frame into one `u16` sample per pixel.
///
/// The output always holds exactly `width * height` samples with the top six
/// bits clear. When the width is not a multiple of four the final group of a
/// row is still read as a full five-byte quintet (clamped at the end of the
/// buffer, missing bytes as zero) and the surplus samples are discarded.
pub fn unpack_raw10(frame: &PackedFrame) -> Result<DecodedFrame> {
    if frame.planes != 1 {
        return Err(CaptureError::InvalidLayout(frame.planes));
    }

    let width = frame.width as usize;
    let height = frame.height as usize;
    let stride = packed_row_stride(frame.width);
    let needed = stride * height;
    if frame.data.len() < needed {
        return Err(CaptureError::SizeMismatch(needed, frame.data.len()));
    }

    let mut samples = Vec::with_capacity(width * height);
    for row in 0..height {
        let base = row * stride;
        let mut x = 0;
        while x < width {
            let group = base + (x / 4) * 5;
            let end = frame.data.len().min(group + 5);
            let mut quintet = [0u8; 5];
            quintet[..end - group].copy_from_slice(&frame.data[group..end]);

            let take = (width - x).min(4);
            for (i, &msb) in quintet[..take].iter().enumerate() {
                let lsb = (quintet[4] >> (2 * i)) & 0x3;
                samples.push(msb as u16 | ((lsb as u16) << 8));
            }
            x += 4;
        }
    }

    Ok(DecodedFrame {
        width: frame.width,
        height: frame.height,
        samples,
    })
}

/// Packs samples back into the RAW10 byte layout.
///
/// Exact inverse of [`unpack_raw10`] for widths that are a multiple of four.
/// For other widths the bytes that fall past the nominal row stride are
/// dropped, mirroring what the unpacker can recover there. Samples are masked
/// to their low 10 bits.
pub fn pack_raw10(samples: &[u16], width: u32, height: u32) -> Vec<u8> {
    let width = width as usize;
    let height = height as usize;
    debug_assert_eq!(samples.len(), width * height);

    let stride = packed_row_stride(width as u32);
    let mut packed = vec![0u8; stride * height];
    for row in 0..height {
        let base = row * stride;
        let row_end = base + stride;
        let mut x = 0;
        while x < width {
            let group = base + (x / 4) * 5;
            let take = (width - x).min(4);
            let mut lsbs = 0u8;
            for i in 0..take {
                let sample = samples[row * width + x + i] & 0x3FF;
                if group + i < row_end {
                    packed[group + i] = (sample & 0xFF) as u8;
                }
                lsbs |= ((sample >> 8) as u8) << (2 * i);
            }
            if group + 4 < row_end {
                packed[group + 4] = lsbs;
            }
            x += 4;
        }
    }
    packed
}
