//! Frame buffer types

/// A borrowed view of one mapped capture buffer holding a packed RAW10 frame.
///
/// The buffer itself stays owned by the pool slot it came from; this view
/// only lives for the duration of a decode.
#[derive(Debug, Clone, Copy)]
pub struct PackedFrame<'a> {
    /// Packed pixel data for the whole frame
    pub data: &'a [u8],
    /// Number of planes the buffer carries (RAW10 is always single-plane)
    pub planes: usize,
    /// Width of the frame in pixels
    pub width: u32,
    /// Height of the frame in pixels
    pub height: u32,
}

/// A frame unpacked to one sample per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    /// Width of the frame in pixels
    pub width: u32,
    /// Height of the frame in pixels
    pub height: u32,
    /// Row-major samples, one per pixel, values in `0..=1023`
    pub samples: Vec<u16>,
}
