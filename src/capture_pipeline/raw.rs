//! Packed RAW frame handling
//!
//! This module provides the RAW10 unpacking primitives and the frame types
//! they operate on.

mod unpack;
pub mod types;

pub use types::{DecodedFrame, PackedFrame};
pub use unpack::{pack_raw10, packed_row_stride, unpack_raw10};
