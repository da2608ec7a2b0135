//! RAW10 capture pipeline: packed Bayer unpacking, minimal single-strip
//! DNG writing, and a bounded buffer-pool capture loop.

pub mod capture_pipeline;
pub mod logger;
