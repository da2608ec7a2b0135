//! Common utilities module
//!
//! This module contains shared types used across the capture pipeline.

pub mod error;

pub use error::{CaptureError, Result};
