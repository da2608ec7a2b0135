//! Capture lifecycle module
//!
//! This module owns the buffer pool state machine: a capture source fills
//! a fixed set of buffers, the manager decodes and persists them one at a
//! time and hands each buffer straight back.

mod config;
mod manager;
mod slots;
mod source;
mod synthetic;


pub use config::{CaptureConfig, CaptureConfigBuilder};
pub use manager::{CaptureManager, CaptureReport};
pub use slots::{BufferSlot, SlotState};
pub use source::{
    BufferHandle, CaptureControls, CaptureSource, Completion, CompletionStatus, PoolBuffer,
};
pub use synthetic::SyntheticSource;
