//! Error taxonomy for GPU renderer construction and frame recording.
//!
//! All errors surface synchronously at the call that caused them. None are
//! recoverable mid-frame: a failed construction leaves no partially wired
//! renderer behind, and a failed frame invalidates that frame's output.

use thiserror::Error;

/// Errors produced by the GPU rendering pipeline.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no suitable GPU adapter found")]
    AdapterNotFound,

    #[error("device request failed: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("allocation of {size} bytes for {label} exceeds device limit of {limit} bytes")]
    Allocation {
        label: &'static str,
        size: u64,
        limit: u64,
    },

    #[error("shader or pipeline validation failed: {0}")]
    Validation(String),

    #[error("out of GPU memory: {0}")]
    OutOfMemory(String),

    #[error("invalid state: {0}")]
    InvalidState(String),
}

/// Result type alias for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;
