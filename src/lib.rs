//! # splatframe: frame-orchestrated 3D Gaussian splat rendering
//!
//! This crate renders a cloud of 3D Gaussian splats into a 2D color target
//! with correct back-to-front alpha blending. The hard part is keeping a
//! consistent draw order for transparent, overlapping quads whose depth
//! changes every frame: each frame records a GPU sort, a projection compute
//! pass, and an instanced draw into a single command encoder with no
//! CPU-side synchronization.
//!
//! ## Architecture
//!
//! - `core`: pure CPU data (Gaussians, cameras) - no wgpu types
//! - `gpu`: everything GPU-side
//!   - `context` - wgpu device/queue initialization
//!   - `buffers` - buffer creation and staging readback
//!   - `types` - `#[repr(C)]` records shared with the WGSL shaders
//!   - `point_cloud` - the immutable per-scene buffer bundle
//!   - `sort` - sort buffer contract and the pluggable sorter capability
//!   - `renderer` - resource binding and per-frame orchestration
//!
//! ## Frame protocol
//!
//! `GaussianRenderer::frame` records, in order: sorter (consumes the
//! *previous* frame's depth keys), preprocess (writes splats and fresh
//! keys), render (draws in the order step 1 produced). Depth ordering
//! therefore lags projection by exactly one frame; for a static camera the
//! output is stable from the second frame onward.

pub mod core;
pub mod gpu;

pub use crate::core::{Camera, Gaussian};
pub use gpu::{
    GaussianRenderer, GpuContext, GpuSorter, IdentitySorter, PointCloud, RenderError,
    RenderResult, SortBuffers,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
