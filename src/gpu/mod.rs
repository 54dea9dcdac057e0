//! GPU rendering pipeline built on wgpu.
//!
//! Architecture:
//! - `context` - wgpu device/queue initialization
//! - `error` - error taxonomy for construction and recording
//! - `buffers` - buffer creation and staging readback
//! - `types` - Pod records shared with the WGSL shader stages
//! - `point_cloud` - per-scene Gaussian/SH buffer bundle
//! - `sort` - sort buffer contract + pluggable sorter capability
//! - `renderer` - resource binding and per-frame orchestration

mod buffers;
mod context;
mod error;
mod point_cloud;
mod renderer;
mod sort;
mod types;

pub use buffers::{create_buffer, create_buffer_init, read_buffer, read_buffer_blocking};
pub use context::GpuContext;
pub use error::{RenderError, RenderResult};
pub use point_cloud::PointCloud;
pub use renderer::{GaussianRenderer, PREPROCESS_WORKGROUP_SIZE, SPLAT_STRIDE, VERTICES_PER_SPLAT};
pub use sort::{GpuSorter, IdentitySorter, SortBuffers, SORT_KEYS_PER_WORKGROUP};
pub use types::{
    CameraUniforms, DispatchIndirect, GaussianPod, RenderSettings, ShCoeffsPod, SortInfos, Splat,
};
