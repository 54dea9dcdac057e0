//! Per-scene point cloud buffer bundle.
//!
//! A `PointCloud` owns the immutable GPU-side source data for one scene:
//! the raw 3D Gaussian parameters and the spherical-harmonic color
//! coefficients. The renderer only ever reads these buffers; their content
//! is owned by whatever loaded the scene.

use crate::core::Gaussian;
use crate::gpu::{buffers, GaussianPod, RenderError, RenderResult, ShCoeffsPod};
use bytemuck::Zeroable;
use wgpu::{Buffer, BufferUsages, Device};

/// Immutable GPU buffers for one Gaussian cloud.
///
/// Buffer sizes are fixed at creation; rendering a different point count
/// means building a new `PointCloud` and a new renderer.
pub struct PointCloud {
    num_points: u32,
    gaussian_buffer: Buffer,
    sh_buffer: Buffer,
}

impl PointCloud {
    /// Upload a CPU-side Gaussian cloud.
    ///
    /// An empty cloud still allocates one record per buffer so bind groups
    /// built against it remain valid; the renderer dispatches zero work for
    /// it.
    pub fn upload(device: &Device, gaussians: &[Gaussian]) -> Self {
        let mut pods: Vec<GaussianPod> = gaussians.iter().map(GaussianPod::from_gaussian).collect();
        let mut sh: Vec<ShCoeffsPod> = gaussians.iter().map(ShCoeffsPod::from_gaussian).collect();
        if pods.is_empty() {
            pods.push(GaussianPod::zeroed());
            sh.push(ShCoeffsPod::zeroed());
        }

        let gaussian_buffer =
            buffers::create_buffer_init(device, "gaussian 3d buffer", &pods, BufferUsages::STORAGE);
        let sh_buffer =
            buffers::create_buffer_init(device, "sh coefficients buffer", &sh, BufferUsages::STORAGE);

        log::debug!(
            "uploaded point cloud: {} points, {} B geometry, {} B sh",
            gaussians.len(),
            gaussian_buffer.size(),
            sh_buffer.size()
        );

        Self {
            num_points: gaussians.len() as u32,
            gaussian_buffer,
            sh_buffer,
        }
    }

    /// Wrap loader-owned buffers without copying.
    ///
    /// The buffers must follow the `GaussianPod`/`ShCoeffsPod` layout and
    /// hold at least `num_points` records each (at least one when
    /// `num_points` is zero).
    pub fn from_buffers(
        num_points: u32,
        gaussian_buffer: Buffer,
        sh_buffer: Buffer,
    ) -> RenderResult<Self> {
        let min_records = num_points.max(1) as u64;
        if gaussian_buffer.size() < min_records * std::mem::size_of::<GaussianPod>() as u64 {
            return Err(RenderError::InvalidState(format!(
                "gaussian buffer holds {} bytes, {} points need {}",
                gaussian_buffer.size(),
                num_points,
                min_records * std::mem::size_of::<GaussianPod>() as u64
            )));
        }
        if sh_buffer.size() < min_records * std::mem::size_of::<ShCoeffsPod>() as u64 {
            return Err(RenderError::InvalidState(format!(
                "sh buffer holds {} bytes, {} points need {}",
                sh_buffer.size(),
                num_points,
                min_records * std::mem::size_of::<ShCoeffsPod>() as u64
            )));
        }
        Ok(Self {
            num_points,
            gaussian_buffer,
            sh_buffer,
        })
    }

    pub fn num_points(&self) -> u32 {
        self.num_points
    }

    pub fn gaussian_buffer(&self) -> &Buffer {
        &self.gaussian_buffer
    }

    pub fn sh_buffer(&self) -> &Buffer {
        &self.sh_buffer
    }
}
