//! GPU-side record layouts shared with the WGSL shader stages.
//!
//! Every struct here is uploaded to (or written by) a GPU buffer, so each
//! one is `#[repr(C)]` bytemuck Pod with explicit padding to WGSL alignment
//! rules. The layouts form a fixed schema with `preprocess.wgsl` and
//! `gaussian.wgsl`: changing any field is a coordinated bump of both sides.

use crate::core::{Camera, Gaussian};

/// GPU representation of a 3D Gaussian (64 bytes).
///
/// Matches `struct Gaussian` in `preprocess.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GaussianPod {
    /// World-space position (x, y, z, pad)
    pub position: [f32; 4],

    /// Log-space scale (x, y, z, pad)
    pub log_scale: [f32; 4],

    /// Rotation quaternion (x, y, z, w)
    pub rotation: [f32; 4],

    /// Logit-space opacity in x, rest padding
    pub opacity: [f32; 4],
}

impl GaussianPod {
    pub fn from_gaussian(g: &Gaussian) -> Self {
        Self {
            position: [g.position.x, g.position.y, g.position.z, 0.0],
            log_scale: [g.scale.x, g.scale.y, g.scale.z, 0.0],
            rotation: [g.rotation.i, g.rotation.j, g.rotation.k, g.rotation.w],
            opacity: [g.opacity, 0.0, 0.0, 0.0],
        }
    }
}

/// Spherical-harmonic color coefficients for one point (256 bytes).
///
/// 16 RGB triplets padded to vec4, degree-3 SH. Lives in its own buffer so
/// loaders can stream colors independently of geometry.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShCoeffsPod {
    pub coeffs: [[f32; 4]; 16],
}

impl ShCoeffsPod {
    pub fn from_gaussian(g: &Gaussian) -> Self {
        let mut coeffs = [[0.0f32; 4]; 16];
        for (dst, src) in coeffs.iter_mut().zip(g.sh_coeffs.iter()) {
            dst[0] = src[0];
            dst[1] = src[1];
            dst[2] = src[2];
        }
        Self { coeffs }
    }
}

/// One screen-space splat record (48 bytes), written by the preprocess pass
/// every frame and consumed by the vertex stage. Never read by the CPU.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Splat {
    /// View-dependent color, alpha = opacity
    pub color: [f32; 4],

    /// Center in NDC
    pub center: [f32; 2],

    /// Major 1-sigma eigen-axis of the 2D covariance, in NDC
    pub axis_major: [f32; 2],

    /// Minor 1-sigma eigen-axis, in NDC
    pub axis_minor: [f32; 2],

    /// View-space depth (also encoded into the sort key)
    pub depth: f32,

    pub _pad: f32,
}

/// Camera uniforms consumed by both the preprocess and render stages.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniforms {
    /// World-to-camera transform (column-major, as WGSL expects)
    pub view: [[f32; 4]; 4],

    /// Camera-to-world transform
    pub view_inv: [[f32; 4]; 4],

    /// Camera-to-clip transform
    pub proj: [[f32; 4]; 4],

    /// Clip-to-camera transform
    pub proj_inv: [[f32; 4]; 4],

    /// Viewport size in pixels
    pub viewport: [f32; 2],

    /// Focal lengths in pixels
    pub focal: [f32; 2],
}

impl CameraUniforms {
    pub fn from_camera(camera: &Camera) -> Self {
        let view = camera.view_matrix();
        let proj = camera.projection_matrix();
        let view_inv = view.try_inverse().unwrap_or_else(nalgebra::Matrix4::identity);
        let proj_inv = proj.try_inverse().unwrap_or_else(nalgebra::Matrix4::identity);
        Self {
            // nalgebra stores column-major, same as WGSL mat4x4.
            view: view.data.0,
            view_inv: view_inv.data.0,
            proj: proj.data.0,
            proj_inv: proj_inv.data.0,
            viewport: [camera.width as f32, camera.height as f32],
            focal: [camera.fx, camera.fy],
        }
    }
}

/// Shading settings uniform (16 bytes).
///
/// Carries the runtime-tunable intensity multiplier together with the live
/// point count. The count is an explicit input to the preprocess pass
/// because loader-supplied buffers may hold more records than the cloud,
/// so `arrayLength` over-reports. The multiplier accepts any finite value
/// and is forwarded to the shader unvalidated.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RenderSettings {
    /// Global intensity multiplier applied to the SH-evaluated color.
    pub gaussian_multiplier: f32,
    /// Number of live points; fixed for the renderer's lifetime.
    pub num_points: u32,
    pub _pad: [u32; 2],
}

impl RenderSettings {
    pub fn new(num_points: u32) -> Self {
        Self {
            gaussian_multiplier: 1.0,
            num_points,
            _pad: [0; 2],
        }
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Sort control block consumed by the external sorter (20 bytes).
///
/// `keys_size` is an atomic on the shader side; the preprocess pass writes
/// the live key count there each frame.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SortInfos {
    pub keys_size: u32,
    pub padded_size: u32,
    pub passes: u32,
    pub even_pass: u32,
    pub odd_pass: u32,
}

/// GPU-resident workgroup counts for the sorter's indirect dispatches
/// (12 bytes, the wgpu `dispatch_workgroups_indirect` wire format).
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DispatchIndirect {
    pub dispatch_x: u32,
    pub dispatch_y: u32,
    pub dispatch_z: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{UnitQuaternion, Vector3};
    use std::mem::size_of;

    #[test]
    fn record_sizes_match_shader_schema() {
        // These sizes are a hard contract with the WGSL structs; a mismatch
        // here corrupts every downstream buffer.
        assert_eq!(size_of::<GaussianPod>(), 64);
        assert_eq!(size_of::<ShCoeffsPod>(), 256);
        assert_eq!(size_of::<Splat>(), 48);
        assert_eq!(size_of::<CameraUniforms>(), 272);
        assert_eq!(size_of::<RenderSettings>(), 16);
        assert_eq!(size_of::<SortInfos>(), 20);
        assert_eq!(size_of::<DispatchIndirect>(), 12);
    }

    #[test]
    fn storage_records_are_16_byte_aligned() {
        assert_eq!(size_of::<GaussianPod>() % 16, 0);
        assert_eq!(size_of::<ShCoeffsPod>() % 16, 0);
        assert_eq!(size_of::<Splat>() % 16, 0);
        assert_eq!(size_of::<CameraUniforms>() % 16, 0);
    }

    #[test]
    fn gaussian_pod_conversion_preserves_data() {
        let g = Gaussian::new(
            Vector3::new(1.0, 2.0, 3.0),
            Vector3::new(-0.1, -0.2, -0.3),
            UnitQuaternion::identity(),
            -1.5,
            [[0.5; 3]; 16],
        );

        let pod = GaussianPod::from_gaussian(&g);
        assert_eq!(pod.position[..3], [1.0, 2.0, 3.0]);
        assert_eq!(pod.log_scale[1], -0.2);
        // Identity quaternion is (x, y, z, w) = (0, 0, 0, 1).
        assert_eq!(pod.rotation, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(pod.opacity[0], -1.5);

        let sh = ShCoeffsPod::from_gaussian(&g);
        assert_eq!(sh.coeffs[0][..3], [0.5, 0.5, 0.5]);
        assert_eq!(sh.coeffs[0][3], 0.0);
    }

    #[test]
    fn camera_uniforms_roundtrip_inverse() {
        let camera = Camera::identity(100.0, 100.0, 64, 48);
        let u = CameraUniforms::from_camera(&camera);
        assert_eq!(u.viewport, [64.0, 48.0]);
        assert_eq!(u.focal, [100.0, 100.0]);

        // view * view_inv must be identity for a well-formed camera.
        let view = nalgebra::Matrix4::from(u.view);
        let view_inv = nalgebra::Matrix4::from(u.view_inv);
        let id = view * view_inv;
        for i in 0..4 {
            for j in 0..4 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((id[(i, j)] - expected).abs() < 1e-5);
            }
        }
    }
}
