//! Camera model (pinhole camera with intrinsics and extrinsics).
//!
//! Conventions match COLMAP-style reconstructions: the extrinsics transform
//! world to camera space with +z looking forward and +y down in the image.
//! The projection matrix maps camera space to wgpu clip space (z in [0, 1]).

use nalgebra::{Matrix3, Matrix4, Vector3};
use serde::{Deserialize, Serialize};

/// Near plane used by the projection matrix.
pub const ZNEAR: f32 = 0.01;
/// Far plane used by the projection matrix.
pub const ZFAR: f32 = 1000.0;

/// A pinhole camera with intrinsic and extrinsic parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Camera {
    /// Focal length in X (pixels)
    pub fx: f32,

    /// Focal length in Y (pixels)
    pub fy: f32,

    /// Principal point X (pixels)
    pub cx: f32,

    /// Principal point Y (pixels)
    pub cy: f32,

    /// Image width (pixels)
    pub width: u32,

    /// Image height (pixels)
    pub height: u32,

    /// Rotation from world to camera coordinates
    pub rotation: Matrix3<f32>,

    /// Translation from world to camera coordinates
    pub translation: Vector3<f32>,
}

impl Camera {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        fx: f32,
        fy: f32,
        cx: f32,
        cy: f32,
        width: u32,
        height: u32,
        rotation: Matrix3<f32>,
        translation: Vector3<f32>,
    ) -> Self {
        Self {
            fx,
            fy,
            cx,
            cy,
            width,
            height,
            rotation,
            translation,
        }
    }

    /// A camera at the world origin looking down +z, principal point centered.
    pub fn identity(fx: f32, fy: f32, width: u32, height: u32) -> Self {
        Self::new(
            fx,
            fy,
            width as f32 / 2.0,
            height as f32 / 2.0,
            width,
            height,
            Matrix3::identity(),
            Vector3::zeros(),
        )
    }

    /// World-to-camera transform as a homogeneous matrix.
    pub fn view_matrix(&self) -> Matrix4<f32> {
        let r = self.rotation;
        let t = self.translation;
        #[rustfmt::skip]
        let view = Matrix4::new(
            r[(0, 0)], r[(0, 1)], r[(0, 2)], t.x,
            r[(1, 0)], r[(1, 1)], r[(1, 2)], t.y,
            r[(2, 0)], r[(2, 1)], r[(2, 2)], t.z,
            0.0,       0.0,       0.0,       1.0,
        );
        view
    }

    /// Camera-to-clip transform for a +z-forward camera.
    ///
    /// Derived from the pinhole intrinsics so the projected NDC position
    /// agrees pixel-for-pixel with `fx/fy/cx/cy`; depth maps to [0, 1] as
    /// wgpu expects, and image-space y (down) flips to NDC y (up).
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        let w = self.width as f32;
        let h = self.height as f32;
        let z_range = ZFAR - ZNEAR;
        #[rustfmt::skip]
        let proj = Matrix4::new(
            2.0 * self.fx / w, 0.0,                (2.0 * self.cx - w) / w,    0.0,
            0.0,               -2.0 * self.fy / h, -(2.0 * self.cy - h) / h,   0.0,
            0.0,               0.0,                ZFAR / z_range,             -ZFAR * ZNEAR / z_range,
            0.0,               0.0,                1.0,                        0.0,
        );
        proj
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector4;

    fn project(camera: &Camera, world: Vector3<f32>) -> Vector3<f32> {
        let clip = camera.projection_matrix()
            * camera.view_matrix()
            * Vector4::new(world.x, world.y, world.z, 1.0);
        Vector3::new(clip.x / clip.w, clip.y / clip.w, clip.z / clip.w)
    }

    #[test]
    fn identity_camera_centers_optical_axis() {
        let camera = Camera::identity(100.0, 100.0, 64, 64);
        let ndc = project(&camera, Vector3::new(0.0, 0.0, 5.0));
        assert_relative_eq!(ndc.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(ndc.y, 0.0, epsilon = 1e-6);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn image_y_down_flips_to_ndc_y_up() {
        let camera = Camera::identity(100.0, 100.0, 64, 64);
        // +y in camera space is down in the image, so it must project below center.
        let ndc = project(&camera, Vector3::new(0.0, 1.0, 5.0));
        assert!(ndc.y < 0.0);
        let ndc = project(&camera, Vector3::new(1.0, 0.0, 5.0));
        assert!(ndc.x > 0.0);
    }

    #[test]
    fn depth_increases_monotonically_in_ndc() {
        let camera = Camera::identity(100.0, 100.0, 64, 64);
        let near = project(&camera, Vector3::new(0.0, 0.0, 1.0));
        let far = project(&camera, Vector3::new(0.0, 0.0, 100.0));
        assert!(near.z < far.z);
        assert!(far.z <= 1.0);
    }

    #[test]
    fn view_matrix_applies_rotation_then_translation() {
        let rotation = Matrix3::identity();
        let camera = Camera::new(
            50.0,
            50.0,
            32.0,
            32.0,
            64,
            64,
            rotation,
            Vector3::new(0.0, 0.0, 3.0),
        );
        let v = camera.view_matrix() * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(v.z, 3.0, epsilon = 1e-6);
    }
}
