//! 3D Gaussian splat representation.
//!
//! A Gaussian is parameterized by:
//! - Position (mean)
//! - Scale (log-space: exp(scale) gives the actual extent)
//! - Rotation (unit quaternion)
//! - Opacity (logit-space: sigmoid(opacity) gives the actual opacity)
//! - Spherical harmonics coefficients (view-dependent color)

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// A single 3D Gaussian primitive.
///
/// The covariance is stored factorized as scale + rotation:
/// Σ = R · S · S^T · R^T where S = diag(exp(scale))
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Gaussian {
    /// Position (mean) in world space
    pub position: Vector3<f32>,

    /// Log-space scale (actual scale = exp(scale))
    pub scale: Vector3<f32>,

    /// Rotation as unit quaternion
    pub rotation: UnitQuaternion<f32>,

    /// Opacity in logit-space (actual opacity = sigmoid(opacity))
    pub opacity: f32,

    /// Spherical harmonics coefficients for view-dependent color,
    /// [RGB × 16 coefficients] for degree-3 SH. Index 0 is the DC term.
    pub sh_coeffs: [[f32; 3]; 16],
}

impl Gaussian {
    pub fn new(
        position: Vector3<f32>,
        scale: Vector3<f32>,
        rotation: UnitQuaternion<f32>,
        opacity: f32,
        sh_coeffs: [[f32; 3]; 16],
    ) -> Self {
        Self {
            position,
            scale,
            rotation,
            opacity,
            sh_coeffs,
        }
    }

    /// An isotropic Gaussian with a constant (DC-only) color.
    ///
    /// Convenient for tests and synthetic scenes: `color` is linear RGB in
    /// [0, 1], converted to the DC SH coefficient internally.
    pub fn isotropic(
        position: Vector3<f32>,
        log_scale: f32,
        opacity: f32,
        color: Vector3<f32>,
    ) -> Self {
        // Y_0^0 normalization constant; dividing bakes the color into the DC band.
        const SH_C0: f32 = 0.282_094_79;
        let mut sh_coeffs = [[0.0f32; 3]; 16];
        sh_coeffs[0] = [color.x / SH_C0, color.y / SH_C0, color.z / SH_C0];
        Self::new(
            position,
            Vector3::new(log_scale, log_scale, log_scale),
            UnitQuaternion::identity(),
            opacity,
            sh_coeffs,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isotropic_bakes_dc_color() {
        let g = Gaussian::isotropic(
            Vector3::new(0.0, 0.0, 5.0),
            -2.0,
            1.0,
            Vector3::new(0.5, 0.25, 0.125),
        );
        // Evaluating only the DC band must give back the input color.
        const SH_C0: f32 = 0.282_094_79;
        assert!((g.sh_coeffs[0][0] * SH_C0 - 0.5).abs() < 1e-6);
        assert!((g.sh_coeffs[0][1] * SH_C0 - 0.25).abs() < 1e-6);
        // Higher bands stay zero.
        assert_eq!(g.sh_coeffs[1], [0.0; 3]);
    }
}
