//! Core data structures.
//!
//! Fundamental CPU-side types:
//! - `Gaussian`: 3D Gaussian splat parameters
//! - `Camera`: pinhole camera with view/projection matrix construction
//!
//! All types here are "pure data" - no wgpu, no rendering logic.

mod camera;
mod gaussian;

pub use camera::Camera;
pub use gaussian::Gaussian;

/// Numerically stable logistic sigmoid.
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigmoid_midpoint_and_saturation() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(10.0) > 0.999);
        assert!(sigmoid(-10.0) < 0.001);
    }
}
