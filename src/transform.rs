//! Per-frame model transform.
//!
//! The cubes spin about all three axes at fixed angular velocities. Each frame
//! the three axis rotations are rebuilt from the elapsed application time and
//! multiplied into one model matrix, in the order X, Y, Z.

use cgmath::{Matrix4, SquareMatrix};

/// Angular velocities in radians per second, by axis.
const X_VELOCITY: f64 = -0.25;
const Y_VELOCITY: f64 = 0.5;
const Z_VELOCITY: f64 = 1.5;

/// Angular velocity of the shared instance scale oscillation.
const SCALE_VELOCITY: f64 = 0.45;
/// Peak of the shared instance scale oscillation.
const SCALE_AMPLITUDE: f64 = 0.6;

/// The composed model matrix followed by the three axis rotations it was
/// built from. Updated in place every frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformSet {
    matrices: [Matrix4<f32>; 4],
}

impl TransformSet {
    const RESULT: usize = 0;
    const ROT_X: usize = 1;
    const ROT_Y: usize = 2;
    const ROT_Z: usize = 3;

    /// All four matrices start as identity.
    pub fn new() -> Self {
        Self {
            matrices: [Matrix4::identity(); 4],
        }
    }

    /// Rebuilds the rotations for `seconds` of elapsed time and composes
    /// `result = (rot_x * rot_y) * rot_z`.
    pub fn update(&mut self, seconds: f64) {
        let (xs, xc) = sin_cos(seconds * X_VELOCITY);
        let (ys, yc) = sin_cos(seconds * Y_VELOCITY);
        let (zs, zc) = sin_cos(seconds * Z_VELOCITY);

        // Constructors take columns, matching the layout the shader receives.
        self.matrices[Self::ROT_X] = Matrix4::new(
            1.0, 0.0, 0.0, 0.0, //
            0.0, xc, -xs, 0.0, //
            0.0, xs, xc, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        );
        self.matrices[Self::ROT_Y] = Matrix4::new(
            yc, 0.0, ys, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            -ys, 0.0, yc, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        );
        self.matrices[Self::ROT_Z] = Matrix4::new(
            zc, -zs, 0.0, 0.0, //
            zs, zc, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        );
        self.matrices[Self::RESULT] =
            self.matrices[Self::ROT_X] * self.matrices[Self::ROT_Y] * self.matrices[Self::ROT_Z];
    }

    /// The composed model matrix.
    pub fn model(&self) -> &Matrix4<f32> {
        &self.matrices[Self::RESULT]
    }

    /// The model matrix as sixteen floats, column after column.
    pub fn model_columns(&self) -> [[f32; 4]; 4] {
        (*self.model()).into()
    }

    pub fn rotations(&self) -> [&Matrix4<f32>; 3] {
        [
            &self.matrices[Self::ROT_X],
            &self.matrices[Self::ROT_Y],
            &self.matrices[Self::ROT_Z],
        ]
    }
}

impl Default for TransformSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Scale shared by every cube instance at `seconds`: `sin(t * 0.45) * 0.6`.
pub fn scale_at(seconds: f64) -> f32 {
    ((seconds * SCALE_VELOCITY).sin() * SCALE_AMPLITUDE) as f32
}

fn sin_cos(angle: f64) -> (f32, f32) {
    let (s, c) = angle.sin_cos();
    (s as f32, c as f32)
}
