//! Math utilities and types
//!
//! Provides the fundamental math types used by the camera, the render items and
//! the per-frame constant buffers.
//!
//! # Conventions
//! nalgebra multiplies column vectors (`M * v`), so translations live in the
//! last column of a 4x4 matrix. View space is left-handed: the camera looks
//! down +Z, +Y is up and +X is right. Projection maps depth into `[0, 1]`.

pub use nalgebra::{Matrix3, Matrix4, Rotation3, Unit, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Transform representing position, uniform-or-not scale and a yaw rotation
///
/// Render items only need scale/rotate/translate placement, so the rotation is
/// kept as an angle about world +Y instead of a full quaternion.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position in world space
    pub position: Vec3,

    /// Rotation about world +Y in radians
    pub yaw: f32,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            yaw: 0.0,
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Set a uniform scale
    #[must_use]
    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::new(scale, scale, scale);
        self
    }

    /// Set the rotation about world +Y
    #[must_use]
    pub fn with_yaw(mut self, yaw: f32) -> Self {
        self.yaw = yaw;
        self
    }

    /// Convert to a world matrix: scale, then rotate, then translate
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * Mat4::rotation_y(self.yaw)
            * Mat4::new_nonuniform_scaling(&self.scale)
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Pi / 4, the default vertical field of view
    pub const QUARTER_PI: f32 = PI * 0.25;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Convert radians to degrees
    pub fn rad_to_deg(radians: f32) -> f32 {
        radians * constants::RAD_TO_DEG
    }
}

/// Extension trait for Mat4 with additional convenience methods
pub trait Mat4Ext {
    /// Create a rotation matrix around the Y axis
    fn rotation_y(angle: f32) -> Mat4;

    /// Create a rotation matrix around an arbitrary axis (normalized internally)
    fn rotation_axis(axis: &Vec3, angle: f32) -> Mat4;

    /// Create a left-handed perspective projection matrix with depth in `[0, 1]`
    fn perspective_lh(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Rows of the matrix as plain arrays, the layout constant buffers use
    fn to_rows(&self) -> [[f32; 4]; 4];
}

impl Mat4Ext for Mat4 {
    fn rotation_y(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::y_axis(), angle)
    }

    fn rotation_axis(axis: &Vec3, angle: f32) -> Mat4 {
        Rotation3::from_axis_angle(&Unit::new_normalize(*axis), angle).to_homogeneous()
    }

    fn perspective_lh(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let tan_half_fovy = (fov_y * 0.5).tan();
        let mut result = Mat4::zeros();

        // [1/(a·tan(φ/2))  0            0          0        ]
        // [0               1/tan(φ/2)   0          0        ]
        // [0               0            f/(f-n)   -nf/(f-n) ]
        // [0               0            1          0        ]
        result[(0, 0)] = 1.0 / (aspect * tan_half_fovy);
        result[(1, 1)] = 1.0 / tan_half_fovy;
        result[(2, 2)] = far / (far - near);
        result[(2, 3)] = -(near * far) / (far - near);
        result[(3, 2)] = 1.0;

        result
    }

    fn to_rows(&self) -> [[f32; 4]; 4] {
        let mut rows = [[0.0; 4]; 4];
        for (r, row) in rows.iter_mut().enumerate() {
            for (c, value) in row.iter_mut().enumerate() {
                *value = self[(r, c)];
            }
        }
        rows
    }
}
