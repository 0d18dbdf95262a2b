//! # First-Person Camera
//!
//! A camera described by a position and an explicit right/up/look basis,
//! driven by walk/strafe/pitch/yaw mutators and turned into a view matrix on
//! demand.
//!
//! ## Design Principles
//! - **Explicit view state**: mutators move the camera into [`ViewState::Stale`];
//!   [`Camera::update_view`] is the only transition back to [`ViewState::Clean`]
//! - **Pure core**: [`Camera::compute_view`] derives the basis and matrix
//!   without touching the camera, which keeps the math testable
//! - **Eager projection**: [`Camera::set_frustum`] rebuilds the projection
//!   immediately; it is never recomputed lazily
//!
//! # Coordinate System
//! Left-handed view space:
//! - X+ = Right
//! - Y+ = Up
//! - Z+ = Look (into the screen)
//!
//! Matrices follow nalgebra's column-vector convention, so the view
//! translation occupies the last column.

use crate::foundation::math::{constants, Mat4, Mat4Ext, Vec3};

/// Whether the cached view matrix reflects the current position and basis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    /// Cached view matrix is current
    Clean,
    /// Position or basis changed since the last [`Camera::update_view`]
    Stale,
}

/// Orthonormal camera basis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraBasis {
    /// Right vector (view-space +X)
    pub right: Vec3,
    /// Up vector (view-space +Y)
    pub up: Vec3,
    /// Look vector (view-space +Z)
    pub look: Vec3,
}

impl CameraBasis {
    /// Re-orthonormalize an arbitrary, slightly drifted basis
    ///
    /// Look is normalized first and treated as authoritative; up is rebuilt
    /// from look and right, then right from up and look. The result is
    /// orthonormal regardless of accumulated rotation error.
    pub fn orthonormalized(&self) -> Self {
        let look = self.look.normalize();
        let up = look.cross(&self.right).normalize();
        let right = up.cross(&look);
        Self { right, up, look }
    }
}

impl Default for CameraBasis {
    fn default() -> Self {
        Self {
            right: Vec3::x(),
            up: Vec3::y(),
            look: Vec3::z(),
        }
    }
}

/// First-person perspective camera
///
/// # Example
/// ```rust
/// use mini_engine::render::primitives::Camera;
///
/// let mut camera = Camera::new();
/// camera.set_position(0.0, 5.0, -30.0);
/// camera.set_frustum(0.25 * std::f32::consts::PI, 16.0 / 9.0, 1.0, 1000.0);
/// camera.walk(2.0);
/// camera.update_view();
/// assert_eq!(camera.position().z, -28.0);
/// ```
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    basis: CameraBasis,

    near_z: f32,
    far_z: f32,
    aspect: f32,
    fov_y: f32,
    near_window_height: f32,
    far_window_height: f32,

    view: Mat4,
    proj: Mat4,
    view_state: ViewState,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera {
    /// Create a camera at the origin looking down +Z
    ///
    /// The frustum defaults to a 45 degree vertical field of view, square
    /// aspect and a `[1, 1000]` depth range. The view starts stale.
    pub fn new() -> Self {
        let mut camera = Self {
            position: Vec3::zeros(),
            basis: CameraBasis::default(),
            near_z: 0.0,
            far_z: 0.0,
            aspect: 0.0,
            fov_y: 0.0,
            near_window_height: 0.0,
            far_window_height: 0.0,
            view: Mat4::identity(),
            proj: Mat4::identity(),
            view_state: ViewState::Stale,
        };
        camera.set_frustum(constants::QUARTER_PI, 1.0, 1.0, 1000.0);
        camera
    }

    /// Replace the camera position
    pub fn set_position(&mut self, x: f32, y: f32, z: f32) {
        self.position = Vec3::new(x, y, z);
        self.view_state = ViewState::Stale;
        log::trace!("Camera position set to {:?}", self.position);
    }

    /// Set the perspective frustum and rebuild the projection matrix
    ///
    /// Requires `0 < near < far` and `fov_y` in `(0, π)`. Nothing is
    /// validated; other inputs produce a degenerate matrix.
    pub fn set_frustum(&mut self, fov_y: f32, aspect: f32, near: f32, far: f32) {
        self.fov_y = fov_y;
        self.aspect = aspect;
        self.near_z = near;
        self.far_z = far;

        let tan_half_fov = (0.5 * fov_y).tan();
        self.near_window_height = 2.0 * near * tan_half_fov;
        self.far_window_height = 2.0 * far * tan_half_fov;

        self.proj = Mat4::perspective_lh(fov_y, aspect, near, far);
    }

    /// Camera position in world space
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Right vector
    pub fn right(&self) -> Vec3 {
        self.basis.right
    }

    /// Up vector
    pub fn up(&self) -> Vec3 {
        self.basis.up
    }

    /// Look vector
    pub fn look(&self) -> Vec3 {
        self.basis.look
    }

    /// Current basis
    pub fn basis(&self) -> CameraBasis {
        self.basis
    }

    /// Near clip distance
    pub fn near_z(&self) -> f32 {
        self.near_z
    }

    /// Far clip distance
    pub fn far_z(&self) -> f32 {
        self.far_z
    }

    /// Width over height
    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Vertical field of view in radians
    pub fn fov_y(&self) -> f32 {
        self.fov_y
    }

    /// Horizontal field of view in radians
    pub fn fov_x(&self) -> f32 {
        let half_width = 0.5 * self.near_window_width();
        2.0 * (half_width / self.near_z).atan()
    }

    /// Width of the frustum at the near plane
    pub fn near_window_width(&self) -> f32 {
        self.aspect * self.near_window_height
    }

    /// Height of the frustum at the near plane
    pub fn near_window_height(&self) -> f32 {
        self.near_window_height
    }

    /// Width of the frustum at the far plane
    pub fn far_window_width(&self) -> f32 {
        self.aspect * self.far_window_height
    }

    /// Height of the frustum at the far plane
    pub fn far_window_height(&self) -> f32 {
        self.far_window_height
    }

    /// Cached view matrix; call [`Camera::update_view`] first after mutating
    pub fn view(&self) -> Mat4 {
        self.view
    }

    /// Projection matrix
    pub fn proj(&self) -> Mat4 {
        self.proj
    }

    /// Whether the cached view matrix is current
    pub fn view_state(&self) -> ViewState {
        self.view_state
    }

    /// Move along the look vector
    pub fn walk(&mut self, distance: f32) {
        self.position += self.basis.look * distance;
        self.view_state = ViewState::Stale;
    }

    /// Move along the right vector
    pub fn strafe(&mut self, distance: f32) {
        self.position += self.basis.right * distance;
        self.view_state = ViewState::Stale;
    }

    /// Rotate up and look about the right vector
    ///
    /// Positive angles tilt the view downward.
    pub fn pitch(&mut self, angle: f32) {
        let rotation = Mat4::rotation_axis(&self.basis.right, angle);
        self.basis.up = rotation.transform_vector(&self.basis.up);
        self.basis.look = rotation.transform_vector(&self.basis.look);
        self.view_state = ViewState::Stale;
    }

    /// Rotate the whole basis about world +Y
    ///
    /// Positive angles turn the view toward +X.
    pub fn yaw(&mut self, angle: f32) {
        let rotation = Mat4::rotation_y(angle);
        self.basis.right = rotation.transform_vector(&self.basis.right);
        self.basis.up = rotation.transform_vector(&self.basis.up);
        self.basis.look = rotation.transform_vector(&self.basis.look);
        self.view_state = ViewState::Stale;
    }

    /// Derive the orthonormal basis and view matrix without mutating the camera
    pub fn compute_view(&self) -> (CameraBasis, Mat4) {
        let basis = self.basis.orthonormalized();
        let CameraBasis { right, up, look } = basis;
        let p = self.position;

        #[rustfmt::skip]
        let view = Mat4::new(
            right.x, right.y, right.z, -p.dot(&right),
            up.x,    up.y,    up.z,    -p.dot(&up),
            look.x,  look.y,  look.z,  -p.dot(&look),
            0.0,     0.0,     0.0,     1.0,
        );

        (basis, view)
    }

    /// Rebuild the view matrix if the camera moved since the last update
    ///
    /// Returns `true` when the matrix was recomputed.
    pub fn update_view(&mut self) -> bool {
        if self.view_state == ViewState::Clean {
            return false;
        }

        let (basis, view) = self.compute_view();
        self.basis = basis;
        self.view = view;
        self.view_state = ViewState::Clean;
        log::trace!("Camera view rebuilt at {:?}", self.position);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{utils, Vec4};
    use approx::assert_relative_eq;

    fn assert_orthonormal(basis: &CameraBasis) {
        assert_relative_eq!(basis.right.norm(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(basis.up.norm(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(basis.look.norm(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(basis.right.dot(&basis.up), 0.0, epsilon = 1e-5);
        assert_relative_eq!(basis.right.dot(&basis.look), 0.0, epsilon = 1e-5);
        assert_relative_eq!(basis.up.dot(&basis.look), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_default_camera() {
        let camera = Camera::new();
        assert_eq!(camera.position(), Vec3::zeros());
        assert_eq!(camera.basis(), CameraBasis::default());
        assert_eq!(camera.view_state(), ViewState::Stale);
        assert_relative_eq!(camera.fov_y(), constants::QUARTER_PI);
        assert_relative_eq!(camera.aspect(), 1.0);
        assert_relative_eq!(camera.near_z(), 1.0);
        assert_relative_eq!(camera.far_z(), 1000.0);
    }

    #[test]
    fn test_basis_stays_orthonormal_under_rotation() {
        let mut camera = Camera::new();
        // Deterministic pseudo-random drag sequence
        let mut seed = 0x2545_f491_u32;
        for _ in 0..500 {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            let angle = ((seed % 2000) as f32 / 1000.0 - 1.0) * 0.3;
            if seed & 1 == 0 {
                camera.pitch(angle);
            } else {
                camera.yaw(angle);
            }
            camera.update_view();
            assert_orthonormal(&camera.basis());
        }
    }

    #[test]
    fn test_window_widths_follow_aspect() {
        let mut camera = Camera::new();
        camera.set_frustum(utils::deg_to_rad(60.0), 1.6, 0.5, 250.0);

        assert_relative_eq!(camera.near_window_width(), 1.6 * camera.near_window_height());
        assert_relative_eq!(camera.far_window_width(), 1.6 * camera.far_window_height());

        let expected_near = 2.0 * 0.5 * utils::deg_to_rad(30.0).tan();
        assert_relative_eq!(camera.near_window_height(), expected_near, epsilon = 1e-6);
        assert_relative_eq!(camera.far_window_height(), expected_near * 500.0, epsilon = 1e-3);
    }

    #[test]
    fn test_fov_x_widens_with_aspect() {
        let mut camera = Camera::new();
        camera.set_frustum(constants::QUARTER_PI, 1.0, 1.0, 100.0);
        assert_relative_eq!(camera.fov_x(), constants::QUARTER_PI, epsilon = 1e-6);

        camera.set_frustum(constants::QUARTER_PI, 2.0, 1.0, 100.0);
        assert!(camera.fov_x() > constants::QUARTER_PI);
    }

    #[test]
    fn test_view_translation_is_negated_position_projection() {
        let mut camera = Camera::new();
        camera.set_position(0.0, 5.0, -30.0);
        assert!(camera.update_view());

        let view = camera.view();
        let p = camera.position();
        assert_relative_eq!(view[(0, 3)], -p.dot(&camera.right()), epsilon = 1e-6);
        assert_relative_eq!(view[(1, 3)], -p.dot(&camera.up()), epsilon = 1e-6);
        assert_relative_eq!(view[(2, 3)], -p.dot(&camera.look()), epsilon = 1e-6);
        assert_relative_eq!(view[(0, 3)], 0.0, epsilon = 1e-6);
        assert_relative_eq!(view[(1, 3)], -5.0, epsilon = 1e-6);
        assert_relative_eq!(view[(2, 3)], 30.0, epsilon = 1e-6);

        // The camera itself maps to the view-space origin
        let eye = view * Vec4::new(p.x, p.y, p.z, 1.0);
        assert_relative_eq!(eye, Vec4::new(0.0, 0.0, 0.0, 1.0), epsilon = 1e-5);
    }

    #[test]
    fn test_update_view_is_noop_when_clean() {
        let mut camera = Camera::new();
        assert!(camera.update_view());
        assert_eq!(camera.view_state(), ViewState::Clean);
        assert!(!camera.update_view());

        camera.strafe(1.0);
        assert_eq!(camera.view_state(), ViewState::Stale);
        assert!(camera.update_view());
    }

    #[test]
    fn test_compute_view_does_not_mutate() {
        let mut camera = Camera::new();
        camera.yaw(0.4);
        let before = camera.basis();
        let (basis, view) = camera.compute_view();

        assert_eq!(camera.basis(), before);
        assert_eq!(camera.view_state(), ViewState::Stale);
        assert_orthonormal(&basis);

        camera.update_view();
        assert_relative_eq!(camera.view(), view);
    }

    #[test]
    fn test_rotation_directions() {
        let mut camera = Camera::new();
        camera.yaw(constants::PI * 0.5);
        assert_relative_eq!(camera.look(), Vec3::x(), epsilon = 1e-6);

        let mut camera = Camera::new();
        camera.pitch(0.3);
        assert!(camera.look().y < 0.0);
    }

    #[test]
    fn test_walk_and_strafe_follow_basis() {
        let mut camera = Camera::new();
        camera.walk(2.0);
        camera.strafe(-1.0);
        assert_relative_eq!(camera.position(), Vec3::new(-1.0, 0.0, 2.0));
    }
}
