//! # Perspective Camera
//!
//! Camera pose plus projection parameters, with on-demand matrix generation.
//!
//! ## Design Principles
//! - **Renderer-agnostic**: no graphics API types, only nalgebra matrices
//! - **Pose is data**: rigs write `position`/`target` each tick, nothing is cached
//! - **Mirroring lives in the projection**: a mirrored camera flips screen X
//!   without touching its pose

use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};

/// 3D camera with a look-at pose and perspective projection
///
/// # Coordinate System
/// Right-handed, Y-up world space. The view matrix looks down -Z in view
/// space; the projection maps depth to `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,

    /// Point the camera is looking at in world space
    pub target: Vec3,

    /// Up vector for camera orientation (typically [0, 1, 0])
    pub up: Vec3,

    /// Vertical field of view in radians
    pub fov: f32,

    /// Aspect ratio (width / height)
    pub aspect: f32,

    /// Distance to near clipping plane
    pub near: f32,

    /// Distance to far clipping plane
    pub far: f32,

    /// Flip the image horizontally, as a rear-view mirror does
    pub mirrored: bool,
}

impl Camera {
    /// Create a perspective camera looking at the origin
    ///
    /// # Example
    /// ```rust
    /// use drive_engine::foundation::math::Vec3;
    /// use drive_engine::render::Camera;
    ///
    /// let camera = Camera::perspective(Vec3::new(0.0, 2.5, -5.0), 75.0, 16.0 / 9.0, 0.1, 1000.0);
    /// assert!(!camera.mirrored);
    /// ```
    pub fn perspective(position: Vec3, fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position,
            target: Vec3::zeros(),
            up: Vec3::y(),
            fov: utils::deg_to_rad(fov_degrees),
            aspect,
            near,
            far,
            mirrored: false,
        }
    }

    /// Same camera, horizontally mirrored
    #[must_use]
    pub fn into_mirrored(mut self) -> Self {
        self.mirrored = true;
        self
    }

    /// Move the camera and aim it in one step
    pub fn set_pose(&mut self, position: Vec3, target: Vec3) {
        self.position = position;
        self.target = target;
        log::trace!("Camera pose updated - position: {position:?}, target: {target:?}");
    }

    /// Unit vector from the camera towards its target
    ///
    /// Falls back to +Z when position and target coincide.
    pub fn view_direction(&self) -> Vec3 {
        (self.target - self.position)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vec3::z)
    }

    /// World-to-view matrix
    pub fn get_view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.position, self.target, self.up)
    }

    /// Perspective projection, with screen X negated when mirrored
    pub fn get_projection_matrix(&self) -> Mat4 {
        let mut projection = Mat4::perspective(self.fov, self.aspect, self.near, self.far);
        if self.mirrored {
            projection[(0, 0)] = -projection[(0, 0)];
        }
        projection
    }

    /// Combined `P × V`
    pub fn get_view_projection_matrix(&self) -> Mat4 {
        self.get_projection_matrix() * self.get_view_matrix()
    }
}

impl Default for Camera {
    /// 75 degree, 16:9 camera behind and above the origin
    fn default() -> Self {
        Self::perspective(Vec3::new(0.0, 2.5, -5.0), 75.0, 16.0 / 9.0, 0.1, 1000.0)
    }
}
