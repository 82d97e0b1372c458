use encase::{ShaderType, UniformBuffer};
use glam::{Mat4, Quat, Vec3};

use crate::math::{self, Basis, Ray};

/// Largest pitch above or below the horizon, in radians (85°).
pub const MAX_PITCH: f32 = 85.0 * std::f32::consts::PI / 180.0;

/// Shortest eye-to-target distance kept after a rotation.
const MIN_TARGET_DISTANCE: f32 = 1e-3;

/// Uniform stride used until a device reports its own.
pub const DEFAULT_UNIFORM_ALIGNMENT: u64 = 256;

/// Where the camera is and what it looks at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Eye position in world space.
    pub position: Vec3,
    /// Look-at point in world space.
    pub target: Vec3,
    /// World-up hint; must not be parallel to `target - position`.
    pub up: Vec3,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 8.0, 30.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
        }
    }
}

/// Perspective projection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Vertical field of view in radians, in `(0, π)`.
    pub fov_y: f32,
    /// Viewport width / height.
    pub aspect: f32,
    /// Near clipping distance, `> 0`.
    pub near: f32,
    /// Far clipping distance, `> near`.
    pub far: f32,
}

impl Projection {
    /// Whether every parameter lies in its valid range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.fov_y > 0.0
            && self.fov_y < std::f32::consts::PI
            && self.aspect > 0.0
            && self.aspect.is_finite()
            && self.near > 0.0
            && self.far > self.near
            && self.far.is_finite()
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov_y: 60f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// Per-frame camera data as read by every shader invocation.
///
/// Serialized with std140 rules: the matrix occupies 64 bytes, the eye
/// position starts a new 16-byte row and `time` fills its last lane.
#[derive(Debug, Clone, Copy, PartialEq, ShaderType)]
pub struct CameraUniformBlock {
    /// World-to-clip transform.
    pub view_projection: Mat4,
    /// Eye position in world space.
    pub eye_position: Vec3,
    /// Monotonic update counter scaled by the camera's time step.
    pub time: f32,
}

impl CameraUniformBlock {
    /// std140 bytes padded up to a multiple of `alignment`.
    #[must_use]
    pub fn to_bytes(&self, alignment: u64) -> Vec<u8> {
        let mut buffer = UniformBuffer::new(Vec::<u8>::new());
        if let Err(e) = buffer.write(self) {
            log::error!("camera uniform serialization failed: {e}");
        }
        let mut bytes = buffer.into_inner();
        let stride = alignment.max(1) as usize;
        let padded = bytes.len().div_ceil(stride) * stride;
        bytes.resize(padded.max(stride), 0);
        bytes
    }
}

/// Fly camera: pose, projection and the matrices derived from them.
///
/// There is no dirty flag. Every mutator recomputes the view,
/// projection and view-projection matrices, advances `time` by one step
/// and re-serializes the uniform block before returning.
#[derive(Debug, Clone)]
pub struct Camera {
    pose: Pose,
    projection: Projection,
    basis: Basis,
    view: Mat4,
    proj: Mat4,
    view_proj: Mat4,
    time: f32,
    time_step: f32,
    uniform_alignment: u64,
    uniform_bytes: Vec<u8>,
}

impl Camera {
    /// Create a camera; invalid inputs fall back to the defaults.
    #[must_use]
    pub fn new(pose: Pose, projection: Projection, time_step: f32) -> Self {
        let mut camera = Self {
            pose: Pose::default(),
            projection: Projection::default(),
            basis: Basis::IDENTITY,
            view: Mat4::IDENTITY,
            proj: Mat4::IDENTITY,
            view_proj: Mat4::IDENTITY,
            time: 0.0,
            time_step: time_step.max(0.0),
            uniform_alignment: DEFAULT_UNIFORM_ALIGNMENT,
            uniform_bytes: Vec::new(),
        };
        camera.pose = pose;
        if projection.is_valid() {
            camera.projection = projection;
        }
        camera.recompute();
        camera
    }

    /// Replace the pose.
    pub fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
        self.refresh();
    }

    /// Replace the projection. Invalid parameters keep the current one.
    pub fn set_projection(&mut self, projection: Projection) {
        if projection.is_valid() {
            self.projection = projection;
        } else {
            log::warn!("ignoring invalid projection {projection:?}");
        }
        self.refresh();
    }

    /// Recompute the aspect ratio from a viewport size. Zero-sized
    /// viewports (minimized windows) keep the previous aspect.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.projection.aspect = width as f32 / height as f32;
        }
        self.refresh();
    }

    /// Translate eye and target along the view direction.
    pub fn move_forward(&mut self, distance: f32) {
        if distance.is_finite() {
            let delta = self.basis.forward * distance;
            self.pose.position += delta;
            self.pose.target += delta;
        }
        self.refresh();
    }

    /// Translate eye and target along the screen-right direction.
    pub fn move_right(&mut self, distance: f32) {
        if distance.is_finite() {
            let delta = self.basis.right * distance;
            self.pose.position += delta;
            self.pose.target += delta;
        }
        self.refresh();
    }

    /// Turn the target around the eye.
    ///
    /// `yaw` rotates about world-up (positive turns left), `pitch` about the
    /// local right axis (positive looks up). The resulting elevation is
    /// clamped to ±[`MAX_PITCH`]; both angles are re-derived from the
    /// current vectors so nothing accumulates between calls.
    pub fn rotate(&mut self, yaw: f32, pitch: f32) {
        if yaw.is_finite() && pitch.is_finite() {
            self.turn(yaw, pitch);
        }
        self.refresh();
    }

    fn turn(&mut self, yaw: f32, pitch: f32) {
        let world_up = math::try_normalize(self.pose.up).unwrap_or(Vec3::Y);
        let offset = self.pose.target - self.pose.position;
        let distance = offset.length().max(MIN_TARGET_DISTANCE);
        let forward = math::try_normalize(offset).unwrap_or(self.basis.forward);

        let yawed = Quat::from_axis_angle(world_up, yaw) * forward;
        let current = yawed.dot(world_up).clamp(-1.0, 1.0).asin();
        let wanted = (current + pitch).clamp(-MAX_PITCH, MAX_PITCH);
        let right = math::try_normalize(yawed.cross(world_up))
            .unwrap_or(self.basis.right);
        let turned = Quat::from_axis_angle(right, wanted - current) * yawed;

        self.pose.target = self.pose.position + turned * distance;
    }

    /// Snapshot of the block most recently serialized.
    #[must_use]
    pub fn snapshot_uniform_block(&self) -> CameraUniformBlock {
        CameraUniformBlock {
            view_projection: self.view_proj,
            eye_position: self.pose.position,
            time: self.time,
        }
    }

    /// Serialized uniform block, padded to the uniform stride.
    #[must_use]
    pub fn uniform_bytes(&self) -> &[u8] {
        &self.uniform_bytes
    }

    /// Use the device's uniform offset alignment for serialization.
    pub fn set_uniform_alignment(&mut self, alignment: u64) {
        self.uniform_alignment = alignment.max(1);
        self.uniform_bytes = self
            .snapshot_uniform_block()
            .to_bytes(self.uniform_alignment);
    }

    /// Current pose.
    #[must_use]
    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Current projection.
    #[must_use]
    pub fn projection(&self) -> Projection {
        self.projection
    }

    /// Last valid orthonormal frame.
    #[must_use]
    pub fn basis(&self) -> Basis {
        self.basis
    }

    /// World-to-view matrix.
    #[must_use]
    pub fn view(&self) -> Mat4 {
        self.view
    }

    /// View-to-clip matrix.
    #[must_use]
    pub fn proj(&self) -> Mat4 {
        self.proj
    }

    /// World-to-clip matrix.
    #[must_use]
    pub fn view_projection(&self) -> Mat4 {
        self.view_proj
    }

    /// Uniform block time.
    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Ray from the eye through pixel `(x, y)` of a `width × height`
    /// viewport (origin top-left).
    #[must_use]
    pub fn screen_ray(
        &self,
        x: f32,
        y: f32,
        width: u32,
        height: u32,
    ) -> Option<Ray> {
        if width == 0 || height == 0 {
            return None;
        }
        let ndc_x = 2.0 * x / width as f32 - 1.0;
        let ndc_y = 1.0 - 2.0 * y / height as f32;
        let far = self
            .view_proj
            .inverse()
            .project_point3(Vec3::new(ndc_x, ndc_y, 1.0));
        Ray::new(self.pose.position, far - self.pose.position)
    }

    fn refresh(&mut self) {
        self.time += self.time_step;
        self.recompute();
    }

    fn recompute(&mut self) {
        match Basis::look_at(self.pose.position, self.pose.target, self.pose.up)
        {
            Some(basis) => self.basis = basis,
            None => log::warn!(
                "degenerate camera pose {:?}; keeping previous basis",
                self.pose
            ),
        }
        self.view = self.basis.view_matrix(self.pose.position);
        self.proj = math::perspective(
            self.projection.fov_y,
            self.projection.aspect,
            self.projection.near,
            self.projection.far,
        );
        self.view_proj = self.proj * self.view;
        self.uniform_bytes = self
            .snapshot_uniform_block()
            .to_bytes(self.uniform_alignment);
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Pose::default(), Projection::default(), 1.0 / 60.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn elevation(camera: &Camera) -> f32 {
        let f = (camera.pose().target - camera.pose().position).normalize();
        f.dot(Vec3::Y).asin()
    }

    #[test]
    fn basis_stays_orthonormal_through_moves() {
        let mut camera = Camera::default();
        for i in 0..200 {
            camera.rotate(0.37, if i % 2 == 0 { 0.2 } else { -0.3 });
            camera.move_forward(0.5);
            camera.move_right(-0.25);
            let b = camera.basis();
            assert!((b.right.cross(b.forward).length() - b.up.length()).abs() < 1e-4);
            assert!((b.up.length() - 1.0).abs() < 1e-4);
            assert!(camera.view_projection().is_finite());
        }
    }

    #[test]
    fn pitch_is_clamped_for_huge_inputs() {
        let mut camera = Camera::default();
        camera.rotate(0.0, 1000.0);
        assert!(elevation(&camera) <= MAX_PITCH + 1e-4);
        for _ in 0..50 {
            camera.rotate(3.0, 2.0);
            assert!(elevation(&camera) <= MAX_PITCH + 1e-4);
        }
        camera.rotate(0.0, -1000.0);
        assert!(elevation(&camera) >= -MAX_PITCH - 1e-4);
        assert!((elevation(&camera) + MAX_PITCH).abs() < 1e-3);
    }

    #[test]
    fn yaw_full_turn_returns_to_start() {
        let mut camera = Camera::default();
        let start = camera.pose().target;
        for _ in 0..8 {
            camera.rotate(std::f32::consts::FRAC_PI_4, 0.0);
        }
        assert!(camera.pose().target.abs_diff_eq(start, 1e-3));
    }

    #[test]
    fn positive_yaw_turns_left() {
        let mut camera = Camera::new(
            Pose {
                position: Vec3::ZERO,
                target: Vec3::NEG_Z,
                up: Vec3::Y,
            },
            Projection::default(),
            0.0,
        );
        camera.rotate(std::f32::consts::FRAC_PI_2, 0.0);
        assert!(camera.pose().target.abs_diff_eq(Vec3::NEG_X, 1e-5));
    }

    #[test]
    fn degenerate_pose_keeps_last_basis() {
        let mut camera = Camera::default();
        let before = camera.basis();
        camera.set_pose(Pose {
            position: Vec3::ZERO,
            target: Vec3::new(0.0, 10.0, 0.0),
            up: Vec3::Y,
        });
        assert_eq!(camera.basis(), before);
        assert!(camera.view_projection().is_finite());
    }

    #[test]
    fn move_right_follows_screen_right() {
        let mut camera = Camera::new(
            Pose {
                position: Vec3::ZERO,
                target: Vec3::NEG_Z,
                up: Vec3::Y,
            },
            Projection::default(),
            0.0,
        );
        camera.move_right(2.0);
        assert!(camera.pose().position.abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-6));
        camera.move_forward(1.0);
        assert!(camera.pose().position.abs_diff_eq(Vec3::new(2.0, 0.0, -1.0), 1e-6));
    }

    #[test]
    fn time_advances_by_fixed_step_per_mutation() {
        let mut camera = Camera::new(Pose::default(), Projection::default(), 0.5);
        assert_eq!(camera.time(), 0.0);
        camera.move_forward(1.0);
        camera.resize(800, 600);
        assert_eq!(camera.snapshot_uniform_block().time, 1.0);
    }

    #[test]
    fn resize_updates_aspect_and_ignores_zero() {
        let mut camera = Camera::default();
        camera.resize(1000, 500);
        assert_eq!(camera.projection().aspect, 2.0);
        camera.resize(0, 500);
        assert_eq!(camera.projection().aspect, 2.0);
    }

    #[test]
    fn invalid_projection_is_ignored() {
        let mut camera = Camera::default();
        let before = camera.projection();
        camera.set_projection(Projection {
            near: 10.0,
            far: 1.0,
            ..before
        });
        assert_eq!(camera.projection(), before);
    }

    #[test]
    fn uniform_bytes_are_std140_and_aligned() {
        let camera = Camera::default();
        let bytes = camera.uniform_bytes();
        assert_eq!(bytes.len(), DEFAULT_UNIFORM_ALIGNMENT as usize);
        assert_eq!(CameraUniformBlock::min_size().get(), 80);
        let block = camera.snapshot_uniform_block();
        let eye_x = f32::from_le_bytes([bytes[64], bytes[65], bytes[66], bytes[67]]);
        let time = f32::from_le_bytes([bytes[76], bytes[77], bytes[78], bytes[79]]);
        assert_eq!(eye_x, block.eye_position.x);
        assert_eq!(time, block.time);
    }

    #[test]
    fn screen_center_ray_points_forward() {
        let camera = Camera::default();
        let ray = camera.screen_ray(400.0, 300.0, 800, 600).unwrap();
        assert!(ray.direction.abs_diff_eq(camera.basis().forward, 1e-4));
    }
}
