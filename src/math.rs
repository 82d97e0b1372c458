//! Vector and matrix helpers on top of glam.
//!
//! Everything here is a pure function of its inputs. Projection follows the
//! right-handed, `[0, 1]` clip-depth convention that wgpu uses natively, so
//! the depth test in the cube pass is a plain `Less` against a buffer
//! cleared to `1.0`.

use glam::{Mat4, Vec3, Vec4};

/// Squared length below which a vector is treated as zero.
const DEGENERATE_EPSILON: f32 = 1e-12;

/// Normalize `v`, returning `None` for zero-length or non-finite input.
#[must_use]
pub fn try_normalize(v: Vec3) -> Option<Vec3> {
    let len_sq = v.length_squared();
    if !len_sq.is_finite() || len_sq <= DEGENERATE_EPSILON {
        return None;
    }
    Some(v / len_sq.sqrt())
}

/// Orthonormal camera frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Basis {
    /// Unit view direction (eye toward target).
    pub forward: Vec3,
    /// Unit screen-right direction.
    pub right: Vec3,
    /// Unit screen-up direction, orthogonal to `forward` and `right`.
    pub up: Vec3,
}

impl Basis {
    /// Basis looking down `-Z` with `+Y` up.
    pub const IDENTITY: Self = Self {
        forward: Vec3::NEG_Z,
        right: Vec3::X,
        up: Vec3::Y,
    };

    /// Build a basis from an eye, a target and a world-up hint.
    ///
    /// Returns `None` when the eye sits on the target or when the view
    /// direction is parallel to `up`; callers keep their previous basis in
    /// that case.
    #[must_use]
    pub fn look_at(position: Vec3, target: Vec3, up: Vec3) -> Option<Self> {
        let forward = try_normalize(target - position)?;
        let right = try_normalize(forward.cross(up))?;
        let up = right.cross(forward);
        Some(Self { forward, right, up })
    }

    /// World-to-view matrix for an eye at `position` using this frame.
    #[must_use]
    pub fn view_matrix(&self, position: Vec3) -> Mat4 {
        Mat4::from_cols(
            Vec4::new(self.right.x, self.up.x, -self.forward.x, 0.0),
            Vec4::new(self.right.y, self.up.y, -self.forward.y, 0.0),
            Vec4::new(self.right.z, self.up.z, -self.forward.z, 0.0),
            Vec4::new(
                -self.right.dot(position),
                -self.up.dot(position),
                self.forward.dot(position),
                1.0,
            ),
        )
    }
}

impl Default for Basis {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Right-handed perspective projection mapping view depth to `[0, 1]`.
#[must_use]
pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    Mat4::perspective_rh(fov_y, aspect, near, far)
}

/// Half-line used for picking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Start point in world space.
    pub origin: Vec3,
    /// Direction; normalized by [`Ray::new`].
    pub direction: Vec3,
}

impl Ray {
    /// Build a ray, normalizing `direction`. Zero directions yield `None`.
    #[must_use]
    pub fn new(origin: Vec3, direction: Vec3) -> Option<Self> {
        Some(Self {
            origin,
            direction: try_normalize(direction)?,
        })
    }

    /// Point at parameter `t` along the ray.
    #[must_use]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Smallest root below which an intersection counts as behind the origin.
pub const HIT_EPSILON: f32 = 1e-4;

/// Ray-sphere test returning the entering distance along the ray.
///
/// Solves `a·t² + b·t + c = 0` with `oc = origin - center`. Only the near
/// root is considered: a ray starting inside the sphere (near root
/// negative) does not hit it.
#[must_use]
pub fn ray_sphere(ray: &Ray, center: Vec3, radius: f32) -> Option<f32> {
    let oc = ray.origin - center;
    let a = ray.direction.dot(ray.direction);
    let b = 2.0 * oc.dot(ray.direction);
    let c = oc.dot(oc) - radius * radius;
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 || a <= DEGENERATE_EPSILON {
        return None;
    }
    let t = (-b - discriminant.sqrt()) / (2.0 * a);
    (t > HIT_EPSILON).then_some(t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_rejects_zero_and_nan() {
        assert!(try_normalize(Vec3::ZERO).is_none());
        assert!(try_normalize(Vec3::new(f32::NAN, 0.0, 0.0)).is_none());
        let n = try_normalize(Vec3::new(3.0, 0.0, 4.0)).unwrap();
        assert!((n.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn basis_matches_glam_look_at() {
        let eye = Vec3::new(3.0, 2.0, 5.0);
        let target = Vec3::new(-1.0, 0.5, 0.0);
        let basis = Basis::look_at(eye, target, Vec3::Y).unwrap();
        let ours = basis.view_matrix(eye);
        let glams = Mat4::look_at_rh(eye, target, Vec3::Y);
        assert!(ours.abs_diff_eq(glams, 1e-5));
    }

    #[test]
    fn basis_is_orthonormal() {
        let basis =
            Basis::look_at(Vec3::ZERO, Vec3::new(1.0, 2.0, -3.0), Vec3::Y)
                .unwrap();
        assert!(basis.forward.dot(basis.right).abs() < 1e-6);
        assert!(basis.forward.dot(basis.up).abs() < 1e-6);
        assert!(basis.right.dot(basis.up).abs() < 1e-6);
        assert!((basis.right.cross(basis.forward).length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn basis_rejects_parallel_up() {
        assert!(Basis::look_at(Vec3::ZERO, Vec3::Y * 5.0, Vec3::Y).is_none());
        assert!(Basis::look_at(Vec3::ONE, Vec3::ONE, Vec3::Y).is_none());
    }

    #[test]
    fn perspective_maps_near_far_to_unit_depth() {
        let proj = perspective(60f32.to_radians(), 1.5, 0.1, 100.0);
        let near = proj * Vec4::new(0.0, 0.0, -0.1, 1.0);
        let far = proj * Vec4::new(0.0, 0.0, -100.0, 1.0);
        assert!((near.z / near.w).abs() < 1e-5);
        assert!((far.z / far.w - 1.0).abs() < 1e-5);
    }

    #[test]
    fn ray_sphere_hits_front_only() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X).unwrap();
        let t = ray_sphere(&ray, Vec3::new(10.0, 0.0, 0.0), 1.0).unwrap();
        assert!((t - 9.0).abs() < 1e-5);
        assert!(ray_sphere(&ray, Vec3::new(-10.0, 0.0, 0.0), 1.0).is_none());
        assert!(ray_sphere(&ray, Vec3::ZERO, 1.0).is_none());
        assert!(ray_sphere(&ray, Vec3::new(10.0, 3.0, 0.0), 1.0).is_none());
    }
}
