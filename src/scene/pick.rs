//! CPU ray picking over the instance attribute mirror.

use crate::layout::InstanceAttributes;
use crate::math::{ray_sphere, Ray};

/// The nearest instance hit by a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    /// Slot of the hit instance.
    pub slot: u32,
    /// Ray parameter of the entry point.
    pub distance: f32,
}

/// Test `ray` against a sphere of radius `size * radius_scale` around
/// every instance and return the nearest entry point.
///
/// Equal distances resolve to the lower slot. A ray starting inside a
/// sphere does not hit that sphere.
#[must_use]
pub fn pick_nearest(
    ray: &Ray,
    attributes: &[InstanceAttributes],
    radius_scale: f32,
) -> Option<PickHit> {
    let mut best: Option<PickHit> = None;
    for (slot, attrs) in attributes.iter().enumerate() {
        let radius = attrs.size * radius_scale;
        let Some(t) = ray_sphere(ray, attrs.center(), radius) else {
            continue;
        };
        if best.is_none_or(|b| t < b.distance) {
            best = Some(PickHit {
                slot: slot as u32,
                distance: t,
            });
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    fn cube_at(p: [f32; 3]) -> InstanceAttributes {
        InstanceAttributes {
            position: p,
            size: 1.0,
            color: [0.5; 3],
            selected: 0.0,
        }
    }

    #[test]
    fn ray_from_inside_pointing_out_misses() {
        let attrs = [cube_at([0.0, 0.0, 0.0])];
        let ray = Ray::new(Vec3::ZERO, Vec3::X).unwrap();
        assert_eq!(pick_nearest(&ray, &attrs, 1.5), None);
    }

    #[test]
    fn ray_toward_record_hits_it() {
        let attrs = [cube_at([0.0, 0.0, -10.0])];
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z).unwrap();
        let hit = pick_nearest(&ray, &attrs, 1.5).unwrap();
        assert_eq!(hit.slot, 0);
        assert!((hit.distance - 8.5).abs() < 1e-4);
    }

    #[test]
    fn nearer_of_two_colinear_records_wins() {
        let attrs = [cube_at([0.0, 0.0, -20.0]), cube_at([0.0, 0.0, -5.0])];
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z).unwrap();
        assert_eq!(pick_nearest(&ray, &attrs, 1.5).unwrap().slot, 1);
    }

    #[test]
    fn ties_go_to_lower_slot() {
        let attrs = [cube_at([0.0, 0.0, -5.0]), cube_at([0.0, 0.0, -5.0])];
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z).unwrap();
        assert_eq!(pick_nearest(&ray, &attrs, 1.5).unwrap().slot, 0);
    }

    #[test]
    fn records_behind_the_ray_are_ignored() {
        let attrs = [cube_at([0.0, 0.0, 5.0])];
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z).unwrap();
        assert!(pick_nearest(&ray, &attrs, 1.5).is_none());
    }
}
