use std::f32::consts::TAU;

use glam::Vec3;
use rand::rngs::StdRng;
use rustc_hash::FxHashMap;

use super::{symmetric_jitter, LayoutParams, Placement};
use crate::scene::record::Record;

/// Categories on equally spaced spokes of a circle in the `xz` plane.
///
/// Records sharing a category share an angle and are spread vertically by
/// a uniform jitter. The jitter source is seeded from
/// [`LayoutParams::jitter_seed`] when set, otherwise freshly per pass.
#[derive(Debug, Clone)]
pub struct RingPlacement {
    /// Spoke of each category, in first-appearance order.
    slots: FxHashMap<String, usize>,
    radius: f32,
    jitter: f32,
    rng: StdRng,
}

impl RingPlacement {
    /// Assign a spoke to every distinct category in `records`.
    #[must_use]
    pub fn new(records: &[Record], params: &LayoutParams, rng: StdRng) -> Self {
        let mut slots = FxHashMap::default();
        for record in records {
            let next = slots.len();
            let _ = slots.entry(record.category.clone()).or_insert(next);
        }
        Self {
            slots,
            radius: params.ring_radius,
            jitter: params.ring_jitter,
            rng,
        }
    }

    /// Number of distinct categories.
    #[must_use]
    pub fn spoke_count(&self) -> usize {
        self.slots.len()
    }

    /// Angle of the spoke for `category`, in radians, or `None` when the
    /// category was not in the records this ring was built from.
    #[must_use]
    pub fn angle_of(&self, category: &str) -> Option<f32> {
        let slot = *self.slots.get(category)?;
        Some(TAU * slot as f32 / self.spoke_count().max(1) as f32)
    }
}

impl Placement for RingPlacement {
    fn position(&mut self, record: &Record, _index: usize, _records: &[Record]) -> Vec3 {
        let angle = self.angle_of(&record.category).unwrap_or(0.0);
        let y = symmetric_jitter(&mut self.rng, self.jitter);
        Vec3::new(self.radius * angle.cos(), y, self.radius * angle.sin())
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn shared_category_shares_angle() {
        let records = vec![
            Record::new("a", "", "red"),
            Record::new("b", "", "blue"),
            Record::new("c", "", "red"),
            Record::new("d", "", "green"),
        ];
        let params = LayoutParams::default();
        let mut ring =
            RingPlacement::new(&records, &params, StdRng::seed_from_u64(7));
        assert_eq!(ring.spoke_count(), 3);
        assert_eq!(ring.angle_of("red"), Some(0.0));
        assert!((ring.angle_of("blue").unwrap() - TAU / 3.0).abs() < 1e-6);
        assert_eq!(ring.angle_of("purple"), None);

        let a = ring.position(&records[0], 0, &records);
        let c = ring.position(&records[2], 2, &records);
        assert!((a.x - c.x).abs() < 1e-5 && (a.z - c.z).abs() < 1e-5);
        assert!(a.y.abs() <= params.ring_jitter);
        assert!((a.x.hypot(a.z) - params.ring_radius).abs() < 1e-4);
    }
}
