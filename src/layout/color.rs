use glam::Vec3;

use crate::scene::record::Record;

/// Color of the oldest records.
pub const COLD: [f32; 3] = [0.20, 0.40, 0.90];
/// Color of the newest records.
pub const WARM: [f32; 3] = [0.95, 0.45, 0.15];

/// Year span of a record set, used to normalize the color ramp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    /// Earliest year (after the neutral fallback).
    pub min: i32,
    /// Latest year (after the neutral fallback).
    pub max: i32,
}

impl YearRange {
    /// Span over `records`; a single neutral year when empty.
    #[must_use]
    pub fn of(records: &[Record]) -> Self {
        let mut years = records.iter().map(Record::year);
        let Some(first) = years.next() else {
            let neutral = crate::scene::record::NEUTRAL_YEAR;
            return Self {
                min: neutral,
                max: neutral,
            };
        };
        let (min, max) =
            years.fold((first, first), |(lo, hi), y| (lo.min(y), hi.max(y)));
        Self { min, max }
    }

    /// Position of `year` in the span, clamped to `[0, 1]`. A span of a
    /// single year maps everything to `0`.
    #[must_use]
    pub fn normalize(&self, year: i32) -> f32 {
        let span = i64::from(self.max) - i64::from(self.min);
        if span <= 0 {
            return 0.0;
        }
        let offset = i64::from(year) - i64::from(self.min);
        (offset as f64 / span as f64).clamp(0.0, 1.0) as f32
    }

    /// Ramp color for `year`.
    #[must_use]
    pub fn color_of(&self, year: i32) -> [f32; 3] {
        lerp_color(COLD, WARM, self.normalize(year))
    }
}

/// Linear interpolation from `a` to `b`, exact at both ends.
#[must_use]
pub fn lerp_color(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    Vec3::from(a).lerp(Vec3::from(b), t.clamp(0.0, 1.0)).to_array()
}
