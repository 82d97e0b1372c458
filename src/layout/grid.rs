use glam::Vec3;

use super::Placement;
use crate::scene::record::Record;

/// Square lattice of side `ceil(sqrt(n))`, centered on the origin in the
/// `y = 0` plane. Record `i` lands in column `i mod side`, row
/// `i div side`.
#[derive(Debug, Clone, Copy)]
pub struct GridPlacement {
    side: usize,
    spacing: f32,
}

impl GridPlacement {
    /// Lattice sized for `count` records.
    #[must_use]
    pub fn new(count: usize, spacing: f32) -> Self {
        Self {
            side: lattice_side(count),
            spacing,
        }
    }

    /// Cells per row.
    #[must_use]
    pub fn side(&self) -> usize {
        self.side
    }

    /// Centered position of cell `index` on this lattice.
    #[must_use]
    pub fn cell(&self, index: usize) -> Vec3 {
        let offset = (self.side - 1) as f32 * 0.5;
        let col = (index % self.side) as f32;
        let row = (index / self.side) as f32;
        Vec3::new(
            (col - offset) * self.spacing,
            0.0,
            (row - offset) * self.spacing,
        )
    }
}

impl Placement for GridPlacement {
    fn position(&mut self, _record: &Record, index: usize, _records: &[Record]) -> Vec3 {
        self.cell(index)
    }
}

/// Smallest side whose square holds `count` cells (at least 1).
#[must_use]
pub(crate) fn lattice_side(count: usize) -> usize {
    let mut side = (count as f64).sqrt().ceil() as usize;
    // Guard against float rounding on large counts.
    while side * side < count {
        side += 1;
    }
    side.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lattice_side_is_ceil_sqrt() {
        assert_eq!(lattice_side(0), 1);
        assert_eq!(lattice_side(1), 1);
        assert_eq!(lattice_side(4), 2);
        assert_eq!(lattice_side(5), 3);
        assert_eq!(lattice_side(10_000), 100);
        assert_eq!(lattice_side(10_001), 101);
    }

    #[test]
    fn lattice_is_centered() {
        let grid = GridPlacement::new(9, 2.5);
        assert_eq!(grid.cell(4), Vec3::ZERO);
        assert_eq!(grid.cell(0), Vec3::new(-2.5, 0.0, -2.5));
        assert_eq!(grid.cell(8), Vec3::new(2.5, 0.0, 2.5));
    }
}
