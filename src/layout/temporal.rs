use glam::Vec3;
use rustc_hash::FxHashMap;

use super::{LayoutParams, Placement};
use crate::scene::record::Record;

/// Year bands spread along +x, records stacked on +y inside a band.
///
/// Stack height is a record's rank among same-year peers in record order,
/// the same order the records are displayed in.
#[derive(Debug, Clone)]
pub struct TemporalPlacement {
    /// Year of each record, by index.
    years: Vec<i32>,
    /// Rank of each record among same-year peers, by index.
    ranks: Vec<u32>,
    mid_year: f32,
    band_spacing: f32,
    stack_spacing: f32,
}

impl TemporalPlacement {
    /// Precompute years and ranks for `records`.
    #[must_use]
    pub fn new(records: &[Record], params: &LayoutParams) -> Self {
        let years: Vec<i32> = records.iter().map(Record::year).collect();
        let mut seen: FxHashMap<i32, u32> = FxHashMap::default();
        let ranks = years
            .iter()
            .map(|year| {
                let count = seen.entry(*year).or_insert(0);
                let rank = *count;
                *count += 1;
                rank
            })
            .collect();
        let min = years.iter().copied().min().unwrap_or(0);
        let max = years.iter().copied().max().unwrap_or(0);

        Self {
            years,
            ranks,
            mid_year: (min as f32 + max as f32) * 0.5,
            band_spacing: params.band_spacing,
            stack_spacing: params.stack_spacing,
        }
    }
}

impl Placement for TemporalPlacement {
    fn position(&mut self, record: &Record, index: usize, _records: &[Record]) -> Vec3 {
        let year = self.years.get(index).copied().unwrap_or_else(|| record.year());
        let rank = self.ranks.get(index).copied().unwrap_or(0);
        Vec3::new(
            (year as f32 - self.mid_year) * self.band_spacing,
            rank as f32 * self.stack_spacing,
            0.0,
        )
    }
}
