use glam::Vec3;
use rand::rngs::StdRng;
use rustc_hash::FxHashMap;

use super::grid::lattice_side;
use super::{symmetric_jitter, LayoutParams, Placement};
use crate::scene::record::Record;

/// One square sub-grid per category, sub-grids tiled on an outer square
/// grid centered on the origin.
///
/// Every sub-grid has the same side, `ceil(sqrt(largest bucket))`, so the
/// clusters tile evenly. Records get a small horizontal jitter.
#[derive(Debug, Clone)]
pub struct ClusterPlacement {
    /// Bucket of each record, by index.
    bucket_of: Vec<usize>,
    /// Rank of each record within its bucket, by index.
    rank_in_bucket: Vec<usize>,
    inner_side: usize,
    outer_side: usize,
    spacing: f32,
    gap: f32,
    jitter: f32,
    rng: StdRng,
}

impl ClusterPlacement {
    /// Bucket `records` by category.
    #[must_use]
    pub fn new(records: &[Record], params: &LayoutParams, rng: StdRng) -> Self {
        let mut bucket_ids: FxHashMap<&str, usize> = FxHashMap::default();
        let mut bucket_sizes: Vec<usize> = Vec::new();
        let mut bucket_of = Vec::with_capacity(records.len());
        let mut rank_in_bucket = Vec::with_capacity(records.len());

        for record in records {
            let next = bucket_ids.len();
            let bucket = *bucket_ids.entry(record.category.as_str()).or_insert(next);
            if bucket == bucket_sizes.len() {
                bucket_sizes.push(0);
            }
            bucket_of.push(bucket);
            rank_in_bucket.push(bucket_sizes[bucket]);
            bucket_sizes[bucket] += 1;
        }

        let largest = bucket_sizes.iter().copied().max().unwrap_or(0);
        Self {
            bucket_of,
            rank_in_bucket,
            inner_side: lattice_side(largest),
            outer_side: lattice_side(bucket_sizes.len()),
            spacing: params.cluster_spacing,
            gap: params.cluster_gap,
            jitter: params.cluster_jitter,
            rng,
        }
    }

    /// Number of buckets.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.bucket_of.iter().copied().max().map_or(0, |b| b + 1)
    }

    /// Distance between the origins of neighbouring clusters.
    #[must_use]
    pub fn cluster_pitch(&self) -> f32 {
        self.inner_side as f32 * self.spacing + self.gap
    }

    /// Center of cluster `bucket` before jitter.
    #[must_use]
    pub fn cluster_center(&self, bucket: usize) -> Vec3 {
        centered_cell(bucket, self.outer_side, self.cluster_pitch())
    }

    fn jitter(&mut self) -> f32 {
        symmetric_jitter(&mut self.rng, self.jitter)
    }
}

impl Placement for ClusterPlacement {
    fn position(&mut self, _record: &Record, index: usize, _records: &[Record]) -> Vec3 {
        let bucket = self.bucket_of.get(index).copied().unwrap_or(0);
        let rank = self.rank_in_bucket.get(index).copied().unwrap_or(0);
        let local = centered_cell(rank, self.inner_side, self.spacing);
        let jitter = Vec3::new(self.jitter(), 0.0, self.jitter());
        self.cluster_center(bucket) + local + jitter
    }
}

/// Cell `index` of a `side × side` lattice with pitch `pitch`, centered on
/// the origin in the `y = 0` plane.
fn centered_cell(index: usize, side: usize, pitch: f32) -> Vec3 {
    let side = side.max(1);
    let offset = (side - 1) as f32 * 0.5;
    Vec3::new(
        ((index % side) as f32 - offset) * pitch,
        0.0,
        ((index / side) as f32 - offset) * pitch,
    )
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    fn records() -> Vec<Record> {
        let mut out = Vec::new();
        for i in 0..9 {
            out.push(Record::new(format!("a{i}"), "", "a"));
        }
        for i in 0..3 {
            out.push(Record::new(format!("b{i}"), "", "b"));
        }
        out
    }

    #[test]
    fn buckets_share_a_fixed_sub_grid_size() {
        let records = records();
        let params = LayoutParams {
            cluster_jitter: 0.0,
            ..LayoutParams::default()
        };
        let mut clusters =
            ClusterPlacement::new(&records, &params, StdRng::seed_from_u64(1));
        assert_eq!(clusters.bucket_count(), 2);
        assert_eq!(clusters.inner_side, 3);
        assert_eq!(clusters.outer_side, 2);

        let center_a = clusters.cluster_center(0);
        let middle_of_a = clusters.position(&records[4], 4, &records);
        assert!(middle_of_a.abs_diff_eq(center_a, 1e-5));

        let first_b = clusters.position(&records[9], 9, &records);
        let center_b = clusters.cluster_center(1);
        assert!(first_b.abs_diff_eq(
            center_b + Vec3::new(-params.cluster_spacing, 0.0, -params.cluster_spacing),
            1e-5
        ));
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let records = records();
        let params = LayoutParams::default();
        let mut jittered =
            ClusterPlacement::new(&records, &params, StdRng::seed_from_u64(3));
        let center = jittered.cluster_center(0);
        let p = jittered.position(&records[4], 4, &records);
        assert!((p.x - center.x).abs() <= params.cluster_jitter + 1e-6);
        assert!((p.z - center.z).abs() <= params.cluster_jitter + 1e-6);
        assert_eq!(p.y, 0.0);
    }
}
