//! Layout engine: maps records to per-instance position, color and size.
//!
//! A layout pass is a pure function of the record slice, the strategy and
//! its [`LayoutParams`]. Each strategy builds whatever lookup it needs
//! (bucket ranks, category slots) once per pass, then places records one
//! at a time through the [`Placement`] trait. Color never depends on the
//! strategy; it comes from the temporal ramp in [`color`].

/// Temporal color ramp.
pub mod color;

mod cluster;
mod grid;
mod ring;
mod temporal;

use std::fmt;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

pub use cluster::ClusterPlacement;
pub use color::YearRange;
pub use grid::GridPlacement;
pub use ring::RingPlacement;
pub use temporal::TemporalPlacement;

use crate::scene::record::Record;

/// Per-instance attributes as laid out in the instance storage buffer.
///
/// Matches the WGSL struct `InstanceAttributes` (32 bytes): each `vec3`
/// shares its 16-byte row with the following scalar.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct InstanceAttributes {
    /// World-space cube center.
    pub position: [f32; 3],
    /// Cube edge length.
    pub size: f32,
    /// Linear RGB in `[0, 1]`.
    pub color: [f32; 3],
    /// `1.0` when the record is selected, `0.0` otherwise.
    pub selected: f32,
}

impl InstanceAttributes {
    /// Whether the `selected` flag is set.
    #[must_use]
    pub fn is_selected(&self) -> bool {
        self.selected > 0.5
    }

    /// Center as a vector.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }
}

/// Which spatial rule places the records.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(from = "String", into = "String")]
pub enum LayoutStrategy {
    /// Square lattice centered at the origin.
    #[default]
    Grid,
    /// Vertical stacks per year, spread along +x.
    TemporalBanding,
    /// One spoke per category on a circle.
    CategoricalRing,
    /// One square sub-grid per category.
    Cluster,
}

impl LayoutStrategy {
    /// Every strategy, in cycling order.
    pub const ALL: [Self; 4] = [
        Self::Grid,
        Self::TemporalBanding,
        Self::CategoricalRing,
        Self::Cluster,
    ];

    /// Resolve a selector string. Unknown selectors fall back to
    /// [`LayoutStrategy::Grid`].
    #[must_use]
    pub fn from_selector(selector: &str) -> Self {
        match selector.trim().to_ascii_lowercase().as_str() {
            "grid" => Self::Grid,
            "temporal-banding" | "temporal" | "timeline" => {
                Self::TemporalBanding
            }
            "categorical-ring" | "ring" | "category" => Self::CategoricalRing,
            "cluster" | "clusters" => Self::Cluster,
            other => {
                log::warn!("unknown layout strategy '{other}', using grid");
                Self::Grid
            }
        }
    }

    /// Canonical selector string.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Grid => "grid",
            Self::TemporalBanding => "temporal-banding",
            Self::CategoricalRing => "categorical-ring",
            Self::Cluster => "cluster",
        }
    }

    /// The strategy after this one in [`LayoutStrategy::ALL`].
    #[must_use]
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Whether positions depend on the jitter source.
    #[must_use]
    pub fn is_jittered(self) -> bool {
        matches!(self, Self::CategoricalRing | Self::Cluster)
    }
}

impl fmt::Display for LayoutStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for LayoutStrategy {
    fn from(selector: String) -> Self {
        Self::from_selector(&selector)
    }
}

impl From<LayoutStrategy> for String {
    fn from(strategy: LayoutStrategy) -> Self {
        strategy.as_str().to_owned()
    }
}

/// Tunables shared by all strategies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutParams {
    /// Lattice pitch of the grid layout.
    pub grid_spacing: f32,
    /// Distance between adjacent year bands.
    pub band_spacing: f32,
    /// Vertical pitch inside a year band.
    pub stack_spacing: f32,
    /// Radius of the category ring.
    pub ring_radius: f32,
    /// Half-range of the ring's vertical jitter.
    pub ring_jitter: f32,
    /// Lattice pitch inside a cluster.
    pub cluster_spacing: f32,
    /// Empty space between neighbouring clusters.
    pub cluster_gap: f32,
    /// Half-range of the cluster's horizontal jitter.
    pub cluster_jitter: f32,
    /// Cube edge length written to every instance.
    pub instance_size: f32,
    /// Seed for jittered strategies; `None` draws a fresh seed per pass.
    pub jitter_seed: Option<u64>,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            grid_spacing: 2.5,
            band_spacing: 3.0,
            stack_spacing: 1.5,
            ring_radius: 20.0,
            ring_jitter: 4.0,
            cluster_spacing: 2.0,
            cluster_gap: 4.0,
            cluster_jitter: 0.35,
            instance_size: 1.0,
            jitter_seed: None,
        }
    }
}

impl LayoutParams {
    /// Replace non-finite or negative values with the defaults so a bad
    /// preset can never produce NaN positions.
    #[must_use]
    pub fn sanitized(self) -> Self {
        let d = Self::default();
        let pick = |v: f32, fallback: f32| {
            if v.is_finite() && v >= 0.0 {
                v
            } else {
                fallback
            }
        };
        Self {
            grid_spacing: pick(self.grid_spacing, d.grid_spacing),
            band_spacing: pick(self.band_spacing, d.band_spacing),
            stack_spacing: pick(self.stack_spacing, d.stack_spacing),
            ring_radius: pick(self.ring_radius, d.ring_radius),
            ring_jitter: pick(self.ring_jitter, d.ring_jitter),
            cluster_spacing: pick(self.cluster_spacing, d.cluster_spacing),
            cluster_gap: pick(self.cluster_gap, d.cluster_gap),
            cluster_jitter: pick(self.cluster_jitter, d.cluster_jitter),
            instance_size: pick(self.instance_size, d.instance_size),
            jitter_seed: self.jitter_seed,
        }
    }

    fn jitter_rng(&self) -> StdRng {
        match self.jitter_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        }
    }
}

/// Uniform sample in `[-half_range, half_range)`, finite for any finite
/// `half_range`.
fn symmetric_jitter(rng: &mut StdRng, half_range: f32) -> f32 {
    if half_range > 0.0 {
        rng.random::<f32>().mul_add(2.0, -1.0) * half_range
    } else {
        0.0
    }
}

/// A spatial rule: where does the record at `index` go?
///
/// Implementations precompute their lookups when constructed and may
/// carry mutable state (a jitter generator), hence `&mut self`.
pub trait Placement {
    /// World-space position for `record`, which sits at `index` in
    /// `records`.
    fn position(&mut self, record: &Record, index: usize, records: &[Record])
        -> Vec3;
}

/// Build the placement for `strategy` over `records`.
#[must_use]
pub fn placement_for(
    strategy: LayoutStrategy,
    records: &[Record],
    params: &LayoutParams,
) -> Box<dyn Placement> {
    match strategy {
        LayoutStrategy::Grid => {
            Box::new(GridPlacement::new(records.len(), params.grid_spacing))
        }
        LayoutStrategy::TemporalBanding => {
            Box::new(TemporalPlacement::new(records, params))
        }
        LayoutStrategy::CategoricalRing => {
            Box::new(RingPlacement::new(records, params, params.jitter_rng()))
        }
        LayoutStrategy::Cluster => Box::new(ClusterPlacement::new(
            records,
            params,
            params.jitter_rng(),
        )),
    }
}

/// Compute one [`InstanceAttributes`] per record, in record order.
///
/// `selected` is left at `0.0`; the instance store reapplies selection
/// flags after every pass.
#[must_use]
pub fn compute_layout(
    records: &[Record],
    strategy: LayoutStrategy,
    params: &LayoutParams,
) -> Vec<InstanceAttributes> {
    if records.is_empty() {
        return Vec::new();
    }
    let params = params.sanitized();
    let years = YearRange::of(records);
    let mut placement = placement_for(strategy, records, &params);

    log::debug!(
        "layout pass: {} records, strategy {strategy}, years {}..={}",
        records.len(),
        years.min,
        years.max
    );

    records
        .iter()
        .enumerate()
        .map(|(index, record)| InstanceAttributes {
            position: placement.position(record, index, records).to_array(),
            size: params.instance_size,
            color: years.color_of(record.year()),
            selected: 0.0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| {
                Record::new(
                    format!("r{i}"),
                    if i % 7 == 0 {
                        "n/a".to_owned()
                    } else {
                        (1970 + i % 40).to_string()
                    },
                    ["a", "b", "c"][i % 3],
                )
            })
            .collect()
    }

    #[test]
    fn every_strategy_returns_one_finite_attribute_per_record() {
        let records = sample(137);
        for strategy in LayoutStrategy::ALL {
            let attrs =
                compute_layout(&records, strategy, &LayoutParams::default());
            assert_eq!(attrs.len(), records.len(), "{strategy}");
            for a in &attrs {
                assert!(a.center().is_finite(), "{strategy}: {a:?}");
                assert!(a.color.iter().all(|c| (0.0..=1.0).contains(c)));
                assert_eq!(a.selected, 0.0);
            }
        }
    }

    #[test]
    fn empty_records_yield_empty_layout() {
        for strategy in LayoutStrategy::ALL {
            assert!(compute_layout(&[], strategy, &LayoutParams::default())
                .is_empty());
        }
    }

    #[test]
    fn four_record_grid_scenario() {
        let records = vec![
            Record::new("a", "1990", "x"),
            Record::new("b", "1990", "x"),
            Record::new("c", "2000", "y"),
            Record::new("d", "2010", "y"),
        ];
        let attrs = compute_layout(
            &records,
            LayoutStrategy::Grid,
            &LayoutParams::default(),
        );
        let expected = [
            [-1.25, 0.0, -1.25],
            [1.25, 0.0, -1.25],
            [-1.25, 0.0, 1.25],
            [1.25, 0.0, 1.25],
        ];
        for (a, e) in attrs.iter().zip(expected) {
            assert!(a.center().abs_diff_eq(Vec3::from_array(e), 1e-6));
        }
        assert_eq!(attrs[0].color, attrs[1].color);
        assert!(attrs[3].color[0] > attrs[0].color[0]);
    }

    #[test]
    fn unknown_selector_falls_back_to_grid() {
        assert_eq!(LayoutStrategy::from_selector("spiral"), LayoutStrategy::Grid);
        assert_eq!(
            LayoutStrategy::from_selector(" Categorical-Ring "),
            LayoutStrategy::CategoricalRing
        );
        let parsed: LayoutStrategy =
            serde_json::from_str("\"hexagonal\"").unwrap();
        assert_eq!(parsed, LayoutStrategy::Grid);
        assert_eq!(
            serde_json::to_string(&LayoutStrategy::Cluster).unwrap(),
            "\"cluster\""
        );
    }

    #[test]
    fn seeded_jitter_is_reproducible() {
        let records = sample(60);
        let params = LayoutParams {
            jitter_seed: Some(42),
            ..LayoutParams::default()
        };
        for strategy in [LayoutStrategy::CategoricalRing, LayoutStrategy::Cluster]
        {
            let a = compute_layout(&records, strategy, &params);
            let b = compute_layout(&records, strategy, &params);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn sanitized_params_replace_nan() {
        let params = LayoutParams {
            grid_spacing: f32::NAN,
            instance_size: -1.0,
            ..LayoutParams::default()
        }
        .sanitized();
        assert_eq!(params.grid_spacing, 2.5);
        assert_eq!(params.instance_size, 1.0);
    }

    #[test]
    fn huge_jitter_stays_finite() {
        let records = sample(40);
        let params = LayoutParams {
            ring_jitter: f32::MAX,
            cluster_jitter: f32::MAX,
            jitter_seed: Some(1),
            ..LayoutParams::default()
        };
        for strategy in [LayoutStrategy::CategoricalRing, LayoutStrategy::Cluster]
        {
            let attrs = compute_layout(&records, strategy, &params);
            assert_eq!(attrs.len(), records.len());
            assert!(attrs.iter().all(|a| a.center().is_finite()), "{strategy}");
        }
    }

    #[test]
    fn extreme_years_still_lay_out_every_record() {
        let records = vec![
            Record::new("a", "-2147483648", "x"),
            Record::new("b", "2147483647", "y"),
            Record::new("c", "2000", "x"),
        ];
        for strategy in LayoutStrategy::ALL {
            let attrs = compute_layout(&records, strategy, &LayoutParams::default());
            assert_eq!(attrs.len(), records.len(), "{strategy}");
            assert!(attrs.iter().all(|a| a.color.iter().all(|c| c.is_finite())));
        }
    }

    #[test]
    fn strategies_cycle_through_all() {
        let mut s = LayoutStrategy::Grid;
        for _ in 0..LayoutStrategy::ALL.len() {
            s = s.next();
        }
        assert_eq!(s, LayoutStrategy::Grid);
    }

    #[test]
    fn instance_attributes_are_32_bytes() {
        assert_eq!(size_of::<InstanceAttributes>(), 32);
    }
}
