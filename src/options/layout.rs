use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::layout::{LayoutParams, LayoutStrategy};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Layout", inline)]
#[serde(default)]
/// Layout strategy and its tunables.
pub struct LayoutOptions {
    /// Strategy selector (`grid`, `temporal-banding`, `categorical-ring`,
    /// `cluster`). Unknown selectors fall back to grid.
    #[schemars(title = "Strategy", with = "String")]
    pub strategy: LayoutStrategy,
    /// Lattice pitch of the grid layout.
    #[schemars(title = "Grid Spacing", range(min = 1.0, max = 10.0))]
    pub grid_spacing: f32,
    /// Distance between adjacent year bands.
    #[schemars(title = "Band Spacing", range(min = 0.5, max = 10.0))]
    pub band_spacing: f32,
    /// Vertical pitch inside a year band.
    #[schemars(title = "Stack Spacing", range(min = 0.5, max = 5.0))]
    pub stack_spacing: f32,
    /// Radius of the category ring.
    #[schemars(title = "Ring Radius", range(min = 5.0, max = 100.0))]
    pub ring_radius: f32,
    /// Half-range of the ring's vertical jitter.
    #[schemars(title = "Ring Jitter", range(min = 0.0, max = 20.0))]
    pub ring_jitter: f32,
    /// Lattice pitch inside a cluster.
    #[schemars(title = "Cluster Spacing", range(min = 1.0, max = 10.0))]
    pub cluster_spacing: f32,
    /// Empty space between neighbouring clusters.
    #[schemars(title = "Cluster Gap", range(min = 0.0, max = 20.0))]
    pub cluster_gap: f32,
    /// Half-range of the cluster's horizontal jitter.
    #[schemars(title = "Cluster Jitter", range(min = 0.0, max = 2.0))]
    pub cluster_jitter: f32,
    /// Cube edge length.
    #[schemars(title = "Cube Size", range(min = 0.1, max = 5.0))]
    pub instance_size: f32,
    /// Fixed seed for the jittered layouts. Unset means a fresh seed per
    /// layout pass.
    #[schemars(skip)]
    pub jitter_seed: Option<u64>,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        let params = LayoutParams::default();
        Self {
            strategy: LayoutStrategy::default(),
            grid_spacing: params.grid_spacing,
            band_spacing: params.band_spacing,
            stack_spacing: params.stack_spacing,
            ring_radius: params.ring_radius,
            ring_jitter: params.ring_jitter,
            cluster_spacing: params.cluster_spacing,
            cluster_gap: params.cluster_gap,
            cluster_jitter: params.cluster_jitter,
            instance_size: params.instance_size,
            jitter_seed: params.jitter_seed,
        }
    }
}

impl LayoutOptions {
    /// The tunables as layout parameters.
    #[must_use]
    pub fn params(&self) -> LayoutParams {
        LayoutParams {
            grid_spacing: self.grid_spacing,
            band_spacing: self.band_spacing,
            stack_spacing: self.stack_spacing,
            ring_radius: self.ring_radius,
            ring_jitter: self.ring_jitter,
            cluster_spacing: self.cluster_spacing,
            cluster_gap: self.cluster_gap,
            cluster_jitter: self.cluster_jitter,
            instance_size: self.instance_size,
            jitter_seed: self.jitter_seed,
        }
    }
}
