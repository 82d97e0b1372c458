use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Selection", inline)]
#[serde(default)]
/// Picking parameters.
pub struct SelectionOptions {
    /// Pick sphere radius as a multiple of cube size.
    #[schemars(title = "Pick Radius", range(min = 0.5, max = 3.0), extend("step" = 0.1))]
    pub pick_radius_scale: f32,
    /// Run picking in a compute shader instead of on the CPU.
    #[schemars(title = "GPU Picking")]
    pub gpu_picking: bool,
}

impl Default for SelectionOptions {
    fn default() -> Self {
        Self {
            pick_radius_scale: 1.5,
            gpu_picking: false,
        }
    }
}
