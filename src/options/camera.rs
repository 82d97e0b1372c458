use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Camera", inline)]
#[serde(default)]
/// Camera projection and fly-control parameters.
pub struct CameraOptions {
    /// Vertical field of view in degrees.
    #[schemars(title = "Field of View", range(min = 20.0, max = 120.0), extend("step" = 1.0))]
    pub fovy: f32,
    /// Near clipping plane distance.
    #[schemars(skip)]
    pub znear: f32,
    /// Far clipping plane distance.
    #[schemars(skip)]
    pub zfar: f32,
    /// Fly speed in world units per second.
    #[schemars(title = "Move Speed", range(min = 0.5, max = 100.0), extend("step" = 0.5))]
    pub move_speed: f32,
    /// Mouse-look radians per pixel of cursor travel.
    #[schemars(title = "Look Sensitivity", range(min = 0.0005, max = 0.01), extend("step" = 0.0005))]
    pub look_sensitivity: f32,
    /// Increment of the uniform block's `time` per camera update.
    #[schemars(skip)]
    pub time_step: f32,
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            fovy: 60.0,
            znear: 0.1,
            zfar: 1000.0,
            move_speed: 10.0,
            look_sensitivity: 0.003,
            time_step: 1.0 / 60.0,
        }
    }
}
