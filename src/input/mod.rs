//! Input handling: event types, drag tracking, and the input processor
//! that converts raw window events into engine commands.

/// Platform-agnostic input events.
pub mod event;
/// Cursor tracking and click-versus-drag detection.
pub(crate) mod mouse;
/// Converts raw events into engine commands.
pub mod processor;

use serde::{Deserialize, Serialize};

pub use event::{InputEvent, MouseButton};
pub use processor::InputProcessor;

/// Actions that can be bound to keys.
///
/// Serde serializes as `snake_case` strings so TOML presets stay readable:
/// ```toml
/// [keybindings.bindings]
/// cycle_layout = "Tab"
/// move_forward = "KeyW"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyAction {
    /// Fly along the view direction while held.
    MoveForward,
    /// Fly against the view direction while held.
    MoveBackward,
    /// Fly toward screen left while held.
    StrafeLeft,
    /// Fly toward screen right while held.
    StrafeRight,
    /// Switch to the next layout strategy.
    CycleLayout,
    /// Deselect everything.
    ClearSelection,
    /// Delete every selected record.
    DeleteSelected,
}

impl KeyAction {
    /// Whether the action is continuous (held) rather than a one-shot.
    #[must_use]
    pub fn is_movement(self) -> bool {
        matches!(
            self,
            Self::MoveForward
                | Self::MoveBackward
                | Self::StrafeLeft
                | Self::StrafeRight
        )
    }
}
