//! The engine's complete interactive vocabulary.
//!
//! Every user-facing operation, whether triggered by a key press, a mouse
//! gesture or a programmatic call, is a `Command` passed to
//! [`CubeEngine::execute`](super::CubeEngine::execute).

use crate::layout::LayoutStrategy;
use crate::scene::record::RecordId;

/// A discrete engine operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Mouse-look by a cursor delta in pixels.
    Look {
        /// Horizontal delta; positive is rightward.
        dx: f32,
        /// Vertical delta; positive is downward.
        dy: f32,
    },
    /// Pick under a screen position. A plain click selects only the hit
    /// record (or clears on background); `extend` toggles it into the
    /// existing selection instead.
    Pick {
        /// Horizontal position in physical pixels.
        x: f32,
        /// Vertical position in physical pixels.
        y: f32,
        /// Shift-click semantics.
        extend: bool,
    },
    /// Switch to the next layout strategy.
    CycleLayout,
    /// Switch to a specific layout strategy.
    SetLayout(LayoutStrategy),
    /// Select or deselect one record by id.
    Select {
        /// Record to change.
        id: RecordId,
        /// New state.
        selected: bool,
    },
    /// Deselect everything.
    ClearSelection,
    /// Delete every selected record.
    DeleteSelected,
}
