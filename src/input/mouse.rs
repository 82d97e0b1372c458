/// Cursor travel in pixels beyond which a press becomes a drag.
const DRAG_THRESHOLD: f32 = 4.0;

/// Result of releasing the primary button.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Release {
    /// The press moved too far; it was a look gesture.
    Drag,
    /// A click at the release position.
    Click {
        /// Horizontal position in physical pixels.
        x: f32,
        /// Vertical position in physical pixels.
        y: f32,
    },
}

/// Tracks cursor position and whether the current press is a drag.
pub(crate) struct MouseState {
    pub(crate) position: (f32, f32),
    press_origin: Option<(f32, f32)>,
    dragging: bool,
}

impl MouseState {
    pub(crate) fn new() -> Self {
        Self {
            position: (0.0, 0.0),
            press_origin: None,
            dragging: false,
        }
    }

    pub(crate) fn is_pressed(&self) -> bool {
        self.press_origin.is_some()
    }

    /// Move the cursor and return the delta from the previous position.
    pub(crate) fn move_to(&mut self, x: f32, y: f32) -> (f32, f32) {
        let delta = (x - self.position.0, y - self.position.1);
        self.position = (x, y);
        if let Some((ox, oy)) = self.press_origin {
            if (x - ox).hypot(y - oy) > DRAG_THRESHOLD {
                self.dragging = true;
            }
        }
        delta
    }

    /// Whether the current press has moved far enough to count as a drag.
    pub(crate) fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub(crate) fn press(&mut self) {
        self.press_origin = Some(self.position);
        self.dragging = false;
    }

    /// End the press. Returns `None` if no press was active.
    pub(crate) fn release(&mut self) -> Option<Release> {
        let _ = self.press_origin.take()?;
        let was_dragging = std::mem::take(&mut self.dragging);
        Some(if was_dragging {
            Release::Drag
        } else {
            Release::Click {
                x: self.position.0,
                y: self.position.1,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_jitter_is_still_a_click() {
        let mut mouse = MouseState::new();
        let _ = mouse.move_to(100.0, 100.0);
        mouse.press();
        let _ = mouse.move_to(102.0, 101.0);
        assert_eq!(mouse.release(), Some(Release::Click { x: 102.0, y: 101.0 }));
    }

    #[test]
    fn long_travel_is_a_drag() {
        let mut mouse = MouseState::new();
        mouse.press();
        let _ = mouse.move_to(30.0, 0.0);
        assert!(mouse.is_dragging());
        assert_eq!(mouse.release(), Some(Release::Drag));
        assert_eq!(mouse.release(), None);
    }
}
