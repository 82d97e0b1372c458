//! Converts raw platform events into engine commands.
//!
//! The `InputProcessor` owns all transient input state (cursor tracking,
//! drag detection, held movement keys, the shift modifier) and the
//! key-binding map. It is the only thing between raw window events and
//! [`CubeEngine::execute`](crate::engine::CubeEngine::execute).

use rustc_hash::FxHashSet;

use super::event::{InputEvent, MouseButton};
use super::mouse::{MouseState, Release};
use super::KeyAction;
use crate::engine::command::Command;
use crate::options::KeybindingOptions;

/// Converts raw window events into [`Command`]s.
///
/// # Usage
///
/// ```ignore
/// if let Some(cmd) = input.handle_event(event) {
///     engine.execute(cmd);
/// }
/// let (forward, right) = input.fly_axes();
/// ```
pub struct InputProcessor {
    mouse: MouseState,
    shift_pressed: bool,
    /// Movement actions whose key is currently down.
    held: FxHashSet<KeyAction>,
    key_bindings: KeybindingOptions,
}

impl InputProcessor {
    /// Create a processor with default key bindings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_key_bindings(KeybindingOptions::default())
    }

    /// Create a processor with custom key bindings.
    #[must_use]
    pub fn with_key_bindings(key_bindings: KeybindingOptions) -> Self {
        Self {
            mouse: MouseState::new(),
            shift_pressed: false,
            held: FxHashSet::default(),
            key_bindings,
        }
    }

    /// Replace the key bindings. Held keys are released.
    pub fn set_key_bindings(&mut self, key_bindings: KeybindingOptions) {
        self.key_bindings = key_bindings;
        self.held.clear();
    }

    /// Current cursor position in physical pixels.
    #[must_use]
    pub fn mouse_pos(&self) -> (f32, f32) {
        self.mouse.position
    }

    /// Whether the shift modifier is held.
    #[must_use]
    pub fn shift_pressed(&self) -> bool {
        self.shift_pressed
    }

    /// Fly axes from the held movement keys: `(forward, right)`, each in
    /// `{-1, 0, 1}`. Opposing keys cancel.
    #[must_use]
    pub fn fly_axes(&self) -> (f32, f32) {
        let axis = |pos: KeyAction, neg: KeyAction| {
            f32::from(u8::from(self.held.contains(&pos)))
                - f32::from(u8::from(self.held.contains(&neg)))
        };
        (
            axis(KeyAction::MoveForward, KeyAction::MoveBackward),
            axis(KeyAction::StrafeRight, KeyAction::StrafeLeft),
        )
    }

    /// Process a raw input event and return zero or one commands.
    pub fn handle_event(&mut self, event: InputEvent) -> Option<Command> {
        match event {
            InputEvent::CursorMoved { x, y } => self.handle_cursor_moved(x, y),
            InputEvent::MouseButton { button, pressed } => {
                self.handle_mouse_button(button, pressed)
            }
            InputEvent::Key { code, pressed } => {
                self.handle_key(&code, pressed)
            }
            InputEvent::ModifiersChanged { shift } => {
                self.shift_pressed = shift;
                None
            }
            InputEvent::FocusLost => {
                self.held.clear();
                self.shift_pressed = false;
                let _ = self.mouse.release();
                None
            }
        }
    }

    /// Dragging with the primary button held looks around.
    fn handle_cursor_moved(&mut self, x: f32, y: f32) -> Option<Command> {
        let (dx, dy) = self.mouse.move_to(x, y);
        (self.mouse.is_pressed() && self.mouse.is_dragging())
            .then_some(Command::Look { dx, dy })
    }

    fn handle_mouse_button(
        &mut self,
        button: MouseButton,
        pressed: bool,
    ) -> Option<Command> {
        if button != MouseButton::Left {
            return None;
        }
        if pressed {
            self.mouse.press();
            return None;
        }
        match self.mouse.release()? {
            Release::Drag => None,
            Release::Click { x, y } => Some(Command::Pick {
                x,
                y,
                extend: self.shift_pressed,
            }),
        }
    }

    fn handle_key(&mut self, code: &str, pressed: bool) -> Option<Command> {
        let action = self.key_bindings.lookup(code)?;
        if action.is_movement() {
            if pressed {
                let _ = self.held.insert(action);
            } else {
                let _ = self.held.remove(&action);
            }
            return None;
        }
        if !pressed {
            return None;
        }
        match action {
            KeyAction::CycleLayout => Some(Command::CycleLayout),
            KeyAction::ClearSelection => Some(Command::ClearSelection),
            KeyAction::DeleteSelected => Some(Command::DeleteSelected),
            KeyAction::MoveForward
            | KeyAction::MoveBackward
            | KeyAction::StrafeLeft
            | KeyAction::StrafeRight => None,
        }
    }
}

impl Default for InputProcessor {
    fn default() -> Self {
        Self::new()
    }
}
