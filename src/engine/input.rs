//! Keyboard, mouse, and scroll state shared with systems.
//!
//! The host event loop writes device state into the [`InputManager`]
//! resource; systems read it during any stage from `pre_update` onward.
//! [`InputPlugin`] registers a `cleanup` system that rolls per-frame edge
//! state (just-pressed / just-released / scroll delta) over at the end of
//! each frame.

use std::collections::HashSet;
use std::hash::Hash;

use crate::engine::app::App;
use crate::engine::error::EcsResult;
use crate::engine::plugin::Plugin;
use crate::engine::systems::{FnSystem, Stage};


/// Name of the system registered by [`InputPlugin`].
pub const INPUT_SYSTEM: &str = "input::roll_over";

/// Host-agnostic key identifiers.
///
/// Windowing is out of scope for the engine, so hosts map their
/// library's key codes onto this set; anything uncommon travels through
/// `Other`.

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[allow(missing_docs)]
pub enum KeyCode {
    Left,
    Right,
    Up,
    Down,
    Space,
    Escape,
    Enter,
    Tab,
    LeftShift,
    W,
    A,
    S,
    D,
    P,
    Q,
    R,
    /// Any key not covered by a named variant, by host scan code.
    Other(u32),
}

/// Host-agnostic mouse button identifiers.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[allow(missing_docs)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    /// Any additional button, by host index.
    Other(u16),
}

/// Cursor position in window coordinates.
#[derive(Clone, Copy, Debug, Default)]
pub struct CursorPosition {
    /// Horizontal position in pixels.
    pub x: f32,
    /// Vertical position in pixels.
    pub y: f32,
}

/// Tracks the state of a set of inputs (keys or buttons).
///
/// - `pressed`: currently held down
/// - `just_pressed`: transitioned to pressed this frame
/// - `just_released`: transitioned to released this frame

pub struct Input<T: Eq + Hash + Copy> {
    pressed: HashSet<T>,
    just_pressed: HashSet<T>,
    just_released: HashSet<T>,
}

impl<T: Eq + Hash + Copy> Input<T> {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self {
            pressed: HashSet::new(),
            just_pressed: HashSet::new(),
            just_released: HashSet::new(),
        }
    }

    /// Returns `true` if the input is currently held down.
    pub fn pressed(&self, input: T) -> bool {
        self.pressed.contains(&input)
    }

    /// Returns `true` if the input was pressed this frame.
    pub fn just_pressed(&self, input: T) -> bool {
        self.just_pressed.contains(&input)
    }

    /// Returns `true` if the input was released this frame.
    pub fn just_released(&self, input: T) -> bool {
        self.just_released.contains(&input)
    }

    /// Records a press event from the host.
    pub fn press(&mut self, input: T) {
        if self.pressed.insert(input) {
            self.just_pressed.insert(input);
        }
    }

    /// Records a release event from the host.
    pub fn release(&mut self, input: T) {
        if self.pressed.remove(&input) {
            self.just_released.insert(input);
        }
    }

    /// Clears per-frame edge state. Held inputs stay pressed.
    pub fn clear_just(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }
}

impl<T: Eq + Hash + Copy> Default for Input<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-frame device state written by the host event loop.
#[derive(Default)]
pub struct InputManager {
    /// Keyboard state.
    pub keys: Input<KeyCode>,
    /// Mouse button state.
    pub mouse_buttons: Input<MouseButton>,
    /// Cursor position in window coordinates.
    pub cursor: CursorPosition,
    /// Scroll wheel delta accumulated this frame.
    pub scroll_delta: (f32, f32),
}

impl InputManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rolls per-frame state over at a frame boundary.
    pub fn roll_over(&mut self) {
        self.keys.clear_just();
        self.mouse_buttons.clear_just();
        self.scroll_delta = (0.0, 0.0);
    }
}

/// Inserts the [`InputManager`] resource and its frame-rollover system.
pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn name(&self) -> &str {
        "input"
    }

    fn build(&mut self, app: &mut App) -> EcsResult<()> {
        app.insert_resource(InputManager::new());

        app.add_system(
            FnSystem::new(INPUT_SYSTEM, |app: &mut App, _dt| {
                if let Some(input) = app.resources.get_mut::<InputManager>() {
                    input.roll_over();
                }
                Ok(())
            }),
            Stage::Cleanup,
        )
    }
}
