//! Input management system
//!
//! Key events arrive whenever the host delivers them; the manager folds them
//! into a set of held keys and the simulation reads one [`ControlState`]
//! snapshot per tick. The most recent event for a key wins.

use std::collections::{HashMap, HashSet};

/// Key codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// W key
    W,
    /// A key
    A,
    /// S key
    S,
    /// D key
    D,
    /// C key
    C,
    /// R key
    R,
    /// Space key
    Space,
    /// Up arrow
    Up,
    /// Down arrow
    Down,
    /// Left arrow
    Left,
    /// Right arrow
    Right,
    /// Either shift key
    Shift,
    /// Either control key
    Control,
}

/// Logical controls a key can be bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    /// Accelerate forwards
    Forward,
    /// Brake, then reverse
    Backward,
    /// Steer left
    SteerLeft,
    /// Steer right
    SteerRight,
    /// Full brake
    Brake,
    /// Advance to the next primary camera mode
    CycleCameraMode,
    /// Look out of the left side while held
    HoldLeftView,
    /// Look out of the right side while held
    HoldRightView,
    /// Put the vehicle back on its spawn pose
    Respawn,
}

/// Fixed-shape control snapshot for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct ControlState {
    /// Accelerate forwards
    pub forward: bool,
    /// Brake, then reverse
    pub backward: bool,
    /// Steer left
    pub steer_left: bool,
    /// Steer right
    pub steer_right: bool,
    /// Full brake
    pub brake: bool,
    /// Camera cycle key is held (edge detection is the rig's job)
    pub cycle_camera_mode: bool,
    /// Left side view is held
    pub hold_left_view: bool,
    /// Right side view is held
    pub hold_right_view: bool,
    /// Respawn key is held
    pub respawn: bool,
}

/// Input manager
#[derive(Debug, Clone)]
pub struct InputManager {
    held: HashSet<KeyCode>,
    bindings: HashMap<KeyCode, Control>,
}

impl InputManager {
    /// Create an input manager with the default bindings
    ///
    /// WASD or arrows drive, Space brakes, C cycles the camera, Shift and
    /// Control hold the side views, R respawns.
    pub fn new() -> Self {
        let bindings = [
            (KeyCode::W, Control::Forward),
            (KeyCode::Up, Control::Forward),
            (KeyCode::S, Control::Backward),
            (KeyCode::Down, Control::Backward),
            (KeyCode::A, Control::SteerLeft),
            (KeyCode::Left, Control::SteerLeft),
            (KeyCode::D, Control::SteerRight),
            (KeyCode::Right, Control::SteerRight),
            (KeyCode::Space, Control::Brake),
            (KeyCode::C, Control::CycleCameraMode),
            (KeyCode::Shift, Control::HoldLeftView),
            (KeyCode::Control, Control::HoldRightView),
            (KeyCode::R, Control::Respawn),
        ]
        .into_iter()
        .collect();

        Self {
            held: HashSet::new(),
            bindings,
        }
    }

    /// Bind `key` to `control`, replacing any previous binding of that key
    pub fn bind(&mut self, key: KeyCode, control: Control) {
        self.bindings.insert(key, control);
    }

    /// Handle key input
    pub fn handle_key_input(&mut self, key: KeyCode, pressed: bool) {
        if pressed {
            self.held.insert(key);
        } else {
            self.held.remove(&key);
        }
    }

    /// Release every key, e.g. when the window loses focus
    pub fn release_all(&mut self) {
        self.held.clear();
    }

    /// Whether `key` is currently held
    pub fn is_held(&self, key: KeyCode) -> bool {
        self.held.contains(&key)
    }

    /// Current control snapshot
    pub fn snapshot(&self) -> ControlState {
        let mut state = ControlState::default();
        for control in self.held.iter().filter_map(|key| self.bindings.get(key)) {
            match control {
                Control::Forward => state.forward = true,
                Control::Backward => state.backward = true,
                Control::SteerLeft => state.steer_left = true,
                Control::SteerRight => state.steer_right = true,
                Control::Brake => state.brake = true,
                Control::CycleCameraMode => state.cycle_camera_mode = true,
                Control::HoldLeftView => state.hold_left_view = true,
                Control::HoldRightView => state.hold_right_view = true,
                Control::Respawn => state.respawn = true,
            }
        }
        state
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_event_wins() {
        let mut input = InputManager::new();
        input.handle_key_input(KeyCode::W, true);
        input.handle_key_input(KeyCode::W, false);
        input.handle_key_input(KeyCode::W, true);
        assert!(input.snapshot().forward);

        input.handle_key_input(KeyCode::W, false);
        assert_eq!(input.snapshot(), ControlState::default());
    }

    #[test]
    fn test_alternate_bindings_share_a_control() {
        let mut input = InputManager::new();
        input.handle_key_input(KeyCode::Up, true);
        input.handle_key_input(KeyCode::A, true);
        input.handle_key_input(KeyCode::Shift, true);

        let state = input.snapshot();
        assert!(state.forward);
        assert!(state.steer_left);
        assert!(state.hold_left_view);
        assert!(!state.backward);
    }

    #[test]
    fn test_rebinding_and_release_all() {
        let mut input = InputManager::new();
        input.bind(KeyCode::Space, Control::Respawn);
        input.handle_key_input(KeyCode::Space, true);
        assert!(input.snapshot().respawn);
        assert!(!input.snapshot().brake);

        input.release_all();
        assert!(!input.is_held(KeyCode::Space));
    }
}
