//! Input handling
//!
//! Translates raw key and mouse events into camera intents. The window layer
//! (not part of this crate) forwards events through [`CameraController`];
//! once per tick the controller applies what accumulated to the camera.

use bitflags::bitflags;

use crate::core::config::InputConfig;
use crate::foundation::math::utils;
use crate::render::primitives::Camera;

bitflags! {
    /// Movement keys currently held down
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MovementKeys: u8 {
        /// Walk forward along the look vector
        const FORWARD = 1 << 0;
        /// Walk backward
        const BACK = 1 << 1;
        /// Strafe left
        const LEFT = 1 << 2;
        /// Strafe right
        const RIGHT = 1 << 3;
    }
}

/// Key codes the sample reacts to
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
    /// Escape key
    Escape,
    /// Any key without a binding
    Other,
}

impl KeyCode {
    /// Movement bound to the key, if any
    pub fn movement(self) -> Option<MovementKeys> {
        match self {
            Self::W => Some(MovementKeys::FORWARD),
            Self::S => Some(MovementKeys::BACK),
            Self::A => Some(MovementKeys::LEFT),
            Self::D => Some(MovementKeys::RIGHT),
            Self::Escape | Self::Other => None,
        }
    }
}

/// Mouse buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Left mouse button
    Left,
    /// Right mouse button
    Right,
    /// Middle mouse button
    Middle,
}

/// One camera mutation produced by a tick of input
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraIntent {
    /// Move along look by the given distance
    Walk(f32),
    /// Move along right by the given distance
    Strafe(f32),
    /// Rotate about the right vector (radians)
    Pitch(f32),
    /// Rotate about world +Y (radians)
    Yaw(f32),
}

impl CameraIntent {
    /// Forward the intent to the matching camera mutator
    pub fn apply_to(self, camera: &mut Camera) {
        match self {
            Self::Walk(distance) => camera.walk(distance),
            Self::Strafe(distance) => camera.strafe(distance),
            Self::Pitch(angle) => camera.pitch(angle),
            Self::Yaw(angle) => camera.yaw(angle),
        }
    }
}

/// First-person camera controller
///
/// Held movement keys produce a fixed step every tick. Dragging with the left
/// button rotates the camera by a fixed angle per pixel: vertical motion
/// pitches, horizontal motion yaws.
#[derive(Debug, Clone)]
pub struct CameraController {
    config: InputConfig,
    keys: MovementKeys,
    dragging: bool,
    cursor: Option<(f32, f32)>,
    pending_pitch: f32,
    pending_yaw: f32,
    quit_requested: bool,
}

impl CameraController {
    /// Create a controller with the given sensitivity settings
    pub fn new(config: InputConfig) -> Self {
        Self {
            config,
            keys: MovementKeys::empty(),
            dragging: false,
            cursor: None,
            pending_pitch: 0.0,
            pending_yaw: 0.0,
            quit_requested: false,
        }
    }

    /// Record a key press or release
    pub fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        if let Some(flag) = key.movement() {
            self.keys.set(flag, pressed);
        } else if key == KeyCode::Escape && pressed {
            log::info!("Escape pressed, quit requested");
            self.quit_requested = true;
        }
    }

    /// Record a mouse button change at the given cursor position
    pub fn handle_mouse_button(&mut self, button: MouseButton, pressed: bool, x: f32, y: f32) {
        self.cursor = Some((x, y));
        if button == MouseButton::Left {
            self.dragging = pressed;
        }
    }

    /// Record cursor motion; rotation accumulates only while dragging
    pub fn handle_mouse_move(&mut self, x: f32, y: f32) {
        if let (true, Some((last_x, last_y))) = (self.dragging, self.cursor) {
            let per_pixel = utils::deg_to_rad(self.config.mouse_degrees_per_pixel);
            self.pending_pitch += per_pixel * (y - last_y);
            self.pending_yaw += per_pixel * (x - last_x);
        }
        self.cursor = Some((x, y));
    }

    /// Movement keys currently held
    pub fn keys(&self) -> MovementKeys {
        self.keys
    }

    /// Whether Escape was pressed
    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    /// Drain the intents accumulated since the last tick
    ///
    /// Rotation comes first, then movement, so a step taken in the same tick
    /// follows the new heading.
    pub fn take_intents(&mut self) -> Vec<CameraIntent> {
        let mut intents = Vec::with_capacity(4);
        let step = self.config.move_step;

        if self.pending_pitch != 0.0 {
            intents.push(CameraIntent::Pitch(std::mem::take(&mut self.pending_pitch)));
        }
        if self.pending_yaw != 0.0 {
            intents.push(CameraIntent::Yaw(std::mem::take(&mut self.pending_yaw)));
        }

        if self.keys.contains(MovementKeys::FORWARD) {
            intents.push(CameraIntent::Walk(step));
        }
        if self.keys.contains(MovementKeys::BACK) {
            intents.push(CameraIntent::Walk(-step));
        }
        if self.keys.contains(MovementKeys::LEFT) {
            intents.push(CameraIntent::Strafe(-step));
        }
        if self.keys.contains(MovementKeys::RIGHT) {
            intents.push(CameraIntent::Strafe(step));
        }

        intents
    }

    /// Apply this tick's intents and rebuild the view matrix
    pub fn apply(&mut self, camera: &mut Camera) {
        for intent in self.take_intents() {
            intent.apply_to(camera);
        }
        camera.update_view();
    }
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(InputConfig::default())
    }
}
