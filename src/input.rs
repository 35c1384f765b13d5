//! Toolkit-independent input events for viewport surfaces.
//!
//! The host translates winit events with [`translate_window_event`]; the
//! surface only ever sees [`InputEvent`], which keeps it drivable from tests.

use winit::event::{ElementState, MouseButton as WinitMouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Keys the viewport reacts to. Everything else maps to `Other`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    /// Toggles perspective/orthographic projection.
    P,
    /// Resets the camera to the known-good view.
    R,
    Other,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u16),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ButtonState {
    Pressed,
    Released,
}

/// Wheel motion. `Line` is in notches, `Pixel` is high precision touchpad input.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum WheelDelta {
    Line(f32),
    Pixel(f64),
}

impl WheelDelta {
    /// The delta in wheel notches; positive scrolls away from the user.
    pub fn notches(&self, pixels_per_notch: f64) -> f32 {
        match *self {
            WheelDelta::Line(lines) => lines,
            WheelDelta::Pixel(pixels) if pixels_per_notch > 0.0 => {
                (pixels / pixels_per_notch) as f32
            }
            WheelDelta::Pixel(_) => 0.0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum InputEvent {
    /// Cursor position in physical pixels, origin top-left.
    PointerMoved { x: f64, y: f64 },
    PointerButton {
        button: MouseButton,
        state: ButtonState,
    },
    MouseWheel(WheelDelta),
    Key {
        key: Key,
        state: ButtonState,
        repeat: bool,
    },
}

/// Translates a winit `WindowEvent` into an [`InputEvent`].
///
/// Returns `None` for events the viewport does not handle.
pub fn translate_window_event(event: &WindowEvent) -> Option<InputEvent> {
    match event {
        WindowEvent::CursorMoved { position, .. } => Some(InputEvent::PointerMoved {
            x: position.x,
            y: position.y,
        }),
        WindowEvent::MouseInput { state, button, .. } => Some(InputEvent::PointerButton {
            button: translate_mouse_button(*button),
            state: map_state(*state),
        }),
        WindowEvent::MouseWheel { delta, .. } => Some(InputEvent::MouseWheel(match delta {
            MouseScrollDelta::LineDelta(_, y) => WheelDelta::Line(*y),
            MouseScrollDelta::PixelDelta(position) => WheelDelta::Pixel(position.y),
        })),
        WindowEvent::KeyboardInput { event, .. } => Some(InputEvent::Key {
            key: translate_key(event.physical_key),
            state: map_state(event.state),
            repeat: event.repeat,
        }),
        _ => None,
    }
}

fn map_state(state: ElementState) -> ButtonState {
    match state {
        ElementState::Pressed => ButtonState::Pressed,
        ElementState::Released => ButtonState::Released,
    }
}

pub fn translate_mouse_button(button: WinitMouseButton) -> MouseButton {
    match button {
        WinitMouseButton::Left => MouseButton::Left,
        WinitMouseButton::Right => MouseButton::Right,
        WinitMouseButton::Middle => MouseButton::Middle,
        WinitMouseButton::Back => MouseButton::Other(3),
        WinitMouseButton::Forward => MouseButton::Other(4),
        WinitMouseButton::Other(v) => MouseButton::Other(v),
    }
}

/// Keys are matched by physical position, so `P` and `R` work on any layout.
pub fn translate_key(key: PhysicalKey) -> Key {
    match key {
        PhysicalKey::Code(KeyCode::KeyP) => Key::P,
        PhysicalKey::Code(KeyCode::KeyR) => Key::R,
        _ => Key::Other,
    }
}
