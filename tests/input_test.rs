use flow_viewer::input::{
    ButtonState, InputEvent, Key, MouseButton, WheelDelta, translate_key, translate_mouse_button,
    translate_window_event,
};
use winit::{
    dpi::{PhysicalPosition, PhysicalSize},
    event::{
        DeviceId, ElementState, MouseButton as WinitMouseButton, MouseScrollDelta, TouchPhase,
        WindowEvent,
    },
    keyboard::{KeyCode, NativeKeyCode, PhysicalKey},
};

fn device() -> DeviceId {
    // only compared for equality by winit, never dereferenced
    unsafe { DeviceId::dummy() }
}

#[test]
fn should_normalise_wheel_deltas_to_notches() {
    assert_eq!(WheelDelta::Line(-2.0).notches(120.0), -2.0);
    assert_eq!(WheelDelta::Pixel(240.0).notches(120.0), 2.0);
    assert_eq!(WheelDelta::Pixel(60.0).notches(120.0), 0.5);
    assert_eq!(WheelDelta::Pixel(60.0).notches(0.0), 0.0);
}

#[test]
fn should_map_only_p_and_r_to_viewport_keys() {
    assert_eq!(translate_key(PhysicalKey::Code(KeyCode::KeyP)), Key::P);
    assert_eq!(translate_key(PhysicalKey::Code(KeyCode::KeyR)), Key::R);
    assert_eq!(translate_key(PhysicalKey::Code(KeyCode::KeyQ)), Key::Other);
    assert_eq!(
        translate_key(PhysicalKey::Unidentified(NativeKeyCode::Unidentified)),
        Key::Other
    );
}

#[test]
fn should_map_mouse_buttons() {
    assert_eq!(translate_mouse_button(WinitMouseButton::Left), MouseButton::Left);
    assert_eq!(translate_mouse_button(WinitMouseButton::Middle), MouseButton::Middle);
    assert_eq!(translate_mouse_button(WinitMouseButton::Right), MouseButton::Right);
    assert_eq!(translate_mouse_button(WinitMouseButton::Back), MouseButton::Other(3));
    assert_eq!(translate_mouse_button(WinitMouseButton::Other(7)), MouseButton::Other(7));
}

#[test]
fn should_translate_pointer_events() {
    let moved = WindowEvent::CursorMoved {
        device_id: device(),
        position: PhysicalPosition::new(12.5, 40.0),
    };
    let pressed = WindowEvent::MouseInput {
        device_id: device(),
        state: ElementState::Pressed,
        button: WinitMouseButton::Middle,
    };
    let released = WindowEvent::MouseInput {
        device_id: device(),
        state: ElementState::Released,
        button: WinitMouseButton::Left,
    };

    assert_eq!(
        translate_window_event(&moved),
        Some(InputEvent::PointerMoved { x: 12.5, y: 40.0 })
    );
    assert_eq!(
        translate_window_event(&pressed),
        Some(InputEvent::PointerButton {
            button: MouseButton::Middle,
            state: ButtonState::Pressed,
        })
    );
    assert_eq!(
        translate_window_event(&released),
        Some(InputEvent::PointerButton {
            button: MouseButton::Left,
            state: ButtonState::Released,
        })
    );
}

#[test]
fn should_keep_line_and_pixel_wheel_deltas_apart() {
    let lines = WindowEvent::MouseWheel {
        device_id: device(),
        delta: MouseScrollDelta::LineDelta(0.0, -1.0),
        phase: TouchPhase::Moved,
    };
    let pixels = WindowEvent::MouseWheel {
        device_id: device(),
        delta: MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, 30.0)),
        phase: TouchPhase::Moved,
    };

    assert_eq!(
        translate_window_event(&lines),
        Some(InputEvent::MouseWheel(WheelDelta::Line(-1.0)))
    );
    assert_eq!(
        translate_window_event(&pixels),
        Some(InputEvent::MouseWheel(WheelDelta::Pixel(30.0)))
    );
}

#[test]
fn should_ignore_events_the_viewport_does_not_handle() {
    assert_eq!(
        translate_window_event(&WindowEvent::Resized(PhysicalSize::new(800, 600))),
        None
    );
    assert_eq!(translate_window_event(&WindowEvent::Focused(true)), None);
}
