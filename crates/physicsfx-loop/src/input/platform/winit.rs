use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseButton as WinitMouseButton, TouchPhase, WindowEvent};
use winit::keyboard::PhysicalKey;

use crate::input::{EngineInput, KeyEvent, KeyPhase, MouseButton, PointerEvent, PointerPhase};

/// Translates winit window events into engine input.
///
/// winit reports button presses without a position, so the translator keeps
/// the last cursor position and the held button.
#[derive(Debug, Default)]
pub(crate) struct InputTranslator {
    pointer_pos: Option<(f32, f32)>,
    held: Option<MouseButton>,
}

impl InputTranslator {
    /// Returns `None` for events not represented by engine input.
    pub(crate) fn translate(&mut self, event: &WindowEvent) -> Option<EngineInput> {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                let (x, y) = to_f32(*position);
                self.pointer_pos = Some((x, y));
                Some(EngineInput::Pointer(PointerEvent::moved(x, y, self.held)))
            }

            WindowEvent::CursorLeft { .. } => {
                self.pointer_pos = None;
                None
            }

            WindowEvent::MouseInput { state, button, .. } => {
                let button = map_mouse_button(*button);
                let (x, y) = self.pointer_pos.unwrap_or((0.0, 0.0));
                let phase = match state {
                    ElementState::Pressed => {
                        self.held = Some(button);
                        PointerPhase::Down
                    }
                    ElementState::Released => {
                        if self.held == Some(button) {
                            self.held = None;
                        }
                        PointerPhase::Up
                    }
                };
                Some(EngineInput::Pointer(PointerEvent {
                    phase,
                    x,
                    y,
                    button: Some(button),
                }))
            }

            WindowEvent::Touch(touch) => {
                let (x, y) = to_f32(touch.location);
                let phase = match touch.phase {
                    TouchPhase::Started => PointerPhase::Down,
                    TouchPhase::Moved => PointerPhase::Move,
                    TouchPhase::Ended | TouchPhase::Cancelled => PointerPhase::Up,
                };
                Some(EngineInput::Pointer(PointerEvent {
                    phase,
                    x,
                    y,
                    button: Some(MouseButton::Left),
                }))
            }

            WindowEvent::KeyboardInput { event, .. } => {
                // Repeats are not new presses.
                if event.repeat {
                    return None;
                }
                let phase = match event.state {
                    ElementState::Pressed => KeyPhase::Down,
                    ElementState::Released => KeyPhase::Up,
                };
                Some(EngineInput::Key(KeyEvent {
                    phase,
                    key_code: key_code(event.physical_key),
                }))
            }

            WindowEvent::Focused(false) => {
                // Avoid a stuck drag when focus changes mid-press.
                self.held = None;
                None
            }

            _ => None,
        }
    }
}

fn to_f32(pos: PhysicalPosition<f64>) -> (f32, f32) {
    (pos.x as f32, pos.y as f32)
}

fn map_mouse_button(b: WinitMouseButton) -> MouseButton {
    match b {
        WinitMouseButton::Left => MouseButton::Left,
        WinitMouseButton::Right => MouseButton::Right,
        WinitMouseButton::Middle => MouseButton::Middle,
        WinitMouseButton::Back => MouseButton::Back,
        WinitMouseButton::Forward => MouseButton::Forward,
        WinitMouseButton::Other(v) => MouseButton::Other(v),
    }
}

// NativeKeyCode has no stable numeric form in winit 0.30.
fn key_code(pk: PhysicalKey) -> u32 {
    match pk {
        PhysicalKey::Code(code) => code as u32,
        PhysicalKey::Unidentified(_) => 0,
    }
}
