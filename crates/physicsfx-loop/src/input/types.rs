/// Mouse button identifier.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Back,
    Forward,
    Other(u16),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
}

/// Pointer (mouse or touch) event in physical surface pixels.
///
/// `button` is the button that changed for `Down`/`Up`, and the held button
/// (if any) for `Move`. Touch contacts report `MouseButton::Left`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub x: f32,
    pub y: f32,
    pub button: Option<MouseButton>,
}

impl PointerEvent {
    pub fn down(x: f32, y: f32, button: MouseButton) -> Self {
        Self {
            phase: PointerPhase::Down,
            x,
            y,
            button: Some(button),
        }
    }

    pub fn moved(x: f32, y: f32, button: Option<MouseButton>) -> Self {
        Self {
            phase: PointerPhase::Move,
            x,
            y,
            button,
        }
    }

    pub fn up(x: f32, y: f32, button: MouseButton) -> Self {
        Self {
            phase: PointerPhase::Up,
            x,
            y,
            button: Some(button),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum KeyPhase {
    Down,
    Up,
}

/// Keyboard event.
///
/// `key_code` is a stable platform code (the winit `KeyCode` discriminant on
/// desktop, the Android/JS key code elsewhere).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct KeyEvent {
    pub phase: KeyPhase,
    pub key_code: u32,
}

/// Either kind of forwarded input.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum EngineInput {
    Pointer(PointerEvent),
    Key(KeyEvent),
}
