//! Input vocabulary and the channel that normalizes host window events

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Keyboard keys the navigation layer understands
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum KeyButton {
    Shift,
    Alt,
    Control,
    Escape,
    Space,
    Plus,
    Minus,
    Up,
    Down,
    Left,
    Right,
    PageUp,
    PageDown,
    Digit0,
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    Digit5,
    Digit6,
    Digit7,
    Digit8,
    Digit9,
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
}

impl KeyButton {
    const NAMES: [(KeyButton, &'static str); 49] = [
        (KeyButton::Shift, "Shift"),
        (KeyButton::Alt, "Alt"),
        (KeyButton::Control, "Control"),
        (KeyButton::Escape, "Escape"),
        (KeyButton::Space, "Space"),
        (KeyButton::Plus, "Plus"),
        (KeyButton::Minus, "Minus"),
        (KeyButton::Up, "Up"),
        (KeyButton::Down, "Down"),
        (KeyButton::Left, "Left"),
        (KeyButton::Right, "Right"),
        (KeyButton::PageUp, "PageUp"),
        (KeyButton::PageDown, "PageDown"),
        (KeyButton::Digit0, "0"),
        (KeyButton::Digit1, "1"),
        (KeyButton::Digit2, "2"),
        (KeyButton::Digit3, "3"),
        (KeyButton::Digit4, "4"),
        (KeyButton::Digit5, "5"),
        (KeyButton::Digit6, "6"),
        (KeyButton::Digit7, "7"),
        (KeyButton::Digit8, "8"),
        (KeyButton::Digit9, "9"),
        (KeyButton::A, "A"),
        (KeyButton::B, "B"),
        (KeyButton::C, "C"),
        (KeyButton::D, "D"),
        (KeyButton::E, "E"),
        (KeyButton::F, "F"),
        (KeyButton::G, "G"),
        (KeyButton::H, "H"),
        (KeyButton::I, "I"),
        (KeyButton::J, "J"),
        (KeyButton::K, "K"),
        (KeyButton::L, "L"),
        (KeyButton::M, "M"),
        (KeyButton::N, "N"),
        (KeyButton::O, "O"),
        (KeyButton::P, "P"),
        (KeyButton::Q, "Q"),
        (KeyButton::R, "R"),
        (KeyButton::S, "S"),
        (KeyButton::T, "T"),
        (KeyButton::U, "U"),
        (KeyButton::V, "V"),
        (KeyButton::W, "W"),
        (KeyButton::X, "X"),
        (KeyButton::Y, "Y"),
        (KeyButton::Z, "Z"),
    ];

    pub fn name(self) -> &'static str {
        Self::NAMES
            .iter()
            .find(|(key, _)| *key == self)
            .map(|(_, name)| *name)
            .unwrap_or("?")
    }

    /// Case-insensitive lookup by binding name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::NAMES
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name))
            .map(|(key, _)| *key)
    }

    /// Map a physical key code. Left/right modifier variants collapse into one
    /// key; keys outside the vocabulary yield `None`.
    pub fn from_key_code(code: KeyCode) -> Option<Self> {
        let key = match code {
            KeyCode::ShiftLeft | KeyCode::ShiftRight => KeyButton::Shift,
            KeyCode::AltLeft | KeyCode::AltRight => KeyButton::Alt,
            KeyCode::ControlLeft | KeyCode::ControlRight => KeyButton::Control,
            KeyCode::Escape => KeyButton::Escape,
            KeyCode::Space => KeyButton::Space,
            KeyCode::Equal | KeyCode::NumpadAdd => KeyButton::Plus,
            KeyCode::Minus | KeyCode::NumpadSubtract => KeyButton::Minus,
            KeyCode::ArrowUp => KeyButton::Up,
            KeyCode::ArrowDown => KeyButton::Down,
            KeyCode::ArrowLeft => KeyButton::Left,
            KeyCode::ArrowRight => KeyButton::Right,
            KeyCode::PageUp => KeyButton::PageUp,
            KeyCode::PageDown => KeyButton::PageDown,
            KeyCode::Digit0 | KeyCode::Numpad0 => KeyButton::Digit0,
            KeyCode::Digit1 | KeyCode::Numpad1 => KeyButton::Digit1,
            KeyCode::Digit2 | KeyCode::Numpad2 => KeyButton::Digit2,
            KeyCode::Digit3 | KeyCode::Numpad3 => KeyButton::Digit3,
            KeyCode::Digit4 | KeyCode::Numpad4 => KeyButton::Digit4,
            KeyCode::Digit5 | KeyCode::Numpad5 => KeyButton::Digit5,
            KeyCode::Digit6 | KeyCode::Numpad6 => KeyButton::Digit6,
            KeyCode::Digit7 | KeyCode::Numpad7 => KeyButton::Digit7,
            KeyCode::Digit8 | KeyCode::Numpad8 => KeyButton::Digit8,
            KeyCode::Digit9 | KeyCode::Numpad9 => KeyButton::Digit9,
            KeyCode::KeyA => KeyButton::A,
            KeyCode::KeyB => KeyButton::B,
            KeyCode::KeyC => KeyButton::C,
            KeyCode::KeyD => KeyButton::D,
            KeyCode::KeyE => KeyButton::E,
            KeyCode::KeyF => KeyButton::F,
            KeyCode::KeyG => KeyButton::G,
            KeyCode::KeyH => KeyButton::H,
            KeyCode::KeyI => KeyButton::I,
            KeyCode::KeyJ => KeyButton::J,
            KeyCode::KeyK => KeyButton::K,
            KeyCode::KeyL => KeyButton::L,
            KeyCode::KeyM => KeyButton::M,
            KeyCode::KeyN => KeyButton::N,
            KeyCode::KeyO => KeyButton::O,
            KeyCode::KeyP => KeyButton::P,
            KeyCode::KeyQ => KeyButton::Q,
            KeyCode::KeyR => KeyButton::R,
            KeyCode::KeyS => KeyButton::S,
            KeyCode::KeyT => KeyButton::T,
            KeyCode::KeyU => KeyButton::U,
            KeyCode::KeyV => KeyButton::V,
            KeyCode::KeyW => KeyButton::W,
            KeyCode::KeyX => KeyButton::X,
            KeyCode::KeyY => KeyButton::Y,
            KeyCode::KeyZ => KeyButton::Z,
            _ => return None,
        };
        Some(key)
    }
}

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum MouseButton {
    Primary,
    Secondary,
    Middle,
}

impl MouseButton {
    pub fn name(self) -> &'static str {
        match self {
            MouseButton::Primary => "Primary",
            MouseButton::Secondary => "Secondary",
            MouseButton::Middle => "Middle",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        [MouseButton::Primary, MouseButton::Secondary, MouseButton::Middle]
            .into_iter()
            .find(|b| b.name().eq_ignore_ascii_case(name))
    }

    /// Back/forward and extra buttons are not part of the vocabulary
    pub fn from_winit(button: winit::event::MouseButton) -> Option<Self> {
        match button {
            winit::event::MouseButton::Left => Some(MouseButton::Primary),
            winit::event::MouseButton::Right => Some(MouseButton::Secondary),
            winit::event::MouseButton::Middle => Some(MouseButton::Middle),
            _ => None,
        }
    }
}

/// Any key or mouse button. Bindings in the configuration are written by
/// name, e.g. `"W"`, `"Space"` or `"Secondary"`.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Button {
    Key(KeyButton),
    Mouse(MouseButton),
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Button::Key(key) => f.write_str(key.name()),
            Button::Mouse(button) => f.write_str(button.name()),
        }
    }
}

impl FromStr for Button {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        MouseButton::from_name(name)
            .map(Button::Mouse)
            .or_else(|| KeyButton::from_name(name).map(Button::Key))
            .ok_or_else(|| format!("unknown button '{name}'"))
    }
}

impl TryFrom<String> for Button {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Button> for String {
    fn from(button: Button) -> Self {
        button.to_string()
    }
}

impl From<KeyButton> for Button {
    fn from(key: KeyButton) -> Self {
        Button::Key(key)
    }
}

impl From<MouseButton> for Button {
    fn from(button: MouseButton) -> Self {
        Button::Mouse(button)
    }
}

/// A normalized input event.
///
/// Pointer positions are in window pixels with y growing downwards. `dx`/`dy`
/// are the cursor movement since the previous event. A positive wheel
/// direction means the wheel was rolled away from the user.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    KeyDown(KeyButton),
    KeyUp(KeyButton),
    PointerDown { button: MouseButton, x: f64, y: f64 },
    PointerUp { button: MouseButton, x: f64, y: f64 },
    PointerMove { dx: f64, dy: f64 },
    Wheel { direction: i32 },
}

/// Receiver of normalized input
pub trait InputSink {
    fn handle_input(&mut self, event: InputEvent);
}

impl InputSink for Vec<InputEvent> {
    fn handle_input(&mut self, event: InputEvent) {
        self.push(event);
    }
}

/// Pixel scroll distance that counts as one wheel notch
const PIXELS_PER_NOTCH: f64 = 40.0;

/// Converts host window events into [`InputEvent`]s for a single sink
pub struct InputChannel<S: InputSink> {
    sink: S,
    /// Last known cursor position, `None` until the first move
    cursor: Option<(f64, f64)>,
    /// Fractional wheel notches not yet delivered
    scroll: f64,
}

impl<S: InputSink> InputChannel<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            cursor: None,
            scroll: 0.0,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Forward an already normalized event
    pub fn send(&mut self, event: InputEvent) {
        self.sink.handle_input(event);
    }

    /// Route a winit window event. Returns true if it produced input.
    pub fn on_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if event.repeat {
                    return false;
                }
                self.on_key(event.physical_key, event.state)
            }
            WindowEvent::MouseInput { state, button, .. } => self.on_mouse_button(*button, *state),
            WindowEvent::CursorMoved { position, .. } => self.on_cursor_moved(*position),
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                false
            }
            WindowEvent::MouseWheel { delta, .. } => self.on_wheel(*delta),
            _ => false,
        }
    }

    pub fn on_key(&mut self, key: PhysicalKey, state: ElementState) -> bool {
        let PhysicalKey::Code(code) = key else {
            return false;
        };
        let Some(key) = KeyButton::from_key_code(code) else {
            return false;
        };
        self.send(match state {
            ElementState::Pressed => InputEvent::KeyDown(key),
            ElementState::Released => InputEvent::KeyUp(key),
        });
        true
    }

    pub fn on_mouse_button(&mut self, button: winit::event::MouseButton, state: ElementState) -> bool {
        let Some(button) = MouseButton::from_winit(button) else {
            return false;
        };
        let (x, y) = self.cursor.unwrap_or((0.0, 0.0));
        self.send(match state {
            ElementState::Pressed => InputEvent::PointerDown { button, x, y },
            ElementState::Released => InputEvent::PointerUp { button, x, y },
        });
        true
    }

    /// The first position after creation or after the cursor left the window
    /// only establishes the reference point.
    pub fn on_cursor_moved(&mut self, position: PhysicalPosition<f64>) -> bool {
        let previous = self.cursor.replace((position.x, position.y));
        let Some((px, py)) = previous else {
            return false;
        };
        let (dx, dy) = (position.x - px, position.y - py);
        if dx == 0.0 && dy == 0.0 {
            return false;
        }
        self.send(InputEvent::PointerMove { dx, dy });
        true
    }

    pub fn on_wheel(&mut self, delta: MouseScrollDelta) -> bool {
        self.scroll += match delta {
            MouseScrollDelta::LineDelta(_, lines) => lines as f64,
            MouseScrollDelta::PixelDelta(pixels) => pixels.y / PIXELS_PER_NOTCH,
        };
        let notches = self.scroll.trunc();
        if notches == 0.0 {
            return false;
        }
        self.scroll -= notches;
        self.send(InputEvent::Wheel {
            direction: notches as i32,
        });
        true
    }
}
