use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyEvent {
    Down,
    Up,
}

impl KeyEvent {
    pub const fn event_name(self) -> &'static str {
        match self {
            KeyEvent::Down => "keydown",
            KeyEvent::Up => "keyup",
        }
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown input event '{0}' (expected keydown or keyup)")]
pub struct UnknownKeyEvent(pub String);

impl FromStr for KeyEvent {
    type Err = UnknownKeyEvent;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "keydown" => Ok(KeyEvent::Down),
            "keyup" => Ok(KeyEvent::Up),
            other => Err(UnknownKeyEvent(other.to_string())),
        }
    }
}

pub type KeyListener = Box<dyn FnMut(u32)>;

/// Ordered keyboard listener lists. Listeners receive DOM-style key codes.
#[derive(Default)]
pub struct InputDispatcher {
    keydown: Vec<KeyListener>,
    keyup: Vec<KeyListener>,
}

impl InputDispatcher {
    pub fn on(&mut self, event: KeyEvent, listener: KeyListener) {
        self.listeners_mut(event).push(listener);
    }

    /// Invokes every listener for `event` in registration order and returns
    /// how many ran.
    pub fn dispatch(&mut self, event: KeyEvent, key_code: u32) -> usize {
        let listeners = self.listeners_mut(event);
        for listener in listeners.iter_mut() {
            listener(key_code);
        }
        listeners.len()
    }

    pub fn listener_count(&self, event: KeyEvent) -> usize {
        match event {
            KeyEvent::Down => self.keydown.len(),
            KeyEvent::Up => self.keyup.len(),
        }
    }

    fn listeners_mut(&mut self, event: KeyEvent) -> &mut Vec<KeyListener> {
        match event {
            KeyEvent::Down => &mut self.keydown,
            KeyEvent::Up => &mut self.keyup,
        }
    }
}

impl fmt::Debug for InputDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputDispatcher")
            .field("keydown", &self.keydown.len())
            .field("keyup", &self.keyup.len())
            .finish()
    }
}
