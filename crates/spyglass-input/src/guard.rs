use std::collections::HashSet;

use tracing::info;

use spyglass_protocol::MouseButton;

use crate::backend::InputBackend;

/// Wraps a backend and remembers what the current connection is holding
/// down, so the host can synthesize releases when the connection ends.
pub struct PressedGuard<B: InputBackend> {
    backend: B,
    held_keys: HashSet<String>,
    held_buttons: HashSet<MouseButton>,
}

impl<B: InputBackend> PressedGuard<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            held_keys: HashSet::new(),
            held_buttons: HashSet::new(),
        }
    }

    pub fn move_cursor(&mut self, x: i32, y: i32) {
        self.backend.move_cursor(x, y);
    }

    pub fn button_down(&mut self, button: MouseButton) {
        self.held_buttons.insert(button);
        self.backend.button(button, true);
    }

    pub fn button_up(&mut self, button: MouseButton) {
        self.held_buttons.remove(&button);
        self.backend.button(button, false);
    }

    pub fn key_down(&mut self, name: &str) {
        self.held_keys.insert(name.to_string());
        self.backend.key(name, true);
    }

    pub fn key_up(&mut self, name: &str) {
        self.held_keys.remove(name);
        self.backend.key(name, false);
    }

    /// Release everything still held. Called on session teardown, however
    /// the session ended.
    pub fn release_all(&mut self) {
        if !self.held_keys.is_empty() || !self.held_buttons.is_empty() {
            info!(
                keys = self.held_keys.len(),
                buttons = self.held_buttons.len(),
                "releasing input still held by disconnected viewer"
            );
        }

        for button in std::mem::take(&mut self.held_buttons) {
            self.backend.button(button, false);
        }
        for name in std::mem::take(&mut self.held_keys) {
            self.backend.key(&name, false);
        }
    }
}
