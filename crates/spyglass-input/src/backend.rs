use anyhow::{anyhow, Result};
use enigo::{Button, Coordinate, Direction, Enigo, Keyboard, Mouse, Settings};
use tracing::debug;

use spyglass_protocol::MouseButton;

use crate::keymap;

/// The seam between the dispatcher and the OS input stack.
///
/// Every operation is best-effort and infallible from the caller's side.
pub trait InputBackend: Send {
    /// Move the cursor to absolute host-screen coordinates.
    fn move_cursor(&mut self, x: i32, y: i32);

    /// Press (`down = true`) or release a pointer button.
    fn button(&mut self, button: MouseButton, down: bool);

    /// Press or release a key by its symbolic name.
    fn key(&mut self, name: &str, down: bool);
}

/// OS-backed injector.
pub struct NativeBackend {
    enigo: Enigo,
}

impl NativeBackend {
    pub fn new() -> Result<Self> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| anyhow!("failed to initialize input synthesis: {e:?}"))?;
        Ok(Self { enigo })
    }
}

fn direction(down: bool) -> Direction {
    if down {
        Direction::Press
    } else {
        Direction::Release
    }
}

impl InputBackend for NativeBackend {
    fn move_cursor(&mut self, x: i32, y: i32) {
        if let Err(e) = self.enigo.move_mouse(x, y, Coordinate::Abs) {
            debug!("cursor move refused: {e:?}");
        }
    }

    fn button(&mut self, button: MouseButton, down: bool) {
        let btn = match button {
            MouseButton::Left => Button::Left,
            MouseButton::Right => Button::Right,
        };
        if let Err(e) = self.enigo.button(btn, direction(down)) {
            debug!("button event refused: {e:?}");
        }
    }

    fn key(&mut self, name: &str, down: bool) {
        let Some(key) = keymap::lookup(name) else {
            debug!(name, "unknown key name, dropped");
            return;
        };
        if let Err(e) = self.enigo.key(key, direction(down)) {
            debug!(name, "key event refused: {e:?}");
        }
    }
}
