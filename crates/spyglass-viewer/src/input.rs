//! Input emission: UI events in, control records out.
//!
//! The UI thread owns an [`InputSender`] and pushes raw desktop-coordinate
//! events into it. Pointer positions are mapped into frame pixels (events
//! outside the video widget are dropped), and a pressed-key set collapses
//! OS auto-repeat so a held key crosses the wire exactly once.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use spyglass_protocol::control::ControlCommand;
use spyglass_protocol::mapper::viewer_to_frame;
use spyglass_protocol::{ControlMsg, MouseButton};

use crate::view::SharedView;

/// Producer half of the control channel, owned by the UI thread.
pub struct InputSender {
    view: Arc<SharedView>,
    control: mpsc::Sender<ControlCommand>,
    pressed_keys: HashSet<String>,
}

impl InputSender {
    pub fn new(view: Arc<SharedView>, control: mpsc::Sender<ControlCommand>) -> Self {
        Self {
            view,
            control,
            pressed_keys: HashSet::new(),
        }
    }

    /// Pointer moved to desktop coordinates `(px, py)`.
    pub fn pointer_moved(&self, px: i32, py: i32) {
        let window = self.view.window_rect();
        let frame = self.view.frame_dims();
        match viewer_to_frame(px, py, window, frame) {
            Some((fx, fy)) => self.send(ControlMsg::MouseMove(fx, fy)),
            None => {} // outside the video widget, or no frame yet
        }
    }

    pub fn button_pressed(&self, button: MouseButton) {
        self.send(ControlMsg::MouseDown(button));
    }

    pub fn button_released(&self, button: MouseButton) {
        self.send(ControlMsg::MouseUp(button));
    }

    /// Key pressed. Auto-repeat from the OS is suppressed here: a key
    /// already in the pressed set emits nothing.
    pub fn key_pressed(&mut self, name: &str) {
        let name = name.to_lowercase();
        if self.pressed_keys.insert(name.clone()) {
            self.send(ControlMsg::KeyDown(name));
        }
    }

    /// Key released. The release is always forwarded, even for keys the
    /// set never saw, so the host can shed anything it thinks is held.
    pub fn key_released(&mut self, name: &str) {
        let name = name.to_lowercase();
        self.pressed_keys.remove(&name);
        self.send(ControlMsg::KeyUp(name));
    }

    /// Queue a whole-file send on the control channel.
    pub fn send_file(&self, path: PathBuf) {
        if self.control.try_send(ControlCommand::SendFile(path)).is_err() {
            warn!("control channel busy, file send dropped");
        }
    }

    /// Forget all held keys. Called when the session drops so a future
    /// session starts from a clean slate; the host releases its own side.
    pub fn reset(&mut self) {
        self.pressed_keys.clear();
    }

    fn send(&self, msg: ControlMsg) {
        if self.control.try_send(ControlCommand::Msg(msg)).is_err() {
            debug!("control channel busy, event dropped");
        }
    }
}
