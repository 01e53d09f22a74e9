use serde::{Deserialize, Serialize};

/// Pointer buttons the relay understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Left,
    Right,
}

/// A control-channel record, parsed at the wire boundary.
///
/// On the wire this is JSON with a `type` discriminant and a `value`
/// payload, e.g. `{"type":"mouse_move","value":[100,50]}`. Pointer
/// coordinates are in frame pixels (the viewer has already mapped its
/// window coordinates); key names use the symbolic vocabulary: lowercase
/// printable characters, the named specials (`esc`, `tab`, `enter`, ...),
/// or `f1`..`f24`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ControlMsg {
    MouseMove(i32, i32),
    MouseDown(MouseButton),
    MouseUp(MouseButton),
    KeyDown(String),
    KeyUp(String),
    /// Brackets an ordered run of sealed file chunks on the same channel.
    FileStart { name: String, size: u64 },
    FileEnd { name: String },
}
