//! Spyglass wire protocol: sealed framing, control messages, and the
//! file-transfer sub-protocol shared by host and viewer.
//!
//! Both TCP channels carry the same frame format: a 4-byte big-endian length
//! prefix followed by an AES-256-GCM sealed blob whose associated data is a
//! short per-channel label (`"video"`, `"control"`, `"file"`). The control
//! channel layers JSON-encoded [`ControlMsg`] records on top.

pub mod codec;
pub mod control;
pub mod error;
pub mod files;
pub mod mapper;
pub mod messages;

// Re-export the types nearly every consumer needs
pub use codec::{recv_json, recv_open, send_json, send_sealed};
pub use codec::{AAD_CONTROL, AAD_FILE, AAD_VIDEO, DEFAULT_MAX_FRAME_BYTES};
pub use error::WireError;
pub use mapper::{frame_to_screen, viewer_to_frame, Dims, WindowRect};
pub use messages::{ControlMsg, MouseButton};
