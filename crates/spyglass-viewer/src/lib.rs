//! Spyglass viewer session: the network side of the desktop window.
//!
//! The GUI layer is an external collaborator: it consumes decoded frames
//! from a channel, tells the session where the video widget sits, and
//! pushes pointer/keyboard events into [`InputSender`]. Everything
//! protocol-shaped (sockets, sealing, mapping, file transfers) lives here.

pub mod client;
pub mod input;
pub mod resolve;
pub mod view;

pub use client::{ViewerConfig, ViewerError, ViewerSession};
pub use input::InputSender;
pub use resolve::HostDirectory;
pub use view::SharedView;
