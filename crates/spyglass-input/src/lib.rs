//! Spyglass input injection: turning authenticated control events into
//! OS cursor and keyboard actions on the host.
//!
//! Injection is best-effort: unknown key names and OS refusals are logged
//! and swallowed, never propagated. What the host does guarantee is
//! sanitation: every press observed on a connection gets a matching release
//! when that connection ends, so a dropped viewer cannot leave a modifier
//! wedged down.

pub mod backend;
pub mod guard;
pub mod keymap;

pub use backend::{InputBackend, NativeBackend};
pub use guard::PressedGuard;
