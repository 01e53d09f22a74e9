//! Control-channel dispatcher: authenticated input events and incoming
//! file transfers.
//!
//! Input events are authenticated but still untrusted UX data, so a record
//! that fails to parse is logged and skipped. Frame-level failures are a
//! different matter: an authentication failure or a state-machine violation
//! means the peer is hostile or corrupted, and the connection is closed
//! without recovery.

use std::path::PathBuf;

use tokio::io::AsyncRead;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use spyglass_crypto::PresharedKey;
use spyglass_input::{InputBackend, PressedGuard};
use spyglass_protocol::codec::recv_json;
use spyglass_protocol::files::recv_file;
use spyglass_protocol::mapper::{frame_to_screen, Dims};
use spyglass_protocol::{ControlMsg, WireError};

/// Frame and native screen dimensions, fixed at capture start.
#[derive(Debug, Clone, Copy)]
pub struct SessionGeometry {
    pub screen: Dims,
    pub frame: Dims,
}

/// Receive-side limits and the directory incoming files land in.
#[derive(Debug, Clone)]
pub struct DispatchLimits {
    pub max_frame_bytes: u32,
    pub max_file_bytes: u64,
    pub recv_dir: PathBuf,
}

/// How the control connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Orderly: EOF, I/O loss, or a local stop.
    Clean,
    /// Hostile or corrupted peer; the connection was dropped mid-protocol.
    Fault,
}

/// Drain the control connection until it ends or the session is stopped.
///
/// Whatever the exit path, every key and button the connection pressed is
/// released before returning.
pub async fn run<S, B>(
    mut stream: S,
    key: PresharedKey,
    geometry: SessionGeometry,
    limits: DispatchLimits,
    backend: B,
    mut stop: watch::Receiver<bool>,
) -> SessionEnd
where
    S: AsyncRead + Unpin,
    B: InputBackend,
{
    let mut guard = PressedGuard::new(backend);

    let end = tokio::select! {
        end = dispatch_loop(&mut stream, &key, geometry, &limits, &mut guard) => end,
        _ = crate::shutdown::stopped(&mut stop) => {
            info!("control dispatcher stopped");
            SessionEnd::Clean
        }
    };

    guard.release_all();
    end
}

async fn dispatch_loop<S, B>(
    stream: &mut S,
    key: &PresharedKey,
    geometry: SessionGeometry,
    limits: &DispatchLimits,
    guard: &mut PressedGuard<B>,
) -> SessionEnd
where
    S: AsyncRead + Unpin,
    B: InputBackend,
{
    loop {
        let msg = match recv_json(stream, key, limits.max_frame_bytes).await {
            Ok(msg) => msg,
            Err(WireError::Json(e)) => {
                warn!("unparseable control record, skipping: {e}");
                continue;
            }
            Err(e) if e.is_clean_disconnect() => {
                info!("control connection ended: {e}");
                return SessionEnd::Clean;
            }
            Err(e) => {
                warn!("closing control connection: {e}");
                return SessionEnd::Fault;
            }
        };

        match msg {
            ControlMsg::MouseMove(x, y) => {
                match frame_to_screen(x, y, geometry.frame, geometry.screen) {
                    Some((sx, sy)) => guard.move_cursor(sx, sy),
                    None => debug!(x, y, "unmappable pointer event dropped"),
                }
            }
            ControlMsg::MouseDown(button) => guard.button_down(button),
            ControlMsg::MouseUp(button) => guard.button_up(button),
            ControlMsg::KeyDown(name) => guard.key_down(&name),
            ControlMsg::KeyUp(name) => guard.key_up(&name),
            ControlMsg::FileStart { name, size } => {
                info!(name = %name, size, "incoming file");
                match recv_file(
                    stream,
                    key,
                    &name,
                    size,
                    &limits.recv_dir,
                    limits.max_file_bytes,
                    limits.max_frame_bytes,
                )
                .await
                {
                    Ok(_) => {}
                    Err(e) if e.is_clean_disconnect() => {
                        info!("connection ended mid-transfer: {e}");
                        return SessionEnd::Clean;
                    }
                    Err(e) => {
                        warn!("closing control connection: {e}");
                        return SessionEnd::Fault;
                    }
                }
            }
            ControlMsg::FileEnd { name } => {
                // Stray trailer outside a transfer; harmless
                debug!(name = %name, "unexpected file_end ignored");
            }
        }
    }
}
