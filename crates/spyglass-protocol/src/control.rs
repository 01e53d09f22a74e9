//! Single-writer discipline for the control channel.
//!
//! Input events and file transfers share one socket, and a file transfer
//! must never have pointer or key events spliced between its chunks. Both
//! peers therefore funnel every outgoing control-channel operation through
//! one writer task; a file send is a single command that the task executes
//! to completion before looking at the queue again.

use std::path::PathBuf;

use tokio::io::AsyncWrite;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use spyglass_crypto::PresharedKey;

use crate::codec::send_json;
use crate::files::send_file;
use crate::messages::ControlMsg;

/// One unit of work for the control writer.
#[derive(Debug)]
pub enum ControlCommand {
    /// Send a single control record.
    Msg(ControlMsg),
    /// Send an entire file (header, chunks, trailer) without interleaving.
    SendFile(PathBuf),
}

/// Spawn the writer task owning the control socket's write half.
///
/// The task drains commands until the channel closes or a write fails;
/// dropping the returned sender is the clean way to stop it.
pub fn spawn_writer<W>(
    mut write: W,
    key: PresharedKey,
) -> (mpsc::Sender<ControlCommand>, JoinHandle<()>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<ControlCommand>(64);

    let handle = tokio::spawn(async move {
        while let Some(cmd) = rx.recv().await {
            let result = match cmd {
                ControlCommand::Msg(msg) => send_json(&mut write, &key, &msg).await,
                ControlCommand::SendFile(path) => {
                    debug!(path = %path.display(), "sending file over control channel");
                    send_file(&mut write, &key, &path).await
                }
            };
            if let Err(e) = result {
                warn!("control write failed: {e}");
                break;
            }
        }
    });

    (tx, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{recv_json, recv_open, AAD_FILE, DEFAULT_MAX_FRAME_BYTES};
    use crate::messages::MouseButton;

    fn key() -> PresharedKey {
        PresharedKey::from_bytes([5u8; 32])
    }

    #[tokio::test]
    async fn commands_arrive_in_submission_order() {
        let k = key();
        let (tx_stream, mut rx_stream) = tokio::io::duplex(64 * 1024);
        let (tx, handle) = spawn_writer(tx_stream, k.clone());

        tx.send(ControlCommand::Msg(ControlMsg::KeyDown("a".into())))
            .await
            .unwrap();
        tx.send(ControlCommand::Msg(ControlMsg::MouseDown(MouseButton::Left)))
            .await
            .unwrap();
        drop(tx);

        let first = recv_json(&mut rx_stream, &k, DEFAULT_MAX_FRAME_BYTES).await.unwrap();
        let second = recv_json(&mut rx_stream, &k, DEFAULT_MAX_FRAME_BYTES).await.unwrap();
        assert_eq!(first, ControlMsg::KeyDown("a".into()));
        assert_eq!(second, ControlMsg::MouseDown(MouseButton::Left));

        handle.await.unwrap();
    }

    #[tokio::test]
    async fn file_send_is_not_interleaved_with_queued_events() {
        let k = key();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payload.bin");
        std::fs::write(&path, vec![1u8; 100_000]).unwrap();

        let (tx_stream, mut rx_stream) = tokio::io::duplex(1024 * 1024);
        let (tx, handle) = spawn_writer(tx_stream, k.clone());

        tx.send(ControlCommand::SendFile(path)).await.unwrap();
        tx.send(ControlCommand::Msg(ControlMsg::KeyUp("x".into())))
            .await
            .unwrap();
        drop(tx);

        // Full transfer first: header, two chunks, trailer; only then the key event
        let header = recv_json(&mut rx_stream, &k, DEFAULT_MAX_FRAME_BYTES).await.unwrap();
        assert!(matches!(header, ControlMsg::FileStart { size: 100_000, .. }));

        let mut got = 0usize;
        while got < 100_000 {
            let chunk = recv_open(&mut rx_stream, &k, AAD_FILE, DEFAULT_MAX_FRAME_BYTES)
                .await
                .unwrap();
            got += chunk.len();
        }

        let trailer = recv_json(&mut rx_stream, &k, DEFAULT_MAX_FRAME_BYTES).await.unwrap();
        assert!(matches!(trailer, ControlMsg::FileEnd { .. }));

        let after = recv_json(&mut rx_stream, &k, DEFAULT_MAX_FRAME_BYTES).await.unwrap();
        assert_eq!(after, ControlMsg::KeyUp("x".into()));

        handle.await.unwrap();
    }
}
