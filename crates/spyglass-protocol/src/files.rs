//! Chunked file transfer over the control channel.
//!
//! A transfer is a `file_start` JSON record, an ordered run of sealed
//! frames with AAD `"file"`, then a `file_end` JSON record. While receiving
//! chunks the peer interprets incoming frames purely by state: a control
//! JSON frame arriving mid-transfer fails authentication (its label is
//! `"control"`, not `"file"`), which is exactly the hard close the protocol
//! wants for interleaving violations.

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};

use spyglass_crypto::PresharedKey;

use crate::codec::{recv_json, recv_open, send_json, send_sealed, AAD_FILE};
use crate::error::WireError;
use crate::messages::ControlMsg;

/// Sealed chunk payload size for outgoing transfers.
pub const FILE_CHUNK_BYTES: usize = 64 * 1024;

/// Default ceiling on an announced file size: 16 GiB.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 16 * 1024 * 1024 * 1024;

/// Fallback name for transfers whose sanitized name comes out empty.
pub const FALLBACK_FILE_NAME: &str = "received.bin";

/// Reduce an announced file name to a bare, safe file name.
///
/// Path separators (both kinds), absolute paths, and `..` are stripped or
/// rejected so a peer can never write outside the receive directory.
pub fn sanitize_name(name: &str) -> String {
    let last = name
        .trim()
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("");

    match last {
        "" | "." | ".." => FALLBACK_FILE_NAME.to_string(),
        other => other.to_string(),
    }
}

/// Receive one file transfer after its `file_start` header was dispatched.
///
/// Appends sealed chunks into `dir/<sanitized name>` until `size` bytes have
/// arrived, then consumes the trailing `file_end`. A connection loss leaves
/// the partial file in place for the operator to inspect. Returns the path
/// written.
pub async fn recv_file<S>(
    stream: &mut S,
    key: &PresharedKey,
    name: &str,
    size: u64,
    dir: &Path,
    max_file_bytes: u64,
    max_frame_bytes: u32,
) -> Result<PathBuf, WireError>
where
    S: AsyncRead + Unpin,
{
    if size > max_file_bytes {
        return Err(WireError::Protocol("announced file size exceeds the limit"));
    }

    let file_name = sanitize_name(name);
    fs::create_dir_all(dir).await?;
    let path = dir.join(&file_name);

    let mut file = fs::File::create(&path).await?;
    let mut received: u64 = 0;

    while received < size {
        let chunk = recv_open(stream, key, AAD_FILE, max_frame_bytes).await?;
        file.write_all(&chunk).await?;
        received += chunk.len() as u64;
    }
    file.flush().await?;

    // The trailing file_end is informational; anything else here means the
    // sender broke the no-interleaving rule.
    match recv_json(stream, key, max_frame_bytes).await? {
        ControlMsg::FileEnd { name: end_name } => {
            if end_name != file_name && end_name != name {
                warn!(started = %name, ended = %end_name, "file_end names a different file");
            }
        }
        ControlMsg::FileStart { .. } => {
            return Err(WireError::Protocol("file_start nested inside a transfer"));
        }
        _ => return Err(WireError::Protocol("event interleaved with file chunks")),
    }

    info!(path = %path.display(), bytes = received, "file received");
    Ok(path)
}

/// Send a file: `file_start`, sealed 64 KiB chunks, `file_end`.
pub async fn send_file<S>(stream: &mut S, key: &PresharedKey, path: &Path) -> Result<(), WireError>
where
    S: AsyncWrite + Unpin,
{
    let meta = fs::metadata(path).await?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(FALLBACK_FILE_NAME)
        .to_string();

    send_json(
        stream,
        key,
        &ControlMsg::FileStart {
            name: name.clone(),
            size: meta.len(),
        },
    )
    .await?;

    let mut file = fs::File::open(path).await?;
    let mut buf = vec![0u8; FILE_CHUNK_BYTES];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        send_sealed(stream, key, &buf[..n], AAD_FILE).await?;
    }

    send_json(stream, key, &ControlMsg::FileEnd { name }).await?;
    Ok(())
}
