//! Length-prefixed sealed framing over a byte stream.
//!
//! Wire format per frame:
//!
//! ```text
//! +--------+----------+------------------------+
//! | len:4  | nonce:12 | ciphertext+tag: len-12 |
//! +--------+----------+------------------------+
//! len is big-endian u32 and counts the bytes after itself
//! ```
//!
//! The length prefix is read before anything else and checked against a
//! ceiling, so a forged prefix cannot make the receiver allocate gigabytes.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use spyglass_crypto::{open, seal, PresharedKey};

use crate::error::WireError;
use crate::messages::ControlMsg;

/// Channel label for sealed JPEG frames on the video connection.
pub const AAD_VIDEO: &[u8] = b"video";

/// Channel label for JSON control records.
pub const AAD_CONTROL: &[u8] = b"control";

/// Channel label for raw file chunks interleaved on the control connection.
pub const AAD_FILE: &[u8] = b"file";

/// Default anti-DoS ceiling on the length prefix: 16 MiB.
pub const DEFAULT_MAX_FRAME_BYTES: u32 = 16 * 1024 * 1024;

/// Seal `payload` under `key`/`aad` and write it as one length-prefixed frame.
pub async fn send_sealed<S>(
    stream: &mut S,
    key: &PresharedKey,
    payload: &[u8],
    aad: &[u8],
) -> Result<(), WireError>
where
    S: AsyncWrite + Unpin,
{
    let blob = seal(key, payload, aad)?;
    let len = blob.len() as u32;

    stream.write_all(&len.to_be_bytes()).await?;
    stream.write_all(&blob).await?;
    stream.flush().await?;
    Ok(())
}

/// Read one frame and open it.
///
/// EOF before the first header byte is a clean [`WireError::Closed`]; EOF
/// anywhere later is [`WireError::Truncated`]. A length prefix above
/// `max_len` is rejected before the body is read.
pub async fn recv_open<S>(
    stream: &mut S,
    key: &PresharedKey,
    aad: &[u8],
    max_len: u32,
) -> Result<Vec<u8>, WireError>
where
    S: AsyncRead + Unpin,
{
    let mut header = [0u8; 4];
    let mut filled = 0;
    while filled < header.len() {
        let n = stream.read(&mut header[filled..]).await?;
        if n == 0 {
            return Err(if filled == 0 {
                WireError::Closed
            } else {
                WireError::Truncated
            });
        }
        filled += n;
    }

    let len = u32::from_be_bytes(header);
    if len > max_len {
        return Err(WireError::FrameTooLarge { len, max: max_len });
    }

    let mut blob = vec![0u8; len as usize];
    stream.read_exact(&mut blob).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            WireError::Truncated
        } else {
            WireError::Io(e)
        }
    })?;

    Ok(open(key, &blob, aad)?)
}

/// Serialize a control message to JSON and send it with AAD `"control"`.
pub async fn send_json<S>(
    stream: &mut S,
    key: &PresharedKey,
    msg: &ControlMsg,
) -> Result<(), WireError>
where
    S: AsyncWrite + Unpin,
{
    let data = serde_json::to_vec(msg)?;
    send_sealed(stream, key, &data, AAD_CONTROL).await
}

/// Receive one control frame and parse it.
///
/// A parse failure is a [`WireError::Json`], distinct from [`WireError::Auth`]:
/// the frame authenticated, its contents just did not decode, and dispatchers
/// log and carry on.
pub async fn recv_json<S>(
    stream: &mut S,
    key: &PresharedKey,
    max_len: u32,
) -> Result<ControlMsg, WireError>
where
    S: AsyncRead + Unpin,
{
    let data = recv_open(stream, key, AAD_CONTROL, max_len).await?;
    Ok(serde_json::from_slice(&data)?)
}
