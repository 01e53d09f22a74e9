use thiserror::Error;

use spyglass_crypto::CryptoError;

/// Errors surfaced by the framed transport.
///
/// Receivers dispatch on the kind: [`Closed`](WireError::Closed) and
/// [`Io`](WireError::Io) end a session cleanly, everything else means the
/// peer is hostile or corrupted and the connection is dropped without
/// recovery.
#[derive(Debug, Error)]
pub enum WireError {
    /// The peer closed the connection at a frame boundary.
    #[error("connection closed")]
    Closed,

    /// The connection ended in the middle of a frame.
    #[error("connection closed mid-frame")]
    Truncated,

    /// The length prefix exceeds the configured ceiling. Treated like an
    /// authentication failure: the body is never read.
    #[error("frame of {len} bytes exceeds the {max} byte ceiling")]
    FrameTooLarge { len: u32, max: u32 },

    /// AEAD rejected the frame: wrong key, wrong channel label, or tampering.
    #[error("frame failed authentication")]
    Auth,

    /// Local sealing failed (RNG unavailable).
    #[error("failed to seal payload")]
    Seal,

    /// The peer sent a message the current protocol state does not allow.
    #[error("protocol violation: {0}")]
    Protocol(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed control JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl WireError {
    /// True for the error kinds that mean an orderly disconnect rather than
    /// a hostile or misbehaving peer.
    pub fn is_clean_disconnect(&self) -> bool {
        matches!(self, WireError::Closed | WireError::Io(_))
    }
}

impl From<CryptoError> for WireError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::Auth => WireError::Auth,
            CryptoError::Rng | CryptoError::Seal => WireError::Seal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disconnect_classification() {
        assert!(WireError::Closed.is_clean_disconnect());
        assert!(WireError::Io(std::io::Error::from(std::io::ErrorKind::ConnectionReset))
            .is_clean_disconnect());

        assert!(!WireError::Auth.is_clean_disconnect());
        assert!(!WireError::Truncated.is_clean_disconnect());
        assert!(!WireError::FrameTooLarge { len: 1, max: 0 }.is_clean_disconnect());
        assert!(!WireError::Protocol("nested file_start").is_clean_disconnect());
    }

    #[test]
    fn auth_crypto_error_maps_to_auth() {
        let wire: WireError = CryptoError::Auth.into();
        assert!(matches!(wire, WireError::Auth));
    }
}
