//! Load-or-generate persistence for the pre-shared key.
//!
//! The key lives in a single raw 32-byte file, conventionally `secret.key`
//! next to the binary. First use generates it from the system RNG and writes
//! it via a temp file plus rename, so a crash never leaves a short key
//! behind. Two processes racing on first creation both write valid random
//! keys and the last rename wins.

use std::io::Write;
use std::path::{Path, PathBuf};

use ring::rand::{SecureRandom, SystemRandom};
use thiserror::Error;
use tracing::info;

use crate::aead::PresharedKey;

/// Conventional key file location, relative to the working directory.
pub const DEFAULT_KEY_PATH: &str = "secret.key";

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("key file {path} holds {len} bytes, expected exactly 32")]
    BadLength { path: PathBuf, len: usize },

    #[error("system RNG failure")]
    Rng,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read the key file, or create it with fresh randomness if it is missing.
///
/// A key file of any length other than 32 bytes is an error; startup must
/// fail rather than run with a weak or corrupted key.
pub fn load_or_create(path: &Path) -> Result<PresharedKey, KeyError> {
    match std::fs::read(path) {
        Ok(bytes) => {
            if bytes.len() != 32 {
                return Err(KeyError::BadLength {
                    path: path.to_path_buf(),
                    len: bytes.len(),
                });
            }
            let mut key = [0u8; 32];
            key.copy_from_slice(&bytes);
            Ok(PresharedKey::from_bytes(key))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => generate(path),
        Err(e) => Err(e.into()),
    }
}

fn generate(path: &Path) -> Result<PresharedKey, KeyError> {
    let rng = SystemRandom::new();
    let mut key = [0u8; 32];
    rng.fill(&mut key).map_err(|_| KeyError::Rng)?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(&key)?;
    tmp.flush()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tmp.as_file().set_permissions(perms)?;
    }

    tmp.persist(path).map_err(|e| KeyError::Io(e.error))?;
    info!(path = %path.display(), "generated new pre-shared key");

    Ok(PresharedKey::from_bytes(key))
}
