//! AES-256-GCM sealing for wire payloads.
//!
//! Every sealed message carries a fresh 12-byte nonce drawn from the system
//! RNG, followed by the ciphertext and 16-byte authentication tag. The
//! associated data is a short per-channel label that binds the ciphertext to
//! the channel it travels on, so a frame lifted from the video stream cannot
//! be replayed as a control message.
//!
//! Random 96-bit nonces with no rekeying are fine for this system's
//! lifetimes: the collision probability stays below 2^-64 until about 2^32
//! messages under one key, far beyond any session length seen here.

use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};
use ring::rand::{SecureRandom, SystemRandom};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Nonce size prepended to every sealed blob.
pub const NONCE_LEN: usize = 12;

/// AES-256-GCM authentication tag size appended to the ciphertext.
pub const TAG_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("system RNG failure")]
    Rng,

    #[error("encryption failed")]
    Seal,

    #[error("authentication failed: wrong key, wrong label, or tampered data")]
    Auth,
}

/// The symmetric 32-byte key both peers share out of band.
///
/// Deliberately has no `Debug` impl and is wiped from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PresharedKey([u8; 32]);

impl PresharedKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    fn aead_key(&self) -> LessSafeKey {
        // 32 bytes is always a valid AES-256 key length
        let unbound = UnboundKey::new(&AES_256_GCM, &self.0).expect("valid key length");
        LessSafeKey::new(unbound)
    }
}

/// Encrypt `plaintext` under `key`, binding `aad` into the tag.
///
/// Returns `nonce ‖ ciphertext ‖ tag`.
pub fn seal(key: &PresharedKey, plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let rng = SystemRandom::new();
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rng.fill(&mut nonce_bytes).map_err(|_| CryptoError::Rng)?;

    let nonce = Nonce::assume_unique_for_key(nonce_bytes);

    let mut blob = Vec::with_capacity(NONCE_LEN + plaintext.len() + TAG_LEN);
    blob.extend_from_slice(&nonce_bytes);
    blob.extend_from_slice(plaintext);

    let tag = key
        .aead_key()
        .seal_in_place_separate_tag(nonce, Aad::from(aad), &mut blob[NONCE_LEN..])
        .map_err(|_| CryptoError::Seal)?;
    blob.extend_from_slice(tag.as_ref());

    Ok(blob)
}

/// Decrypt a `nonce ‖ ciphertext ‖ tag` blob produced by [`seal`].
///
/// Truncation, a flipped bit anywhere, a different key, or a different AAD
/// label all collapse into the same opaque [`CryptoError::Auth`].
pub fn open(key: &PresharedKey, blob: &[u8], aad: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if blob.len() < NONCE_LEN + TAG_LEN {
        return Err(CryptoError::Auth);
    }

    let mut nonce_bytes = [0u8; NONCE_LEN];
    nonce_bytes.copy_from_slice(&blob[..NONCE_LEN]);
    let nonce = Nonce::assume_unique_for_key(nonce_bytes);

    let mut in_out = blob[NONCE_LEN..].to_vec();
    let plaintext = key
        .aead_key()
        .open_in_place(nonce, Aad::from(aad), &mut in_out)
        .map_err(|_| CryptoError::Auth)?;

    Ok(plaintext.to_vec())
}
