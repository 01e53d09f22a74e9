//! Spyglass cryptographic layer: pre-shared key handling and AEAD sealing.
//!
//! This crate provides:
//! - The 32-byte pre-shared key (PSK) type, zeroized on drop
//! - Load-or-generate key file persistence (atomic write-then-rename)
//! - AES-256-GCM seal/open with per-message random nonces and
//!   associated-data channel labels

pub mod aead;
pub mod keyfile;

// Re-export key types for convenience
pub use aead::{open, seal, CryptoError, PresharedKey, NONCE_LEN, TAG_LEN};
pub use keyfile::{load_or_create, KeyError, DEFAULT_KEY_PATH};
