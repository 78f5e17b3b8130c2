//! Authenticated encryption of target URLs.
//!
//! URLs are sealed with ChaCha20-Poly1305 under a process-wide 256-bit key.
//! Each message gets a fresh random 96-bit nonce; the stored form is
//! `base64url(nonce || ciphertext || tag)` without padding.
//!
//! Rotating the key makes every previously stored ciphertext undecryptable.
//! There is no key-id or re-encryption support.

use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use chacha20poly1305::aead::Aead;
use chacha20poly1305::{ChaCha20Poly1305, Key, KeyInit, Nonce};

/// Key length in bytes.
pub const KEY_LEN: usize = 32;

const NONCE_LEN: usize = 12;

/// Poly1305 tag length.
const TAG_LEN: usize = 16;

/// Errors produced by [`UrlCipher`].
#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("Encryption key must be base64-encoded")]
    InvalidKeyEncoding,

    #[error("Encryption key must be {KEY_LEN} bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("Encryption failed")]
    EncryptionFailed,

    /// Ciphertext was tampered with, truncated, or sealed under another key.
    #[error("Invalid ciphertext")]
    InvalidCiphertext,
}

/// Symmetric cipher for URLs, keyed once at startup.
#[derive(Clone)]
pub struct UrlCipher {
    aead: ChaCha20Poly1305,
}

impl std::fmt::Debug for UrlCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlCipher").finish_non_exhaustive()
    }
}

impl UrlCipher {
    /// Creates a cipher from raw key bytes.
    pub fn new(key: &[u8; KEY_LEN]) -> Self {
        Self {
            aead: ChaCha20Poly1305::new(Key::from_slice(key)),
        }
    }

    /// Creates a cipher from a base64 key (standard or URL-safe alphabet,
    /// padding optional).
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidKeyEncoding`] if the value is not base64 and
    /// [`CipherError::InvalidKeyLength`] if it does not decode to 32 bytes.
    pub fn from_base64_key(encoded: &str) -> Result<Self, CipherError> {
        let key = decode_key(encoded)?;
        Ok(Self::new(&key))
    }

    /// Encrypts `plaintext` into a URL-safe envelope.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        getrandom::fill(&mut nonce_bytes).map_err(|_| CipherError::EncryptionFailed)?;

        let ciphertext = self
            .aead
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
            .map_err(|_| CipherError::EncryptionFailed)?;

        let mut envelope = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        envelope.extend_from_slice(&nonce_bytes);
        envelope.extend_from_slice(&ciphertext);

        Ok(URL_SAFE_NO_PAD.encode(envelope))
    }

    /// Decrypts an envelope produced by [`Self::encrypt`].
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidCiphertext`] for any malformed, tampered or
    /// foreign-key input, and for plaintext that is not valid UTF-8.
    pub fn decrypt(&self, envelope: &str) -> Result<String, CipherError> {
        let raw = URL_SAFE_NO_PAD
            .decode(envelope.as_bytes())
            .map_err(|_| CipherError::InvalidCiphertext)?;

        if raw.len() < NONCE_LEN + TAG_LEN {
            return Err(CipherError::InvalidCiphertext);
        }

        let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
        let plaintext = self
            .aead
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CipherError::InvalidCiphertext)?;

        String::from_utf8(plaintext).map_err(|_| CipherError::InvalidCiphertext)
    }
}

/// Generates a fresh random key, base64-encoded (standard alphabet).
///
/// # Panics
///
/// Panics if the system random number generator fails (extremely rare).
pub fn generate_key() -> String {
    let mut key = [0u8; KEY_LEN];
    getrandom::fill(&mut key).expect("Failed to generate random bytes");
    STANDARD.encode(key)
}

fn decode_key(encoded: &str) -> Result<[u8; KEY_LEN], CipherError> {
    let trimmed = encoded.trim();
    let unpadded = trimmed.trim_end_matches('=');

    let bytes = URL_SAFE_NO_PAD
        .decode(unpadded.as_bytes())
        .or_else(|_| STANDARD_NO_PAD.decode(unpadded.as_bytes()))
        .map_err(|_| CipherError::InvalidKeyEncoding)?;

    <[u8; KEY_LEN]>::try_from(bytes.as_slice())
        .map_err(|_| CipherError::InvalidKeyLength(bytes.len()))
}
