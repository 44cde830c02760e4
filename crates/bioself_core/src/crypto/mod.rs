//! Passphrase key derivation and authenticated encryption.
//!
//! # Responsibility
//! - Derive a 256-bit key from a user passphrase with argon2id.
//! - Seal and open the serialized aggregate with XChaCha20-Poly1305.
//!
//! # Invariants
//! - Every store gets a fresh random salt; every seal gets a fresh random nonce.
//! - `open` never returns plaintext unless the tag verifies.
//! - Wrong key, truncated ciphertext and tampered header are indistinguishable
//!   (`CryptoError::AuthenticationFailed`).
//! - Key bytes are wiped on drop and never formatted.

use argon2::{Algorithm, Argon2, Params, Version};
use chacha20poly1305::aead::{AeadInPlace, KeyInit};
use chacha20poly1305::{Key, Tag, XChaCha20Poly1305, XNonce};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use zeroize::Zeroizing;

pub const SALT_LEN: usize = 16;
pub const NONCE_LEN: usize = 24;
pub const TAG_LEN: usize = 16;
pub const KEY_LEN: usize = 32;

const MAX_MEMORY_KIB: u32 = 4 * 1024 * 1024;
const MAX_ITERATIONS: u32 = 64;
const MAX_PARALLELISM: u32 = 16;

pub type CryptoResult<T> = Result<T, CryptoError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Tag did not verify: wrong key, tampering, or truncation.
    AuthenticationFailed,
    KeyDerivation(String),
    Randomness(String),
    InvalidParams(String),
}

impl Display for CryptoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed => write!(f, "authentication failed"),
            Self::KeyDerivation(message) => write!(f, "key derivation failed: {message}"),
            Self::Randomness(message) => write!(f, "random source unavailable: {message}"),
            Self::InvalidParams(message) => write!(f, "invalid kdf parameters: {message}"),
        }
    }
}

impl Error for CryptoError {}

/// Argon2id work factor, recorded in the store header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: 64 * 1024,
            iterations: 3,
            parallelism: 1,
        }
    }
}

impl KdfParams {
    /// Rejects parameters argon2 cannot run and values above the hard caps.
    ///
    /// The caps stop a crafted header from demanding unbounded memory or time
    /// before the tag is ever checked.
    pub fn validate(&self) -> CryptoResult<()> {
        if self.memory_kib > MAX_MEMORY_KIB {
            return Err(CryptoError::InvalidParams(format!(
                "memory_kib {} exceeds {MAX_MEMORY_KIB}",
                self.memory_kib
            )));
        }
        if self.iterations > MAX_ITERATIONS {
            return Err(CryptoError::InvalidParams(format!(
                "iterations {} exceeds {MAX_ITERATIONS}",
                self.iterations
            )));
        }
        if self.parallelism > MAX_PARALLELISM {
            return Err(CryptoError::InvalidParams(format!(
                "parallelism {} exceeds {MAX_PARALLELISM}",
                self.parallelism
            )));
        }
        self.argon2_params().map(|_| ())
    }

    fn argon2_params(&self) -> CryptoResult<Params> {
        Params::new(
            self.memory_kib,
            self.iterations,
            self.parallelism,
            Some(KEY_LEN),
        )
        .map_err(|err| CryptoError::InvalidParams(err.to_string()))
    }
}

/// Symmetric key derived from a passphrase. Zeroized on drop.
pub struct DerivedKey(Zeroizing<[u8; KEY_LEN]>);

impl DerivedKey {
    fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl Debug for DerivedKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey(..)")
    }
}

/// Fresh salt plus the key derived from it.
#[derive(Debug)]
pub struct KeyMaterial {
    pub salt: [u8; SALT_LEN],
    pub kdf: KdfParams,
    pub key: DerivedKey,
}

/// AEAD output with the tag kept separate from the ciphertext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedBox {
    pub nonce: [u8; NONCE_LEN],
    pub ciphertext: Vec<u8>,
    pub tag: [u8; TAG_LEN],
}

/// Generates a random salt and derives a key for a new store.
pub fn create(passphrase: &str, kdf: KdfParams) -> CryptoResult<KeyMaterial> {
    let salt = random_bytes::<SALT_LEN>()?;
    let key = derive_key(passphrase, &salt, &kdf)?;
    Ok(KeyMaterial { salt, kdf, key })
}

/// Deterministically re-derives the key for an existing store.
pub fn derive_key(passphrase: &str, salt: &[u8], kdf: &KdfParams) -> CryptoResult<DerivedKey> {
    kdf.validate()?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, kdf.argon2_params()?);
    let mut out = Zeroizing::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into(passphrase.as_bytes(), salt, &mut out[..])
        .map_err(|err| CryptoError::KeyDerivation(err.to_string()))?;
    Ok(DerivedKey(out))
}

/// Encrypts `plaintext` under `key`, binding `associated_data` into the tag.
pub fn seal(plaintext: &[u8], key: &DerivedKey, associated_data: &[u8]) -> CryptoResult<SealedBox> {
    let nonce = random_bytes::<NONCE_LEN>()?;
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(XNonce::from_slice(&nonce), associated_data, &mut buffer)
        .map_err(|_| CryptoError::AuthenticationFailed)?;

    let mut tag_bytes = [0u8; TAG_LEN];
    tag_bytes.copy_from_slice(tag.as_slice());
    Ok(SealedBox {
        nonce,
        ciphertext: buffer,
        tag: tag_bytes,
    })
}

/// Decrypts a sealed box. Fails closed: the buffer is wiped when the tag
/// does not verify.
pub fn open(
    sealed: &SealedBox,
    key: &DerivedKey,
    associated_data: &[u8],
) -> CryptoResult<Zeroizing<Vec<u8>>> {
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    let mut buffer = Zeroizing::new(sealed.ciphertext.clone());
    cipher
        .decrypt_in_place_detached(
            XNonce::from_slice(&sealed.nonce),
            associated_data,
            buffer.as_mut_slice(),
            Tag::from_slice(&sealed.tag),
        )
        .map_err(|_| CryptoError::AuthenticationFailed)?;
    Ok(buffer)
}

fn random_bytes<const N: usize>() -> CryptoResult<[u8; N]> {
    let mut bytes = [0u8; N];
    getrandom::getrandom(&mut bytes).map_err(|err| CryptoError::Randomness(err.to_string()))?;
    Ok(bytes)
}
