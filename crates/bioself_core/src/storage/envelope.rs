//! Byte layout of the store file.
//!
//! ```text
//! "BSLF" | version u8 | salt[16] | memory_kib u32 | iterations u32 |
//! parallelism u32 | nonce[24] | ciphertext[..] | tag[16]
//! ```
//!
//! Integers are little-endian. Everything before the nonce is bound into the
//! AEAD tag as associated data.

use crate::crypto::{KdfParams, SealedBox, NONCE_LEN, SALT_LEN, TAG_LEN};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const MAGIC: &[u8; 4] = b"BSLF";
pub const FORMAT_VERSION: u8 = 1;

const PREFIX_LEN: usize = MAGIC.len() + 1 + SALT_LEN + 3 * 4;
const HEADER_LEN: usize = PREFIX_LEN + NONCE_LEN;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    Truncated { len: usize },
    BadMagic,
    UnsupportedFormatVersion(u8),
}

impl Display for EnvelopeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Truncated { len } => write!(f, "store file truncated at {len} bytes"),
            Self::BadMagic => write!(f, "store file magic mismatch"),
            Self::UnsupportedFormatVersion(version) => {
                write!(f, "unsupported store format version {version}")
            }
        }
    }
}

impl Error for EnvelopeError {}

/// Decoded store file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub salt: [u8; SALT_LEN],
    pub kdf: KdfParams,
    pub sealed: SealedBox,
}

/// Serialized header bytes preceding the nonce; used as AEAD associated data.
pub fn header_prefix(salt: &[u8; SALT_LEN], kdf: &KdfParams) -> Vec<u8> {
    let mut out = Vec::with_capacity(PREFIX_LEN);
    out.extend_from_slice(MAGIC);
    out.push(FORMAT_VERSION);
    out.extend_from_slice(salt);
    out.extend_from_slice(&kdf.memory_kib.to_le_bytes());
    out.extend_from_slice(&kdf.iterations.to_le_bytes());
    out.extend_from_slice(&kdf.parallelism.to_le_bytes());
    out
}

impl Envelope {
    pub fn associated_data(&self) -> Vec<u8> {
        header_prefix(&self.salt, &self.kdf)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out =
            Vec::with_capacity(HEADER_LEN + self.sealed.ciphertext.len() + TAG_LEN);
        out.extend_from_slice(&self.associated_data());
        out.extend_from_slice(&self.sealed.nonce);
        out.extend_from_slice(&self.sealed.ciphertext);
        out.extend_from_slice(&self.sealed.tag);
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        if bytes.len() < MAGIC.len() + 1 {
            return Err(EnvelopeError::Truncated { len: bytes.len() });
        }
        if &bytes[..MAGIC.len()] != MAGIC {
            return Err(EnvelopeError::BadMagic);
        }
        let version = bytes[MAGIC.len()];
        if version != FORMAT_VERSION {
            return Err(EnvelopeError::UnsupportedFormatVersion(version));
        }
        if bytes.len() < HEADER_LEN + TAG_LEN {
            return Err(EnvelopeError::Truncated { len: bytes.len() });
        }

        let mut cursor = MAGIC.len() + 1;
        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(&bytes[cursor..cursor + SALT_LEN]);
        cursor += SALT_LEN;

        let memory_kib = read_u32(bytes, &mut cursor);
        let iterations = read_u32(bytes, &mut cursor);
        let parallelism = read_u32(bytes, &mut cursor);

        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&bytes[cursor..cursor + NONCE_LEN]);
        cursor += NONCE_LEN;

        let tag_start = bytes.len() - TAG_LEN;
        let mut tag = [0u8; TAG_LEN];
        tag.copy_from_slice(&bytes[tag_start..]);

        Ok(Self {
            salt,
            kdf: KdfParams {
                memory_kib,
                iterations,
                parallelism,
            },
            sealed: SealedBox {
                nonce,
                ciphertext: bytes[cursor..tag_start].to_vec(),
                tag,
            },
        })
    }
}

fn read_u32(bytes: &[u8], cursor: &mut usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[*cursor..*cursor + 4]);
    *cursor += 4;
    u32::from_le_bytes(raw)
}
