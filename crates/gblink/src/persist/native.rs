//! Binary storage format: a fixed 16-byte header followed by a Postcard
//! payload.
//!
//! Header layout (little-endian):
//!
//! ```text
//! offset  size  field
//! 0       4     magic "GBLK"
//! 4       1     major version
//! 5       1     minor version
//! 6       1     payload kind (0 = model, 1 = checkpoint)
//! 7       1     reserved (must be 0)
//! 8       4     payload length
//! 12      4     CRC32 of the payload
//! ```
//!
//! Readers accept any minor version at the current major; a bumped major
//! version is a hard error.

use crc32fast::Hasher;

use super::payload::Payload;

/// File magic for the binary format.
pub const MAGIC: [u8; 4] = *b"GBLK";

pub const CURRENT_VERSION_MAJOR: u8 = 1;
pub const CURRENT_VERSION_MINOR: u8 = 0;

const HEADER_LEN: usize = 16;

/// What a binary blob contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    /// Model weights and configuration only.
    Model,
    /// Model plus trainer runtime state.
    Checkpoint,
}

impl PayloadKind {
    fn to_byte(self) -> u8 {
        match self {
            PayloadKind::Model => 0,
            PayloadKind::Checkpoint => 1,
        }
    }

    fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(PayloadKind::Model),
            1 => Some(PayloadKind::Checkpoint),
            _ => None,
        }
    }
}

/// Errors produced while encoding a payload.
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("failed to encode payload: {0}")]
    Encode(#[from] postcard::Error),

    #[error("failed to encode document: {0}")]
    Document(#[from] serde_json::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors produced while decoding a payload.
#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    #[error("not a model file: bad magic bytes")]
    NotAModel,

    #[error("unsupported format version {major}.{minor} (current is {}.{})",
            CURRENT_VERSION_MAJOR, CURRENT_VERSION_MINOR)]
    UnsupportedVersion { major: u8, minor: u8 },

    #[error("unknown payload kind byte {0}")]
    UnknownKind(u8),

    #[error("buffer truncated: header declares {expected} payload bytes, {got} present")]
    Truncated { expected: usize, got: usize },

    #[error("payload checksum mismatch")]
    ChecksumMismatch,

    #[error("corrupt payload: {0}")]
    CorruptPayload(#[from] postcard::Error),

    #[error("malformed document: {0}")]
    Document(String),

    #[error("blob holds a {found}, expected a {expected}")]
    WrongKind { expected: &'static str, found: &'static str },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

fn crc32(bytes: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    hasher.finalize()
}

/// Encode a payload into a fresh byte buffer.
pub fn encode(payload: &Payload, kind: PayloadKind) -> Result<Vec<u8>, SerializeError> {
    let body = postcard::to_stdvec(payload)?;
    let mut out = Vec::with_capacity(HEADER_LEN + body.len());
    out.extend_from_slice(&MAGIC);
    out.push(CURRENT_VERSION_MAJOR);
    out.push(CURRENT_VERSION_MINOR);
    out.push(kind.to_byte());
    out.push(0);
    out.extend_from_slice(&(body.len() as u32).to_le_bytes());
    out.extend_from_slice(&crc32(&body).to_le_bytes());
    out.extend_from_slice(&body);
    Ok(out)
}

/// Decode a byte buffer, returning the payload and its declared kind.
pub fn decode(bytes: &[u8]) -> Result<(Payload, PayloadKind), DeserializeError> {
    if bytes.len() < HEADER_LEN || bytes[..4] != MAGIC {
        return Err(DeserializeError::NotAModel);
    }
    let (major, minor) = (bytes[4], bytes[5]);
    if major != CURRENT_VERSION_MAJOR {
        return Err(DeserializeError::UnsupportedVersion { major, minor });
    }
    let kind =
        PayloadKind::from_byte(bytes[6]).ok_or(DeserializeError::UnknownKind(bytes[6]))?;

    let declared = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize;
    let checksum = u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);
    let body = &bytes[HEADER_LEN..];
    if body.len() < declared {
        return Err(DeserializeError::Truncated { expected: declared, got: body.len() });
    }
    let body = &body[..declared];
    if crc32(body) != checksum {
        return Err(DeserializeError::ChecksumMismatch);
    }
    let payload = postcard::from_bytes(body)?;
    Ok((payload, kind))
}
