use std::path::PathBuf;

use thiserror::Error;

/// Failures while applying a ref-delta's copy/insert instruction stream.
#[derive(Debug, Error)]
pub enum DeltaError {
    #[error("invalid delta: opcode 0 is reserved")]
    ZeroOpcode,

    #[error("invalid delta: copy offset {offset} length {length} exceeds base length {base_len}")]
    CopyOutOfRange {
        offset: usize,
        length: usize,
        base_len: usize,
    },

    #[error("invalid delta: expected target size {expected}, got {actual}")]
    TargetSizeMismatch { expected: usize, actual: usize },

    #[error("invalid delta: expected source size {expected}, got {actual}")]
    SourceSizeMismatch { expected: usize, actual: usize },

    #[error("invalid delta: instruction stream ended early")]
    Truncated,
}

/// Failures while parsing or walking a packfile.
#[derive(Debug, Error)]
pub enum PackError {
    #[error("pack header invalid: missing 'PACK' signature")]
    BadSignature,

    #[error("pack header invalid: unsupported version {0}")]
    UnsupportedVersion(u32),

    #[error("pack truncated: expected {expected} more bytes, found {found}")]
    Truncated { expected: usize, found: usize },

    #[error("pack object has unrecognized type id {0}")]
    UnknownObjectType(u8),

    #[error("ofs-delta objects are not supported by this core")]
    UnsupportedOfsDelta,

    #[error("pack checksum mismatch: trailer does not match computed SHA-1 of pack body")]
    ChecksumMismatch,
}

/// Failures while speaking the smart-v2 pkt-line protocol.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed pkt-line: {0}")]
    MalformedPktLine(String),

    #[error("unexpected sideband channel byte {0}")]
    UnexpectedChannel(u8),

    #[error("remote reported an error: {0}")]
    Remote(String),
}

/// A checkout entry would write outside of the destination directory.
#[derive(Debug, Error)]
#[error("unsafe path in tree entry: {0:?}")]
pub struct CheckoutError(pub PathBuf);
