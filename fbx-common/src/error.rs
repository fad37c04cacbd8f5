//! Error types for scene construction and FBX encoding/decoding

use std::io;

/// Errors raised while building or mutating a [`Scene`](crate::Scene)
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// The arena cannot index another object of this kind
    #[error("cannot allocate another {kind}: arena already holds {count} objects")]
    ArenaFull { kind: &'static str, count: usize },

    /// A handle does not refer to a live object in this scene
    #[error("{0} does not exist in this scene")]
    InvalidHandle(String),

    /// Connection requested on a property the material does not expose
    #[error("material {material:?} has no property named {property:?}")]
    UnknownProperty { material: String, property: String },
}

/// Errors raised while writing a scene in an interchange encoding
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A record grew past what the 32-bit FBX 7.4 offsets can address
    #[error("FBX record {0:?} exceeds the 4 GiB limit of the 7.4 binary format")]
    RecordTooLarge(String),

    /// A property value that cannot be represented in the target encoding
    #[error("cannot encode {0}")]
    Unsupported(String),
}

/// Errors raised while parsing a binary FBX document
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("not a binary FBX file (bad magic)")]
    BadMagic,

    #[error("unexpected end of data at offset {0}")]
    UnexpectedEof(usize),

    #[error("unknown property type code {code:?} at offset {offset}")]
    UnknownPropertyType { code: char, offset: usize },

    #[error("compressed arrays are not supported (encoding {0})")]
    CompressedArray(u32),

    #[error("invalid record at offset {offset}: {reason}")]
    InvalidRecord { offset: usize, reason: String },
}
