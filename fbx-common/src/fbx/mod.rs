//! FBX 7.4 record tree and its two on-disk encodings

pub mod ascii;
pub mod binary;
pub mod document;
pub mod node;

pub use document::{build_document, DocumentOptions};
pub use node::{find_top, object_name, split_object_name, FbxNode, Property};

/// On-disk encoding of an FBX document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Binary,
    Ascii,
}
