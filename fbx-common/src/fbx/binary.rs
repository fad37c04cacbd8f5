//! FBX binary encoding (version 7400)
//!
//! # Layout
//! ```text
//! 0x00: "Kaydara FBX Binary  \0" 0x1A 0x00
//! 0x17: version u32 (7400)
//! 0x1B: node records ... null record (13 zero bytes)
//! var:  footer (id, padding to 16, version, 120 zero bytes, magic)
//! ```
//!
//! Each node record:
//! ```text
//! end_offset u32      absolute offset of the byte after this record
//! property_count u32
//! property_bytes u32
//! name_len u8, name
//! properties
//! nested records, then a null record when the record has children
//! ```
//!
//! Arrays are always written uncompressed (encoding 0).

use super::node::{FbxNode, Property};
use crate::error::{DecodeError, EncodeError};
use std::io::Write;

/// Version written in the header and footer
pub const FBX_VERSION: u32 = 7400;

/// File magic: 21 bytes of text + NUL, then 0x1A 0x00
pub const MAGIC: &[u8; 23] = b"Kaydara FBX Binary  \x00\x1a\x00";

const HEADER_SIZE: usize = MAGIC.len() + 4;
const NULL_RECORD: [u8; 13] = [0; 13];
const NULL_RECORD_WIDE: [u8; 25] = [0; 25];

const FOOTER_ID: [u8; 16] = [
    0xfa, 0xbc, 0xab, 0x09, 0xd0, 0xc8, 0xd4, 0x66, 0xb1, 0x76, 0xfb, 0x83, 0x1c, 0xf7, 0x26, 0x7e,
];
const FOOTER_MAGIC: [u8; 16] = [
    0xf8, 0x5a, 0x8c, 0x6a, 0xde, 0xf5, 0xd9, 0x7e, 0xec, 0xe9, 0x0c, 0xe3, 0x75, 0x8f, 0x29, 0x0b,
];

/// Write a complete binary FBX document
pub fn write_document<W: Write + ?Sized>(w: &mut W, nodes: &[FbxNode]) -> Result<(), EncodeError> {
    let bytes = encode_document(nodes)?;
    w.write_all(&bytes)?;
    Ok(())
}

/// Encode a complete binary FBX document into memory
///
/// Record headers hold absolute file offsets, so the whole document is laid
/// out in one buffer before it is handed to the writer.
pub fn encode_document(nodes: &[FbxNode]) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::with_capacity(64 * 1024);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&FBX_VERSION.to_le_bytes());

    for node in nodes {
        write_node(&mut out, node)?;
    }
    out.extend_from_slice(&NULL_RECORD);

    write_footer(&mut out);
    Ok(out)
}

fn write_node(out: &mut Vec<u8>, node: &FbxNode) -> Result<(), EncodeError> {
    let name = node.name.as_bytes();
    let name_len = u8::try_from(name.len()).map_err(|_| {
        EncodeError::Unsupported(format!("record name longer than 255 bytes: {:?}", node.name))
    })?;

    let header_at = out.len();
    out.extend_from_slice(&[0u8; 12]);
    out.push(name_len);
    out.extend_from_slice(name);

    let properties_at = out.len();
    for property in &node.properties {
        write_property(out, property)?;
    }
    let property_bytes = out.len() - properties_at;

    for child in &node.children {
        write_node(out, child)?;
    }
    if !node.children.is_empty() || node.properties.is_empty() {
        out.extend_from_slice(&NULL_RECORD);
    }

    let end_offset = offset_u32(out.len(), &node.name)?;
    let property_count = offset_u32(node.properties.len(), &node.name)?;
    let property_bytes = offset_u32(property_bytes, &node.name)?;

    out[header_at..header_at + 4].copy_from_slice(&end_offset.to_le_bytes());
    out[header_at + 4..header_at + 8].copy_from_slice(&property_count.to_le_bytes());
    out[header_at + 8..header_at + 12].copy_from_slice(&property_bytes.to_le_bytes());
    Ok(())
}

fn offset_u32(value: usize, record: &str) -> Result<u32, EncodeError> {
    u32::try_from(value).map_err(|_| EncodeError::RecordTooLarge(record.to_string()))
}

fn write_property(out: &mut Vec<u8>, property: &Property) -> Result<(), EncodeError> {
    out.push(property.type_code());
    match property {
        Property::Bool(v) => out.push(*v as u8),
        Property::I16(v) => out.extend_from_slice(&v.to_le_bytes()),
        Property::I32(v) => out.extend_from_slice(&v.to_le_bytes()),
        Property::I64(v) => out.extend_from_slice(&v.to_le_bytes()),
        Property::F32(v) => out.extend_from_slice(&v.to_le_bytes()),
        Property::F64(v) => out.extend_from_slice(&v.to_le_bytes()),
        Property::String(s) => write_blob(out, s.as_bytes())?,
        Property::Raw(bytes) => write_blob(out, bytes)?,
        Property::BoolArray(v) => {
            write_array_header(out, v.len(), v.len())?;
            out.extend(v.iter().map(|b| *b as u8));
        }
        Property::I32Array(v) => {
            write_array_header(out, v.len(), v.len() * 4)?;
            v.iter().for_each(|x| out.extend_from_slice(&x.to_le_bytes()));
        }
        Property::I64Array(v) => {
            write_array_header(out, v.len(), v.len() * 8)?;
            v.iter().for_each(|x| out.extend_from_slice(&x.to_le_bytes()));
        }
        Property::F32Array(v) => {
            write_array_header(out, v.len(), v.len() * 4)?;
            v.iter().for_each(|x| out.extend_from_slice(&x.to_le_bytes()));
        }
        Property::F64Array(v) => {
            write_array_header(out, v.len(), v.len() * 8)?;
            v.iter().for_each(|x| out.extend_from_slice(&x.to_le_bytes()));
        }
    }
    Ok(())
}

fn write_blob(out: &mut Vec<u8>, bytes: &[u8]) -> Result<(), EncodeError> {
    let len = u32::try_from(bytes.len())
        .map_err(|_| EncodeError::Unsupported("string or raw property over 4 GiB".into()))?;
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(bytes);
    Ok(())
}

fn write_array_header(out: &mut Vec<u8>, len: usize, byte_len: usize) -> Result<(), EncodeError> {
    let too_big = || EncodeError::Unsupported("array property over 4 GiB".into());
    let len = u32::try_from(len).map_err(|_| too_big())?;
    let byte_len = u32::try_from(byte_len).map_err(|_| too_big())?;
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes()); // encoding: uncompressed
    out.extend_from_slice(&byte_len.to_le_bytes());
    Ok(())
}

fn write_footer(out: &mut Vec<u8>) {
    out.extend_from_slice(&FOOTER_ID);
    out.extend_from_slice(&[0u8; 4]);

    // Align to 16; an already aligned offset still gets a full block
    let offset = out.len();
    let pad = match ((offset + 15) & !15) - offset {
        0 => 16,
        n => n,
    };
    out.resize(offset + pad, 0);

    out.extend_from_slice(&FBX_VERSION.to_le_bytes());
    out.extend_from_slice(&[0u8; 120]);
    out.extend_from_slice(&FOOTER_MAGIC);
}

/// A parsed binary FBX document
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryDocument {
    pub version: u32,
    pub nodes: Vec<FbxNode>,
}

impl BinaryDocument {
    /// First top-level record with the given name
    pub fn find(&self, name: &str) -> Option<&FbxNode> {
        self.nodes.iter().find(|n| n.name == name)
    }
}

/// Returns true if the data starts with the binary FBX magic
pub fn is_binary_fbx(data: &[u8]) -> bool {
    data.starts_with(MAGIC)
}

/// Parse a binary FBX document (7.x, uncompressed arrays only)
pub fn read_document(data: &[u8]) -> Result<BinaryDocument, DecodeError> {
    if !is_binary_fbx(data) {
        return Err(DecodeError::BadMagic);
    }

    let mut cursor = Cursor {
        data,
        pos: MAGIC.len(),
    };
    let version = cursor.u32()?;
    debug_assert_eq!(cursor.pos, HEADER_SIZE);
    let wide = version >= 7500;

    let mut nodes = Vec::new();
    while let Some(node) = read_node(&mut cursor, wide)? {
        nodes.push(node);
    }

    Ok(BinaryDocument { version, nodes })
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or(DecodeError::UnexpectedEof(self.pos))?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.array::<1>()?[0])
    }

    fn u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    fn u64(&mut self) -> Result<u64, DecodeError> {
        Ok(u64::from_le_bytes(self.array()?))
    }
}

fn read_node(cursor: &mut Cursor<'_>, wide: bool) -> Result<Option<FbxNode>, DecodeError> {
    let start = cursor.pos;
    let (end_offset, property_count, property_bytes) = if wide {
        (cursor.u64()?, cursor.u64()?, cursor.u64()?)
    } else {
        (
            cursor.u32()? as u64,
            cursor.u32()? as u64,
            cursor.u32()? as u64,
        )
    };
    let name_len = cursor.u8()?;

    if end_offset == 0 && property_count == 0 && property_bytes == 0 && name_len == 0 {
        return Ok(None);
    }

    let invalid = |reason: String| DecodeError::InvalidRecord {
        offset: start,
        reason,
    };

    let name = String::from_utf8_lossy(cursor.take(name_len as usize)?).into_owned();

    let properties_at = cursor.pos;
    let mut properties = Vec::with_capacity(property_count.min(64) as usize);
    for _ in 0..property_count {
        properties.push(read_property(cursor)?);
    }
    if (cursor.pos - properties_at) as u64 != property_bytes {
        return Err(invalid(format!(
            "record {name:?} declares {property_bytes} property bytes but holds {}",
            cursor.pos - properties_at
        )));
    }

    let end = usize::try_from(end_offset)
        .ok()
        .filter(|end| *end >= cursor.pos && *end <= cursor.data.len())
        .ok_or_else(|| invalid(format!("record {name:?} ends out of bounds ({end_offset})")))?;

    let sentinel = if wide {
        NULL_RECORD_WIDE.len()
    } else {
        NULL_RECORD.len()
    };
    let mut children = Vec::new();
    while cursor.pos < end {
        if end - cursor.pos < sentinel {
            return Err(invalid(format!("trailing bytes inside record {name:?}")));
        }
        match read_node(cursor, wide)? {
            Some(child) => children.push(child),
            None => break,
        }
    }
    if cursor.pos != end {
        return Err(invalid(format!("record {name:?} overruns its end offset")));
    }

    Ok(Some(FbxNode {
        name,
        properties,
        children,
    }))
}

fn read_property(cursor: &mut Cursor<'_>) -> Result<Property, DecodeError> {
    let offset = cursor.pos;
    let code = cursor.u8()?;
    let property = match code {
        b'C' => Property::Bool(cursor.u8()? != 0),
        b'Y' => Property::I16(i16::from_le_bytes(cursor.array()?)),
        b'I' => Property::I32(i32::from_le_bytes(cursor.array()?)),
        b'L' => Property::I64(i64::from_le_bytes(cursor.array()?)),
        b'F' => Property::F32(f32::from_le_bytes(cursor.array()?)),
        b'D' => Property::F64(f64::from_le_bytes(cursor.array()?)),
        b'S' => {
            let len = cursor.u32()? as usize;
            Property::String(String::from_utf8_lossy(cursor.take(len)?).into_owned())
        }
        b'R' => {
            let len = cursor.u32()? as usize;
            Property::Raw(cursor.take(len)?.to_vec())
        }
        b'b' => Property::BoolArray(read_array(cursor, 1, |b| b[0] != 0)?),
        b'i' => Property::I32Array(read_array(cursor, 4, |b| {
            i32::from_le_bytes([b[0], b[1], b[2], b[3]])
        })?),
        b'l' => Property::I64Array(read_array(cursor, 8, |b| {
            i64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
        })?),
        b'f' => Property::F32Array(read_array(cursor, 4, |b| {
            f32::from_le_bytes([b[0], b[1], b[2], b[3]])
        })?),
        b'd' => Property::F64Array(read_array(cursor, 8, |b| {
            f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
        })?),
        other => {
            return Err(DecodeError::UnknownPropertyType {
                code: other as char,
                offset,
            });
        }
    };
    Ok(property)
}

fn read_array<T>(
    cursor: &mut Cursor<'_>,
    element_size: usize,
    decode: impl Fn(&[u8]) -> T,
) -> Result<Vec<T>, DecodeError> {
    let offset = cursor.pos;
    let len = cursor.u32()? as usize;
    let encoding = cursor.u32()?;
    let byte_len = cursor.u32()? as usize;

    if encoding != 0 {
        return Err(DecodeError::CompressedArray(encoding));
    }
    if len.checked_mul(element_size) != Some(byte_len) {
        return Err(DecodeError::InvalidRecord {
            offset,
            reason: format!("array of {len} elements stored in {byte_len} bytes"),
        });
    }

    Ok(cursor
        .take(byte_len)?
        .chunks_exact(element_size)
        .map(decode)
        .collect())
}
