//! FBX ASCII encoding (7.4 text form)
//!
//! ```text
//! ; FBX 7.4.0 project file
//! Objects:  {
//!     Geometry: 1000, "Geometry::tri", "Mesh" {
//!         Vertices: *9 {
//!             a: 0,0,0,1,0,0,0,1,0
//!         }
//!     }
//! }
//! ```

use super::node::{split_object_name, FbxNode, Property};
use crate::error::EncodeError;
use std::fmt::Write as _;
use std::io::Write;

/// Write a complete ASCII FBX document
pub fn write_document<W: Write + ?Sized>(w: &mut W, nodes: &[FbxNode], creator: &str) -> Result<(), EncodeError> {
    let text = encode_document(nodes, creator)?;
    w.write_all(text.as_bytes())?;
    Ok(())
}

/// Encode a complete ASCII FBX document into a string
pub fn encode_document(nodes: &[FbxNode], creator: &str) -> Result<String, EncodeError> {
    let mut out = String::with_capacity(64 * 1024);
    out.push_str("; FBX 7.4.0 project file\n");
    let _ = writeln!(out, "; Created by {creator}");
    out.push_str("; ----------------------------------------------------\n\n");

    for node in nodes {
        write_node(&mut out, node, 0)?;
    }
    Ok(out)
}

fn write_node(out: &mut String, node: &FbxNode, depth: usize) -> Result<(), EncodeError> {
    indent(out, depth);
    out.push_str(&node.name);
    out.push(':');

    // Array values own the whole record body
    if let [array] = node.properties.as_slice() {
        if let Some(len) = array_len(array) {
            let _ = writeln!(out, " *{len} {{");
            indent(out, depth + 1);
            out.push_str("a: ");
            write_array_values(out, array, &node.name)?;
            out.push('\n');
            indent(out, depth);
            out.push_str("}\n");
            return Ok(());
        }
    }

    out.push(' ');
    for (i, property) in node.properties.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_scalar(out, property, &node.name)?;
    }

    if node.children.is_empty() && !node.properties.is_empty() {
        out.push('\n');
        return Ok(());
    }

    out.push_str(" {\n");
    for child in &node.children {
        write_node(out, child, depth + 1)?;
    }
    indent(out, depth);
    out.push_str("}\n");
    Ok(())
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push('\t');
    }
}

fn array_len(property: &Property) -> Option<usize> {
    match property {
        Property::BoolArray(v) => Some(v.len()),
        Property::I32Array(v) => Some(v.len()),
        Property::I64Array(v) => Some(v.len()),
        Property::F32Array(v) => Some(v.len()),
        Property::F64Array(v) => Some(v.len()),
        _ => None,
    }
}

fn write_array_values(out: &mut String, property: &Property, record: &str) -> Result<(), EncodeError> {
    fn join<T: std::fmt::Display>(out: &mut String, values: impl Iterator<Item = T>) {
        for (i, v) in values.enumerate() {
            if i > 0 {
                out.push(',');
            }
            let _ = write!(out, "{v}");
        }
    }

    match property {
        Property::BoolArray(v) => join(out, v.iter().map(|b| *b as u8)),
        Property::I32Array(v) => join(out, v.iter()),
        Property::I64Array(v) => join(out, v.iter()),
        Property::F32Array(v) => {
            v.iter().try_for_each(|&x| check_finite(x as f64, record))?;
            join(out, v.iter())
        }
        Property::F64Array(v) => {
            v.iter().try_for_each(|&x| check_finite(x, record))?;
            join(out, v.iter())
        }
        _ => {}
    }
    Ok(())
}

/// The text form has no spelling for NaN or infinities
fn check_finite(value: f64, record: &str) -> Result<(), EncodeError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(EncodeError::Unsupported(format!(
            "{record} holds {value}, which ASCII FBX cannot represent"
        )))
    }
}

fn write_scalar(out: &mut String, property: &Property, record: &str) -> Result<(), EncodeError> {
    match property {
        Property::Bool(v) => out.push(if *v { 'T' } else { 'F' }),
        Property::I16(v) => {
            let _ = write!(out, "{v}");
        }
        Property::I32(v) => {
            let _ = write!(out, "{v}");
        }
        Property::I64(v) => {
            let _ = write!(out, "{v}");
        }
        Property::F32(v) => {
            check_finite(*v as f64, record)?;
            let _ = write!(out, "{v}");
        }
        Property::F64(v) => {
            check_finite(*v, record)?;
            let _ = write!(out, "{v}");
        }
        Property::String(s) => {
            out.push('"');
            match split_object_name(s) {
                Some((name, class)) => {
                    out.push_str(&escape(class));
                    out.push_str("::");
                    out.push_str(&escape(name));
                }
                None => out.push_str(&escape(s)),
            }
            out.push('"');
        }
        Property::Raw(_) => {
            return Err(EncodeError::Unsupported(format!(
                "raw binary property of record {record:?} in ASCII output"
            )));
        }
        array => write_array_values(out, array, record)?,
    }
    Ok(())
}

fn escape(s: &str) -> String {
    s.replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::super::node::object_name;
    use super::*;

    #[test]
    fn test_header_comment() {
        let text = encode_document(&[], "tests").unwrap();
        assert!(text.starts_with("; FBX 7.4.0 project file\n"));
        assert!(text.contains("; Created by tests"));
    }

    #[test]
    fn test_object_names_are_class_first() {
        let node = FbxNode::new("Material")
            .prop(7i64)
            .prop(object_name("wood_mat", "Material"))
            .prop("")
            .value("Version", 102);
        let text = encode_document(&[node], "tests").unwrap();
        assert!(text.contains("Material: 7, \"Material::wood_mat\", \"\" {\n"));
        assert!(text.contains("\tVersion: 102\n"));
    }

    #[test]
    fn test_arrays_use_star_count_blocks() {
        let node = FbxNode::new("PolygonVertexIndex").prop(Property::I32Array(vec![0, 1, -3]));
        let text = encode_document(&[node], "tests").unwrap();
        assert!(text.contains("PolygonVertexIndex: *3 {\n\ta: 0,1,-3\n}\n"));
    }

    #[test]
    fn test_non_finite_values_are_refused() {
        let node = FbxNode::new("Vertices").prop(Property::F64Array(vec![f64::NAN, 0.0, 0.0]));
        let err = encode_document(&[node], "tests").unwrap_err();
        assert!(matches!(err, EncodeError::Unsupported(ref m) if m.contains("Vertices")));

        let node = FbxNode::new("P").prop("Intensity").prop(f64::INFINITY);
        assert!(encode_document(&[node], "tests").is_err());
    }

    #[test]
    fn test_empty_record_gets_braces() {
        let text = encode_document(&[FbxNode::new("References")], "tests").unwrap();
        assert!(text.contains("References:  {\n}\n"));
    }

    #[test]
    fn test_quotes_are_escaped() {
        let node = FbxNode::new("Creator").prop("say \"hi\"");
        let text = encode_document(&[node], "tests").unwrap();
        assert!(text.contains("Creator: \"say &quot;hi&quot;\"\n"));
    }

    #[test]
    fn test_raw_property_is_rejected() {
        let node = FbxNode::new("Content").prop(Property::Raw(vec![0, 1]));
        assert!(matches!(
            encode_document(&[node], "tests"),
            Err(EncodeError::Unsupported(_))
        ));
    }
}
