//! FBX node record tree shared by the binary and ASCII encodings

/// Separator between object name and class in binary FBX strings.
/// The ASCII encoding writes the pair as `Class::Name` instead.
pub const NAME_CLASS_SEPARATOR: &str = "\x00\x01";

/// A typed property value of an FBX node record
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    Bool(bool),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    String(String),
    Raw(Vec<u8>),
    BoolArray(Vec<bool>),
    I32Array(Vec<i32>),
    I64Array(Vec<i64>),
    F32Array(Vec<f32>),
    F64Array(Vec<f64>),
}

impl Property {
    /// Binary type code of this property
    pub fn type_code(&self) -> u8 {
        match self {
            Property::Bool(_) => b'C',
            Property::I16(_) => b'Y',
            Property::I32(_) => b'I',
            Property::I64(_) => b'L',
            Property::F32(_) => b'F',
            Property::F64(_) => b'D',
            Property::String(_) => b'S',
            Property::Raw(_) => b'R',
            Property::BoolArray(_) => b'b',
            Property::I32Array(_) => b'i',
            Property::I64Array(_) => b'l',
            Property::F32Array(_) => b'f',
            Property::F64Array(_) => b'd',
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Property::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Property::I16(v) => Some(v as i64),
            Property::I32(v) => Some(v as i64),
            Property::I64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Property::F32(v) => Some(v as f64),
            Property::F64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64_array(&self) -> Option<&[f64]> {
        match self {
            Property::F64Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i32_array(&self) -> Option<&[i32]> {
        match self {
            Property::I32Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> Option<&[u8]> {
        match self {
            Property::Raw(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for Property {
    fn from(v: bool) -> Self {
        Property::Bool(v)
    }
}

impl From<i32> for Property {
    fn from(v: i32) -> Self {
        Property::I32(v)
    }
}

impl From<i64> for Property {
    fn from(v: i64) -> Self {
        Property::I64(v)
    }
}

impl From<f64> for Property {
    fn from(v: f64) -> Self {
        Property::F64(v)
    }
}

impl From<&str> for Property {
    fn from(v: &str) -> Self {
        Property::String(v.to_string())
    }
}

impl From<String> for Property {
    fn from(v: String) -> Self {
        Property::String(v)
    }
}

/// One FBX node record: a name, a property list and nested records
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FbxNode {
    pub name: String,
    pub properties: Vec<Property>,
    pub children: Vec<FbxNode>,
}

impl FbxNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Append a property (builder style)
    pub fn prop(mut self, value: impl Into<Property>) -> Self {
        self.properties.push(value.into());
        self
    }

    /// Append a nested record (builder style)
    pub fn child(mut self, child: FbxNode) -> Self {
        self.children.push(child);
        self
    }

    /// Shorthand for a child record holding a single property
    pub fn value(self, name: &str, value: impl Into<Property>) -> Self {
        self.child(FbxNode::new(name).prop(value))
    }

    pub fn push(&mut self, child: FbxNode) {
        self.children.push(child);
    }

    /// First direct child with the given name
    pub fn find(&self, name: &str) -> Option<&FbxNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Every direct child with the given name
    pub fn find_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FbxNode> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Follow a path of child names, e.g. `["Objects", "Geometry"]`
    pub fn find_path(&self, path: &[&str]) -> Option<&FbxNode> {
        path.iter().try_fold(self, |node, name| node.find(name))
    }

    pub fn property(&self, index: usize) -> Option<&Property> {
        self.properties.get(index)
    }
}

/// Encode an object's name and class the way binary FBX stores it
pub fn object_name(name: &str, class: &str) -> String {
    format!("{name}{NAME_CLASS_SEPARATOR}{class}")
}

/// Split a binary `name\0\x01class` string back into its parts
pub fn split_object_name(encoded: &str) -> Option<(&str, &str)> {
    encoded.split_once(NAME_CLASS_SEPARATOR)
}

/// Find the first top-level record with the given name
pub fn find_top<'a>(nodes: &'a [FbxNode], name: &str) -> Option<&'a FbxNode> {
    nodes.iter().find(|n| n.name == name)
}
