use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Primitive scalar types with a fixed wire width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Bool,
    Byte,
    Char,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
}

/// Builtin spellings accepted in type descriptors, case-sensitive.
pub const BUILTIN_NAMES: [(&str, Builtin); 17] = [
    ("bool",    Builtin::Bool),
    ("boolean", Builtin::Bool),
    ("byte",    Builtin::Byte),
    ("octet",   Builtin::Byte),
    ("char",    Builtin::Char),
    ("int8",    Builtin::Int8),
    ("uint8",   Builtin::UInt8),
    ("int16",   Builtin::Int16),
    ("uint16",  Builtin::UInt16),
    ("int32",   Builtin::Int32),
    ("uint32",  Builtin::UInt32),
    ("int64",   Builtin::Int64),
    ("uint64",  Builtin::UInt64),
    ("float32", Builtin::Float32),
    ("float",   Builtin::Float32),
    ("float64", Builtin::Float64),
    ("double",  Builtin::Float64),
];

/// Builtin names that denote variable-length text.
pub const TEXT_NAMES: [&str; 2] = ["string", "wstring"];

impl Builtin {
    pub fn from_name(name: &str) -> Option<Builtin> {
        BUILTIN_NAMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, b)| *b)
    }

    /// Number of bytes this builtin occupies on the wire.
    pub fn width(self) -> usize {
        match self {
            Builtin::Bool | Builtin::Byte | Builtin::Char | Builtin::Int8 | Builtin::UInt8 => 1,
            Builtin::Int16 | Builtin::UInt16 => 2,
            Builtin::Int32 | Builtin::UInt32 | Builtin::Float32 => 4,
            Builtin::Int64 | Builtin::UInt64 | Builtin::Float64 => 8,
        }
    }

    /// Canonical spelling.
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Bool    => "bool",
            Builtin::Byte    => "byte",
            Builtin::Char    => "char",
            Builtin::Int8    => "int8",
            Builtin::UInt8   => "uint8",
            Builtin::Int16   => "int16",
            Builtin::UInt16  => "uint16",
            Builtin::Int32   => "int32",
            Builtin::UInt32  => "uint32",
            Builtin::Int64   => "int64",
            Builtin::UInt64  => "uint64",
            Builtin::Float32 => "float32",
            Builtin::Float64 => "float64",
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, Builtin::Float32 | Builtin::Float64)
    }
}

impl fmt::Display for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a single element of a field is made of.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementType {
    Builtin(Builtin),
    /// Only used as the element of an array of strings. A plain text field is
    /// `FieldKind::Text` over `Builtin::Char`.
    Text,
    Message(Arc<MessageType>),
}

impl ElementType {
    pub fn message(&self) -> Option<&Arc<MessageType>> {
        match self {
            ElementType::Message(message) => Some(message),
            _ => None,
        }
    }
}

/// Shape of a field. The fixed size of an array lives in the variant, so a
/// size exists exactly when the field is a fixed array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Scalar,
    Text,
    FixedArray(usize),
    DynamicArray,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name:         String,
    pub kind:         FieldKind,
    pub element_type: ElementType,
}

impl Field {
    pub fn array_size(&self) -> Option<usize> {
        match self.kind {
            FieldKind::FixedArray(size) => Some(size),
            _ => None,
        }
    }

    /// The nested message type this field refers to, array elements included.
    pub fn nested(&self) -> Option<&Arc<MessageType>> {
        self.element_type.message()
    }
}

/// A resolved message type. Immutable once built; shared between the
/// dependency orderer and the codec generator.
#[derive(Debug, Clone)]
pub struct MessageType {
    pub qualified_name: String,
    pub fields:         Vec<Field>,
}

impl MessageType {
    pub fn new(qualified_name: String, fields: Vec<Field>) -> MessageType {
        MessageType { qualified_name, fields }
    }

    /// `pkg` for `pkg/msg/Name` or `pkg/Name`, `None` for a bare name.
    pub fn package(&self) -> Option<&str> {
        self.qualified_name
            .rsplit_once('/')
            .map(|(prefix, _)| prefix.split('/').next().unwrap_or(prefix))
    }

    /// The last path segment of the qualified name.
    pub fn short_name(&self) -> &str {
        self.qualified_name
            .rsplit('/')
            .next()
            .unwrap_or(&self.qualified_name)
    }

    /// Nested message types referenced by this type's own fields, in field
    /// declaration order. May contain duplicates.
    pub fn references(&self) -> impl Iterator<Item = &Arc<MessageType>> {
        self.fields.iter().filter_map(Field::nested)
    }
}

// Names are unique within a session, so identity is the qualified name.
impl PartialEq for MessageType {
    fn eq(&self, other: &Self) -> bool {
        self.qualified_name == other.qualified_name
    }
}

impl Eq for MessageType {}

impl Hash for MessageType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.qualified_name.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_lookup_is_case_sensitive() {
        assert_eq!(Builtin::from_name("uint32"), Some(Builtin::UInt32));
        assert_eq!(Builtin::from_name("double"), Some(Builtin::Float64));
        assert_eq!(Builtin::from_name("boolean"), Some(Builtin::Bool));
        assert_eq!(Builtin::from_name("UInt32"), None);
        assert_eq!(Builtin::from_name("string"), None);
    }

    #[test]
    fn builtin_widths() {
        for (name, builtin) in BUILTIN_NAMES {
            assert!(matches!(builtin.width(), 1 | 2 | 4 | 8), "{}", name);
        }
        assert_eq!(Builtin::Char.width(), 1);
        assert_eq!(Builtin::Int16.width(), 2);
        assert_eq!(Builtin::Float32.width(), 4);
        assert_eq!(Builtin::UInt64.width(), 8);
    }

    #[test]
    fn message_identity_is_the_name() {
        let a = MessageType::new("pkg/msg/A".to_owned(), vec![]);
        let b = MessageType::new(
            "pkg/msg/A".to_owned(),
            vec![Field {
                name:         "x".to_owned(),
                kind:         FieldKind::Scalar,
                element_type: ElementType::Builtin(Builtin::Int32),
            }],
        );
        assert_eq!(a, b);
        assert_eq!(a.package(), Some("pkg"));
        assert_eq!(a.short_name(), "A");

        let bare = MessageType::new("Point".to_owned(), vec![]);
        assert_eq!(bare.package(), None);
        assert_eq!(bare.short_name(), "Point");
    }

    #[test]
    fn array_size_only_for_fixed_arrays() {
        let field = |kind| Field {
            name:         "f".to_owned(),
            kind,
            element_type: ElementType::Builtin(Builtin::Byte),
        };
        assert_eq!(field(FieldKind::FixedArray(3)).array_size(), Some(3));
        assert_eq!(field(FieldKind::DynamicArray).array_size(), None);
        assert_eq!(field(FieldKind::Scalar).array_size(), None);
    }
}
