use crate::schema::Builtin;

use std::collections::HashMap;
use std::fmt;
use std::ops::Index;

/// This type holds a dynamically typed record.
///
/// Values can represent any field of a resolved message type and are what the
/// plan interpreter encodes from and decodes into. Field names of objects are
/// borrowed from whatever owns the codec plans, so a decoded Value can outlive
/// the buffer it was read from but not the plans.
#[derive(Clone, PartialEq)]
pub enum Value<'a> {
    Bool(bool),
    Byte(u8),
    Char(u8),
    Int8(i8),
    UInt8(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    String(String),
    Array(Vec<Value<'a>>),
    Object(&'a str, HashMap<&'a str, Value<'a>>),
}

impl<'a> Value<'a> {
    /// An empty object of the named type.
    pub fn object(name: &'a str) -> Value<'a> {
        Value::Object(name, HashMap::new())
    }

    /// The raw bits of a scalar for `builtin`, ready to be written big-endian
    /// in `builtin.width()` bytes. Returns `None` when this value is not a
    /// scalar of that exact builtin.
    pub fn to_bits(&self, builtin: Builtin) -> Option<u64> {
        let bits = match (builtin, self) {
            (Builtin::Bool, Value::Bool(v))       => *v as u64,
            (Builtin::Byte, Value::Byte(v))       => *v as u64,
            (Builtin::Char, Value::Char(v))       => *v as u64,
            (Builtin::Int8, Value::Int8(v))       => *v as u8 as u64,
            (Builtin::UInt8, Value::UInt8(v))     => *v as u64,
            (Builtin::Int16, Value::Int16(v))     => *v as u16 as u64,
            (Builtin::UInt16, Value::UInt16(v))   => *v as u64,
            (Builtin::Int32, Value::Int32(v))     => *v as u32 as u64,
            (Builtin::UInt32, Value::UInt32(v))   => *v as u64,
            (Builtin::Int64, Value::Int64(v))     => *v as u64,
            (Builtin::UInt64, Value::UInt64(v))   => *v,
            (Builtin::Float32, Value::Float32(v)) => v.to_bits() as u64,
            (Builtin::Float64, Value::Float64(v)) => v.to_bits(),
            _ => return None,
        };
        Some(bits)
    }

    /// Rebuilds a scalar from the bits read for `builtin`. Any non-zero bool
    /// byte reads as `true`.
    pub fn from_bits(builtin: Builtin, bits: u64) -> Value<'a> {
        match builtin {
            Builtin::Bool    => Value::Bool(bits != 0),
            Builtin::Byte    => Value::Byte(bits as u8),
            Builtin::Char    => Value::Char(bits as u8),
            Builtin::Int8    => Value::Int8(bits as u8 as i8),
            Builtin::UInt8   => Value::UInt8(bits as u8),
            Builtin::Int16   => Value::Int16(bits as u16 as i16),
            Builtin::UInt16  => Value::UInt16(bits as u16),
            Builtin::Int32   => Value::Int32(bits as u32 as i32),
            Builtin::UInt32  => Value::UInt32(bits as u32),
            Builtin::Int64   => Value::Int64(bits as i64),
            Builtin::UInt64  => Value::UInt64(bits),
            Builtin::Float32 => Value::Float32(f32::from_bits(bits as u32)),
            Builtin::Float64 => Value::Float64(f64::from_bits(bits)),
        }
    }

    /// A short name for the variant, used in mismatch diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match *self {
            Value::Bool(_)      => "bool",
            Value::Byte(_)      => "byte",
            Value::Char(_)      => "char",
            Value::Int8(_)      => "int8",
            Value::UInt8(_)     => "uint8",
            Value::Int16(_)     => "int16",
            Value::UInt16(_)    => "uint16",
            Value::Int32(_)     => "int32",
            Value::UInt32(_)    => "uint32",
            Value::Int64(_)     => "int64",
            Value::UInt64(_)    => "uint64",
            Value::Float32(_)   => "float32",
            Value::Float64(_)   => "float64",
            Value::String(_)    => "string",
            Value::Array(_)     => "array",
            Value::Object(_, _) => "object",
        }
    }

    /// A convenience method to extract the value out of a [Bool](#variant.Bool).
    /// Returns `false` for other value kinds.
    pub fn as_bool(&self) -> bool {
        match *self {
            Value::Bool(value) => value,
            _ => false,
        }
    }

    /// Widens any integer variant to `i128`. Returns `None` for other kinds.
    pub fn as_integer(&self) -> Option<i128> {
        match *self {
            Value::Byte(v) | Value::Char(v) | Value::UInt8(v) => Some(v as i128),
            Value::Int8(v)   => Some(v as i128),
            Value::Int16(v)  => Some(v as i128),
            Value::UInt16(v) => Some(v as i128),
            Value::Int32(v)  => Some(v as i128),
            Value::UInt32(v) => Some(v as i128),
            Value::Int64(v)  => Some(v as i128),
            Value::UInt64(v) => Some(v as i128),
            _ => None,
        }
    }

    /// A convenience method to extract a floating point value.
    /// Returns `0.0` for other value kinds.
    pub fn as_float(&self) -> f64 {
        match *self {
            Value::Float32(value) => value as f64,
            Value::Float64(value) => value,
            _ => 0.0,
        }
    }

    /// A convenience method to extract the value out of a [String](#variant.String).
    /// Returns `""` for other value kinds.
    pub fn as_string(&self) -> &str {
        match *self {
            Value::String(ref value) => value.as_str(),
            _ => "",
        }
    }

    /// A convenience method to get an array of values out of an [Array](#variant.Array).
    /// Returns an empty array for other value kinds.
    pub fn as_array(&self) -> &[Value<'a>] {
        match *self {
            Value::Array(ref values) => values.as_slice(),
            _ => &[],
        }
    }

    /// A convenience method to extract the length out of an [Array](#variant.Array).
    /// Returns `0` for other value kinds.
    pub fn len(&self) -> usize {
        match *self {
            Value::Array(ref values) => values.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A convenience method to append to an [Array](#variant.Array). Does
    /// nothing for other value kinds.
    pub fn push(&mut self, value: Value<'a>) {
        if let Value::Array(ref mut values) = *self {
            values.push(value);
        }
    }

    /// A convenience method to extract a field out of an [Object](#variant.Object).
    /// Returns `None` for other value kinds or if the field isn't present.
    pub fn get(&self, name: &str) -> Option<&Value<'a>> {
        match *self {
            Value::Object(_, ref fields) => fields.get(name),
            _ => None,
        }
    }

    /// A convenience method to update a field on an [Object](#variant.Object).
    /// Does nothing for other value kinds.
    pub fn set(&mut self, name: &'a str, value: Value<'a>) {
        if let Value::Object(_, ref mut fields) = *self {
            fields.insert(name, value);
        }
    }

    /// Builder form of [set](#method.set).
    pub fn with(mut self, name: &'a str, value: Value<'a>) -> Value<'a> {
        self.set(name, value);
        self
    }

    /// A convenience method to remove a field on an [Object](#variant.Object).
    /// Does nothing for other value kinds.
    pub fn remove(&mut self, name: &'a str) {
        if let Value::Object(_, ref mut fields) = *self {
            fields.remove(name);
        }
    }
}

impl<'a> Index<usize> for Value<'a> {
    type Output = Value<'a>;

    /// A convenience method that adds support for `self[index]` expressions.
    /// It will panic if this value isn't an [Array](#variant.Array) or if the
    /// provided index is out of bounds.
    fn index(&self, index: usize) -> &Value<'a> {
        match *self {
            Value::Array(ref values) => &values[index],
            _ => panic!("cannot index into a {}", self.kind_name()),
        }
    }
}

impl<'a> fmt::Debug for Value<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match *self {
            Value::Bool(value) => value.fmt(f),
            Value::Byte(value) | Value::Char(value) | Value::UInt8(value) => value.fmt(f),
            Value::Int8(value) => value.fmt(f),
            Value::Int16(value) => value.fmt(f),
            Value::UInt16(value) => value.fmt(f),
            Value::Int32(value) => value.fmt(f),
            Value::UInt32(value) => value.fmt(f),
            Value::Int64(value) => value.fmt(f),
            Value::UInt64(value) => value.fmt(f),
            Value::Float32(value) => value.fmt(f),
            Value::Float64(value) => value.fmt(f),
            Value::String(ref value) => value.fmt(f),
            Value::Array(ref values) => values.fmt(f),

            Value::Object(name, ref fields) => {
                let mut keys: Vec<_> = fields.keys().collect();
                let mut first = true;
                keys.sort();
                write!(f, "{} {{", name)?;

                for key in keys {
                    if first {
                        first = false;
                    } else {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {:?}", key, fields[key])?;
                }

                write!(f, "}}")
            }
        }
    }
}
