//! Executes codec plans over dynamic [`Value`] records.

use std::collections::HashMap;
use std::sync::Arc;

use msgwire_schema::{alloc_vec, Builtin, ByteBuffer, ByteBufferMut, MessageType, Value};

use crate::{
    descriptor::canonical_name,
    error::MsgWireError,
    plan::{plan_all, CodecPlan, Count, Element, Op, PREFIX_BYTES},
};

/// The plans of an ordered type list, ready to encode and decode records.
///
/// Decoded objects borrow their type and field names from the set.
#[derive(Debug, Clone)]
pub struct PlanSet {
    plans:     Vec<CodecPlan>,
    index:     HashMap<String, usize>,
    min_sizes: Vec<usize>,
}

impl PlanSet {
    /// Plans must be in dependency order: every type a plan recurses into
    /// has to come earlier in the list.
    pub fn new(plans: Vec<CodecPlan>) -> Result<PlanSet, MsgWireError> {
        let mut set = PlanSet {
            index:     HashMap::with_capacity(plans.len()),
            min_sizes: Vec::with_capacity(plans.len()),
            plans:     Vec::new(),
        };
        for plan in &plans {
            let min_size = set.min_size_of(plan)?;
            set.index.insert(plan.type_name().to_string(), set.min_sizes.len());
            set.min_sizes.push(min_size);
        }
        set.plans = plans;
        Ok(set)
    }

    pub fn from_types(types: &[Arc<MessageType>]) -> Result<PlanSet, MsgWireError> {
        PlanSet::new(plan_all(types))
    }

    pub fn plans(&self) -> &[CodecPlan] {
        &self.plans
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.plans.iter().map(CodecPlan::type_name)
    }

    fn position(&self, type_name: &str) -> Result<usize, MsgWireError> {
        if let Some(&position) = self.index.get(type_name) {
            return Ok(position);
        }
        canonical_name(type_name)
            .ok()
            .and_then(|name| self.index.get(&name).copied())
            .ok_or_else(|| MsgWireError::UnknownPlan(type_name.to_string()))
    }

    pub fn plan(&self, type_name: &str) -> Result<&CodecPlan, MsgWireError> {
        Ok(&self.plans[self.position(type_name)?])
    }

    /// The smallest encoding any record of `type_name` can have.
    pub fn min_size(&self, type_name: &str) -> Result<usize, MsgWireError> {
        Ok(self.min_sizes[self.position(type_name)?])
    }

    fn min_size_of(&self, plan: &CodecPlan) -> Result<usize, MsgWireError> {
        let mut total = 0usize;
        for op in &plan.encode.ops {
            let size = match op {
                Op::Scalar { builtin, .. } => builtin.width(),
                Op::Text { .. } => PREFIX_BYTES,
                Op::Nested { type_name, .. } => self.min_size(type_name)?,
                Op::Repeat { count: Count::Prefixed, .. } => PREFIX_BYTES,
                Op::Repeat { count: Count::Fixed(n), element, .. } => {
                    n.saturating_mul(self.min_element_size(element)?)
                }
            };
            total = total.saturating_add(size);
        }
        Ok(total)
    }

    fn min_element_size(&self, element: &Element) -> Result<usize, MsgWireError> {
        Ok(match element {
            Element::Scalar(builtin) => builtin.width(),
            Element::Text => PREFIX_BYTES,
            Element::Nested(type_name) => self.min_size(type_name)?,
        })
    }

    /// Exact number of bytes `encode` writes for `value`.
    pub fn encoded_len(&self, type_name: &str, value: &Value) -> Result<usize, MsgWireError> {
        let plan = self.plan(type_name)?;
        let fields = object_fields(plan.type_name(), value)?;
        let mut total = 0usize;
        for op in &plan.encode.ops {
            let field_value = field(plan.type_name(), fields, op.field())?;
            total += match op {
                Op::Scalar { builtin, .. } => builtin.width(),
                Op::Text { field } => PREFIX_BYTES + text(field, field_value)?.len() + 1,
                Op::Nested { type_name, .. } => self.encoded_len(type_name, field_value)?,
                Op::Repeat { field, count, element } => {
                    let items = array(field, *count, field_value)?;
                    let mut size = match count {
                        Count::Prefixed => PREFIX_BYTES,
                        Count::Fixed(_) => 0,
                    };
                    for item in items {
                        size += match element {
                            Element::Scalar(builtin) => builtin.width(),
                            Element::Text => PREFIX_BYTES + text(field, item)?.len() + 1,
                            Element::Nested(type_name) => self.encoded_len(type_name, item)?,
                        };
                    }
                    size
                }
            };
        }
        Ok(total)
    }

    /// Encodes `value` at the start of `buffer` and returns the number of
    /// bytes written.
    ///
    /// Every op checks its bounds before writing. On failure, whatever was
    /// already written stays in `buffer` and must be discarded.
    pub fn encode(&self, type_name: &str, value: &Value, buffer: &mut [u8]) -> Result<usize, MsgWireError> {
        let mut bb = ByteBufferMut::new(buffer);
        self.encode_type(type_name, value, &mut bb)?;
        Ok(bb.len())
    }

    /// Encodes into a fresh vector of exactly the encoded length.
    pub fn encode_to_vec(&self, type_name: &str, value: &Value) -> Result<Vec<u8>, MsgWireError> {
        let mut buffer = vec![0u8; self.encoded_len(type_name, value)?];
        let written = self.encode(type_name, value, &mut buffer)?;
        buffer.truncate(written);
        Ok(buffer)
    }

    fn encode_type(&self, type_name: &str, value: &Value, bb: &mut ByteBufferMut) -> Result<(), MsgWireError> {
        let plan = self.plan(type_name)?;
        let fields = object_fields(plan.type_name(), value)?;

        for op in &plan.encode.ops {
            let field_value = field(plan.type_name(), fields, op.field())?;
            bb.ensure(op.upfront_bytes())?;

            match op {
                Op::Scalar { field, builtin } => write_scalar(field, *builtin, field_value, bb)?,
                Op::Text { field } => bb.write_string(text(field, field_value)?)?,
                Op::Nested { type_name, .. } => self.encode_type(type_name, field_value, bb)?,
                Op::Repeat { field, count, element } => {
                    let items = array(field, *count, field_value)?;
                    if *count == Count::Prefixed {
                        bb.write_count(items.len())?;
                    }
                    for item in items {
                        self.encode_element(field, element, item, bb)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn encode_element(&self, field: &str, element: &Element, item: &Value, bb: &mut ByteBufferMut) -> Result<(), MsgWireError> {
        match element {
            Element::Scalar(builtin) => write_scalar(field, *builtin, item, bb),
            Element::Text => Ok(bb.write_string(text(field, item)?)?),
            Element::Nested(type_name) => self.encode_type(type_name, item, bb),
        }
    }

    /// Decodes one record of `type_name` from the start of `buffer`, returning
    /// it with the number of bytes consumed. Trailing bytes are left alone.
    pub fn decode<'p>(&'p self, type_name: &str, buffer: &[u8]) -> Result<(Value<'p>, usize), MsgWireError> {
        let mut bb = ByteBuffer::new(buffer);
        let value = self.decode_type(type_name, &mut bb)?;
        Ok((value, bb.index()))
    }

    fn decode_type<'p>(&'p self, type_name: &str, bb: &mut ByteBuffer) -> Result<Value<'p>, MsgWireError> {
        let plan = self.plan(type_name)?;
        let mut fields = HashMap::with_capacity(plan.decode.ops.len());

        for op in &plan.decode.ops {
            bb.ensure(op.upfront_bytes())?;

            let value = match op {
                Op::Scalar { builtin, .. } => Value::from_bits(*builtin, bb.read_uint(builtin.width())?),
                Op::Text { .. } => Value::String(bb.read_string()?),
                Op::Nested { type_name, .. } => self.decode_type(type_name, bb)?,
                Op::Repeat { count, element, .. } => {
                    let count = match count {
                        Count::Fixed(n) => *n,
                        Count::Prefixed => bb.read_count()?,
                    };
                    // Reject counts the remaining input cannot possibly hold
                    // before reserving storage for them. Zero-size elements
                    // still count as one byte each.
                    let needed = count.saturating_mul(self.min_element_size(element)?.max(1));
                    bb.ensure(needed)?;

                    let mut items = alloc_vec(count)?;
                    for _ in 0..count {
                        items.push(self.decode_element(element, bb)?);
                    }
                    Value::Array(items)
                }
            };
            fields.insert(op.field(), value);
        }

        Ok(Value::Object(plan.type_name(), fields))
    }

    fn decode_element<'p>(&'p self, element: &'p Element, bb: &mut ByteBuffer) -> Result<Value<'p>, MsgWireError> {
        Ok(match element {
            Element::Scalar(builtin) => Value::from_bits(*builtin, bb.read_uint(builtin.width())?),
            Element::Text => Value::String(bb.read_string()?),
            Element::Nested(type_name) => self.decode_type(type_name, bb)?,
        })
    }
}

fn object_fields<'v, 'a>(type_name: &str, value: &'v Value<'a>) -> Result<&'v HashMap<&'a str, Value<'a>>, MsgWireError> {
    match value {
        Value::Object(_, fields) => Ok(fields),
        other => Err(MsgWireError::TypeMismatch {
            field:    type_name.to_string(),
            expected: format!("{} object", type_name),
            found:    other.kind_name().to_string(),
        }),
    }
}

fn field<'v, 'a>(type_name: &str, fields: &'v HashMap<&'a str, Value<'a>>, name: &str) -> Result<&'v Value<'a>, MsgWireError> {
    fields.get(name).ok_or_else(|| MsgWireError::MissingField {
        type_name: type_name.to_string(),
        field:     name.to_string(),
    })
}

fn text<'v>(field: &str, value: &'v Value) -> Result<&'v str, MsgWireError> {
    match value {
        Value::String(text) => Ok(text),
        other => Err(mismatch(field, "string", other)),
    }
}

fn array<'v, 'a>(field: &str, count: Count, value: &'v Value<'a>) -> Result<&'v [Value<'a>], MsgWireError> {
    let items = match value {
        Value::Array(items) => items.as_slice(),
        other => return Err(mismatch(field, "array", other)),
    };
    if let Count::Fixed(n) = count {
        if items.len() != n {
            return Err(MsgWireError::TypeMismatch {
                field:    field.to_string(),
                expected: format!("array of {} elements", n),
                found:    format!("array of {} elements", items.len()),
            });
        }
    }
    Ok(items)
}

fn mismatch(field: &str, expected: &str, found: &Value) -> MsgWireError {
    MsgWireError::TypeMismatch {
        field:    field.to_string(),
        expected: expected.to_string(),
        found:    found.kind_name().to_string(),
    }
}

fn integer_range(builtin: Builtin) -> Option<(i128, i128)> {
    Some(match builtin {
        Builtin::Byte | Builtin::Char | Builtin::UInt8 => (0, u8::MAX as i128),
        Builtin::Int8   => (i8::MIN as i128, i8::MAX as i128),
        Builtin::Int16  => (i16::MIN as i128, i16::MAX as i128),
        Builtin::UInt16 => (0, u16::MAX as i128),
        Builtin::Int32  => (i32::MIN as i128, i32::MAX as i128),
        Builtin::UInt32 => (0, u32::MAX as i128),
        Builtin::Int64  => (i64::MIN as i128, i64::MAX as i128),
        Builtin::UInt64 => (0, u64::MAX as i128),
        Builtin::Bool | Builtin::Float32 | Builtin::Float64 => return None,
    })
}

/// Bits for `builtin` from `value`. Exact variants are taken as they are;
/// other integers are accepted when they fit, floats of either width convert.
fn scalar_bits(field: &str, builtin: Builtin, value: &Value) -> Result<u64, MsgWireError> {
    if let Some(bits) = value.to_bits(builtin) {
        return Ok(bits);
    }
    let converted = match builtin {
        Builtin::Float32 => match value {
            Value::Float64(v) => Some((*v as f32).to_bits() as u64),
            _ => None,
        },
        Builtin::Float64 => match value {
            Value::Float32(v) => Some((*v as f64).to_bits()),
            _ => None,
        },
        _ => match (integer_range(builtin), value.as_integer()) {
            (Some((min, max)), Some(v)) if v >= min && v <= max => Some(v as u64),
            _ => None,
        },
    };
    converted.ok_or_else(|| mismatch(field, builtin.name(), value))
}

fn write_scalar(field: &str, builtin: Builtin, value: &Value, bb: &mut ByteBufferMut) -> Result<(), MsgWireError> {
    let bits = scalar_bits(field, builtin, value)?;
    bb.write_uint(builtin.width(), bits)?;
    Ok(())
}
