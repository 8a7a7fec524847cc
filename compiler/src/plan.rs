//! The codec generator: one encode and one decode procedure per message type,
//! each an ordered list of primitive operations over a byte cursor.

use std::sync::Arc;

use msgwire_schema::{Builtin, ElementType, Field, FieldKind, MessageType};
use serde::{Serialize, Serializer};

/// Size of the count prefix of dynamic arrays and the length prefix of text.
pub const PREFIX_BYTES: usize = 4;

fn serialize_builtin<S: Serializer>(builtin: &Builtin, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(builtin.name())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Encode,
    Decode,
}

/// How many elements a `Repeat` covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Count {
    /// Known from the schema, nothing on the wire.
    Fixed(usize),
    /// A 4-byte element count precedes the elements.
    Prefixed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    Scalar(#[serde(serialize_with = "serialize_builtin")] Builtin),
    Text,
    Nested(String),
}

impl Element {
    /// Bytes checked before one element is written or read: the scalar
    /// width, the text prefix, or nothing for a nested message.
    pub fn upfront_bytes(&self) -> usize {
        match self {
            Element::Scalar(builtin) => builtin.width(),
            Element::Text => PREFIX_BYTES,
            Element::Nested(_) => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    /// `W` raw bytes, big-endian.
    Scalar {
        field: String,
        #[serde(serialize_with = "serialize_builtin")]
        builtin: Builtin,
    },
    /// Length prefix counting the terminator, payload, `0x00`.
    Text { field: String },
    /// The nested type's own procedure at the current cursor.
    Nested { field: String, type_name: String },
    /// `count` elements back to back.
    Repeat {
        field:   String,
        count:   Count,
        element: Element,
    },
}

impl Op {
    pub fn field(&self) -> &str {
        match self {
            Op::Scalar { field, .. }
            | Op::Text { field }
            | Op::Nested { field, .. }
            | Op::Repeat { field, .. } => field,
        }
    }

    /// The bounds check performed before the op touches the buffer. Text
    /// checks its whole payload as soon as the length is known; elements of
    /// prefixed arrays are checked one by one.
    pub fn upfront_bytes(&self) -> usize {
        match self {
            Op::Scalar { builtin, .. } => builtin.width(),
            Op::Text { .. } => PREFIX_BYTES,
            Op::Nested { .. } => 0,
            Op::Repeat { count: Count::Prefixed, .. } => PREFIX_BYTES,
            Op::Repeat { count: Count::Fixed(n), element: Element::Scalar(builtin), .. } => {
                n.saturating_mul(builtin.width())
            }
            Op::Repeat { count: Count::Fixed(_), .. } => 0,
        }
    }

    /// Names of nested types this op recurses into.
    pub fn nested_type(&self) -> Option<&str> {
        match self {
            Op::Nested { type_name, .. } => Some(type_name),
            Op::Repeat { element: Element::Nested(type_name), .. } => Some(type_name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Procedure {
    pub type_name: String,
    pub direction: Direction,
    pub ops:       Vec<Op>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodecPlan {
    pub encode: Procedure,
    pub decode: Procedure,
}

impl CodecPlan {
    pub fn type_name(&self) -> &str {
        &self.encode.type_name
    }
}

fn element_of(element_type: &ElementType) -> Element {
    match element_type {
        ElementType::Builtin(builtin) => Element::Scalar(*builtin),
        ElementType::Text => Element::Text,
        ElementType::Message(message) => Element::Nested(message.qualified_name.clone()),
    }
}

fn op_for(field: &Field) -> Op {
    let name = field.name.clone();
    match (field.kind, &field.element_type) {
        (FieldKind::Text, _) | (FieldKind::Scalar, ElementType::Text) => Op::Text { field: name },
        (FieldKind::Scalar, ElementType::Builtin(builtin)) => Op::Scalar {
            field:   name,
            builtin: *builtin,
        },
        (FieldKind::Scalar, ElementType::Message(message)) => Op::Nested {
            field:     name,
            type_name: message.qualified_name.clone(),
        },
        (FieldKind::FixedArray(size), element) => Op::Repeat {
            field:   name,
            count:   Count::Fixed(size),
            element: element_of(element),
        },
        (FieldKind::DynamicArray, element) => Op::Repeat {
            field:   name,
            count:   Count::Prefixed,
            element: element_of(element),
        },
    }
}

/// Derives the encode and decode procedures of one type, one op per field in
/// declaration order.
pub fn plan(message_type: &MessageType) -> CodecPlan {
    let ops: Vec<Op> = message_type.fields.iter().map(op_for).collect();
    CodecPlan {
        encode: Procedure {
            type_name: message_type.qualified_name.clone(),
            direction: Direction::Encode,
            ops:       ops.clone(),
        },
        decode: Procedure {
            type_name: message_type.qualified_name.clone(),
            direction: Direction::Decode,
            ops,
        },
    }
}

/// Plans for an ordered type list, in the same order.
pub fn plan_all(types: &[Arc<MessageType>]) -> Vec<CodecPlan> {
    types.iter().map(|t| plan(t)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{resolver::Resolver, source::MapSource};

    fn scan() -> Arc<MessageType> {
        let source = MapSource::new()
            .define("pkg/msg/Point", &[("x", "float32"), ("y", "float32")])
            .define(
                "pkg/msg/Scan",
                &[
                    ("seq", "uint32"),
                    ("frame_id", "string"),
                    ("origin", "pkg/Point"),
                    ("covariance", "float64[9]"),
                    ("data", "uint8[]"),
                    ("points", "pkg/Point[]"),
                    ("corners", "pkg/Point[4]"),
                    ("labels", "string[2]"),
                ],
            );
        Resolver::new(source).resolve("pkg/msg/Scan").unwrap()
    }

    #[test]
    fn one_op_per_field_in_order() {
        let plan = plan(&scan());
        assert_eq!(plan.type_name(), "pkg/msg/Scan");
        assert_eq!(plan.encode.direction, Direction::Encode);
        assert_eq!(plan.decode.direction, Direction::Decode);
        assert_eq!(plan.encode.ops, plan.decode.ops);
        assert_eq!(
            plan.encode.ops,
            vec![
                Op::Scalar { field: "seq".into(), builtin: Builtin::UInt32 },
                Op::Text { field: "frame_id".into() },
                Op::Nested { field: "origin".into(), type_name: "pkg/msg/Point".into() },
                Op::Repeat {
                    field:   "covariance".into(),
                    count:   Count::Fixed(9),
                    element: Element::Scalar(Builtin::Float64),
                },
                Op::Repeat {
                    field:   "data".into(),
                    count:   Count::Prefixed,
                    element: Element::Scalar(Builtin::UInt8),
                },
                Op::Repeat {
                    field:   "points".into(),
                    count:   Count::Prefixed,
                    element: Element::Nested("pkg/msg/Point".into()),
                },
                Op::Repeat {
                    field:   "corners".into(),
                    count:   Count::Fixed(4),
                    element: Element::Nested("pkg/msg/Point".into()),
                },
                Op::Repeat {
                    field:   "labels".into(),
                    count:   Count::Fixed(2),
                    element: Element::Text,
                },
            ]
        );
    }

    #[test]
    fn upfront_bounds() {
        let plan = plan(&scan());
        let upfront: Vec<usize> = plan.encode.ops.iter().map(Op::upfront_bytes).collect();
        assert_eq!(upfront, vec![4, 4, 0, 72, 4, 4, 0, 0]);
        let nested: Vec<Option<&str>> = plan.encode.ops.iter().map(Op::nested_type).collect();
        assert_eq!(
            nested,
            vec![None, None, Some("pkg/msg/Point"), None, None, Some("pkg/msg/Point"), Some("pkg/msg/Point"), None]
        );
    }

    #[test]
    fn plans_serialize_to_json() {
        let plan = plan(&MessageType::new(
            "pkg/msg/Small".into(),
            vec![Field {
                name:         "values".into(),
                kind:         FieldKind::DynamicArray,
                element_type: ElementType::Builtin(Builtin::Int16),
            }],
        ));
        let json = serde_json::to_value(&plan.encode).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type_name": "pkg/msg/Small",
                "direction": "encode",
                "ops": [
                    { "op": "repeat", "field": "values", "count": "prefixed", "element": { "scalar": "int16" } }
                ]
            })
        );
    }
}
