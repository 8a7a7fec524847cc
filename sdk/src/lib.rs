//! msgwire
//!
//! Runtime support for generated codecs and for applications handling
//! msgwire-encoded data.
//!
//! - `WireMessage` trait implemented by generated structs
//! - `ByteBuffer` / `ByteBufferMut` cursors and `WireError`
//! - `Value` records and their JSON form

use serde_json::{Map, Number, Value as Json};

pub use msgwire_compiler::error::MsgWireError;
pub use msgwire_compiler::runtime::PlanSet;
pub use msgwire_compiler::traits::{read_array, read_vec, WireMessage};
pub use msgwire_schema::{ByteBuffer, ByteBufferMut, Value, WireError};

/// The JSON form of a record: objects map field names to values, text is a
/// string, and non-finite floats become `null`. Object keys are sorted by
/// name; use [`record_to_json`] to get declaration order.
pub fn value_to_json(value: &Value) -> Json {
    to_json(None, value)
}

/// Like [`value_to_json`], but object fields follow the wire order of their
/// type's plan. Fields the plan does not know come last, sorted by name.
pub fn record_to_json(plans: &PlanSet, value: &Value) -> Json {
    to_json(Some(plans), value)
}

fn to_json(plans: Option<&PlanSet>, value: &Value) -> Json {
    match value {
        Value::Bool(v)    => Json::Bool(*v),
        Value::Byte(v)    => Json::from(*v),
        Value::Char(v)    => Json::from(*v),
        Value::Int8(v)    => Json::from(*v),
        Value::UInt8(v)   => Json::from(*v),
        Value::Int16(v)   => Json::from(*v),
        Value::UInt16(v)  => Json::from(*v),
        Value::Int32(v)   => Json::from(*v),
        Value::UInt32(v)  => Json::from(*v),
        Value::Int64(v)   => Json::from(*v),
        Value::UInt64(v)  => Json::from(*v),
        Value::Float32(v) => Number::from_f64(f64::from(*v)).map_or(Json::Null, Json::Number),
        Value::Float64(v) => Number::from_f64(*v).map_or(Json::Null, Json::Number),
        Value::String(v)  => Json::String(v.clone()),
        Value::Array(items) => Json::Array(items.iter().map(|item| to_json(plans, item)).collect()),
        Value::Object(type_name, fields) => {
            let declared: Vec<&str> = plans
                .and_then(|plans| plans.plan(type_name).ok())
                .map(|plan| plan.encode.ops.iter().map(|op| op.field()).collect())
                .unwrap_or_default();

            let mut rest: Vec<&str> = fields.keys().copied().filter(|name| !declared.contains(name)).collect();
            rest.sort_unstable();

            let mut object = Map::new();
            for name in declared.into_iter().chain(rest) {
                if let Some(field) = fields.get(name) {
                    object.insert(name.to_string(), to_json(plans, field));
                }
            }
            Json::Object(object)
        }
    }
}

/// Decode one record of `type_name` and pretty-print it as JSON, fields in
/// wire order.
pub fn decode_to_json(plans: &PlanSet, type_name: &str, buffer: &[u8]) -> Result<String, MsgWireError> {
    let (value, _) = plans.decode(type_name, buffer)?;
    Ok(serde_json::to_string_pretty(&record_to_json(plans, &value))?)
}

pub mod traits {
    pub use msgwire_compiler::traits::WireMessage;
}

pub mod error {
    pub use msgwire_compiler::error::MsgWireError;
    pub use msgwire_schema::WireError;
}
