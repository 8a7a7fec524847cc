#![cfg(test)]

use std::collections::HashMap;

use msgwire_compiler::{order, MapSource, MsgWireError, PlanSet, Resolver};
use msgwire_schema::{Builtin, Value, WireError};
use proptest::collection::vec;
use proptest::prelude::*;

const BUILTINS: [&str; 13] = [
    "bool", "byte", "char", "int8", "uint8", "int16", "uint16", "int32", "uint32", "int64", "uint64",
    "float32", "float64",
];

#[derive(Debug, Clone)]
enum Base {
    Builtin(Builtin),
    Text,
    Nested(usize),
}

#[derive(Debug, Clone)]
enum Shape {
    Single,
    Fixed(usize),
    Dynamic,
}

#[derive(Debug, Clone)]
struct FieldSpec {
    name:  String,
    base:  Base,
    shape: Shape,
}

#[derive(Debug, Clone)]
struct TypeSpec {
    name:   String,
    fields: Vec<FieldSpec>,
}

/// Type `i` may only nest types `0..i`, so every generated schema is acyclic.
///
/// Decoders charge at least one byte per dynamic array element, so dynamic
/// arrays of zero-size types become fixed arrays here.
fn build_schema(raw: Vec<Vec<(usize, usize, usize, usize)>>) -> Vec<TypeSpec> {
    let mut schema: Vec<TypeSpec> = Vec::with_capacity(raw.len());
    let mut zero_size: Vec<bool> = Vec::with_capacity(raw.len());

    for (i, fields) in raw.into_iter().enumerate() {
        let fields: Vec<FieldSpec> = fields
            .into_iter()
            .enumerate()
            .map(|(f, (kind, shape, len, target))| {
                let base = match kind {
                    0..=12 => Base::Builtin(Builtin::from_name(BUILTINS[kind]).unwrap()),
                    _ if kind == 14 && i > 0 => Base::Nested(target % i),
                    _ => Base::Text,
                };
                let shape = match (shape, &base) {
                    (0, _) => Shape::Single,
                    (1, _) => Shape::Fixed(len),
                    (_, Base::Nested(j)) if zero_size[*j] => Shape::Fixed(len),
                    _ => Shape::Dynamic,
                };
                FieldSpec { name: format!("f{}", f), base, shape }
            })
            .collect();

        zero_size.push(fields.iter().all(|field| match field.base {
            Base::Nested(j) => zero_size[j],
            _ => false,
        }));
        schema.push(TypeSpec { name: format!("gen/msg/T{}", i), fields });
    }
    schema
}

fn schema_strategy() -> impl Strategy<Value = Vec<TypeSpec>> {
    vec(vec((0usize..15, 0usize..3, 1usize..4, any::<usize>()), 0..5), 1..6).prop_map(build_schema)
}

fn source(schema: &[TypeSpec]) -> MapSource {
    let mut source = MapSource::new();
    for spec in schema {
        let descriptors: Vec<(String, String)> = spec
            .fields
            .iter()
            .map(|field| {
                let base = match &field.base {
                    Base::Builtin(builtin) => builtin.name().to_string(),
                    Base::Text => "string".to_string(),
                    Base::Nested(j) => schema[*j].name.clone(),
                };
                let suffix = match field.shape {
                    Shape::Single => String::new(),
                    Shape::Fixed(n) => format!("[{}]", n),
                    Shape::Dynamic => "[]".to_string(),
                };
                (field.name.clone(), format!("{}{}", base, suffix))
            })
            .collect();
        let pairs: Vec<(&str, &str)> = descriptors.iter().map(|(n, d)| (n.as_str(), d.as_str())).collect();
        source = source.define(&spec.name, &pairs);
    }
    source
}

/// xorshift64*, enough to spread one proptest seed over a whole record.
struct Rng(u64);

impl Rng {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 >> 12;
        self.0 ^= self.0 << 25;
        self.0 ^= self.0 >> 27;
        self.0.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }
}

fn scalar<'a>(builtin: Builtin, rng: &mut Rng) -> Value<'a> {
    let bits = rng.next();
    match builtin {
        // NaN never compares equal, so floats stay finite.
        Builtin::Float32 => Value::Float32((bits as i32) as f32 / 8.0),
        Builtin::Float64 => Value::Float64((bits as i64) as f64 / 1024.0),
        _ => Value::from_bits(builtin, bits),
    }
}

fn text(rng: &mut Rng) -> String {
    let len = (rng.next() % 6) as usize;
    (0..len).map(|_| (b'a' + (rng.next() % 26) as u8) as char).collect()
}

fn element<'a>(schema: &'a [TypeSpec], base: &Base, rng: &mut Rng) -> Value<'a> {
    match base {
        Base::Builtin(builtin) => scalar(*builtin, rng),
        Base::Text => Value::String(text(rng)),
        Base::Nested(j) => record(schema, *j, rng),
    }
}

fn record<'a>(schema: &'a [TypeSpec], index: usize, rng: &mut Rng) -> Value<'a> {
    let spec = &schema[index];
    let mut fields = HashMap::new();
    for field in &spec.fields {
        let value = match field.shape {
            Shape::Single => element(schema, &field.base, rng),
            Shape::Fixed(n) => Value::Array((0..n).map(|_| element(schema, &field.base, rng)).collect()),
            Shape::Dynamic => {
                let n = (rng.next() % 4) as usize;
                Value::Array((0..n).map(|_| element(schema, &field.base, rng)).collect())
            }
        };
        fields.insert(field.name.as_str(), value);
    }
    Value::Object(spec.name.as_str(), fields)
}

fn names(schema: &[TypeSpec]) -> Vec<&str> {
    schema.iter().map(|t| t.name.as_str()).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(96))]

    #[test]
    fn prop_records_round_trip(schema in schema_strategy(), seed in any::<u64>()) {
        let mut resolver = Resolver::new(source(&schema));
        let types = order(&mut resolver, &names(&schema)).unwrap();
        let plans = PlanSet::from_types(&types).unwrap();
        let mut rng = Rng(seed | 1);

        for (index, spec) in schema.iter().enumerate() {
            let value = record(&schema, index, &mut rng);
            let bytes = plans.encode_to_vec(&spec.name, &value).unwrap();
            prop_assert_eq!(bytes.len(), plans.encoded_len(&spec.name, &value).unwrap());
            prop_assert!(bytes.len() >= plans.min_size(&spec.name).unwrap());

            let (decoded, consumed) = plans.decode(&spec.name, &bytes).unwrap();
            prop_assert_eq!(consumed, bytes.len());
            prop_assert_eq!(&decoded, &value);
        }
    }

    #[test]
    fn prop_short_buffers_are_rejected(schema in schema_strategy(), seed in any::<u64>()) {
        let mut resolver = Resolver::new(source(&schema));
        let types = order(&mut resolver, &names(&schema)).unwrap();
        let plans = PlanSet::from_types(&types).unwrap();
        let mut rng = Rng(seed | 1);

        let index = schema.len() - 1;
        let value = record(&schema, index, &mut rng);
        let exact = plans.encoded_len(&schema[index].name, &value).unwrap();
        if exact > 0 {
            let mut buffer = vec![0u8; exact - 1];
            let result = plans.encode(&schema[index].name, &value, &mut buffer);
            prop_assert!(
                matches!(result, Err(MsgWireError::Wire(WireError::BufferTooSmall { .. }))),
                "encode into {} bytes returned {:?}", exact - 1, result
            );
        }
    }

    #[test]
    fn prop_order_is_deterministic_and_topological(schema in schema_strategy()) {
        let roots: Vec<&str> = names(&schema).into_iter().rev().collect();
        let first = order(&mut Resolver::new(source(&schema)), &roots).unwrap();
        let again = order(&mut Resolver::new(source(&schema)), &roots).unwrap();

        let first_names: Vec<&str> = first.iter().map(|t| t.qualified_name.as_str()).collect();
        let again_names: Vec<&str> = again.iter().map(|t| t.qualified_name.as_str()).collect();
        prop_assert_eq!(&first_names, &again_names);

        // Every generated type is reachable from the roots, exactly once.
        let mut sorted = first_names.clone();
        sorted.sort_unstable();
        sorted.dedup();
        prop_assert_eq!(sorted.len(), schema.len());
        prop_assert_eq!(first_names.len(), schema.len());

        for (position, message) in first.iter().enumerate() {
            for nested in message.references() {
                let dependency = first_names
                    .iter()
                    .position(|name| *name == nested.qualified_name)
                    .unwrap();
                prop_assert!(dependency < position, "{} precedes its dependency {}", message.qualified_name, nested.qualified_name);
            }
        }
    }
}
