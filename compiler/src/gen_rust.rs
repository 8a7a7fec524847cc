use msgwire_schema::Builtin;

use crate::{
    error::MsgWireError,
    plan::{CodecPlan, Count, Element, Op, PREFIX_BYTES},
    runtime::PlanSet,
    utils::{escape_rust_keyword, indent, split_qualified, to_pascal_case, to_snake_case},
};

/// Path of the generated Rust file, relative to the output directory.
pub const RUST_FILE: &str = "messages.rs";

const IMPORTS: &str = "#[allow(unused_imports)]\nuse msgwire::{read_array, read_vec, ByteBuffer, ByteBufferMut, WireError, WireMessage};";

/// Maps builtins to Rust types.
fn rust_type(builtin: Builtin) -> &'static str {
    match builtin {
        Builtin::Bool    => "bool",
        Builtin::Byte    => "u8",
        Builtin::Char    => "u8",
        Builtin::Int8    => "i8",
        Builtin::UInt8   => "u8",
        Builtin::Int16   => "i16",
        Builtin::UInt16  => "u16",
        Builtin::Int32   => "i32",
        Builtin::UInt32  => "u32",
        Builtin::Int64   => "i64",
        Builtin::UInt64  => "u64",
        Builtin::Float32 => "f32",
        Builtin::Float64 => "f64",
    }
}

/// Suffix of the `ByteBuffer::read_*` / `ByteBufferMut::write_*` pair for a builtin.
fn accessor(builtin: Builtin) -> &'static str {
    match builtin {
        Builtin::Bool => "bool",
        Builtin::Byte | Builtin::Char | Builtin::UInt8 => "byte",
        Builtin::Int8    => "i8",
        Builtin::Int16   => "i16",
        Builtin::UInt16  => "u16",
        Builtin::Int32   => "i32",
        Builtin::UInt32  => "u32",
        Builtin::Int64   => "i64",
        Builtin::UInt64  => "u64",
        Builtin::Float32 => "f32",
        Builtin::Float64 => "f64",
    }
}

fn zero(builtin: Builtin) -> &'static str {
    match builtin {
        Builtin::Bool => "false",
        Builtin::Float32 | Builtin::Float64 => "0.0",
        _ => "0",
    }
}

fn module_name(package: &str) -> String {
    escape_rust_keyword(&to_snake_case(package))
}

fn struct_name(qualified: &str) -> String {
    to_pascal_case(split_qualified(qualified).1)
}

fn field_name(name: &str) -> String {
    escape_rust_keyword(name)
}

/// Local binding used while decoding a field. The prefix keeps fields from
/// shadowing `bb` or the `read_vec`/`read_array` helpers.
fn local_name(name: &str) -> String {
    format!("f_{}", name)
}

/// Path to the struct of `target`, as seen from the module of `from_package`.
fn type_path(from_package: Option<&str>, target: &str) -> String {
    let (package, _) = split_qualified(target);
    let name = struct_name(target);
    match (from_package, package) {
        (from, to) if from == to => name,
        (None, Some(to)) => format!("{}::{}", module_name(to), name),
        (Some(_), Some(to)) => format!("super::{}::{}", module_name(to), name),
        (Some(_), None) => format!("super::{}", name),
        (None, None) => name,
    }
}

fn element_type(package: Option<&str>, element: &Element) -> String {
    match element {
        Element::Scalar(builtin) => rust_type(*builtin).to_string(),
        Element::Text => "String".to_string(),
        Element::Nested(target) => type_path(package, target),
    }
}

fn field_type(package: Option<&str>, op: &Op) -> String {
    match op {
        Op::Scalar { builtin, .. } => rust_type(*builtin).to_string(),
        Op::Text { .. } => "String".to_string(),
        Op::Nested { type_name, .. } => type_path(package, type_name),
        Op::Repeat { count: Count::Fixed(n), element, .. } => {
            format!("[{}; {}]", element_type(package, element), n)
        }
        Op::Repeat { count: Count::Prefixed, element, .. } => {
            format!("Vec<{}>", element_type(package, element))
        }
    }
}

fn default_value(op: &Op) -> String {
    match op {
        Op::Repeat { count: Count::Fixed(n), element: Element::Scalar(builtin), .. } => {
            format!("[{}; {}]", zero(*builtin), n)
        }
        Op::Repeat { count: Count::Fixed(_), .. } => "std::array::from_fn(|_| Default::default())".to_string(),
        _ => "Default::default()".to_string(),
    }
}

fn encode_element(element: &Element, item: &str) -> String {
    match element {
        Element::Scalar(builtin) => format!("bb.write_{}(*{})?;", accessor(*builtin), item),
        Element::Text => format!("bb.write_string({})?;", item),
        Element::Nested(_) => format!("{}.encode_bb(bb)?;", item),
    }
}

fn decode_element(package: Option<&str>, element: &Element) -> String {
    match element {
        Element::Scalar(builtin) => format!("|bb| bb.read_{}()", accessor(*builtin)),
        Element::Text => "|bb| bb.read_string()".to_string(),
        Element::Nested(target) => format!("|bb| {}::decode_bb(bb)", type_path(package, target)),
    }
}

fn min_element_size(package: Option<&str>, element: &Element) -> String {
    match element {
        Element::Scalar(builtin) => builtin.width().to_string(),
        Element::Text => PREFIX_BYTES.to_string(),
        Element::Nested(target) => format!("{}::MIN_SIZE", type_path(package, target)),
    }
}

fn encode_lines(op: &Op) -> Vec<String> {
    let this = format!("self.{}", field_name(op.field()));
    match op {
        Op::Scalar { builtin, .. } => vec![format!("bb.write_{}({})?;", accessor(*builtin), this)],
        Op::Text { .. } => vec![format!("bb.write_string(&{})?;", this)],
        Op::Nested { .. } => vec![format!("{}.encode_bb(bb)?;", this)],
        Op::Repeat { count, element, .. } => {
            let mut lines = Vec::new();
            match count {
                Count::Prefixed => lines.push(format!("bb.write_count({}.len())?;", this)),
                Count::Fixed(_) if op.upfront_bytes() > 0 => {
                    lines.push(format!("bb.ensure({})?;", op.upfront_bytes()))
                }
                Count::Fixed(_) => {}
            }
            lines.push(format!("for item in &{} {{", this));
            lines.push(format!("    {}", encode_element(element, "item")));
            lines.push("}".to_string());
            lines
        }
    }
}

fn decode_lines(package: Option<&str>, op: &Op) -> Vec<String> {
    let local = local_name(op.field());
    match op {
        Op::Scalar { builtin, .. } => vec![format!("let {} = bb.read_{}()?;", local, accessor(*builtin))],
        Op::Text { .. } => vec![format!("let {} = bb.read_string()?;", local)],
        Op::Nested { type_name, .. } => {
            vec![format!("let {} = {}::decode_bb(bb)?;", local, type_path(package, type_name))]
        }
        Op::Repeat { count: Count::Fixed(_), element, .. } => {
            let mut lines = Vec::new();
            if op.upfront_bytes() > 0 {
                lines.push(format!("bb.ensure({})?;", op.upfront_bytes()));
            }
            lines.push(format!(
                "let {} = read_array(bb, {})?;",
                local,
                decode_element(package, element)
            ));
            lines
        }
        Op::Repeat { count: Count::Prefixed, element, .. } => vec![format!(
            "let {} = read_vec(bb, {}, {})?;",
            local,
            min_element_size(package, element),
            decode_element(package, element)
        )],
    }
}

fn len_term(op: &Op) -> String {
    let this = format!("self.{}", field_name(op.field()));
    let element_sum = |element: &Element| match element {
        Element::Scalar(builtin) => format!("{}.len() * {}", this, builtin.width()),
        Element::Text => format!("{}.iter().map(|item| {} + item.len() + 1).sum::<usize>()", this, PREFIX_BYTES),
        Element::Nested(_) => format!("{}.iter().map(|item| item.encoded_len()).sum::<usize>()", this),
    };
    match op {
        Op::Scalar { builtin, .. } => builtin.width().to_string(),
        Op::Text { .. } => format!("{} + {}.len() + 1", PREFIX_BYTES, this),
        Op::Nested { .. } => format!("{}.encoded_len()", this),
        Op::Repeat { count: Count::Fixed(n), element: Element::Scalar(builtin), .. } => {
            (n * builtin.width()).to_string()
        }
        Op::Repeat { count: Count::Fixed(_), element, .. } => element_sum(element),
        Op::Repeat { count: Count::Prefixed, element, .. } => {
            format!("{} + {}", PREFIX_BYTES, element_sum(element))
        }
    }
}

/// Generates the struct, `Default` and `WireMessage` impls of one type.
fn generate_struct(plan: &CodecPlan, min_size: usize) -> Vec<String> {
    let qualified = plan.type_name();
    let (package, _) = split_qualified(qualified);
    let name = struct_name(qualified);
    let ops = &plan.encode.ops;
    let mut lines = Vec::new();

    lines.push(format!("/// `{}`", qualified));
    lines.push("#[derive(Debug, Clone, PartialEq)]".to_string());
    lines.push(format!("pub struct {} {{", name));
    for op in ops {
        lines.push(format!("    pub {}: {},", field_name(op.field()), field_type(package, op)));
    }
    lines.push("}".to_string());
    lines.push("".to_string());

    lines.push(format!("impl Default for {} {{", name));
    lines.push("    fn default() -> Self {".to_string());
    lines.push(format!("        {} {{", name));
    for op in ops {
        lines.push(format!("            {}: {},", field_name(op.field()), default_value(op)));
    }
    lines.push("        }".to_string());
    lines.push("    }".to_string());
    lines.push("}".to_string());
    lines.push("".to_string());

    let cursor = if ops.is_empty() { "_bb" } else { "bb" };
    lines.push(format!("impl WireMessage for {} {{", name));
    lines.push(format!("    const TYPE_NAME: &'static str = \"{}\";", qualified));
    lines.push(format!("    const MIN_SIZE: usize = {};", min_size));
    lines.push("".to_string());

    lines.push(format!("    fn encode_bb(&self, {}: &mut ByteBufferMut) -> Result<(), WireError> {{", cursor));
    for op in ops {
        lines.extend(indent(encode_lines(op), 2));
    }
    lines.push("        Ok(())".to_string());
    lines.push("    }".to_string());
    lines.push("".to_string());

    lines.push(format!("    fn decode_bb({}: &mut ByteBuffer) -> Result<Self, WireError> {{", cursor));
    for op in &plan.decode.ops {
        lines.extend(indent(decode_lines(package, op), 2));
    }
    lines.push(format!("        Ok({} {{", name));
    for op in &plan.decode.ops {
        lines.push(format!("            {}: {},", field_name(op.field()), local_name(op.field())));
    }
    lines.push("        })".to_string());
    lines.push("    }".to_string());
    lines.push("".to_string());

    lines.push("    fn encoded_len(&self) -> usize {".to_string());
    if ops.is_empty() {
        lines.push("        0".to_string());
    } else {
        for (i, op) in ops.iter().enumerate() {
            let prefix = if i == 0 { "        " } else { "            + " };
            lines.push(format!("{}{}", prefix, len_term(op)));
        }
    }
    lines.push("    }".to_string());
    lines.push("}".to_string());
    lines
}

/// Renders every plan of `plans` into one Rust source file: types without a
/// package at the top, then one module per package, each in dependency order.
pub fn compile_plans_to_rust(plans: &PlanSet) -> Result<String, MsgWireError> {
    let mut packages: Vec<Option<&str>> = Vec::new();
    for plan in plans.plans() {
        let (package, _) = split_qualified(plan.type_name());
        if !packages.contains(&package) {
            packages.push(package);
        }
    }
    // Bare names go first, outside any module.
    packages.sort_by_key(|package| package.is_some());

    let mut rust_code: Vec<String> = Vec::new();
    rust_code.push("// Generated by msgwire. Do not edit.".to_string());
    rust_code.push("".to_string());

    for package in packages {
        let depth = usize::from(package.is_some());
        if let Some(name) = package {
            rust_code.push(format!("pub mod {} {{", module_name(name)));
        }
        rust_code.extend(indent(IMPORTS.lines().map(String::from).collect(), depth));
        rust_code.push("".to_string());

        for plan in plans.plans() {
            if split_qualified(plan.type_name()).0 != package {
                continue;
            }
            let min_size = plans.min_size(plan.type_name())?;
            rust_code.extend(indent(generate_struct(plan, min_size), depth));
            rust_code.push("".to_string());
        }

        if package.is_some() {
            rust_code.pop();
            rust_code.push("}".to_string());
            rust_code.push("".to_string());
        }
    }

    Ok(rust_code.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{order::order, resolver::Resolver, source::MapSource};

    fn render(source: MapSource, roots: &[&str]) -> String {
        let mut resolver = Resolver::new(source);
        let types = order(&mut resolver, roots).unwrap();
        compile_plans_to_rust(&PlanSet::from_types(&types).unwrap()).unwrap()
    }

    #[test]
    fn type_paths() {
        assert_eq!(type_path(Some("geometry_msgs"), "geometry_msgs/msg/Point"), "Point");
        assert_eq!(type_path(Some("geometry_msgs"), "std_msgs/msg/Header"), "super::std_msgs::Header");
        assert_eq!(type_path(None, "std_msgs/msg/Header"), "std_msgs::Header");
        assert_eq!(type_path(Some("pkg"), "Point"), "super::Point");
        assert_eq!(type_path(None, "Point"), "Point");
    }

    #[test]
    fn renders_structs_and_codecs() {
        let code = render(
            MapSource::new()
                .define("std_msgs/msg/Header", &[("seq", "uint32"), ("frame_id", "string")])
                .define(
                    "sensor_msgs/msg/Range",
                    &[
                        ("header", "std_msgs/Header"),
                        ("covariance", "float64[36]"),
                        ("data", "uint8[]"),
                        ("type", "int8"),
                    ],
                ),
            &["sensor_msgs/msg/Range"],
        );

        assert!(code.contains("pub mod std_msgs {"));
        assert!(code.contains("pub mod sensor_msgs {"));
        assert!(code.contains("    pub struct Header {\n        pub seq: u32,\n        pub frame_id: String,\n    }"));
        assert!(code.contains("        pub header: super::std_msgs::Header,"));
        assert!(code.contains("        pub covariance: [f64; 36],"));
        assert!(code.contains("        pub data: Vec<u8>,"));
        assert!(code.contains("        pub type_: i8,"));
        assert!(code.contains("                covariance: [0.0; 36],"));
        assert!(code.contains("        const TYPE_NAME: &'static str = \"sensor_msgs/msg/Range\";"));
        assert!(code.contains("        const MIN_SIZE: usize = 301;"));
        assert!(code.contains("            bb.ensure(288)?;\n            for item in &self.covariance {\n                bb.write_f64(*item)?;\n            }"));
        assert!(code.contains("            bb.write_count(self.data.len())?;"));
        assert!(code.contains("            let f_data = read_vec(bb, 1, |bb| bb.read_byte())?;"));
        assert!(code.contains("            let f_header = super::std_msgs::Header::decode_bb(bb)?;"));
        assert!(code.contains("                type_: f_type,\n"));
        assert!(code.contains("self.header.encoded_len()\n                + 288\n                + 4 + self.data.len() * 1\n                + 1"));

        // Dependencies are rendered before the types using them.
        let header = code.find("pub struct Header").unwrap();
        let range = code.find("pub struct Range").unwrap();
        assert!(header < range);
    }

    #[test]
    fn renders_empty_and_bare_types() {
        let code = render(
            MapSource::new()
                .define("Empty", &[])
                .define("pkg/msg/Holder", &[("items", "Empty[2]"), ("names", "string[]")]),
            &["pkg/msg/Holder"],
        );
        assert!(code.starts_with("// Generated by msgwire. Do not edit.\n\n#[allow(unused_imports)]\nuse msgwire::"));
        assert!(code.contains("pub struct Empty {\n}"));
        assert!(code.contains("    fn encode_bb(&self, _bb: &mut ByteBufferMut) -> Result<(), WireError> {\n        Ok(())"));
        assert!(code.contains("        pub items: [super::Empty; 2],"));
        assert!(code.contains("                items: std::array::from_fn(|_| Default::default()),"));
        assert!(code.contains("            let f_items = read_array(bb, |bb| super::Empty::decode_bb(bb))?;"));
        assert!(code.contains("            let f_names = read_vec(bb, 4, |bb| bb.read_string())?;"));
        assert!(code.trim_end().ends_with('}'));
    }
    #[test]
    fn field_names_do_not_shadow_decode_helpers() {
        let code = render(
            MapSource::new().define(
                "pkg/msg/Odd",
                &[("bb", "uint8"), ("read_vec", "uint16[]"), ("read_array", "int32[2]"), ("self", "string")],
            ),
            &["pkg/msg/Odd"],
        );
        assert!(code.contains("            let f_bb = bb.read_byte()?;"));
        assert!(code.contains("            let f_read_vec = read_vec(bb, 2, |bb| bb.read_u16())?;"));
        assert!(code.contains("            let f_read_array = read_array(bb, |bb| bb.read_i32())?;"));
        assert!(code.contains("            let f_self = bb.read_string()?;"));
        assert!(code.contains(
            "            Ok(Odd {\n                bb: f_bb,\n                read_vec: f_read_vec,\n                read_array: f_read_array,\n                self_: f_self,\n            })"
        ));
    }
}
