//! C renderer: a shared primitive header, one header of record structs, and a
//! serializer/deserializer header pair per root type.
//!
//! Every generated entry point returns a `msgwire_status`; byte counts go
//! through out-parameters.

use msgwire_schema::Builtin;

use crate::{
    error::MsgWireError,
    plan::{Count, Element, Op, PREFIX_BYTES},
    runtime::PlanSet,
    utils::{c_type_name, escape_c_keyword, indent, split_qualified},
};

pub const UTILS_HEADER: &str = "common/serialize_utils.h";
pub const TYPES_HEADER: &str = "common/msgwire_types.h";
pub const INTEGRATION_HEADER: &str = "dynamic_serializer_integration.h";

const SERIALIZE_UTILS: &str = r#"// Generated by msgwire. Do not edit.
#ifndef MSGWIRE_SERIALIZE_UTILS_H_
#define MSGWIRE_SERIALIZE_UTILS_H_

#include <stddef.h>
#include <stdint.h>
#include <string.h>

typedef enum msgwire_status {
    MSGWIRE_OK = 0,
    MSGWIRE_BUFFER_TOO_SMALL = 1,
    MSGWIRE_ALLOCATION_FAILURE = 2,
    MSGWIRE_LENGTH_OVERFLOW = 3,
    MSGWIRE_INVALID_ARGUMENT = 4,
    MSGWIRE_MISSING_TERMINATOR = 5
} msgwire_status;

#define MSGWIRE_TRY(expr)                               \
    do {                                                \
        msgwire_status msgwire_try_status_ = (expr);    \
        if (msgwire_try_status_ != MSGWIRE_OK) {        \
            return msgwire_try_status_;                 \
        }                                               \
    } while (0)

/* Nonzero when `needed` more bytes fit after `offset` in `capacity`. */
static inline int msgwire_fits(size_t offset, size_t needed, size_t capacity)
{
    return offset <= capacity && needed <= capacity - offset;
}

static inline void msgwire_write_be(uint8_t* dst, size_t width, uint64_t value)
{
    size_t i;
    for (i = 0; i < width; ++i) {
        dst[i] = (uint8_t)(value >> (8 * (width - 1 - i)));
    }
}

static inline uint64_t msgwire_read_be(const uint8_t* src, size_t width)
{
    uint64_t value = 0;
    size_t i;
    for (i = 0; i < width; ++i) {
        value = (value << 8) | src[i];
    }
    return value;
}

static inline void msgwire_write_u8(uint8_t* dst, uint8_t value) { dst[0] = value; }
static inline void msgwire_write_u16(uint8_t* dst, uint16_t value) { msgwire_write_be(dst, 2, value); }
static inline void msgwire_write_u32(uint8_t* dst, uint32_t value) { msgwire_write_be(dst, 4, value); }
static inline void msgwire_write_u64(uint8_t* dst, uint64_t value) { msgwire_write_be(dst, 8, value); }

static inline uint8_t msgwire_read_u8(const uint8_t* src) { return src[0]; }
static inline uint16_t msgwire_read_u16(const uint8_t* src) { return (uint16_t)msgwire_read_be(src, 2); }
static inline uint32_t msgwire_read_u32(const uint8_t* src) { return (uint32_t)msgwire_read_be(src, 4); }
static inline uint64_t msgwire_read_u64(const uint8_t* src) { return msgwire_read_be(src, 8); }

static inline void msgwire_copy_bytes(uint8_t* dst, const uint8_t* src, size_t len)
{
    if (len > 0) {
        memcpy(dst, src, len);
    }
}

static inline uint32_t msgwire_f32_bits(float value)
{
    uint32_t bits;
    memcpy(&bits, &value, sizeof bits);
    return bits;
}

static inline float msgwire_bits_f32(uint32_t bits)
{
    float value;
    memcpy(&value, &bits, sizeof value);
    return value;
}

static inline uint64_t msgwire_f64_bits(double value)
{
    uint64_t bits;
    memcpy(&bits, &value, sizeof bits);
    return bits;
}

static inline double msgwire_bits_f64(uint64_t bits)
{
    double value;
    memcpy(&value, &bits, sizeof value);
    return value;
}

#endif  // MSGWIRE_SERIALIZE_UTILS_H_
"#;

const STRING_SUPPORT: &str = r#"/* Text payload without its terminator; `data` holds size + 1 bytes. */
typedef struct msgwire_string {
    char* data;
    size_t size;
    size_t capacity;
} msgwire_string;

#define MSGWIRE_SEQUENCE(NAME, T) \
    typedef struct NAME {         \
        T* data;                  \
        size_t size;              \
        size_t capacity;          \
    } NAME

/* Copies a wire payload of `len_with_null` bytes, terminator included. */
static inline msgwire_status msgwire_string_assign(msgwire_string* str, const uint8_t* src, size_t len_with_null)
{
    size_t size = len_with_null > 0 ? len_with_null - 1 : 0;
    if (len_with_null > 0 && src[size] != 0) {
        return MSGWIRE_MISSING_TERMINATOR;
    }
    str->data = (char*)malloc(size + 1);
    if (str->data == NULL) {
        return MSGWIRE_ALLOCATION_FAILURE;
    }
    msgwire_copy_bytes((uint8_t*)str->data, src, size);
    str->data[size] = '\0';
    str->size = size;
    str->capacity = size + 1;
    return MSGWIRE_OK;
}

static inline void msgwire_string_fini(msgwire_string* str)
{
    free(str->data);
    str->data = NULL;
    str->size = 0;
    str->capacity = 0;
}"#;

const ALL_BUILTINS: [Builtin; 13] = [
    Builtin::Bool,
    Builtin::Byte,
    Builtin::Char,
    Builtin::Int8,
    Builtin::UInt8,
    Builtin::Int16,
    Builtin::UInt16,
    Builtin::Int32,
    Builtin::UInt32,
    Builtin::Int64,
    Builtin::UInt64,
    Builtin::Float32,
    Builtin::Float64,
];

fn c_type(builtin: Builtin) -> &'static str {
    match builtin {
        Builtin::Bool    => "bool",
        Builtin::Byte    => "uint8_t",
        Builtin::Char    => "char",
        Builtin::Int8    => "int8_t",
        Builtin::UInt8   => "uint8_t",
        Builtin::Int16   => "int16_t",
        Builtin::UInt16  => "uint16_t",
        Builtin::Int32   => "int32_t",
        Builtin::UInt32  => "uint32_t",
        Builtin::Int64   => "int64_t",
        Builtin::UInt64  => "uint64_t",
        Builtin::Float32 => "float",
        Builtin::Float64 => "double",
    }
}

/// Unsigned carrier of the wire image of `value`.
fn to_bits(builtin: Builtin, value: &str) -> String {
    match builtin {
        Builtin::Bool => format!("(uint8_t)({} ? 1 : 0)", value),
        Builtin::Byte | Builtin::Char | Builtin::Int8 | Builtin::UInt8 => format!("(uint8_t)({})", value),
        Builtin::Int16 | Builtin::UInt16 => format!("(uint16_t)({})", value),
        Builtin::Int32 | Builtin::UInt32 => format!("(uint32_t)({})", value),
        Builtin::Int64 | Builtin::UInt64 => format!("(uint64_t)({})", value),
        Builtin::Float32 => format!("msgwire_f32_bits({})", value),
        Builtin::Float64 => format!("msgwire_f64_bits({})", value),
    }
}

fn from_bits(builtin: Builtin, bits: &str) -> String {
    match builtin {
        Builtin::Bool => format!("{} != 0", bits),
        Builtin::Byte | Builtin::UInt8 | Builtin::UInt16 | Builtin::UInt32 | Builtin::UInt64 => bits.to_string(),
        Builtin::Char => format!("(char){}", bits),
        Builtin::Int8 => format!("(int8_t){}", bits),
        Builtin::Int16 => format!("(int16_t){}", bits),
        Builtin::Int32 => format!("(int32_t){}", bits),
        Builtin::Int64 => format!("(int64_t){}", bits),
        Builtin::Float32 => format!("msgwire_bits_f32({})", bits),
        Builtin::Float64 => format!("msgwire_bits_f64({})", bits),
    }
}

fn builtin_sequence(builtin: Builtin) -> String {
    format!("msgwire_{}_sequence", builtin.name())
}

fn element_c_type(element: &Element) -> String {
    match element {
        Element::Scalar(builtin) => c_type(*builtin).to_string(),
        Element::Text => "msgwire_string".to_string(),
        Element::Nested(type_name) => c_type_name(type_name),
    }
}

fn sequence_type(element: &Element) -> String {
    match element {
        Element::Scalar(builtin) => builtin_sequence(*builtin),
        Element::Text => "msgwire_string_sequence".to_string(),
        Element::Nested(type_name) => format!("{}__Sequence", c_type_name(type_name)),
    }
}

fn member(op: &Op) -> String {
    let name = escape_c_keyword(op.field());
    match op {
        Op::Scalar { builtin, .. } => format!("{} {};", c_type(*builtin), name),
        Op::Text { .. } => format!("msgwire_string {};", name),
        Op::Nested { type_name, .. } => format!("{} {};", c_type_name(type_name), name),
        Op::Repeat { count: Count::Fixed(n), element, .. } => format!("{} {}[{}];", element_c_type(element), name, n),
        Op::Repeat { count: Count::Prefixed, element, .. } => format!("{} {};", sequence_type(element), name),
    }
}

/// Directory of a root's headers: `pkg/msg/Name` → `pkg/Name`.
pub fn header_dir(root: &str) -> String {
    match split_qualified(root) {
        (Some(package), name) => format!("{}/{}", package, name),
        (None, name) => name.to_string(),
    }
}

fn include_guard(path: &str) -> String {
    let mangled: String = path
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    format!("MSGWIRE_{}_", mangled)
}

/// The shared primitive header.
pub fn compile_serialize_utils() -> String {
    SERIALIZE_UTILS.to_string()
}

/// One struct per plan, in plan order, each followed by its sequence type.
pub fn compile_types_header(plans: &PlanSet) -> String {
    let guard = include_guard(TYPES_HEADER);
    let mut c_code: Vec<String> = Vec::new();
    c_code.push("// Generated by msgwire. Do not edit.".to_string());
    c_code.push(format!("#ifndef {}", guard));
    c_code.push(format!("#define {}", guard));
    c_code.push("".to_string());
    for header in ["stdbool.h", "stddef.h", "stdint.h", "stdlib.h", "string.h"] {
        c_code.push(format!("#include <{}>", header));
    }
    c_code.push("".to_string());
    c_code.push(format!("#include \"{}\"", UTILS_HEADER));
    c_code.push("".to_string());
    c_code.extend(STRING_SUPPORT.lines().map(String::from));
    c_code.push("".to_string());

    for builtin in ALL_BUILTINS {
        c_code.push(format!("MSGWIRE_SEQUENCE({}, {});", builtin_sequence(builtin), c_type(builtin)));
    }
    c_code.push("MSGWIRE_SEQUENCE(msgwire_string_sequence, msgwire_string);".to_string());
    c_code.push("".to_string());

    for plan in plans.plans() {
        let name = c_type_name(plan.type_name());
        c_code.push(format!("/* {} */", plan.type_name()));
        c_code.push(format!("typedef struct {} {{", name));
        if plan.encode.ops.is_empty() {
            c_code.push("    uint8_t _unused;".to_string());
        }
        for op in &plan.encode.ops {
            c_code.push(format!("    {}", member(op)));
        }
        c_code.push(format!("}} {};", name));
        c_code.push(format!("MSGWIRE_SEQUENCE({}__Sequence, {});", name, name));
        c_code.push("".to_string());
    }

    c_code.push(format!("#endif  // {}", guard));
    c_code.push("".to_string());
    c_code.join("\n")
}

/// Renders the codecs of the types one root reaches. `prefix` namespaces every
/// helper so several roots can share a translation unit.
struct CodecWriter<'a> {
    plans:  &'a PlanSet,
    prefix: String,
}

impl<'a> CodecWriter<'a> {
    fn new(plans: &'a PlanSet, root: &str) -> CodecWriter<'a> {
        CodecWriter { plans, prefix: c_type_name(root) }
    }

    fn encode_fn(&self, type_name: &str) -> String {
        format!("{}__encode_{}", self.prefix, c_type_name(type_name))
    }

    fn decode_fn(&self, type_name: &str) -> String {
        format!("{}__decode_{}", self.prefix, c_type_name(type_name))
    }

    fn fini_fn(&self, type_name: &str) -> String {
        format!("{}__fini_{}", self.prefix, c_type_name(type_name))
    }

    fn encode_element(&self, element: &Element, value: &str) -> Vec<String> {
        match element {
            Element::Scalar(builtin) => {
                let width = builtin.width();
                vec![
                    format!("if (!msgwire_fits(*offset, {}, capacity)) {{", width),
                    "    return MSGWIRE_BUFFER_TOO_SMALL;".to_string(),
                    "}".to_string(),
                    format!("msgwire_write_u{}(buffer + *offset, {});", width * 8, to_bits(*builtin, value)),
                    format!("*offset += {};", width),
                ]
            }
            Element::Text => vec![
                format!("if ({}.size >= UINT32_MAX) {{", value),
                "    return MSGWIRE_LENGTH_OVERFLOW;".to_string(),
                "}".to_string(),
                format!("if (!msgwire_fits(*offset, {} + {}.size + 1, capacity)) {{", PREFIX_BYTES, value),
                "    return MSGWIRE_BUFFER_TOO_SMALL;".to_string(),
                "}".to_string(),
                format!("msgwire_write_u32(buffer + *offset, (uint32_t)({}.size + 1));", value),
                format!("*offset += {};", PREFIX_BYTES),
                format!("msgwire_copy_bytes(buffer + *offset, (const uint8_t*){}.data, {}.size);", value, value),
                format!("buffer[*offset + {}.size] = 0;", value),
                format!("*offset += {}.size + 1;", value),
            ],
            Element::Nested(type_name) => vec![format!(
                "MSGWIRE_TRY({}(&{}, buffer, capacity, offset));",
                self.encode_fn(type_name),
                value
            )],
        }
    }

    fn encode_op(&self, op: &Op) -> Vec<String> {
        let field = format!("msg->{}", escape_c_keyword(op.field()));
        match op {
            Op::Scalar { builtin, .. } => self.encode_element(&Element::Scalar(*builtin), &field),
            Op::Text { .. } => self.encode_element(&Element::Text, &field),
            Op::Nested { type_name, .. } => self.encode_element(&Element::Nested(type_name.clone()), &field),
            Op::Repeat { count: Count::Fixed(n), element, .. } => {
                let mut lines = Vec::new();
                if let Element::Scalar(builtin) = element {
                    lines.push(format!("if (!msgwire_fits(*offset, {}, capacity)) {{", n.saturating_mul(builtin.width())));
                    lines.push("    return MSGWIRE_BUFFER_TOO_SMALL;".to_string());
                    lines.push("}".to_string());
                }
                lines.push(format!("for (size_t i = 0; i < {}; ++i) {{", n));
                lines.extend(indent(self.encode_element(element, &format!("{}[i]", field)), 1));
                lines.push("}".to_string());
                lines
            }
            Op::Repeat { count: Count::Prefixed, element, .. } => {
                let mut lines = vec![
                    format!("if ({}.size > UINT32_MAX) {{", field),
                    "    return MSGWIRE_LENGTH_OVERFLOW;".to_string(),
                    "}".to_string(),
                    format!("if (!msgwire_fits(*offset, {}, capacity)) {{", PREFIX_BYTES),
                    "    return MSGWIRE_BUFFER_TOO_SMALL;".to_string(),
                    "}".to_string(),
                    format!("msgwire_write_u32(buffer + *offset, (uint32_t){}.size);", field),
                    format!("*offset += {};", PREFIX_BYTES),
                    format!("for (size_t i = 0; i < {}.size; ++i) {{", field),
                ];
                lines.extend(indent(self.encode_element(element, &format!("{}.data[i]", field)), 1));
                lines.push("}".to_string());
                lines
            }
        }
    }

    fn decode_element(&self, element: &Element, target: &str) -> Vec<String> {
        match element {
            Element::Scalar(builtin) => {
                let width = builtin.width();
                let bits = format!("msgwire_read_u{}(buffer + *offset)", width * 8);
                vec![
                    format!("if (!msgwire_fits(*offset, {}, length)) {{", width),
                    "    return MSGWIRE_BUFFER_TOO_SMALL;".to_string(),
                    "}".to_string(),
                    format!("{} = {};", target, from_bits(*builtin, &bits)),
                    format!("*offset += {};", width),
                ]
            }
            Element::Text => vec![
                "{".to_string(),
                "    size_t len_with_null;".to_string(),
                format!("    if (!msgwire_fits(*offset, {}, length)) {{", PREFIX_BYTES),
                "        return MSGWIRE_BUFFER_TOO_SMALL;".to_string(),
                "    }".to_string(),
                "    len_with_null = (size_t)msgwire_read_u32(buffer + *offset);".to_string(),
                format!("    *offset += {};", PREFIX_BYTES),
                "    if (!msgwire_fits(*offset, len_with_null, length)) {".to_string(),
                "        return MSGWIRE_BUFFER_TOO_SMALL;".to_string(),
                "    }".to_string(),
                format!("    MSGWIRE_TRY(msgwire_string_assign(&{}, buffer + *offset, len_with_null));", target),
                "    *offset += len_with_null;".to_string(),
                "}".to_string(),
            ],
            Element::Nested(type_name) => vec![format!(
                "MSGWIRE_TRY({}(buffer, length, &{}, offset));",
                self.decode_fn(type_name),
                target
            )],
        }
    }

    fn min_element_size(&self, element: &Element) -> Result<usize, MsgWireError> {
        Ok(match element {
            Element::Scalar(builtin) => builtin.width(),
            Element::Text => PREFIX_BYTES,
            Element::Nested(type_name) => self.plans.min_size(type_name)?,
        })
    }

    fn decode_op(&self, op: &Op) -> Result<Vec<String>, MsgWireError> {
        let field = format!("msg->{}", escape_c_keyword(op.field()));
        Ok(match op {
            Op::Scalar { builtin, .. } => self.decode_element(&Element::Scalar(*builtin), &field),
            Op::Text { .. } => self.decode_element(&Element::Text, &field),
            Op::Nested { type_name, .. } => self.decode_element(&Element::Nested(type_name.clone()), &field),
            Op::Repeat { count: Count::Fixed(n), element, .. } => {
                let mut lines = Vec::new();
                if let Element::Scalar(builtin) = element {
                    lines.push(format!("if (!msgwire_fits(*offset, {}, length)) {{", n.saturating_mul(builtin.width())));
                    lines.push("    return MSGWIRE_BUFFER_TOO_SMALL;".to_string());
                    lines.push("}".to_string());
                }
                lines.push(format!("for (size_t i = 0; i < {}; ++i) {{", n));
                lines.extend(indent(self.decode_element(element, &format!("{}[i]", field)), 1));
                lines.push("}".to_string());
                lines
            }
            Op::Repeat { count: Count::Prefixed, element, .. } => {
                let min_size = self.min_element_size(element)?;
                let item_type = element_c_type(element);
                let mut lines = vec![
                    "{".to_string(),
                    "    size_t count;".to_string(),
                    format!("    if (!msgwire_fits(*offset, {}, length)) {{", PREFIX_BYTES),
                    "        return MSGWIRE_BUFFER_TOO_SMALL;".to_string(),
                    "    }".to_string(),
                    "    count = (size_t)msgwire_read_u32(buffer + *offset);".to_string(),
                    format!("    *offset += {};", PREFIX_BYTES),
                ];
                lines.push(format!("    if (count > (length - *offset) / {}) {{", min_size.max(1)));
                lines.push("        return MSGWIRE_BUFFER_TOO_SMALL;".to_string());
                lines.push("    }".to_string());
                lines.push("    if (count > 0) {".to_string());
                lines.push(format!("        {}.data = ({}*)calloc(count, sizeof({}));", field, item_type, item_type));
                lines.push(format!("        if ({}.data == NULL) {{", field));
                lines.push("            return MSGWIRE_ALLOCATION_FAILURE;".to_string());
                lines.push("        }".to_string());
                lines.push(format!("        {}.size = count;", field));
                lines.push(format!("        {}.capacity = count;", field));
                lines.push("    }".to_string());
                lines.push("    for (size_t i = 0; i < count; ++i) {".to_string());
                lines.extend(indent(self.decode_element(element, &format!("{}.data[i]", field)), 2));
                lines.push("    }".to_string());
                lines.push("}".to_string());
                lines
            }
        })
    }

    fn fini_element(&self, element: &Element, target: &str) -> Option<String> {
        match element {
            Element::Scalar(_) => None,
            Element::Text => Some(format!("msgwire_string_fini(&{});", target)),
            Element::Nested(type_name) => Some(format!("{}(&{});", self.fini_fn(type_name), target)),
        }
    }

    fn fini_op(&self, op: &Op) -> Vec<String> {
        let field = format!("msg->{}", escape_c_keyword(op.field()));
        match op {
            Op::Scalar { .. } => Vec::new(),
            Op::Text { .. } => self.fini_element(&Element::Text, &field).into_iter().collect(),
            Op::Nested { type_name, .. } => self
                .fini_element(&Element::Nested(type_name.clone()), &field)
                .into_iter()
                .collect(),
            Op::Repeat { count: Count::Fixed(n), element, .. } => {
                match self.fini_element(element, &format!("{}[i]", field)) {
                    Some(release) => vec![
                        format!("for (size_t i = 0; i < {}; ++i) {{", n),
                        format!("    {}", release),
                        "}".to_string(),
                    ],
                    None => Vec::new(),
                }
            }
            Op::Repeat { count: Count::Prefixed, element, .. } => {
                let mut lines = Vec::new();
                if let Some(release) = self.fini_element(element, &format!("{}.data[i]", field)) {
                    lines.push(format!("for (size_t i = 0; i < {}.size; ++i) {{", field));
                    lines.push(format!("    {}", release));
                    lines.push("}".to_string());
                }
                lines.push(format!("free({}.data);", field));
                lines.push(format!("{}.data = NULL;", field));
                lines.push(format!("{}.size = 0;", field));
                lines.push(format!("{}.capacity = 0;", field));
                lines
            }
        }
    }

    fn encode_function(&self, type_name: &str, ops: &[Op]) -> Vec<String> {
        let mut lines = vec![
            format!("/* {} */", type_name),
            format!(
                "static inline msgwire_status {}(const {}* msg, uint8_t* buffer, size_t capacity, size_t* offset)",
                self.encode_fn(type_name),
                c_type_name(type_name)
            ),
            "{".to_string(),
        ];
        if ops.is_empty() {
            lines.push("    (void)msg;".to_string());
            lines.push("    (void)buffer;".to_string());
            lines.push("    (void)capacity;".to_string());
            lines.push("    (void)offset;".to_string());
        }
        for op in ops {
            lines.extend(indent(self.encode_op(op), 1));
        }
        lines.push("    return MSGWIRE_OK;".to_string());
        lines.push("}".to_string());
        lines
    }

    fn decode_function(&self, type_name: &str, ops: &[Op]) -> Result<Vec<String>, MsgWireError> {
        let mut lines = vec![
            format!("/* {} */", type_name),
            format!(
                "static inline msgwire_status {}(const uint8_t* buffer, size_t length, {}* msg, size_t* offset)",
                self.decode_fn(type_name),
                c_type_name(type_name)
            ),
            "{".to_string(),
        ];
        if ops.is_empty() {
            lines.push("    (void)buffer;".to_string());
            lines.push("    (void)length;".to_string());
            lines.push("    (void)msg;".to_string());
            lines.push("    (void)offset;".to_string());
        }
        for op in ops {
            lines.extend(indent(self.decode_op(op)?, 1));
        }
        lines.push("    return MSGWIRE_OK;".to_string());
        lines.push("}".to_string());
        Ok(lines)
    }

    fn fini_function(&self, type_name: &str, ops: &[Op]) -> Vec<String> {
        let mut body: Vec<String> = ops.iter().flat_map(|op| self.fini_op(op)).collect();
        if body.is_empty() {
            body.push("(void)msg;".to_string());
        }
        let mut lines = vec![
            format!("static inline void {}({}* msg)", self.fini_fn(type_name), c_type_name(type_name)),
            "{".to_string(),
        ];
        lines.extend(indent(body, 1));
        lines.push("}".to_string());
        lines
    }
}

fn header_preamble(guard: &str) -> Vec<String> {
    let mut c_code = vec![
        "// Generated by msgwire. Do not edit.".to_string(),
        format!("#ifndef {}", guard),
        format!("#define {}", guard),
        "".to_string(),
    ];
    for header in ["stddef.h", "stdint.h", "stdlib.h", "string.h"] {
        c_code.push(format!("#include <{}>", header));
    }
    c_code.push("".to_string());
    c_code.push(format!("#include \"{}\"", UTILS_HEADER));
    c_code.push(format!("#include \"{}\"", TYPES_HEADER));
    c_code.push("".to_string());
    c_code
}

/// The encoder header of `root`. `closure` lists the types `root` reaches in
/// dependency order, ending with `root` itself.
pub fn compile_serializer<N: AsRef<str>>(plans: &PlanSet, root: &str, closure: &[N]) -> Result<String, MsgWireError> {
    let root_plan = plans.plan(root)?;
    let root_name = root_plan.type_name();
    let path = format!("{}/serialize.h", header_dir(root_name));
    let guard = include_guard(&path);
    let writer = CodecWriter::new(plans, root_name);

    let mut c_code = header_preamble(&guard);
    for type_name in closure {
        let plan = plans.plan(type_name.as_ref())?;
        c_code.extend(writer.encode_function(plan.type_name(), &plan.encode.ops));
        c_code.push("".to_string());
    }

    c_code.push("/* Writes *msg at the start of buffer and stores the byte count in *written.".to_string());
    c_code.push(" * On failure the buffer content is unspecified. */".to_string());
    c_code.push(format!(
        "static inline msgwire_status {}__encode(const {}* msg, uint8_t* buffer, size_t capacity, size_t* written)",
        writer.prefix, writer.prefix
    ));
    c_code.push("{".to_string());
    c_code.push("    size_t offset = 0;".to_string());
    c_code.push("    if (msg == NULL || written == NULL || (buffer == NULL && capacity > 0)) {".to_string());
    c_code.push("        return MSGWIRE_INVALID_ARGUMENT;".to_string());
    c_code.push("    }".to_string());
    c_code.push(format!("    MSGWIRE_TRY({}(msg, buffer, capacity, &offset));", writer.encode_fn(root_name)));
    c_code.push("    *written = offset;".to_string());
    c_code.push("    return MSGWIRE_OK;".to_string());
    c_code.push("}".to_string());
    c_code.push("".to_string());
    c_code.push(format!("#endif  // {}", guard));
    c_code.push("".to_string());
    Ok(c_code.join("\n"))
}

/// The decoder header of `root`, with release functions for every
/// allocation a decode makes.
pub fn compile_deserializer<N: AsRef<str>>(plans: &PlanSet, root: &str, closure: &[N]) -> Result<String, MsgWireError> {
    let root_plan = plans.plan(root)?;
    let root_name = root_plan.type_name();
    let path = format!("{}/deserialize.h", header_dir(root_name));
    let guard = include_guard(&path);
    let writer = CodecWriter::new(plans, root_name);

    let mut c_code = header_preamble(&guard);
    for type_name in closure {
        let plan = plans.plan(type_name.as_ref())?;
        c_code.extend(writer.fini_function(plan.type_name(), &plan.decode.ops));
        c_code.push("".to_string());
        c_code.extend(writer.decode_function(plan.type_name(), &plan.decode.ops)?);
        c_code.push("".to_string());
    }

    let prefix = &writer.prefix;
    c_code.push("/* Reads one record from the start of buffer into *out and stores the bytes".to_string());
    c_code.push(format!(" * consumed in *consumed. Release the record with {}__fini.", prefix));
    c_code.push(" * On failure *out holds no allocations. */".to_string());
    c_code.push(format!(
        "static inline msgwire_status {}__decode(const uint8_t* buffer, size_t length, {}* out, size_t* consumed)",
        prefix, prefix
    ));
    c_code.push("{".to_string());
    c_code.push("    size_t offset = 0;".to_string());
    c_code.push("    msgwire_status status;".to_string());
    c_code.push("    if (out == NULL || consumed == NULL || (buffer == NULL && length > 0)) {".to_string());
    c_code.push("        return MSGWIRE_INVALID_ARGUMENT;".to_string());
    c_code.push("    }".to_string());
    c_code.push("    memset(out, 0, sizeof(*out));".to_string());
    c_code.push(format!("    status = {}(buffer, length, out, &offset);", writer.decode_fn(root_name)));
    c_code.push("    if (status != MSGWIRE_OK) {".to_string());
    c_code.push(format!("        {}(out);", writer.fini_fn(root_name)));
    c_code.push("        return status;".to_string());
    c_code.push("    }".to_string());
    c_code.push("    *consumed = offset;".to_string());
    c_code.push("    return MSGWIRE_OK;".to_string());
    c_code.push("}".to_string());
    c_code.push("".to_string());
    c_code.push(format!("static inline void {}__fini({}* msg)", prefix, prefix));
    c_code.push("{".to_string());
    c_code.push("    if (msg != NULL) {".to_string());
    c_code.push(format!("        {}(msg);", writer.fini_fn(root_name)));
    c_code.push("    }".to_string());
    c_code.push("}".to_string());
    c_code.push("".to_string());
    c_code.push(format!("#endif  // {}", guard));
    c_code.push("".to_string());
    Ok(c_code.join("\n"))
}

/// Includes the shared headers and the header pair of every root.
pub fn compile_integration_header<N: AsRef<str>>(roots: &[N]) -> String {
    let guard = include_guard(INTEGRATION_HEADER);
    let mut c_code = vec![
        "// Generated by msgwire. Do not edit.".to_string(),
        format!("#ifndef {}", guard),
        format!("#define {}", guard),
        "".to_string(),
        format!("#include \"{}\"", UTILS_HEADER),
        format!("#include \"{}\"", TYPES_HEADER),
        "".to_string(),
    ];
    for root in roots {
        let dir = header_dir(root.as_ref());
        c_code.push(format!("#include \"{}/serialize.h\"", dir));
        c_code.push(format!("#include \"{}/deserialize.h\"", dir));
    }
    c_code.push("".to_string());
    c_code.push(format!("#endif  // {}", guard));
    c_code.push("".to_string());
    c_code.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{order::order, resolver::Resolver, source::MapSource};

    fn scan_plans() -> (PlanSet, Vec<String>) {
        let mut resolver = Resolver::new(
            MapSource::new()
                .define("std_msgs/msg/Header", &[("seq", "uint32"), ("frame_id", "string")])
                .define(
                    "sensor_msgs/msg/Scan",
                    &[
                        ("header", "std_msgs/Header"),
                        ("ranges", "float32[]"),
                        ("covariance", "float64[9]"),
                        ("labels", "string[]"),
                        ("default", "int8"),
                    ],
                ),
        );
        let types = order(&mut resolver, &["sensor_msgs/msg/Scan"]).unwrap();
        let closure = types.iter().map(|t| t.qualified_name.clone()).collect();
        (PlanSet::from_types(&types).unwrap(), closure)
    }

    #[test]
    fn header_paths() {
        assert_eq!(header_dir("geometry_msgs/msg/Twist"), "geometry_msgs/Twist");
        assert_eq!(header_dir("Point"), "Point");
        assert_eq!(include_guard("geometry_msgs/Twist/serialize.h"), "MSGWIRE_GEOMETRY_MSGS_TWIST_SERIALIZE_H_");
    }

    #[test]
    fn renders_record_structs() {
        let (plans, _) = scan_plans();
        let code = compile_types_header(&plans);
        assert!(code.contains("MSGWIRE_SEQUENCE(msgwire_float32_sequence, float);"));
        assert!(code.contains("typedef struct std_msgs__msg__Header {\n    uint32_t seq;\n    msgwire_string frame_id;\n} std_msgs__msg__Header;"));
        assert!(code.contains("    std_msgs__msg__Header header;"));
        assert!(code.contains("    msgwire_float32_sequence ranges;"));
        assert!(code.contains("    double covariance[9];"));
        assert!(code.contains("    msgwire_string_sequence labels;"));
        assert!(code.contains("    int8_t default_;"));
        assert!(code.contains("    if (len_with_null > 0 && src[size] != 0) {\n        return MSGWIRE_MISSING_TERMINATOR;\n    }"));
        assert!(code.find("} std_msgs__msg__Header;").unwrap() < code.find("} sensor_msgs__msg__Scan;").unwrap());
    }

    #[test]
    fn renders_encoder() {
        let (plans, closure) = scan_plans();
        let code = compile_serializer(&plans, "sensor_msgs/Scan", &closure).unwrap();
        assert!(code.contains("#ifndef MSGWIRE_SENSOR_MSGS_SCAN_SERIALIZE_H_"));
        assert!(code.contains(
            "static inline msgwire_status sensor_msgs__msg__Scan__encode_std_msgs__msg__Header(const std_msgs__msg__Header* msg, uint8_t* buffer, size_t capacity, size_t* offset)"
        ));
        assert!(code.contains("    msgwire_write_u32(buffer + *offset, (uint32_t)(msg->seq));"));
        assert!(code.contains("    if (!msgwire_fits(*offset, 4 + msg->frame_id.size + 1, capacity)) {"));
        assert!(code.contains("    MSGWIRE_TRY(sensor_msgs__msg__Scan__encode_std_msgs__msg__Header(&msg->header, buffer, capacity, offset));"));
        assert!(code.contains("    if (!msgwire_fits(*offset, 72, capacity)) {"));
        assert!(code.contains("        msgwire_write_u64(buffer + *offset, msgwire_f64_bits(msg->covariance[i]));"));
        assert!(code.contains("        msgwire_write_u32(buffer + *offset, msgwire_f32_bits(msg->ranges.data[i]));"));
        assert!(code.contains("    msgwire_write_u8(buffer + *offset, (uint8_t)(msg->default_));"));
        assert!(code.contains(
            "static inline msgwire_status sensor_msgs__msg__Scan__encode(const sensor_msgs__msg__Scan* msg, uint8_t* buffer, size_t capacity, size_t* written)"
        ));
    }

    #[test]
    fn renders_decoder() {
        let (plans, closure) = scan_plans();
        let code = compile_deserializer(&plans, "sensor_msgs/msg/Scan", &closure).unwrap();
        assert!(code.contains("        if (count > (length - *offset) / 4) {"));
        assert!(code.contains("            msg->ranges.data = (float*)calloc(count, sizeof(float));"));
        assert!(code.contains("            msg->ranges.data[i] = msgwire_bits_f32(msgwire_read_u32(buffer + *offset));"));
        assert!(code.contains("        MSGWIRE_TRY(msgwire_string_assign(&msg->frame_id, buffer + *offset, len_with_null));"));
        assert!(code.contains("    msg->default_ = (int8_t)msgwire_read_u8(buffer + *offset);"));
        assert!(code.contains("    for (size_t i = 0; i < msg->labels.size; ++i) {\n        msgwire_string_fini(&msg->labels.data[i]);\n    }\n    free(msg->labels.data);"));
        assert!(code.contains("    memset(out, 0, sizeof(*out));"));
        assert!(code.contains("        sensor_msgs__msg__Scan__fini_sensor_msgs__msg__Scan(out);"));
        assert!(code.contains("static inline void sensor_msgs__msg__Scan__fini(sensor_msgs__msg__Scan* msg)"));
    }

    #[test]
    fn empty_types_render() {
        let mut resolver = Resolver::new(MapSource::new().define("pkg/msg/Empty", &[]));
        let types = order(&mut resolver, &["pkg/msg/Empty"]).unwrap();
        let plans = PlanSet::from_types(&types).unwrap();
        assert!(compile_types_header(&plans).contains("typedef struct pkg__msg__Empty {\n    uint8_t _unused;\n}"));
        let code = compile_serializer(&plans, "pkg/msg/Empty", &["pkg/msg/Empty"]).unwrap();
        assert!(code.contains("    (void)offset;\n    return MSGWIRE_OK;"));
        let code = compile_deserializer(&plans, "pkg/msg/Empty", &["pkg/msg/Empty"]).unwrap();
        assert!(code.contains("{\n    (void)msg;\n}"));
    }

    #[test]
    fn arrays_of_empty_types_bound_their_count() {
        let source = MapSource::new()
            .define("pkg/msg/Empty", &[])
            .define("pkg/msg/Many", &[("items", "pkg/Empty[]")]);
        let mut resolver = Resolver::new(source);
        let types = order(&mut resolver, &["pkg/msg/Many"]).unwrap();
        let plans = PlanSet::from_types(&types).unwrap();
        let code = compile_deserializer(&plans, "pkg/msg/Many", &["pkg/msg/Empty", "pkg/msg/Many"]).unwrap();
        assert!(code.contains("    if (count > (length - *offset) / 1) {"));
    }

    #[test]
    fn integration_header_lists_roots() {
        let code = compile_integration_header(&["geometry_msgs/msg/Twist", "geometry_msgs/msg/PoseStamped"]);
        assert!(code.contains("#include \"common/serialize_utils.h\"\n#include \"common/msgwire_types.h\""));
        assert!(code.contains("#include \"geometry_msgs/Twist/serialize.h\"\n#include \"geometry_msgs/Twist/deserialize.h\""));
        assert!(code.contains("#include \"geometry_msgs/PoseStamped/deserialize.h\""));
    }

    #[test]
    fn unknown_roots_fail() {
        let (plans, _) = scan_plans();
        assert!(matches!(
            compile_serializer(&plans, "sensor_msgs/msg/Missing", &["sensor_msgs/msg/Missing"]),
            Err(MsgWireError::UnknownPlan(_))
        ));
    }
}
