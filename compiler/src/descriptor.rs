//! The type descriptor grammar: `T`, `T[N]`, `T[]` and `sequence<T>`.

use crate::error::MsgWireError;
use lazy_static::lazy_static;
use msgwire_schema::{Builtin, TEXT_NAMES};
use regex::Regex;

lazy_static! {
    static ref TYPE_NAME:    Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(?:/[A-Za-z_][A-Za-z0-9_]*){0,2}$").unwrap();
    static ref BOUNDED_TEXT: Regex = Regex::new(r"^(w?string)(?:<=\s*\d+|<\s*\d+>)$").unwrap();
    static ref BOUND:        Regex = Regex::new(r"^\s*\d+\s*$").unwrap();
}

/// Array-ness of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Single,
    Fixed(usize),
    Dynamic,
}

/// What is left once the array wrapper is stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseType {
    Builtin(Builtin),
    Text,
    /// A cross-type reference, already in canonical form.
    Reference(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub base:  BaseType,
    pub shape: Shape,
}

/// Canonical qualified name: `pkg/Name` becomes `pkg/msg/Name`, other forms
/// are kept as given.
pub fn canonical_name(name: &str) -> Result<String, MsgWireError> {
    let name = name.trim();
    if !TYPE_NAME.is_match(name) {
        return Err(MsgWireError::malformed(name, "not a valid type name"));
    }
    let parts: Vec<&str> = name.split('/').collect();
    Ok(match parts.as_slice() {
        [package, message] => format!("{}/msg/{}", package, message),
        _ => name.to_string(),
    })
}

pub fn parse_descriptor(text: &str) -> Result<Descriptor, MsgWireError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(MsgWireError::malformed(text, "empty descriptor"));
    }

    let (base, shape) = if let Some(rest) = trimmed.strip_prefix("sequence<") {
        let inner = rest
            .strip_suffix('>')
            .ok_or_else(|| MsgWireError::malformed(text, "unterminated sequence<...>"))?;
        // `sequence<T, N>` is bounded; the bound is not part of the wire format.
        let inner = match inner.rsplit_once(',') {
            Some((element, bound)) if BOUND.is_match(bound) => element,
            Some(_) => return Err(MsgWireError::malformed(text, "invalid sequence bound")),
            None => inner,
        };
        (inner.trim(), Shape::Dynamic)
    } else if let Some(rest) = trimmed.strip_suffix(']') {
        let open = rest
            .find('[')
            .ok_or_else(|| MsgWireError::malformed(text, "unbalanced brackets"))?;
        let body = &rest[open + 1..];
        if body.contains('[') || body.contains(']') {
            return Err(MsgWireError::malformed(text, "nested arrays are not supported"));
        }
        // A non-numeric or empty body (`[]`, `[<=5]`) is a dynamic array.
        let shape = match body.trim().parse::<usize>() {
            Ok(size) => Shape::Fixed(size),
            Err(_) => Shape::Dynamic,
        };
        (rest[..open].trim(), shape)
    } else if trimmed.contains('[') || trimmed.contains(']') {
        return Err(MsgWireError::malformed(text, "unbalanced brackets"));
    } else {
        (trimmed, Shape::Single)
    };

    if shape != Shape::Single && (base.contains('[') || base.starts_with("sequence<")) {
        return Err(MsgWireError::malformed(text, "nested arrays are not supported"));
    }

    Ok(Descriptor {
        base: classify_base(text, base)?,
        shape,
    })
}

fn classify_base(descriptor: &str, base: &str) -> Result<BaseType, MsgWireError> {
    if base.is_empty() {
        return Err(MsgWireError::malformed(descriptor, "empty base type"));
    }
    if TEXT_NAMES.contains(&base) {
        return Ok(BaseType::Text);
    }
    if let Some(caps) = BOUNDED_TEXT.captures(base) {
        if TEXT_NAMES.contains(&&caps[1]) {
            return Ok(BaseType::Text);
        }
    }
    if let Some(builtin) = Builtin::from_name(base) {
        return Ok(BaseType::Builtin(builtin));
    }
    if !TYPE_NAME.is_match(base) {
        return Err(MsgWireError::malformed(
            descriptor,
            format!("invalid base type \"{}\"", base),
        ));
    }
    Ok(BaseType::Reference(canonical_name(base)?))
}
