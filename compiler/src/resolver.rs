//! Schema resolution: descriptor strings plus a schema source in, fully
//! classified and recursively resolved [`MessageType`]s out.

use std::collections::HashMap;
use std::sync::Arc;

use msgwire_schema::{Builtin, ElementType, Field, FieldKind, MessageType};
use tracing::debug;

use crate::{
    descriptor::{canonical_name, parse_descriptor, BaseType, Shape},
    error::MsgWireError,
    source::SchemaSource,
    types::RawField,
};

/// One generation session. Every type is resolved at most once per session;
/// asking again returns the same `Arc`. Build a new `Resolver` for every run
/// and drop it afterwards.
pub struct Resolver<S> {
    source:      S,
    cache:       HashMap<String, Arc<MessageType>>,
    in_progress: Vec<String>,
}

impl<S: SchemaSource> Resolver<S> {
    pub fn new(source: S) -> Resolver<S> {
        Resolver {
            source,
            cache:       HashMap::new(),
            in_progress: Vec::new(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// The already resolved type named `type_name`, if any.
    pub fn cached(&self, type_name: &str) -> Option<&Arc<MessageType>> {
        let name = canonical_name(type_name).ok()?;
        self.cache.get(&name)
    }

    /// Number of types resolved so far in this session.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Resolves `type_name` and, transitively, every type it references.
    ///
    /// Fails with `UnknownType` if the source has no fields for a name,
    /// `MalformedDescriptor` for a bad descriptor and `CyclicSchema` when a
    /// type is reached again while it is still being resolved. Nothing is
    /// cached for a type whose resolution failed.
    pub fn resolve(&mut self, type_name: &str) -> Result<Arc<MessageType>, MsgWireError> {
        let name = canonical_name(type_name)?;

        if let Some(found) = self.cache.get(&name) {
            debug!("Resolver cache hit for {}", name);
            return Ok(Arc::clone(found));
        }

        if let Some(start) = self.in_progress.iter().position(|n| *n == name) {
            let mut path = self.in_progress[start..].to_vec();
            path.push(name);
            return Err(MsgWireError::CyclicSchema { path });
        }

        debug!("Resolving {}", name);
        self.in_progress.push(name.clone());
        let result = self.build(&name);
        self.in_progress.pop();

        let message = Arc::new(result?);
        debug!("Resolved {} ({} fields)", name, message.fields.len());
        self.cache.insert(name, Arc::clone(&message));
        Ok(message)
    }

    fn build(&mut self, name: &str) -> Result<MessageType, MsgWireError> {
        let raw_fields = self.source.get_fields(name)?;
        let mut fields = Vec::with_capacity(raw_fields.len());
        for raw in &raw_fields {
            fields.push(self.resolve_field(raw)?);
        }
        Ok(MessageType::new(name.to_string(), fields))
    }

    /// Classifies one field descriptor, resolving any referenced type.
    pub fn resolve_field(&mut self, raw: &RawField) -> Result<Field, MsgWireError> {
        let descriptor = parse_descriptor(&raw.descriptor)?;

        let element_type = match descriptor.base {
            BaseType::Builtin(builtin) => ElementType::Builtin(builtin),
            BaseType::Text if descriptor.shape == Shape::Single => ElementType::Builtin(Builtin::Char),
            BaseType::Text => ElementType::Text,
            BaseType::Reference(ref target) => ElementType::Message(self.resolve(target)?),
        };

        let kind = match (descriptor.shape, &descriptor.base) {
            (Shape::Single, BaseType::Text) => FieldKind::Text,
            (Shape::Single, _) => FieldKind::Scalar,
            (Shape::Fixed(size), _) => FieldKind::FixedArray(size),
            (Shape::Dynamic, _) => FieldKind::DynamicArray,
        };

        Ok(Field {
            name: raw.name.clone(),
            kind,
            element_type,
        })
    }
}
