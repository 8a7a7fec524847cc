//! Dependency ordering: every nested type comes before the types using it.

use std::collections::HashSet;
use std::sync::Arc;

use msgwire_schema::MessageType;
use tracing::debug;

use crate::{error::MsgWireError, resolver::Resolver, source::SchemaSource};

/// Resolves every root and returns all reachable types so that each type's
/// nested types (array elements included) come strictly before it. Every
/// type appears exactly once, even when roots share dependencies.
pub fn order<S, N>(resolver: &mut Resolver<S>, roots: &[N]) -> Result<Vec<Arc<MessageType>>, MsgWireError>
where
    S: SchemaSource,
    N: AsRef<str>,
{
    let mut resolved = Vec::with_capacity(roots.len());
    for root in roots {
        resolved.push(resolver.resolve(root.as_ref())?);
    }
    let ordered = order_types(&resolved);
    debug!(
        "Dependency order: {}",
        ordered
            .iter()
            .map(|t| t.qualified_name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(ordered)
}

/// Post-order depth-first walk over already resolved roots. Fields are
/// visited in declaration order and roots in the order given, so the result
/// is the same on every run.
pub fn order_types(roots: &[Arc<MessageType>]) -> Vec<Arc<MessageType>> {
    fn visit<'a>(
        message: &'a Arc<MessageType>,
        seen: &mut HashSet<&'a str>,
        ordered: &mut Vec<Arc<MessageType>>,
    ) {
        if !seen.insert(message.qualified_name.as_str()) {
            return;
        }
        for nested in message.references() {
            visit(nested, seen, ordered);
        }
        ordered.push(Arc::clone(message));
    }

    let mut seen    = HashSet::new();
    let mut ordered = Vec::new();
    for root in roots {
        visit(root, &mut seen, &mut ordered);
    }
    ordered
}

/// The types `root` depends on, in dependency order, without `root` itself.
pub fn dependencies(root: &Arc<MessageType>) -> Vec<Arc<MessageType>> {
    let mut ordered = order_types(std::slice::from_ref(root));
    ordered.pop();
    ordered
}
