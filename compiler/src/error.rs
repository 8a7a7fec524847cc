use msgwire_schema::WireError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MsgWireError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error at line {line}, column {column}: {msg}")]
    ParseError {
        msg:    String,
        line:   usize,
        column: usize,
    },

    #[error("Unknown type \"{0}\"")]
    UnknownType(String),

    #[error("Malformed type descriptor \"{descriptor}\": {reason}")]
    MalformedDescriptor {
        descriptor: String,
        reason:     String,
    },

    #[error("Cyclic schema: {}", path.join(" -> "))]
    CyclicSchema {
        path: Vec<String>,
    },

    #[error("Missing field \"{field}\" in record of type \"{type_name}\"")]
    MissingField {
        type_name: String,
        field:     String,
    },

    #[error("Field \"{field}\" expects {expected}, found {found}")]
    TypeMismatch {
        field:    String,
        expected: String,
        found:    String,
    },

    #[error("No codec plan for type \"{0}\"")]
    UnknownPlan(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Wire(#[from] WireError),
}

impl MsgWireError {
    pub(crate) fn malformed(descriptor: &str, reason: impl Into<String>) -> MsgWireError {
        MsgWireError::MalformedDescriptor {
            descriptor: descriptor.to_string(),
            reason:     reason.into(),
        }
    }
}
