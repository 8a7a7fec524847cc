use serde::{Deserialize, Serialize};

/// One `(field name, type descriptor)` pair as supplied by a schema source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawField {
    pub name: String,
    #[serde(rename = "type")]
    pub descriptor: String,
}

impl RawField {
    pub fn new(name: impl Into<String>, descriptor: impl Into<String>) -> RawField {
        RawField {
            name:       name.into(),
            descriptor: descriptor.into(),
        }
    }
}

/// A parsed `.msg` file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MsgFile {
    pub package:   String,
    pub name:      String,
    pub fields:    Vec<MsgField>,
    pub constants: Vec<MsgConstant>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MsgField {
    pub name:    String,
    pub line:    usize,
    pub column:  usize,
    /// The type exactly as written, e.g. `Header` or `float64[36]`.
    pub type_:   String,
    pub default: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MsgConstant {
    pub name:  String,
    pub type_: String,
    pub value: String,
}
