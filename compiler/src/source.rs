//! Schema sources: where the field lists of message types come from.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use msgwire_schema::{Builtin, TEXT_NAMES};
use tracing::debug;

use crate::{
    descriptor::canonical_name,
    error::MsgWireError,
    parser::compile_msg,
    types::RawField,
};

/// Supplies the ordered `(field name, type descriptor)` list of a type.
///
/// Names passed in are canonical (see [`canonical_name`]). A source that
/// does not know a name fails with [`MsgWireError::UnknownType`].
pub trait SchemaSource {
    fn get_fields(&self, type_name: &str) -> Result<Vec<RawField>, MsgWireError>;
}

impl<S: SchemaSource + ?Sized> SchemaSource for &S {
    fn get_fields(&self, type_name: &str) -> Result<Vec<RawField>, MsgWireError> {
        (**self).get_fields(type_name)
    }
}

/// An in-memory source. Keys are stored in canonical form, so
/// `std_msgs/Header` and `std_msgs/msg/Header` name the same entry.
#[derive(Debug, Clone, Default)]
pub struct MapSource {
    types: HashMap<String, Vec<RawField>>,
}

impl MapSource {
    pub fn new() -> MapSource {
        MapSource::default()
    }

    pub fn insert(&mut self, type_name: &str, fields: Vec<RawField>) {
        let key = canonical_name(type_name).unwrap_or_else(|_| type_name.to_string());
        self.types.insert(key, fields);
    }

    /// Builder form of [`insert`](Self::insert) taking `(name, descriptor)` pairs.
    pub fn define(mut self, type_name: &str, fields: &[(&str, &str)]) -> MapSource {
        let fields = fields
            .iter()
            .map(|(name, descriptor)| RawField::new(*name, *descriptor))
            .collect();
        self.insert(type_name, fields);
        self
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl SchemaSource for MapSource {
    fn get_fields(&self, type_name: &str) -> Result<Vec<RawField>, MsgWireError> {
        self.types
            .get(type_name)
            .cloned()
            .ok_or_else(|| MsgWireError::UnknownType(type_name.to_string()))
    }
}

/// A JSON document mapping type names to ordered field lists:
///
/// ```json
/// { "geometry_msgs/msg/Point": [ { "name": "x", "type": "float64" } ] }
/// ```
#[derive(Debug, Clone, Default)]
pub struct JsonSource {
    inner: MapSource,
}

impl JsonSource {
    pub fn from_json(text: &str) -> Result<JsonSource, MsgWireError> {
        let types: HashMap<String, Vec<RawField>> = serde_json::from_str(text)?;
        let mut inner = MapSource::new();
        for (name, fields) in types {
            inner.insert(&name, fields);
        }
        Ok(JsonSource { inner })
    }

    pub fn from_path(path: &Path) -> Result<JsonSource, MsgWireError> {
        debug!("Loading schema JSON from {}", path.display());
        let text = fs::read_to_string(path)?;
        JsonSource::from_json(&text)
    }
}

impl SchemaSource for JsonSource {
    fn get_fields(&self, type_name: &str) -> Result<Vec<RawField>, MsgWireError> {
        self.inner.get_fields(type_name)
    }
}

/// Reads `.msg` definitions laid out as `<root>/<pkg>/msg/<Name>.msg`. Roots
/// are searched in order; the first file found wins.
#[derive(Debug, Clone, Default)]
pub struct MsgDirSource {
    roots: Vec<PathBuf>,
}

impl MsgDirSource {
    pub fn new<P: Into<PathBuf>>(roots: impl IntoIterator<Item = P>) -> MsgDirSource {
        MsgDirSource {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    fn find(&self, relative: &Path) -> Option<PathBuf> {
        self.roots
            .iter()
            .map(|root| root.join(relative))
            .find(|path| path.is_file())
    }
}

impl SchemaSource for MsgDirSource {
    fn get_fields(&self, type_name: &str) -> Result<Vec<RawField>, MsgWireError> {
        let parts: Vec<&str> = type_name.split('/').collect();
        let (package, kind, name) = match parts.as_slice() {
            [package, kind, name] => (*package, *kind, *name),
            _ => return Err(MsgWireError::UnknownType(type_name.to_string())),
        };

        let file_name = format!("{}.{}", name, kind);
        let relative: PathBuf = [package, kind, file_name.as_str()].iter().collect();
        let path = self
            .find(&relative)
            .ok_or_else(|| MsgWireError::UnknownType(type_name.to_string()))?;
        debug!("Reading {} from {}", type_name, path.display());

        let text = fs::read_to_string(&path)?;
        let msg = compile_msg(package, name, &text)?;
        Ok(msg
            .fields
            .into_iter()
            .map(|field| {
                let descriptor = qualify_msg_type(&msg.package, &field.type_);
                RawField::new(field.name, descriptor)
            })
            .collect())
    }
}

/// Tries several sources in turn. A source that does not know a type passes
/// it on; any other failure stops the lookup.
#[derive(Default)]
pub struct ChainSource {
    sources: Vec<Box<dyn SchemaSource>>,
}

impl ChainSource {
    pub fn new() -> ChainSource {
        ChainSource::default()
    }

    pub fn push(&mut self, source: impl SchemaSource + 'static) {
        self.sources.push(Box::new(source));
    }

    pub fn with(mut self, source: impl SchemaSource + 'static) -> ChainSource {
        self.push(source);
        self
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl SchemaSource for ChainSource {
    fn get_fields(&self, type_name: &str) -> Result<Vec<RawField>, MsgWireError> {
        for source in &self.sources {
            match source.get_fields(type_name) {
                Err(MsgWireError::UnknownType(_)) => continue,
                other => return other,
            }
        }
        Err(MsgWireError::UnknownType(type_name.to_string()))
    }
}

/// Qualifies a type as written in a `.msg` file of `package`: builtins and
/// text stay as they are, a bare `Header` is `std_msgs/msg/Header`, any other
/// bare name lives in the same package, and `pkg/Name` becomes `pkg/msg/Name`.
/// An array suffix is carried over unchanged.
pub fn qualify_msg_type(package: &str, type_: &str) -> String {
    let (base, suffix) = match type_.find('[') {
        Some(open) => type_.split_at(open),
        None => (type_, ""),
    };

    let is_text = TEXT_NAMES
        .iter()
        .any(|text| base == *text || base.starts_with(&format!("{}<", text)));
    let qualified = if is_text || Builtin::from_name(base).is_some() {
        base.to_string()
    } else if base.contains('/') {
        canonical_name(base).unwrap_or_else(|_| base.to_string())
    } else if base == "Header" {
        "std_msgs/msg/Header".to_string()
    } else {
        format!("{}/msg/{}", package, base)
    };

    format!("{}{}", qualified, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_source_normalises_names() {
        let source = MapSource::new().define("std_msgs/Header", &[("frame_id", "string")]);
        assert_eq!(
            source.get_fields("std_msgs/msg/Header").unwrap(),
            vec![RawField::new("frame_id", "string")]
        );
        assert!(matches!(
            source.get_fields("std_msgs/msg/Empty"),
            Err(MsgWireError::UnknownType(name)) if name == "std_msgs/msg/Empty"
        ));
    }

    #[test]
    fn json_source_keeps_field_order() {
        let source = JsonSource::from_json(
            r#"{
                "geometry_msgs/Point": [
                    { "name": "z", "type": "float64" },
                    { "name": "x", "type": "float64" },
                    { "name": "y", "type": "float64" }
                ]
            }"#,
        )
        .unwrap();
        let names: Vec<String> = source
            .get_fields("geometry_msgs/msg/Point")
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["z", "x", "y"]);
    }

    #[test]
    fn json_source_rejects_bad_documents() {
        assert!(matches!(
            JsonSource::from_json("[1, 2]"),
            Err(MsgWireError::Json(_))
        ));
    }

    #[test]
    fn msg_types_are_qualified() {
        assert_eq!(qualify_msg_type("geometry_msgs", "float64[36]"), "float64[36]");
        assert_eq!(qualify_msg_type("geometry_msgs", "string<=8"), "string<=8");
        assert_eq!(qualify_msg_type("geometry_msgs", "Header"), "std_msgs/msg/Header");
        assert_eq!(qualify_msg_type("geometry_msgs", "Point"), "geometry_msgs/msg/Point");
        assert_eq!(qualify_msg_type("geometry_msgs", "Point[]"), "geometry_msgs/msg/Point[]");
        assert_eq!(
            qualify_msg_type("nav_msgs", "geometry_msgs/Pose[2]"),
            "geometry_msgs/msg/Pose[2]"
        );
    }

    #[test]
    fn msg_dir_source_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        let msg_dir = dir.path().join("geometry_msgs").join("msg");
        fs::create_dir_all(&msg_dir).unwrap();
        fs::write(
            msg_dir.join("PointStamped.msg"),
            "# A point with a header\nHeader header\nPoint point\nuint8 FLAG=1\n",
        )
        .unwrap();

        let source = MsgDirSource::new([dir.path()]);
        assert_eq!(
            source.get_fields("geometry_msgs/msg/PointStamped").unwrap(),
            vec![
                RawField::new("header", "std_msgs/msg/Header"),
                RawField::new("point", "geometry_msgs/msg/Point"),
            ]
        );
        assert!(matches!(
            source.get_fields("geometry_msgs/msg/Missing"),
            Err(MsgWireError::UnknownType(_))
        ));
        assert!(matches!(
            source.get_fields("Point"),
            Err(MsgWireError::UnknownType(_))
        ));
    }

    #[test]
    fn chain_source_falls_through_unknown_types() {
        let chain = ChainSource::new()
            .with(MapSource::new().define("pkg/msg/A", &[("x", "int8")]))
            .with(MapSource::new().define("pkg/msg/A", &[("y", "int8")]).define("pkg/msg/B", &[("z", "int8")]));
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.get_fields("pkg/msg/A").unwrap(), vec![RawField::new("x", "int8")]);
        assert_eq!(chain.get_fields("pkg/msg/B").unwrap(), vec![RawField::new("z", "int8")]);
        assert!(matches!(chain.get_fields("pkg/msg/C"), Err(MsgWireError::UnknownType(_))));
        assert!(matches!(ChainSource::new().get_fields("pkg/msg/A"), Err(MsgWireError::UnknownType(_))));
    }

    #[test]
    fn chain_source_stops_on_other_errors() {
        let dir = tempfile::tempdir().unwrap();
        let msg_dir = dir.path().join("pkg").join("msg");
        fs::create_dir_all(&msg_dir).unwrap();
        fs::write(msg_dir.join("Bad.msg"), "int32 = 3\n").unwrap();
        let chain = ChainSource::new()
            .with(MsgDirSource::new([dir.path()]))
            .with(MapSource::new().define("pkg/msg/Bad", &[("x", "int8")]));
        assert!(matches!(chain.get_fields("pkg/msg/Bad"), Err(MsgWireError::ParseError { .. })));
    }
}
