//! Batch generation: resolve, order, plan and render a list of root types.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use msgwire_schema::MessageType;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    error::MsgWireError,
    gen_c::{
        compile_deserializer, compile_integration_header, compile_serialize_utils, compile_serializer,
        compile_types_header, header_dir, INTEGRATION_HEADER, TYPES_HEADER, UTILS_HEADER,
    },
    gen_rust::{compile_plans_to_rust, RUST_FILE},
    order::{order, order_types},
    resolver::Resolver,
    runtime::PlanSet,
    source::SchemaSource,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    #[default]
    C,
    Rust,
}

impl FromStr for Target {
    type Err = MsgWireError;

    fn from_str(s: &str) -> Result<Target, MsgWireError> {
        match s.to_ascii_lowercase().as_str() {
            "c" => Ok(Target::C),
            "rust" | "rs" => Ok(Target::Rust),
            other => Err(MsgWireError::Config(format!("Unknown target \"{}\"", other))),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::C => write!(f, "c"),
            Target::Rust => write!(f, "rust"),
        }
    }
}

/// A generated file, relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path:     PathBuf,
    pub contents: String,
}

/// Outcome for one requested root: the types it reaches, in dependency order
/// and ending with the root, or the reason it was skipped.
#[derive(Debug)]
pub struct TypeReport {
    pub type_name: String,
    pub outcome:   Result<Vec<String>, MsgWireError>,
}

#[derive(Debug, Default)]
pub struct Report {
    pub types:     Vec<TypeReport>,
    pub artifacts: Vec<Artifact>,
}

impl Report {
    pub fn succeeded(&self) -> impl Iterator<Item = &TypeReport> {
        self.types.iter().filter(|t| t.outcome.is_ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = &TypeReport> {
        self.types.iter().filter(|t| t.outcome.is_err())
    }

    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }
}

/// Resolves and orders every root in one session, returning the plans of
/// all types they reach. The first failure aborts.
pub fn build_plans<S, N>(source: S, roots: &[N]) -> Result<PlanSet, MsgWireError>
where
    S: SchemaSource,
    N: AsRef<str>,
{
    let mut resolver = Resolver::new(source);
    let types = order(&mut resolver, roots)?;
    PlanSet::from_types(&types)
}

fn names(types: &[Arc<MessageType>]) -> Vec<String> {
    types.iter().map(|t| t.qualified_name.clone()).collect()
}

/// Generates code for every root that resolves. A root that fails is recorded
/// in the report and the others carry on; only errors that affect the whole
/// batch are returned as `Err`.
pub fn generate<S, N>(source: S, roots: &[N], target: Target) -> Result<Report, MsgWireError>
where
    S: SchemaSource,
    N: AsRef<str>,
{
    let mut resolver = Resolver::new(source);
    let mut report = Report::default();
    let mut resolved: Vec<Arc<MessageType>> = Vec::new();

    for root in roots {
        let root = root.as_ref();
        let outcome = order(&mut resolver, &[root]).map(|closure| {
            if let Some(last) = closure.last() {
                resolved.push(Arc::clone(last));
            }
            names(&closure)
        });
        match &outcome {
            Ok(closure) => info!("Resolved {} ({} types)", root, closure.len()),
            Err(err) => warn!("Skipping {}: {}", root, err),
        }
        report.types.push(TypeReport {
            type_name: root.to_string(),
            outcome,
        });
    }

    let plans = PlanSet::from_types(&order_types(&resolved))?;
    match target {
        Target::Rust => {
            report.artifacts.push(Artifact {
                path:     PathBuf::from(RUST_FILE),
                contents: compile_plans_to_rust(&plans)?,
            });
        }
        Target::C => render_c(&plans, &mut report),
    }

    info!(
        "Generated {} files for {} of {} types",
        report.artifacts.len(),
        report.succeeded().count(),
        report.types.len()
    );
    Ok(report)
}

fn render_c(plans: &PlanSet, report: &mut Report) {
    let mut artifacts = vec![
        Artifact {
            path:     PathBuf::from(UTILS_HEADER),
            contents: compile_serialize_utils(),
        },
        Artifact {
            path:     PathBuf::from(TYPES_HEADER),
            contents: compile_types_header(plans),
        },
    ];
    let mut rendered: Vec<String> = Vec::new();

    for entry in report.types.iter_mut() {
        let closure = match &entry.outcome {
            Ok(closure) => closure,
            Err(_) => continue,
        };
        let Some(root) = closure.last() else { continue };
        let pair = compile_serializer(plans, root, closure)
            .and_then(|serializer| Ok((serializer, compile_deserializer(plans, root, closure)?)));
        match pair {
            Ok((serializer, deserializer)) => {
                let dir = PathBuf::from(header_dir(root));
                // Roots named twice share one header pair.
                if !rendered.contains(root) {
                    artifacts.push(Artifact { path: dir.join("serialize.h"), contents: serializer });
                    artifacts.push(Artifact { path: dir.join("deserialize.h"), contents: deserializer });
                    rendered.push(root.clone());
                }
            }
            Err(err) => {
                warn!("Skipping {}: {}", entry.type_name, err);
                entry.outcome = Err(err);
            }
        }
    }

    artifacts.push(Artifact {
        path:     PathBuf::from(INTEGRATION_HEADER),
        contents: compile_integration_header(&rendered),
    });
    report.artifacts.extend(artifacts);
}

/// Writes every artifact below `dir`, creating directories as needed.
pub fn write_artifacts(report: &Report, dir: &Path) -> Result<usize, MsgWireError> {
    for artifact in &report.artifacts {
        let path = dir.join(&artifact.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, &artifact.contents)?;
        debug!("Wrote {}", path.display());
    }
    Ok(report.artifacts.len())
}
