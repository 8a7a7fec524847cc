//! msgwire-compiler
//!
//! This crate implements:
//!  1) Schema sources: in-memory, JSON documents, and `.msg` directories
//!     (with a tokenizer + parser for the `.msg` text format),
//!  2) The schema resolver (memoized per session, cycle detection),
//!  3) Dependency ordering of the reachable types,
//!  4) Codec plans (`plan`) and an interpreter running them over `Value`s,
//!  5) Code generation for Rust (`compile_plans_to_rust`) and C (`gen_c`),
//!  6) The batch driver, configuration, and error types (`MsgWireError`).

pub mod error;
pub mod types;
pub mod utils;
pub mod tokenizer;
pub mod parser;
pub mod descriptor;
pub mod source;
pub mod resolver;
pub mod order;
pub mod plan;
pub mod runtime;
pub mod traits;
pub mod gen_rust;
pub mod gen_c;
pub mod config;
pub mod driver;

pub use config::Config;
pub use descriptor::{canonical_name, parse_descriptor};
pub use driver::{build_plans, generate, write_artifacts, Artifact, Report, Target, TypeReport};
pub use error::MsgWireError;
pub use gen_rust::compile_plans_to_rust;
pub use order::{dependencies, order, order_types};
pub use parser::compile_msg;
pub use plan::{plan, plan_all, CodecPlan, Count, Direction, Element, Op, Procedure};
pub use resolver::Resolver;
pub use runtime::PlanSet;
pub use source::{ChainSource, JsonSource, MapSource, MsgDirSource, SchemaSource};
pub use traits::{read_array, read_vec, WireMessage};
pub use types::RawField;
