//! Generator configuration, loaded from JSON.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    driver::Target,
    error::MsgWireError,
    source::{ChainSource, JsonSource, MsgDirSource},
};

/// Roots generated when neither the config nor the command line names any.
pub const DEFAULT_MESSAGES: [&str; 3] = [
    "geometry_msgs/msg/Twist",
    "geometry_msgs/msg/PoseStamped",
    "geometry_msgs/msg/PoseWithCovarianceStamped",
];

/// Install prefixes searched for `share/<pkg>/msg/*.msg` when no schema
/// source is configured.
pub const PREFIX_PATH_VAR: &str = "AMENT_PREFIX_PATH";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where generated files are written
    pub output_dir: Option<PathBuf>,

    /// Root types to generate
    pub messages: Vec<String>,

    pub target: Target,

    /// Directories laid out as `<pkg>/msg/<Name>.msg`
    pub msg_paths: Vec<PathBuf>,

    /// A JSON schema document, consulted before `msg_paths`
    pub schema_json: Option<PathBuf>,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Config, MsgWireError> {
        info!("Loading config from {:?}", path);
        let content = fs::read_to_string(path)?;
        Config::from_json(&content)
    }

    pub fn from_json(text: &str) -> Result<Config, MsgWireError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn messages_or_default(&self) -> Vec<String> {
        if self.messages.is_empty() {
            DEFAULT_MESSAGES.iter().map(|m| m.to_string()).collect()
        } else {
            self.messages.clone()
        }
    }

    /// The schema sources this config names, JSON first. With none
    /// configured, the `share` directories of [`PREFIX_PATH_VAR`] are used.
    pub fn source(&self) -> Result<ChainSource, MsgWireError> {
        let mut chain = ChainSource::new();
        if let Some(path) = &self.schema_json {
            chain.push(JsonSource::from_path(path)?);
        }
        if !self.msg_paths.is_empty() {
            chain.push(MsgDirSource::new(self.msg_paths.iter().cloned()));
        }
        if chain.is_empty() {
            let shares = prefix_shares();
            if shares.is_empty() {
                return Err(MsgWireError::Config(format!(
                    "No schema source: set schema_json or msg_paths, or {}",
                    PREFIX_PATH_VAR
                )));
            }
            debug!("Searching {} for message definitions", PREFIX_PATH_VAR);
            chain.push(MsgDirSource::new(shares));
        }
        Ok(chain)
    }
}

fn prefix_shares() -> Vec<PathBuf> {
    match env::var_os(PREFIX_PATH_VAR) {
        Some(value) => env::split_paths(&value)
            .filter(|prefix| !prefix.as_os_str().is_empty())
            .map(|prefix| prefix.join("share"))
            .collect(),
        None => Vec::new(),
    }
}
