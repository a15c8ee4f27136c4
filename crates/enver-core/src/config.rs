//! `.enver.yaml` loading

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::source::{Source, SourceConfig};

/// Default configuration file name, looked up in the working directory
pub const CONFIG_FILE: &str = ".enver.yaml";

/// Default output file name of an execution
pub const DEFAULT_OUTPUT_NAME: &str = ".env";

/// Default output directory of an execution
pub const DEFAULT_OUTPUT_DIRECTORY: &str = "generated";

/// Parsed `.enver.yaml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnverConfig {
    /// Declared context names
    #[serde(default)]
    pub contexts: Vec<String>,

    #[serde(default)]
    pub sources: Vec<SourceConfig>,

    #[serde(default)]
    pub executions: Vec<Execution>,
}

impl EnverConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Convert every raw source record, failing on the first invalid one
    pub fn sources(&self) -> Result<Vec<Source>> {
        self.sources.iter().cloned().map(Source::try_from).collect()
    }

    pub fn execution(&self, name: &str) -> Option<&Execution> {
        self.executions.iter().find(|e| e.name == name)
    }
}

/// A named, reusable generation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Execution {
    pub name: String,

    #[serde(default)]
    pub output: ExecutionOutput,

    /// Selected contexts for this run
    #[serde(default)]
    pub contexts: Vec<String>,

    /// Kubeconfig context used for cluster sources
    #[serde(
        rename = "kube-context",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub kube_context: Option<String>,
}

/// Where an execution writes its env file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutput {
    #[serde(default = "default_output_name")]
    pub name: String,

    #[serde(default = "default_output_directory")]
    pub directory: String,
}

impl Default for ExecutionOutput {
    fn default() -> Self {
        Self {
            name: default_output_name(),
            directory: default_output_directory(),
        }
    }
}

impl ExecutionOutput {
    /// `<directory>/<name>`
    pub fn path(&self) -> std::path::PathBuf {
        Path::new(&self.directory).join(&self.name)
    }
}

fn default_output_name() -> String {
    DEFAULT_OUTPUT_NAME.to_string()
}

fn default_output_directory() -> String {
    DEFAULT_OUTPUT_DIRECTORY.to_string()
}
