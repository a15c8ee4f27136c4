//! Source declarations
//!
//! `.enver.yaml` describes sources as flat records with a `type` tag. They
//! are parsed into [`SourceConfig`] and converted into the typed [`Source`],
//! whose [`SourceKind`] carries only the fields that belong to its tag.
//! Fields set for another tag are ignored (a warning is logged for each).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::error::{CoreError, Result};
use crate::filter::{ContextFilter, VariableFilter};
use crate::transform::TransformationSpec;

/// Namespace used when a source does not declare one
pub const DEFAULT_NAMESPACE: &str = "default";

/// Kind of source an entry was produced by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceType {
    ConfigMap,
    Secret,
    EnvFile,
    Vars,
    Deployment,
    StatefulSet,
    DaemonSet,
    Container,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::ConfigMap => "ConfigMap",
            SourceType::Secret => "Secret",
            SourceType::EnvFile => "EnvFile",
            SourceType::Vars => "Vars",
            SourceType::Deployment => "Deployment",
            SourceType::StatefulSet => "StatefulSet",
            SourceType::DaemonSet => "DaemonSet",
            SourceType::Container => "Container",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        Some(match tag {
            "ConfigMap" => SourceType::ConfigMap,
            "Secret" => SourceType::Secret,
            "EnvFile" => SourceType::EnvFile,
            "Vars" => SourceType::Vars,
            "Deployment" => SourceType::Deployment,
            "StatefulSet" => SourceType::StatefulSet,
            "DaemonSet" => SourceType::DaemonSet,
            "Container" => SourceType::Container,
            _ => return None,
        })
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inline variable of a `Vars` source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarEntry {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub value: String,
}

/// Key rename table for files projected from one ConfigMap or Secret
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeMountKeyMapping {
    /// `ConfigMap` or `Secret`
    pub kind: String,

    pub name: String,

    #[serde(default)]
    pub mappings: BTreeMap<String, String>,
}

/// Where files projected from a volume are written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VolumePaths {
    /// `<mountPath>/<file>`, as seen inside the container
    #[default]
    MountPath,
    /// `<volumeMount name>/<file>`, relative to the output directory
    MountName,
}

/// A file copied out of a running container
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileExtraction {
    /// Path inside the container
    pub path: String,

    /// Local output path (relative paths land in the output directory)
    pub output: String,

    /// Variable that receives the local path
    pub key: String,

    /// Container to read from (default: first eligible container)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
}

/// Options shared by the Deployment / StatefulSet / DaemonSet variants
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkloadOptions {
    /// Container allow-list (empty = every container)
    pub containers: Vec<String>,
    pub volume_mount_key_mappings: Vec<VolumeMountKeyMapping>,
    pub volume_paths: VolumePaths,
}

impl WorkloadOptions {
    pub fn selects_container(&self, name: &str) -> bool {
        self.containers.is_empty() || self.containers.iter().any(|c| c == name)
    }

    /// Environment key for a file projected from `(kind, name)`
    pub fn mapped_key(&self, kind: &str, name: &str, key: &str) -> String {
        self.volume_mount_key_mappings
            .iter()
            .find(|m| m.kind == kind && m.name == name)
            .and_then(|m| m.mappings.get(key))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}

/// Options of the Container variant
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerOptions {
    /// `Pod`, `Deployment`, `StatefulSet` or `DaemonSet`; validated at fetch time
    pub kind: String,
    pub containers: Vec<String>,
    pub files: Vec<FileExtraction>,
}

impl ContainerOptions {
    pub fn selects_container(&self, name: &str) -> bool {
        self.containers.is_empty() || self.containers.iter().any(|c| c == name)
    }
}

/// Variant-specific part of a source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    ConfigMap,
    Secret,
    EnvFile { path: PathBuf },
    Vars { vars: Vec<VarEntry> },
    Deployment(WorkloadOptions),
    StatefulSet(WorkloadOptions),
    DaemonSet(WorkloadOptions),
    Container(ContainerOptions),
}

impl SourceKind {
    pub fn source_type(&self) -> SourceType {
        match self {
            SourceKind::ConfigMap => SourceType::ConfigMap,
            SourceKind::Secret => SourceType::Secret,
            SourceKind::EnvFile { .. } => SourceType::EnvFile,
            SourceKind::Vars { .. } => SourceType::Vars,
            SourceKind::Deployment(_) => SourceType::Deployment,
            SourceKind::StatefulSet(_) => SourceType::StatefulSet,
            SourceKind::DaemonSet(_) => SourceType::DaemonSet,
            SourceKind::Container(_) => SourceType::Container,
        }
    }

    /// Whether resolving this source needs a cluster client
    pub fn requires_cluster(&self) -> bool {
        !matches!(self, SourceKind::EnvFile { .. } | SourceKind::Vars { .. })
    }
}

/// A typed source declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub name: String,
    pub namespace: String,
    pub contexts: ContextFilter,
    pub variables: VariableFilter,
    pub transformations: Vec<TransformationSpec>,
    pub kind: SourceKind,
}

impl Source {
    pub fn new(name: impl Into<String>, kind: SourceKind) -> Self {
        Self {
            name: name.into(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            contexts: ContextFilter::default(),
            variables: VariableFilter::default(),
            transformations: Vec::new(),
            kind,
        }
    }

    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_variables(mut self, variables: VariableFilter) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_contexts(mut self, contexts: ContextFilter) -> Self {
        self.contexts = contexts;
        self
    }

    pub fn with_transformations(mut self, transformations: Vec<TransformationSpec>) -> Self {
        self.transformations = transformations;
        self
    }

    pub fn source_type(&self) -> SourceType {
        self.kind.source_type()
    }

    /// Whether this source takes part in a run with the given contexts
    pub fn should_include<S: AsRef<str>>(&self, selected: &[S]) -> bool {
        self.contexts.includes(selected)
    }
}

/// Flat source record as written in `.enver.yaml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceConfig {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(rename = "type", default)]
    pub type_: String,

    #[serde(default)]
    pub contexts: ContextFilter,

    #[serde(default)]
    pub variables: VariableFilter,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transformations: Vec<TransformationSpec>,

    // EnvFile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    // Vars
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vars: Vec<VarEntry>,

    // Workloads and Container
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub containers: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volume_mount_key_mappings: Vec<VolumeMountKeyMapping>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_paths: Option<VolumePaths>,

    // Container
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<FileExtraction>,
}

impl SourceConfig {
    /// Names of populated fields that the declared type does not use
    fn unused_fields(&self, source_type: SourceType) -> Vec<&'static str> {
        let is_workload = matches!(
            source_type,
            SourceType::Deployment | SourceType::StatefulSet | SourceType::DaemonSet
        );
        let is_container = source_type == SourceType::Container;

        let mut unused = Vec::new();
        if self.path.is_some() && source_type != SourceType::EnvFile {
            unused.push("path");
        }
        if !self.vars.is_empty() && source_type != SourceType::Vars {
            unused.push("vars");
        }
        if !self.containers.is_empty() && !is_workload && !is_container {
            unused.push("containers");
        }
        if !self.volume_mount_key_mappings.is_empty() && !is_workload {
            unused.push("volumeMountKeyMappings");
        }
        if self.volume_paths.is_some() && !is_workload {
            unused.push("volumePaths");
        }
        if self.kind.is_some() && !is_container {
            unused.push("kind");
        }
        if !self.files.is_empty() && !is_container {
            unused.push("files");
        }
        unused
    }
}

impl TryFrom<SourceConfig> for Source {
    type Error = CoreError;

    fn try_from(config: SourceConfig) -> Result<Self> {
        if config.type_.is_empty() {
            return Err(CoreError::MissingSourceType { name: config.name });
        }

        let source_type =
            SourceType::parse(&config.type_).ok_or_else(|| CoreError::UnknownSourceType {
                kind: config.type_.clone(),
                name: config.name.clone(),
            })?;

        for field in config.unused_fields(source_type) {
            tracing::warn!(
                source = %config.name,
                r#type = %source_type,
                field,
                "field has no effect for this source type"
            );
        }

        let missing = |field: &str| CoreError::MissingField {
            kind: source_type.to_string(),
            name: config.name.clone(),
            field: field.to_string(),
        };

        if source_type != SourceType::EnvFile
            && source_type != SourceType::Vars
            && config.name.is_empty()
        {
            return Err(missing("name"));
        }

        let workload = || WorkloadOptions {
            containers: config.containers.clone(),
            volume_mount_key_mappings: config.volume_mount_key_mappings.clone(),
            volume_paths: config.volume_paths.unwrap_or_default(),
        };

        let kind = match source_type {
            SourceType::ConfigMap => SourceKind::ConfigMap,
            SourceType::Secret => SourceKind::Secret,
            SourceType::EnvFile => SourceKind::EnvFile {
                path: config
                    .path
                    .clone()
                    .filter(|p| !p.as_os_str().is_empty())
                    .ok_or_else(|| missing("path"))?,
            },
            SourceType::Vars => SourceKind::Vars {
                vars: config.vars.clone(),
            },
            SourceType::Deployment => SourceKind::Deployment(workload()),
            SourceType::StatefulSet => SourceKind::StatefulSet(workload()),
            SourceType::DaemonSet => SourceKind::DaemonSet(workload()),
            SourceType::Container => SourceKind::Container(ContainerOptions {
                kind: config.kind.clone().unwrap_or_default(),
                containers: config.containers.clone(),
                files: config.files.clone(),
            }),
        };

        Ok(Source {
            name: config.name,
            namespace: config
                .namespace
                .filter(|ns| !ns.is_empty())
                .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
            contexts: config.contexts,
            variables: config.variables,
            transformations: config.transformations,
            kind,
        })
    }
}
