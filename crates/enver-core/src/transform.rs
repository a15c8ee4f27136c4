//! Key/value transformations
//!
//! A source declares an ordered list of [`TransformationSpec`]s. They are
//! built once into a [`TransformChain`] (unknown types and missing
//! parameters fail here, before anything is fetched) and then applied to
//! every variable the source emits.
//!
//! Every transformation is a pure `string -> string` mapping on either the
//! key or the value, except `file`, which writes the value to disk and
//! replaces both the key and the value in a single step.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};

/// Which half of the pair a transformation rewrites
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Key,
    #[default]
    Value,
}

/// Declarative transformation as written in `.enver.yaml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformationSpec {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub target: Target,

    /// Literal parameter for `prefix` / `suffix`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// Variable names this transformation applies to (empty = all)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<String>,

    /// Output path for `file`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Replacement key for `file`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl TransformationSpec {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Default::default()
        }
    }

    pub fn target(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn variables<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.variables = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn file(output: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            kind: "file".to_string(),
            output: Some(output.into()),
            key: Some(key.into()),
            ..Default::default()
        }
    }
}

/// A file written by the `file` transformation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutput {
    path: PathBuf,
    key: String,
}

impl FileOutput {
    /// Resolve `output` against `base_dir` unless it is already absolute
    pub fn new(output: &str, key: &str, base_dir: &Path) -> Result<Self> {
        if output.is_empty() {
            return Err(CoreError::MissingParameter {
                transformation: "file".to_string(),
                field: "output".to_string(),
            });
        }
        if key.is_empty() {
            return Err(CoreError::MissingParameter {
                transformation: "file".to_string(),
                field: "key".to_string(),
            });
        }

        let output = Path::new(output);
        let path = if output.is_absolute() {
            output.to_path_buf()
        } else {
            base_dir.join(output)
        };

        Ok(Self {
            path,
            key: key.to_string(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `value` verbatim and return the replacement `(key, path)`
    pub fn write(&self, value: &[u8]) -> Result<(String, String)> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| CoreError::FileWrite {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        std::fs::write(&self.path, value).map_err(|source| CoreError::FileWrite {
            path: self.path.clone(),
            source,
        })?;

        tracing::debug!(path = %self.path.display(), key = %self.key, "wrote file");
        Ok((self.key.clone(), self.path.to_string_lossy().into_owned()))
    }
}

/// A built transformation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transformation {
    Base64Encode,
    /// Lenient: undecodable input is returned unchanged
    Base64Decode,
    Prefix(String),
    Suffix(String),
    /// Lenient: unresolvable input is returned unchanged
    AbsolutePath,
    OutputDirectory(String),
    File(FileOutput),
}

impl Transformation {
    /// Build a transformation from its declarative form
    pub fn build(spec: &TransformationSpec, base_dir: &Path) -> Result<Self> {
        let literal = |name: &str| {
            spec.value
                .clone()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| CoreError::MissingParameter {
                    transformation: name.to_string(),
                    field: "value".to_string(),
                })
        };

        match spec.kind.as_str() {
            "base64_encode" => Ok(Self::Base64Encode),
            "base64_decode" => Ok(Self::Base64Decode),
            "prefix" => Ok(Self::Prefix(literal("prefix")?)),
            "suffix" => Ok(Self::Suffix(literal("suffix")?)),
            "absolute_path" => Ok(Self::AbsolutePath),
            "output_directory" => Ok(Self::OutputDirectory(
                base_dir.to_string_lossy().into_owned(),
            )),
            "file" => Ok(Self::File(FileOutput::new(
                spec.output.as_deref().unwrap_or_default(),
                spec.key.as_deref().unwrap_or_default(),
                base_dir,
            )?)),
            other => Err(CoreError::UnknownTransformation(other.to_string())),
        }
    }

    /// Map a single string; `file` is handled by [`Transformation::apply`]
    fn map(&self, input: &str) -> String {
        match self {
            Self::Base64Encode => STANDARD.encode(input.as_bytes()),
            Self::Base64Decode => STANDARD
                .decode(input)
                .ok()
                .and_then(|bytes| String::from_utf8(bytes).ok())
                .unwrap_or_else(|| input.to_string()),
            Self::Prefix(prefix) => format!("{prefix}{input}"),
            Self::Suffix(suffix) => format!("{input}{suffix}"),
            Self::AbsolutePath => std::path::absolute(input)
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_else(|_| input.to_string()),
            Self::OutputDirectory(dir) => dir.clone(),
            Self::File(_) => input.to_string(),
        }
    }

    /// Apply to a key/value pair
    pub fn apply(&self, target: Target, key: String, value: String) -> Result<(String, String)> {
        match (self, target) {
            (Self::File(output), _) => output.write(value.as_bytes()),
            (_, Target::Key) => Ok((self.map(&key), value)),
            (_, Target::Value) => Ok((key, self.map(&value))),
        }
    }
}

#[derive(Debug, Clone)]
struct Step {
    transformation: Transformation,
    target: Target,
    variables: Vec<String>,
}

impl Step {
    fn applies_to(&self, name: &str) -> bool {
        self.variables.is_empty() || self.variables.iter().any(|v| v == name)
    }
}

/// An ordered, built list of transformations
#[derive(Debug, Clone, Default)]
pub struct TransformChain {
    steps: Vec<Step>,
}

impl TransformChain {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build every spec, failing on the first configuration error
    pub fn build(specs: &[TransformationSpec], base_dir: &Path) -> Result<Self> {
        let steps = specs
            .iter()
            .map(|spec| {
                Ok(Step {
                    transformation: Transformation::build(spec, base_dir)?,
                    target: spec.target,
                    variables: spec.variables.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { steps })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step in declared order
    ///
    /// Scopes are matched against the variable name as it entered the
    /// chain, so a key renamed by an earlier step stays in scope. Paths
    /// written by `file` steps are appended to `written`.
    pub fn apply(
        &self,
        key: &str,
        value: &str,
        written: &mut Vec<PathBuf>,
    ) -> Result<(String, String)> {
        let mut pair = (key.to_string(), value.to_string());

        for step in self.steps.iter().filter(|s| s.applies_to(key)) {
            pair = step.transformation.apply(step.target, pair.0, pair.1)?;
            if let Transformation::File(output) = &step.transformation {
                written.push(output.path().to_path_buf());
            }
        }

        Ok(pair)
    }
}
