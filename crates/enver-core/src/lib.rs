//! Enver Core - source model and value pipeline
//!
//! This crate provides everything that does not need a cluster:
//! - `Source`: Typed source declarations parsed from `.enver.yaml`
//! - `ContextFilter` / `VariableFilter`: Source and variable selection
//! - `TransformChain`: Ordered key/value transformations
//! - `EnvEntry`: Provenance-tagged output entries and their rendering
//! - Local fetchers for `EnvFile` and `Vars` sources

pub mod config;
pub mod entry;
pub mod error;
pub mod filter;
pub mod local;
pub mod source;
pub mod transform;

pub use config::{EnverConfig, Execution, ExecutionOutput};
pub use entry::{EntryCollector, EnvEntry, Provenance, render_env};
pub use error::{CoreError, Result};
pub use filter::{ContextFilter, Pattern, VariableFilter};
pub use source::{
    ContainerOptions, DEFAULT_NAMESPACE, FileExtraction, Source, SourceConfig, SourceKind,
    SourceType, VarEntry, VolumeMountKeyMapping, VolumePaths, WorkloadOptions,
};
pub use transform::{FileOutput, Target, TransformChain, Transformation, TransformationSpec};
