//! Resolved environment entries and their textual rendering

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::error::Result;
use crate::filter::VariableFilter;
use crate::source::SourceType;
use crate::transform::TransformChain;

/// Where an entry came from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provenance {
    pub source_type: SourceType,
    pub name: String,
    /// Empty for local sources
    pub namespace: String,
}

impl Provenance {
    pub fn new(
        source_type: SourceType,
        name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            source_type,
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    pub fn local(source_type: SourceType, name: impl Into<String>) -> Self {
        Self::new(source_type, name, "")
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{} {}", self.source_type, self.name)
        } else {
            write!(f, "{} {}/{}", self.source_type, self.namespace, self.name)
        }
    }
}

/// One resolved variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvEntry {
    pub key: String,
    pub value: String,
    #[serde(flatten)]
    pub provenance: Provenance,
    /// Files written to disk while producing this entry
    #[serde(skip)]
    pub files: Vec<PathBuf>,
}

impl EnvEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>, provenance: Provenance) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            provenance,
            files: Vec::new(),
        }
    }

    pub fn with_files(mut self, files: impl IntoIterator<Item = PathBuf>) -> Self {
        self.files.extend(files);
        self
    }

    pub fn source_type(&self) -> SourceType {
        self.provenance.source_type
    }
}

/// Accumulates the entries of one source
///
/// Every candidate goes through the variable filter and then the
/// transformation chain, in that order.
#[derive(Debug)]
pub struct EntryCollector<'a> {
    filter: &'a VariableFilter,
    chain: &'a TransformChain,
    entries: Vec<EnvEntry>,
}

impl<'a> EntryCollector<'a> {
    pub fn new(filter: &'a VariableFilter, chain: &'a TransformChain) -> Self {
        Self {
            filter,
            chain,
            entries: Vec::new(),
        }
    }

    /// Filter, transform and record a candidate
    ///
    /// Returns whether the candidate was kept.
    pub fn push(&mut self, key: &str, value: &str, provenance: &Provenance) -> Result<bool> {
        if !self.filter.keeps(key) {
            return Ok(false);
        }

        let mut written = Vec::new();
        let (key, value) = self.chain.apply(key, value, &mut written)?;
        self.entries
            .push(EnvEntry::new(key, value, provenance.clone()).with_files(written));
        Ok(true)
    }

    /// Record an entry that bypasses filtering and transformation
    pub fn push_raw(&mut self, entry: EnvEntry) {
        self.entries.push(entry);
    }

    pub fn chain(&self) -> &TransformChain {
        self.chain
    }

    pub fn filter(&self) -> &VariableFilter {
        self.filter
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<EnvEntry> {
        self.entries
    }
}

/// Render entries as a commented `.env` document
///
/// A `# <provenance>` header opens every run of entries sharing the same
/// provenance; runs are separated by a blank line. Entries are written in
/// order and never deduplicated.
pub fn render_env(entries: &[EnvEntry]) -> String {
    let mut out = String::new();
    let mut last: Option<&Provenance> = None;

    for entry in entries {
        if last != Some(&entry.provenance) {
            if last.is_some() {
                out.push('\n');
            }
            out.push_str(&format!("# {}\n", entry.provenance));
            last = Some(&entry.provenance);
        }
        out.push_str(&format!("{}={}\n", entry.key, entry.value));
    }

    out
}
