//! ConfigMap and Secret sources

use enver_core::{EntryCollector, Provenance, Source, SourceType};
use std::collections::BTreeMap;

use crate::error::Result;
use crate::provider::{ClusterProvider, config_map_data, secret_data};

/// Push every non-empty value of `data`, keys prefixed with `prefix`
pub(crate) fn collect_data(
    collector: &mut EntryCollector<'_>,
    data: BTreeMap<String, String>,
    prefix: &str,
    provenance: &Provenance,
) -> Result<()> {
    for (key, value) in data {
        if value.is_empty() {
            continue;
        }
        collector.push(&format!("{prefix}{key}"), &value, provenance)?;
    }
    Ok(())
}

pub(crate) async fn fetch_config_map(
    provider: &dyn ClusterProvider,
    source: &Source,
    collector: &mut EntryCollector<'_>,
) -> Result<()> {
    let config_map = provider
        .get_config_map(&source.namespace, &source.name)
        .await?;
    let provenance = Provenance::new(SourceType::ConfigMap, &source.name, &source.namespace);

    collect_data(collector, config_map_data(config_map), "", &provenance)
}

pub(crate) async fn fetch_secret(
    provider: &dyn ClusterProvider,
    source: &Source,
    collector: &mut EntryCollector<'_>,
) -> Result<()> {
    let secret = provider.get_secret(&source.namespace, &source.name).await?;
    let provenance = Provenance::new(SourceType::Secret, &source.name, &source.namespace);

    collect_data(collector, secret_data(secret), "", &provenance)
}
