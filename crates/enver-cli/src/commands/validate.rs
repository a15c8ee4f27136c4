//! Validate command - check `.enver.yaml` without touching the cluster

use console::style;
use enver_core::config::DEFAULT_OUTPUT_DIRECTORY;
use enver_core::{EnverConfig, Source, SourceConfig, SourceKind, TransformChain};
use enver_kube::requires_cluster;
use std::collections::BTreeSet;
use std::path::Path;

use crate::commands::load_config;
use crate::error::{CliError, Result};

const CONTAINER_KINDS: [&str; 4] = ["Pod", "Deployment", "StatefulSet", "DaemonSet"];

#[derive(Debug, Default)]
struct Report {
    errors: Vec<String>,
    warnings: Vec<String>,
    sources: Vec<Source>,
}

fn label(config: &SourceConfig, index: usize) -> String {
    if config.name.is_empty() {
        format!("sources[{index}]")
    } else {
        format!("sources[{index}] ({})", config.name)
    }
}

fn check_source(report: &mut Report, config: &SourceConfig, index: usize) {
    let source = match Source::try_from(config.clone()) {
        Ok(source) => source,
        Err(e) => {
            report.errors.push(format!("{}: {e}", label(config, index)));
            return;
        }
    };

    // Chains are built against a scratch base; nothing is written here
    let scratch = Path::new(DEFAULT_OUTPUT_DIRECTORY);
    if let Err(e) = TransformChain::build(&source.transformations, scratch) {
        report.errors.push(format!("{}: {e}", label(config, index)));
    }

    if let SourceKind::Container(options) = &source.kind {
        if options.kind.is_empty() {
            report
                .errors
                .push(format!("{}: kind is required for Container sources", label(config, index)));
        } else if !CONTAINER_KINDS.contains(&options.kind.as_str()) {
            report.errors.push(format!(
                "{}: invalid kind {:?} (must be Pod, Deployment, StatefulSet, or DaemonSet)",
                label(config, index),
                options.kind
            ));
        }
    }

    report.sources.push(source);
}

fn check(config: &EnverConfig) -> Report {
    let mut report = Report::default();

    if config.sources.is_empty() {
        report.errors.push("no sources found".to_string());
    }
    for (index, source) in config.sources.iter().enumerate() {
        check_source(&mut report, source, index);
    }

    let declared: BTreeSet<&str> = config.contexts.iter().map(String::as_str).collect();
    let mut seen = BTreeSet::new();

    for execution in &config.executions {
        if execution.name.is_empty() {
            report.errors.push("execution without a name".to_string());
            continue;
        }
        if !seen.insert(execution.name.as_str()) {
            report
                .errors
                .push(format!("execution {:?} is declared more than once", execution.name));
        }

        for context in &execution.contexts {
            if !declared.is_empty() && !declared.contains(context.as_str()) {
                report.warnings.push(format!(
                    "execution {:?} selects undeclared context {:?}",
                    execution.name, context
                ));
            }
        }

        let has_kube_context = execution.kube_context.as_deref().is_some_and(|c| !c.is_empty());
        if !has_kube_context && requires_cluster(&report.sources, &execution.contexts) {
            report.errors.push(format!(
                "execution {:?} requires Kubernetes sources but no kube-context is specified",
                execution.name
            ));
        }
    }

    report
}

/// Run the validate command
pub fn run(config_path: &Path) -> Result<()> {
    println!(
        "{} Validating {}",
        style("→").blue(),
        config_path.display()
    );

    let config = load_config(config_path)?;
    let report = check(&config);

    for warning in &report.warnings {
        println!("  {} {}", style("⚠").yellow(), warning);
    }
    for error in &report.errors {
        println!("  {} {}", style("✗").red(), error);
    }

    if !report.errors.is_empty() {
        return Err(CliError::config_with_help(
            format!("{} error(s) in {}", report.errors.len(), config_path.display()),
            "fix the errors listed above",
        ));
    }

    println!(
        "{} Validation passed: {} source(s), {} execution(s)",
        style("✓").green().bold(),
        report.sources.len(),
        config.executions.len()
    );
    Ok(())
}
