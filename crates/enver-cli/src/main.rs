//! enver - materialize Kubernetes configuration into local .env files

use clap::{Parser, Subcommand};
use enver_core::config::{CONFIG_FILE, DEFAULT_OUTPUT_DIRECTORY, DEFAULT_OUTPUT_NAME};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod display;
mod error;
mod exit_codes;
mod gitignore;
mod output;
mod runner;

use commands::generate::GenerateOptions;
use error::Result;

#[derive(Parser)]
#[command(name = "enver")]
#[command(author = "Enver Contributors")]
#[command(version)]
#[command(about = "Materialize Kubernetes ConfigMaps, Secrets and workload environments into .env files", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one .env file from the configured sources
    Generate {
        /// Context for filtering sources (can be repeated)
        #[arg(short = 'c', long = "context")]
        contexts: Vec<String>,

        /// Kubeconfig context (default: current context)
        #[arg(long, env = "ENVER_KUBE_CONTEXT")]
        kube_context: Option<String>,

        /// Output file name
        #[arg(long, default_value = DEFAULT_OUTPUT_NAME)]
        output_name: String,

        /// Output directory
        #[arg(long, default_value = DEFAULT_OUTPUT_DIRECTORY)]
        output_directory: String,

        /// Configuration file
        #[arg(long, default_value = CONFIG_FILE)]
        config: PathBuf,

        /// Append the output directory to .gitignore when it is not ignored
        #[arg(long)]
        gitignore: bool,
    },

    /// Run executions declared in .enver.yaml
    Execute {
        /// Execution name to run (can be repeated)
        #[arg(short = 'n', long = "name")]
        names: Vec<String>,

        /// Run all executions
        #[arg(long, conflicts_with = "names")]
        all: bool,

        /// Configuration file
        #[arg(long, default_value = CONFIG_FILE)]
        config: PathBuf,

        /// Append output directories to .gitignore when they are not ignored
        #[arg(long)]
        gitignore: bool,
    },

    /// Check the configuration without contacting the cluster
    Validate {
        /// Configuration file
        #[arg(long, default_value = CONFIG_FILE)]
        config: PathBuf,
    },
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Generate {
            contexts,
            kube_context,
            output_name,
            output_directory,
            config,
            gitignore,
        } => {
            commands::generate::run(GenerateOptions {
                config: &config,
                contexts: &contexts,
                kube_context: kube_context.as_deref(),
                output_name: &output_name,
                output_directory: &output_directory,
                gitignore,
            })
            .await
        }

        Commands::Execute {
            names,
            all,
            config,
            gitignore,
        } => commands::execute::run(&config, &names, all, gitignore).await,

        Commands::Validate { config } => commands::validate::run(&config),
    }
}

#[tokio::main]
async fn main() {
    // Setup miette for nice error display; aggregated errors keep one line per execution
    miette::set_panic_hook();
    let _ = miette::set_hook(Box::new(|_| {
        Box::new(miette::MietteHandlerOpts::new().wrap_lines(false).build())
    }));

    let cli = Cli::parse();
    init_tracing(cli.debug);

    if let Err(err) = dispatch(cli.command).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}
