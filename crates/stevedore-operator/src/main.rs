//! Stevedore operator - installs remote manifest bundles declared by Installation resources

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use kube::CustomResourceExt;
use stevedore_core::{Installation, InstallerConfig};
use stevedore_engine::KustomizeBuilder;
use stevedore_kube::{KubeCluster, Outcome, Reconciler};
use stevedore_repo::HttpBundleSource;

mod controller;
mod error;
mod exit_codes;
mod logging;

use error::OperatorError;
use logging::LogFormat;

/// Reconciler wired to a live cluster, HTTP fetching and the kustomize binary
pub type OperatorReconciler = Reconciler<KubeCluster, HttpBundleSource, KustomizeBuilder>;

#[derive(Parser)]
#[command(name = "stevedore-operator")]
#[command(version)]
#[command(about = "Installs remote manifest bundles declared by Installation resources", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Installer configuration file (YAML)
    #[arg(long, global = true, env = "STEVEDORE_CONFIG")]
    config: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the controller over all Installations
    Run,

    /// Reconcile a single Installation once and exit
    Reconcile {
        /// Installation name
        name: String,
    },

    /// Print the Installation CustomResourceDefinition
    Crd,
}

#[tokio::main]
async fn main() {
    miette::set_panic_hook();

    let cli = Cli::parse();

    if let Err(err) = execute(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

async fn execute(cli: Cli) -> Result<(), OperatorError> {
    match cli.command {
        Commands::Crd => {
            print!("{}", serde_yaml::to_string(&Installation::crd())?);
            Ok(())
        }

        Commands::Run => {
            logging::init(cli.log_format)?;
            let reconciler = build_reconciler(cli.config).await?;
            controller::run(reconciler).await
        }

        Commands::Reconcile { name } => {
            logging::init(cli.log_format)?;
            let reconciler = build_reconciler(cli.config).await?;
            let outcome = reconciler.reconcile(&name).await?;

            if let Outcome::Failed { error, .. } = &outcome {
                return Err(OperatorError::reconcile(&name, error));
            }
            println!("{}: {}", name, outcome);
            Ok(())
        }
    }
}

async fn build_reconciler(
    config_path: Option<PathBuf>,
) -> Result<OperatorReconciler, OperatorError> {
    let config = Arc::new(InstallerConfig::load(config_path.as_deref())?);
    let version = std::env::var("VERSION").ok();

    tracing::info!(
        version = version.as_deref().unwrap_or("unknown"),
        fetch_timeout = ?config.fetch_timeout,
        "Starting stevedore operator"
    );

    let cluster = KubeCluster::try_default().await?;
    let source = HttpBundleSource::new(config.fetch_timeout)?;
    let builder = KustomizeBuilder::new(config.overlay.kustomize_binary.clone());

    Ok(Reconciler::new(cluster, source, builder, config).with_version(version))
}
