//! PD Discovery
//!
//! Discovery service for operator-managed PD clusters. Hands every
//! replica its bootstrap argument: `--initial-cluster` while the
//! cluster is founding, `--join` once it has formed.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use kube::CustomResourceExt;
use pd_discovery::crds::PdCluster;
use pd_discovery::discovery::{Discovery, NAMESPACE_ENV};
use pd_discovery::refresh::KubeRefresher;
use pd_discovery::server::{self, AppState};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pd-discovery")]
#[command(about = "Bootstrap discovery service for operator-managed PD clusters")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print CRD manifests to stdout
    Crds,
    /// Run the discovery server
    Run {
        /// Address to serve the discovery API on
        #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:10261")]
        listen_addr: String,

        /// PEM bundle to trust when the PD tier serves https
        #[arg(long, env = "CLUSTER_CA_FILE")]
        cluster_ca_file: Option<PathBuf>,

        /// Timeout for PD members API requests, in seconds
        #[arg(long, env = "MEMBERS_TIMEOUT_SECS", default_value_t = 5)]
        members_timeout_secs: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let cli = Cli::parse();

    match cli.command {
        Commands::Crds => {
            print_crds();
            Ok(())
        }
        Commands::Run {
            listen_addr,
            cluster_ca_file,
            members_timeout_secs,
        } => {
            run_server(
                &listen_addr,
                cluster_ca_file.as_deref(),
                Duration::from_secs(members_timeout_secs),
            )
            .await
        }
    }
}

fn print_crds() {
    println!("---");
    println!(
        "{}",
        serde_yaml::to_string(&PdCluster::crd()).expect("Failed to serialize PdCluster CRD")
    );
}

async fn run_server(
    listen_addr: &str,
    cluster_ca_file: Option<&Path>,
    members_timeout: Duration,
) -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    info!("Starting pd-discovery");

    // The address parser checks every request against this value, so
    // fail fast if the deployment forgot to set it.
    let namespace = std::env::var(NAMESPACE_ENV).with_context(|| {
        format!("{NAMESPACE_ENV} must be set to the namespace this instance serves")
    })?;
    info!(namespace = %namespace, "Serving discovery for namespace");

    let cluster_ca = match cluster_ca_file {
        Some(path) => Some(std::fs::read(path).with_context(|| {
            format!("failed to read cluster CA bundle {}", path.display())
        })?),
        None => None,
    };

    let client = kube::Client::try_default().await?;
    info!("Connected to Kubernetes");

    let refresher = KubeRefresher::new(client, members_timeout, cluster_ca.as_deref())?;
    let state = AppState {
        discovery: Arc::new(Discovery::new(refresher)),
    };
    let app = server::create_router(state);

    info!(listen_addr = %listen_addr, "Starting discovery API server");
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl-c, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
