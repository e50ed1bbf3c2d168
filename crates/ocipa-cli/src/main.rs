mod cli;
mod config;
mod logging;
mod output;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use ocipa_core::{AnalyzerConfig, IdentityGateway, InMemoryGateway, PolicyAnalyzer, TenancySnapshot};
use ocipa_oci::{ClientOptions, IdentityClient, OciProfile};
use tracing::info;

use cli::Cli;
use output::{print_error, print_interrupted, print_report};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        print_error(&format!("Error during analysis: {e:#}"));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut settings = config::load(cli.config.as_deref())?;
    settings.apply_cli(&cli);
    logging::init_tracing(&settings.log_level);

    let (gateway, tenancy_id) = connect(&cli, &settings)?;
    let analyzer = PolicyAnalyzer::new(gateway, tenancy_id).with_config(AnalyzerConfig {
        policy_fetch_concurrency: settings.concurrency,
    });
    info!(tenancy_id = %analyzer.tenancy_id(), "Connected to tenancy");

    tokio::select! {
        report = analyzer.analyze(&cli.user_id) => {
            print_report(&report, settings.format)?;
        }
        _ = tokio::signal::ctrl_c() => {
            print_interrupted();
        }
    }

    Ok(())
}

/// Build the identity gateway, either from a snapshot file or from the OCI config profile.
fn connect(cli: &Cli, settings: &config::Settings) -> Result<(Arc<dyn IdentityGateway>, String)> {
    if let Some(path) = &cli.snapshot {
        let snapshot = TenancySnapshot::from_file(path)
            .with_context(|| format!("Failed to load snapshot {}", path.display()))?;
        let tenancy_id = snapshot.tenancy_id.clone();
        return Ok((Arc::new(InMemoryGateway::new(snapshot)), tenancy_id));
    }

    let path = match &cli.oci_config {
        Some(path) => path.clone(),
        None => OciProfile::default_config_path()
            .context("Cannot determine home directory for ~/.oci/config")?,
    };
    let profile = OciProfile::load(&path, &cli.profile)
        .context("Error initializing OCI clients")?;
    let options = ClientOptions {
        endpoint: settings.endpoint.clone(),
        timeout: Duration::from_secs(settings.timeout_secs),
    };
    let client = IdentityClient::from_profile(&profile, &options)
        .context("Error initializing OCI clients")?;
    info!(profile = %profile.name, endpoint = %client.base_url(), "Using OCI Identity endpoint");

    Ok((Arc::new(client), profile.tenancy.clone()))
}
