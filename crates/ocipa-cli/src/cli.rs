use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use ocipa_core::USER_OCID_PREFIX;
use serde::Deserialize;

#[derive(Parser, Debug)]
#[command(name = "ocipa")]
#[command(about = "List the OCI policy statements that apply to a user through group membership")]
#[command(version)]
pub struct Cli {
    /// User OCID to analyze (e.g. ocid1.user.oc1..aaaa...)
    #[arg(value_parser = parse_user_ocid)]
    pub user_id: String,

    /// OCI config file (defaults to ~/.oci/config)
    #[arg(long, env = "OCI_CONFIG_FILE")]
    pub oci_config: Option<PathBuf>,

    /// OCI config profile
    #[arg(short, long, env = "OCI_CLI_PROFILE", default_value = "DEFAULT")]
    pub profile: String,

    /// ocipa settings file (defaults to ~/.ocipa/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long)]
    pub format: Option<OutputFormat>,

    /// Number of compartments whose policies are fetched in parallel
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Identity endpoint override (e.g. https://identity.us-ashburn-1.oraclecloud.com/20160918)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Analyze a tenancy snapshot (JSON) instead of calling OCI; the OCI config is not read
    #[arg(long, conflicts_with = "endpoint")]
    pub snapshot: Option<PathBuf>,

    /// Log level filter (overridden by RUST_LOG)
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Sectioned console report
    #[default]
    Text,
    /// One row per statement
    Table,
    /// Machine-readable report
    Json,
}

fn parse_user_ocid(value: &str) -> Result<String, String> {
    if value.starts_with(USER_OCID_PREFIX) {
        Ok(value.to_string())
    } else {
        Err(format!(
            "expected a user OCID starting with '{USER_OCID_PREFIX}'"
        ))
    }
}
