use std::collections::BTreeSet;

use atlas_common::TlsProtocol;
use clap::{Parser, ValueEnum};

use crate::error::ConfigError;

// Atlas cluster names: ASCII letters, digits and hyphens, at most 64 characters.
const MAX_CLUSTER_NAME_LEN: usize = 64;

#[derive(Parser, Debug)]
#[command(
    name = "atlas-scaler",
    about = "Scale up or scale down all clusters in an Atlas project",
    version
)]
pub struct Args {
    /// Bulk action applied to every eligible cluster
    #[arg(value_enum)]
    pub action: Action,

    /// The number of seconds to delay between clusters
    #[arg(long, default_value_t = 1)]
    pub secs: u64,

    /// The TLS version to set on all clusters (required for TLS)
    #[arg(long, value_enum, required_if_eq("action", "TLS"))]
    pub tlsversion: Option<TlsVersion>,

    /// A comma-separated list of cluster names to exclude
    #[arg(long, num_args = 1..)]
    pub exclude: Vec<String>,

    /// Log the changes that would be made without modifying any cluster
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Action {
    #[value(name = "SCALEUP")]
    ScaleUp,
    #[value(name = "SCALEDOWN")]
    ScaleDown,
    #[value(name = "TLS")]
    Tls,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::ScaleUp => "SCALEUP",
            Action::ScaleDown => "SCALEDOWN",
            Action::Tls => "TLS",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum TlsVersion {
    #[value(name = "TLS1_0")]
    Tls1_0,
    #[value(name = "TLS1_1")]
    Tls1_1,
    #[value(name = "TLS1_2")]
    Tls1_2,
    #[value(name = "TLS1_3")]
    Tls1_3,
}

impl From<TlsVersion> for TlsProtocol {
    fn from(v: TlsVersion) -> Self {
        match v {
            TlsVersion::Tls1_0 => TlsProtocol::Tls1_0,
            TlsVersion::Tls1_1 => TlsProtocol::Tls1_1,
            TlsVersion::Tls1_2 => TlsProtocol::Tls1_2,
            TlsVersion::Tls1_3 => TlsProtocol::Tls1_3,
        }
    }
}

pub fn is_valid_cluster_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_CLUSTER_NAME_LEN
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Flatten `--exclude` tokens into a set of cluster names.
///
/// - Each token may hold several comma-separated names
/// - Whitespace is trimmed and empty entries are dropped
/// - Anything that cannot be a cluster name is a configuration error
pub fn parse_exclusions(tokens: &[String]) -> Result<BTreeSet<String>, ConfigError> {
    let mut out = BTreeSet::new();
    for name in tokens
        .iter()
        .flat_map(|t| t.split(','))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
    {
        if !is_valid_cluster_name(name) {
            return Err(ConfigError::InvalidValue {
                var: "--exclude".to_string(),
                value: name.to_string(),
            });
        }
        out.insert(name.to_string());
    }
    Ok(out)
}
