use std::time::Duration;

use anyhow::Result;
use atlas_common::TlsProtocol;
use atlas_scaler::cli::{self, Action, Args};
use atlas_scaler::provider_manager::ProviderManager;
use atlas_scaler::settings::Settings;
use atlas_scaler::ProjectScaler;
use clap::Parser;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    // Everything that can be rejected locally is checked before the first API call.
    let exclude = cli::parse_exclusions(&args.exclude)?;
    if !exclude.is_empty() {
        info!(
            "We received an exclude list with {} members, they will be excluded from the operation: {:?}",
            exclude.len(),
            exclude
        );
    }
    let settings = Settings::from_env();
    let provider = ProviderManager::get_provider(&settings)?;

    let mut project = ProjectScaler::new(provider, exclude).with_dry_run(args.dry_run);
    if args.dry_run {
        info!("Dry run: no cluster will be modified");
    }
    let count = project.get_clusters().await?.len();
    let delay = Duration::from_secs(args.secs);

    let report = match args.action {
        Action::ScaleUp => {
            info!("Scaling {} clusters Up, with a {} second delay!", count, args.secs);
            project.scale_all_up(delay).await?
        }
        Action::ScaleDown => {
            info!("Scaling {} clusters Down, with a {} second delay!", count, args.secs);
            project.scale_all_down(delay).await?
        }
        Action::Tls => {
            let protocol = args.tlsversion.map(TlsProtocol::from);
            info!(
                "Setting {} clusters to TLS: {}",
                count,
                protocol.map(|p| p.as_str()).unwrap_or("<none>")
            );
            project.change_tls_minimum(protocol, delay).await?
        }
    };

    report.log_summary(args.action.as_str());
    if report.has_failures() {
        anyhow::bail!(
            "{} of {} attempted clusters failed",
            report.failed.len(),
            report.attempted()
        );
    }
    Ok(())
}
