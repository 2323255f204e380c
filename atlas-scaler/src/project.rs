//! Bulk operations over every eligible cluster of one project.
//!
//! The scaler lists the project once, keeps a snapshot per eligible cluster
//! and walks that list in listing order for each action. Calls are strictly
//! sequential with a fixed pause between them; one cluster failing never
//! stops the others.

use std::collections::BTreeSet;
use std::time::Duration;

use atlas_common::{ClusterState, TlsProtocol};
use atlas_providers::inventory::ClusterRecord;
use atlas_providers::ClusterManager;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::error::ScaleError;
use crate::report::{ClusterFailure, RunReport};
use crate::snapshot::{ClusterSnapshot, Direction};

/// Listing state. Once `Listed`, the project is never listed again.
#[derive(Debug)]
pub enum ClusterList {
    NotListed,
    Listed(Vec<ClusterSnapshot>),
}

/// Why a cluster is left out of the run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    NotIdle(ClusterState),
    SharedTier,
    Excluded,
}

/// Idle, not a free/shared tenant, not excluded. State is checked first so a
/// cluster mid-transition is never touched whatever its tier or name.
pub fn check_eligibility(record: &ClusterRecord, exclude: &BTreeSet<String>) -> Eligibility {
    if record.state_name != ClusterState::Idle {
        return Eligibility::NotIdle(record.state_name);
    }
    if record.instance_tier().is_some_and(|t| t.is_shared()) {
        return Eligibility::SharedTier;
    }
    if exclude.contains(&record.name) {
        return Eligibility::Excluded;
    }
    Eligibility::Eligible
}

pub struct ProjectScaler {
    provider: Box<dyn ClusterManager>,
    exclude: BTreeSet<String>,
    clusters: ClusterList,
    dry_run: bool,
}

impl ProjectScaler {
    pub fn new(provider: Box<dyn ClusterManager>, exclude: BTreeSet<String>) -> Self {
        Self {
            provider,
            exclude,
            clusters: ClusterList::NotListed,
            dry_run: false,
        }
    }

    /// Narrate every change without calling the modify endpoints.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn cluster_list(&self) -> &ClusterList {
        &self.clusters
    }

    fn snapshots(&self) -> &[ClusterSnapshot] {
        match &self.clusters {
            ClusterList::Listed(snapshots) => snapshots,
            ClusterList::NotListed => &[],
        }
    }

    /// List and filter the project on first call; later calls reuse the result.
    pub async fn get_clusters(&mut self) -> Result<&[ClusterSnapshot], ScaleError> {
        if let ClusterList::NotListed = self.clusters {
            let snapshots = self.list_eligible().await?;
            self.clusters = ClusterList::Listed(snapshots);
        }
        Ok(self.snapshots())
    }

    async fn list_eligible(&self) -> Result<Vec<ClusterSnapshot>, ScaleError> {
        let records = self
            .provider
            .list_clusters()
            .await
            .map_err(ScaleError::Listing)?;

        if self.exclude.is_empty() {
            debug!("No exclude list");
        } else {
            info!("Processing exclude list");
        }

        let mut snapshots = Vec::new();
        for record in &records {
            match check_eligibility(record, &self.exclude) {
                Eligibility::Eligible => snapshots.push(ClusterSnapshot::from_record(record)),
                Eligibility::Excluded => {
                    info!(
                        "Not adding {} to the list of clusters to be processed.",
                        record.name
                    );
                }
                Eligibility::NotIdle(state) => {
                    debug!("Skipping {}: state is {}", record.name, state.as_str());
                }
                Eligibility::SharedTier => {
                    debug!(
                        "Skipping {}: {} is a shared tier",
                        record.name, record.provider_settings.instance_size_name
                    );
                }
            }
        }

        info!(
            "The cluster list now has {} members ({} listed)",
            snapshots.len(),
            records.len()
        );
        Ok(snapshots)
    }

    pub async fn scale_all_up(&mut self, delay: Duration) -> Result<RunReport, ScaleError> {
        self.scale_all(Direction::Up, delay).await
    }

    pub async fn scale_all_down(&mut self, delay: Duration) -> Result<RunReport, ScaleError> {
        self.scale_all(Direction::Down, delay).await
    }

    async fn scale_all(
        &mut self,
        direction: Direction,
        delay: Duration,
    ) -> Result<RunReport, ScaleError> {
        self.get_clusters().await?;
        let mut report = RunReport::default();

        for cluster in self.snapshots() {
            let Some(target) = cluster.target(direction) else {
                warn!(
                    "No scale {} path for cluster {} ({}), skipping",
                    direction.as_str(),
                    cluster.name,
                    cluster.current_size
                );
                report.skipped.push(cluster.name.clone());
                continue;
            };

            info!(
                "Scaling {} cluster {} from {} to {}",
                direction.as_str(),
                cluster.name,
                cluster.current_size,
                target
            );
            if self.dry_run {
                report.planned.push(cluster.name.clone());
                continue;
            }

            match self
                .provider
                .modify_cluster_instance_size(&cluster.name, &cluster.provider_name, target)
                .await
            {
                Ok(()) => report.modified.push(cluster.name.clone()),
                Err(e) => {
                    error!(
                        "Scaling {} cluster {} to {} failed: {:#}",
                        direction.as_str(),
                        cluster.name,
                        target,
                        e
                    );
                    report.failed.push(ClusterFailure {
                        cluster: cluster.name.clone(),
                        error: format!("{:#}", e),
                    });
                }
            }
            pause(delay).await;
        }

        Ok(report)
    }

    /// A missing version is rejected before anything is listed or modified.
    pub async fn change_tls_minimum(
        &mut self,
        version: Option<TlsProtocol>,
        delay: Duration,
    ) -> Result<RunReport, ScaleError> {
        let protocol = version.ok_or(ScaleError::MissingTlsVersion)?;
        self.get_clusters().await?;
        let mut report = RunReport::default();

        for cluster in self.snapshots() {
            info!(
                "Setting minimum TLS protocol of cluster {} to {}",
                cluster.name, protocol
            );
            if self.dry_run {
                report.planned.push(cluster.name.clone());
                continue;
            }

            match self.provider.modify_cluster_tls(&cluster.name, protocol).await {
                Ok(()) => report.modified.push(cluster.name.clone()),
                Err(e) => {
                    error!(
                        "Setting minimum TLS of cluster {} to {} failed: {:#}",
                        cluster.name, protocol, e
                    );
                    report.failed.push(ClusterFailure {
                        cluster: cluster.name.clone(),
                        error: format!("{:#}", e),
                    });
                }
            }
            pause(delay).await;
        }

        Ok(report)
    }
}

async fn pause(delay: Duration) {
    if delay.is_zero() {
        return;
    }
    info!("Pausing {} seconds", delay.as_secs_f64());
    sleep(delay).await;
}
