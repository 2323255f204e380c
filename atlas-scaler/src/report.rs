use tracing::{error, info, warn};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterFailure {
    pub cluster: String,
    pub error: String,
}

/// Per-cluster outcome of one bulk action.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    pub modified: Vec<String>,
    /// Dry run only: changes that would have been requested.
    pub planned: Vec<String>,
    /// No target in the requested direction.
    pub skipped: Vec<String>,
    pub failed: Vec<ClusterFailure>,
}

impl RunReport {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn attempted(&self) -> usize {
        self.modified.len() + self.failed.len()
    }

    pub fn log_summary(&self, action: &str) {
        info!(
            "{} finished: modified={} planned={} skipped={} failed={}",
            action,
            self.modified.len(),
            self.planned.len(),
            self.skipped.len(),
            self.failed.len()
        );
        if !self.skipped.is_empty() {
            warn!("Skipped clusters: {}", self.skipped.join(", "));
        }
        for failure in &self.failed {
            error!("Failed cluster {}: {}", failure.cluster, failure.error);
        }
    }
}
