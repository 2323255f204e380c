use crate::{inventory, ClusterManager};
use anyhow::Result;
use async_trait::async_trait;
use atlas_common::{ClusterState, InstanceTier, TlsProtocol};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

/// A modification request received by the mock, in call order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MockCall {
    ResizeInstance {
        cluster: String,
        provider_name: String,
        new_size: InstanceTier,
    },
    ModifyTls {
        cluster: String,
        protocol: TlsProtocol,
    },
}

#[derive(Default)]
struct MockState {
    clusters: Vec<inventory::ClusterRecord>,
    failing: HashSet<String>,
    fail_listing: bool,
    list_calls: usize,
    calls: Vec<MockCall>,
}

/// In-memory project. Clones share state, so a test can keep a handle while
/// the scaler owns another.
#[derive(Clone, Default)]
pub struct MockProvider {
    state: Arc<Mutex<MockState>>,
}

impl MockProvider {
    pub fn new(clusters: Vec<inventory::ClusterRecord>) -> Self {
        let provider = Self::default();
        provider.lock().clusters = clusters;
        provider
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A poisoned lock only means another test thread panicked mid-call.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Every modify call for `cluster` fails from now on.
    pub fn fail_for(&self, cluster: &str) {
        self.lock().failing.insert(cluster.to_string());
    }

    /// `list_clusters` fails from now on.
    pub fn fail_listing(&self) {
        self.lock().fail_listing = true;
    }

    pub fn list_calls(&self) -> usize {
        self.lock().list_calls
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }

    pub fn clusters(&self) -> Vec<inventory::ClusterRecord> {
        self.lock().clusters.clone()
    }
}

/// Build a replica-set record on AWS.
pub fn cluster(name: &str, state: ClusterState, size: &str) -> inventory::ClusterRecord {
    inventory::ClusterRecord {
        name: name.to_string(),
        cluster_type: Some("REPLICASET".to_string()),
        state_name: state,
        provider_settings: inventory::ProviderSettings {
            provider_name: "AWS".to_string(),
            instance_size_name: size.to_string(),
            backing_provider_name: None,
        },
    }
}

#[async_trait]
impl ClusterManager for MockProvider {
    async fn list_clusters(&self) -> Result<Vec<inventory::ClusterRecord>> {
        let mut state = self.lock();
        state.list_calls += 1;
        if state.fail_listing {
            return Err(anyhow::anyhow!("mock: listing unavailable"));
        }
        Ok(state.clusters.clone())
    }

    async fn modify_cluster_instance_size(
        &self,
        cluster: &str,
        provider_name: &str,
        new_size: InstanceTier,
    ) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(MockCall::ResizeInstance {
            cluster: cluster.to_string(),
            provider_name: provider_name.to_string(),
            new_size,
        });
        if state.failing.contains(cluster) {
            return Err(anyhow::anyhow!("mock: resize rejected for {}", cluster));
        }
        let record = state
            .clusters
            .iter_mut()
            .find(|c| c.name == cluster)
            .ok_or_else(|| anyhow::anyhow!("mock: no cluster named {}", cluster))?;
        record.provider_settings.instance_size_name = new_size.as_str().to_string();
        record.state_name = ClusterState::Updating;
        info!("[Mock] {} resizing to {}", cluster, new_size);
        Ok(())
    }

    async fn modify_cluster_tls(&self, cluster: &str, protocol: TlsProtocol) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(MockCall::ModifyTls {
            cluster: cluster.to_string(),
            protocol,
        });
        if state.failing.contains(cluster) {
            return Err(anyhow::anyhow!("mock: TLS change rejected for {}", cluster));
        }
        if !state.clusters.iter().any(|c| c.name == cluster) {
            return Err(anyhow::anyhow!("mock: no cluster named {}", cluster));
        }
        info!("[Mock] {} minimum TLS set to {}", cluster, protocol);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resize_updates_the_stored_record() {
        let mock = MockProvider::new(vec![cluster("a", ClusterState::Idle, "M30")]);
        mock.modify_cluster_instance_size("a", "AWS", InstanceTier::M40)
            .await
            .unwrap();

        let clusters = mock.clusters();
        let a = &clusters[0];
        assert_eq!(a.instance_tier(), Some(InstanceTier::M40));
        assert_eq!(a.state_name, ClusterState::Updating);
        assert_eq!(mock.calls().len(), 1);
    }

    #[tokio::test]
    async fn failing_cluster_records_the_attempt() {
        let mock = MockProvider::new(vec![cluster("a", ClusterState::Idle, "M30")]);
        mock.fail_for("a");
        let err = mock
            .modify_cluster_tls("a", TlsProtocol::Tls1_2)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("rejected"));
        assert_eq!(
            mock.calls(),
            vec![MockCall::ModifyTls {
                cluster: "a".to_string(),
                protocol: TlsProtocol::Tls1_2
            }]
        );
    }

    #[tokio::test]
    async fn clones_share_state() {
        let mock = MockProvider::new(vec![]);
        let handle = mock.clone();
        mock.list_clusters().await.unwrap();
        assert_eq!(handle.list_calls(), 1);
    }
}
