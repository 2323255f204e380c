use anyhow::Result;
use async_trait::async_trait;
use atlas_common::{InstanceTier, TlsProtocol};

/// Seam to the cluster-management API of a database-as-a-service project.
///
/// Implementations are scoped to one project; callers never pass the project id.
#[async_trait]
pub trait ClusterManager: Send + Sync {
    /// List every cluster in the project, following pagination to the end.
    async fn list_clusters(&self) -> Result<Vec<inventory::ClusterRecord>>;

    /// Request a new instance size. `provider_name` is the cluster's current
    /// cloud provider (e.g. "AWS"); the API needs it alongside the new size.
    async fn modify_cluster_instance_size(
        &self,
        cluster: &str,
        provider_name: &str,
        new_size: InstanceTier,
    ) -> Result<()>;

    async fn modify_cluster_tls(&self, cluster: &str, protocol: TlsProtocol) -> Result<()>;
}

pub mod inventory {
    use atlas_common::{ClusterState, InstanceTier, Topology};
    use serde::{Deserialize, Serialize};

    /// One cluster as returned by the listing endpoint. Unknown fields are ignored.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ClusterRecord {
        pub name: String,
        #[serde(default)]
        pub cluster_type: Option<String>,
        pub state_name: ClusterState,
        pub provider_settings: ProviderSettings,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ProviderSettings {
        pub provider_name: String,
        pub instance_size_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub backing_provider_name: Option<String>,
    }

    impl ClusterRecord {
        pub fn topology(&self) -> Topology {
            Topology::from_cluster_type(self.cluster_type.as_deref())
        }

        /// `None` when the label is not a size this tool knows about.
        pub fn instance_tier(&self) -> Option<InstanceTier> {
            InstanceTier::parse(&self.provider_settings.instance_size_name)
        }
    }
}

#[cfg(feature = "mock")]
pub mod mock;

#[cfg(feature = "atlas")]
pub mod atlas;
