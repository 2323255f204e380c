use serde::{Deserialize, Serialize};

pub mod tiers;

pub use tiers::{size_down, size_up};

// --- Enums ---

/// Provisioned instance size of a cluster, as labelled by Atlas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InstanceTier {
    // Free / shared tenants
    M0,
    M2,
    M5,
    // General purpose
    M10,
    M20,
    M30,
    M40,
    M50,
    M60,
    M80,
    M100, // Legacy size, no longer offered for new clusters
    M140,
    M200,
    M300,
    M400,
    M700,
    // Low CPU
    R40,
    R50,
    R60,
    R80,
    R200,
    R300,
    R400,
    R700,
}

impl InstanceTier {
    pub const ALL: [InstanceTier; 24] = [
        InstanceTier::M0,
        InstanceTier::M2,
        InstanceTier::M5,
        InstanceTier::M10,
        InstanceTier::M20,
        InstanceTier::M30,
        InstanceTier::M40,
        InstanceTier::M50,
        InstanceTier::M60,
        InstanceTier::M80,
        InstanceTier::M100,
        InstanceTier::M140,
        InstanceTier::M200,
        InstanceTier::M300,
        InstanceTier::M400,
        InstanceTier::M700,
        InstanceTier::R40,
        InstanceTier::R50,
        InstanceTier::R60,
        InstanceTier::R80,
        InstanceTier::R200,
        InstanceTier::R300,
        InstanceTier::R400,
        InstanceTier::R700,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceTier::M0 => "M0",
            InstanceTier::M2 => "M2",
            InstanceTier::M5 => "M5",
            InstanceTier::M10 => "M10",
            InstanceTier::M20 => "M20",
            InstanceTier::M30 => "M30",
            InstanceTier::M40 => "M40",
            InstanceTier::M50 => "M50",
            InstanceTier::M60 => "M60",
            InstanceTier::M80 => "M80",
            InstanceTier::M100 => "M100",
            InstanceTier::M140 => "M140",
            InstanceTier::M200 => "M200",
            InstanceTier::M300 => "M300",
            InstanceTier::M400 => "M400",
            InstanceTier::M700 => "M700",
            InstanceTier::R40 => "R40",
            InstanceTier::R50 => "R50",
            InstanceTier::R60 => "R60",
            InstanceTier::R80 => "R80",
            InstanceTier::R200 => "R200",
            InstanceTier::R300 => "R300",
            InstanceTier::R400 => "R400",
            InstanceTier::R700 => "R700",
        }
    }

    /// Case-insensitive parse of an Atlas `instanceSizeName` label.
    pub fn parse(s: &str) -> Option<Self> {
        let label = s.trim().to_ascii_uppercase();
        Self::ALL.into_iter().find(|t| t.as_str() == label)
    }

    /// Free and shared tenants cannot be resized through the instance-size API.
    pub fn is_shared(&self) -> bool {
        matches!(self, InstanceTier::M0 | InstanceTier::M2 | InstanceTier::M5)
    }
}

impl std::fmt::Display for InstanceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cluster lifecycle state (`stateName`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClusterState {
    Idle,
    Creating,
    Updating,
    Deleting,
    Deleted,
    Repairing,
    #[serde(other)]
    Unknown,
}

impl ClusterState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterState::Idle => "IDLE",
            ClusterState::Creating => "CREATING",
            ClusterState::Updating => "UPDATING",
            ClusterState::Deleting => "DELETING",
            ClusterState::Deleted => "DELETED",
            ClusterState::Repairing => "REPAIRING",
            ClusterState::Unknown => "UNKNOWN",
        }
    }
}

/// Whether a cluster is sharded or a single replica set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Topology {
    Sharded,
    ReplicaSet,
}

impl Topology {
    /// Only an explicit `SHARDED` cluster type counts as sharded.
    pub fn from_cluster_type(cluster_type: Option<&str>) -> Self {
        match cluster_type {
            Some("SHARDED") => Topology::Sharded,
            _ => Topology::ReplicaSet,
        }
    }
}

/// Lowest TLS version a cluster accepts for client connections.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TlsProtocol {
    #[serde(rename = "TLS1_0")]
    Tls1_0,
    #[serde(rename = "TLS1_1")]
    Tls1_1,
    #[serde(rename = "TLS1_2")]
    Tls1_2,
    #[serde(rename = "TLS1_3")]
    Tls1_3,
}

impl TlsProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            TlsProtocol::Tls1_0 => "TLS1_0",
            TlsProtocol::Tls1_1 => "TLS1_1",
            TlsProtocol::Tls1_2 => "TLS1_2",
            TlsProtocol::Tls1_3 => "TLS1_3",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "TLS1_0" => Some(TlsProtocol::Tls1_0),
            "TLS1_1" => Some(TlsProtocol::Tls1_1),
            "TLS1_2" => Some(TlsProtocol::Tls1_2),
            "TLS1_3" => Some(TlsProtocol::Tls1_3),
            _ => None,
        }
    }
}

impl std::fmt::Display for TlsProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_parse_roundtrip() {
        for tier in InstanceTier::ALL {
            assert_eq!(InstanceTier::parse(tier.as_str()), Some(tier));
            assert_eq!(InstanceTier::parse(&tier.as_str().to_lowercase()), Some(tier));
        }
        assert_eq!(InstanceTier::parse("M40_NVME"), None);
        assert_eq!(InstanceTier::parse(""), None);
    }

    #[test]
    fn shared_tiers() {
        assert!(InstanceTier::M0.is_shared());
        assert!(InstanceTier::M2.is_shared());
        assert!(InstanceTier::M5.is_shared());
        assert!(!InstanceTier::M10.is_shared());
        assert!(!InstanceTier::R40.is_shared());
    }

    #[test]
    fn state_deserializes_unknown_labels() {
        let idle: ClusterState = serde_json::from_str("\"IDLE\"").unwrap();
        assert_eq!(idle, ClusterState::Idle);
        let repairing: ClusterState = serde_json::from_str("\"REPAIRING\"").unwrap();
        assert_eq!(repairing, ClusterState::Repairing);
        let other: ClusterState = serde_json::from_str("\"PAUSED_SOMEHOW\"").unwrap();
        assert_eq!(other, ClusterState::Unknown);
    }

    #[test]
    fn topology_from_cluster_type() {
        assert_eq!(Topology::from_cluster_type(Some("SHARDED")), Topology::Sharded);
        assert_eq!(Topology::from_cluster_type(Some("REPLICASET")), Topology::ReplicaSet);
        assert_eq!(Topology::from_cluster_type(Some("GEOSHARDED")), Topology::ReplicaSet);
        assert_eq!(Topology::from_cluster_type(None), Topology::ReplicaSet);
    }

    #[test]
    fn tls_protocol_labels() {
        for (s, p) in [
            ("TLS1_0", TlsProtocol::Tls1_0),
            ("TLS1_1", TlsProtocol::Tls1_1),
            ("TLS1_2", TlsProtocol::Tls1_2),
            ("TLS1_3", TlsProtocol::Tls1_3),
        ] {
            assert_eq!(TlsProtocol::parse(s), Some(p));
            assert_eq!(p.as_str(), s);
            assert_eq!(serde_json::to_string(&p).unwrap(), format!("\"{}\"", s));
        }
        assert_eq!(TlsProtocol::parse("tls1_2"), None);
    }
}
