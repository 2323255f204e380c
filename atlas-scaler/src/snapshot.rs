use atlas_common::{size_down, size_up, InstanceTier, Topology};
use atlas_providers::inventory::ClusterRecord;
use tracing::warn;

/// Direction of an instance-size change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "Up",
            Direction::Down => "Down",
        }
    }
}

/// What the scaler needs to know about one eligible cluster, captured once
/// at listing time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterSnapshot {
    pub name: String,
    pub topology: Topology,
    pub provider_name: String,
    /// Raw `instanceSizeName`, kept even when it is not a known tier.
    pub current_size: String,
    pub size_up: Option<InstanceTier>,
    pub size_down: Option<InstanceTier>,
}

impl ClusterSnapshot {
    pub fn from_record(record: &ClusterRecord) -> Self {
        let current_size = record.provider_settings.instance_size_name.clone();
        let tier = record.instance_tier();
        if tier.is_none() {
            warn!(
                "Unrecognised instance size {} on cluster {}",
                current_size, record.name
            );
        }

        let up = tier.and_then(size_up);
        if up.is_none() {
            warn!("No upgrade path for {} ({})", record.name, current_size);
        }
        let down = tier.and_then(size_down);
        if down.is_none() {
            warn!("No downgrade path for {} ({})", record.name, current_size);
        }

        Self {
            name: record.name.clone(),
            topology: record.topology(),
            provider_name: record.provider_settings.provider_name.clone(),
            current_size,
            size_up: up,
            size_down: down,
        }
    }

    pub fn target(&self, direction: Direction) -> Option<InstanceTier> {
        match direction {
            Direction::Up => self.size_up,
            Direction::Down => self.size_down,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_common::ClusterState;
    use atlas_providers::inventory::ProviderSettings;

    fn record(name: &str, cluster_type: Option<&str>, size: &str) -> ClusterRecord {
        ClusterRecord {
            name: name.to_string(),
            cluster_type: cluster_type.map(|s| s.to_string()),
            state_name: ClusterState::Idle,
            provider_settings: ProviderSettings {
                provider_name: "AZURE".to_string(),
                instance_size_name: size.to_string(),
                backing_provider_name: None,
            },
        }
    }

    #[test]
    fn mid_family_tier_has_both_targets() {
        let s = ClusterSnapshot::from_record(&record("orders", Some("SHARDED"), "M30"));
        assert_eq!(s.name, "orders");
        assert_eq!(s.topology, Topology::Sharded);
        assert_eq!(s.provider_name, "AZURE");
        assert_eq!(s.current_size, "M30");
        assert_eq!(s.size_up, Some(InstanceTier::M40));
        assert_eq!(s.size_down, Some(InstanceTier::M20));
        assert_eq!(s.target(Direction::Up), Some(InstanceTier::M40));
        assert_eq!(s.target(Direction::Down), Some(InstanceTier::M20));
    }

    #[test]
    fn bottom_tier_can_still_scale_up() {
        let s = ClusterSnapshot::from_record(&record("events", Some("REPLICASET"), "M10"));
        assert_eq!(s.topology, Topology::ReplicaSet);
        assert_eq!(s.size_up, Some(InstanceTier::M20));
        assert_eq!(s.size_down, None);
    }

    #[test]
    fn top_tier_can_still_scale_down() {
        let s = ClusterSnapshot::from_record(&record("analytics", None, "R700"));
        assert_eq!(s.size_up, None);
        assert_eq!(s.size_down, Some(InstanceTier::R400));
    }

    #[test]
    fn unknown_size_has_no_targets() {
        let s = ClusterSnapshot::from_record(&record("nvme", None, "M40_NVME"));
        assert_eq!(s.current_size, "M40_NVME");
        assert_eq!(s.size_up, None);
        assert_eq!(s.size_down, None);
    }
}
