//! Adjacent-tier scale paths.
//!
//! The up-table is the only hand-written data. The down-table is built once
//! as its inverse, so both directions share the same gaps: the top of each
//! family has no way up, the bottom has no way down, and free/shared tiers
//! appear in neither.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::InstanceTier::{self, *};

/// Each scalable tier and the tier immediately above it.
const UPGRADE_PATHS: &[(InstanceTier, InstanceTier)] = &[
    // General purpose
    (M10, M20),
    (M20, M30),
    (M30, M40),
    (M40, M50),
    (M50, M60),
    (M60, M80),
    (M80, M140),
    (M140, M200),
    (M200, M300),
    (M300, M400),
    (M400, M700),
    // Low CPU
    (R40, R50),
    (R50, R60),
    (R60, R80),
    (R80, R200),
    (R200, R300),
    (R300, R400),
    (R400, R700),
];

pub struct TierTable {
    up: HashMap<InstanceTier, InstanceTier>,
    down: HashMap<InstanceTier, InstanceTier>,
}

impl TierTable {
    fn build() -> Self {
        let up: HashMap<_, _> = UPGRADE_PATHS.iter().copied().collect();
        let down = up.iter().map(|(from, to)| (*to, *from)).collect();
        Self { up, down }
    }

    pub fn up(&self, tier: InstanceTier) -> Option<InstanceTier> {
        self.up.get(&tier).copied()
    }

    pub fn down(&self, tier: InstanceTier) -> Option<InstanceTier> {
        self.down.get(&tier).copied()
    }
}

pub fn table() -> &'static TierTable {
    static TABLE: OnceLock<TierTable> = OnceLock::new();
    TABLE.get_or_init(TierTable::build)
}

/// Next tier up, or `None` when `tier` is the top of its family (or unmapped).
pub fn size_up(tier: InstanceTier) -> Option<InstanceTier> {
    table().up(tier)
}

/// Next tier down, or `None` when `tier` is the bottom of its family (or unmapped).
pub fn size_down(tier: InstanceTier) -> Option<InstanceTier> {
    table().down(tier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn up_table_is_injective() {
        let t = table();
        assert_eq!(t.up.len(), UPGRADE_PATHS.len(), "duplicate source tier");
        assert_eq!(t.down.len(), t.up.len(), "two tiers scale up to the same target");
    }

    #[test]
    fn down_inverts_up() {
        for tier in InstanceTier::ALL {
            if let Some(up) = size_up(tier) {
                assert_eq!(size_down(up), Some(tier), "{} -> {} -> ?", tier, up);
            }
            if let Some(down) = size_down(tier) {
                assert_eq!(size_up(down), Some(tier), "{} -> {} -> ?", tier, down);
            }
        }
    }

    #[test]
    fn shared_tiers_have_no_paths() {
        for tier in InstanceTier::ALL.into_iter().filter(|t| t.is_shared()) {
            assert_eq!(size_up(tier), None);
            assert_eq!(size_down(tier), None);
        }
        assert_eq!(size_down(M10), None);
    }

    #[test]
    fn family_tops_have_no_up_path() {
        assert_eq!(size_up(M700), None);
        assert_eq!(size_up(R700), None);
        assert_eq!(size_down(R40), None);
    }

    #[test]
    fn legacy_size_is_unmapped() {
        assert_eq!(size_up(M100), None);
        assert_eq!(size_down(M100), None);
    }

    #[test]
    fn adjacent_steps() {
        assert_eq!(size_up(M30), Some(M40));
        assert_eq!(size_down(M40), Some(M30));
        assert_eq!(size_up(M80), Some(M140));
        assert_eq!(size_down(M140), Some(M80));
        assert_eq!(size_up(R80), Some(R200));
    }
}
