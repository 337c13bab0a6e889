use serde::Serialize;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

use crate::Result;
use crate::policy::Argon2Policy;

/// Named Argon2 cost profiles used as calibration seeds and benchmark inputs.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
    Serialize
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum CostProfile {
    /// Constrained hardware: t=4, 32 MiB, 1 lane.
    SmallDevice,
    /// General purpose: t=6, 64 MiB, 2 lanes.
    #[default]
    Balanced,
    /// Server default: t=8, 128 MiB, 2 lanes.
    Production,
    /// Sensitive credentials: t=10, 128 MiB, 3 lanes.
    HighSecurity,
    /// Memory-hard emphasis: t=4, 256 MiB, 1 lane.
    MemoryHeavy,
}

impl CostProfile {
    /// Returns every profile in declaration order.
    pub fn all() -> impl Iterator<Item = Self> {
        Self::iter()
    }

    /// Returns the number of passes over memory.
    pub fn time_cost(self) -> u32 {
        match self {
            Self::SmallDevice => 4,
            Self::Balanced => 6,
            Self::Production => 8,
            Self::HighSecurity => 10,
            Self::MemoryHeavy => 4,
        }
    }

    /// Returns the memory cost in KiB.
    pub fn memory_cost(self) -> u32 {
        match self {
            Self::SmallDevice => 32_768,
            Self::Balanced => 65_536,
            Self::Production | Self::HighSecurity => 131_072,
            Self::MemoryHeavy => 262_144,
        }
    }

    /// Returns the number of lanes.
    pub fn parallelism(self) -> u32 {
        match self {
            Self::SmallDevice | Self::MemoryHeavy => 1,
            Self::Balanced | Self::Production => 2,
            Self::HighSecurity => 3,
        }
    }

    /// Builds the Argon2 policy for this profile with default lengths.
    pub fn policy(self) -> Result<Argon2Policy> {
        Argon2Policy::builder()
            .with_time_cost(self.time_cost())
            .with_memory_cost(self.memory_cost())
            .with_parallelism(self.parallelism())
            .build_quiet()
    }

    /// Returns a human readable label, e.g. `balanced (t=6, m=65536, p=2)`.
    pub fn label(self) -> String {
        format!(
            "{self} (t={}, m={}, p={})",
            self.time_cost(),
            self.memory_cost(),
            self.parallelism()
        )
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn every_profile_is_a_valid_policy() -> anyhow::Result<()> {
        for profile in CostProfile::all() {
            let policy = profile.policy()?;
            assert_eq!(policy.time_cost(), profile.time_cost());
        }
        assert_eq!(CostProfile::all().count(), 5);
        Ok(())
    }

    #[test]
    fn names_are_kebab_case() -> anyhow::Result<()> {
        assert_eq!(CostProfile::HighSecurity.to_string(), "high-security");
        assert_eq!(CostProfile::from_str("small-device")?, CostProfile::SmallDevice);
        assert!(CostProfile::from_str("huge").is_err());
        Ok(())
    }

    #[test]
    fn label_includes_parameters() {
        assert_eq!(
            CostProfile::Balanced.label(),
            "balanced (t=6, m=65536, p=2)"
        );
    }
}
