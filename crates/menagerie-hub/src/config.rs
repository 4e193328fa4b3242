//! Hub configuration

use serde::{Deserialize, Serialize};

/// Runtime configuration for the hub
///
/// # Example
///
/// ```
/// use menagerie_hub::HubConfig;
///
/// let config = HubConfig::default();
/// assert_eq!(config.maintenance_poll_ms, 100);
///
/// let seeded = HubConfig::with_seed(42);
/// assert_eq!(seeded.rng_seed, 42);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    /// How long command admission sleeps between maintenance-flag polls
    pub maintenance_poll_ms: u64,
    /// Seed for the dispatcher's deterministic RNG
    pub rng_seed: u64,
}

impl HubConfig {
    /// Configuration with a specific RNG seed
    pub fn with_seed(rng_seed: u64) -> Self {
        Self {
            rng_seed,
            ..Self::default()
        }
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            maintenance_poll_ms: 100,
            rng_seed: 12345,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HubConfig::default();
        assert_eq!(config.maintenance_poll_ms, 100);
        assert_eq!(HubConfig::with_seed(7).rng_seed, 7);
    }
}
