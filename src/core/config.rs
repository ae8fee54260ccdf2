//! Engine configuration parameters.

use serde::{Deserialize, Serialize};

use super::RoleId;

/// Engine configuration parameters.
///
/// Fixed at engine creation; the Monte Carlo driver reads the scored role
/// and depth bound from here, and the playout RNG is seeded from `seed`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Random seed for the playout RNG.
    /// Same seed produces deterministic playouts.
    pub seed: u64,

    /// The role whose goal value `monte_carlo` returns.
    pub scored_role: RoleId,

    /// Maximum playout depth in transitions (0 = unbounded).
    /// Playouts exceeding the bound fail with `NonTerminatingPlayout`;
    /// games with provably finite depth can leave this at 0.
    pub max_playout_depth: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            scored_role: RoleId::new(0),
            max_playout_depth: 0,
        }
    }
}

impl EngineConfig {
    /// Create a new config with a custom seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Create a new config with a custom scored role.
    pub fn with_scored_role(mut self, role: RoleId) -> Self {
        self.scored_role = role;
        self
    }

    /// Create a new config with a playout depth bound.
    pub fn with_max_playout_depth(mut self, depth: u32) -> Self {
        self.max_playout_depth = depth;
        self
    }
}
