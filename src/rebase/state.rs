use serde::{Deserialize, Serialize};

/// Cooldown phase of the rebase clock
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RebaseState {
    /// Cooldown still running
    Cooling { remaining_secs: u64 },
    /// Oracle may rebase now
    Eligible,
}

impl RebaseState {
    pub fn from_elapsed(elapsed: u64, cooldown: u64) -> Self {
        if elapsed >= cooldown {
            RebaseState::Eligible
        } else {
            RebaseState::Cooling {
                remaining_secs: cooldown - elapsed,
            }
        }
    }

    pub fn is_eligible(&self) -> bool {
        matches!(self, RebaseState::Eligible)
    }
}

/// Result of a successful rebase
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct RebaseOutcome {
    pub previous_index: u128,
    pub new_index: u128,
    pub elapsed_secs: u64,
    /// WAD fraction removed from the index
    pub decay_fraction: u128,
    pub timestamp: u64,
}
