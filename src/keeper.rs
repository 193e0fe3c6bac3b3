//! Oracle keeper: polls the ledger and triggers a rebase once the cooldown
//! has run out. Lives outside the ledger core; the ledger itself has no timers.

use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{error, info};

use crate::account::Address;
use crate::error::LedgerError;
use crate::ledger::LedgerSnapshot;
use crate::rebase::{RebaseOutcome, RebaseState};
use crate::shared::SharedLedger;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeeperTick {
    Rebased(RebaseOutcome),
    Waiting { remaining_secs: u64 },
    Rejected(LedgerError),
}

pub struct OracleKeeper {
    pub ledger: SharedLedger,
    pub oracle: Address,
    pub poll_interval: Duration,
    /// Snapshot file shared with other writers; reloaded before every poll
    /// and rewritten after every rebase
    pub state_file: Option<String>,
}

impl OracleKeeper {
    pub fn new(ledger: SharedLedger, oracle: Address, poll_interval: Duration) -> Self {
        Self {
            ledger,
            oracle,
            poll_interval,
            state_file: None,
        }
    }

    pub fn with_state_file(mut self, path: impl Into<String>) -> Self {
        self.state_file = Some(path.into());
        self
    }

    /// One poll. Cooling is reported as waiting, not as an error.
    pub fn tick(&self) -> KeeperTick {
        let result = self.ledger.with(|ledger| {
            if let Some(path) = &self.state_file {
                ledger.reload(LedgerSnapshot::load(path)?)?;
            }
            match ledger.rebase_state() {
                RebaseState::Cooling { remaining_secs } => Ok(KeeperTick::Waiting { remaining_secs }),
                RebaseState::Eligible => {
                    let outcome = ledger.rebase(&self.oracle)?;
                    if let Some(path) = &self.state_file {
                        ledger.snapshot().save(path)?;
                    }
                    Ok(KeeperTick::Rebased(outcome))
                }
            }
        });

        match result {
            Ok(tick) => tick,
            Err(LedgerError::TooEarly { elapsed, cooldown }) => KeeperTick::Waiting {
                remaining_secs: cooldown.saturating_sub(elapsed),
            },
            Err(e) => KeeperTick::Rejected(e),
        }
    }

    pub async fn run(self, mut shutdown: oneshot::Receiver<()>) {
        info!("Oracle keeper started for {} (poll every {:?})", self.oracle, self.poll_interval);
        let mut interval = tokio::time::interval(self.poll_interval);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Oracle keeper stopping");
                    break;
                }
                _ = interval.tick() => {
                    match self.tick() {
                        KeeperTick::Rebased(outcome) => {
                            info!("Keeper rebased: index now {}", outcome.new_index);
                        }
                        KeeperTick::Waiting { .. } => {}
                        KeeperTick::Rejected(e) => {
                            error!("Keeper rebase rejected: {}", e);
                        }
                    }
                }
            }
        }
    }
}
