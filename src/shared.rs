//! Thread-safe handle: one mutex around the whole ledger.
//!
//! `transfer` and `rebase` each read and write several fields that must be
//! seen together, so nothing is locked at a finer grain than `Ledger`.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::account::Address;
use crate::error::{LedgerError, Result};
use crate::ledger::{Ledger, LedgerSnapshot, TransferReceipt};
use crate::rebase::{RebaseOutcome, RebaseState};

#[derive(Clone)]
pub struct SharedLedger {
    inner: Arc<Mutex<Ledger>>,
}

impl SharedLedger {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Ledger>> {
        self.inner.lock().map_err(|_| LedgerError::LockPoisoned)
    }

    /// Run several reads/writes as one atomic step
    pub fn with<T>(&self, f: impl FnOnce(&mut Ledger) -> Result<T>) -> Result<T> {
        let mut guard = self.lock()?;
        f(&mut guard)
    }

    pub fn transfer(&self, from: &Address, to: &Address, amount: u128) -> Result<TransferReceipt> {
        self.lock()?.transfer(from, to, amount)
    }

    pub fn rebase(&self, caller: &Address) -> Result<RebaseOutcome> {
        self.lock()?.rebase(caller)
    }

    pub fn balance_of(&self, account: &Address) -> Result<u128> {
        self.lock()?.balance_of(account)
    }

    pub fn total_supply(&self) -> Result<u128> {
        self.lock()?.total_supply()
    }

    pub fn rebase_index(&self) -> Result<u128> {
        Ok(self.lock()?.rebase_index())
    }

    pub fn rebase_state(&self) -> Result<RebaseState> {
        Ok(self.lock()?.rebase_state())
    }

    pub fn snapshot(&self) -> Result<LedgerSnapshot> {
        Ok(self.lock()?.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::LedgerConfig;
    use crate::fixed::WAD;
    use std::thread;

    #[test]
    fn test_concurrent_transfers_keep_supply() {
        let clock = Arc::new(ManualClock::new(1_000));
        let owner = Address::from_label("owner");
        let ledger = Ledger::new(LedgerConfig::default(), owner, clock).unwrap();
        let shared = SharedLedger::new(ledger);
        let supply = shared.total_supply().unwrap();

        let handles: Vec<_> = (0..8)
            .map(|n| {
                let shared = shared.clone();
                thread::spawn(move || {
                    let to = Address::from_label(&format!("worker{}", n));
                    for _ in 0..25 {
                        shared.transfer(&owner, &to, 10 * WAD).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        for n in 0..8 {
            let who = Address::from_label(&format!("worker{}", n));
            assert_eq!(shared.balance_of(&who).unwrap(), 250 * WAD);
        }
        assert_eq!(shared.total_supply().unwrap(), supply);
    }

    #[test]
    fn test_with_runs_atomically() {
        let clock = Arc::new(ManualClock::new(0));
        let owner = Address::from_label("owner");
        let shared = SharedLedger::new(Ledger::new(LedgerConfig::default(), owner, clock).unwrap());

        let moved = shared
            .with(|ledger| {
                let bob = Address::from_label("bob");
                ledger.transfer(&owner, &bob, WAD)?;
                ledger.balance_of(&bob)
            })
            .unwrap();
        assert_eq!(moved, WAD);
    }
}
