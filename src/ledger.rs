//! Rebasing ledger
//!
//! Glues the share store to the rebase engine. Display amounts come in,
//! get converted to shares once at the current index, and the store moves
//! exactly that share amount. A rebase only touches the engine, so every
//! balance shrinks at once without per-account writes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::account::{AccountStore, Address};
use crate::clock::Clock;
use crate::config::{LedgerConfig, TokenMetadata};
use crate::error::{LedgerError, Result};
use crate::rebase::{RebaseEngine, RebaseOutcome, RebaseState};

/// Effect of a successful transfer
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransferReceipt {
    pub from: Address,
    pub to: Address,
    /// Display amount the caller asked for
    pub amount: u128,
    /// Shares actually moved
    pub shares: u128,
    /// Drop in the sender's display balance; may trail `amount` by rounding
    pub debited: u128,
}

/// Persisted ledger state
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub config: LedgerConfig,
    pub total_shares: u128,
    pub shares: BTreeMap<Address, u128>,
    pub rebase_index: u128,
    pub last_rebase_time: u64,
}

impl LedgerSnapshot {
    /// Write to a sibling temp file, then rename it over `path`
    pub fn save(&self, path: &str) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let tmp = format!("{}.tmp", path);
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            return Err(LedgerError::Io(format!("state file '{}' not found", path)));
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

pub struct Ledger {
    config: LedgerConfig,
    store: AccountStore,
    engine: RebaseEngine,
    clock: Arc<dyn Clock>,
}

impl Ledger {
    /// Mint `INITIAL_SUPPLY` to `deployer` and start the rebase clock
    pub fn new(config: LedgerConfig, deployer: Address, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        let initial_supply = config.initial_supply()?;
        let now = clock.now();

        let store = AccountStore::with_mint(deployer, initial_supply);
        let engine = RebaseEngine::new(config.rebase.clone(), now);

        info!(
            "Ledger created: {} {} minted to {}, oracle {}",
            config.supply.initial_supply_tokens, config.token.symbol, deployer, config.rebase.oracle
        );

        Ok(Self {
            config,
            store,
            engine,
            clock,
        })
    }

    /// Rebuild from a snapshot, re-checking every stored invariant
    pub fn restore(snapshot: LedgerSnapshot, clock: Arc<dyn Clock>) -> Result<Self> {
        let LedgerSnapshot {
            config,
            total_shares,
            shares,
            rebase_index,
            last_rebase_time,
        } = snapshot;

        config.validate()?;
        if total_shares != config.initial_supply()? {
            return Err(LedgerError::InvalidState(format!(
                "total_shares {} differs from the initial supply",
                total_shares
            )));
        }

        let store = AccountStore::from_parts(shares, total_shares)?;
        let engine = RebaseEngine::from_parts(config.rebase.clone(), rebase_index, last_rebase_time)?;

        Ok(Self {
            config,
            store,
            engine,
            clock,
        })
    }

    /// Replace all state with a snapshot, keeping this ledger's clock.
    /// On error the current state is left as it was.
    pub fn reload(&mut self, snapshot: LedgerSnapshot) -> Result<()> {
        *self = Self::restore(snapshot, self.clock.clone())?;
        Ok(())
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            config: self.config.clone(),
            total_shares: self.store.total_shares(),
            shares: self.store.balances().clone(),
            rebase_index: self.engine.rebase_index(),
            last_rebase_time: self.engine.last_rebase_time(),
        }
    }

    /// Move `amount` display units from `from` to `to`
    pub fn transfer(&mut self, from: &Address, to: &Address, amount: u128) -> Result<TransferReceipt> {
        let available = self.balance_of(from)?;
        if available < amount || (amount > 0 && self.engine.rebase_index() == 0) {
            return Err(LedgerError::InsufficientBalance {
                available,
                requested: amount,
            });
        }

        let shares = if amount == 0 { 0 } else { self.engine.to_shares(amount)? };
        self.store.transfer(from, to, shares)?;

        let debited = available - self.balance_of(from)?;
        debug!("Transfer {} -> {}: {} units ({} shares)", from, to, amount, shares);

        Ok(TransferReceipt {
            from: *from,
            to: *to,
            amount,
            shares,
            debited,
        })
    }

    /// Oracle-only; applies decay for the time since the last rebase
    pub fn rebase(&mut self, caller: &Address) -> Result<RebaseOutcome> {
        let now = self.clock.now();
        self.engine.rebase(caller, now)
    }

    pub fn balance_of(&self, account: &Address) -> Result<u128> {
        self.engine.to_display(self.store.shares_of(account))
    }

    pub fn shares_of(&self, account: &Address) -> u128 {
        self.store.shares_of(account)
    }

    pub fn total_supply(&self) -> Result<u128> {
        self.engine.to_display(self.store.total_shares())
    }

    pub fn total_shares(&self) -> u128 {
        self.store.total_shares()
    }

    pub fn rebase_index(&self) -> u128 {
        self.engine.rebase_index()
    }

    pub fn last_rebase_time(&self) -> u64 {
        self.engine.last_rebase_time()
    }

    pub fn oracle(&self) -> Address {
        self.engine.oracle()
    }

    pub fn metadata(&self) -> &TokenMetadata {
        &self.config.token
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn initial_supply(&self) -> Result<u128> {
        self.config.initial_supply()
    }

    pub fn rebase_state(&self) -> RebaseState {
        self.engine.state(self.clock.now())
    }

    pub fn next_rebase_at(&self) -> u64 {
        self.engine.next_rebase_at()
    }

    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    /// Accounts holding shares, with their display balances
    pub fn holders(&self) -> Result<Vec<(Address, u128)>> {
        self.store
            .holders()
            .into_iter()
            .map(|(account, shares)| Ok((account, self.engine.to_display(shares)?)))
            .collect()
    }
}
