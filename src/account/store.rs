//! Share balance storage
//!
//! Shares are the rebase-invariant unit of ownership. The store never sees
//! the rebase index; it only guarantees that the sum of all balances equals
//! `total_shares` after every mutation.

use std::collections::BTreeMap;

use super::types::Address;
use crate::error::{LedgerError, Result};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccountStore {
    shares: BTreeMap<Address, u128>,
    total_shares: u128,
}

impl AccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding the one-time initial mint
    pub fn with_mint(account: Address, shares: u128) -> Self {
        let mut store = Self::new();
        store.mint(account, shares);
        store
    }

    /// Rebuild from persisted balances, checking the share-sum invariant
    pub fn from_parts(shares: BTreeMap<Address, u128>, total_shares: u128) -> Result<Self> {
        let mut sum: u128 = 0;
        for value in shares.values() {
            sum = sum.checked_add(*value).ok_or(LedgerError::Overflow)?;
        }
        if sum != total_shares {
            return Err(LedgerError::InvalidState(format!(
                "share balances sum to {} but total_shares is {}",
                sum, total_shares
            )));
        }

        let shares = shares.into_iter().filter(|(_, v)| *v > 0).collect();
        Ok(Self { shares, total_shares })
    }

    // Only reachable through `with_mint`, so supply is fixed after construction.
    fn mint(&mut self, account: Address, shares: u128) {
        if shares == 0 {
            return;
        }
        self.total_shares += shares;
        *self.shares.entry(account).or_insert(0) += shares;
    }

    /// Remove shares from an account
    pub fn debit(&mut self, account: &Address, shares: u128) -> Result<()> {
        if shares == 0 {
            return Ok(());
        }

        let current = self.shares_of(account);
        if current < shares {
            return Err(LedgerError::InsufficientBalance {
                available: current,
                requested: shares,
            });
        }

        let remaining = current - shares;
        if remaining == 0 {
            self.shares.remove(account);
        } else {
            self.shares.insert(*account, remaining);
        }
        Ok(())
    }

    /// Add shares to an account.
    ///
    /// Only ever called with shares just debited elsewhere, so the balance is
    /// bounded by `total_shares` and cannot overflow.
    pub fn credit(&mut self, account: &Address, shares: u128) {
        if shares == 0 {
            return;
        }
        *self.shares.entry(*account).or_insert(0) += shares;
    }

    /// Move shares between accounts: one debit, then one credit of the same amount
    pub fn transfer(&mut self, from: &Address, to: &Address, shares: u128) -> Result<()> {
        self.debit(from, shares)?;
        self.credit(to, shares);
        Ok(())
    }

    pub fn shares_of(&self, account: &Address) -> u128 {
        self.shares.get(account).copied().unwrap_or(0)
    }

    pub fn total_shares(&self) -> u128 {
        self.total_shares
    }

    /// Accounts with a non-zero balance, in address order
    pub fn holders(&self) -> Vec<(Address, u128)> {
        self.shares.iter().map(|(a, s)| (*a, *s)).collect()
    }

    pub fn account_count(&self) -> usize {
        self.shares.len()
    }

    pub fn balances(&self) -> &BTreeMap<Address, u128> {
        &self.shares
    }

    /// Sum of every balance; equals `total_shares` in any reachable state
    pub fn sum_of_shares(&self) -> u128 {
        self.shares.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Address {
        Address::from_label("alice")
    }

    fn bob() -> Address {
        Address::from_label("bob")
    }

    #[test]
    fn test_mint_and_query() {
        let store = AccountStore::with_mint(alice(), 1000);
        assert_eq!(store.shares_of(&alice()), 1000);
        assert_eq!(store.shares_of(&bob()), 0);
        assert_eq!(store.total_shares(), 1000);
    }

    #[test]
    fn test_debit_and_credit() {
        let mut store = AccountStore::with_mint(alice(), 1000);

        store.debit(&alice(), 300).unwrap();
        store.credit(&bob(), 300);
        assert_eq!(store.shares_of(&alice()), 700);
        assert_eq!(store.shares_of(&bob()), 300);
        assert_eq!(store.sum_of_shares(), store.total_shares());
    }

    #[test]
    fn test_insufficient_balance_leaves_store_untouched() {
        let mut store = AccountStore::with_mint(alice(), 1000);
        let before = store.clone();

        let err = store.transfer(&alice(), &bob(), 1001).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientBalance { available: 1000, requested: 1001 }
        );
        assert_eq!(store, before);

        // Absent account reads as zero
        assert!(store.debit(&bob(), 1).is_err());
    }

    #[test]
    fn test_transfer_preserves_total() {
        let mut store = AccountStore::with_mint(alice(), 1000);
        store.transfer(&alice(), &bob(), 1000).unwrap();

        assert_eq!(store.shares_of(&alice()), 0);
        assert_eq!(store.account_count(), 1);
        assert_eq!(store.holders(), vec![(bob(), 1000)]);
        assert_eq!(store.sum_of_shares(), 1000);
    }

    #[test]
    fn test_self_transfer_is_noop() {
        let mut store = AccountStore::with_mint(alice(), 1000);
        store.transfer(&alice(), &alice(), 400).unwrap();
        assert_eq!(store.shares_of(&alice()), 1000);
    }

    #[test]
    fn test_from_parts_checks_invariant() {
        let mut shares = BTreeMap::new();
        shares.insert(alice(), 600);
        shares.insert(bob(), 400);

        assert!(AccountStore::from_parts(shares.clone(), 1000).is_ok());
        assert!(matches!(
            AccountStore::from_parts(shares, 999),
            Err(LedgerError::InvalidState(_))
        ));
    }
}
