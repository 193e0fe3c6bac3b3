//! Rebase index arithmetic and gating
//!
//! The index starts at `WAD` (1.0) and only ever shrinks. A rebase is
//! accepted from the configured oracle once `cooldown_secs` have passed since
//! the previous one; the decay applied is linear in the elapsed time:
//!
//! ```text
//! decay = elapsed * annual_rate / seconds_per_year      (WAD fraction)
//! index = floor(index * (WAD - decay) / WAD)
//! ```
//!
//! Decay is not capped at one period's worth, but a decay of 100% or more
//! pins the index at zero.

use tracing::{info, warn};

use super::state::{RebaseOutcome, RebaseState};
use crate::account::Address;
use crate::config::RebaseConfig;
use crate::error::{LedgerError, Result};
use crate::fixed::{self, WAD};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebaseEngine {
    config: RebaseConfig,
    rebase_index: u128,
    last_rebase_time: u64,
}

impl RebaseEngine {
    pub fn new(config: RebaseConfig, now: u64) -> Self {
        Self {
            config,
            rebase_index: WAD,
            last_rebase_time: now,
        }
    }

    /// Rebuild a persisted engine
    pub fn from_parts(config: RebaseConfig, rebase_index: u128, last_rebase_time: u64) -> Result<Self> {
        if rebase_index > WAD {
            return Err(LedgerError::InvalidState(format!(
                "rebase index {} above 1.0",
                rebase_index
            )));
        }
        Ok(Self {
            config,
            rebase_index,
            last_rebase_time,
        })
    }

    pub fn config(&self) -> &RebaseConfig {
        &self.config
    }

    pub fn oracle(&self) -> Address {
        self.config.oracle
    }

    pub fn rebase_index(&self) -> u128 {
        self.rebase_index
    }

    pub fn last_rebase_time(&self) -> u64 {
        self.last_rebase_time
    }

    /// Seconds since the last rebase; a clock behind the last rebase reads as zero
    pub fn elapsed(&self, now: u64) -> u64 {
        now.saturating_sub(self.last_rebase_time)
    }

    pub fn state(&self, now: u64) -> RebaseState {
        RebaseState::from_elapsed(self.elapsed(now), self.config.cooldown_secs)
    }

    pub fn next_rebase_at(&self) -> u64 {
        self.last_rebase_time.saturating_add(self.config.cooldown_secs)
    }

    /// WAD fraction of decay accrued over `elapsed` seconds
    pub fn decay_fraction(&self, elapsed: u64) -> Result<u128> {
        fixed::mul_div_floor(
            elapsed as u128,
            self.config.annual_rate_wad(),
            self.config.seconds_per_year as u128,
        )
    }

    /// Index that a rebase after `elapsed` seconds would produce
    pub fn projected_index(&self, elapsed: u64) -> Result<u128> {
        let decay = self.decay_fraction(elapsed)?;
        if decay >= WAD {
            return Ok(0);
        }
        fixed::mul_div_floor(self.rebase_index, WAD - decay, WAD)
    }

    /// Validate caller and cooldown, then apply the decay in place
    pub fn rebase(&mut self, caller: &Address, now: u64) -> Result<RebaseOutcome> {
        if *caller != self.config.oracle {
            warn!("Rebase rejected: {} is not the oracle", caller);
            return Err(LedgerError::Unauthorized { caller: *caller });
        }

        let elapsed = self.elapsed(now);
        if elapsed < self.config.cooldown_secs {
            warn!(
                "Rebase rejected: {}s since last rebase, cooldown {}s",
                elapsed, self.config.cooldown_secs
            );
            return Err(LedgerError::TooEarly {
                elapsed,
                cooldown: self.config.cooldown_secs,
            });
        }

        // Everything fallible happens before the first write.
        let decay_fraction = self.decay_fraction(elapsed)?;
        let new_index = self.projected_index(elapsed)?;

        let previous_index = self.rebase_index;
        self.rebase_index = new_index;
        self.last_rebase_time = now;

        info!(
            "Rebase applied: index {} -> {} after {}s",
            previous_index, new_index, elapsed
        );

        Ok(RebaseOutcome {
            previous_index,
            new_index,
            elapsed_secs: elapsed,
            decay_fraction,
            timestamp: now,
        })
    }

    /// Display amount for a share amount at the current index
    pub fn to_display(&self, shares: u128) -> Result<u128> {
        fixed::shares_to_display(shares, self.rebase_index)
    }

    /// Share amount for a display amount at the current index (floor)
    pub fn to_shares(&self, amount: u128) -> Result<u128> {
        fixed::display_to_shares(amount, self.rebase_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SECONDS_PER_YEAR;

    const T0: u64 = 1_700_000_000;

    fn oracle() -> Address {
        Address::from_label("oracle")
    }

    fn engine() -> RebaseEngine {
        RebaseEngine::new(RebaseConfig::new(oracle()), T0)
    }

    #[test]
    fn test_starts_at_unit_index() {
        let engine = engine();
        assert_eq!(engine.rebase_index(), WAD);
        assert_eq!(engine.last_rebase_time(), T0);
        assert_eq!(engine.next_rebase_at(), T0 + 3_600);
    }

    #[test]
    fn test_unauthorized_checked_before_cooldown() {
        let mut engine = engine();
        let before = engine.clone();
        let stranger = Address::from_label("mallory");

        let err = engine.rebase(&stranger, T0).unwrap_err();
        assert_eq!(err, LedgerError::Unauthorized { caller: stranger });
        let err = engine.rebase(&stranger, T0 + SECONDS_PER_YEAR).unwrap_err();
        assert!(matches!(err, LedgerError::Unauthorized { .. }));
        assert_eq!(engine, before);
    }

    #[test]
    fn test_too_early() {
        let mut engine = engine();
        let before = engine.clone();

        let err = engine.rebase(&oracle(), T0 + 3_599).unwrap_err();
        assert_eq!(err, LedgerError::TooEarly { elapsed: 3_599, cooldown: 3_600 });
        assert_eq!(engine, before);
    }

    #[test]
    fn test_one_hour_decay() {
        let mut engine = engine();
        let outcome = engine.rebase(&oracle(), T0 + 3_600).unwrap();

        // 3600 * 1e16 / 31_536_000 = 1_141_552_511_415 (floored)
        assert_eq!(outcome.decay_fraction, 1_141_552_511_415);
        assert_eq!(outcome.new_index, WAD - 1_141_552_511_415);
        assert_eq!(engine.last_rebase_time(), T0 + 3_600);
        assert_eq!(engine.state(T0 + 3_600), RebaseState::Cooling { remaining_secs: 3_600 });
    }

    #[test]
    fn test_one_year_is_exactly_one_percent() {
        let mut engine = engine();
        let outcome = engine.rebase(&oracle(), T0 + SECONDS_PER_YEAR).unwrap();
        assert_eq!(outcome.new_index, WAD / 100 * 99);
    }

    #[test]
    fn test_decay_is_not_capped_at_one_period() {
        let mut engine = engine();
        engine.rebase(&oracle(), T0 + 3 * SECONDS_PER_YEAR).unwrap();
        assert_eq!(engine.rebase_index(), WAD / 100 * 97);
    }

    #[test]
    fn test_index_clamped_at_zero() {
        let mut engine = engine();
        engine.rebase(&oracle(), T0 + 150 * SECONDS_PER_YEAR).unwrap();
        assert_eq!(engine.rebase_index(), 0);

        // Stays at zero on later rebases
        engine.rebase(&oracle(), T0 + 151 * SECONDS_PER_YEAR).unwrap();
        assert_eq!(engine.rebase_index(), 0);
    }

    #[test]
    fn test_clock_regression_reads_as_cooling() {
        let engine = engine();
        assert_eq!(engine.elapsed(T0 - 10), 0);
        assert!(!engine.state(T0 - 10).is_eligible());
    }

    #[test]
    fn test_index_never_increases() {
        let mut engine = engine();
        let mut now = T0;
        let mut last = engine.rebase_index();
        for step in 1..50u64 {
            now += 3_600 * step;
            engine.rebase(&oracle(), now).unwrap();
            assert!(engine.rebase_index() <= last);
            last = engine.rebase_index();
        }
    }

    #[test]
    fn test_from_parts_rejects_index_above_one() {
        assert!(RebaseEngine::from_parts(RebaseConfig::new(oracle()), WAD + 1, T0).is_err());
        assert!(RebaseEngine::from_parts(RebaseConfig::new(oracle()), WAD, T0).is_ok());
    }
}
