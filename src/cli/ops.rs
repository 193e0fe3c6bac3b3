use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::info;

use crate::account::Address;
use crate::clock::{Clock, ManualClock, SystemClock};
use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};
use crate::keeper::OracleKeeper;
use crate::ledger::{Ledger, LedgerSnapshot};
use crate::rebase::RebaseState;
use crate::shared::SharedLedger;
use crate::units::{format_units, parse_units};

use super::{Cli, Commands};

pub async fn handle_command(cli: Cli) -> Result<()> {
    let clock: Arc<dyn Clock> = match cli.now {
        Some(now) => Arc::new(ManualClock::new(now)),
        None => Arc::new(SystemClock),
    };
    let state = cli.state.as_str();

    match cli.command {
        Commands::Init { config, deployer } => {
            if Path::new(state).exists() {
                return Err(LedgerError::InvalidState(format!("'{}' already exists", state)));
            }
            // An existing but broken config must not fall back to the default oracle
            let config = if Path::new(&config).exists() {
                LedgerConfig::load(&config)?
            } else {
                LedgerConfig::load_or_default(&config)
            };
            let deployer = Address::parse_or_label(&deployer)?;
            let ledger = Ledger::new(config, deployer, clock)?;
            ledger.snapshot().save(state)?;
            println!("Ledger created at '{}'", state);
            println!("Deployer: {}", deployer);
            println!("Oracle:   {}", ledger.oracle());
            println!("Supply:   {} {}", format_units(ledger.total_supply()?), ledger.metadata().symbol);
        }
        Commands::Transfer { from, to, amount } => {
            let mut ledger = open(state, clock)?;
            let from = Address::parse_or_label(&from)?;
            let to = Address::parse_or_label(&to)?;
            let receipt = ledger.transfer(&from, &to, parse_units(&amount)?)?;
            ledger.snapshot().save(state)?;
            println!(
                "Transferred {} ({} shares) from {} to {}",
                format_units(receipt.debited),
                receipt.shares,
                from,
                to
            );
        }
        Commands::Rebase { caller } => {
            let mut ledger = open(state, clock)?;
            let caller = Address::parse_or_label(&caller)?;
            let outcome = ledger.rebase(&caller)?;
            ledger.snapshot().save(state)?;
            println!(
                "Rebased after {}s: index {} -> {}",
                outcome.elapsed_secs,
                format_units(outcome.previous_index),
                format_units(outcome.new_index)
            );
        }
        Commands::Balance { account } => {
            let ledger = open(state, clock)?;
            let account = Address::parse_or_label(&account)?;
            println!(
                "{}: {} {} ({} shares)",
                account,
                format_units(ledger.balance_of(&account)?),
                ledger.metadata().symbol,
                ledger.shares_of(&account)
            );
        }
        Commands::Supply => {
            let ledger = open(state, clock)?;
            println!("{} {}", format_units(ledger.total_supply()?), ledger.metadata().symbol);
        }
        Commands::Status => {
            let ledger = open(state, clock)?;
            let meta = ledger.metadata();
            println!("Token:        {} ({})", meta.name, meta.symbol);
            println!("Oracle:       {}", ledger.oracle());
            println!("Rebase index: {}", format_units(ledger.rebase_index()));
            println!("Last rebase:  {}", ledger.last_rebase_time());
            println!("Next rebase:  {}", ledger.next_rebase_at());
            match ledger.rebase_state() {
                RebaseState::Eligible => println!("State:        eligible"),
                RebaseState::Cooling { remaining_secs } => {
                    println!("State:        cooling ({}s left)", remaining_secs)
                }
            }
            println!("Holders:      {}", ledger.holders()?.len());
        }
        Commands::Keeper { oracle, interval_secs } => {
            let oracle = Address::parse_or_label(&oracle)?;
            let keeper = file_keeper(state, oracle, clock, Duration::from_secs(interval_secs.max(1)))?;

            let (tx, rx) = oneshot::channel();
            let handle = tokio::spawn(keeper.run(rx));
            tokio::signal::ctrl_c().await?;
            let _ = tx.send(());
            handle.await.map_err(|e| LedgerError::InvalidState(e.to_string()))?;
            info!("Keeper stopped; '{}' holds the last rebase", state);
        }
        Commands::Simulate { holders, amount, hours } => {
            simulate(holders, parse_units(&amount)?, hours, cli.now.unwrap_or(0))?;
        }
    }
    Ok(())
}

fn open(state: &str, clock: Arc<dyn Clock>) -> Result<Ledger> {
    Ledger::restore(LedgerSnapshot::load(state)?, clock)
}

/// Keeper that treats the state file as the source of truth
fn file_keeper(state: &str, oracle: Address, clock: Arc<dyn Clock>, interval: Duration) -> Result<OracleKeeper> {
    let shared = SharedLedger::new(open(state, clock)?);
    Ok(OracleKeeper::new(shared, oracle, interval).with_state_file(state))
}

fn simulate(holders: u32, amount: u128, hours: u64, start: u64) -> Result<()> {
    let clock = Arc::new(ManualClock::new(start));
    let config = LedgerConfig::default();
    let oracle = config.rebase.oracle;
    let cooldown = config.rebase.cooldown_secs;
    let deployer = Address::from_label("deployer");
    let mut ledger = Ledger::new(config, deployer, clock.clone())?;

    let accounts: Vec<Address> = (1..=holders)
        .map(|n| Address::from_label(&format!("holder{}", n)))
        .collect();
    for account in &accounts {
        ledger.transfer(&deployer, account, amount)?;
    }

    let end = start.saturating_add(hours.saturating_mul(3_600));
    let mut rebases = 0u64;
    while clock.now().saturating_add(cooldown) <= end {
        clock.advance(cooldown);
        ledger.rebase(&oracle)?;
        rebases += 1;
    }

    println!("Rebases:      {}", rebases);
    println!("Rebase index: {}", format_units(ledger.rebase_index()));
    println!("Total supply: {}", format_units(ledger.total_supply()?));
    for account in &accounts {
        println!("  {} {}", account, format_units(ledger.balance_of(account)?));
    }
    Ok(())
}
