pub mod ops;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "rebase-ledger")]
#[command(about = "Deflationary rebasing ledger CLI", long_about = None)]
pub struct Cli {
    /// Ledger state file (JSON snapshot)
    #[arg(long, global = true, default_value = "ledger.json")]
    pub state: String,

    /// Unix time to act at; defaults to the wall clock
    #[arg(long, global = true)]
    pub now: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new ledger, minting the initial supply to the deployer
    Init {
        #[arg(long, default_value = "ledger.toml")]
        config: String,
        #[arg(long)]
        deployer: String,
    },
    /// Move display units between accounts
    Transfer {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: String,
    },
    /// Apply the time-proportional decay (oracle only)
    Rebase {
        #[arg(long)]
        caller: String,
    },
    /// Display balance of an account
    Balance {
        account: String,
    },
    /// Display total supply
    Supply,
    /// Index, clock and oracle
    Status,
    /// Run an oracle keeper against the state file until Ctrl-C
    Keeper {
        #[arg(long)]
        oracle: String,
        #[arg(long, default_value_t = 60)]
        interval_secs: u64,
    },
    /// In-memory run: fund holders, then rebase every cooldown for a span of hours
    Simulate {
        #[arg(long, default_value_t = 5)]
        holders: u32,
        #[arg(long, default_value = "1000")]
        amount: String,
        #[arg(long, default_value_t = 24)]
        hours: u64,
    },
}
