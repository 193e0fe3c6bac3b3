pub mod account;
pub mod clock;
pub mod config;
pub mod error;
pub mod fixed;
pub mod rebase;
pub mod ledger;
pub mod shared;
pub mod keeper;
pub mod units;
pub mod cli;

pub use account::{AccountStore, Address};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::LedgerConfig;
pub use error::{LedgerError, Result};
pub use ledger::{Ledger, LedgerSnapshot, TransferReceipt};
pub use rebase::{RebaseEngine, RebaseOutcome, RebaseState};
pub use shared::SharedLedger;
