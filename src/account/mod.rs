//! Account layer of the rebasing ledger
//!
//! - `Address` identities
//! - `AccountStore` share balances, independent of the rebase index

pub mod types;
pub mod store;

pub use types::Address;
pub use store::AccountStore;
