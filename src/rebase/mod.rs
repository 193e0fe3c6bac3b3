//! Rebase index and cooldown clock

pub mod engine;
pub mod state;

pub use engine::RebaseEngine;
pub use state::{RebaseOutcome, RebaseState};
