//! Pipeline stages and the monitor entry point.
//!
//! - `normalize`, `hash`, `diff`, `group`: pure transforms over fetched data
//! - `guard`: stops a run when nothing usable was fetched
//! - `run_monitor`: one full fetch, diff and notify pass

pub mod diff;
pub mod group;
pub mod guard;
pub mod hash;
pub mod monitor;
pub mod normalize;

pub use diff::{DiffResult, Generation, QueueOutcome, calculate_diff};
pub use guard::{FetchGuard, GuardResult};
pub use monitor::{RunOptions, RunOutcome, run_monitor};
